//! The error types returned by this crate
//!
//! Failures affecting the primary requested resource bubble up as [`AgendaError`]s.
//! Failures local to a single external feed are [`FeedError`]s: the aggregator logs and
//! swallows them, they never fail a whole request.

use thiserror::Error;

/// An error reported by a [`TaskStore`](crate::traits::TaskStore) implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing table/collection has not been provisioned yet.
    ///
    /// This is an expected condition on fresh deployments (the calendar sources table is
    /// created by a separate setup step), not a generic backend failure, so callers can
    /// degrade gracefully instead of erroring out.
    #[error("the '{table}' table is not provisioned yet")]
    SchemaMissing { table: &'static str },

    /// No record matches the requested id
    #[error("no such record")]
    NotFound,

    /// Any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// An error that occurred while retrieving a feed body over HTTP
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered, but not with a success status
    #[error("server answered with status {0}")]
    Status(u16),

    /// The request could not complete (DNS, connect, timeout...)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registered URL cannot be turned into a fetchable one
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),
}

/// An error that occurred while parsing an iCal document
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid iCal syntax
    #[error("invalid iCal data: {0}")]
    Syntax(String),

    /// A required property is absent
    #[error("missing {0} property")]
    MissingProperty(&'static str),

    /// A property is present but its value cannot be decoded
    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    /// The document contains no VCALENDAR component at all
    #[error("no VCALENDAR component found")]
    Empty,
}

/// Everything that can go wrong with a single calendar source.
///
/// These are isolated per-source: the aggregator logs them and moves on to the next source.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
}

/// A request-level failure of an [`Agenda`](crate::agenda::Agenda) operation
#[derive(Debug, Error)]
pub enum AgendaError {
    /// The caller may not act on this resource (not the owner, and not an admin)
    #[error("not allowed to act on this resource")]
    Forbidden,

    /// The requested resource does not exist
    #[error("resource not found")]
    NotFound,

    /// A required table is missing; the deployment needs its setup step run
    #[error("setup required: {0}")]
    SetupRequired(String),

    /// The request itself is malformed (empty title, unparseable URL or color...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The primary resource's store failed
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AgendaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SchemaMissing { table } => AgendaError::SetupRequired(format!(
                "the '{}' table is missing, run the calendar setup step first",
                table
            )),
            StoreError::NotFound => AgendaError::NotFound,
            other => AgendaError::Store(other),
        }
    }
}
