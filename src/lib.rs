//! This crate provides the core of a small multi-user task-management app.
//!
//! Every user owns a list of [`Task`]s (optionally recurring, optionally carrying a due date)
//! and a set of registered external iCal feeds ([`source::CalendarSource`]). \
//! The [`Agenda`](agenda::Agenda) merges both into a single calendar view: tasks with a due
//! date become one-hour events, and every registered feed is fetched and parsed on the fly,
//! one source at a time, so that a broken feed never takes the whole view down.
//!
//! Completing a recurring task automatically materializes its next occurrence, see the
//! [`recurrence`] module.
//!
//! Storage and feed retrieval are behind the traits of the [`traits`] module: the
//! [`store::JsonStore`] is a ready-to-use implementation backed by a JSON file (or plain
//! memory), and [`fetch::HttpFetcher`] retrieves feeds over HTTP with a bounded timeout.
//! Authentication is not handled here: callers resolve their session into an
//! [`Identity`](identity::Identity) and pass it in.

pub mod config;
pub mod error;

pub mod identity;
pub use identity::Identity;
mod task;
pub use task::{Task, TaskId, TaskPatch, TaskPriority, TaskStatus};
pub mod recurrence;
pub use recurrence::RecurrencePattern;
pub mod source;
pub use source::CalendarSource;
mod event;
pub use event::{DisplayEvent, EventResource};

pub mod traits;
pub mod store;
pub mod fetch;

pub mod ical;
pub mod aggregator;
pub mod agenda;
pub use agenda::Agenda;

pub mod mock_behaviour;
