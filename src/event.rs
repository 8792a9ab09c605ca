//! The unified calendar event shape returned to clients
//!
//! A [`DisplayEvent`] is not persisted anywhere: it is computed on every calendar view by
//! merging the user's own due-dated tasks with the events of their registered feeds, and
//! serializes directly to the JSON shape calendar UIs expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceId;
use crate::task::{TaskPriority, TaskStatus};

/// What an event was derived from, with the source-specific display data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventResource {
    /// Derived from an internal task
    Task {
        priority: TaskPriority,
        status: TaskStatus,
    },
    /// Derived from a registered external feed
    Calendar {
        color: Option<String>,
        #[serde(rename = "sourceId")]
        source_id: SourceId,
    },
}

/// A single displayable calendar event.
///
/// `start <= end` always holds. Timestamps serialize as ISO-8601 / RFC 3339.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayEvent {
    /// The task id for task-derived events; `{sourceId}-{eventUid}` for feed events, so
    /// identical UIDs across two feeds cannot collide
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(rename = "allDay")]
    pub all_day: bool,
    pub resource: EventResource,
}
