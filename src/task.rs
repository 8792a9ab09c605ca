//! To-do tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::recurrence::RecurrencePattern;

/// The internal identifier of a task
pub type TaskId = String;

/// Where a task stands in its life
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// How urgent a task is. This mostly drives display colors in clients.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// A work item owned by exactly one user.
///
/// Ownership is the unit of access control: only the owner (or an admin) may read or
/// modify a task. Fields are validated at the store boundary, so a `Task` held in memory
/// is always well-formed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,

    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Tasks without a due date exist (they just never show up in the calendar view)
    pub due_date: Option<DateTime<Utc>>,

    pub is_recurring: bool,
    /// Meaningless unless `is_recurring` is set
    pub recurrence_pattern: Option<RecurrencePattern>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a brand new pending task with a fresh (random) id
    pub fn new<S: ToString>(user_id: &UserId, title: S) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_hyphenated().to_string(),
            user_id: user_id.clone(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            due_date: None,
            is_recurring: false,
            recurrence_pattern: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// A partial update to a task. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply this patch to a task, refreshing its "updated" timestamp
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(is_recurring) = self.is_recurring {
            task.is_recurring = is_recurring;
        }
        if let Some(pattern) = &self.recurrence_pattern {
            task.recurrence_pattern = Some(pattern.clone());
        }
        task.updated_at = Utc::now();
    }
}
