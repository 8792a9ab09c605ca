use async_trait::async_trait;
use url::Url;

use crate::error::{FetchError, StoreError};
use crate::identity::UserId;
use crate::source::{CalendarSource, SourceId};
use crate::task::{Task, TaskId, TaskPatch};

/// The storage seam of the crate.
///
/// Implementations map onto a relational store in production; the bundled
/// [`JsonStore`](crate::store::JsonStore) keeps everything in memory (optionally mirrored
/// to a JSON file) and is what the tests run against.
///
/// Implementations must report a missing backing table as
/// [`StoreError::SchemaMissing`] so that callers can degrade gracefully instead of
/// failing the whole request.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError>;
    async fn task_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// All tasks of one user, newest first
    async fn tasks_for_user(&self, user: &UserId) -> Result<Vec<Task>, StoreError>;

    /// The user's tasks that carry a due date, ordered by due date.
    /// This is the calendar view's task query.
    async fn tasks_with_due_date(&self, user: &UserId) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError>;

    /// Flip a task to completed, but only if it is not completed already.
    ///
    /// Returns the freshly completed task, or `None` when the task was already completed
    /// (the analog of an `UPDATE ... WHERE status <> 'completed'` reporting zero affected
    /// rows). The check and the write must be one atomic step: this is what keeps two
    /// concurrent completions of the same recurring task from both spawning a successor.
    async fn complete_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, id: &TaskId) -> Result<(), StoreError>;

    async fn insert_source(&self, source: CalendarSource) -> Result<CalendarSource, StoreError>;
    async fn source_by_id(&self, id: &SourceId) -> Result<Option<CalendarSource>, StoreError>;

    /// All feed registrations of one user, oldest first
    async fn sources_for_user(&self, user: &UserId) -> Result<Vec<CalendarSource>, StoreError>;

    async fn delete_source(&self, id: &SourceId) -> Result<(), StoreError>;
}

/// Retrieves the raw text body of a feed URL.
///
/// The bundled implementation is [`HttpFetcher`](crate::fetch::HttpFetcher); tests swap in
/// canned bodies. No retrying here: a failed feed is simply skipped for this view.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}
