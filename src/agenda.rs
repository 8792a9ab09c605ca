//! The central façade of the crate
//!
//! An [`Agenda`] combines a [`TaskStore`] and a [`FeedFetcher`] and exposes the
//! operations the surrounding application routes requests to. It is also where access
//! control lives: every operation takes the caller's [`Identity`] and enforces the
//! owner-or-admin rule before touching anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::aggregator;
use crate::error::{AgendaError, StoreError};
use crate::event::DisplayEvent;
use crate::ical;
use crate::identity::{Identity, UserId};
use crate::recurrence::{self, RecurrencePattern};
use crate::source::{self, normalize_feed_url, CalendarSource, SourceId};
use crate::task::{Task, TaskId, TaskPatch, TaskPriority, TaskStatus};
use crate::traits::{FeedFetcher, TaskStore};

/// The input to [`Agenda::create_task`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Admins may assign the task to another user; everyone else creates for themselves
    pub assignee: Option<UserId>,
}

/// The input to [`Agenda::add_source`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: Option<String>,
}

/// What [`Agenda::update_task`] did
#[derive(Debug)]
pub struct TaskUpdateOutcome {
    /// The task after the update
    pub task: Task,
    /// Set when completing a recurring task could not materialize its follow-up.
    /// The update itself still stands, the chain is just broken at this link.
    pub successor_error: Option<StoreError>,
}

/// A store and a fetcher, glued together into the operations clients call.
///
/// `store` holds the users' own records; `fetcher` retrieves their registered external
/// feeds. Both sit behind traits on purpose: tests swap in an in-memory store and canned
/// feed bodies and exercise the exact same code paths.
pub struct Agenda<S, F>
where
    S: TaskStore,
    F: FeedFetcher,
{
    store: S,
    fetcher: F,
}

impl<S, F> Agenda<S, F>
where
    S: TaskStore,
    F: FeedFetcher,
{
    pub fn new(store: S, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    /// Direct access to the underlying store.
    ///
    /// Apart from tests and maintenance tooling, there are very few (if any) reasons to
    /// bypass the [`Agenda`] operations.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The unified calendar view: the caller's due-dated tasks as one-hour events,
    /// followed by the events of each of their registered feeds, in registration order.
    ///
    /// Failures are contained aggressively, because this powers the user's main screen:
    /// a missing source table degrades to tasks-only, and a broken feed is logged and
    /// skipped without disturbing the other sources. Only a failure of the caller's own
    /// task store makes the whole request fail.
    pub async fn list_events(&self, who: &Identity) -> Result<Vec<DisplayEvent>, AgendaError> {
        let tasks = self.store.tasks_with_due_date(&who.user_id).await?;
        let mut events: Vec<DisplayEvent> = tasks.iter().filter_map(aggregator::task_event).collect();

        let sources = match self.store.sources_for_user(&who.user_id).await {
            Ok(sources) => sources,
            Err(StoreError::SchemaMissing { table }) => {
                log::warn!("The '{}' table is missing, returning internal tasks only", table);
                return Ok(events);
            }
            Err(other) => return Err(other.into()),
        };

        for source in &sources {
            match aggregator::collect_source_events(&self.fetcher, source).await {
                Ok(mut source_events) => events.append(&mut source_events),
                Err(err) => {
                    log::warn!(
                        "Unable to fetch/parse calendar {}: {}, skipping this time.",
                        source.name,
                        err
                    );
                }
            }
        }

        Ok(events)
    }

    /// The caller's own tasks, newest first
    pub async fn list_tasks(&self, who: &Identity) -> Result<Vec<Task>, AgendaError> {
        Ok(self.store.tasks_for_user(&who.user_id).await?)
    }

    /// Another user's tasks. Admins only (listing your own goes through [`Self::list_tasks`])
    pub async fn list_tasks_for(&self, who: &Identity, user: &UserId) -> Result<Vec<Task>, AgendaError> {
        if !who.can_act_on(user) {
            return Err(AgendaError::Forbidden);
        }
        Ok(self.store.tasks_for_user(user).await?)
    }

    pub async fn create_task(&self, who: &Identity, new_task: NewTask) -> Result<Task, AgendaError> {
        if new_task.title.trim().is_empty() {
            return Err(AgendaError::InvalidInput("a task needs a title".to_string()));
        }

        let owner = match &new_task.assignee {
            Some(assignee) if assignee != &who.user_id => {
                if !who.is_admin {
                    return Err(AgendaError::Forbidden);
                }
                assignee.clone()
            }
            _ => who.user_id.clone(),
        };

        let mut task = Task::new(&owner, new_task.title.trim());
        task.description = new_task.description;
        if let Some(priority) = new_task.priority {
            task.priority = priority;
        }
        task.due_date = new_task.due_date;
        task.is_recurring = new_task.is_recurring;
        task.recurrence_pattern = new_task.recurrence_pattern;

        Ok(self.store.insert_task(task).await?)
    }

    /// Apply a partial update to a task.
    ///
    /// Setting `status` to completed goes through the store's conditional completion, so
    /// re-completing an already-completed task is a no-op. A genuine completion of a
    /// recurring task materializes the next occurrence as a side effect; if that insert
    /// fails, the completion is NOT rolled back and the error is reported in the outcome
    /// (the user marked their task done, a broken chain must not take that away).
    pub async fn update_task(
        &self,
        who: &Identity,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> Result<TaskUpdateOutcome, AgendaError> {
        let existing = self
            .store
            .task_by_id(task_id)
            .await?
            .ok_or(AgendaError::NotFound)?;
        if !who.can_act_on(&existing.user_id) {
            return Err(AgendaError::Forbidden);
        }

        let mut patch = patch;
        let completed_now = if patch.status == Some(TaskStatus::Completed) {
            patch.status = None;
            self.store.complete_task(task_id).await?
        } else {
            None
        };

        let task = if patch.is_empty() {
            match &completed_now {
                Some(task) => task.clone(),
                None => self
                    .store
                    .task_by_id(task_id)
                    .await?
                    .ok_or(AgendaError::NotFound)?,
            }
        } else {
            self.store.update_task(task_id, patch).await?
        };

        let mut successor_error = None;
        if let Some(done) = completed_now {
            if done.is_recurring {
                let follow_up = recurrence::successor_of(&done);
                log::info!(
                    "Task {} recurs, materializing its next occurrence {}",
                    done.id,
                    follow_up.id
                );
                if let Err(err) = self.store.insert_task(follow_up).await {
                    log::error!(
                        "Unable to create the next occurrence of task {}: {}",
                        done.id,
                        err
                    );
                    successor_error = Some(err);
                }
            }
        }

        Ok(TaskUpdateOutcome {
            task,
            successor_error,
        })
    }

    pub async fn delete_task(&self, who: &Identity, task_id: &TaskId) -> Result<(), AgendaError> {
        let existing = self
            .store
            .task_by_id(task_id)
            .await?
            .ok_or(AgendaError::NotFound)?;
        if !who.can_act_on(&existing.user_id) {
            return Err(AgendaError::Forbidden);
        }

        self.store.delete_task(task_id).await?;
        Ok(())
    }

    /// Register an external feed for the caller.
    ///
    /// A missing source table surfaces as [`AgendaError::SetupRequired`], telling the
    /// operator to run the calendar setup step rather than hiding behind a generic error.
    pub async fn add_source(&self, who: &Identity, new_source: NewSource) -> Result<CalendarSource, AgendaError> {
        if new_source.name.trim().is_empty() {
            return Err(AgendaError::InvalidInput(
                "a calendar source needs a name".to_string(),
            ));
        }
        let url = Url::parse(new_source.url.trim()).map_err(|err| {
            AgendaError::InvalidInput(format!("'{}' is not a valid URL: {}", new_source.url, err))
        })?;
        // reject registrations that could never be fetched later
        normalize_feed_url(&url).map_err(|err| AgendaError::InvalidInput(err.to_string()))?;
        if let Some(color) = &new_source.color {
            source::validate_color(color).map_err(AgendaError::InvalidInput)?;
        }

        let created = CalendarSource::new(
            &who.user_id,
            new_source.name.trim(),
            url,
            new_source.kind,
            new_source.color,
        );
        Ok(self.store.insert_source(created).await?)
    }

    /// The caller's registered feeds, newest first
    pub async fn list_sources(&self, who: &Identity) -> Result<Vec<CalendarSource>, AgendaError> {
        let mut sources = self.store.sources_for_user(&who.user_id).await?;
        sources.reverse();
        Ok(sources)
    }

    pub async fn delete_source(&self, who: &Identity, source_id: &SourceId) -> Result<(), AgendaError> {
        let existing = self
            .store
            .source_by_id(source_id)
            .await?
            .ok_or(AgendaError::NotFound)?;
        if !who.can_act_on(&existing.user_id) {
            return Err(AgendaError::Forbidden);
        }

        self.store.delete_source(source_id).await?;
        Ok(())
    }

    /// Export the caller's due-dated tasks as an iCal feed other apps can subscribe to
    pub async fn export_feed(&self, who: &Identity) -> Result<String, AgendaError> {
        let tasks = self.store.tasks_with_due_date(&who.user_id).await?;
        Ok(ical::build_feed(&tasks))
    }
}
