//! A ready-to-use [`TaskStore`] backed by a JSON file
//!
//! This keeps every record in memory behind a mutex and (optionally) mirrors the whole
//! state to a backing file after each mutation. It is the reference implementation the
//! tests run against; a production deployment would put a real relational store behind the
//! same trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::identity::UserId;
use crate::source::{CalendarSource, SourceId};
use crate::task::{Task, TaskId, TaskPatch, TaskStatus};
use crate::traits::TaskStore;

#[cfg(feature = "fault_injection")]
use std::sync::Arc;

#[cfg(feature = "fault_injection")]
use crate::mock_behaviour::MockBehaviour;

/// The name reported by [`StoreError::SchemaMissing`] for the feed registration table
pub const SOURCE_TABLE: &str = "calendar_sources";

#[derive(Default, Debug, Serialize, Deserialize)]
struct StoreData {
    tasks: HashMap<TaskId, Task>,
    sources: HashMap<SourceId, CalendarSource>,
}

/// A store that keeps its records in memory, optionally mirrored to a JSON file
#[derive(Debug)]
pub struct JsonStore {
    backing_file: Option<PathBuf>,
    data: Mutex<StoreData>,

    /// When false, every calendar-source operation reports [`StoreError::SchemaMissing`],
    /// simulating a deployment whose calendar setup step has not been run yet
    source_table_ready: bool,

    #[cfg(feature = "fault_injection")]
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl JsonStore {
    /// An empty store that lives in memory only
    pub fn new() -> Self {
        Self {
            backing_file: None,
            data: Mutex::new(StoreData::default()),
            source_table_ready: true,
            #[cfg(feature = "fault_injection")]
            mock_behaviour: None,
        }
    }

    /// An empty store that will mirror its state to `path` after each change
    pub fn with_backing_file(path: &Path) -> Self {
        let mut store = Self::new();
        store.backing_file = Some(PathBuf::from(path));
        store
    }

    /// Load a store from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let file = std::fs::File::open(path)
            .map_err(|err| StoreError::Backend(format!("unable to open file {:?}: {}", path, err)))?;
        let data: StoreData = serde_json::from_reader(file)
            .map_err(|err| StoreError::Backend(format!("unable to parse file {:?}: {}", path, err)))?;

        Ok(Self {
            backing_file: Some(PathBuf::from(path)),
            data: Mutex::new(data),
            source_table_ready: true,
            #[cfg(feature = "fault_injection")]
            mock_behaviour: None,
        })
    }

    /// Simulate a deployment where the calendar-source table is not provisioned
    pub fn without_source_table(mut self) -> Self {
        self.source_table_ready = false;
        self
    }

    #[cfg(feature = "fault_injection")]
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// Store the current state to the backing file, if any
    fn save_to_file(&self, data: &StoreData) {
        let path = match &self.backing_file {
            None => return,
            Some(path) => path,
        };

        let file = match std::fs::File::create(path) {
            Err(err) => {
                log::warn!("Unable to save file {:?}: {}", path, err);
                return;
            }
            Ok(f) => f,
        };

        if let Err(err) = serde_json::to_writer(file, data) {
            log::warn!("Unable to serialize: {}", err);
        }
    }

    fn check_source_table(&self) -> Result<(), StoreError> {
        if self.source_table_ready {
            Ok(())
        } else {
            Err(StoreError::SchemaMissing { table: SOURCE_TABLE })
        }
    }
}

impl Default for JsonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "fault_injection")]
macro_rules! mock_check {
    ($self:ident, $method:ident) => {
        if let Some(behaviour) = &$self.mock_behaviour {
            behaviour.lock().unwrap().$method()?;
        }
    };
}
#[cfg(not(feature = "fault_injection"))]
macro_rules! mock_check {
    ($self:ident, $method:ident) => {};
}

#[async_trait]
impl TaskStore for JsonStore {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        mock_check!(self, can_insert_task);

        let mut data = self.data.lock().unwrap();
        data.tasks.insert(task.id.clone(), task.clone());
        self.save_to_file(&data);
        Ok(task)
    }

    async fn task_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        mock_check!(self, can_list_tasks);

        let data = self.data.lock().unwrap();
        Ok(data.tasks.get(id).cloned())
    }

    async fn tasks_for_user(&self, user: &UserId) -> Result<Vec<Task>, StoreError> {
        mock_check!(self, can_list_tasks);

        let data = self.data.lock().unwrap();
        let mut tasks: Vec<Task> = data
            .tasks
            .values()
            .filter(|task| &task.user_id == user)
            .cloned()
            .collect();
        // newest first; the id tie-break keeps the order deterministic
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn tasks_with_due_date(&self, user: &UserId) -> Result<Vec<Task>, StoreError> {
        mock_check!(self, can_list_tasks);

        let data = self.data.lock().unwrap();
        let mut tasks: Vec<Task> = data
            .tasks
            .values()
            .filter(|task| &task.user_id == user && task.due_date.is_some())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        mock_check!(self, can_update_task);

        let mut data = self.data.lock().unwrap();
        let task = match data.tasks.get_mut(id) {
            None => return Err(StoreError::NotFound),
            Some(task) => {
                patch.apply(task);
                task.clone()
            }
        };
        self.save_to_file(&data);
        Ok(task)
    }

    async fn complete_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        mock_check!(self, can_complete_task);

        // Check-and-set under the same lock: two concurrent completions can never both
        // observe a non-completed task
        let mut data = self.data.lock().unwrap();
        let completed = match data.tasks.get_mut(id) {
            None => return Err(StoreError::NotFound),
            Some(task) => {
                if task.status == TaskStatus::Completed {
                    return Ok(None);
                }
                task.status = TaskStatus::Completed;
                task.updated_at = chrono::Utc::now();
                task.clone()
            }
        };
        self.save_to_file(&data);
        Ok(Some(completed))
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        if data.tasks.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        self.save_to_file(&data);
        Ok(())
    }

    async fn insert_source(&self, source: CalendarSource) -> Result<CalendarSource, StoreError> {
        self.check_source_table()?;
        mock_check!(self, can_insert_source);

        let mut data = self.data.lock().unwrap();
        data.sources.insert(source.id.clone(), source.clone());
        self.save_to_file(&data);
        Ok(source)
    }

    async fn source_by_id(&self, id: &SourceId) -> Result<Option<CalendarSource>, StoreError> {
        self.check_source_table()?;
        mock_check!(self, can_list_sources);

        let data = self.data.lock().unwrap();
        Ok(data.sources.get(id).cloned())
    }

    async fn sources_for_user(&self, user: &UserId) -> Result<Vec<CalendarSource>, StoreError> {
        self.check_source_table()?;
        mock_check!(self, can_list_sources);

        let data = self.data.lock().unwrap();
        let mut sources: Vec<CalendarSource> = data
            .sources
            .values()
            .filter(|source| &source.user_id == user)
            .cloned()
            .collect();
        sources.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sources)
    }

    async fn delete_source(&self, id: &SourceId) -> Result<(), StoreError> {
        self.check_source_table()?;

        let mut data = self.data.lock().unwrap();
        if data.sources.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        self.save_to_file(&data);
        Ok(())
    }
}
