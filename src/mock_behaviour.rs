//! This module provides ways to tweak a mocked store, so that it can return errors on some tests
#![cfg(feature = "fault_injection")]

use crate::error::StoreError;

/// This stores some behaviour tweaks, that describe how a mocked store will behave during a given test
///
/// So that a function fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    pub insert_task_behaviour: (u32, u32),
    pub update_task_behaviour: (u32, u32),
    pub complete_task_behaviour: (u32, u32),
    pub list_tasks_behaviour: (u32, u32),
    pub insert_source_behaviour: (u32, u32),
    pub list_sources_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            insert_task_behaviour: (0, n_fails),
            update_task_behaviour: (0, n_fails),
            complete_task_behaviour: (0, n_fails),
            list_tasks_behaviour: (0, n_fails),
            insert_source_behaviour: (0, n_fails),
            list_sources_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_insert_task(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.insert_task_behaviour, "insert_task")
    }
    pub fn can_update_task(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.update_task_behaviour, "update_task")
    }
    pub fn can_complete_task(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.complete_task_behaviour, "complete_task")
    }
    pub fn can_list_tasks(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.list_tasks_behaviour, "list_tasks")
    }
    pub fn can_insert_source(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.insert_source_behaviour, "insert_source")
    }
    pub fn can_list_sources(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.list_sources_behaviour, "list_sources")
    }
}

/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), StoreError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 = value.0 - 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else {
        if remaining_failures > 0 {
            value.1 = value.1 - 1;
            log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
            Err(StoreError::Backend(format!(
                "mocked behaviour requires this {} to fail this time ({:?})",
                descr, value
            )))
        } else {
            log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
            Ok(())
        }
    }
}
