//! Storage contracts for tasks and settings, and the backends that satisfy them.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::PlanResult;
use crate::model::{NewTask, Settings, Task, TaskId, TaskUpdate};

/// Task persistence. Ids are unique across owners, so `update` and `delete`
/// only need the id.
pub trait TaskRepository {
    /// All tasks of an owner, oldest first.
    fn list(&self, owner_id: &str) -> PlanResult<Vec<Task>>;

    /// Store a task, assigning its id and creation time.
    fn create(&mut self, task: NewTask) -> PlanResult<Task>;

    /// Apply partial changes. `None` when no task has this id.
    fn update(&mut self, id: TaskId, changes: &TaskUpdate) -> PlanResult<Option<Task>>;

    /// `false` when no task has this id.
    fn delete(&mut self, id: TaskId) -> PlanResult<bool>;

    /// Remove every task of an owner and return how many went away.
    fn delete_all_for_owner(&mut self, owner_id: &str) -> PlanResult<usize>;
}

/// Per owner settings persistence.
pub trait SettingsStore {
    fn get(&self, owner_id: &str) -> PlanResult<Option<Settings>>;

    /// Return the stored settings, creating them with `default_limit` first
    /// if the owner has none.
    fn get_or_create(&mut self, owner_id: &str, default_limit: u32) -> PlanResult<Settings>;

    /// Change the daily limit of an existing record. Never creates one:
    /// `None` when the owner has no settings yet.
    fn update_limit(&mut self, owner_id: &str, daily_limit: u32) -> PlanResult<Option<Settings>>;
}

/// Everything the planner needs from a backend.
pub trait Backend: TaskRepository + SettingsStore {
    fn name(&self) -> &'static str;
}
