use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use super::{Backend, SettingsStore, TaskRepository};
use crate::error::PlanResult;
use crate::model::{NewTask, Settings, Task, TaskId, TaskUpdate};

/// Ephemeral backend living in the process. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, Task>,
    settings: HashMap<String, Settings>,
    next_id: TaskId,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            tasks: BTreeMap::new(),
            settings: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl TaskRepository for MemoryStore {
    fn list(&self, owner_id: &str) -> PlanResult<Vec<Task>> {
        Ok(self
            .tasks
            .values()
            .filter(|task| task.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn create(&mut self, task: NewTask) -> PlanResult<Task> {
        let id = self.next_id;
        self.next_id += 1;
        let task = Task {
            id,
            title: task.title,
            time: task.time,
            list_type: task.list_type,
            owner_id: task.owner_id,
            created_at: Utc::now(),
        };
        self.tasks.insert(id, task.clone());
        Ok(task)
    }

    fn update(&mut self, id: TaskId, changes: &TaskUpdate) -> PlanResult<Option<Task>> {
        Ok(self.tasks.get_mut(&id).map(|task| {
            changes.apply_to(task);
            task.clone()
        }))
    }

    fn delete(&mut self, id: TaskId) -> PlanResult<bool> {
        Ok(self.tasks.remove(&id).is_some())
    }

    fn delete_all_for_owner(&mut self, owner_id: &str) -> PlanResult<usize> {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.owner_id != owner_id);
        Ok(before - self.tasks.len())
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, owner_id: &str) -> PlanResult<Option<Settings>> {
        Ok(self.settings.get(owner_id).cloned())
    }

    fn get_or_create(&mut self, owner_id: &str, default_limit: u32) -> PlanResult<Settings> {
        Ok(self
            .settings
            .entry(owner_id.to_string())
            .or_insert_with(|| Settings {
                owner_id: owner_id.to_string(),
                daily_limit_minutes: default_limit,
            })
            .clone())
    }

    fn update_limit(&mut self, owner_id: &str, daily_limit: u32) -> PlanResult<Option<Settings>> {
        Ok(self.settings.get_mut(owner_id).map(|settings| {
            settings.daily_limit_minutes = daily_limit;
            settings.clone()
        }))
    }
}

impl Backend for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }
}
