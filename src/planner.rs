//! The operations offered to the command line: reads the owner's state from
//! a backend, asks the allocation engine what to do and persists the result.

use log::{debug, info, warn};
use serde::Serialize;

use crate::allocation::{self, Totals};
use crate::error::{PlanError, PlanResult};
use crate::model::{
    validate_duration, validate_limit, ListType, NewTask, Settings, Task, TaskId, TaskUpdate,
    DEFAULT_DAILY_LIMIT, DEFAULT_TASK_MINUTES,
};
use crate::store::Backend;

/// Explicit choices that override the defaults when adding tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    /// Minutes for every task in the batch instead of the default duration.
    pub time: Option<i64>,
    /// Put every task in this list, without checking the daily limit.
    pub list_type: Option<ListType>,
}

/// Result of a batch add. Titles are stored independently, so some may fail
/// while the others stay stored.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<Task>,
    pub failed: Vec<(String, PlanError)>,
}

impl BatchOutcome {
    pub fn in_list(&self, list_type: ListType) -> impl Iterator<Item = &Task> + '_ {
        self.created
            .iter()
            .filter(move |task| task.list_type == list_type)
    }
}

/// Everything needed to show an owner's day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub settings: Settings,
    pub tasks: Vec<Task>,
    pub totals: Totals,
}

impl Overview {
    pub fn list(&self, list_type: ListType) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.list_type == list_type)
            .collect()
    }
}

pub struct Planner<B: Backend> {
    store: B,
}

impl<B: Backend> Planner<B> {
    pub fn new(store: B) -> Planner<B> {
        debug!("planner using the {} backend", store.name());
        Planner { store }
    }

    pub fn tasks(&self, owner_id: &str) -> PlanResult<Vec<Task>> {
        self.store.list(owner_id)
    }

    /// Tasks, settings and totals of an owner. Creates default settings on
    /// first use.
    pub fn overview(&mut self, owner_id: &str) -> PlanResult<Overview> {
        let settings = self.settings(owner_id)?;
        let tasks = self.tasks(owner_id)?;
        let totals = allocation::compute_totals(&tasks, settings.daily_limit_minutes);
        Ok(Overview {
            settings,
            tasks,
            totals,
        })
    }

    /// Add one task per non blank title. Without an explicit list each title
    /// goes to today while it still fits the daily limit, and to the backlog
    /// from then on. A batch with only blank titles is a no-op, whatever
    /// the requested time.
    pub fn add_tasks<S: AsRef<str>>(
        &mut self,
        owner_id: &str,
        titles: &[S],
        options: AddOptions,
    ) -> PlanResult<BatchOutcome> {
        if titles.iter().all(|title| title.as_ref().trim().is_empty()) {
            debug!("nothing to add for {}", owner_id);
            return Ok(BatchOutcome::default());
        }

        let duration = match options.time {
            Some(minutes) => validate_duration(minutes)?,
            None => DEFAULT_TASK_MINUTES,
        };

        let planned = match options.list_type {
            Some(list_type) => allocation::batch_into(titles, owner_id, list_type, duration)?,
            None => {
                let overview = self.overview(owner_id)?;
                allocation::batch_add(
                    titles,
                    owner_id,
                    overview.totals.total_time,
                    overview.settings.daily_limit_minutes,
                    duration,
                )?
            }
        };

        let mut outcome = BatchOutcome::default();
        for task in planned {
            let title = task.title.clone();
            match self.store.create(task) {
                Ok(task) => {
                    debug!("created task {} in {}", task.id, task.list_type);
                    outcome.created.push(task);
                }
                Err(err) => {
                    warn!("failed to store '{}': {}", title, err);
                    outcome.failed.push((title, err));
                }
            }
        }

        let deferred = outcome.in_list(ListType::Backlog).count();
        if deferred > 0 && options.list_type.is_none() {
            info!("{} task(s) did not fit today and went to the backlog", deferred);
        }
        Ok(outcome)
    }

    /// Store a single, fully specified task.
    pub fn create_task(
        &mut self,
        owner_id: &str,
        title: &str,
        time: i64,
        list_type: ListType,
    ) -> PlanResult<Task> {
        let task = NewTask::new(title, time, list_type, owner_id)?;
        let task = self.store.create(task)?;
        debug!("created task {} in {}", task.id, task.list_type);
        Ok(task)
    }

    /// Apply a time and/or list change to the task with this id, whoever owns it.
    pub fn update_task(&mut self, id: TaskId, changes: TaskUpdate) -> PlanResult<Task> {
        if changes.is_empty() {
            return Err(PlanError::EmptyUpdate);
        }
        let task = self
            .store
            .update(id, &changes)?
            .ok_or(PlanError::TaskNotFound { id })?;
        debug!("updated task {}: {:?}", id, changes);
        Ok(task)
    }

    pub fn retime_task(&mut self, id: TaskId, minutes: i64) -> PlanResult<Task> {
        let changes = allocation::retime(minutes)?;
        self.update_task(id, changes)
    }

    pub fn move_task(&mut self, id: TaskId, target: ListType) -> PlanResult<Task> {
        self.update_task(id, allocation::move_task(target))
    }

    pub fn delete_task(&mut self, id: TaskId) -> PlanResult<()> {
        if !self.store.delete(id)? {
            return Err(PlanError::TaskNotFound { id });
        }
        debug!("deleted task {}", id);
        Ok(())
    }

    /// Remove every task of an owner. Clearing an empty owner is not an error.
    pub fn clear_all(&mut self, owner_id: &str) -> PlanResult<usize> {
        let removed = self.store.delete_all_for_owner(owner_id)?;
        debug!("cleared {} task(s) for {}", removed, owner_id);
        Ok(removed)
    }

    /// Settings of an owner, created with the default limit on first access.
    pub fn settings(&mut self, owner_id: &str) -> PlanResult<Settings> {
        self.store.get_or_create(owner_id, DEFAULT_DAILY_LIMIT)
    }

    /// Change the daily limit. An owner without settings gets them created
    /// with the new limit.
    pub fn set_daily_limit(&mut self, owner_id: &str, minutes: i64) -> PlanResult<Settings> {
        let limit = validate_limit(minutes)?;
        let settings = match self.store.get(owner_id)? {
            None => self.store.get_or_create(owner_id, limit)?,
            Some(_) => self
                .store
                .update_limit(owner_id, limit)?
                .ok_or_else(|| PlanError::SettingsNotFound {
                    owner: owner_id.to_string(),
                })?,
        };
        debug!("daily limit of {} is now {}", owner_id, limit);
        Ok(settings)
    }
}
