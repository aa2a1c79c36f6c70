use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

pub type TaskId = i64;

/// Time given to a task when the user does not say otherwise, in minutes.
pub const DEFAULT_TASK_MINUTES: u32 = 15;

/// Daily limit given to an owner the first time their settings are read, in minutes.
pub const DEFAULT_DAILY_LIMIT: u32 = 240;

/// The two lists a task can live in. Only `Today` counts against the
/// daily limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Today,
    Backlog,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Today => "today",
            ListType::Backlog => "backlog",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(ListType::Today),
            "backlog" => Ok(ListType::Backlog),
            _ => Err(PlanError::UnknownListType(s.to_string())),
        }
    }
}

/// A single task, saved as an entry in the task table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub time: u32, // in minutes
    pub list_type: ListType,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_today(&self) -> bool {
        self.list_type == ListType::Today
    }
}

/// A validated task that has not been stored yet. Stores assign the id
/// and the creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub time: u32,
    pub list_type: ListType,
    pub owner_id: String,
}

impl NewTask {
    pub fn new(title: &str, time: i64, list_type: ListType, owner_id: &str) -> PlanResult<NewTask> {
        Ok(NewTask {
            title: validate_title(title)?,
            time: validate_duration(time)?,
            list_type,
            owner_id: owner_id.to_string(),
        })
    }
}

/// Partial changes to a stored task. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskUpdate {
    pub time: Option<u32>,
    pub list_type: Option<ListType>,
}

impl TaskUpdate {
    pub fn time(time: u32) -> TaskUpdate {
        TaskUpdate {
            time: Some(time),
            list_type: None,
        }
    }

    pub fn list(list_type: ListType) -> TaskUpdate {
        TaskUpdate {
            time: None,
            list_type: Some(list_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.list_type.is_none()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(time) = self.time {
            task.time = time;
        }
        if let Some(list_type) = self.list_type {
            task.list_type = list_type;
        }
    }
}

/// Per owner settings. There is at most one record per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub owner_id: String,
    pub daily_limit_minutes: u32,
}

/// Trim a title, rejecting it if nothing is left.
pub fn validate_title(title: &str) -> PlanResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PlanError::EmptyTitle);
    }
    Ok(title.to_string())
}

pub fn validate_duration(minutes: i64) -> PlanResult<u32> {
    positive_minutes(minutes).ok_or(PlanError::NonPositiveDuration(minutes))
}

pub fn validate_limit(minutes: i64) -> PlanResult<u32> {
    positive_minutes(minutes).ok_or(PlanError::NonPositiveLimit(minutes))
}

fn positive_minutes(minutes: i64) -> Option<u32> {
    if minutes <= 0 {
        return None;
    }
    u32::try_from(minutes).ok()
}
