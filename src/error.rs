//! Error types shared by the planner, the allocation engine and the stores.

use thiserror::Error;

use crate::model::TaskId;

#[derive(Error, Debug)]
pub enum PlanError {
    // Validation
    #[error("Task title must not be empty.")]
    EmptyTitle,

    #[error("Task duration must be between 1 and {max} minutes, got {0}.", max = u32::MAX)]
    NonPositiveDuration(i64),

    #[error("Daily limit must be between 1 and {max} minutes, got {0}.", max = u32::MAX)]
    NonPositiveLimit(i64),

    #[error("Unknown list '{0}', expected 'today' or 'backlog'.")]
    UnknownListType(String),

    #[error("Nothing to change: give a new time or a new list.")]
    EmptyUpdate,

    // Not found
    #[error("Task {id} not found.")]
    TaskNotFound { id: TaskId },

    #[error("No settings stored for owner '{owner}'.")]
    SettingsNotFound { owner: String },

    // Collaborator failures
    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl PlanError {
    /// Input was rejected before anything was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PlanError::EmptyTitle
                | PlanError::NonPositiveDuration(_)
                | PlanError::NonPositiveLimit(_)
                | PlanError::UnknownListType(_)
                | PlanError::EmptyUpdate
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlanError::TaskNotFound { .. } | PlanError::SettingsNotFound { .. }
        )
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
