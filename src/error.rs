//! Error types for scheduler operations.
//!
//! Registration-time problems (duplicate ids, rejected messages) only surface when the
//! dispatcher is configured to be strict. Execution-time failures always propagate out of
//! [`TaskDispatcher::do_action`](crate::TaskDispatcher::do_action) and
//! [`TaskDispatcher::run`](crate::TaskDispatcher::run); the scheduler never retries.

use crate::types::{TaskId, TaskStatus};

/// Errors that can occur while registering, resolving or executing tasks
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// A task with this id is already registered and duplicates are rejected
    #[error("Task {task_id} is already registered")]
    DuplicateTaskId { task_id: TaskId },

    /// No task with this id is known. Indicates a bug in the caller.
    #[error("Unknown task id {task_id}")]
    UnknownTaskId { task_id: TaskId },

    /// An inbound requirement resolution failed canonicalization or validation
    #[error("Invalid requirement message: {reason}")]
    InvalidRequirementMessage { reason: String },

    /// The task's method returned an error
    #[error("Task {task_id} failed during execution: {source}")]
    TaskExecution {
        task_id: TaskId,
        #[source]
        source: anyhow::Error,
    },

    /// The task's method panicked
    #[error(
        "Task {task_id} panicked during execution: {panic_message}\n\
         \n\
         A task panicked, indicating a bug. The task is marked as failed."
    )]
    TaskPanicked {
        task_id: TaskId,
        panic_message: String,
    },

    /// A lifecycle transition was attempted from a status that does not allow it
    #[error("Task {task_id} cannot {action} while {status}")]
    InvalidTransition {
        task_id: TaskId,
        status: TaskStatus,
        action: &'static str,
    },

    /// `invoke` was handed a value bundle lacking one of the task's requirements
    #[error("Task {task_id} has no resolved value for argument `{argument}`")]
    MissingRequirement { task_id: TaskId, argument: String },

    /// The dispatcher side of an inbox is gone; the submission was not delivered
    #[error("Dispatcher inbox is closed")]
    InboxClosed,
}

impl DispatchError {
    /// The task this error concerns, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            DispatchError::DuplicateTaskId { task_id }
            | DispatchError::UnknownTaskId { task_id }
            | DispatchError::TaskExecution { task_id, .. }
            | DispatchError::TaskPanicked { task_id, .. }
            | DispatchError::InvalidTransition { task_id, .. }
            | DispatchError::MissingRequirement { task_id, .. } => Some(*task_id),
            DispatchError::InvalidRequirementMessage { .. } | DispatchError::InboxClosed => None,
        }
    }

    /// `true` when the task itself failed (returned an error or panicked).
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            DispatchError::TaskExecution { .. } | DispatchError::TaskPanicked { .. }
        )
    }
}

/// Result type for scheduler operations
pub type DispatchResult<T> = Result<T, DispatchError>;
