//! Core type definitions shared by tasks, the requirement map and the dispatcher.
//!
//! This module defines task identifiers, the task lifecycle status and the tags
//! returned by each scheduler tick.

use std::fmt;

use uuid::Uuid;

/// Opaque, globally unique task identifier.
///
/// Assigned with [`TaskId::new`] (a random v4 UUID) when a task is created without one.
/// Two tasks are the same task for the dispatcher iff their ids are equal.
///
/// # Examples
///
/// ```
/// use reqx::TaskId;
///
/// let a = TaskId::new();
/// let b = TaskId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle status of a [`Task`](crate::Task).
///
/// ```text
/// Waiting --invoke--> Evaluating --ok--> Dispatched
///                                --err/panic--> Error
/// Waiting | Error --reset--> Waiting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskStatus {
    /// Registered, some requirements may still be outstanding.
    Waiting,
    /// The method is currently running.
    Evaluating,
    /// The method returned successfully. Terminal.
    Dispatched,
    /// The method failed or panicked.
    Error,
}

impl TaskStatus {
    /// `true` for `Dispatched` and `Error`.
    pub fn is_finished(self) -> bool {
        matches!(self, TaskStatus::Dispatched | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Evaluating => "evaluating",
            TaskStatus::Dispatched => "dispatched",
            TaskStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// What a single [`TaskDispatcher::do_action`](crate::TaskDispatcher::do_action) tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// A newly discovered requirement was announced to the producer.
    SentRequirement,
    /// A ready task was invoked.
    DispatchedTask,
    /// An inbound requirement resolution was absorbed.
    ProcessedRequirement,
    /// Every queue was empty.
    Idle,
}

impl Action {
    /// Human readable tag, e.g. `"Sent Requirement"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::SentRequirement => "Sent Requirement",
            Action::DispatchedTask => "Dispatched Task",
            Action::ProcessedRequirement => "Processed Requirement",
            Action::Idle => "idle",
        }
    }

    pub fn is_idle(self) -> bool {
        self == Action::Idle
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to treat a task id that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicatePolicy {
    /// Keep the first registration and silently drop the new one.
    #[default]
    Ignore,
    /// Fail with [`DispatchError::DuplicateTaskId`](crate::DispatchError::DuplicateTaskId).
    Reject,
}

/// How to treat an inbound requirement message that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidMessagePolicy {
    /// Drop it; it never enters the received queue.
    #[default]
    Drop,
    /// Fail with [`DispatchError::InvalidRequirementMessage`](crate::DispatchError::InvalidRequirementMessage).
    Reject,
}
