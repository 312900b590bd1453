//! Deferred task invocations.
//!
//! A [`Task`] bundles a callable, the keyword arguments already known when the task was
//! created, and a mapping from the remaining argument names to the requirement keys that
//! will eventually supply them. The dispatcher calls [`Task::invoke`] once every key has
//! a resolved value.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "tracing")]
use tracing::{error, trace};

use crate::error::{DispatchError, DispatchResult};
use crate::types::{TaskId, TaskStatus};

/// Boxed task callable.
pub type TaskMethod<V> = Box<dyn FnMut(Arguments<V>) -> anyhow::Result<()> + Send>;

/// Merged keyword arguments handed to a task's method.
///
/// Contains the fixed arguments given at creation plus one entry per requirement
/// argument, filled from the resolved values.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments<V> {
    values: HashMap<String, V>,
}

impl<V> Arguments<V> {
    pub(crate) fn new(values: HashMap<String, V>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.values.get(name)
    }

    /// Like [`Arguments::get`], but a missing argument is an error the method can `?`.
    pub fn require(&self, name: &str) -> anyhow::Result<&V> {
        self.values
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("missing argument `{name}`"))
    }

    /// Move a value out of the arguments.
    pub fn take(&mut self, name: &str) -> Option<V> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_inner(self) -> HashMap<String, V> {
        self.values
    }
}

/// A deferred invocation waiting on external requirements.
///
/// Tasks are built with [`Task::new`] and the `arg` / `requires` builder methods.
/// Several argument names may map to the same requirement key; the key is then
/// announced and resolved once and its value copied into each argument.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use reqx::{Task, TaskStatus};
///
/// let mut task = Task::new(|args: reqx::Arguments<f64>| {
///     let similarity = args.require("similarity")?;
///     let weight = args.require("weight")?;
///     assert_eq!(similarity * weight, 1.4);
///     Ok(())
/// })
/// .arg("weight", 2.0)
/// .requires("similarity", "sim(cat,dog)");
///
/// assert!(task.requirements().contains("sim(cat,dog)"));
///
/// let resolved = HashMap::from([("sim(cat,dog)", 0.7)]);
/// task.invoke(&resolved).unwrap();
/// assert_eq!(task.status(), TaskStatus::Dispatched);
/// ```
pub struct Task<K, V> {
    id: TaskId,
    method: TaskMethod<V>,
    arguments: HashMap<String, V>,
    requirements: HashMap<String, K>,
    status: TaskStatus,
}

impl<K, V> Task<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a waiting task with a fresh id and no arguments.
    pub fn new<F>(method: F) -> Self
    where
        F: FnMut(Arguments<V>) -> anyhow::Result<()> + Send + 'static,
    {
        Self::from_parts(Box::new(method), HashMap::new(), HashMap::new(), None)
    }

    /// Create a waiting task from its parts. A fresh id is generated when `id` is `None`.
    pub fn from_parts(
        method: TaskMethod<V>,
        arguments: HashMap<String, V>,
        requirements: HashMap<String, K>,
        id: Option<TaskId>,
    ) -> Self {
        Self {
            id: id.unwrap_or_default(),
            method,
            arguments,
            requirements,
            status: TaskStatus::Waiting,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Add an argument whose value is already known.
    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: V) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    /// Declare that argument `name` is supplied by requirement `key`.
    #[must_use]
    pub fn requires(mut self, name: impl Into<String>, key: K) -> Self {
        self.requirements.insert(name.into(), key);
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Deduplicated set of requirement keys this task needs.
    pub fn requirements(&self) -> HashSet<K> {
        self.requirements.values().cloned().collect()
    }

    /// Argument name to requirement key mapping, as declared.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &K)> {
        self.requirements
            .iter()
            .map(|(name, key)| (name.as_str(), key))
    }

    /// Arguments fixed at creation time.
    pub fn arguments(&self) -> &HashMap<String, V> {
        &self.arguments
    }

    /// Call the task's method with its fixed arguments merged with `resolved`.
    ///
    /// Only a `Waiting` task can be invoked. The status moves to `Evaluating` for the
    /// duration of the call, then to `Dispatched` on success or `Error` when the method
    /// returns an error or panics.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the task is not `Waiting` (the method is not called)
    /// - `MissingRequirement` if `resolved` lacks a required key (status unchanged)
    /// - `TaskExecution` / `TaskPanicked` if the method fails
    pub fn invoke(&mut self, resolved: &HashMap<K, V>) -> DispatchResult<()> {
        if self.status != TaskStatus::Waiting {
            return Err(DispatchError::InvalidTransition {
                task_id: self.id,
                status: self.status,
                action: "invoke",
            });
        }

        let mut merged = self.arguments.clone();
        for (name, key) in &self.requirements {
            let value = resolved
                .get(key)
                .ok_or_else(|| DispatchError::MissingRequirement {
                    task_id: self.id,
                    argument: name.clone(),
                })?;
            merged.insert(name.clone(), value.clone());
        }

        #[cfg(feature = "tracing")]
        trace!(task_id = %self.id, arguments = merged.len(), "invoking task");

        self.status = TaskStatus::Evaluating;
        let method = &mut self.method;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| method(Arguments::new(merged))));

        match outcome {
            Ok(Ok(())) => {
                self.status = TaskStatus::Dispatched;
                Ok(())
            }
            Ok(Err(source)) => {
                self.status = TaskStatus::Error;

                #[cfg(feature = "tracing")]
                error!(task_id = %self.id, error = %source, "task failed");

                Err(DispatchError::TaskExecution {
                    task_id: self.id,
                    source,
                })
            }
            Err(payload) => {
                self.status = TaskStatus::Error;
                let panic_message = if let Some(s) = payload.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };

                #[cfg(feature = "tracing")]
                error!(task_id = %self.id, panic_message = %panic_message, "task panicked");

                Err(DispatchError::TaskPanicked {
                    task_id: self.id,
                    panic_message,
                })
            }
        }
    }

    /// Return a failed (or still waiting) task to `Waiting` so it can be registered again.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the task is `Evaluating` or `Dispatched`.
    pub fn reset(&mut self) -> DispatchResult<()> {
        match self.status {
            TaskStatus::Waiting | TaskStatus::Error => {
                self.status = TaskStatus::Waiting;
                Ok(())
            }
            status @ (TaskStatus::Evaluating | TaskStatus::Dispatched) => {
                Err(DispatchError::InvalidTransition {
                    task_id: self.id,
                    status,
                    action: "reset",
                })
            }
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Task<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("arguments", &self.arguments.keys().collect::<Vec<_>>())
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}
