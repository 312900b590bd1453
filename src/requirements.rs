//! Bidirectional task ↔ requirement index with a demand-tied value cache.
//!
//! [`RequirementMap`] knows nothing about execution. It answers three questions for the
//! dispatcher:
//!
//! - which requirement keys are new and must be announced when a task arrives
//! - which waiting tasks depend on a key whose value just arrived
//! - whether all of a task's keys have values
//!
//! # Invariants
//!
//! - a key has an entry in the key → tasks index iff at least one waiting task references it
//! - a key has a cached value iff its value arrived AND at least one task references it;
//!   removing the last referencing task evicts the cached value
//! - a task is ready iff every one of its keys has a cached value

use std::collections::HashMap;
use std::hash::Hash;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::error::{DispatchError, DispatchResult};
use crate::storage::{ContainerFactory, LocalStorage, MapContainer, SetContainer};
use crate::types::{DuplicatePolicy, TaskId};

/// Index of waiting tasks, the keys they need, and the values known so far.
///
/// # Examples
///
/// ```
/// use reqx::{DuplicatePolicy, RequirementMap, TaskId};
/// use reqx::storage::LocalStorage;
///
/// let mut map: RequirementMap<&str, f64> = RequirementMap::new(LocalStorage);
/// let t1 = TaskId::new();
/// let t2 = TaskId::new();
///
/// // Only the first task to mention a key reports it as new
/// assert_eq!(map.add_task(t1, ["k"], DuplicatePolicy::Ignore).unwrap(), vec!["k"]);
/// assert!(map.add_task(t2, ["k"], DuplicatePolicy::Ignore).unwrap().is_empty());
///
/// assert!(map.set_requirement_value("k", 0.5));
/// assert!(map.is_task_ready(t1).unwrap());
///
/// // The value survives while t2 still needs it
/// map.remove_task(t1).unwrap();
/// assert_eq!(map.cached_value(&"k"), Some(&0.5));
///
/// map.remove_task(t2).unwrap();
/// assert_eq!(map.cached_value(&"k"), None);
/// ```
pub struct RequirementMap<K, V, S = LocalStorage>
where
    K: Hash + Eq,
    S: ContainerFactory,
{
    factory: S,
    task_requirements: S::Map<TaskId, S::Set<K>>,
    requirement_tasks: S::Map<K, S::Set<TaskId>>,
    requirement_values: S::Map<K, V>,
}

impl<K, V, S> RequirementMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: ContainerFactory,
{
    /// Create an empty map whose containers come from `factory`.
    pub fn new(factory: S) -> Self {
        Self {
            task_requirements: factory.make_map(),
            requirement_tasks: factory.make_map(),
            requirement_values: factory.make_map(),
            factory,
        }
    }

    /// Register a task's dependency set.
    ///
    /// Returns the keys that no other waiting task referenced before, in the order they
    /// were first seen. These are the keys the caller must announce.
    ///
    /// # Errors
    ///
    /// `DuplicateTaskId` if the task is already registered and `duplicates` is
    /// [`DuplicatePolicy::Reject`]. With [`DuplicatePolicy::Ignore`] the call is a no-op
    /// that returns no keys.
    pub fn add_task(
        &mut self,
        task_id: TaskId,
        keys: impl IntoIterator<Item = K>,
        duplicates: DuplicatePolicy,
    ) -> DispatchResult<Vec<K>> {
        if self.task_requirements.contains_key(&task_id) {
            return match duplicates {
                DuplicatePolicy::Ignore => Ok(Vec::new()),
                DuplicatePolicy::Reject => Err(DispatchError::DuplicateTaskId { task_id }),
            };
        }

        let mut own_keys = self.factory.make_set();
        let mut fresh = Vec::new();

        for key in keys {
            if !own_keys.insert(key.clone()) {
                continue;
            }
            match self.requirement_tasks.get_mut(&key) {
                Some(tasks) => {
                    tasks.insert(task_id);
                }
                None => {
                    let mut tasks = self.factory.make_set();
                    tasks.insert(task_id);
                    self.requirement_tasks.insert(key.clone(), tasks);
                    fresh.push(key);
                }
            }
        }

        #[cfg(feature = "tracing")]
        debug!(
            task_id = %task_id,
            requirements = own_keys.len(),
            new_requirements = fresh.len(),
            "registered task requirements"
        );

        self.task_requirements.insert(task_id, own_keys);
        Ok(fresh)
    }

    /// The subset of `keys` that already have cached values, with those values.
    pub fn fill_requirements<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> HashMap<K, V>
    where
        K: 'a,
    {
        keys.into_iter()
            .filter_map(|key| {
                self.requirement_values
                    .get(key)
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect()
    }

    /// Forget a task. Keys no longer referenced by any task lose their index entry and
    /// their cached value.
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if the task is not registered.
    pub fn remove_task(&mut self, task_id: TaskId) -> DispatchResult<()> {
        let keys = self
            .task_requirements
            .remove(&task_id)
            .ok_or(DispatchError::UnknownTaskId { task_id })?;

        for key in keys.iter() {
            let unreferenced = match self.requirement_tasks.get_mut(key) {
                Some(tasks) => {
                    tasks.remove(&task_id);
                    tasks.is_empty()
                }
                None => false,
            };
            if unreferenced {
                self.requirement_tasks.remove(key);
                let _evicted = self.requirement_values.remove(key);

                #[cfg(feature = "tracing")]
                trace!(
                    task_id = %task_id,
                    evicted_value = _evicted.is_some(),
                    "requirement no longer referenced"
                );
            }
        }
        Ok(())
    }

    /// Record the value of `key`, overwriting any earlier one.
    ///
    /// Values are only cached while some task needs them: for a key no waiting task
    /// references, nothing is stored and `false` is returned.
    pub fn set_requirement_value(&mut self, key: K, value: V) -> bool {
        if !self.requirement_tasks.contains_key(&key) {
            return false;
        }
        self.requirement_values.insert(key, value);
        true
    }

    /// `true` iff every key of the task has a cached value.
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if the task is not registered.
    pub fn is_task_ready(&self, task_id: TaskId) -> DispatchResult<bool> {
        let keys = self.keys_of(task_id)?;
        Ok(keys
            .iter()
            .all(|key| self.requirement_values.contains_key(key)))
    }

    /// Cached values for the task's keys. Keys without a value yet are omitted.
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if the task is not registered.
    pub fn get_task_requirement_values(&self, task_id: TaskId) -> DispatchResult<HashMap<K, V>> {
        let keys = self.keys_of(task_id)?;
        Ok(self.fill_requirements(keys.iter()))
    }

    /// Ids of the waiting tasks that reference `key`.
    pub fn get_tasks_with_requirement(&self, key: &K) -> Vec<TaskId> {
        self.requirement_tasks
            .get(key)
            .map(|tasks| tasks.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The task's deduplicated keys.
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if the task is not registered.
    pub fn requirements_for_task(&self, task_id: TaskId) -> DispatchResult<Vec<K>> {
        Ok(self.keys_of(task_id)?.iter().cloned().collect())
    }

    pub fn cached_value(&self, key: &K) -> Option<&V> {
        self.requirement_values.get(key)
    }

    pub fn contains_task(&self, task_id: TaskId) -> bool {
        self.task_requirements.contains_key(&task_id)
    }

    /// Whether some waiting task references `key`.
    pub fn is_tracked(&self, key: &K) -> bool {
        self.requirement_tasks.contains_key(key)
    }

    /// Number of waiting tasks.
    pub fn waiting_tasks(&self) -> usize {
        self.task_requirements.len()
    }

    /// Number of distinct keys referenced by waiting tasks.
    pub fn tracked_requirements(&self) -> usize {
        self.requirement_tasks.len()
    }

    /// Number of cached values.
    pub fn cached_values(&self) -> usize {
        self.requirement_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_requirements.is_empty()
    }

    fn keys_of(&self, task_id: TaskId) -> DispatchResult<&S::Set<K>> {
        self.task_requirements
            .get(&task_id)
            .ok_or(DispatchError::UnknownTaskId { task_id })
    }
}
