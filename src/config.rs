//! Dispatcher construction settings.

use crate::storage::{ContainerFactory, LocalStorage, OrderedStorage};
use crate::types::{DuplicatePolicy, InvalidMessagePolicy};

/// Everything a [`TaskDispatcher`](crate::TaskDispatcher) needs to know at construction.
///
/// The storage backend is part of the configuration rather than a global setting, so two
/// dispatchers in one process can use different backends.
///
/// # Examples
///
/// ```
/// use reqx::{DispatcherConfig, DuplicatePolicy, InvalidMessagePolicy};
///
/// let config = DispatcherConfig::ordered()
///     .duplicates(DuplicatePolicy::Reject)
///     .invalid_messages(InvalidMessagePolicy::Reject);
///
/// assert_eq!(config.duplicate_policy(), DuplicatePolicy::Reject);
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig<S> {
    storage: S,
    duplicates: DuplicatePolicy,
    invalid_messages: InvalidMessagePolicy,
    keep_failed: bool,
}

impl<S: ContainerFactory> DispatcherConfig<S> {
    /// Lenient defaults on the given backend: duplicates ignored, invalid messages dropped.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            duplicates: DuplicatePolicy::default(),
            invalid_messages: InvalidMessagePolicy::default(),
            keep_failed: false,
        }
    }

    #[must_use]
    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    #[must_use]
    pub fn invalid_messages(mut self, policy: InvalidMessagePolicy) -> Self {
        self.invalid_messages = policy;
        self
    }

    /// Keep tasks whose invocation failed so they can be taken back with
    /// [`take_failed_task`](crate::TaskDispatcher::take_failed_task) and retried.
    ///
    /// Off by default: a failed task is dropped once its error has been returned. A host
    /// that enables this and never takes its failed tasks back holds on to every one.
    #[must_use]
    pub fn keep_failed(mut self, keep: bool) -> Self {
        self.keep_failed = keep;
        self
    }

    /// Shorthand for `duplicates(Reject).invalid_messages(Reject)`.
    #[must_use]
    pub fn strict(self) -> Self {
        self.duplicates(DuplicatePolicy::Reject)
            .invalid_messages(InvalidMessagePolicy::Reject)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    pub fn invalid_message_policy(&self) -> InvalidMessagePolicy {
        self.invalid_messages
    }

    pub fn keeps_failed(&self) -> bool {
        self.keep_failed
    }

    pub(crate) fn into_storage(self) -> S {
        self.storage
    }
}

impl DispatcherConfig<LocalStorage> {
    pub fn local() -> Self {
        Self::new(LocalStorage)
    }
}

impl DispatcherConfig<OrderedStorage> {
    pub fn ordered() -> Self {
        Self::new(OrderedStorage)
    }
}
