//! Lock-protected dispatcher for hosts that call it from several threads.
//!
//! Uses a single `parking_lot::Mutex` around the whole dispatcher: every public entry
//! point takes the lock for its full duration, so registrations, resolutions and ticks
//! are serialized exactly as if they ran on one thread.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::dispatcher::{Registration, TaskDispatcher};
use crate::error::DispatchResult;
use crate::message::RequirementMessage;
use crate::storage::{ContainerFactory, LocalStorage};
use crate::task::Task;
use crate::types::{Action, TaskId, TaskStatus};

/// Cloneable, thread-safe handle to one [`TaskDispatcher`].
///
/// Tasks run while the lock is held, so a task method must not call back into the same
/// `SharedDispatcher`.
///
/// # Examples
///
/// ```
/// use reqx::{Action, DispatcherConfig, SharedDispatcher, Task, TaskDispatcher};
///
/// let shared = SharedDispatcher::new(TaskDispatcher::<&str, i32>::new(DispatcherConfig::local()));
///
/// let producer = shared.clone();
/// std::thread::spawn(move || {
///     producer.add_task(Task::new(|_| Ok(()))).unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(shared.do_action().unwrap(), Action::DispatchedTask);
/// ```
pub struct SharedDispatcher<K, V, S = LocalStorage>
where
    K: Hash + Eq,
    S: ContainerFactory,
{
    inner: Arc<Mutex<TaskDispatcher<K, V, S>>>,
    closed: Arc<AtomicBool>,
}

impl<K, V, S> Clone for SharedDispatcher<K, V, S>
where
    K: Hash + Eq,
    S: ContainerFactory,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<K, V, S> SharedDispatcher<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: ContainerFactory,
{
    pub fn new(dispatcher: TaskDispatcher<K, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dispatcher)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add_task(&self, task: Task<K, V>) -> DispatchResult<Registration> {
        self.inner.lock().add_task(task)
    }

    pub fn receive_requirement(
        &self,
        message: impl Into<RequirementMessage<K, V>>,
    ) -> DispatchResult<bool> {
        self.inner.lock().receive_requirement(message)
    }

    pub fn do_action(&self) -> DispatchResult<Action> {
        self.inner.lock().do_action()
    }

    /// Tick until there is nothing left to do, releasing the lock between ticks so
    /// producers can interleave.
    ///
    /// With `run_when_idle == false` the loop stops at the first idle tick. With
    /// `run_when_idle == true` an idle loop yields and keeps ticking until some handle
    /// calls [`close`](Self::close) and the remaining work is done.
    ///
    /// Returns the number of non-idle ticks.
    ///
    /// # Errors
    ///
    /// The first task failure, as [`TaskDispatcher::do_action`].
    pub fn run(&self, run_when_idle: bool) -> DispatchResult<usize> {
        let mut performed = 0;
        loop {
            // Read before the tick so work submitted ahead of `close` is not skipped
            let closed = self.is_closed();
            if !self.do_action()?.is_idle() {
                performed += 1;
                continue;
            }
            if !run_when_idle || closed {
                break;
            }
            thread::yield_now();
        }
        Ok(performed)
    }

    /// Let every `run(true)` loop on this dispatcher finish once it is idle.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn remove_task(&self, task_id: TaskId) -> DispatchResult<Task<K, V>> {
        self.inner.lock().remove_task(task_id)
    }

    /// Status of a registered task. Tasks are not handed out by reference across the lock.
    pub fn task_status(&self, task_id: TaskId) -> DispatchResult<TaskStatus> {
        self.inner.lock().get_task(task_id).map(Task::status)
    }

    /// Run `f` with exclusive access to the dispatcher.
    pub fn with<R>(&self, f: impl FnOnce(&mut TaskDispatcher<K, V, S>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
