//! Task dispatcher: queues, priorities and the single-step scheduler loop.
//!
//! Provides [`TaskDispatcher`], which owns registered tasks until they run, asks for the
//! requirement values they are missing, and invokes each task once every value is known.
//!
//! All work happens in [`TaskDispatcher::do_action`] ticks. A tick performs exactly one
//! unit of work and never blocks, so the dispatcher can be embedded in any event loop.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use futures::channel::mpsc::{self, TryRecvError};
use futures::StreamExt;

#[cfg(feature = "tracing")]
use tracing::{debug, info, trace, warn};

use crate::announce::{Announce, Discard};
use crate::config::DispatcherConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::inbox::{DispatcherHandle, Inbound, InboxReceiver};
use crate::message::{Canonicalize, RequirementMessage, Verbatim};
use crate::requirements::RequirementMap;
use crate::storage::{ContainerFactory, LocalStorage, MapContainer, QueueContainer};
use crate::task::Task;
use crate::types::{Action, DuplicatePolicy, InvalidMessagePolicy, TaskId, TaskStatus};

/// A task whose requirements are all resolved, with the values it will be invoked with.
struct ReadyTask<K, V> {
    task_id: TaskId,
    values: HashMap<K, V>,
}

/// What [`TaskDispatcher::add_task`] did with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Every requirement was already known; the task went straight to the ready queue.
    Ready,
    /// The task waits for requirements. `announced` of them were new and queued for
    /// announcement.
    Waiting { announced: usize },
    /// A task with the same id was already registered; nothing changed.
    Ignored,
}

/// Hold tasks until their requirements resolve, then run each exactly once.
///
/// # Workflow
///
/// 1. Create a dispatcher with [`TaskDispatcher::new`] and a [`DispatcherConfig`]
/// 2. Plug in how requirements are requested with [`TaskDispatcher::with_announcer`]
/// 3. Register tasks with [`TaskDispatcher::add_task`]
/// 4. Feed resolutions back with [`TaskDispatcher::receive_requirement`]
/// 5. Drive the scheduler with [`TaskDispatcher::do_action`] or [`TaskDispatcher::run`]
///
/// # Tick priority
///
/// Each [`do_action`](TaskDispatcher::do_action) call services the first non-empty queue:
///
/// 1. pending announcements → [`Action::SentRequirement`]
/// 2. ready tasks → [`Action::DispatchedTask`]
/// 3. received resolutions → [`Action::ProcessedRequirement`]
///
/// Announcements never starve behind task execution, and ready tasks are drained before
/// more resolutions are absorbed.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use reqx::{Action, AnnounceFn, Arguments, DispatcherConfig, Task, TaskDispatcher};
///
/// let asked: Arc<Mutex<Vec<&'static str>>> = Arc::default();
/// let seen = Arc::new(Mutex::new(None));
///
/// let mut dispatcher: TaskDispatcher<&'static str, f64> =
///     TaskDispatcher::new(DispatcherConfig::local()).with_announcer(AnnounceFn({
///         let asked = asked.clone();
///         move |key: &&'static str| asked.lock().unwrap().push(*key)
///     }));
///
/// let sink = seen.clone();
/// dispatcher
///     .add_task(
///         Task::new(move |args: Arguments<f64>| {
///             *sink.lock().unwrap() = Some(*args.require("similarity")?);
///             Ok(())
///         })
///         .requires("similarity", "sim(cat,dog)"),
///     )
///     .unwrap();
///
/// assert_eq!(dispatcher.do_action().unwrap(), Action::SentRequirement);
/// assert_eq!(*asked.lock().unwrap(), vec!["sim(cat,dog)"]);
///
/// // ... the producer answers later
/// dispatcher.receive_requirement(("sim(cat,dog)", 0.7)).unwrap();
///
/// assert_eq!(dispatcher.do_action().unwrap(), Action::ProcessedRequirement);
/// assert_eq!(dispatcher.do_action().unwrap(), Action::DispatchedTask);
/// assert_eq!(dispatcher.do_action().unwrap(), Action::Idle);
/// assert_eq!(*seen.lock().unwrap(), Some(0.7));
/// ```
///
/// The dispatcher has no internal synchronization. To feed it from several threads,
/// either keep it on one thread and use [`TaskDispatcher::attach_inbox`], or wrap it in
/// a [`SharedDispatcher`](crate::SharedDispatcher).
pub struct TaskDispatcher<K, V, S = LocalStorage>
where
    K: Hash + Eq,
    S: ContainerFactory,
{
    tasks: S::Map<TaskId, Task<K, V>>,
    failed: S::Map<TaskId, Task<K, V>>,
    new_requirements: S::Queue<K>,
    ready_tasks: S::Queue<ReadyTask<K, V>>,
    received_requirements: S::Queue<RequirementMessage<K, V>>,
    requirements: RequirementMap<K, V, S>,
    announcer: Box<dyn Announce<K>>,
    canonicalizer: Box<dyn Canonicalize<K, V>>,
    inbox: Option<InboxReceiver<K, V>>,
    duplicates: DuplicatePolicy,
    invalid_messages: InvalidMessagePolicy,
    keep_failed: bool,
}

impl<K, V, S> TaskDispatcher<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: ContainerFactory,
{
    /// Create an empty dispatcher.
    ///
    /// Announcements are discarded and inbound messages accepted verbatim until
    /// [`with_announcer`](Self::with_announcer) / [`with_canonicalizer`](Self::with_canonicalizer)
    /// say otherwise.
    pub fn new(config: DispatcherConfig<S>) -> Self {
        let duplicates = config.duplicate_policy();
        let invalid_messages = config.invalid_message_policy();
        let keep_failed = config.keeps_failed();
        let storage = config.into_storage();

        Self {
            tasks: storage.make_map(),
            failed: storage.make_map(),
            new_requirements: storage.make_queue(),
            ready_tasks: storage.make_queue(),
            received_requirements: storage.make_queue(),
            requirements: RequirementMap::new(storage),
            announcer: Box::new(Discard),
            canonicalizer: Box::new(Verbatim),
            inbox: None,
            duplicates,
            invalid_messages,
            keep_failed,
        }
    }

    /// Set how newly discovered requirements are requested from producers.
    #[must_use]
    pub fn with_announcer(mut self, announcer: impl Announce<K> + 'static) -> Self {
        self.announcer = Box::new(announcer);
        self
    }

    /// Set how inbound requirement messages are normalized and validated.
    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: impl Canonicalize<K, V> + 'static) -> Self {
        self.canonicalizer = Box::new(canonicalizer);
        self
    }

    /// Register an initial batch of tasks.
    ///
    /// # Errors
    ///
    /// The first registration error, as [`add_task`](Self::add_task).
    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Task<K, V>>) -> DispatchResult<Self> {
        for task in tasks {
            self.add_task(task)?;
        }
        Ok(self)
    }

    /// Open a fresh inbox and return a handle producers can clone and send through.
    ///
    /// Replaces any previously attached inbox; handles to the old one start failing with
    /// [`DispatchError::InboxClosed`].
    pub fn attach_inbox(&mut self) -> DispatcherHandle<K, V> {
        let (tx, rx) = mpsc::unbounded();
        self.inbox = Some(rx);
        DispatcherHandle::new(tx)
    }

    /// Register a task using the configured [`DuplicatePolicy`].
    ///
    /// This runs on the event that introduces the task and stays cheap: it indexes the
    /// task and queues work, it never invokes anything.
    ///
    /// # Errors
    ///
    /// - `DuplicateTaskId` if the id is known and duplicates are rejected
    /// - `InvalidTransition` if the task is not `Waiting` (reset a failed task first)
    pub fn add_task(&mut self, task: Task<K, V>) -> DispatchResult<Registration> {
        self.add_task_with(task, self.duplicates)
    }

    /// Register a task, choosing the duplicate handling for this call.
    ///
    /// # Errors
    ///
    /// As [`add_task`](Self::add_task).
    pub fn add_task_with(
        &mut self,
        task: Task<K, V>,
        duplicates: DuplicatePolicy,
    ) -> DispatchResult<Registration> {
        let task_id = task.id();

        if self.tasks.contains_key(&task_id) {
            return match duplicates {
                DuplicatePolicy::Ignore => {
                    #[cfg(feature = "tracing")]
                    debug!(task_id = %task_id, "ignoring duplicate task");

                    Ok(Registration::Ignored)
                }
                DuplicatePolicy::Reject => Err(DispatchError::DuplicateTaskId { task_id }),
            };
        }

        if task.status() != TaskStatus::Waiting {
            return Err(DispatchError::InvalidTransition {
                task_id,
                status: task.status(),
                action: "register",
            });
        }

        let keys = task.requirements();
        let filled = self.requirements.fill_requirements(keys.iter());
        self.tasks.insert(task_id, task);

        // Everything already known: skip the waiting phase entirely
        if filled.len() == keys.len() {
            #[cfg(feature = "tracing")]
            debug!(task_id = %task_id, requirements = keys.len(), "task ready on arrival");

            self.ready_tasks.push(ReadyTask {
                task_id,
                values: filled,
            });
            return Ok(Registration::Ready);
        }

        let fresh = self.requirements.add_task(task_id, keys, duplicates)?;
        let announced = fresh.len();
        for key in fresh {
            self.new_requirements.push(key);
        }

        #[cfg(feature = "tracing")]
        debug!(task_id = %task_id, announced, "task waiting on requirements");

        Ok(Registration::Waiting { announced })
    }

    /// Accept a message that may resolve a requirement.
    ///
    /// The message is canonicalized and validated, then queued for the next
    /// [`Action::ProcessedRequirement`] tick. Returns `false` when an invalid message was
    /// dropped.
    ///
    /// # Errors
    ///
    /// `InvalidRequirementMessage` if validation fails and the configured
    /// [`InvalidMessagePolicy`] is `Reject`.
    pub fn receive_requirement(
        &mut self,
        message: impl Into<RequirementMessage<K, V>>,
    ) -> DispatchResult<bool> {
        let message = self.canonicalizer.canonicalize(message.into());

        match self.canonicalizer.validate(&message) {
            Ok(()) => {
                self.received_requirements.push(message);
                Ok(true)
            }
            Err(reason) => match self.invalid_messages {
                InvalidMessagePolicy::Drop => {
                    #[cfg(feature = "tracing")]
                    debug!(%reason, "dropping invalid requirement message");

                    Ok(false)
                }
                InvalidMessagePolicy::Reject => {
                    Err(DispatchError::InvalidRequirementMessage { reason })
                }
            },
        }
    }

    /// Perform one unit of work, in strict priority order.
    ///
    /// # Errors
    ///
    /// `TaskExecution` / `TaskPanicked` when the dispatched task fails. Nothing is retried.
    /// The failed task is dropped, unless [`DispatcherConfig::keep_failed`] parks it for
    /// [`take_failed_task`](Self::take_failed_task).
    pub fn do_action(&mut self) -> DispatchResult<Action> {
        if let Some(key) = self.new_requirements.pop() {
            self.announcer.announce(&key);

            #[cfg(feature = "tracing")]
            trace!(pending = self.new_requirements.len(), "announced requirement");

            return Ok(Action::SentRequirement);
        }

        if let Some(ready) = self.ready_tasks.pop() {
            self.dispatch(ready)?;
            return Ok(Action::DispatchedTask);
        }

        if let Some(message) = self.received_requirements.pop() {
            self.process_received(message)?;
            return Ok(Action::ProcessedRequirement);
        }

        Ok(Action::Idle)
    }

    /// Tick until there is nothing left to do.
    ///
    /// With `run_when_idle == false` the loop stops at the first idle tick. With
    /// `run_when_idle == true` an idle dispatcher keeps polling its inbox and only stops
    /// once the inbox is closed (every [`DispatcherHandle`] dropped or
    /// [`closed`](DispatcherHandle::close)) and all queued work is done. A dispatcher
    /// without an inbox has no open input and stops as soon as it is idle.
    ///
    /// Returns the number of non-idle ticks.
    ///
    /// # Errors
    ///
    /// The first task failure, as [`do_action`](Self::do_action). The loop stops there;
    /// calling `run` again resumes with the remaining work.
    pub fn run(&mut self, run_when_idle: bool) -> DispatchResult<usize> {
        #[cfg(feature = "tracing")]
        info!(run_when_idle, "starting dispatcher loop");

        let mut performed = 0;
        loop {
            let inbox_open = self.pump_inbox();
            match self.do_action()? {
                Action::Idle => {
                    if !run_when_idle || !inbox_open {
                        break;
                    }
                    std::thread::yield_now();
                }
                _ => performed += 1,
            }
        }

        #[cfg(feature = "tracing")]
        info!(performed, "dispatcher loop finished");

        Ok(performed)
    }

    /// Async counterpart of `run(true)`: instead of spinning while idle, wait for the next
    /// inbox message. Returns once the inbox is closed and all work is done.
    ///
    /// # Errors
    ///
    /// The first task failure, as [`do_action`](Self::do_action).
    pub async fn serve(&mut self) -> DispatchResult<usize> {
        let mut performed = 0;
        loop {
            self.pump_inbox();
            if self.do_action()? != Action::Idle {
                performed += 1;
                continue;
            }

            let Some(inbox) = self.inbox.as_mut() else {
                break;
            };
            let next = inbox.next().await;
            match next {
                Some(inbound) => self.handle_inbound(inbound),
                None => {
                    self.inbox = None;
                    break;
                }
            }
        }

        #[cfg(feature = "tracing")]
        info!(performed, "dispatcher inbox closed");

        Ok(performed)
    }

    /// Apply every message currently waiting in the inbox, without blocking.
    ///
    /// Returns whether the inbox is still open. Registration errors of inbox messages have
    /// no caller to return to and are discarded.
    pub fn pump_inbox(&mut self) -> bool {
        loop {
            let Some(inbox) = self.inbox.as_mut() else {
                return false;
            };
            match inbox.try_recv() {
                Ok(inbound) => self.handle_inbound(inbound),
                Err(TryRecvError::Closed) => {
                    self.inbox = None;
                    return false;
                }
                Err(TryRecvError::Empty) => return true,
            }
        }
    }

    /// Look up a registered (waiting or ready) task.
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if no such task is registered.
    pub fn get_task(&self, task_id: TaskId) -> DispatchResult<&Task<K, V>> {
        self.tasks
            .get(&task_id)
            .ok_or(DispatchError::UnknownTaskId { task_id })
    }

    pub fn contains_task(&self, task_id: TaskId) -> bool {
        self.tasks.contains_key(&task_id)
    }

    /// Withdraw a task that has not run yet and hand it back.
    ///
    /// Requirements no other task needs are forgotten along with their cached values, and
    /// pending announcements for them are cancelled.
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if no such task is registered.
    pub fn remove_task(&mut self, task_id: TaskId) -> DispatchResult<Task<K, V>> {
        let task = self
            .tasks
            .remove(&task_id)
            .ok_or(DispatchError::UnknownTaskId { task_id })?;

        if self.requirements.contains_task(task_id) {
            self.requirements.remove_task(task_id)?;
            let requirements = &self.requirements;
            self.new_requirements.retain(|key| requirements.is_tracked(key));
        }
        self.ready_tasks.retain(|ready| ready.task_id != task_id);

        #[cfg(feature = "tracing")]
        debug!(task_id = %task_id, "task removed");

        Ok(task)
    }

    /// Hand back a task whose invocation failed, so it can be reset and registered again.
    ///
    /// Failed tasks are only kept when the dispatcher was built with
    /// [`DispatcherConfig::keep_failed`].
    ///
    /// # Errors
    ///
    /// `UnknownTaskId` if no failed task has this id.
    pub fn take_failed_task(&mut self, task_id: TaskId) -> DispatchResult<Task<K, V>> {
        self.failed
            .remove(&task_id)
            .ok_or(DispatchError::UnknownTaskId { task_id })
    }

    /// Requirement keys queued for announcement, in order.
    pub fn pending_announcements(&self) -> Vec<K> {
        self.new_requirements.iter().cloned().collect()
    }

    /// Ids of tasks queued for dispatch, in order.
    pub fn ready_task_ids(&self) -> Vec<TaskId> {
        self.ready_tasks.iter().map(|ready| ready.task_id).collect()
    }

    /// Number of resolutions not yet processed.
    pub fn received_backlog(&self) -> usize {
        self.received_requirements.len()
    }

    /// Number of registered tasks (waiting or ready).
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn failed_task_count(&self) -> usize {
        self.failed.len()
    }

    pub fn requirement_map(&self) -> &RequirementMap<K, V, S> {
        &self.requirements
    }

    /// `true` when the next tick would be idle.
    pub fn is_idle(&self) -> bool {
        self.new_requirements.is_empty()
            && self.ready_tasks.is_empty()
            && self.received_requirements.is_empty()
    }

    fn dispatch(&mut self, ready: ReadyTask<K, V>) -> DispatchResult<()> {
        let task_id = ready.task_id;
        let mut task = self
            .tasks
            .remove(&task_id)
            .ok_or(DispatchError::UnknownTaskId { task_id })?;

        #[cfg(feature = "tracing")]
        trace!(task_id = %task_id, "dispatching task");

        match task.invoke(&ready.values) {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.keep_failed && err.is_execution_failure() {
                    self.failed.insert(task_id, task);
                }
                Err(err)
            }
        }
    }

    fn process_received(&mut self, message: RequirementMessage<K, V>) -> DispatchResult<()> {
        let (key, value) = message.into_parts();
        let waiting = self.requirements.get_tasks_with_requirement(&key);

        if waiting.is_empty() {
            #[cfg(feature = "tracing")]
            trace!("no task waiting on received requirement");

            return Ok(());
        }

        self.requirements.set_requirement_value(key, value);

        for task_id in waiting {
            if !self.requirements.is_task_ready(task_id)? {
                continue;
            }
            let values = self.requirements.get_task_requirement_values(task_id)?;
            self.requirements.remove_task(task_id)?;
            self.ready_tasks.push(ReadyTask { task_id, values });

            #[cfg(feature = "tracing")]
            trace!(task_id = %task_id, "task became ready");
        }
        Ok(())
    }

    fn handle_inbound(&mut self, inbound: Inbound<K, V>) {
        let outcome = match inbound {
            Inbound::Task(task) => self.add_task(task).map(|_| ()),
            Inbound::Requirement(message) => self.receive_requirement(message).map(|_| ()),
        };

        if let Err(_err) = outcome {
            #[cfg(feature = "tracing")]
            warn!(error = %_err, "discarding inbound message");
        }
    }
}

impl<K, V, S> fmt::Debug for TaskDispatcher<K, V, S>
where
    K: Hash + Eq,
    S: ContainerFactory,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("tasks", &self.tasks.len())
            .field("failed", &self.failed.len())
            .field("new_requirements", &self.new_requirements.len())
            .field("ready_tasks", &self.ready_tasks.len())
            .field("received_requirements", &self.received_requirements.len())
            .field("inbox", &self.inbox.is_some())
            .field("duplicates", &self.duplicates)
            .field("invalid_messages", &self.invalid_messages)
            .field("keep_failed", &self.keep_failed)
            .finish_non_exhaustive()
    }
}
