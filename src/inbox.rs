//! Channel-based input for a dispatcher owned by one thread.
//!
//! Producers on other threads (or other async tasks) never touch dispatcher state. They
//! submit tagged [`Inbound`] messages through a cloneable [`DispatcherHandle`]; the
//! dispatcher drains them between ticks, so every mutation still happens on the thread
//! that owns it.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::{DispatchError, DispatchResult};
use crate::message::RequirementMessage;
use crate::task::Task;

/// Everything a dispatcher accepts from the outside, tagged by kind.
pub enum Inbound<K, V> {
    /// Register a task, as [`TaskDispatcher::add_task`](crate::TaskDispatcher::add_task).
    Task(Task<K, V>),
    /// Deliver a resolution, as
    /// [`TaskDispatcher::receive_requirement`](crate::TaskDispatcher::receive_requirement).
    Requirement(RequirementMessage<K, V>),
}

impl<K, V> From<Task<K, V>> for Inbound<K, V> {
    fn from(task: Task<K, V>) -> Self {
        Inbound::Task(task)
    }
}

impl<K, V> From<RequirementMessage<K, V>> for Inbound<K, V> {
    fn from(message: RequirementMessage<K, V>) -> Self {
        Inbound::Requirement(message)
    }
}

pub(crate) type InboxReceiver<K, V> = UnboundedReceiver<Inbound<K, V>>;

/// Cloneable sending side of a dispatcher's inbox.
///
/// The inbox closes when every handle is dropped or when any handle calls
/// [`DispatcherHandle::close`]. A dispatcher running with `run(true)` or
/// [`serve`](crate::TaskDispatcher::serve) stops once its inbox is closed and drained
/// and no work is left.
pub struct DispatcherHandle<K, V> {
    tx: UnboundedSender<Inbound<K, V>>,
}

impl<K, V> Clone for DispatcherHandle<K, V> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<K, V> DispatcherHandle<K, V> {
    pub(crate) fn new(tx: UnboundedSender<Inbound<K, V>>) -> Self {
        Self { tx }
    }

    /// Queue any inbound message.
    ///
    /// # Errors
    ///
    /// `InboxClosed` if the dispatcher dropped its inbox or the inbox was closed.
    pub fn send(&self, inbound: impl Into<Inbound<K, V>>) -> DispatchResult<()> {
        self.tx
            .unbounded_send(inbound.into())
            .map_err(|_| DispatchError::InboxClosed)
    }

    pub fn submit_task(&self, task: Task<K, V>) -> DispatchResult<()> {
        self.send(task)
    }

    pub fn submit_requirement(&self, request: K, result: V) -> DispatchResult<()> {
        self.send(RequirementMessage::new(request, result))
    }

    /// Close the inbox for every handle. Messages already sent are still delivered.
    pub fn close(&self) {
        self.tx.close_channel();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
