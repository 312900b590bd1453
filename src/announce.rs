//! Outbound requirement announcements.
//!
//! When a task needs a key nobody has asked for yet, the dispatcher announces it once
//! through an [`Announce`] implementation and moves on. The producer resolves the value
//! out of band and delivers it later through
//! [`TaskDispatcher::receive_requirement`](crate::TaskDispatcher::receive_requirement).

use futures::channel::mpsc::UnboundedSender;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Requests the value of a requirement key from an external producer.
///
/// Called from inside a scheduler tick, so it must not block.
pub trait Announce<K>: Send {
    fn announce(&mut self, key: &K);
}

/// Drops announcements. Useful when producers resolve keys without being asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<K> Announce<K> for Discard {
    fn announce(&mut self, _key: &K) {}
}

/// Announce through a closure.
#[derive(Debug, Clone)]
pub struct AnnounceFn<F>(pub F);

impl<K, F> Announce<K> for AnnounceFn<F>
where
    F: FnMut(&K) + Send,
{
    fn announce(&mut self, key: &K) {
        (self.0)(key);
    }
}

/// Forward announced keys to a producer over an unbounded channel.
///
/// A closed channel means the producer is gone; the announcement is lost and the tasks
/// waiting on the key stay waiting.
impl<K> Announce<K> for UnboundedSender<K>
where
    K: Clone + Send,
{
    fn announce(&mut self, key: &K) {
        if self.unbounded_send(key.clone()).is_err() {
            #[cfg(feature = "tracing")]
            warn!("requirement producer channel closed, announcement dropped");
        }
    }
}
