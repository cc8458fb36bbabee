//! Realtime [`Order`] event fan-out.
//!
//! Best-effort only: there is no delivery guarantee, no replay of missed
//! events and no ordering across orders. A reconnecting staff session is
//! expected to re-subscribe and refetch the snapshot.
//!
//! [`Order`]: crate::domain::Order

use tokio::sync::broadcast;

#[cfg(doc)]
use crate::domain::Order;
use crate::{domain::order, read};

/// Default capacity of the [`Hub`] channel.
///
/// Slow subscribers lagging behind this many events lose them.
const DEFAULT_CAPACITY: usize = 64;

/// [`Order`] lifecycle event propagated to subscribed staff sessions.
#[derive(Clone, Debug)]
pub enum Event {
    /// A new [`Order`] was created.
    ///
    /// Carries the full order with its lines, so consumers can render it
    /// without a follow-up fetch.
    Created(read::order::WithLines),

    /// An existing [`Order`] changed.
    ///
    /// Carries the shallow order row only: consumers must merge it into
    /// their held copy keyed by [`order::Id`], never replace wholesale,
    /// and must tolerate out-of-order arrival.
    Updated(order::Order),
}

/// In-process broadcast hub of [`Event`]s.
#[derive(Clone, Debug)]
pub struct Hub(broadcast::Sender<Event>);

impl Hub {
    /// Creates a new [`Hub`] with the provided channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self(tx)
    }

    /// Publishes the provided [`Event`] to all current subscribers.
    ///
    /// Fire-and-forget: having no subscribers is not an error.
    pub fn publish(&self, event: Event) {
        if let Err(e) = self.0.send(event) {
            tracing::trace!("no active subscribers for {e:?}");
        }
    }

    /// Subscribes to all future [`Event`]s.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.0.subscribe()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
