//! # Event bus for broadcasting trigger events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Publishing is a
//! plain synchronous call, so dispatches running on executor threads can report
//! without an async context.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Receivers (any number):
//!   fire / suspend  ──┐
//!   dispatch N      ──┼──────► Bus ───────► Trigger::subscribe() receivers
//!   subscriber sets ──┘   (broadcast)  └──► subscriber listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if nobody listens at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for trigger events.
///
/// Cloning is cheap (internally an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// Events without receivers are dropped; this still returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns true when at least one receiver exists.
    ///
    /// Lets hot paths skip building events nobody will see.
    #[inline]
    pub fn has_receivers(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}
