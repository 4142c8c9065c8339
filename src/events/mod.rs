//! Trigger events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Trigger` (`fire*`, `suspend`), dispatches (acquire,
//!   attempts, release, reschedule), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: receivers from `Trigger::subscribe()` and the subscriber
//!   listener spawned by `TriggerBuilder::build` when subscribers are set.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
