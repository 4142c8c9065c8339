//! # Events emitted by triggers and subscriber workers.
//!
//! The [`EventKind`] enum classifies events into three groups:
//! - **Caller events**: what `fire` / `suspend` did
//! - **Dispatch events**: what a scheduled dispatch did against the state word
//! - **Subscriber events**: problems delivering events to subscribers
//!
//! The [`Event`] struct carries optional metadata: trigger name, version,
//! attempt number, delay and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order across threads.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use circulate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Rescheduled)
//!     .with_trigger("flush")
//!     .with_version(7)
//!     .with_delay(Duration::from_millis(50));
//!
//! assert_eq!(ev.kind, EventKind::Rescheduled);
//! assert_eq!(ev.trigger.as_deref(), Some("flush"));
//! assert_eq!(ev.delay_ms, Some(50));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of trigger events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Caller events ===
    /// A dispatch was submitted by `fire`, `fire_at` or `fire_after`.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version captured by the dispatch
    /// - `delay_ms`: time until the requested deadline
    Fired,

    /// `suspend` invalidated pending dispatches and reservations.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version installed by the suspend
    Suspended,

    /// The executor refused a dispatch.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version of the refused dispatch
    /// - `reason`: executor error
    SubmitRejected,

    // === Dispatch events ===
    /// A dispatch found its version superseded and did nothing.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: stale version
    Stale,

    /// A dispatch found the work running and left a rerun ticket.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version recorded in the ticket
    Coalesced,

    /// The owning dispatch is about to call `Work::attempt`.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version the attempt runs under
    /// - `attempt`: attempt number (1-based, per trigger)
    AttemptStarting,

    /// `Work::attempt` returned successfully.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `attempt`: attempt number
    /// - `delay_ms`: requested re-run delay, if any
    AttemptFinished,

    /// `Work::attempt` returned an error or panicked.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `attempt`: attempt number
    /// - `reason`: failure message
    AttemptFailed,

    /// The owning dispatch claimed a rerun ticket and runs again.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version of the claimed ticket
    RerunClaimed,

    /// The owning dispatch gave the work back.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version the last attempt ran under
    Released,

    /// The work asked for a re-run and a new dispatch was submitted.
    ///
    /// Sets:
    /// - `trigger`: trigger name
    /// - `version`: version carried by the new dispatch
    /// - `delay_ms`: requested delay
    Rescheduled,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `trigger`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `trigger`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Trigger event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the trigger (or subscriber), if applicable.
    pub trigger: Option<Arc<str>>,
    /// State-word version relevant to the event.
    pub version: Option<u32>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u64>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            trigger: None,
            version: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a trigger name.
    #[inline]
    pub fn with_trigger(mut self, trigger: impl Into<Arc<str>>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Attaches a state-word version.
    #[inline]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_trigger(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_trigger(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::Fired);
        let b = Event::new(EventKind::Fired);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates_to_u32_millis() {
        let ev = Event::new(EventKind::Rescheduled).with_delay(Duration::from_secs(u64::MAX / 4));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_helpers_set_kind_and_reason() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.trigger.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));

        let ev = Event::subscriber_panicked("audit", "boom".into());
        assert!(ev.is_subscriber_panic());
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}
