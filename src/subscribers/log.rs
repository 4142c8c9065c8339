//! # LogWriter: events rendered through `tracing`
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records
//! under the `circulate::events` target. Install any `tracing` subscriber to
//! see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG circulate::events: fired trigger="flush" version=1 delay_ms=0
//! DEBUG circulate::events: attempt starting trigger="flush" version=1 attempt=1
//!  WARN circulate::events: attempt failed trigger="flush" attempt=1 reason="io error"
//! DEBUG circulate::events: coalesced trigger="flush" version=2
//! DEBUG circulate::events: rescheduled trigger="flush" version=2 delay_ms=50
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let trigger = e.trigger.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::Fired => {
                tracing::debug!(target: "circulate::events", trigger, version = ?e.version, delay_ms = ?e.delay_ms, "fired");
            }
            EventKind::Suspended => {
                tracing::debug!(target: "circulate::events", trigger, version = ?e.version, "suspended");
            }
            EventKind::SubmitRejected => {
                tracing::warn!(target: "circulate::events", trigger, version = ?e.version, reason = ?e.reason, "submit rejected");
            }
            EventKind::Stale => {
                tracing::trace!(target: "circulate::events", trigger, version = ?e.version, "stale dispatch");
            }
            EventKind::Coalesced => {
                tracing::debug!(target: "circulate::events", trigger, version = ?e.version, "coalesced");
            }
            EventKind::AttemptStarting => {
                tracing::debug!(target: "circulate::events", trigger, version = ?e.version, attempt = ?e.attempt, "attempt starting");
            }
            EventKind::AttemptFinished => {
                tracing::debug!(target: "circulate::events", trigger, attempt = ?e.attempt, delay_ms = ?e.delay_ms, "attempt finished");
            }
            EventKind::AttemptFailed => {
                tracing::warn!(target: "circulate::events", trigger, attempt = ?e.attempt, reason = ?e.reason, "attempt failed");
            }
            EventKind::RerunClaimed => {
                tracing::debug!(target: "circulate::events", trigger, version = ?e.version, "rerun claimed");
            }
            EventKind::Released => {
                tracing::trace!(target: "circulate::events", trigger, version = ?e.version, "released");
            }
            EventKind::Rescheduled => {
                tracing::debug!(target: "circulate::events", trigger, version = ?e.version, delay_ms = ?e.delay_ms, "rescheduled");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "circulate::events", subscriber = trigger, reason = ?e.reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "circulate::events", subscriber = trigger, reason = ?e.reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
