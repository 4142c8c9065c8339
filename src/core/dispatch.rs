//! # Dispatch: one scheduled invocation of a trigger.
//!
//! A dispatch is created by `fire*` (or by a self-reschedule), carries the
//! version it was created under and runs once on an executor thread.
//!
//! ## Lifecycle
//! ```text
//! run()
//!   ├─► try_acquire(version)
//!   │     ├─ Stale     ─► publish Stale, exit
//!   │     ├─ Coalesced ─► publish Coalesced, exit (owner runs once more)
//!   │     └─ Acquired
//!   └─► loop {
//!         ├─► attempt()            (errors and panics → no delay)
//!         └─► release(version)
//!               ├─ Rerun{v}        ─► version = v, continue
//!               └─ Released{current}
//!                     └─ current && delay ─► submit self at now + delay
//!       }
//! ```
//!
//! ## Rules
//! - At most one dispatch per trigger is between `Acquired` and `Released`.
//! - A failed attempt never suppresses a claimed rerun.
//! - A self-reschedule keeps the version; it does not count as a fire.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::core::state::{Acquire, Release};
use crate::core::trigger::Shared;
use crate::error::{SubmitError, WorkError};
use crate::events::EventKind;
use crate::executors::{DeadlineExecutor, deadline_after};
use crate::work::Work;

pub(crate) struct Dispatch<E, W> {
    shared: Arc<Shared<E, W>>,
    version: u32,
}

impl<E: DeadlineExecutor, W: Work> Dispatch<E, W> {
    pub(crate) fn new(shared: Arc<Shared<E, W>>, version: u32) -> Self {
        Self { shared, version }
    }

    /// Hands the dispatch to the executor for `at`.
    pub(crate) fn submit(self, at: Instant) -> Result<(), SubmitError> {
        let shared = Arc::clone(&self.shared);
        shared.executor.submit(Box::new(move || self.run()), at)
    }

    fn run(mut self) {
        match self.shared.state.try_acquire(self.version) {
            Acquire::Stale => {
                tracing::trace!(trigger = %self.shared.name, version = self.version, "stale dispatch");
                self.shared
                    .publish(EventKind::Stale, |ev| ev.with_version(self.version));
                return;
            }
            Acquire::Coalesced => {
                tracing::debug!(trigger = %self.shared.name, version = self.version, "coalesced into running attempt");
                self.shared
                    .publish(EventKind::Coalesced, |ev| ev.with_version(self.version));
                return;
            }
            Acquire::Acquired => {}
        }

        loop {
            let next = self.attempt();
            match self.shared.state.release(self.version) {
                Release::Rerun { version } => {
                    self.version = version;
                    tracing::debug!(trigger = %self.shared.name, version, "running again for coalesced fire");
                    self.shared
                        .publish(EventKind::RerunClaimed, |ev| ev.with_version(version));
                }
                Release::Released { current } => {
                    self.shared
                        .publish(EventKind::Released, |ev| ev.with_version(self.version));
                    if let (true, Some(delay)) = (current, next) {
                        self.reschedule(delay);
                    }
                    return;
                }
            }
        }
    }

    /// One call into the work. Returns the requested delay, if any.
    fn attempt(&self) -> Option<Duration> {
        let shared = &self.shared;
        let attempt = shared.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        shared.publish(EventKind::AttemptStarting, |ev| {
            ev.with_version(self.version).with_attempt(attempt)
        });

        let res = match catch_unwind(AssertUnwindSafe(|| shared.work.attempt())) {
            Ok(res) => res,
            Err(payload) => Err(WorkError::from_panic(payload.as_ref())),
        };

        match res {
            Ok(next) => {
                shared.publish(EventKind::AttemptFinished, |ev| {
                    let ev = ev.with_attempt(attempt);
                    match next {
                        Some(d) => ev.with_delay(d),
                        None => ev,
                    }
                });
                next
            }
            Err(e) => {
                tracing::error!(
                    trigger = %shared.name,
                    attempt,
                    error = %e,
                    label = e.as_label(),
                    "unexpected error while running scheduled work"
                );
                shared.publish(EventKind::AttemptFailed, |ev| {
                    ev.with_attempt(attempt).with_reason(e.to_string())
                });
                None
            }
        }
    }

    fn reschedule(self, delay: Duration) {
        let shared = Arc::clone(&self.shared);
        let version = self.version;
        shared.publish(EventKind::Rescheduled, |ev| {
            ev.with_version(version).with_delay(delay)
        });

        if let Err(e) = self.submit(deadline_after(delay)) {
            tracing::error!(
                trigger = %shared.name,
                version,
                error = %e,
                "executor refused self-reschedule; circulation stops"
            );
            shared.publish(EventKind::SubmitRejected, |ev| {
                ev.with_version(version).with_reason(e.to_string())
            });
        }
    }
}
