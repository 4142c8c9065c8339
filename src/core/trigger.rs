//! # Trigger: the public handle.
//!
//! A [`Trigger`] binds one [`Work`] to one [`DeadlineExecutor`]. Any thread may
//! fire or suspend it at any time; the work still never runs twice at once.
//!
//! ## Guarantees
//! - **Mutual exclusion**: at most one `Work::attempt` runs at any instant.
//! - **Coalescing**: any number of fires landing during an attempt produce
//!   exactly one extra attempt after it.
//! - **No lost fire**: a fire not followed by `suspend` leads to an attempt
//!   that starts after the fire.
//! - **Suspension**: after `suspend`, dispatches created earlier do nothing and
//!   no coalesced rerun or self-reschedule follows the current attempt.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use circulate::{ManualExecutor, Phase, Trigger, WorkFn};
//!
//! let exec = Arc::new(ManualExecutor::new());
//! let trigger = Trigger::bind(
//!     Arc::clone(&exec),
//!     WorkFn::new(|| Ok(Some(Duration::from_secs(60)))),
//! );
//!
//! trigger.fire().unwrap();
//! assert!(exec.run_next());
//! assert_eq!(trigger.attempts(), 1);
//! assert_eq!(trigger.snapshot().phase, Phase::Idle);
//!
//! // The work asked to run again in a minute.
//! assert_eq!(exec.pending(), 1);
//!
//! // Suspending turns that pending dispatch into a no-op.
//! trigger.suspend();
//! exec.run_until_idle();
//! assert_eq!(trigger.attempts(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::core::builder::TriggerBuilder;
use crate::core::dispatch::Dispatch;
use crate::core::state::{Snapshot, StateWord};
use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};
use crate::executors::{DeadlineExecutor, deadline_after};
use crate::work::Work;

/// State shared by a trigger's handles and its in-flight dispatches.
pub(crate) struct Shared<E, W> {
    pub(crate) state: StateWord,
    pub(crate) executor: E,
    pub(crate) work: W,
    pub(crate) name: Arc<str>,
    pub(crate) attempts: AtomicU64,
    bus: Bus,
    stop: CancellationToken,
}

impl<E, W> Shared<E, W> {
    pub(crate) fn new(executor: E, work: W, name: Arc<str>, bus: Bus, stop: CancellationToken) -> Self {
        Self {
            state: StateWord::new(),
            executor,
            work,
            name,
            attempts: AtomicU64::new(0),
            bus,
            stop,
        }
    }

    /// Publishes an event tagged with the trigger name.
    ///
    /// `build` only runs when somebody is listening.
    #[inline]
    pub(crate) fn publish(&self, kind: EventKind, build: impl FnOnce(Event) -> Event) {
        if self.bus.has_receivers() {
            let ev = Event::new(kind).with_trigger(Arc::clone(&self.name));
            self.bus.publish(build(ev));
        }
    }
}

impl<E, W> Drop for Shared<E, W> {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Coalescing, self-rescheduling trigger for one piece of work.
///
/// Cloning is cheap; all clones drive the same trigger.
pub struct Trigger<E, W> {
    shared: Arc<Shared<E, W>>,
}

impl<E, W> Clone for Trigger<E, W> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: DeadlineExecutor, W: Work> Trigger<E, W> {
    /// Binds `work` to `executor` with the default [`Config`](crate::Config).
    ///
    /// Needs no runtime context; see [`Trigger::builder`] for subscribers.
    pub fn bind(executor: E, work: W) -> Self {
        TriggerBuilder::new(executor, work).build()
    }

    /// Starts a builder for a trigger with custom configuration or subscribers.
    pub fn builder(executor: E, work: W) -> TriggerBuilder<E, W> {
        TriggerBuilder::new(executor, work)
    }

    pub(crate) fn from_shared(shared: Arc<Shared<E, W>>) -> Self {
        Self { shared }
    }

    /// Requests a run as soon as possible. Same as `fire_at(Instant::now())`.
    pub fn fire(&self) -> Result<(), SubmitError> {
        self.fire_at(Instant::now())
    }

    /// Requests a run after `delay`.
    pub fn fire_after(&self, delay: Duration) -> Result<(), SubmitError> {
        self.fire_at(deadline_after(delay))
    }

    /// Requests a run no earlier than `at`.
    ///
    /// The new dispatch supersedes every dispatch not yet started. If the work
    /// is running when the dispatch fires, it leaves a rerun ticket instead.
    ///
    /// # Errors
    /// Returns the executor's error unchanged. The version was already advanced,
    /// so a rejected fire still invalidates earlier pending dispatches.
    pub fn fire_at(&self, at: Instant) -> Result<(), SubmitError> {
        let shared = &self.shared;
        let version = shared.state.advance_version();
        shared.publish(EventKind::Fired, |ev| {
            ev.with_version(version)
                .with_delay(at.saturating_duration_since(Instant::now()))
        });

        Dispatch::new(Arc::clone(shared), version)
            .submit(at)
            .inspect_err(|e| {
                tracing::warn!(trigger = %shared.name, version, error = %e, "executor refused dispatch");
                shared.publish(EventKind::SubmitRejected, |ev| {
                    ev.with_version(version).with_reason(e.to_string())
                });
            })
    }

    /// Invalidates every pending dispatch and any owed rerun.
    ///
    /// An attempt already running completes normally but will neither rerun
    /// nor reschedule itself.
    pub fn suspend(&self) {
        let version = self.shared.state.advance_version();
        tracing::debug!(trigger = %self.shared.name, version, "suspended");
        self.shared
            .publish(EventKind::Suspended, |ev| ev.with_version(version));
    }
}

impl<E, W> Trigger<E, W> {
    /// Current version and phase.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.state.snapshot()
    }

    /// Number of work attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.shared.attempts.load(Ordering::Relaxed)
    }

    /// Trigger name from its [`Config`](crate::Config).
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// New receiver for this trigger's events (only events published later).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// The executor this trigger submits to.
    pub fn executor(&self) -> &E {
        &self.shared.executor
    }

    /// The bound work.
    pub fn work(&self) -> &W {
        &self.shared.work
    }
}

impl<E, W> std::fmt::Debug for Trigger<E, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.shared.name)
            .field("state", &self.snapshot())
            .field("attempts", &self.attempts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Phase;
    use crate::error::WorkError;
    use crate::executors::ManualExecutor;
    use crate::work::{WorkFn, WorkRef};
    use std::sync::{Mutex, OnceLock};

    type ManualTrigger = Trigger<Arc<ManualExecutor>, WorkRef>;

    /// Work whose body may reach back into its own trigger.
    fn reentrant<F>(exec: &Arc<ManualExecutor>, body: F) -> ManualTrigger
    where
        F: Fn(&ManualTrigger, &ManualExecutor, u64) -> Result<Option<Duration>, WorkError>
            + Send
            + Sync
            + 'static,
    {
        let cell: Arc<OnceLock<ManualTrigger>> = Arc::new(OnceLock::new());
        let inner_cell = Arc::clone(&cell);
        let inner_exec = Arc::clone(exec);
        let calls = Arc::new(AtomicU64::new(0));

        let work: WorkRef = WorkFn::arc(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let trigger = inner_cell.get().expect("trigger bound before first attempt");
            body(trigger, &*inner_exec, n)
        });
        let trigger = Trigger::bind(Arc::clone(exec), work);
        let _ = cell.set(trigger.clone());
        trigger
    }

    #[test]
    fn fire_runs_work_once() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(Arc::clone(&exec), WorkFn::new(|| Ok(None)));

        trigger.fire().unwrap();
        assert_eq!(trigger.attempts(), 0);
        assert_eq!(exec.run_until_idle(), 1);
        assert_eq!(trigger.attempts(), 1);
        assert_eq!(trigger.snapshot().phase, Phase::Idle);
    }

    #[test]
    fn accessors_expose_bound_executor_and_work() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(
            Arc::clone(&exec),
            WorkFn::new(|| Ok(Some(Duration::from_secs(1)))),
        );

        trigger.fire().unwrap();
        assert_eq!(trigger.executor().pending(), 1);
        assert!(Arc::ptr_eq(trigger.executor(), &exec));
        assert_eq!(
            trigger.work().attempt(),
            Ok(Some(Duration::from_secs(1)))
        );
        // Calling the work directly bypasses the trigger.
        assert_eq!(trigger.attempts(), 0);
    }

    #[test]
    fn suspend_without_fire_never_runs() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(Arc::clone(&exec), WorkFn::new(|| Ok(None)));

        trigger.suspend();
        assert_eq!(exec.pending(), 0);
        assert_eq!(exec.run_until_idle(), 0);
        assert_eq!(trigger.attempts(), 0);
    }

    #[test]
    fn suspend_invalidates_pending_dispatch() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(Arc::clone(&exec), WorkFn::new(|| Ok(None)));

        trigger.fire_after(Duration::from_secs(5)).unwrap();
        trigger.suspend();
        assert_eq!(exec.run_until_idle(), 1);
        assert_eq!(trigger.attempts(), 0);
    }

    #[test]
    fn newer_fire_supersedes_older_pending_one() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(Arc::clone(&exec), WorkFn::new(|| Ok(None)));

        trigger.fire().unwrap();
        trigger.fire().unwrap();
        trigger.fire().unwrap();
        assert_eq!(exec.run_until_idle(), 3);
        assert_eq!(trigger.attempts(), 1);
    }

    #[test]
    fn fires_during_attempt_collapse_into_one_rerun() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = reentrant(&exec, |trigger, exec, n| {
            if n == 1 {
                for _ in 0..3 {
                    trigger.fire().unwrap();
                    // Dispatch lands while this attempt still owns the work.
                    assert!(exec.run_next());
                }
                assert_eq!(trigger.snapshot().phase, Phase::RunningReserved);
            }
            Ok(None)
        });

        trigger.fire().unwrap();
        exec.run_until_idle();
        assert_eq!(trigger.attempts(), 2);
        assert_eq!(trigger.snapshot().phase, Phase::Idle);
    }

    #[test]
    fn pending_dispatch_that_lands_after_release_runs_normally() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = reentrant(&exec, |trigger, _exec, n| {
            if n == 1 {
                // Queued, but only dispatched once this attempt has released.
                trigger.fire().unwrap();
            }
            Ok(None)
        });

        trigger.fire().unwrap();
        exec.run_until_idle();
        assert_eq!(trigger.attempts(), 2);
    }

    #[test]
    fn self_circulation_reschedules_with_delay() {
        let exec = Arc::new(ManualExecutor::new());
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        let trigger = Trigger::bind(
            Arc::clone(&exec),
            WorkFn::new(move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n < 3).then_some(Duration::from_millis(50)))
            }),
        );

        trigger.fire().unwrap();
        let before = Instant::now();
        assert!(exec.run_next());
        let deadlines = exec.deadlines();
        assert_eq!(deadlines.len(), 1);
        assert!(deadlines[0] >= before + Duration::from_millis(50));

        exec.run_until_idle();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(exec.pending(), 0);
    }

    #[test]
    fn reschedule_keeps_version() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(
            Arc::clone(&exec),
            WorkFn::new(|| Ok(Some(Duration::from_millis(1)))),
        );

        trigger.fire().unwrap();
        let v = trigger.snapshot().version;
        for _ in 0..5 {
            assert!(exec.run_next());
        }
        assert_eq!(trigger.attempts(), 5);
        assert_eq!(trigger.snapshot().version, v);
    }

    #[test]
    fn suspend_during_attempt_stops_rerun_and_reschedule() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = reentrant(&exec, |trigger, exec, n| {
            if n == 1 {
                trigger.fire().unwrap();
                assert!(exec.run_next());
                trigger.suspend();
            }
            Ok(Some(Duration::from_millis(10)))
        });

        trigger.fire().unwrap();
        exec.run_until_idle();
        assert_eq!(trigger.attempts(), 1);
        assert_eq!(exec.pending(), 0);
    }

    #[test]
    fn fire_during_attempt_turns_reschedule_into_rerun() {
        // The rerun runs under the fire's version, so its own delay still counts.
        let exec = Arc::new(ManualExecutor::new());
        let trigger = reentrant(&exec, |trigger, exec, n| {
            match n {
                1 => {
                    trigger.fire().unwrap();
                    assert!(exec.run_next());
                    Ok(Some(Duration::from_millis(10)))
                }
                2 => Ok(Some(Duration::from_millis(10))),
                _ => Ok(None),
            }
        });

        trigger.fire().unwrap();
        assert!(exec.run_next());
        assert_eq!(trigger.attempts(), 2);
        assert_eq!(exec.pending(), 1);
        exec.run_until_idle();
        assert_eq!(trigger.attempts(), 3);
    }

    #[test]
    fn failed_attempt_skips_reschedule_but_keeps_rerun() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = reentrant(&exec, |trigger, exec, n| {
            if n == 1 {
                trigger.fire().unwrap();
                assert!(exec.run_next());
                return Err(WorkError::fail("first attempt broke"));
            }
            Ok(None)
        });

        trigger.fire().unwrap();
        exec.run_until_idle();
        assert_eq!(trigger.attempts(), 2);
    }

    #[test]
    fn failed_attempt_does_not_reschedule() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(
            Arc::clone(&exec),
            WorkFn::new(|| Err(WorkError::fail("always"))),
        );

        trigger.fire().unwrap();
        assert_eq!(exec.run_until_idle(), 1);
        assert_eq!(trigger.attempts(), 1);
        assert_eq!(exec.pending(), 0);
        assert_eq!(trigger.snapshot().phase, Phase::Idle);
    }

    #[test]
    fn panicking_attempt_is_contained() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = reentrant(&exec, |trigger, exec, n| {
            if n == 1 {
                trigger.fire().unwrap();
                assert!(exec.run_next());
                panic!("work body blew up");
            }
            Ok(Some(Duration::from_millis(5)))
        });

        trigger.fire().unwrap();
        assert!(exec.run_next());
        assert_eq!(trigger.attempts(), 2);
        assert_eq!(trigger.snapshot().phase, Phase::Idle);
        // The rerun succeeded and asked for another round.
        assert_eq!(exec.pending(), 1);
    }

    #[test]
    fn rejected_fire_is_returned_and_still_invalidates() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(Arc::clone(&exec), WorkFn::new(|| Ok(None)));

        trigger.fire().unwrap();
        exec.close();
        assert_eq!(trigger.fire(), Err(SubmitError::Closed));

        exec.run_until_idle();
        assert_eq!(trigger.attempts(), 0);
    }

    #[test]
    fn rejected_reschedule_ends_circulation() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::bind(
            Arc::clone(&exec),
            WorkFn::new(|| Ok(Some(Duration::from_millis(5)))),
        );
        let mut rx = trigger.subscribe();

        trigger.fire().unwrap();
        exec.close();
        assert!(exec.run_next());
        assert_eq!(exec.pending(), 0);

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(kinds.last(), Some(&EventKind::SubmitRejected));
    }

    #[test]
    fn events_trace_the_protocol() {
        let exec = Arc::new(ManualExecutor::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let trigger = reentrant(&exec, |trigger, exec, n| {
            if n == 1 {
                trigger.fire().unwrap();
                assert!(exec.run_next());
            }
            Ok(None)
        });
        let mut rx = trigger.subscribe();

        trigger.fire().unwrap();
        exec.run_until_idle();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.trigger.as_deref(), Some("trigger"));
            seen.lock().unwrap().push(ev.kind);
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                EventKind::Fired,
                EventKind::AttemptStarting,
                EventKind::Fired,
                EventKind::Coalesced,
                EventKind::AttemptFinished,
                EventKind::RerunClaimed,
                EventKind::AttemptStarting,
                EventKind::AttemptFinished,
                EventKind::Released,
            ]
        );
    }

    #[test]
    fn debug_shows_name_and_state() {
        let exec = Arc::new(ManualExecutor::new());
        let trigger = Trigger::builder(exec, WorkFn::new(|| Ok(None)))
            .with_name("flush")
            .build();
        let dbg = format!("{trigger:?}");
        assert!(dbg.contains("flush"));
        assert!(dbg.contains("Idle"));
        assert_eq!(trigger.name(), "flush");
    }
}
