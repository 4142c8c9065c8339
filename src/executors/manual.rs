//! # Hand-driven deadline executor.
//!
//! [`ManualExecutor`] only queues jobs. Nothing runs until the owner calls
//! [`run_next`](ManualExecutor::run_next) or
//! [`run_until_idle`](ManualExecutor::run_until_idle), which makes every
//! interleaving reproducible. Deadlines are recorded but not waited for.
//!
//! The queue lock is released before a job runs, so jobs may submit more jobs
//! or drive the executor themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use super::{DeadlineExecutor, Job};
use crate::error::SubmitError;

struct Entry {
    at: Instant,
    seq: u64,
    job: Job,
}

#[derive(Default)]
struct Queue {
    entries: Vec<Entry>,
    next_seq: u64,
}

/// Deterministic executor for tests and simulations.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use circulate::{ManualExecutor, Trigger, WorkFn};
///
/// let exec = Arc::new(ManualExecutor::new());
/// let trigger = Trigger::bind(Arc::clone(&exec), WorkFn::new(|| Ok(None)));
///
/// trigger.fire().unwrap();
/// assert_eq!(exec.pending(), 1);
/// assert_eq!(exec.run_until_idle(), 1);
/// assert_eq!(trigger.attempts(), 1);
/// ```
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<Queue>,
    closed: AtomicBool,
}

impl ManualExecutor {
    /// Upper bound on jobs run by one [`run_until_idle`](Self::run_until_idle).
    pub const MAX_STEPS: usize = 10_000;

    /// Creates an empty, open executor.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.lock().entries.len()
    }

    /// Deadlines of queued jobs, earliest first.
    pub fn deadlines(&self) -> Vec<Instant> {
        let q = self.lock();
        let mut at: Vec<Instant> = q.entries.iter().map(|e| e.at).collect();
        at.sort_unstable();
        at
    }

    /// Runs the job with the earliest deadline (ties in submission order).
    ///
    /// Returns false when the queue was empty.
    pub fn run_next(&self) -> bool {
        let entry = {
            let mut q = self.lock();
            let idx = q
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| (e.at, e.seq))
                .map(|(i, _)| i);
            match idx {
                Some(i) => q.entries.swap_remove(i),
                None => return false,
            }
        };
        (entry.job)();
        true
    }

    /// Runs jobs until the queue is empty, including jobs submitted meanwhile.
    ///
    /// Stops after [`MAX_STEPS`](Self::MAX_STEPS) jobs so a self-rescheduling
    /// trigger cannot spin forever. Returns the number of jobs run.
    pub fn run_until_idle(&self) -> usize {
        let mut steps = 0;
        while steps < Self::MAX_STEPS && self.run_next() {
            steps += 1;
        }
        steps
    }

    /// Rejects all further submissions with [`SubmitError::Closed`].
    ///
    /// Jobs already queued stay runnable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl DeadlineExecutor for ManualExecutor {
    fn submit(&self, job: Job, at: Instant) -> Result<(), SubmitError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SubmitError::Closed);
        }
        let mut q = self.lock();
        let seq = q.next_seq;
        q.next_seq += 1;
        q.entries.push(Entry { at, seq, job });
        Ok(())
    }
}

impl std::fmt::Debug for ManualExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualExecutor")
            .field("pending", &self.pending())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
