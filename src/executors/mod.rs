//! # Deadline executors.
//!
//! A trigger never sleeps or spawns by itself: it hands each dispatch to a
//! [`DeadlineExecutor`] together with the earliest instant it may run.
//!
//! ## Contents
//! - [`DeadlineExecutor`] the capability a trigger is parameterized over
//! - [`TokioExecutor`] timers on a tokio runtime, jobs on its blocking pool
//! - [`ManualExecutor`] deterministic queue driven by hand (tests, simulations)
//!
//! ## Contract
//! ```text
//! submit(job, at) ──► Ok(())   job runs once, not before `at`, on some thread
//!                 └─► Err(e)   job is dropped; error goes back to the caller
//! ```
//! No cancellation is required: a trigger invalidates stale jobs itself.

mod manual;
mod tokio_executor;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::SubmitError;

pub use manual::ManualExecutor;
pub use tokio_executor::TokioExecutor;

/// A unit of scheduled execution.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks no earlier than a given instant.
///
/// # Example
/// ```
/// use std::time::Instant;
/// use circulate::{DeadlineExecutor, Job, SubmitError};
///
/// /// Runs everything immediately on the caller's thread, ignoring deadlines.
/// struct Inline;
///
/// impl DeadlineExecutor for Inline {
///     fn submit(&self, job: Job, _at: Instant) -> Result<(), SubmitError> {
///         job();
///         Ok(())
///     }
/// }
/// ```
pub trait DeadlineExecutor: Send + Sync + 'static {
    /// Schedules `job` to run once, not before `at`.
    fn submit(&self, job: Job, at: Instant) -> Result<(), SubmitError>;
}

impl<E: DeadlineExecutor + ?Sized> DeadlineExecutor for Arc<E> {
    fn submit(&self, job: Job, at: Instant) -> Result<(), SubmitError> {
        (**self).submit(job, at)
    }
}

impl<E: DeadlineExecutor + ?Sized> DeadlineExecutor for Box<E> {
    fn submit(&self, job: Job, at: Instant) -> Result<(), SubmitError> {
        (**self).submit(job, at)
    }
}

/// Roughly a century; used when `now + delay` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Returns `now + delay`, saturating instead of panicking on overflow.
pub(crate) fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
