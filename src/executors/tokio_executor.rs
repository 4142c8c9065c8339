//! # Tokio-backed deadline executor.
//!
//! Each submission becomes a lightweight async task that sleeps until the
//! deadline and then moves the job to the runtime's blocking pool. Work bodies
//! are synchronous and may block, so they never run on an async worker.
//!
//! ## Shutdown
//! [`TokioExecutor::shutdown`] cancels a shared [`CancellationToken`]:
//! - timers still sleeping exit without running their job;
//! - jobs already handed to the blocking pool finish normally;
//! - later submissions fail with [`SubmitError::Closed`].

use std::time::Instant;

use tokio::runtime::Handle;
use tokio::select;
use tokio_util::sync::CancellationToken;

use super::{DeadlineExecutor, Job};
use crate::error::SubmitError;

/// Deadline executor running on a tokio runtime.
///
/// Cloning is cheap; clones share the runtime handle and the shutdown token.
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
    token: CancellationToken,
}

impl TokioExecutor {
    /// Creates an executor that schedules onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            token: CancellationToken::new(),
        }
    }

    /// Creates an executor for the runtime of the current context.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Like [`TokioExecutor::current`], but reports a missing runtime as an error.
    ///
    /// # Errors
    /// [`SubmitError::Rejected`] whose reason names this constructor.
    pub fn try_current() -> Result<Self, SubmitError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| SubmitError::Rejected {
                reason: format!("TokioExecutor::try_current: {e}"),
            })
    }

    /// Stops accepting jobs and drops every job still waiting for its deadline.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Returns true once [`shutdown`](Self::shutdown) was called on any clone.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl DeadlineExecutor for TokioExecutor {
    fn submit(&self, job: Job, at: Instant) -> Result<(), SubmitError> {
        if self.token.is_cancelled() {
            return Err(SubmitError::Closed);
        }
        let token = self.token.clone();
        let deadline = tokio::time::Instant::from_std(at);

        self.handle.spawn(async move {
            let sleep = tokio::time::sleep_until(deadline);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => { return; }
            }
            if let Err(e) = tokio::task::spawn_blocking(job).await {
                tracing::error!(error = %e, "scheduled job did not complete");
            }
        });
        Ok(())
    }
}
