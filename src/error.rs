//! Error types used by triggers, executors and work bodies.
//!
//! This module defines two error enums:
//!
//! - [`SubmitError`]: a deadline executor refused to schedule a job.
//! - [`WorkError`]: a single work attempt failed.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced by a deadline executor on submission.
///
/// Returned synchronously from [`Trigger::fire`](crate::Trigger::fire) and friends.
/// The trigger never retries a rejected submission itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The executor has been shut down and accepts no more jobs.
    #[error("executor is shut down")]
    Closed,

    /// The executor refused the job for an implementation-specific reason.
    #[error("submission rejected: {reason}")]
    Rejected {
        /// Why the executor refused the job.
        reason: String,
    },
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use circulate::SubmitError;
    ///
    /// assert_eq!(SubmitError::Closed.as_label(), "submit_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Closed => "submit_closed",
            SubmitError::Rejected { .. } => "submit_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubmitError::Closed => "executor closed".to_string(),
            SubmitError::Rejected { reason } => format!("rejected: {reason}"),
        }
    }
}

/// # Errors produced by a work attempt.
///
/// A failed attempt never reaches the caller of `fire`: the trigger logs it,
/// skips the self-reschedule for that run and still honors any coalesced rerun.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The work body reported a failure.
    #[error("attempt failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The work body panicked; the panic was caught by the trigger.
    #[error("attempt panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl WorkError {
    /// Shorthand for [`WorkError::Fail`].
    ///
    /// # Example
    /// ```
    /// use circulate::WorkError;
    ///
    /// let err = WorkError::fail("disk full");
    /// assert_eq!(err.to_string(), "attempt failed: disk full");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Panicked { .. } => "work_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Builds a [`WorkError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        WorkError::Panicked {
            info: panic_message(payload),
        }
    }
}

/// Renders a `catch_unwind` payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
