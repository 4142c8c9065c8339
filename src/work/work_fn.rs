//! # Function-backed work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn() -> Result<Option<Duration>, WorkError>`.
//! The closure is shared (`Fn`, not `FnMut`); keep mutable state behind atomics
//! or a lock inside the closure.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use circulate::{Work, WorkFn, WorkRef};
//!
//! let w: WorkRef = WorkFn::arc(|| Ok(Some(Duration::from_millis(250))));
//! assert_eq!(w.attempt().unwrap(), Some(Duration::from_millis(250)));
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::WorkError;
use crate::work::Work;

/// Function-backed work implementation.
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F>
where
    F: Fn() -> Result<Option<Duration>, WorkError> + Send + Sync + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> Work for WorkFn<F>
where
    F: Fn() -> Result<Option<Duration>, WorkError> + Send + Sync + 'static,
{
    fn attempt(&self) -> Result<Option<Duration>, WorkError> {
        (self.f)()
    }
}

impl<F> std::fmt::Debug for WorkFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkFn").finish_non_exhaustive()
    }
}
