//! # Work trait.
//!
//! A [`Work`] performs one unit of work per [`attempt`](Work::attempt) and may
//! ask to be run again after a delay. The trigger guarantees that attempts of
//! one work never overlap, although consecutive attempts may run on different
//! threads.

use std::sync::Arc;
use std::time::Duration;

use crate::error::WorkError;

/// # Synchronous unit of work driven by a trigger.
///
/// Return values of `attempt`:
/// - `Ok(None)` - done; run again only when fired;
/// - `Ok(Some(d))` - run again by itself after `d` (self-circulation);
/// - `Err(e)` - logged by the trigger and treated like `Ok(None)`.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
/// use circulate::{Work, WorkError};
///
/// struct Poller {
///     polls: AtomicU32,
/// }
///
/// impl Work for Poller {
///     fn attempt(&self) -> Result<Option<Duration>, WorkError> {
///         let n = self.polls.fetch_add(1, Ordering::Relaxed);
///         if n < 3 {
///             Ok(Some(Duration::from_secs(1)))
///         } else {
///             Ok(None)
///         }
///     }
/// }
/// ```
pub trait Work: Send + Sync + 'static {
    /// Runs one attempt and optionally requests the next one after a delay.
    fn attempt(&self) -> Result<Option<Duration>, WorkError>;
}

/// Shared handle to type-erased work.
pub type WorkRef = Arc<dyn Work>;

impl<W: Work + ?Sized> Work for Arc<W> {
    fn attempt(&self) -> Result<Option<Duration>, WorkError> {
        (**self).attempt()
    }
}

impl<W: Work + ?Sized> Work for Box<W> {
    fn attempt(&self) -> Result<Option<Duration>, WorkError> {
        (**self).attempt()
    }
}
