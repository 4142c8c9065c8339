//! # circulate
//!
//! **circulate** provides a coalescing, self-rescheduling trigger: many callers
//! on many threads can ask "run this work soon" while the work itself
//! never runs concurrently with itself.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    caller A        caller B        caller C          work (self-circulation)
//!       │ fire()        │ fire_at(t)    │ suspend()          │ Ok(Some(delay))
//!       ▼               ▼               ▼                    │
//! ┌──────────────────────────────────────────────────────────┼────────┐
//! │  Trigger                                                 │        │
//! │  - StateWord (AtomicU64: reservation │ running │ version)│        │
//! │  - DeadlineExecutor (where dispatches run)               │        │
//! │  - Work (what runs)                                      │        │
//! │  - Bus (broadcast events)                                │        │
//! └──────┬───────────────────────────────────────────────────┼────────┘
//!        │ submit(Dispatch{version}, at)                     │
//!        ▼                                                   │
//! ┌───────────────────────┐                                  │
//! │   DeadlineExecutor    │ ◄────────────────────────────────┘
//! │ (tokio / manual / own)│
//! └──────┬────────────────┘
//!        ▼  at or after `at`, on some worker thread
//!    Dispatch::run()
//! ```
//!
//! ### Lifecycle of a dispatch
//! ```text
//! read state word
//!   ├─ version moved on     ─► stale: return
//!   ├─ idle                 ─► CAS running=1, own the work
//!   └─ running elsewhere    ─► CAS reservation=low bits: return (owner reruns once)
//!
//! while owning {
//!   ├─► work.attempt()               (Err/panic ⇒ logged, no delay)
//!   └─► read state word
//!         ├─ ticket matches ─► CAS clear ticket, adopt its version, run again
//!         └─ no ticket      ─► CAS running=0
//!                               └─ version unchanged && delay ⇒ submit self at now+delay
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Trigger**       | Fire, fire later, suspend; coalesce bursts into one rerun.      | [`Trigger`], [`TriggerBuilder`]             |
//! | **Work**          | The body being triggered; may request its own next run.         | [`Work`], [`WorkFn`], [`WorkRef`]           |
//! | **Executors**     | Where and when dispatches run.                                  | [`DeadlineExecutor`], [`TokioExecutor`], [`ManualExecutor`] |
//! | **Events**        | Observe the protocol (fires, coalescing, attempts, reschedules).| [`Event`], [`EventKind`], [`Subscribe`]     |
//! | **Errors**        | Typed errors for submissions and attempts.                      | [`SubmitError`], [`WorkError`]              |
//! | **Configuration** | Name and event buffer size.                                     | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use circulate::{TokioExecutor, Trigger, WorkFn};
//!
//! #[tokio::main(flavor = "multi_thread", worker_threads = 2)]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runs = Arc::new(AtomicU32::new(0));
//!     let counter = Arc::clone(&runs);
//!
//!     // Poll three times, 20ms apart, then go quiet until fired again.
//!     let trigger = Trigger::bind(
//!         TokioExecutor::current(),
//!         WorkFn::new(move || {
//!             let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
//!             Ok((n < 3).then_some(Duration::from_millis(20)))
//!         }),
//!     );
//!
//!     trigger.fire()?;
//!     tokio::time::sleep(Duration::from_millis(300)).await;
//!     assert_eq!(runs.load(Ordering::SeqCst), 3);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod executors;
mod subscribers;
mod work;

// ---- Public re-exports ----

pub use crate::core::{Config, Phase, Snapshot, Trigger, TriggerBuilder};
pub use error::{SubmitError, WorkError};
pub use events::{Bus, Event, EventKind};
pub use executors::{DeadlineExecutor, Job, ManualExecutor, TokioExecutor};
pub use subscribers::{Subscribe, SubscriberSet};
pub use work::{Work, WorkFn, WorkRef};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
