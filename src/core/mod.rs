//! Trigger core: state word, dispatch protocol and public handle.
//!
//! The only public API from this module is [`Trigger`] (with its builder,
//! configuration and state snapshot types).
//!
//! Internal modules:
//! - [`state`]: packed atomic state word and its CAS transitions;
//! - [`dispatch`]: one scheduled invocation: acquire, run, release, reschedule;
//! - [`trigger`]: public handle (`fire*`, `suspend`, diagnostics);
//! - [`builder`]: configuration and subscriber wiring.

mod builder;
mod config;
mod dispatch;
mod state;
mod trigger;

pub use builder::TriggerBuilder;
pub use config::Config;
pub use state::{Phase, Snapshot};
pub use trigger::Trigger;
