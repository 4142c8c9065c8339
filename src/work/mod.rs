//! # Work abstractions.
//!
//! - [`Work`] - the body a trigger runs; one call is one attempt
//! - [`WorkFn`] - closure-backed implementation
//! - [`WorkRef`] - shared, type-erased work (`Arc<dyn Work>`)

mod work;
mod work_fn;

pub use work::{Work, WorkRef};
pub use work_fn::WorkFn;
