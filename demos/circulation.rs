//! # Example: circulation
//!
//! A poller that keeps itself alive: each attempt asks for the next one,
//! backing off while there is nothing to do. A fire cuts the wait short and
//! `suspend` stops the loop.
//!
//! Events are rendered through `tracing` by the built-in [`LogWriter`].
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example circulation --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use circulate::{Config, LogWriter, Subscribe, TokioExecutor, Trigger, WorkError, WorkFn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let polls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&polls);

    let cfg = Config {
        name: "poller".into(),
        ..Config::default()
    };
    let trigger = Trigger::builder(
        TokioExecutor::current(),
        WorkFn::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 3 {
                return Err(WorkError::fail("upstream unavailable"));
            }
            // 40ms, 80ms, ... capped at 320ms.
            let backoff = 20u64 << n.min(4);
            Ok(Some(Duration::from_millis(backoff)))
        }),
    )
    .with_config(cfg)
    .with_subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
    .build();

    trigger.fire()?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The failed third attempt ended the loop; fire to restart it.
    trigger.fire()?;
    tokio::time::sleep(Duration::from_millis(700)).await;

    trigger.suspend();
    tokio::time::sleep(Duration::from_millis(400)).await;

    tracing::info!(
        polls = polls.load(Ordering::SeqCst),
        attempts = trigger.attempts(),
        "poller suspended"
    );
    Ok(())
}
