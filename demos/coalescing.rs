//! # Example: coalescing
//!
//! Many threads hammer one trigger while its work is slow. The work never
//! overlaps with itself and every burst collapses into a single rerun.
//!
//! ## Flow
//! ```text
//! 4 threads ── fire() ×50 each ──► Trigger
//!                                    ├─► idle    : acquire, attempt()
//!                                    ├─► running : leave a rerun ticket
//!                                    └─► stale   : superseded, no-op
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example coalescing
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use circulate::{Phase, TokioExecutor, Trigger, WorkFn};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let runs = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&runs);

    let trigger = Trigger::builder(
        TokioExecutor::current(),
        WorkFn::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[work] attempt #{n} start");
            std::thread::sleep(Duration::from_millis(30));
            println!("[work] attempt #{n} done");
            Ok(None)
        }),
    )
    .with_name("flush")
    .build();

    let threads: Vec<_> = (0..4)
        .map(|id| {
            let t = trigger.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    if let Err(e) = t.fire() {
                        eprintln!("[caller {id}] fire rejected: {e}");
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();
    for t in threads {
        t.join().map_err(|_| "caller thread panicked")?;
    }

    while trigger.snapshot().phase != Phase::Idle {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!(
        "200 fires, {} attempts, final {:?}",
        runs.load(Ordering::SeqCst),
        trigger.snapshot()
    );
    Ok(())
}
