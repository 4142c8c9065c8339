//! Common test utilities.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use circulate::{Work, WorkError};

/// Work that records every attempt and flags overlapping attempts.
///
/// `plan` decides the outcome of attempt `n` (1-based).
pub struct Tally<F> {
    pub plan: F,
    pub hold: Duration,
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub overlapped: AtomicBool,
    pub started_at: Mutex<Vec<Instant>>,
}

impl<F> Tally<F>
where
    F: Fn(usize) -> Result<Option<Duration>, WorkError> + Send + Sync + 'static,
{
    /// `hold` is how long every attempt sleeps before returning.
    pub fn new(hold: Duration, plan: F) -> Arc<Self> {
        Arc::new(Self {
            plan,
            hold,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
            started_at: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.started_at.lock().unwrap().clone()
    }
}

impl<F> Work for Tally<F>
where
    F: Fn(usize) -> Result<Option<Duration>, WorkError> + Send + Sync + 'static,
{
    fn attempt(&self) -> Result<Option<Duration>, WorkError> {
        if self.active.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.started_at.lock().unwrap().push(Instant::now());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        let res = (self.plan)(n);

        self.active.fetch_sub(1, Ordering::SeqCst);
        res
    }
}

/// Polls `cond` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    cond()
}
