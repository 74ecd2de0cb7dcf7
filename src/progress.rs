//! Simulated progress for long-running generation calls.
//!
//! The image and text services expose no incremental progress signal, so a
//! user-facing indicator is kept alive by a ticking estimate: the value rises
//! by a small random increment on a fixed wall-clock interval and
//! asymptotically approaches a ceiling it never reaches until the caller
//! stops the handle.

use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

pub const PROGRESS_CEILING: f32 = 95.0;
pub const PROGRESS_COMPLETE: f32 = 100.0;
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Factory for progress handles. Remembers the last observed value so a new
/// call can resume where the previous one stopped (0 on first start).
#[derive(Clone, Default)]
pub struct ProgressEstimator {
    last: Arc<Mutex<f32>>,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a ticking estimate. The returned handle owns the timer task;
    /// dropping or stopping the handle tears the timer down.
    pub fn start(&self) -> ProgressHandle {
        let value = Arc::new(Mutex::new(*self.last.lock().unwrap()));
        let (tx, rx) = mpsc::channel(32);

        let ticker_value = value.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                let current = {
                    let mut v = ticker_value.lock().unwrap();
                    let headroom = PROGRESS_CEILING - *v;
                    if headroom > 0.0 {
                        // Increment shrinks with remaining headroom, so the
                        // value approaches but never reaches the ceiling.
                        let step = rand::thread_rng().gen_range(0.5..3.0_f32);
                        *v += step * headroom / PROGRESS_CEILING;
                    }
                    *v
                };
                // Slow consumers only lose intermediate values.
                let _ = tx.try_send(current);
            }
        });

        ProgressHandle {
            value,
            last: self.last.clone(),
            task,
            updates: Some(rx),
        }
    }
}

/// A single in-flight progress estimate.
pub struct ProgressHandle {
    value: Arc<Mutex<f32>>,
    last: Arc<Mutex<f32>>,
    task: JoinHandle<()>,
    updates: Option<mpsc::Receiver<f32>>,
}

impl ProgressHandle {
    /// Current estimated value, 0.0..=100.0.
    pub fn current(&self) -> f32 {
        *self.value.lock().unwrap()
    }

    /// Stream of tick updates. Can be taken once.
    pub fn updates(&mut self) -> Option<ReceiverStream<f32>> {
        self.updates.take().map(ReceiverStream::new)
    }

    /// Stop the timer and remember the current value as the resume point for
    /// the next start.
    pub fn stop(mut self) -> f32 {
        let current = self.current();
        self.teardown(current);
        current
    }

    /// Stop the timer and snap to 100. The resume point resets to 0 so the
    /// next call starts fresh.
    pub fn finish(mut self) -> f32 {
        self.teardown(0.0);
        *self.value.lock().unwrap() = PROGRESS_COMPLETE;
        PROGRESS_COMPLETE
    }

    fn teardown(&mut self, resume_at: f32) {
        self.task.abort();
        *self.last.lock().unwrap() = resume_at;
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        // Error paths that never called stop/finish must not leak the timer.
        self.task.abort();
    }
}
