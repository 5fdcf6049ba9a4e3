//! Background execution of pipeline runs.
//!
//! Runs are submitted without blocking the caller and execute on their own
//! tokio task. A semaphore bounds how many run at once; the rest wait for a
//! permit inside their task. `shutdown` stops intake and drains what is left.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};
use tracing::{debug, info, warn};

use crate::error::PipelineError;

struct RunnerInner {
    permits: Arc<Semaphore>,
    closed: AtomicBool,
    submitted: AtomicU64,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl RunnerInner {
    fn finish_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Decrements the in-flight count when a run ends, including by panic.
struct InFlightGuard(Arc<RunnerInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.finish_one();
    }
}

/// Bounded, drainable executor for pipeline runs.
#[derive(Clone)]
pub struct PipelineRunner {
    inner: Arc<RunnerInner>,
    max_concurrent: usize,
}

impl PipelineRunner {
    /// Create a runner allowing `max_concurrent` simultaneous runs (min 1).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            inner: Arc::new(RunnerInner {
                permits: Arc::new(Semaphore::new(max_concurrent)),
                closed: AtomicBool::new(false),
                submitted: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
            max_concurrent,
        }
    }

    /// Submit a run. Returns immediately; the run is never awaited by the caller.
    ///
    /// Fails only once `shutdown` has been called.
    pub fn spawn<F>(&self, label: &str, run: F) -> Result<(), PipelineError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.inner));

        if self.inner.closed.load(Ordering::SeqCst) {
            drop(guard);
            warn!(ticket_id = label, "Runner is shut down, rejecting pipeline run");
            return Err(PipelineError::RunnerClosed {
                ticket_id: label.to_string(),
            });
        }

        self.inner.submitted.fetch_add(1, Ordering::SeqCst);
        let permits = Arc::clone(&self.inner.permits);
        let label = label.to_string();

        tokio::spawn(async move {
            let _guard = guard;
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(ticket_id = %label, "Runner semaphore closed, dropping run");
                    return;
                }
            };
            debug!(ticket_id = %label, "Pipeline run started");
            run.await;
        });

        Ok(())
    }

    /// Total runs accepted since start.
    pub fn submitted(&self) -> u64 {
        self.inner.submitted.load(Ordering::SeqCst)
    }

    /// Runs accepted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Wait until no runs are in flight. Does not stop intake.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Refuse new runs and wait up to `grace` for outstanding ones.
    ///
    /// Returns `true` if every run finished within the grace period.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.inner.closed.store(true, Ordering::SeqCst);
        let outstanding = self.in_flight();
        info!(outstanding, "Draining pipeline runs");

        match tokio::time::timeout(grace, self.wait_idle()).await {
            Ok(()) => {
                info!("All pipeline runs finished");
                true
            }
            Err(_) => {
                warn!(
                    remaining = self.in_flight(),
                    grace_secs = grace.as_secs(),
                    "Shutdown grace period elapsed with pipeline runs outstanding"
                );
                false
            }
        }
    }
}
