//! # Task Scheduler
//!
//! The concurrency core: a fixed-size pool of worker threads executes
//! blocking task bodies (network requests, cache reads and writes) while
//! every continuation resumes on the single loop task that submitted it.
//! The scheduler tracks in-flight task identities so that two logically
//! identical requests can never run at the same time.
//!
//! ## Contract
//!
//! - [`Scheduler::submit`] resolves with the task's [`TaskOutcome`]; a
//!   duplicate in-flight id resolves immediately with a failure outcome
//!   and the task body is not executed a second time.
//! - [`Scheduler::submit_delayed`] defers execution by at least the given
//!   delay; the dedup check still applies at fire time.
//! - A continuation never observes its own task id as still running: the
//!   registry entry is cleared before the submitter is resumed.
//! - [`Scheduler::shutdown`] is idempotent, cancels delayed submissions
//!   that have not fired, refuses new work, and waits for in-flight
//!   workers to drain rather than aborting them.
//! - A panicking worker surfaces as `{success: false, "internal error"}`;
//!   the scheduler itself never crashes.

mod registry;
mod task;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, warn};

pub use registry::RunningTasks;
pub use task::{Task, TaskKind, TaskOutcome};

const STOPPED_MESSAGE: &str = "scheduler is stopped";

pub struct Scheduler {
    registry: Arc<RunningTasks>,
    workers: Arc<Semaphore>,
    worker_count: usize,
    stop: watch::Sender<bool>,
}

impl Scheduler {
    /// Create a scheduler with a fixed-size worker pool.
    ///
    /// `worker_count` bounds how many blocking task bodies run in
    /// parallel; submissions beyond that queue for a free worker.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (stop, _) = watch::channel(false);
        Self {
            registry: Arc::new(RunningTasks::new()),
            workers: Arc::new(Semaphore::new(worker_count)),
            worker_count,
            stop,
        }
    }

    /// Execute `task` on the worker pool and resolve with its outcome.
    pub async fn submit(&self, task: Task) -> TaskOutcome {
        if *self.stop.borrow() {
            return TaskOutcome::failed(STOPPED_MESSAGE);
        }

        let id = task.id().to_string();
        if !self.registry.try_begin(&id) {
            debug!(task_id = %id, "rejecting duplicate in-flight task");
            return TaskOutcome::failed(format!("task '{id}' is already running"));
        }

        let permit = match self.workers.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Pool closed while we were queued for a worker.
                self.registry.finish(&id);
                return TaskOutcome::failed(STOPPED_MESSAGE);
            }
        };

        let join = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task.execute()
        })
        .await;

        let outcome = match join {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(task_id = %id, error = %e, "worker failed mid-operation");
                TaskOutcome::failed("internal error")
            }
        };

        // Clear the flag before resuming the caller so a continuation
        // issuing a follow-up task with the same id cannot self-block.
        self.registry.finish(&id);
        debug!(task_id = %id, success = outcome.success, "task completed");
        outcome
    }

    /// Execute `task` after at least `delay` has elapsed.
    ///
    /// Resolves with a failure outcome instead of firing when the
    /// scheduler shuts down first.
    pub async fn submit_delayed(&self, task: Task, delay: Duration) -> TaskOutcome {
        let mut stopped = self.stop.subscribe();
        if *stopped.borrow() {
            return TaskOutcome::failed(STOPPED_MESSAGE);
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => self.submit(task).await,
            _ = async { let _ = stopped.wait_for(|flag| *flag).await; } => {
                debug!(task_id = %task.id(), "delayed task cancelled by shutdown");
                TaskOutcome::failed(STOPPED_MESSAGE)
            }
        }
    }

    /// Point-in-time snapshot of the in-flight registry. Best effort:
    /// the answer may be stale immediately after return.
    pub fn is_running(&self, id: &str) -> bool {
        self.registry.is_running(id)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stop accepting work, cancel pending delayed submissions, and wait
    /// for in-flight workers to drain. Safe to call more than once.
    pub async fn shutdown(&self) {
        if self.stop.send_replace(true) {
            return;
        }

        // Draining: every worker permit must come home before we close
        // the pool; queued submissions then fail with a stopped outcome.
        match self
            .workers
            .clone()
            .acquire_many_owned(self.worker_count as u32)
            .await
        {
            Ok(permits) => permits.forget(),
            Err(_) => warn!("worker pool already closed during shutdown"),
        }
        self.workers.close();
        debug!(workers = self.worker_count, "scheduler drained and stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::transport::{HttpResponse, Transport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Transport whose requests park until the gate opens.
    struct GatedTransport {
        gate: parking_lot::Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl GatedTransport {
        fn pair() -> (std::sync::mpsc::Sender<()>, Arc<dyn Transport>) {
            let (tx, rx) = std::sync::mpsc::channel();
            (
                tx,
                Arc::new(Self {
                    gate: parking_lot::Mutex::new(rx),
                }) as Arc<dyn Transport>,
            )
        }
    }

    impl Transport for GatedTransport {
        fn get(&self, _url: &str) -> Result<HttpResponse> {
            let _ = self.gate.lock().recv();
            Ok(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }
    }

    /// Transport that records how many requests overlap in time.
    struct CountingTransport {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Transport for CountingTransport {
        fn get(&self, _url: &str) -> Result<HttpResponse> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn duplicate_in_flight_ids_fail_without_executing() {
        let scheduler = Arc::new(Scheduler::new(2));
        let (gate, transport) = GatedTransport::pair();

        let first = {
            let scheduler = Arc::clone(&scheduler);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                scheduler
                    .submit(Task::fetch("api_request_a_b_d", "http://x", transport))
                    .await
            })
        };

        // Give the first submission time to reach the worker.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(scheduler.is_running("api_request_a_b_d"));

        let duplicate = scheduler
            .submit(Task::fetch("api_request_a_b_d", "http://x", transport))
            .await;
        assert!(!duplicate.success);
        assert!(duplicate.payload.contains("already running"));

        gate.send(()).unwrap();
        let outcome = first.await.unwrap();
        assert!(outcome.success);
        assert!(!scheduler.is_running("api_request_a_b_d"));
    }

    #[tokio::test]
    async fn completion_never_observes_own_id_running() {
        let scheduler = Scheduler::new(1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, "cached").unwrap();

        let outcome = scheduler.submit(Task::cache_read("read_artifact", &path)).await;
        assert!(outcome.success);
        // The continuation (this line) runs after the registry is cleared,
        // so a follow-up task with the same id is accepted.
        assert!(!scheduler.is_running("read_artifact"));
        let again = scheduler.submit(Task::cache_read("read_artifact", &path)).await;
        assert!(again.success);
    }

    #[tokio::test]
    async fn delayed_tasks_fire_once_and_never_early() {
        let scheduler = Scheduler::new(1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, "cached").unwrap();

        let delay = Duration::from_millis(80);
        let started = Instant::now();
        let outcome = scheduler
            .submit_delayed(Task::cache_read("delayed_read", &path), delay)
            .await;
        assert!(outcome.success);
        assert!(started.elapsed() >= delay);
    }

    /// Transport that panics mid-request.
    struct PanickingTransport;

    impl Transport for PanickingTransport {
        fn get(&self, _url: &str) -> Result<HttpResponse> {
            panic!("transport blew up");
        }
    }

    #[tokio::test]
    async fn panicking_worker_surfaces_as_internal_error() {
        let scheduler = Scheduler::new(1);
        let outcome = scheduler
            .submit(Task::fetch(
                "panicky_fetch",
                "http://x",
                Arc::new(PanickingTransport),
            ))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.payload, "internal error");
        // The id is released despite the panic.
        assert!(!scheduler.is_running("panicky_fetch"));
        let retry = scheduler
            .submit(Task::fetch(
                "panicky_fetch",
                "http://x",
                Arc::new(PanickingTransport),
            ))
            .await;
        assert_eq!(retry.payload, "internal error");
    }

    #[tokio::test]
    async fn worker_pool_size_bounds_parallelism() {
        let scheduler = Arc::new(Scheduler::new(2));
        let transport = Arc::new(CountingTransport {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let mut handles = Vec::new();
        for i in 0..6 {
            let scheduler = Arc::clone(&scheduler);
            let transport = Arc::clone(&transport) as Arc<dyn Transport>;
            handles.push(tokio::spawn(async move {
                scheduler
                    .submit(Task::fetch(format!("fetch_{i}"), "http://x", transport))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().success);
        }

        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn shutdown_refuses_new_work_and_is_idempotent() {
        let scheduler = Scheduler::new(2);
        scheduler.shutdown().await;
        scheduler.shutdown().await;

        let outcome = scheduler
            .submit(Task::cache_read("post_stop", "nowhere"))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.payload, STOPPED_MESSAGE);
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_delayed_tasks() {
        let scheduler = Arc::new(Scheduler::new(1));
        let pending = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move {
                scheduler
                    .submit_delayed(
                        Task::cache_read("never_fires", "nowhere"),
                        Duration::from_secs(60),
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.shutdown().await;

        let outcome = pending.await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.payload, STOPPED_MESSAGE);
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_work() {
        let scheduler = Arc::new(Scheduler::new(1));
        let (gate, transport) = GatedTransport::pair();

        let in_flight = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move {
                scheduler
                    .submit(Task::fetch("slow_fetch", "http://x", transport))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        let shutdown = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.shutdown().await })
        };
        // Shutdown must not finish while the worker is parked.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!shutdown.is_finished());

        gate.send(()).unwrap();
        let outcome = in_flight.await.unwrap();
        assert!(outcome.success);
        shutdown.await.unwrap();
    }
}
