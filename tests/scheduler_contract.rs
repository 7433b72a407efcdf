//! Scheduler contract checks through the public API: dedup, delayed
//! execution, and shutdown draining.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use route_scout::scheduler::{Scheduler, Task};
use route_scout::transport::{HttpResponse, Transport};

/// Counts executions and holds each request until the gate opens.
struct SlowTransport {
    executions: AtomicUsize,
    hold: Duration,
}

impl Transport for SlowTransport {
    fn get(&self, _url: &str) -> route_scout::Result<HttpResponse> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.hold);
        Ok(HttpResponse {
            status: 200,
            body: "{}".to_string(),
        })
    }
}

#[tokio::test]
async fn identical_ids_submitted_concurrently_execute_once() {
    let scheduler = Arc::new(Scheduler::new(4));
    let transport = Arc::new(SlowTransport {
        executions: AtomicUsize::new(0),
        hold: Duration::from_millis(100),
    });

    let mut handles = Vec::new();
    for _ in 0..5 {
        let scheduler = Arc::clone(&scheduler);
        let transport = Arc::clone(&transport) as Arc<dyn Transport>;
        handles.push(tokio::spawn(async move {
            scheduler
                .submit(Task::fetch("api_request_c213_c2_2025-06-01", "http://x", transport))
                .await
        }));
    }

    let outcomes: Vec<_> = {
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }
        outcomes
    };

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    let duplicates = outcomes
        .iter()
        .filter(|o| !o.success && o.payload.contains("already running"))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(duplicates, 4);
    assert_eq!(transport.executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn delayed_submission_respects_its_delay_and_dedup() {
    let scheduler = Scheduler::new(2);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifact");
    std::fs::write(&path, "content").unwrap();

    let delay = Duration::from_millis(60);
    let started = Instant::now();
    let outcome = scheduler
        .submit_delayed(Task::cache_read("delayed", &path), delay)
        .await;
    assert!(outcome.success);
    assert!(started.elapsed() >= delay);
    // Fired exactly once: the id is free again afterwards.
    assert!(!scheduler.is_running("delayed"));
}

#[tokio::test]
async fn shutdown_drains_workers_and_rejects_new_work() {
    let scheduler = Arc::new(Scheduler::new(2));
    let transport = Arc::new(SlowTransport {
        executions: AtomicUsize::new(0),
        hold: Duration::from_millis(80),
    });

    let in_flight = {
        let scheduler = Arc::clone(&scheduler);
        let transport = Arc::clone(&transport) as Arc<dyn Transport>;
        tokio::spawn(async move {
            scheduler
                .submit(Task::fetch("in_flight", "http://x", transport))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    scheduler.shutdown().await;

    // The in-flight task ran to completion rather than being aborted.
    assert!(in_flight.await.unwrap().success);
    assert_eq!(transport.executions.load(Ordering::SeqCst), 1);

    let rejected = scheduler.submit(Task::cache_read("late", "nowhere")).await;
    assert!(!rejected.success);

    // Second shutdown is a no-op.
    scheduler.shutdown().await;
}
