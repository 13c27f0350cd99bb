//! The dispatcher never runs two downloads at once, even while jobs arrive concurrently.

mod common;

use common::fake_tool;
use common::{wait_until, within, Harness};
use fetchq_core::control::Control;
use fetchq_core::dispatcher::Dispatcher;
use fetchq_core::job::{JobStatus, Quality};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enqueues_never_overlap_downloads() {
    const JOBS: usize = 24;
    let h = Harness::new(fake_tool::QUICK_SUCCESS);
    let control = Arc::new(Control::new(Arc::clone(&h.registry)));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&h.registry),
        Arc::clone(&h.executor),
        &h.cfg,
    ));
    let shutdown = CancellationToken::new();
    let worker = {
        let dispatcher = Arc::clone(&dispatcher);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    let submitters: Vec<_> = (0..JOBS)
        .map(|i| {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis((i % 5) as u64 * 15)).await;
                control
                    .enqueue(&format!("https://www.youtube.com/watch?v=JOB{i:08}"), "best")
                    .unwrap()
            })
        })
        .collect();

    let max_seen = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&max_seen);
    let registry = Arc::clone(&h.registry);
    let sampler = tokio::spawn(async move {
        loop {
            let downloading = registry
                .list()
                .iter()
                .filter(|j| j.status == JobStatus::Downloading)
                .count();
            seen.fetch_max(downloading, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    });

    let mut ids = Vec::with_capacity(JOBS);
    for submitter in submitters {
        ids.push(within(submitter).await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), JOBS, "ids must be unique");

    let registry = Arc::clone(&h.registry);
    wait_until("all jobs to complete", || {
        let jobs = registry.list();
        jobs.len() == JOBS && jobs.iter().all(|j| j.status == JobStatus::Completed)
    })
    .await;

    sampler.abort();
    shutdown.cancel();
    within(worker).await.unwrap();

    assert!(max_seen.load(Ordering::SeqCst) <= 1);
    // One tool run per job: an overlap would have failed an attempt and
    // forced a second identity.
    let dl_runs = h
        .invocations()
        .iter()
        .filter(|l| l.starts_with("dl:"))
        .count();
    assert_eq!(dl_runs, JOBS);
    for id in ids {
        let job = h.registry.view(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.last_error.is_none());
        assert!(job.output_filename.is_some());
    }
    assert!(!h.download_path(".busy").exists());
}

#[tokio::test]
async fn enqueue_wakes_an_idle_dispatcher() {
    let mut h = Harness::new(fake_tool::QUICK_SUCCESS);
    h.cfg.idle_poll_ms = 60_000;
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&h.registry),
        Arc::clone(&h.executor),
        &h.cfg,
    ));
    let shutdown = CancellationToken::new();
    let worker = {
        let dispatcher = Arc::clone(&dispatcher);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let id = h.registry.enqueue(common::TARGET.into(), Quality::Best);
    let registry = Arc::clone(&h.registry);
    wait_until("woken dispatcher to finish the job", || {
        registry.status(id) == Some(JobStatus::Completed)
    })
    .await;

    shutdown.cancel();
    within(worker).await.unwrap();
}
