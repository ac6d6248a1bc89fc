//! Worker and pool tests driven by in-memory fetch and extract doubles

use std::sync::Arc;

use tokio::sync::mpsc;
use url::Url;

use super::*;
use crate::app::models::Category;
use crate::app::queue::CandidateQueue;
use crate::app::testing::{EchoExtractor, ScriptedFetcher};

fn url(seq: u32) -> Url {
    Url::parse(&format!(
        "https://notices.test/prop65/60-Day-Notice-2020-{:05}",
        seq
    ))
    .unwrap()
}

async fn run_pool(
    fetcher: ScriptedFetcher,
    urls: Vec<Url>,
    config: WorkerConfig,
) -> (Vec<WorkerEvent>, WorkerStats, Arc<ScriptedFetcher>, CandidateQueue) {
    let fetcher = Arc::new(fetcher);
    let queue = CandidateQueue::new();
    queue.add_bulk(urls).await;

    let mut pool = WorkerPool::new(config, queue.clone(), Arc::clone(&fetcher), Arc::new(EchoExtractor));
    let (tx, mut rx) = mpsc::channel(256);
    pool.start(tx).await.unwrap();
    let totals = pool.wait().await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (events, totals, fetcher, queue)
}

fn terminal(events: &[WorkerEvent]) -> Vec<&WorkerEvent> {
    events.iter().filter(|e| e.is_terminal()).collect()
}

/// A candidate that never succeeds is attempted exactly max_retries times
/// and reported failed once
#[tokio::test]
async fn test_persistent_failure_exhausts_attempts() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always_fail(url(1).as_str());

    let (events, totals, fetcher, queue) =
        run_pool(fetcher, vec![url(1)], WorkerConfig::for_testing()).await;

    assert_eq!(fetcher.calls(url(1).as_str()), 3);
    let terminal = terminal(&events);
    assert_eq!(terminal.len(), 1);
    assert!(matches!(
        terminal[0],
        WorkerEvent::Failed { attempts: 3, .. }
    ));
    assert_eq!(totals.failed, 1);
    assert_eq!(totals.retries, 2);
    assert_eq!(queue.stats().await.failed, 1);
}

/// Absent pages are closed immediately without retrying
#[tokio::test]
async fn test_absent_page_is_not_retried() {
    let (events, totals, fetcher, _) =
        run_pool(ScriptedFetcher::new(), vec![url(7)], WorkerConfig::for_testing()).await;

    assert_eq!(fetcher.calls(url(7).as_str()), 1);
    assert!(matches!(terminal(&events)[0], WorkerEvent::Absent { .. }));
    assert_eq!(totals.absent, 1);
    assert_eq!(totals.failed, 0);
}

/// Transient failures followed by success produce a record
#[tokio::test]
async fn test_recovers_after_transient_failures() {
    let fetcher = ScriptedFetcher::new();
    fetcher.fail_then_page(url(2).as_str(), 2, "2020-00002");

    let (events, totals, _, _) =
        run_pool(fetcher, vec![url(2)], WorkerConfig::for_testing()).await;

    match terminal(&events)[0] {
        WorkerEvent::Harvested {
            record, attempts, ..
        } => {
            assert_eq!(*attempts, 3);
            assert_eq!(record.link(), url(2).as_str());
            assert_eq!(record.field(Category::Main, "AG Number"), Some("2020-00002"));
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(totals.harvested, 1);
    let retries = events
        .iter()
        .filter(|e| matches!(e, WorkerEvent::Retrying { .. }))
        .count();
    assert_eq!(retries, 2);
}

/// Extraction failures count against the attempt budget
#[tokio::test]
async fn test_extraction_failure_is_retried() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(url(3).as_str(), "garbage");

    let (_, totals, fetcher, _) =
        run_pool(fetcher, vec![url(3)], WorkerConfig::for_testing()).await;

    assert_eq!(fetcher.calls(url(3).as_str()), 3);
    assert_eq!(totals.failed, 1);
}

/// Every candidate gets exactly one terminal event
#[tokio::test]
async fn test_each_candidate_reported_once() {
    let fetcher = ScriptedFetcher::new();
    for seq in 1..=20 {
        fetcher.page(url(seq).as_str(), &format!("2020-{:05}", seq));
    }
    let urls: Vec<Url> = (1..=25).map(url).collect();

    let (events, totals, _, queue) = run_pool(fetcher, urls, WorkerConfig::for_testing()).await;

    assert_eq!(terminal(&events).len(), 25);
    assert_eq!(totals.harvested, 20);
    assert_eq!(totals.absent, 5);
    assert!(queue.is_finished().await);
}

/// Never more workers than candidates
#[tokio::test]
async fn test_worker_count_capped_by_queue_length() {
    let queue = CandidateQueue::new();
    queue.add_bulk(vec![url(1), url(2)]).await;
    let mut pool = WorkerPool::new(
        WorkerConfig::for_testing(),
        queue,
        Arc::new(ScriptedFetcher::new()),
        Arc::new(EchoExtractor),
    );
    let (tx, _rx) = mpsc::channel(16);

    assert_eq!(pool.start(tx).await.unwrap(), 2);
    pool.wait().await;
    assert_eq!(pool.state(), PoolState::Stopped);
}

/// An empty queue starts no workers and closes the event channel
#[tokio::test]
async fn test_empty_queue_starts_nothing() {
    let mut pool = WorkerPool::new(
        WorkerConfig::for_testing(),
        CandidateQueue::new(),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(EchoExtractor),
    );
    let (tx, mut rx) = mpsc::channel(16);

    assert_eq!(pool.start(tx).await.unwrap(), 0);
    assert!(rx.recv().await.is_none());
}

/// Shutdown requested before workers run leaves the queue untouched
#[tokio::test]
async fn test_shutdown_stops_claiming() {
    let queue = CandidateQueue::new();
    queue.add_bulk((1..=10).map(url)).await;
    let mut pool = WorkerPool::new(
        WorkerConfig::for_testing(),
        queue.clone(),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(EchoExtractor),
    );
    let (tx, _rx) = mpsc::channel(16);

    pool.start(tx).await.unwrap();
    pool.request_shutdown();
    let totals = pool.wait().await;

    assert_eq!(totals.processed(), 0);
    assert_eq!(queue.stats().await.pending, 10);
}

#[tokio::test]
async fn test_pool_cannot_start_twice() {
    let mut pool = WorkerPool::new(
        WorkerConfig::for_testing(),
        CandidateQueue::new(),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(EchoExtractor),
    );
    let (tx, _rx) = mpsc::channel(16);
    pool.start(tx.clone()).await.unwrap();
    assert!(pool.start(tx).await.is_err());
}
