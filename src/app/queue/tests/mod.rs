//! Unit tests for the candidate queue

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use super::*;

fn url(seq: u32) -> Url {
    Url::parse(&format!(
        "https://notices.test/prop65/60-Day-Notice-2020-{:05}",
        seq
    ))
    .unwrap()
}

/// Candidates come out in the order they were added
#[tokio::test]
async fn test_fifo_order() {
    let queue = CandidateQueue::new();
    queue.add_bulk((1..=3).map(url)).await;

    let order: Vec<Url> = [
        queue.next_candidate(1).await.unwrap(),
        queue.next_candidate(1).await.unwrap(),
        queue.next_candidate(1).await.unwrap(),
    ]
    .into_iter()
    .map(|c| c.url().clone())
    .collect();

    assert_eq!(order, vec![url(1), url(2), url(3)]);
    assert!(queue.next_candidate(1).await.is_none());
}

/// A claimed candidate keeps its key and records the claiming worker
#[test]
fn test_candidate_claim() {
    let mut candidate = Candidate::new(url(7));
    let pending = candidate.clone();
    candidate.mark_in_progress(3);

    assert_eq!(candidate.key(), url(7).as_str());
    assert!(pending.status.is_pending());
    assert!(matches!(
        candidate.status,
        CandidateStatus::InProgress { worker_id: 3, .. }
    ));
    assert_ne!(candidate, pending);
}

/// The same URL is only queued once
#[tokio::test]
async fn test_duplicates_are_skipped() {
    let queue = CandidateQueue::new();
    assert!(queue.add_candidate(url(1)).await);
    assert!(!queue.add_candidate(url(1)).await);
    assert_eq!(queue.add_bulk(vec![url(1), url(2), url(2)]).await, 1);

    let stats = queue.stats().await;
    assert_eq!(stats.total_added, 2);
    assert_eq!(stats.duplicates, 3);
    assert_eq!(stats.pending, 2);
}

/// Terminal marks update counters and finish the queue
#[tokio::test]
async fn test_outcomes_update_stats() {
    let queue = CandidateQueue::new();
    queue.add_bulk((1..=3).map(url)).await;

    let a = queue.next_candidate(1).await.unwrap();
    let b = queue.next_candidate(2).await.unwrap();
    assert!(!queue.is_finished().await);
    let c = queue.next_candidate(3).await.unwrap();

    queue.mark_harvested(a.url(), 2).await.unwrap();
    queue.mark_absent(b.url(), 1).await.unwrap();
    queue.mark_failed(c.url(), 3, "HTTP 500").await.unwrap();

    let stats = queue.stats().await;
    assert_eq!(stats.harvested, 1);
    assert_eq!(stats.absent, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.retries, 3);
    assert_eq!(stats.processed(), 3);
    assert!(stats.is_finished());

    let failed = queue.candidate(c.url()).await.unwrap();
    assert_eq!(failed.last_error.as_deref(), Some("HTTP 500"));
    assert_eq!(failed.attempts, 3);
}

#[tokio::test]
async fn test_unknown_candidate_is_an_error() {
    let queue = CandidateQueue::new();
    assert!(queue.mark_harvested(&url(9), 1).await.is_err());
}

/// Concurrent claimers never receive the same candidate
#[tokio::test]
async fn test_concurrent_claims_are_exclusive() {
    let queue = Arc::new(CandidateQueue::new());
    queue.add_bulk((1..=200).map(url)).await;

    let mut handles = Vec::new();
    for worker_id in 0..8 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            let mut claimed = Vec::new();
            while let Some(candidate) = queue.next_candidate(worker_id).await {
                claimed.push(candidate.url().to_string());
                tokio::task::yield_now().await;
            }
            claimed
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for claimed in handle.await.unwrap() {
            assert!(seen.insert(claimed), "candidate claimed twice");
        }
    }
    assert_eq!(seen.len(), 200);
}
