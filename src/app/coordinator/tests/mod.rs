//! Unit tests for the coordinator
//!
//! Runs are driven by the in-memory fetch and extract doubles; end-to-end runs
//! over HTTP live in the top-level tests directory.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use url::Url;

use super::*;
use crate::app::models::{NoticeId, RecordStatus};
use crate::app::snapshot::Snapshot;
use crate::app::testing::{EchoExtractor, ScriptedFetcher};
use crate::errors::{AppError, ConfigError, FetchResult, HarvestError};

const BASE: &str = "https://notices.test/prop65";

fn url(seq: u32) -> String {
    NoticeId::new(2020, seq).url(BASE)
}

fn test_config(dir: &TempDir) -> CoordinatorConfig {
    CoordinatorConfig::for_testing(dir.path()).with_base_url(BASE)
}

fn coordinator(
    fetcher: ScriptedFetcher,
    dir: &TempDir,
) -> Coordinator<ScriptedFetcher, EchoExtractor> {
    Coordinator::new(test_config(dir), Arc::new(fetcher), Arc::new(EchoExtractor))
}

fn write_snapshot(dir: &TempDir, rows: &[(String, &str)]) -> std::path::PathBuf {
    let path = dir.path().join("snapshot.csv");
    let mut contents = String::from("link,AG Number\n");
    for (link, ag) in rows {
        contents.push_str(&format!("{},{}\n", link, ag));
    }
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_harvest_collects_records_and_absences() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(&url(1), "2020-00001");
    fetcher.page(&url(2), "2020-00002");
    let dir = TempDir::new().unwrap();

    let outcome = coordinator(fetcher, &dir)
        .harvest(vec![url(1), url(2), url(3), "not a url".to_string()])
        .await
        .unwrap();

    assert_eq!(outcome.batch.records.len(), 2);
    assert_eq!(outcome.batch.absent, vec![url(3)]);
    assert!(outcome.batch.failures.is_empty());
    assert!(!outcome.interrupted);
    assert_eq!(outcome.not_attempted, 0);
}

#[tokio::test]
async fn test_fixed_range_against_snapshot() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(&url(1), "2020-00001");
    fetcher.page(&url(2), "2020-00002-corrected");
    fetcher.page(&url(3), "2020-00003");
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        &dir,
        &[(url(1), "2020-00001"), (url(2), "2020-00002")],
    );
    let bounds = PartitionBounds::new().with_partition(2020, 1, 3);

    let coordinator = coordinator(fetcher, &dir);
    let report = coordinator
        .run_mode(
            RunMode::RangeGenerated {
                start: 2020,
                end: 2020,
            },
            Some(snapshot.as_path()),
            &bounds,
        )
        .await
        .unwrap();

    assert_eq!(report.candidates, 3);
    assert_eq!(report.harvested, 3);
    assert_eq!(report.written, 2);
    let changes = report.changes.unwrap();
    assert_eq!((changes.new, changes.updated, changes.unchanged), (1, 1, 1));

    let output = Snapshot::load(report.output_path.as_deref().unwrap()).unwrap();
    assert_eq!(output.len(), 2);
    assert_eq!(output.value(&url(2), "Status"), RecordStatus::Updated.to_string());
    assert_eq!(output.value(&url(3), "Status"), RecordStatus::New.to_string());
    assert!(!output.contains(&url(1)));
}

#[tokio::test]
async fn test_unchanged_run_writes_nothing() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(&url(1), "2020-00001");
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir, &[(url(1), "2020-00001")]);

    let request = RunRequest {
        compare: Some(snapshot),
        auto_discover: false,
        ..Default::default()
    };
    let report = coordinator(fetcher, &dir)
        .run(&request, &PartitionBounds::new())
        .await
        .unwrap();

    assert_eq!(report.mode, "snapshot-driven");
    assert_eq!(report.written, 0);
    assert!(report.output_path.is_none());
    assert!(!test_config(&dir).output_path.exists());
}

#[tokio::test]
async fn test_bad_snapshot_fails_before_fetching() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(
        test_config(&dir),
        Arc::clone(&fetcher),
        Arc::new(EchoExtractor),
    );

    let request = RunRequest {
        years: Some((2020, 2020)),
        compare: Some(dir.path().join("missing.csv")),
        ..Default::default()
    };
    let result = coordinator.run(&request, &PartitionBounds::defaults()).await;

    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::NotFound { .. }))
    ));
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test]
async fn test_failures_are_logged_to_file() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(&url(1), "2020-00001");
    fetcher.always_fail(&url(2));
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("urls.tsv");
    std::fs::write(&list, format!("URL\n{}\n{}\n", url(1), url(2))).unwrap();

    let request = RunRequest {
        input: Some(list),
        ..Default::default()
    };
    let report = coordinator(fetcher, &dir)
        .run(&request, &PartitionBounds::new())
        .await
        .unwrap();

    assert_eq!(report.mode, "explicit-list");
    assert_eq!(report.harvested, 1);
    assert_eq!(report.failed, 1);
    assert!(report.changes.is_none());
    let log = std::fs::read_to_string(report.failure_log.unwrap()).unwrap();
    assert_eq!(log.trim(), url(2));
}

#[tokio::test]
async fn test_unsupported_output_format_fails_before_fetching() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.page(&url(1), "2020-00001");
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir).with_output_path(dir.path().join("notices.json"));
    let coordinator = Coordinator::new(config, Arc::clone(&fetcher), Arc::new(EchoExtractor));

    let bounds = PartitionBounds::new().with_partition(2020, 1, 2);
    let result = coordinator
        .run_mode(
            RunMode::RangeGenerated {
                start: 2020,
                end: 2020,
            },
            None,
            &bounds,
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::Harvest(HarvestError::Configuration(_)))
    ));
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test]
async fn test_unwritable_output_keeps_failure_log() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(&url(1), "2020-00001");
    fetcher.always_fail(&url(2));
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file where a directory should be").unwrap();
    let config = test_config(&dir).with_output_path(blocker.join("notices.csv"));
    let coordinator = Coordinator::new(config, Arc::new(fetcher), Arc::new(EchoExtractor));

    let bounds = PartitionBounds::new().with_partition(2020, 1, 2);
    let report = coordinator
        .run_mode(
            RunMode::RangeGenerated {
                start: 2020,
                end: 2020,
            },
            None,
            &bounds,
        )
        .await
        .unwrap();

    assert_eq!(report.harvested, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.written, 0);
    assert!(report.output_path.is_none());
    assert_eq!(report.write_errors.len(), 1);
    assert!(!report.is_clean());

    let log = std::fs::read_to_string(report.failure_log.unwrap()).unwrap();
    assert_eq!(log.trim(), url(2));
}

#[tokio::test]
async fn test_workbook_output() {
    let fetcher = ScriptedFetcher::new();
    fetcher.page(&url(1), "2020-00001");
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir).with_output_path(dir.path().join("notices.xlsx"));
    let coordinator = Coordinator::new(config, Arc::new(fetcher), Arc::new(EchoExtractor));

    let bounds = PartitionBounds::new().with_partition(2020, 1, 1);
    let report = coordinator
        .run_mode(
            RunMode::RangeGenerated {
                start: 2020,
                end: 2020,
            },
            None,
            &bounds,
        )
        .await
        .unwrap();

    assert_eq!(report.written, 1);
    let output = Snapshot::load(report.output_path.as_deref().unwrap()).unwrap();
    assert!(output.contains(&url(1)));
}

/// Fetcher that takes a while per page
struct SlowFetcher;

impl Fetcher for SlowFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        tokio::time::sleep(Duration::from_millis(40)).await;
        Ok(url.path().to_string())
    }
}

#[tokio::test]
async fn test_shutdown_keeps_collected_records() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir).with_worker_count(2);
    let coordinator = Coordinator::new(config, Arc::new(SlowFetcher), Arc::new(EchoExtractor));
    let signal = coordinator.shutdown_signal();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.trigger();
    });

    let urls: Vec<String> = (1..=30).map(url).collect();
    let outcome = coordinator.harvest(urls).await.unwrap();

    assert!(outcome.interrupted);
    assert!(!outcome.batch.records.is_empty());
    assert!(outcome.not_attempted > 0);
    assert_eq!(outcome.batch.processed() + outcome.not_attempted, 30);
}
