//! Command handlers for Notice Harvester CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! with the configuration file and the core harvesting pipeline.

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::coordinator::progress::format_hms;
use crate::app::{
    Coordinator, FrontierDiscoverer, HttpFetcher, NoticePageExtractor, PartitionBounds, RunReport,
};
use crate::cli::{
    ConfigAction, ConfigArgs, DiscoverArgs, GlobalArgs, HarvestArgs, ProgressConfig,
    ProgressDisplay,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the harvest command
///
/// Loads the configuration, applies command line overrides and runs the
/// coordinator for the selected mode.
pub async fn handle_harvest(args: HarvestArgs, global: &GlobalArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let config = AppConfig::load(global.config.clone()).await?;
    let mut coordinator_config = config.coordinator_config();
    if let Some(threads) = args.threads {
        coordinator_config = coordinator_config.with_worker_count(threads);
    }
    if let Some(output) = &args.output {
        coordinator_config = coordinator_config.with_output_path(output.clone());
    }
    info!(
        "Harvesting with {} workers at {} requests/s",
        coordinator_config.worker.worker_count, config.client.rate_limit_rps
    );

    let fetcher = Arc::new(HttpFetcher::new(&config.client)?);
    let extractor = Arc::new(NoticePageExtractor::new()?);
    let mut coordinator = Coordinator::new(coordinator_config, fetcher, extractor);
    if !args.no_progress && !global.quiet {
        coordinator = coordinator.with_observer(Arc::new(ProgressDisplay::new(
            ProgressConfig {
                text_interval: config.run.progress_interval,
                ..Default::default()
            },
        )));
    }

    let report = coordinator
        .run(&args.run_request(), &config.partition_bounds())
        .await?;

    if let Some(path) = &args.summary_json {
        report.write_json(path)?;
        info!("Run summary written to {}", path.display());
    }
    if !global.quiet {
        print_report(&report);
    }
    if !report.write_errors.is_empty() {
        return Err(AppError::generic(format!(
            "Harvest finished but could not write: {}",
            report.write_errors.join("; ")
        )));
    }
    if !report.is_clean() {
        warn!(
            "Run finished with {} failures{}",
            report.failed,
            if report.interrupted { " after interruption" } else { "" }
        );
    }
    Ok(())
}

/// Print a human readable run summary
fn print_report(report: &RunReport) {
    println!("\nHarvest summary ({})", report.mode);
    println!("   Candidates: {}", report.candidates);
    println!("   Harvested:  {}", report.harvested);
    println!("   Absent:     {}", report.absent);
    println!("   Failed:     {}", report.failed);
    if let Some(changes) = &report.changes {
        println!(
            "   Changes:    {} new, {} updated, {} unchanged",
            changes.new, changes.updated, changes.unchanged
        );
    }
    match &report.output_path {
        Some(path) => println!("   Written:    {} rows to {}", report.written, path.display()),
        None => println!("   Written:    nothing"),
    }
    if let Some(log) = &report.failure_log {
        println!("   Failed URLs listed in {}", log.display());
    }
    for problem in &report.write_errors {
        println!("   Not written: {}", problem);
    }
    if report.interrupted {
        println!(
            "   Interrupted: {} candidates were not attempted",
            report.not_attempted
        );
    }
    println!("   Duration:   {}", format_hms(report.duration));
}

/// Handle the discover command
pub async fn handle_discover(args: DiscoverArgs, global: &GlobalArgs) -> Result<()> {
    let config = AppConfig::load(global.config.clone()).await?;
    let bounds = config.partition_bounds();
    let start = args
        .start
        .unwrap_or_else(|| default_probe_start(&bounds, args.year));

    let fetcher = Arc::new(HttpFetcher::new(&config.client)?);
    let discoverer =
        FrontierDiscoverer::new(fetcher, config.client.base_url.clone(), config.discovery.clone());
    let frontier = discoverer.discover(args.year, start).await;

    if frontier.found_any() {
        println!(
            "{}: highest notice is {} ({} ids probed from {})",
            frontier.year, frontier.highest_valid, frontier.probed, frontier.start
        );
    } else {
        println!(
            "{}: no notices found from {} ({} ids probed)",
            frontier.year, frontier.start, frontier.probed
        );
    }
    Ok(())
}

/// First id to probe when none is given: one past the known end
fn default_probe_start(bounds: &PartitionBounds, year: u16) -> u32 {
    bounds
        .end_id(year)
        .map(|end| end.saturating_add(1))
        .unwrap_or_else(|| bounds.start_id(year))
}

/// Handle configuration management commands
pub async fn handle_config(args: ConfigArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let target = path
                .or_else(AppConfig::default_config_path)
                .ok_or_else(|| AppError::generic("No user config directory on this platform"))?;
            let written = AppConfig::write_default(&target, force).await?;
            println!("Configuration written to {}", written.display());
        }
        ConfigAction::Show => {
            let config = AppConfig::load(global.config.clone()).await?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_probe_start() {
        let bounds = PartitionBounds::new().with_partition(2024, 1, 5403);
        assert_eq!(default_probe_start(&bounds, 2024), 5404);
        assert_eq!(default_probe_start(&bounds, 2030), 1);
    }

    #[tokio::test]
    async fn test_config_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notice_harvester.toml");

        let args = ConfigArgs {
            action: ConfigAction::Init {
                path: Some(path.clone()),
                force: false,
            },
        };
        handle_config(args, &GlobalArgs::default()).await.unwrap();

        let global = GlobalArgs {
            config: Some(path),
            ..Default::default()
        };
        let show = ConfigArgs {
            action: ConfigAction::Show,
        };
        assert!(handle_config(show, &global).await.is_ok());
    }

    #[tokio::test]
    async fn test_harvest_rejects_bad_arguments_before_loading() {
        let args = HarvestArgs {
            years: None,
            compare: None,
            input: None,
            input_column: Default::default(),
            threads: Some(0),
            no_auto_discover: false,
            output: None,
            summary_json: None,
            no_progress: true,
        };
        let global = GlobalArgs {
            config: Some("does-not-exist.toml".into()),
            ..Default::default()
        };

        let result = handle_harvest(args, &global).await;
        assert!(matches!(result, Err(AppError::Generic { .. })));
    }
}
