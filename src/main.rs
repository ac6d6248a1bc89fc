//! Notice Harvester CLI application
//!
//! Command-line interface for harvesting 60-day notice pages into a
//! spreadsheet and reporting what changed since the previous run.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use notice_harvester::cli::{handle_config, handle_discover, handle_harvest, Cli, Commands};
use notice_harvester::config::AppConfig;
use notice_harvester::constants::logging::DEFAULT_LOG_LEVEL;
use notice_harvester::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let level = match cli.log_level() {
        Some(level) => level.to_string().to_lowercase(),
        // Load problems surface again, with logging, inside the command handler
        None => AppConfig::load(cli.global.config.clone())
            .await
            .map(|config| config.logging.level)
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
    };
    init_logging(&cli, &level);

    info!("Notice Harvester v{} starting", env!("CARGO_PKG_VERSION"));

    let global = cli.global.clone();
    match cli.command {
        Commands::Harvest(args) => {
            debug!("Executing harvest command");
            handle_harvest(args, &global).await
        }
        Commands::Discover(args) => {
            debug!("Executing discover command");
            handle_discover(args, &global).await
        }
        Commands::Config(args) => handle_config(args, &global).await,
    }
}

/// Initialize logging from CLI verbosity or the configured level
fn init_logging(cli: &Cli, level: &str) {
    let mut filter = EnvFilter::from_default_env();
    match format!("notice_harvester={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log directive: {}", e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    }
}
