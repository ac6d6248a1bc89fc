//! Command-line argument parsing for Notice Harvester
//!
//! This module defines the CLI structure using clap derive macros: the
//! harvest run itself, single-partition frontier discovery, and
//! configuration file management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::{RunRequest, UrlColumn};

/// Notice Harvester - Collect 60-day notices into a spreadsheet
#[derive(Parser, Debug)]
#[command(
    name = "notice_harvester",
    version,
    about = "Harvest 60-day notice pages into tabular records",
    long_about = "Discovers the newest notice of each year, fetches notice pages concurrently under a rate limit,
flattens them into one row per notice and reports what changed since a previous snapshot."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest notices and write the results
    Harvest(HarvestArgs),

    /// Find the highest existing notice of one year
    Discover(DiscoverArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the harvest command
#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Inclusive year range to harvest
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub years: Option<Vec<u16>>,

    /// Previous output to reconcile against
    #[arg(long, value_name = "FILE")]
    pub compare: Option<PathBuf>,

    /// CSV, TSV or Excel file listing the URLs to harvest
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Column of the input file holding the URLs, by index or header name
    #[arg(long, value_name = "COLUMN", default_value = "0")]
    pub input_column: UrlColumn,

    /// Number of concurrent fetch workers [default: configured count, 5]
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Use the configured end ids instead of probing for newer notices
    #[arg(long)]
    pub no_auto_discover: bool,

    /// Output file (.csv, .tsv or .xlsx)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the discover command
#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Year whose numbering is probed
    #[arg(long)]
    pub year: u16,

    /// First id to probe; defaults to one past the configured end id
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub start: Option<u32>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Target path; defaults to the user config directory
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// `None` means the configured default applies.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl HarvestArgs {
    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == Some(0) {
            return Err("Number of threads must be greater than 0".to_string());
        }

        if let Some((start, end)) = self.year_range() {
            if start > end {
                return Err(format!("Start year {} is after end year {}", start, end));
            }
        }

        Ok(())
    }

    /// `--years START END` as a tuple
    pub fn year_range(&self) -> Option<(u16, u16)> {
        match self.years.as_deref() {
            Some(&[start, end]) => Some((start, end)),
            _ => None,
        }
    }

    /// Run request described by these arguments
    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            years: self.year_range(),
            compare: self.compare.clone(),
            input: self.input.clone(),
            input_column: self.input_column.clone(),
            auto_discover: !self.no_auto_discover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn harvest_args(cli: Cli) -> HarvestArgs {
        match cli.command {
            Commands::Harvest(args) => args,
            other => panic!("expected harvest, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_harvest_defaults() {
        let args = harvest_args(parse(&["notice_harvester", "harvest"]));

        assert!(args.threads.is_none());
        assert!(args.validate().is_ok());
        let request = args.run_request();
        assert!(request.years.is_none());
        assert!(request.auto_discover);
        assert_eq!(request.input_column, UrlColumn::Index(0));
    }

    #[test]
    fn test_input_column_by_index_or_name() {
        let by_name = harvest_args(parse(&[
            "notice_harvester",
            "harvest",
            "--input",
            "urls.xlsx",
            "--input-column",
            "Link",
        ]));
        assert_eq!(
            by_name.run_request().input_column,
            UrlColumn::Name("Link".to_string())
        );

        let by_index = harvest_args(parse(&["notice_harvester", "harvest", "--input-column", "3"]));
        assert_eq!(by_index.input_column, UrlColumn::Index(3));
    }

    #[test]
    fn test_harvest_year_range_and_flags() {
        let args = harvest_args(parse(&[
            "notice_harvester",
            "harvest",
            "--years",
            "2020",
            "2021",
            "--no-auto-discover",
            "--compare",
            "prev.csv",
            "--threads",
            "8",
        ]));

        let request = args.run_request();
        assert_eq!(request.years, Some((2020, 2021)));
        assert_eq!(request.compare, Some(PathBuf::from("prev.csv")));
        assert!(!request.auto_discover);
        assert_eq!(args.threads, Some(8));
    }

    #[test]
    fn test_harvest_validation() {
        let mut args = harvest_args(parse(&["notice_harvester", "harvest", "--years", "2022", "2020"]));
        assert!(args.validate().is_err());

        args.years = None;
        args.threads = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_years_needs_two_values() {
        assert!(Cli::try_parse_from(["notice_harvester", "harvest", "--years", "2020"]).is_err());
    }

    #[test]
    fn test_discover_and_config_commands() {
        match parse(&["notice_harvester", "discover", "--year", "2024", "--start", "5000"]).command {
            Commands::Discover(args) => {
                assert_eq!(args.year, 2024);
                assert_eq!(args.start, Some(5000));
            }
            other => panic!("expected discover, got {:?}", other),
        }

        match parse(&["notice_harvester", "config", "init", "--force"]).command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Init { path, force },
            }) => {
                assert!(path.is_none());
                assert!(force);
            }
            other => panic!("expected config init, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_start_must_be_positive() {
        assert!(
            Cli::try_parse_from(["notice_harvester", "discover", "--year", "2024", "--start", "0"])
                .is_err()
        );
    }

    #[test]
    fn test_log_level() {
        let quiet = parse(&["notice_harvester", "-q", "config", "show"]);
        let verbose = parse(&["notice_harvester", "config", "show", "--very-verbose"]);
        let default = parse(&["notice_harvester", "config", "show"]);

        assert_eq!(quiet.log_level(), Some(tracing::Level::ERROR));
        assert_eq!(verbose.log_level(), Some(tracing::Level::DEBUG));
        assert_eq!(default.log_level(), None);
    }
}
