//! Command-line interface components
//!
//! This module contains CLI-specific code for the Notice Harvester
//! application: argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DiscoverArgs, GlobalArgs, HarvestArgs,
};
pub use commands::{handle_config, handle_discover, handle_harvest};
pub use progress::{ProgressConfig, ProgressDisplay};
