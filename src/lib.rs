//! Notice Harvester Library
//!
//! A Rust library for harvesting 60-day notices from a public enforcement
//! registry. Discovers how far each year's notice numbering reaches, fetches
//! notice pages concurrently under a rate limit, flattens them into tabular
//! records and reports what changed since a previous snapshot.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
