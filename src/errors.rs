//! Error types for Notice Harvester
//!
//! Each concern of the pipeline gets its own error enum. Candidate-level errors
//! ([`FetchError`], [`ExtractionError`]) are recorded and retried by workers and
//! never abort a run; configuration and output errors are fatal and surface
//! through [`AppError`].

use std::path::PathBuf;
use thiserror::Error;

/// Failure to retrieve a page from the origin
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout, connection failure, rate limiting or server error; worth retrying
    #[error("Transient fetch failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    /// The origin reported that the resource does not exist (404/410)
    #[error("Resource does not exist: {url} (HTTP {status})")]
    Absent { url: String, status: u16 },
}

impl FetchError {
    /// Create a transient error for a url
    pub fn transient(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// True when the resource was reported missing
    pub fn is_absent(&self) -> bool {
        matches!(self, FetchError::Absent { .. })
    }

    /// True when a later attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }
}

/// Failure to turn a fetched page into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Page parsed but carries none of the expected notice structure
    #[error("Page at {link} contains no notice content")]
    NoContent { link: String },

    /// CSS selector failed to compile
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    /// A record cannot exist without its source identifier
    #[error("Record link must not be empty")]
    EmptyLink,

    /// The blocking extraction task did not complete
    #[error("Extraction task for {link} aborted: {reason}")]
    Aborted { link: String, reason: String },
}

/// Configuration and input errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration or input file not found
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Input file has an extension this tool cannot read or write
    #[error("Unsupported file format for {path}: expected {expected}")]
    UnsupportedFormat {
        path: PathBuf,
        expected: &'static str,
    },

    /// Input file exists but could not be read or parsed
    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Snapshot has no column holding notice links
    #[error("No link column found in {path}")]
    MissingLinkColumn { path: PathBuf },

    /// Named column does not appear in the header row
    #[error("Column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// URL list yielded nothing to harvest
    #[error("No URLs found in {path}")]
    NoUrls { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error")]
    Io(#[from] std::io::Error),
}

/// Errors writing harvested data or the failure log
#[derive(Error, Debug)]
pub enum OutputError {
    /// I/O error during file operations
    #[error("Output I/O error")]
    Io(#[from] std::io::Error),

    /// Tabular encoding failed
    #[error("Tabular write failed")]
    Csv(#[from] csv::Error),

    /// Summary serialization failed
    #[error("Summary serialization failed")]
    Json(#[from] serde_json::Error),

    /// Workbook encoding failed
    #[error("Workbook write failed")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Output path has no writable tabular format
    #[error("Unsupported output format for {path}: expected .csv, .tsv or .xlsx")]
    UnsupportedFormat { path: PathBuf },

    /// More rows or columns than a worksheet holds
    #[error("{rows} rows by {columns} columns do not fit in one worksheet")]
    SheetLimit { rows: usize, columns: usize },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Errors in the harvesting machinery itself (not in individual candidates)
#[derive(Error, Debug)]
pub enum HarvestError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    HttpClient(#[from] reqwest::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Worker panic or unexpected termination
    #[error("Worker {worker_id} panicked or terminated unexpectedly")]
    WorkerPanic { worker_id: usize },

    /// Background task could not be joined
    #[error("Background task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    /// Coordinator shutdown timeout
    #[error("Shutdown timeout after {seconds} seconds")]
    ShutdownTimeout { seconds: u64 },

    /// Candidate not tracked by the queue
    #[error("Candidate not found in queue: {url}")]
    CandidateNotFound { url: String },

    /// Pool used in the wrong lifecycle state
    #[error("Invalid pool state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },

    /// Channel communication error
    #[error("Channel communication error")]
    ChannelClosed,

    /// Invalid runtime configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Extraction error
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Output error
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Harvest machinery error
    #[error(transparent)]
    Harvest(#[from] HarvestError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(FetchError::Transient { .. })
            | AppError::Extraction(ExtractionError::NoContent { .. })
            | AppError::Extraction(ExtractionError::Aborted { .. }) => true,

            AppError::Fetch(FetchError::Absent { .. })
            | AppError::Config(_)
            | AppError::Output(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Extraction(_) => "extraction",
            AppError::Config(_) => "config",
            AppError::Output(_) => "output",
            AppError::Harvest(_) => "harvest",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Extraction result type alias
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Output result type alias
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Harvest result type alias
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;
