//! Application constants for Notice Harvester
//!
//! This module centralizes the tunables and fixed vocabulary used throughout
//! the application, organized by functional domain.

use std::time::Duration;

/// Notice origin and URL layout
pub mod origin {
    /// Base URL under which every notice page lives
    pub const BASE_URL: &str = "https://oag.ca.gov/prop65";

    /// Path segment prefix preceding `{year}-{sequence}`
    pub const NOTICE_PATH_PREFIX: &str = "60-Day-Notice-";

    /// Zero-padded width of the sequence part of a notice id
    pub const SEQUENCE_WIDTH: usize = 5;

    /// Small built-in list harvested when no other source is configured
    pub const FALLBACK_NOTICE_IDS: &[&str] = &[
        "2021-02146",
        "2021-02145",
        "2021-02147",
        "2021-02148",
        "2022-02148",
    ];
}

/// Known partition bounds as `(year, first id, last known id)`
///
/// Used when neither the config file nor the command line supplies bounds.
pub mod partitions {
    pub const DEFAULT_BOUNDS: &[(u16, u32, u32)] = &[
        (2015, 1, 1349),
        (2016, 1, 1581),
        (2017, 1, 2713),
        (2018, 1, 2368),
        (2019, 1, 2423),
        (2020, 1, 3543),
        (2021, 1, 3165),
        (2022, 1, 3174),
        (2023, 1, 4142),
        (2024, 1, 5403),
        (2025, 1, 881),
    ];
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Notice-Harvester/0.1.0 (Public Records Research Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 10;

    /// Maximum number of redirects to follow
    pub const MAX_REDIRECTS: usize = 10;

    /// Status codes meaning the requested resource does not exist
    pub const ABSENT_STATUS_CODES: &[u16] = &[404, 410];
}

/// Rate limiting configuration
pub mod limits {
    /// Default rate limit against the origin (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Upper bound accepted for the configured rate limit
    pub const MAX_RATE_LIMIT_RPS: u32 = 50;
}

/// Frontier discovery tunables
pub mod discovery {
    use super::Duration;

    /// Consecutive absent probes that end discovery for a partition
    pub const DEFAULT_ABSENCE_THRESHOLD: u32 = 3;

    /// Pause between successive probes
    pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_secs(1);

    /// Pause before re-probing after a transient failure
    pub const DEFAULT_TRANSIENT_PAUSE: Duration = Duration::from_secs(5);
}

/// Worker and concurrency configuration
pub mod workers {
    use super::Duration;

    /// Default number of fetch workers
    pub const DEFAULT_WORKER_COUNT: usize = 5;

    /// Maximum recommended concurrent workers
    pub const MAX_WORKER_COUNT: usize = 32;

    /// Total attempts per candidate, the first one included
    pub const MAX_RETRIES: u32 = 3;

    /// Fixed delay between attempts on the same candidate
    pub const RETRY_DELAY: Duration = Duration::from_secs(5);

    /// Upper bound on a single fetch, independent of the HTTP client timeout
    pub const FETCH_TIMEOUT: Duration = Duration::from_secs(90);

    /// Channel buffer size for worker events
    pub const EVENT_BUFFER_SIZE: usize = 1024;
}

/// Progress reporting and monitoring
pub mod progress {
    use super::Duration;

    /// Interval between periodic progress log lines
    pub const LOG_INTERVAL: Duration = Duration::from_secs(10);

    /// Emit a milestone log line every this many processed candidates
    pub const MILESTONE_EVERY: usize = 50;

    /// Placeholder shown when an estimate cannot be computed yet
    pub const UNKNOWN: &str = "Unknown";
}

/// Coordinator and orchestration constants
pub mod coordinator {
    use super::Duration;

    /// Grace period granted to workers after a shutdown request
    pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Output and file layout
pub mod files {
    /// Default output path for harvested data
    pub const DEFAULT_OUTPUT_PATH: &str = "60-Day-Notice-Data.csv";

    /// Temporary file suffix for atomic writes
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Prefix of the timestamped failure log file
    pub const FAILURE_LOG_PREFIX: &str = "failed_urls_";

    /// Timestamp format embedded in the failure log file name
    pub const FAILURE_LOG_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

    /// Name of the configuration file searched in the working directory
    pub const LOCAL_CONFIG_FILE: &str = "notice_harvester.toml";

    /// Directory name under the platform config dir
    pub const CONFIG_DIR_NAME: &str = "notice_harvester";

    /// Configuration file name under the platform config dir
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Column vocabulary of the tabular output
pub mod columns {
    /// Version of the fixed column layout written to output files
    pub const LAYOUT_VERSION: u32 = 2;

    /// Name of the identifier column
    pub const LINK: &str = "link";

    /// Name of the trailing classification column written after reconciliation
    pub const STATUS: &str = "Status";

    /// Highest numbered repeatable section (settlement, judgment, ...)
    pub const MAX_REPEATED_SECTIONS: u8 = 5;

    /// Fields of the main (top-level) category, in output order
    pub const MAIN_FIELDS: &[&str] = &[
        "AG Number",
        "Alleged Violators",
        "Chemicals",
        "Date Filed",
        "Notice PDF",
        "Noticing Party",
        "Plaintiff Attorney",
        "Source",
        "Withdrawal Status",
        "Withdrawal ID",
        "Withdrawal Date",
        "Withdrawal Letter",
    ];

    /// Fields of the civil complaint section
    pub const CIVIL_COMPLAINT_FIELDS: &[&str] = &[
        "Date Filed",
        "Case Name",
        "Court Name",
        "Court Docket Number",
        "Plaintiff",
        "Plaintiff Attorney",
        "Defendant",
        "Type of Claim",
        "Relief Sought",
        "Contact Name",
        "Contact Organization",
        "Email Address",
        "Address",
        "City, State, Zip",
        "Phone Number",
    ];

    /// Fields of settlement and corrected settlement sections
    pub const SETTLEMENT_FIELDS: &[&str] = &[
        "Settlement Date",
        "Case Name",
        "Court Name",
        "Court Docket Number",
        "Plaintiff",
        "Plaintiff Attorney",
        "Defendant",
        "Injunctive Relief",
        "Non-Contingent Civil Penalty",
        "Attorneys Fees and Costs",
        "Payment in Lieu of Penalty",
        "Total Payments",
        "Will settlement be submitted to court?",
        "Contact Name",
        "Contact Organization",
        "Email Address",
        "Address",
        "City, State, Zip",
        "Phone Number",
    ];

    /// Fields of judgment sections
    pub const JUDGMENT_FIELDS: &[&str] = &[
        "Judgment Date",
        "Settlement reported to AG",
        "Case Name",
        "Court Name",
        "Court Docket Number",
        "Plaintiff",
        "Plaintiff Attorney",
        "Defendant",
        "Injunctive Relief",
        "Non-Contingent Civil Penalty",
        "Attorneys Fees and Costs",
        "Payment in Lieu of Penalty",
        "Total Payments",
        "Is Judgment Pursuant to Settlement?",
        "Contact Name",
        "Contact Organization",
        "Email Address",
        "Address",
        "City, State, Zip",
        "Phone Number",
    ];

    /// Column name keywords marking a value as monetary (matched case-insensitively)
    pub const MONETARY_KEYWORDS: &[&str] = &[
        "civil penalty",
        "fees",
        "costs",
        "payment",
        "penalty",
        "payments",
        "total",
    ];
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use files::{DEFAULT_OUTPUT_PATH, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use origin::BASE_URL;
pub use workers::{DEFAULT_WORKER_COUNT, MAX_RETRIES};
