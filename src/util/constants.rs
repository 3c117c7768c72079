// blocklog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "blocklog";

/// Application identifier used for config directories.
pub const APP_ID: &str = "blocklog";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Consensus log format
// =============================================================================

/// Line prefix of informational consensus-engine entries.
pub const CONSENSUS_PREFIX_INFO: &str = "I[";

/// Line prefix of error consensus-engine entries.
pub const CONSENSUS_PREFIX_ERROR: &str = "E[";

/// Separator between the head (level, stamp, event) and the tail of a line.
pub const CONSENSUS_TAIL_SEPARATOR: &str = "module=";

/// Separator between the module name and the detail of an error tail.
pub const CONSENSUS_ERROR_SEPARATOR: &str = "err=";

/// Characters trimmed from the start of the head before the timestamp.
pub const CONSENSUS_STAMP_TRIM: &[char] = &['I', 'E', '['];

/// chrono format of the bracketed timestamp, e.g. `2019-09-25|10:13:34.561`.
/// Used for both reading and writing; exactly three fractional digits.
pub const CONSENSUS_STAMP_FORMAT: &str = "%Y-%m-%d|%H:%M:%S.%3f";

/// Event names the info parser understands. Anything else is ignored.
pub const EVENT_APPLY: &str = "Executed block";
pub const EVENT_COMMIT: &str = "Committed state";
pub const EVENT_END_BLOCKER: &str = "EndBlocker Time";
pub const EVENT_HANDLER: &str = "Deliver Time";
pub const EVENT_QUERIER: &str = "Query Time";

/// Width the event name is padded to when reconstructing a line.
pub const CONSENSUS_EVENT_WIDTH: usize = 32;

// =============================================================================
// Benchmark log format
// =============================================================================

/// Default literal prefix of benchmark-store lines.
pub const DEFAULT_BENCHMARK_PREFIX: &str = "direct_";

/// Number of comma-separated fields in a benchmark line.
pub const BENCHMARK_FIELD_COUNT: usize = 6;

/// Upper bound on a configured benchmark prefix length.
pub const MAX_BENCHMARK_PREFIX_LENGTH: usize = 64;

// =============================================================================
// Record classes
// =============================================================================

pub const CLASS_UNKNOWN: &str = "unknown";
pub const CLASS_CONSENSUS_ERROR: &str = "consensus.error";
pub const CLASS_CONSENSUS_APPLY: &str = "consensus.apply";
pub const CLASS_CONSENSUS_COMMIT: &str = "consensus.commit";
pub const CLASS_CONSENSUS_END_BLOCKER: &str = "consensus.endblocker";
pub const CLASS_CONSENSUS_HANDLER: &str = "consensus.handler";
pub const CLASS_CONSENSUS_QUERIER: &str = "consensus.querier";
pub const CLASS_CONSENSUS_IGNORED: &str = "consensus.ignored";

// =============================================================================
// Filtering
// =============================================================================

/// Date format accepted by the `--date` filter and `[filter] date`.
pub const FILTER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length of a user-supplied exclusion regex.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Export
// =============================================================================

/// Default output directory for exported class files.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// File extension of CSV exports.
pub const CSV_EXTENSION: &str = "csv";

/// File extension of JSON exports.
pub const JSON_EXTENSION: &str = "json";

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither RUST_LOG, --debug, nor config specify one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Emit a debug progress event every this many lines.
pub const PROGRESS_LOG_INTERVAL: u64 = 100_000;

/// Maximum characters of a line included in debug log output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
