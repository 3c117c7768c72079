// blocklog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation: every failure names its subsystem and
// keeps the underlying cause reachable through `source()`.

use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

/// Top-level error type for all blocklog operations.
#[derive(Debug)]
pub enum BlockLogError {
    /// Classifier registry setup failed.
    Registry(RegistryError),

    /// Log file parsing failed.
    Parse(ParseError),

    /// Filter construction failed.
    Filter(FilterError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for BlockLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "Registry error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for BlockLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Errors raised while building the classifier registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A parser is already registered for this prefix.
    DuplicatePrefix { prefix: String },

    /// Empty prefixes would match every line.
    EmptyPrefix,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePrefix { prefix } => write!(f, "prefix '{prefix}' already taken"),
            Self::EmptyPrefix => write!(f, "prefix must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RegistryError> for BlockLogError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Record errors (single line)
// ---------------------------------------------------------------------------

/// Why a line that matched a registered prefix could not be parsed.
#[derive(Debug)]
pub enum RecordError {
    /// The line lacks the structural separator of its format.
    MalformedItem { text: String },

    /// The head part (level, timestamp, event name) is malformed.
    MalformedHead { head: String },

    /// The tail of an event is malformed.
    MalformedTail { event: String, tail: String },

    /// Wrong number of delimited fields.
    FieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    /// A required field is blank.
    EmptyField { field: &'static str },

    /// A field was expected to be `key=value`.
    MalformedPair { field: &'static str, pair: String },

    /// An integer field failed to parse.
    Int {
        field: &'static str,
        raw: String,
        source: ParseIntError,
    },

    /// The timestamp failed to parse.
    Timestamp {
        raw: String,
        source: chrono::ParseError,
    },

    /// A duration literal failed to parse.
    Duration {
        field: &'static str,
        raw: String,
        source: DurationError,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedItem { text } => write!(f, "malformed item: {text}"),
            Self::MalformedHead { head } => write!(f, "malformed head: {head}"),
            Self::MalformedTail { event, tail } => {
                write!(f, "malformed '{event}' tail: {tail}")
            }
            Self::FieldCount {
                kind,
                expected,
                found,
            } => write!(f, "{kind}: expected {expected} fields, found {found}"),
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::MalformedPair { field, pair } => {
                write!(f, "malformed {field} pair: {pair}")
            }
            Self::Int { field, raw, source } => {
                write!(f, "cannot parse {field} '{raw}': {source}")
            }
            Self::Timestamp { raw, source } => {
                write!(f, "cannot parse timestamp '{raw}': {source}")
            }
            Self::Duration { field, raw, source } => {
                write!(f, "cannot parse {field} '{raw}': {source}")
            }
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Int { source, .. } => Some(source),
            Self::Timestamp { source, .. } => Some(source),
            Self::Duration { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A duration literal (e.g. `12ms`, `1m30.5s`) could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// Empty input.
    Empty,

    /// Negative durations have no meaning for elapsed times.
    Negative,

    /// Not a Go duration literal; the message comes from the literal parser.
    Invalid { message: String },
}

impl fmt::Display for DurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty duration"),
            Self::Negative => write!(f, "negative duration"),
            Self::Invalid { message } => write!(f, "invalid duration: {message}"),
        }
    }
}

impl std::error::Error for DurationError {}

// ---------------------------------------------------------------------------
// Parse errors (whole run)
// ---------------------------------------------------------------------------

/// Errors that abort a parse run.
#[derive(Debug)]
pub enum ParseError {
    /// A line matched a prefix but violated its format. Aborts the run.
    MalformedLine { line_number: u64, source: RecordError },

    /// I/O error while reading the input stream.
    Io { line_number: u64, source: io::Error },
}

impl ParseError {
    /// Where the run stopped: the offending line for malformed input, the
    /// last line read successfully for I/O failures.
    pub fn line_number(&self) -> u64 {
        match self {
            Self::MalformedLine { line_number, .. } | Self::Io { line_number, .. } => *line_number,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedLine {
                line_number,
                source,
            } => write!(f, "line {line_number}: {source}"),
            Self::Io {
                line_number,
                source,
            } => write!(f, "I/O error after line {line_number}: {source}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedLine { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ParseError> for BlockLogError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to building exclusion predicates.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    /// User-provided regex exceeds the length limit.
    RegexTooLong { length: usize, max_length: usize },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid exclusion regex '{pattern}': {source}")
            }
            Self::RegexTooLong { length, max_length } => write!(
                f,
                "Exclusion regex is {length} chars, exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FilterError> for BlockLogError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Nothing to export; a class group never exists without records, so
    /// this signals a caller bug rather than an empty log.
    Empty { path: PathBuf },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
            Self::Empty { path } => {
                write!(f, "No records to export to '{}'", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Empty { .. } => None,
        }
    }
}

impl From<ExportError> for BlockLogError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for BlockLogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for blocklog results.
pub type Result<T> = std::result::Result<T, BlockLogError>;
