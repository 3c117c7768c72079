// blocklog - platform/config.rs
//
// Config directory resolution and config.toml loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::export::ExportFormat;
use crate::core::filter;
use crate::core::model::Level;
use crate::util::constants;
use crate::util::error::ConfigError;
use chrono::NaiveDate;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for blocklog configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/blocklog/ or %APPDATA%\blocklog\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored. Every value is optional and read as
/// its plain TOML type so a bad value produces a warning, not a parse failure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub parsing: ParsingSection,
    pub filter: FilterSection,
    pub export: ExportSection,
    pub logging: LoggingSection,
}

/// `[parsing]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ParsingSection {
    /// Literal prefix that marks benchmark-store lines.
    pub benchmark_prefix: Option<String>,
}

/// `[filter]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Keep only records stamped on this day (`YYYY-MM-DD`).
    pub date: Option<String>,
    /// Drop records less severe than this level.
    pub min_level: Option<String>,
    /// Drop records of these classes.
    pub exclude_classes: Option<Vec<String>>,
    /// Drop records whose reconstructed line matches this regex.
    pub exclude_pattern: Option<String>,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub output_dir: Option<String>,
    /// "csv" or "json".
    pub format: Option<String>,
    /// File that receives the base output name of each run.
    pub target_file: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Parsing --
    pub benchmark_prefix: String,

    // -- Filter --
    pub date: Option<NaiveDate>,
    pub min_level: Level,
    pub exclude_classes: Vec<String>,
    pub exclude_pattern: Option<String>,

    // -- Export --
    pub output_dir: PathBuf,
    pub format: ExportFormat,
    pub target_file: Option<PathBuf>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            benchmark_prefix: constants::DEFAULT_BENCHMARK_PREFIX.to_string(),
            date: None,
            min_level: Level::None,
            exclude_classes: Vec::new(),
            exclude_pattern: None,
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            format: ExportFormat::Csv,
            target_file: None,
            log_level: None,
        }
    }
}

/// Read and deserialise `config_path`.
///
/// `Ok(None)` when the file does not exist.
pub fn read_raw_config(config_path: &Path) -> Result<Option<RawConfig>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    let raw = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(raw))
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with one warning;
/// the run still proceeds but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let raw = match read_raw_config(config_path) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
            return (AppConfig::default(), Vec::new());
        }
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    let (config, warnings) = validate(raw);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }
    (config, warnings)
}

/// Validate every field of `raw`, accumulating all problems.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();
    let mut reject = |field: &str, value: &str, expected: String, default: &str| {
        let err = ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            expected,
        };
        warnings.push(format!("{err}. Using default ({default})."));
    };

    // -- Parsing: benchmark_prefix --
    if let Some(prefix) = raw.parsing.benchmark_prefix {
        if !prefix.is_empty() && prefix.len() <= constants::MAX_BENCHMARK_PREFIX_LENGTH {
            config.benchmark_prefix = prefix;
        } else {
            reject(
                "parsing.benchmark_prefix",
                &prefix,
                format!("1-{} bytes", constants::MAX_BENCHMARK_PREFIX_LENGTH),
                constants::DEFAULT_BENCHMARK_PREFIX,
            );
        }
    }

    // -- Filter: date --
    if let Some(date) = raw.filter.date.filter(|d| !d.is_empty()) {
        match NaiveDate::parse_from_str(&date, constants::FILTER_DATE_FORMAT) {
            Ok(day) => config.date = Some(day),
            Err(_) => reject(
                "filter.date",
                &date,
                "a date formatted YYYY-MM-DD".to_string(),
                "no date filter",
            ),
        }
    }

    // -- Filter: min_level --
    if let Some(level) = raw.filter.min_level {
        match Level::from_label(&level) {
            Some(parsed) => config.min_level = parsed,
            None => reject(
                "filter.min_level",
                &level,
                "none, debug, info, warn or error".to_string(),
                "none",
            ),
        }
    }

    // -- Filter: exclude_classes --
    if let Some(classes) = raw.filter.exclude_classes {
        config.exclude_classes = classes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }

    // -- Filter: exclude_pattern --
    if let Some(pattern) = raw.filter.exclude_pattern.filter(|p| !p.is_empty()) {
        match filter::matching(&pattern) {
            Ok(_) => config.exclude_pattern = Some(pattern),
            Err(e) => reject(
                "filter.exclude_pattern",
                &pattern,
                format!("a valid regex ({e})"),
                "no pattern",
            ),
        }
    }

    // -- Export: output_dir --
    if let Some(dir) = raw.export.output_dir {
        if dir.trim().is_empty() {
            reject(
                "export.output_dir",
                &dir,
                "a non-empty path".to_string(),
                constants::DEFAULT_OUTPUT_DIR,
            );
        } else {
            config.output_dir = PathBuf::from(dir);
        }
    }

    // -- Export: format --
    if let Some(format) = raw.export.format {
        match ExportFormat::from_label(&format) {
            Some(parsed) => config.format = parsed,
            None => reject(
                "export.format",
                &format,
                "csv or json".to_string(),
                constants::CSV_EXTENSION,
            ),
        }
    }

    // -- Export: target_file --
    if let Some(file) = raw.export.target_file.filter(|f| !f.trim().is_empty()) {
        config.target_file = Some(PathBuf::from(file));
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            reject(
                "logging.level",
                &level,
                "error, warn, info, debug or trace".to_string(),
                constants::DEFAULT_LOG_LEVEL,
            );
        }
    }

    (config, warnings)
}
