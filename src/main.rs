// blocklog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (platform default or --config)
// 3. Logging initialisation (debug mode support)
// 4. Merging CLI overrides over config values
// 5. Running the pipeline and reporting per-class results

use blocklog::app::pipeline::{self, RunOptions};
use blocklog::core::export::ExportFormat;
use blocklog::core::model::Level;
use blocklog::platform::config::{self, AppConfig, PlatformPaths};
use blocklog::util;
use blocklog::util::constants::FILTER_DATE_FORMAT;
use blocklog::util::error::ConfigError;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// blocklog - Split blockchain node logs into per-event CSV/JSON tables.
///
/// Classifies every line of a consensus-engine or benchmark-store log,
/// parses it into a typed record and writes one file per record class.
#[derive(Parser, Debug)]
#[command(name = "blocklog", version, about)]
struct Cli {
    /// Log file to parse.
    input: PathBuf,

    /// Directory receiving the exported class files.
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Keep only records stamped on this day (YYYY-MM-DD).
    #[arg(long = "date")]
    date: Option<String>,

    /// Drop records below this level (none, debug, info, warn, error).
    #[arg(short = 'l', long = "level")]
    level: Option<String>,

    /// Drop records of this class. Repeatable.
    #[arg(short = 'x', long = "exclude-class")]
    exclude_class: Vec<String>,

    /// Drop records whose line matches this regex.
    #[arg(short = 'e', long = "exclude-pattern")]
    exclude_pattern: Option<String>,

    /// Output format: csv or json.
    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    /// Literal prefix of benchmark-store lines.
    #[arg(short = 'b', long = "benchmark-prefix")]
    benchmark_prefix: Option<String>,

    /// File that receives the base output name of this run.
    #[arg(short = 't', long = "target-file")]
    target_file: Option<PathBuf>,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config first: its [logging] level feeds logging init.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (app_config, config_warnings) = config::load_config(&config_path);

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "blocklog starting"
    );
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    let options = match resolve_options(cli, &app_config) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!(error = %e, "Invalid command-line option");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = match pipeline::run(&options) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for export in &report.exports.exported {
        println!("{:>8}  {}", export.records, export.path.display());
    }
    for failure in &report.exports.failed {
        eprintln!("Failed to export '{}': {}", failure.class, failure.error);
    }

    tracing::info!(
        lines = report.lines_processed,
        exported = report.exports.exported.len(),
        failed = report.exports.failed.len(),
        base_name = %report.base_name,
        "Run complete"
    );
    ExitCode::SUCCESS
}

/// Apply CLI overrides on top of the validated config. A value given on the
/// command line replaces the config value; an invalid one fails the run.
fn resolve_options(cli: Cli, app_config: &AppConfig) -> Result<RunOptions, ConfigError> {
    let mut options = RunOptions::from_config(cli.input, app_config);

    if let Some(dir) = cli.output_dir {
        options.output_dir = dir;
    }
    if let Some(date) = cli.date {
        let day = NaiveDate::parse_from_str(&date, FILTER_DATE_FORMAT).map_err(|_| {
            ConfigError::ValueOutOfRange {
                field: "--date".to_string(),
                value: date.clone(),
                expected: "a date formatted YYYY-MM-DD".to_string(),
            }
        })?;
        options.date = Some(day);
    }
    if let Some(level) = cli.level {
        options.min_level =
            Level::from_label(&level).ok_or_else(|| ConfigError::ValueOutOfRange {
                field: "--level".to_string(),
                value: level.clone(),
                expected: "none, debug, info, warn or error".to_string(),
            })?;
    }
    if !cli.exclude_class.is_empty() {
        options.exclude_classes = cli.exclude_class;
    }
    if let Some(pattern) = cli.exclude_pattern {
        options.exclude_pattern = Some(pattern);
    }
    if let Some(format) = cli.format {
        options.format =
            ExportFormat::from_label(&format).ok_or_else(|| ConfigError::ValueOutOfRange {
                field: "--format".to_string(),
                value: format.clone(),
                expected: "csv or json".to_string(),
            })?;
    }
    if let Some(prefix) = cli.benchmark_prefix {
        options.benchmark_prefix = prefix;
    }
    if let Some(target) = cli.target_file {
        options.target_file = Some(target);
    }

    tracing::debug!(?options, "Run options resolved");
    Ok(options)
}
