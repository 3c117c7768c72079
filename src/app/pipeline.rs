// blocklog - app/pipeline.rs
//
// One run, end to end: build the registry and filter chain from the resolved
// options, open the input, run the engine, export every class, record the
// target name.
//
// Setup and parse failures abort the run. Export failures are per class: the
// failing class is logged and reported, the others are still written.

use crate::core::export::{self, ExportFormat};
use crate::core::filter::{self, FilterChain};
use crate::core::model::{Level, Record};
use crate::core::parser::{Engine, ParseResult};
use crate::core::registry::ClassifierRegistry;
use crate::platform::config::AppConfig;
use crate::platform::fs;
use crate::util::constants::FILTER_DATE_FORMAT;
use crate::util::error::{BlockLogError, ExportError};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Fully resolved options of a run (config merged with CLI overrides).
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub benchmark_prefix: String,
    pub date: Option<NaiveDate>,
    pub min_level: Level,
    pub exclude_classes: Vec<String>,
    pub exclude_pattern: Option<String>,
    pub format: ExportFormat,
    pub target_file: Option<PathBuf>,
}

impl RunOptions {
    /// Options for `input` taken from a validated config.
    pub fn from_config(input: PathBuf, config: &AppConfig) -> Self {
        Self {
            input,
            output_dir: config.output_dir.clone(),
            benchmark_prefix: config.benchmark_prefix.clone(),
            date: config.date,
            min_level: config.min_level,
            exclude_classes: config.exclude_classes.clone(),
            exclude_pattern: config.exclude_pattern.clone(),
            format: config.format,
            target_file: config.target_file.clone(),
        }
    }

    /// The date filter as it appears in output file names.
    pub fn date_label(&self) -> Option<String> {
        self.date
            .map(|d| d.format(FILTER_DATE_FORMAT).to_string())
    }
}

/// One class written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassExport {
    pub class: String,
    pub path: PathBuf,
    pub records: usize,
}

/// One class that could not be written.
#[derive(Debug)]
pub struct ClassFailure {
    pub class: String,
    pub error: ExportError,
}

/// Outcome of `export_all`.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub exported: Vec<ClassExport>,
    pub failed: Vec<ClassFailure>,
}

/// Outcome of a complete run.
#[derive(Debug)]
pub struct RunReport {
    pub lines_processed: u64,
    /// `<input file name>[.<date>]`, shared by every output file.
    pub base_name: String,
    pub exports: ExportReport,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.exports.failed.is_empty()
    }
}

/// Build the engine: builtin formats plus one exclusion predicate per active
/// filter option, in the order date, level, classes, pattern.
pub fn build_engine(options: &RunOptions) -> Result<Engine, BlockLogError> {
    let registry = ClassifierRegistry::with_builtin_formats(&options.benchmark_prefix)?;

    let mut filters = FilterChain::new();
    if let Some(date) = options.date {
        filters.register(filter::outside_date(date));
    }
    if options.min_level > Level::None {
        filters.register(filter::below_level(options.min_level));
    }
    if !options.exclude_classes.is_empty() {
        filters.register(filter::classes(options.exclude_classes.iter().cloned()));
    }
    if let Some(ref pattern) = options.exclude_pattern {
        filters.register(filter::matching(pattern)?);
    }

    tracing::debug!(
        prefixes = ?registry.prefixes().collect::<Vec<_>>(),
        filters = filters.len(),
        "Engine built"
    );
    Ok(Engine::new(registry, filters))
}

/// Run the whole pipeline for `options`.
pub fn run(options: &RunOptions) -> Result<RunReport, BlockLogError> {
    let started = Instant::now();
    let engine = build_engine(options)?;

    tracing::info!(input = %options.input.display(), "Parsing");
    let reader = fs::open_input(&options.input)?;
    let outcome = engine.parse_reader(reader)?;
    tracing::info!(
        lines = outcome.lines_processed,
        classes = outcome.groups.len(),
        records = outcome.groups.total_records(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Parsing complete"
    );

    let date_label = options.date_label();
    fs::ensure_dir(&options.output_dir)?;
    let exports = export_all(
        &outcome.groups,
        &options.output_dir,
        &options.input,
        date_label.as_deref(),
        options.format,
    );

    let base_name = export::base_name(&options.input, date_label.as_deref());
    if let Some(ref target) = options.target_file {
        fs::write_target_name(target, &base_name)?;
    }

    Ok(RunReport {
        lines_processed: outcome.lines_processed,
        base_name,
        exports,
    })
}

/// Write every class group to `<output_dir>/<output file name>`.
///
/// A class that fails is logged and reported; the remaining classes are still
/// written.
pub fn export_all(
    groups: &ParseResult,
    output_dir: &Path,
    input: &Path,
    date: Option<&str>,
    format: ExportFormat,
) -> ExportReport {
    let mut report = ExportReport::default();

    for (class, records) in groups.iter() {
        let path = output_dir.join(export::output_file_name(input, date, class, format));
        match export_class(records, &path, format) {
            Ok(count) => {
                tracing::info!(class, path = %path.display(), records = count, "Class exported");
                report.exported.push(ClassExport {
                    class: class.to_string(),
                    path,
                    records: count,
                });
            }
            Err(error) => {
                tracing::warn!(class, error = %error, "Class export failed");
                report.failed.push(ClassFailure {
                    class: class.to_string(),
                    error,
                });
            }
        }
    }

    report
}

fn export_class(
    records: &[Record],
    path: &Path,
    format: ExportFormat,
) -> Result<usize, ExportError> {
    let io_err = |e: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = fs::create_output(path).map_err(io_err)?;
    let written = export::export(format, records, &mut writer, path)
        .and_then(|count| writer.flush().map(|()| count).map_err(io_err));
    if written.is_err() {
        drop(writer);
        if let Err(e) = fs::discard_output(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not remove partial export");
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn options(input: PathBuf, output_dir: PathBuf) -> RunOptions {
        RunOptions {
            input,
            output_dir,
            ..RunOptions::from_config(PathBuf::new(), &AppConfig::default())
        }
    }

    #[test]
    fn test_from_config_copies_values() {
        let config = AppConfig {
            benchmark_prefix: "bench_".to_string(),
            date: NaiveDate::from_ymd_opt(2019, 9, 25),
            format: ExportFormat::Json,
            ..AppConfig::default()
        };
        let opts = RunOptions::from_config(PathBuf::from("node.log"), &config);
        assert_eq!(opts.benchmark_prefix, "bench_");
        assert_eq!(opts.format, ExportFormat::Json);
        assert_eq!(opts.date_label().as_deref(), Some("2019-09-25"));
    }

    #[test]
    fn test_build_engine_registers_active_filters_only() {
        let mut opts = options(PathBuf::from("x.log"), PathBuf::from("out"));
        assert!(build_engine(&opts).unwrap().filters().is_empty());

        opts.min_level = Level::Info;
        opts.exclude_classes = vec!["unknown".to_string()];
        opts.exclude_pattern = Some("appHash".to_string());
        let engine = build_engine(&opts).unwrap();
        assert_eq!(engine.filters().len(), 3);
        assert_eq!(engine.registry().len(), 3);
    }

    #[test]
    fn test_build_engine_rejects_bad_setup() {
        let mut opts = options(PathBuf::from("x.log"), PathBuf::from("out"));
        opts.benchmark_prefix = "E[".to_string();
        assert!(matches!(
            build_engine(&opts),
            Err(BlockLogError::Registry(_))
        ));

        let mut opts = options(PathBuf::from("x.log"), PathBuf::from("out"));
        opts.exclude_pattern = Some("(".to_string());
        assert!(matches!(build_engine(&opts), Err(BlockLogError::Filter(_))));
    }

    #[test]
    fn test_export_all_isolates_failing_class() {
        let dir = tempfile::tempdir().unwrap();
        let mut groups = ParseResult::default();
        groups.push(Record::Unknown {
            text: "hello".to_string(),
        });
        // A directory squatting on a class's output path makes that class fail.
        groups.push(Record::Unknown {
            text: "world".to_string(),
        });
        let blocked = dir.path().join("node.log.consensus.commit.csv");
        std::fs::create_dir(&blocked).unwrap();
        groups.push(Record::ConsensusCommit {
            stamp: Utc.with_ymd_and_hms(2019, 9, 25, 10, 13, 35).unwrap(),
            height: 1,
            txs: 0,
            app_hash: "AA".to_string(),
        });

        let report = export_all(
            &groups,
            dir.path(),
            Path::new("/logs/node.log"),
            None,
            ExportFormat::Csv,
        );

        assert_eq!(report.exported.len(), 1);
        assert_eq!(report.exported[0].class, "unknown");
        assert_eq!(report.exported[0].records, 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("node.log.unknown.csv")).unwrap(),
            "data\nhello\nworld\n"
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].class, "consensus.commit");
        assert!(matches!(report.failed[0].error, ExportError::Io { .. }));
    }

    #[test]
    fn test_failed_export_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.log.mixed.csv");
        // Rows of different widths make the CSV writer fail after the header.
        let records = [
            Record::Unknown {
                text: "hello".to_string(),
            },
            Record::ConsensusCommit {
                stamp: Utc.with_ymd_and_hms(2019, 9, 25, 10, 13, 35).unwrap(),
                height: 1,
                txs: 0,
                app_hash: "AA".to_string(),
            },
        ];

        let result = export_class(&records, &path, ExportFormat::Csv);
        assert!(matches!(result, Err(ExportError::Csv { .. })), "{result:?}");
        assert!(!path.exists(), "partial export must be removed");
    }

    #[test]
    fn test_run_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path().join("absent.log"), dir.path().join("out"));
        assert!(matches!(run(&opts), Err(BlockLogError::Io { .. })));
    }
}
