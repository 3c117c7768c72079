// blocklog - core/export.rs
//
// CSV and JSON export of one record class.
// Core layer: writes to any Write trait object; the caller owns file creation.

use crate::core::model::Record;
use crate::util::constants::{CSV_EXTENSION, JSON_EXTENSION};
use crate::util::error::ExportError;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => CSV_EXTENSION,
            Self::Json => JSON_EXTENSION,
        }
    }

    /// Case-insensitive lookup used by config validation and the CLI.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `<input file name>[.<date>].<class>.<ext>`
///
/// Only the file name of `input` is used, so outputs land beside each other in
/// the output directory whatever the input's location.
pub fn output_file_name(
    input: &Path,
    date: Option<&str>,
    class: &str,
    format: ExportFormat,
) -> String {
    let mut name = base_name(input, date);
    name.push('.');
    name.push_str(class);
    name.push('.');
    name.push_str(format.extension());
    name
}

/// `<input file name>[.<date>]`, the part shared by every output of a run.
pub fn base_name(input: &Path, date: Option<&str>) -> String {
    let mut name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string_lossy().into_owned());
    if let Some(date) = date.filter(|d| !d.is_empty()) {
        name.push('.');
        name.push_str(date);
    }
    name
}

/// Write `records` as CSV: the header of the first record, then one row per
/// record. All records are expected to share a class.
///
/// `export_path` is only used for error context.
pub fn export_csv<W: Write>(
    records: &[Record],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let first = records.first().ok_or_else(|| ExportError::Empty {
        path: export_path.to_path_buf(),
    })?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    csv_writer.write_record(first.header()).map_err(csv_err)?;

    let mut count = 0;
    for record in records {
        csv_writer.write_record(record.format()).map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Write `records` as a pretty-printed JSON array of objects keyed by header.
pub fn export_json<W: Write>(
    records: &[Record],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty {
            path: export_path.to_path_buf(),
        });
    }
    serde_json::to_writer_pretty(writer, &Rows(records)).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(records.len())
}

/// Dispatch on `format`.
pub fn export<W: Write>(
    format: ExportFormat,
    records: &[Record],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    match format {
        ExportFormat::Csv => export_csv(records, writer, export_path),
        ExportFormat::Json => export_json(records, writer, export_path),
    }
}

// Serialises rows as objects with keys in header order.
struct Rows<'a>(&'a [Record]);

struct Row<'a>(&'a Record);

impl Serialize for Rows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for record in self.0 {
            seq.serialize_element(&Row(record))?;
        }
        seq.end()
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let header = self.0.header();
        let values = self.0.format();
        let mut map = serializer.serialize_map(Some(header.len()))?;
        for (key, value) in header.iter().zip(values.iter()) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use std::time::Duration;

    fn commit(height: u64, txs: u64) -> Record {
        Record::ConsensusCommit {
            stamp: Utc.with_ymd_and_hms(2019, 9, 25, 10, 13, 35).unwrap(),
            height,
            txs,
            app_hash: "9C1E5A".to_string(),
        }
    }

    fn bench(method: &str, elapsed_ms: u64) -> Record {
        Record::Benchmark {
            prefix: "direct_".to_string(),
            backend: "leveldb".to_string(),
            method: method.to_string(),
            existing: 10,
            count: 100,
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    #[test]
    fn test_csv_export() {
        let records = vec![commit(41, 0), commit(42, 4)];
        let mut buf = Vec::new();
        let count = export_csv(&records, &mut buf, &PathBuf::from("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "height,stamp,txs,app_hash");
        assert_eq!(lines[2], "42,2019-09-25T10:13:35.000Z,4,9C1E5A");
    }

    #[test]
    fn test_csv_benchmark_columns() {
        let mut buf = Vec::new();
        export_csv(&[bench("get", 12)], &mut buf, &PathBuf::from("out.csv")).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output,
            "backend,method,existing,count,cost_ms\nleveldb,get,10,100,12\n"
        );
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let records = vec![Record::Unknown {
            text: "a, b".to_string(),
        }];
        let mut buf = Vec::new();
        export_csv(&records, &mut buf, &PathBuf::from("out.csv")).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "data\n\"a, b\"\n");
    }

    #[test]
    fn test_empty_class_is_an_error() {
        let mut buf = Vec::new();
        let err = export_csv(&[], &mut buf, &PathBuf::from("none.csv")).unwrap_err();
        assert!(matches!(err, ExportError::Empty { .. }));
        assert!(buf.is_empty());

        let err = export_json(&[], &mut buf, &PathBuf::from("none.json")).unwrap_err();
        assert!(matches!(err, ExportError::Empty { .. }));
    }

    #[test]
    fn test_json_export() {
        let records = vec![commit(42, 4)];
        let mut buf = Vec::new();
        let count = export_json(&records, &mut buf, &PathBuf::from("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["height"], "42");
        assert_eq!(rows[0]["app_hash"], "9C1E5A");

        // Keys keep header order in the raw text.
        let text = String::from_utf8(buf).unwrap();
        let height_at = text.find("\"height\"").unwrap();
        let hash_at = text.find("\"app_hash\"").unwrap();
        assert!(height_at < hash_at);
    }

    #[test]
    fn test_output_file_name() {
        let input = PathBuf::from("/var/log/node/node.log");
        assert_eq!(
            output_file_name(&input, None, "consensus.commit", ExportFormat::Csv),
            "node.log.consensus.commit.csv"
        );
        assert_eq!(
            output_file_name(&input, Some("2019-09-25"), "get", ExportFormat::Json),
            "node.log.2019-09-25.get.json"
        );
        assert_eq!(base_name(&input, Some("")), "node.log");
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(ExportFormat::from_label("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_label(" json "), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_label("xml"), None);
        assert_eq!(ExportFormat::default().to_string(), "csv");
    }
}
