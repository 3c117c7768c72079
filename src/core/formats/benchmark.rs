// blocklog - core/formats/benchmark.rs
//
// Benchmark-store lines: a literal prefix followed by six comma-separated
// fields `backend, method, existing, <unused>, count, cost`, e.g.
//
//   direct_leveldb, get, 10000, get, 100, 12.5ms
//
// The fourth field is carried by the emitter but has no meaning here.

use crate::core::model::Record;
use crate::util::constants::BENCHMARK_FIELD_COUNT;
use crate::util::duration::parse_duration;
use crate::util::error::RecordError;

/// Parse one benchmark line that starts with `prefix`.
///
/// The text after the prefix may begin with a `,` separator; it is dropped
/// before the fields are counted.
pub fn parse_line(prefix: &str, line_number: u64, line: &str) -> Result<Record, RecordError> {
    let body = line.strip_prefix(prefix).unwrap_or(line).trim_start();
    let body = body.strip_prefix(',').unwrap_or(body);

    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    if fields.len() != BENCHMARK_FIELD_COUNT {
        return Err(RecordError::FieldCount {
            kind: "benchmark",
            expected: BENCHMARK_FIELD_COUNT,
            found: fields.len(),
        });
    }

    for (index, field) in [(0, "backend"), (1, "method")] {
        if fields[index].is_empty() {
            return Err(RecordError::EmptyField { field });
        }
    }

    let existing: u64 = fields[2].parse().map_err(|source| RecordError::Int {
        field: "existing",
        raw: fields[2].to_string(),
        source,
    })?;
    let count: u64 = fields[4].parse().map_err(|source| RecordError::Int {
        field: "count",
        raw: fields[4].to_string(),
        source,
    })?;
    let elapsed = parse_duration(fields[5]).map_err(|source| RecordError::Duration {
        field: "cost",
        raw: fields[5].to_string(),
        source,
    })?;

    tracing::trace!(line_number, method = fields[1], "Benchmark line parsed");

    Ok(Record::Benchmark {
        prefix: prefix.to_string(),
        backend: fields[0].to_string(),
        method: fields[1].to_string(),
        existing,
        count,
        elapsed,
    })
}
