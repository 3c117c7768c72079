// blocklog - util/duration.rs
//
// Duration literals as written by Go's `time.Duration` formatter, e.g.
// `12ms`, `1.234567ms`, `1m30.5s`, `250µs`. Both emitters this tool reads
// print elapsed times this way.

use crate::util::error::DurationError;
use std::time::Duration;

/// Parse a duration literal: one or more `<decimal><unit>` groups, or a bare `0`.
///
/// Accepted units: `ns`, `us`, `µs`, `μs`, `ms`, `s`, `m`, `h`.
/// Negative durations are rejected since every field read with this is an
/// elapsed time.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let nanos = go_parse_duration::parse_duration(s).map_err(|e| match e {
        go_parse_duration::Error::ParseError(message) => DurationError::Invalid { message },
    })?;
    let nanos = u64::try_from(nanos).map_err(|_| DurationError::Negative)?;
    Ok(Duration::from_nanos(nanos))
}
