// blocklog - core/formats/consensus.rs
//
// Consensus-engine log lines: `I[stamp] Event name   module=TAIL` and
// `E[stamp] Event name   module=MODULE err="detail"`.
//
// Info lines are dispatched by event name to a tail parser; unknown event
// names are kept as ignored records. Commit lines advance the run's
// `ParserContext`; later error, querier and ignored lines take their height
// from it.

use crate::core::model::{ParserContext, Record};
use crate::util::constants::{
    CONSENSUS_ERROR_SEPARATOR, CONSENSUS_STAMP_FORMAT, CONSENSUS_STAMP_TRIM,
    CONSENSUS_TAIL_SEPARATOR, EVENT_APPLY, EVENT_COMMIT, EVENT_END_BLOCKER, EVENT_HANDLER,
    EVENT_QUERIER,
};
use crate::util::duration::parse_duration;
use crate::util::error::RecordError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

/// Parse an `E[` line. Height is whatever the last commit left in `ctx`.
pub fn parse_error_line(
    ctx: &mut ParserContext,
    line_number: u64,
    line: &str,
) -> Result<Record, RecordError> {
    let (stamp, event, tail) = split_line(line)?;

    let (module, detail) =
        tail.split_once(CONSENSUS_ERROR_SEPARATOR)
            .ok_or_else(|| RecordError::MalformedTail {
                event: event.to_string(),
                tail: tail.to_string(),
            })?;
    let detail = detail.strip_prefix('"').unwrap_or(detail);
    let detail = detail.strip_suffix('"').unwrap_or(detail);

    Ok(Record::ConsensusError {
        line_number,
        stamp,
        height: ctx.current_height(),
        event: event.to_string(),
        module: module.trim().to_string(),
        detail: detail.to_string(),
    })
}

/// Parse an `I[` line, dispatching on the event name.
pub fn parse_info_line(
    ctx: &mut ParserContext,
    line_number: u64,
    line: &str,
) -> Result<Record, RecordError> {
    let (stamp, event, tail) = split_line(line)?;

    let record = match event {
        EVENT_APPLY => parse_apply(ctx, stamp, tail)?,
        EVENT_COMMIT => parse_commit(ctx, stamp, tail)?,
        EVENT_END_BLOCKER => parse_end_blocker(stamp, tail)?,
        EVENT_HANDLER => parse_handler(stamp, tail)?,
        EVENT_QUERIER => parse_querier(ctx, stamp, tail)?,
        _ => Record::ConsensusIgnored {
            stamp,
            height: ctx.current_height(),
            event: event.to_string(),
            tail: tail.to_string(),
        },
    };

    tracing::trace!(line_number, class = record.class(), "Consensus line parsed");
    Ok(record)
}

// =============================================================================
// Head
// =============================================================================

/// Split a line into `(stamp, event name, tail)`.
fn split_line(line: &str) -> Result<(DateTime<Utc>, &str, &str), RecordError> {
    let mut parts = line.split(CONSENSUS_TAIL_SEPARATOR);
    let (head, tail) = match (parts.next(), parts.next(), parts.next()) {
        (Some(head), Some(tail), None) => (head, tail),
        _ => {
            return Err(RecordError::MalformedItem {
                text: line.to_string(),
            })
        }
    };

    let (raw_stamp, event) = head
        .split_once(']')
        .ok_or_else(|| RecordError::MalformedHead {
            head: head.to_string(),
        })?;

    Ok((parse_stamp(raw_stamp)?, event.trim(), tail))
}

fn parse_stamp(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    let trimmed = raw.trim_start_matches(CONSENSUS_STAMP_TRIM);
    NaiveDateTime::parse_from_str(trimmed, CONSENSUS_STAMP_FORMAT)
        .map(|ndt| ndt.and_utc())
        .map_err(|source| RecordError::Timestamp {
            raw: trimmed.to_string(),
            source,
        })
}

// =============================================================================
// Tail parsers
// =============================================================================

// `state height=N validTxs=N invalidTxs=N`
fn parse_apply(
    ctx: &ParserContext,
    stamp: DateTime<Utc>,
    tail: &str,
) -> Result<Record, RecordError> {
    let fields = split_fields("apply", tail, 4)?;
    let height = int_pair("apply height", fields[1])?;
    let valid_txs = int_pair("apply validTxs", fields[2])?;
    let invalid_txs = int_pair("apply invalidTxs", fields[3])?;

    let elapsed = ctx
        .current_stamp()
        .and_then(|prev| (stamp - prev).to_std().ok())
        .unwrap_or(Duration::ZERO);

    Ok(Record::ConsensusApply {
        stamp,
        height,
        valid_txs,
        invalid_txs,
        elapsed,
    })
}

// `state height=N txs=N appHash=HASH`
fn parse_commit(
    ctx: &mut ParserContext,
    stamp: DateTime<Utc>,
    tail: &str,
) -> Result<Record, RecordError> {
    let fields = split_fields("commit", tail, 4)?;
    let height = int_pair("commit height", fields[1])?;
    let txs = int_pair("commit txs", fields[2])?;
    let app_hash = pair_value("commit appHash", fields[3])?;

    ctx.commit(height, stamp);

    Ok(Record::ConsensusCommit {
        stamp,
        height,
        txs,
        app_hash: app_hash.to_string(),
    })
}

// `main height=N name=MODULE cost=DURATION`
fn parse_end_blocker(stamp: DateTime<Utc>, tail: &str) -> Result<Record, RecordError> {
    let fields = split_fields("endblocker", tail, 4)?;
    let height = int_pair("endblocker height", fields[1])?;
    let module = pair_value("endblocker name", fields[2])?;
    let elapsed = duration_pair("endblocker cost", fields[3])?;

    Ok(Record::ConsensusEndBlocker {
        stamp,
        height,
        module: module.to_string(),
        elapsed,
    })
}

// `main height=N type=TX_TYPE cost=DURATION`
fn parse_handler(stamp: DateTime<Utc>, tail: &str) -> Result<Record, RecordError> {
    let fields = split_fields("handler", tail, 4)?;
    let height = int_pair("handler height", fields[1])?;
    let tx_type = pair_value("handler type", fields[2])?;
    let elapsed = duration_pair("handler cost", fields[3])?;

    Ok(Record::ConsensusHandler {
        stamp,
        height,
        tx_type: tx_type.to_string(),
        elapsed,
    })
}

// `main path=[PATH] cost=DURATION`; the height comes from the last commit.
fn parse_querier(
    ctx: &ParserContext,
    stamp: DateTime<Utc>,
    tail: &str,
) -> Result<Record, RecordError> {
    let fields = split_fields("querier", tail, 3)?;
    let path = pair_value("querier path", fields[1])?
        .trim_start_matches('[')
        .trim_end_matches(']');
    let elapsed = duration_pair("querier cost", fields[2])?;

    Ok(Record::ConsensusQuerier {
        stamp,
        height: ctx.current_height(),
        path: path.to_string(),
        elapsed,
    })
}

// =============================================================================
// Field helpers
// =============================================================================

fn split_fields<'a>(
    kind: &'static str,
    tail: &'a str,
    expected: usize,
) -> Result<Vec<&'a str>, RecordError> {
    let fields: Vec<&str> = tail.split(' ').collect();
    if fields.len() != expected {
        return Err(RecordError::FieldCount {
            kind,
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

/// Value of a `key=value` field with exactly one `=`.
fn pair_value<'a>(field: &'static str, pair: &'a str) -> Result<&'a str, RecordError> {
    let mut parts = pair.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(value), None) => Ok(value),
        _ => Err(RecordError::MalformedPair {
            field,
            pair: pair.to_string(),
        }),
    }
}

fn int_pair(field: &'static str, pair: &str) -> Result<u64, RecordError> {
    let value = pair_value(field, pair)?;
    value.parse().map_err(|source| RecordError::Int {
        field,
        raw: value.to_string(),
        source,
    })
}

fn duration_pair(field: &'static str, pair: &str) -> Result<Duration, RecordError> {
    let value = pair_value(field, pair)?;
    parse_duration(value).map_err(|source| RecordError::Duration {
        field,
        raw: value.to_string(),
        source,
    })
}
