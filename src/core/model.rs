// blocklog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary of the registry, the format parsers,
// the filter chain, and the exporters.

use crate::util::constants::{
    CLASS_CONSENSUS_APPLY, CLASS_CONSENSUS_COMMIT, CLASS_CONSENSUS_END_BLOCKER,
    CLASS_CONSENSUS_ERROR, CLASS_CONSENSUS_HANDLER, CLASS_CONSENSUS_IGNORED,
    CLASS_CONSENSUS_QUERIER, CLASS_UNKNOWN, CONSENSUS_EVENT_WIDTH, CONSENSUS_STAMP_FORMAT,
    EVENT_APPLY, EVENT_COMMIT, EVENT_END_BLOCKER, EVENT_HANDLER, EVENT_QUERIER,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

// =============================================================================
// Level
// =============================================================================

/// Severity of a record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Level {
    #[default]
    None,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Returns all variants in ascending severity.
    pub fn all() -> &'static [Level] {
        &[
            Level::None,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
        ]
    }

    /// Lower-case label; empty for `None`.
    pub fn label(&self) -> &'static str {
        match self {
            Level::None => "",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Case-insensitive inverse of `label`. `"none"` maps to `Level::None`.
    pub fn from_label(label: &str) -> Option<Level> {
        match label.trim().to_lowercase().as_str() {
            "" | "none" => Some(Level::None),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Parser context
// =============================================================================

/// State carried from one consensus line to the next within a single run.
///
/// Only a successfully parsed commit line moves it forward; error, querier
/// and ignored lines read the height, apply lines read the stamp. The engine
/// creates a fresh context per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserContext {
    current_height: u64,
    current_stamp: Option<DateTime<Utc>>,
}

impl ParserContext {
    /// Height of the most recent commit, 0 before the first one.
    pub fn current_height(&self) -> u64 {
        self.current_height
    }

    /// Stamp of the most recent commit.
    pub fn current_stamp(&self) -> Option<DateTime<Utc>> {
        self.current_stamp
    }

    pub(crate) fn commit(&mut self, height: u64, stamp: DateTime<Utc>) {
        self.current_height = height;
        self.current_stamp = Some(stamp);
    }
}

// =============================================================================
// Record
// =============================================================================

/// One classified log line.
///
/// Every variant answers the same questions (`class`, `level`, `stamp`,
/// `header`, `format`, `canonical_text`), so grouping and export never need
/// to know which emitter produced a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A line no registered prefix claimed, kept verbatim.
    Unknown { text: String },

    /// One benchmark-store measurement.
    Benchmark {
        prefix: String,
        backend: String,
        method: String,
        existing: u64,
        count: u64,
        elapsed: Duration,
    },

    /// An `E[` consensus line.
    ConsensusError {
        line_number: u64,
        stamp: DateTime<Utc>,
        height: u64,
        event: String,
        module: String,
        detail: String,
    },

    /// `Executed block`: a block was applied.
    ConsensusApply {
        stamp: DateTime<Utc>,
        height: u64,
        valid_txs: u64,
        invalid_txs: u64,
        /// Time since the previous commit line.
        elapsed: Duration,
    },

    /// `Committed state`: the block at `height` was committed.
    ConsensusCommit {
        stamp: DateTime<Utc>,
        height: u64,
        txs: u64,
        app_hash: String,
    },

    /// `EndBlocker Time`: cost of one module's end blocker.
    ConsensusEndBlocker {
        stamp: DateTime<Utc>,
        height: u64,
        module: String,
        elapsed: Duration,
    },

    /// `Deliver Time`: cost of delivering one transaction.
    ConsensusHandler {
        stamp: DateTime<Utc>,
        height: u64,
        tx_type: String,
        elapsed: Duration,
    },

    /// `Query Time`: cost of one query. The line has no height of its own.
    ConsensusQuerier {
        stamp: DateTime<Utc>,
        height: u64,
        path: String,
        elapsed: Duration,
    },

    /// An `I[` line whose event name no tail parser handles.
    ConsensusIgnored {
        stamp: DateTime<Utc>,
        height: u64,
        event: String,
        tail: String,
    },
}

impl Record {
    /// Grouping tag of this record. Never empty: the benchmark parser rejects
    /// lines with a blank method.
    pub fn class(&self) -> &str {
        match self {
            Record::Unknown { .. } => CLASS_UNKNOWN,
            Record::Benchmark { method, .. } => method.as_str(),
            Record::ConsensusError { .. } => CLASS_CONSENSUS_ERROR,
            Record::ConsensusApply { .. } => CLASS_CONSENSUS_APPLY,
            Record::ConsensusCommit { .. } => CLASS_CONSENSUS_COMMIT,
            Record::ConsensusEndBlocker { .. } => CLASS_CONSENSUS_END_BLOCKER,
            Record::ConsensusHandler { .. } => CLASS_CONSENSUS_HANDLER,
            Record::ConsensusQuerier { .. } => CLASS_CONSENSUS_QUERIER,
            Record::ConsensusIgnored { .. } => CLASS_CONSENSUS_IGNORED,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Record::Unknown { .. } => Level::None,
            Record::ConsensusError { .. } => Level::Error,
            _ => Level::Info,
        }
    }

    /// Timestamp carried by the line; `None` when the format has none.
    pub fn stamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Record::Unknown { .. } | Record::Benchmark { .. } => None,
            Record::ConsensusError { stamp, .. }
            | Record::ConsensusApply { stamp, .. }
            | Record::ConsensusCommit { stamp, .. }
            | Record::ConsensusEndBlocker { stamp, .. }
            | Record::ConsensusHandler { stamp, .. }
            | Record::ConsensusQuerier { stamp, .. }
            | Record::ConsensusIgnored { stamp, .. } => Some(*stamp),
        }
    }

    /// Export column names, aligned with `format`.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Record::Unknown { .. } => &["data"],
            Record::Benchmark { .. } => &["backend", "method", "existing", "count", "cost_ms"],
            Record::ConsensusError { .. } => &["line", "height", "event", "module", "detail"],
            Record::ConsensusApply { .. } => {
                &["height", "stamp", "valid_txs", "invalid_txs", "elapsed_ms"]
            }
            Record::ConsensusCommit { .. } => &["height", "stamp", "txs", "app_hash"],
            Record::ConsensusEndBlocker { .. } => &["height", "module", "cost_ms"],
            Record::ConsensusHandler { .. } => &["height", "type", "cost_ms"],
            Record::ConsensusQuerier { .. } => &["height", "path", "cost_ms"],
            Record::ConsensusIgnored { .. } => &["height", "event", "tail"],
        }
    }

    /// Export row values, aligned with `header`.
    pub fn format(&self) -> Vec<String> {
        match self {
            Record::Unknown { text } => vec![text.clone()],
            Record::Benchmark {
                backend,
                method,
                existing,
                count,
                elapsed,
                ..
            } => vec![
                backend.clone(),
                method.clone(),
                existing.to_string(),
                count.to_string(),
                millis(elapsed),
            ],
            Record::ConsensusError {
                line_number,
                height,
                event,
                module,
                detail,
                ..
            } => vec![
                line_number.to_string(),
                height.to_string(),
                event.clone(),
                module.clone(),
                detail.clone(),
            ],
            Record::ConsensusApply {
                stamp,
                height,
                valid_txs,
                invalid_txs,
                elapsed,
            } => vec![
                height.to_string(),
                rfc3339(stamp),
                valid_txs.to_string(),
                invalid_txs.to_string(),
                millis(elapsed),
            ],
            Record::ConsensusCommit {
                stamp,
                height,
                txs,
                app_hash,
            } => vec![
                height.to_string(),
                rfc3339(stamp),
                txs.to_string(),
                app_hash.clone(),
            ],
            Record::ConsensusEndBlocker {
                height,
                module,
                elapsed,
                ..
            } => vec![height.to_string(), module.clone(), millis(elapsed)],
            Record::ConsensusHandler {
                height,
                tx_type,
                elapsed,
                ..
            } => vec![height.to_string(), tx_type.clone(), millis(elapsed)],
            Record::ConsensusQuerier {
                height,
                path,
                elapsed,
                ..
            } => vec![height.to_string(), path.clone(), millis(elapsed)],
            Record::ConsensusIgnored {
                height, event, tail, ..
            } => vec![height.to_string(), event.clone(), tail.clone()],
        }
    }

    /// Best-effort reconstruction of the source line. Not byte-identical:
    /// padding is normalised and durations are printed in whole milliseconds.
    pub fn canonical_text(&self) -> String {
        match self {
            Record::Unknown { text } => text.clone(),
            Record::Benchmark {
                prefix,
                backend,
                method,
                existing,
                count,
                elapsed,
            } => format!(
                "{prefix}{backend}, {method}, {existing}, {method}, {count}, {}ms",
                elapsed.as_millis()
            ),
            Record::ConsensusError {
                stamp,
                event,
                module,
                detail,
                ..
            } => format!(
                "E[{}] {event:<width$} module={module} err=\"{detail}\"",
                stamp.format(CONSENSUS_STAMP_FORMAT),
                width = CONSENSUS_EVENT_WIDTH
            ),
            Record::ConsensusApply {
                stamp,
                height,
                valid_txs,
                invalid_txs,
                ..
            } => format!(
                "{} module=state height={height} validTxs={valid_txs} invalidTxs={invalid_txs}",
                info_head(stamp, EVENT_APPLY)
            ),
            Record::ConsensusCommit {
                stamp,
                height,
                txs,
                app_hash,
            } => format!(
                "{} module=state height={height} txs={txs} appHash={app_hash}",
                info_head(stamp, EVENT_COMMIT)
            ),
            Record::ConsensusEndBlocker {
                stamp,
                height,
                module,
                elapsed,
            } => format!(
                "{} module=main height={height} name={module} cost={}ms",
                info_head(stamp, EVENT_END_BLOCKER),
                elapsed.as_millis()
            ),
            Record::ConsensusHandler {
                stamp,
                height,
                tx_type,
                elapsed,
            } => format!(
                "{} module=main height={height} type={tx_type} cost={}ms",
                info_head(stamp, EVENT_HANDLER),
                elapsed.as_millis()
            ),
            Record::ConsensusQuerier {
                stamp,
                path,
                elapsed,
                ..
            } => format!(
                "{} module=main path=[{path}] cost={}ms",
                info_head(stamp, EVENT_QUERIER),
                elapsed.as_millis()
            ),
            Record::ConsensusIgnored {
                stamp, event, tail, ..
            } => format!("{} module={tail}", info_head(stamp, event)),
        }
    }
}

fn info_head(stamp: &DateTime<Utc>, event: &str) -> String {
    format!(
        "I[{}] {event:<width$}",
        stamp.format(CONSENSUS_STAMP_FORMAT),
        width = CONSENSUS_EVENT_WIDTH
    )
}

fn rfc3339(stamp: &DateTime<Utc>) -> String {
    stamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn millis(d: &Duration) -> String {
    d.as_millis().to_string()
}
