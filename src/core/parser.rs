// blocklog - core/parser.rs
//
// Sequential parsing engine. One pass over the input, one line at a time:
// classify by prefix, parse, filter, group by class.
// Core layer: accepts BufRead objects, never touches the filesystem directly.
//
// Lines are handled strictly in order because a line may depend on context
// left behind by earlier lines (see `ParserContext`). The first malformed line
// aborts the whole run.

use crate::core::filter::FilterChain;
use crate::core::model::{ParserContext, Record};
use crate::core::registry::ClassifierRegistry;
use crate::util::constants::{DEBUG_MAX_LINE_PREVIEW, PROGRESS_LOG_INTERVAL};
use crate::util::error::ParseError;
use std::io::BufRead;

// =============================================================================
// Parse result
// =============================================================================

/// Records grouped by class. Groups keep the order in which their class was
/// first seen; records within a group keep line order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    groups: Vec<(String, Vec<Record>)>,
}

impl ParseResult {
    /// Append `record` to its class group, creating the group on first use.
    pub fn push(&mut self, record: Record) {
        let class = record.class();
        match self.groups.iter_mut().find(|(name, _)| name == class) {
            Some((_, records)) => records.push(record),
            None => {
                let name = class.to_string();
                self.groups.push((name, vec![record]));
            }
        }
    }

    /// Records of one class, if any survived.
    pub fn get(&self, class: &str) -> Option<&[Record]> {
        self.groups
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, records)| records.as_slice())
    }

    /// Class names in first-seen order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.groups
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of class groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Records across all groups.
    pub fn total_records(&self) -> usize {
        self.groups.iter().map(|(_, records)| records.len()).sum()
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Surviving records grouped by class.
    pub groups: ParseResult,
    /// Total lines read, filtered ones included.
    pub lines_processed: u64,
}

// =============================================================================
// Engine
// =============================================================================

/// Owns the registry and filter chain for any number of runs. Each run gets
/// its own fresh `ParserContext`.
#[derive(Debug, Default)]
pub struct Engine {
    registry: ClassifierRegistry,
    filters: FilterChain,
}

impl Engine {
    pub fn new(registry: ClassifierRegistry, filters: FilterChain) -> Self {
        Self { registry, filters }
    }

    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Parse every line of `reader`.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD before the
    /// line is classified.
    ///
    /// A line no prefix claims becomes `Record::Unknown`. A line a parser
    /// rejects aborts the run with `ParseError::MalformedLine` carrying its
    /// 1-based number; nothing parsed so far is returned.
    pub fn parse_reader<R: BufRead>(&self, mut reader: R) -> Result<ParseOutcome, ParseError> {
        let mut context = ParserContext::default();
        let mut groups = ParseResult::default();
        let mut lines_processed: u64 = 0;
        let mut excluded: u64 = 0;
        let mut buf: Vec<u8> = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ParseError::Io {
                    line_number: lines_processed,
                    source,
                })?;
            if read == 0 {
                break;
            }
            lines_processed += 1;
            let line_number = lines_processed;
            // Invalid UTF-8 is replaced, not fatal.
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\n', '\r']);

            let record = match self.registry.resolve(line) {
                Some(parser) => parser(&mut context, line_number, line).map_err(|source| {
                    tracing::debug!(
                        line_number,
                        line = %preview(line),
                        error = %source,
                        "Malformed line; aborting run"
                    );
                    ParseError::MalformedLine {
                        line_number,
                        source,
                    }
                })?,
                None => Record::Unknown {
                    text: line.to_string(),
                },
            };

            if self.filters.excludes(&record) {
                excluded += 1;
            } else {
                groups.push(record);
            }

            if line_number % PROGRESS_LOG_INTERVAL == 0 {
                tracing::debug!(lines = line_number, height = context.current_height(), "Parsing progress");
            }
        }

        tracing::debug!(
            lines = lines_processed,
            classes = groups.len(),
            records = groups.total_records(),
            excluded,
            "Parsing complete"
        );

        Ok(ParseOutcome {
            groups,
            lines_processed,
        })
    }

    /// Parse in-memory content.
    pub fn parse_str(&self, content: &str) -> Result<ParseOutcome, ParseError> {
        self.parse_reader(content.as_bytes())
    }
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter;
    use crate::core::model::Level;
    use crate::util::error::RecordError;
    use std::io::{self, Read};

    const COMMIT_42: &str = "I[2019-09-25|10:13:35.061] Committed state                              module=state height=42 txs=4 appHash=9C1E5A";
    const QUERY: &str = "I[2019-09-25|10:13:35.300] Query Time                                   module=main path=[custom/acc] cost=3ms";
    const ERROR: &str = "E[2019-09-25|10:13:35.500] Stopping peer for error                      module=p2p err=\"EOF\"";

    fn builtin_engine() -> Engine {
        Engine::new(
            ClassifierRegistry::with_builtin_formats("direct_").unwrap(),
            FilterChain::new(),
        )
    }

    fn querier_heights(result: &ParseResult) -> Vec<u64> {
        result
            .get("consensus.querier")
            .unwrap_or_default()
            .iter()
            .map(|r| match r {
                Record::ConsensusQuerier { height, .. } => *height,
                other => panic!("unexpected record {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_querier_reads_height_left_by_commit() {
        let content = format!("{QUERY}\n{COMMIT_42}\n{QUERY}\n");
        let outcome = builtin_engine().parse_str(&content).unwrap();
        assert_eq!(outcome.lines_processed, 3);
        assert_eq!(querier_heights(&outcome.groups), vec![0, 42]);
    }

    #[test]
    fn test_each_run_starts_with_fresh_context() {
        let engine = builtin_engine();
        engine.parse_str(&format!("{COMMIT_42}\n")).unwrap();
        let second = engine.parse_str(&format!("{QUERY}\n")).unwrap();
        assert_eq!(querier_heights(&second.groups), vec![0]);
    }

    #[test]
    fn test_error_before_commit_reports_zero_height() {
        let outcome = builtin_engine().parse_str(ERROR).unwrap();
        match &outcome.groups.get("consensus.error").unwrap()[0] {
            Record::ConsensusError {
                height,
                line_number,
                ..
            } => {
                assert_eq!(*height, 0);
                assert_eq!(*line_number, 1);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_unknown_lines_are_kept_verbatim() {
        let outcome = builtin_engine()
            .parse_str("starting node\r\n\nok")
            .unwrap();
        let unknown = outcome.groups.get("unknown").unwrap();
        assert_eq!(unknown.len(), 3);
        assert_eq!(unknown[0].format(), vec!["starting node".to_string()]);
        assert_eq!(unknown[1].format(), vec![String::new()]);
        assert_eq!(unknown[2].format(), vec!["ok".to_string()]);
    }

    #[test]
    fn test_groups_keep_first_seen_and_line_order() {
        let content = format!(
            "direct_kv, put, 0, put, 5, 3ms\n{COMMIT_42}\ndirect_kv, get, 5, get, 5, 1ms\ndirect_kv, put, 5, put, 5, 2ms\n"
        );
        let outcome = builtin_engine().parse_str(&content).unwrap();
        let classes: Vec<_> = outcome.groups.classes().collect();
        assert_eq!(classes, vec!["put", "consensus.commit", "get"]);
        let puts = outcome.groups.get("put").unwrap();
        assert_eq!(puts[0].format()[2], "0");
        assert_eq!(puts[1].format()[2], "5");
        assert_eq!(outcome.groups.total_records(), 4);
    }

    #[test]
    fn test_exclude_everything_still_counts_lines() {
        let mut filters = FilterChain::new();
        filters.register(Box::new(|_: &Record| true));
        let engine = Engine::new(
            ClassifierRegistry::with_builtin_formats("direct_").unwrap(),
            filters,
        );
        let content = format!("{COMMIT_42}\nhello\n{QUERY}\n");
        let outcome = engine.parse_str(&content).unwrap();
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.lines_processed, 3);
    }

    #[test]
    fn test_filtered_commit_still_updates_context() {
        let mut filters = FilterChain::new();
        filters.register(filter::classes(["consensus.commit"]));
        let engine = Engine::new(
            ClassifierRegistry::with_builtin_formats("direct_").unwrap(),
            filters,
        );
        let outcome = engine.parse_str(&format!("{COMMIT_42}\n{QUERY}\n")).unwrap();
        assert!(outcome.groups.get("consensus.commit").is_none());
        assert_eq!(querier_heights(&outcome.groups), vec![42]);
    }

    #[test]
    fn test_level_filter() {
        let mut filters = FilterChain::new();
        filters.register(filter::below_level(Level::Error));
        let engine = Engine::new(
            ClassifierRegistry::with_builtin_formats("direct_").unwrap(),
            filters,
        );
        let outcome = engine
            .parse_str(&format!("noise\n{COMMIT_42}\n{ERROR}\n"))
            .unwrap();
        let classes: Vec<_> = outcome.groups.classes().collect();
        assert_eq!(classes, vec!["consensus.error"]);
        match &outcome.groups.get("consensus.error").unwrap()[0] {
            Record::ConsensusError { height, .. } => assert_eq!(*height, 42),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_malformed_line_aborts_with_line_number() {
        let content = format!(
            "{COMMIT_42}\nI[2019-09-25|10:13:35.061] Committed state height=43\n{QUERY}\n"
        );
        let err = builtin_engine().parse_str(&content).unwrap_err();
        assert_eq!(err.line_number(), 2);
        assert!(matches!(
            err,
            ParseError::MalformedLine {
                line_number: 2,
                source: RecordError::MalformedItem { .. }
            }
        ));
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_benchmark_field_count_error_cites_line() {
        let content = "hello\ndirect_, kv, get, 10, 20, 12ms\n";
        let err = builtin_engine().parse_str(content).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine {
                line_number: 2,
                source: RecordError::FieldCount { found: 5, .. }
            }
        ));
    }

    #[test]
    fn test_blank_benchmark_method_aborts_with_line_number() {
        let err = builtin_engine()
            .parse_str("plain text\ndirect_kv, , 1, x, 2, 3ms\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine {
                line_number: 2,
                source: RecordError::EmptyField { field: "method" }
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_line_becomes_unknown() {
        let mut input: Vec<u8> = b"peer sent \xff\xfe bytes\n".to_vec();
        input.extend_from_slice(COMMIT_42.as_bytes());
        input.push(b'\n');

        let outcome = builtin_engine().parse_reader(input.as_slice()).unwrap();
        assert_eq!(outcome.lines_processed, 2);
        let unknown = outcome.groups.get("unknown").unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(
            unknown[0].format(),
            vec!["peer sent \u{FFFD}\u{FFFD} bytes".to_string()]
        );
        assert_eq!(outcome.groups.get("consensus.commit").map(<[Record]>::len), Some(1));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    #[test]
    fn test_read_failure_is_io_error() {
        let err = builtin_engine()
            .parse_reader(io::BufReader::new(FailingReader))
            .unwrap_err();
        assert!(matches!(err, ParseError::Io { line_number: 0, .. }));
    }

    #[test]
    fn test_empty_input() {
        let outcome = builtin_engine().parse_str("").unwrap();
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.lines_processed, 0);
    }
}
