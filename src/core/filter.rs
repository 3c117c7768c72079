// blocklog - core/filter.rs
//
// Exclusion filter chain. A record is dropped when ANY registered predicate
// returns true; predicates run in registration order and the chain stops at
// the first match.
// Core layer: pure logic, no I/O.

use crate::core::model::{Level, Record};
use crate::util::constants::MAX_REGEX_PATTERN_LENGTH;
use crate::util::error::FilterError;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;

/// Returns true when the record must be removed from the result.
pub type ExclusionPredicate = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// Ordered exclusion predicates.
#[derive(Default)]
pub struct FilterChain {
    predicates: Vec<ExclusionPredicate>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one more exclusion predicate.
    pub fn register(&mut self, predicate: ExclusionPredicate) {
        self.predicates.push(predicate);
    }

    /// True if any predicate excludes `record`.
    pub fn excludes(&self, record: &Record) -> bool {
        self.predicates.iter().any(|excluded| excluded(record))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

// =============================================================================
// Built-in predicates
// =============================================================================

/// Exclude records not stamped on `date` (UTC). Records without a stamp
/// cannot be placed on any date and are excluded too.
pub fn outside_date(date: NaiveDate) -> ExclusionPredicate {
    Box::new(move |record: &Record| match record.stamp() {
        Some(stamp) => stamp.date_naive() != date,
        None => true,
    })
}

/// Exclude records whose class is listed.
pub fn classes<I, S>(names: I) -> ExclusionPredicate
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: HashSet<String> = names.into_iter().map(Into::into).collect();
    Box::new(move |record: &Record| names.contains(record.class()))
}

/// Exclude records less severe than `min`.
pub fn below_level(min: Level) -> ExclusionPredicate {
    Box::new(move |record: &Record| record.level() < min)
}

/// Exclude records whose reconstructed line matches `pattern`.
pub fn matching(pattern: &str) -> Result<ExclusionPredicate, FilterError> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(FilterError::RegexTooLong {
            length: pattern.len(),
            max_length: MAX_REGEX_PATTERN_LENGTH,
        });
    }
    let regex = Regex::new(pattern).map_err(|e| FilterError::InvalidRegex {
        pattern: pattern.to_string(),
        source: e,
    })?;
    Ok(Box::new(move |record: &Record| regex.is_match(&record.canonical_text())))
}
