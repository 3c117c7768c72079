// blocklog - core/registry.rs
//
// Prefix classifier registry: maps literal line prefixes to parse functions.
//
// Resolution walks the prefixes in registration order and takes the first
// one the line starts with, so the outcome never depends on container
// iteration order, even when one prefix is a prefix of another.

use crate::core::formats::{benchmark, consensus};
use crate::core::model::{ParserContext, Record};
use crate::util::constants::{CONSENSUS_PREFIX_ERROR, CONSENSUS_PREFIX_INFO};
use crate::util::error::{RecordError, RegistryError};

/// Parses one line that starts with the registered prefix.
///
/// Arguments are the run's context, the 1-based line number, and the full
/// line text (prefix included).
pub type ParseFn =
    Box<dyn Fn(&mut ParserContext, u64, &str) -> Result<Record, RecordError> + Send + Sync>;

/// Ordered `(prefix, parser)` pairs with unique prefixes.
#[derive(Default)]
pub struct ClassifierRegistry {
    entries: Vec<(String, ParseFn)>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the consensus (`E[`, `I[`) and benchmark formats.
    pub fn with_builtin_formats(benchmark_prefix: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(CONSENSUS_PREFIX_ERROR, Box::new(consensus::parse_error_line))?;
        registry.register(CONSENSUS_PREFIX_INFO, Box::new(consensus::parse_info_line))?;
        let prefix = benchmark_prefix.to_string();
        registry.register(
            benchmark_prefix,
            Box::new(move |_ctx: &mut ParserContext, line_number: u64, line: &str| {
                benchmark::parse_line(&prefix, line_number, line)
            }),
        )?;
        Ok(registry)
    }

    /// Add a parser for `prefix`.
    ///
    /// Fails without touching the registry if the prefix is empty or already
    /// owned by another parser.
    pub fn register(&mut self, prefix: &str, parser: ParseFn) -> Result<(), RegistryError> {
        if prefix.is_empty() {
            return Err(RegistryError::EmptyPrefix);
        }
        if self.entries.iter().any(|(p, _)| p == prefix) {
            return Err(RegistryError::DuplicatePrefix {
                prefix: prefix.to_string(),
            });
        }
        tracing::debug!(prefix, position = self.entries.len(), "Prefix classifier registered");
        self.entries.push((prefix.to_string(), parser));
        Ok(())
    }

    /// First registered parser whose prefix starts `line`.
    pub fn resolve(&self, line: &str) -> Option<&ParseFn> {
        self.entries
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, parser)| parser)
    }

    /// Registered prefixes in resolution order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.prefixes()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagging(tag: &'static str) -> ParseFn {
        Box::new(move |_ctx: &mut ParserContext, _line_number: u64, _line: &str| {
            Ok(Record::Unknown {
                text: tag.to_string(),
            })
        })
    }

    fn resolve_tag(registry: &ClassifierRegistry, line: &str) -> Option<String> {
        let mut ctx = ParserContext::default();
        registry
            .resolve(line)
            .map(|parser| parser(&mut ctx, 1, line).unwrap().canonical_text())
    }

    #[test]
    fn test_duplicate_prefix_rejected_and_first_kept() {
        let mut registry = ClassifierRegistry::new();
        registry.register("X[", tagging("first")).unwrap();
        let err = registry.register("X[", tagging("second")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicatePrefix {
                prefix: "X[".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(resolve_tag(&registry, "X[abc").as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let mut registry = ClassifierRegistry::new();
        assert_eq!(
            registry.register("", tagging("any")).unwrap_err(),
            RegistryError::EmptyPrefix
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolution_follows_registration_order() {
        let mut registry = ClassifierRegistry::new();
        registry.register("ab", tagging("short")).unwrap();
        registry.register("abc", tagging("long")).unwrap();
        assert_eq!(resolve_tag(&registry, "abcdef").as_deref(), Some("short"));

        let mut reversed = ClassifierRegistry::new();
        reversed.register("abc", tagging("long")).unwrap();
        reversed.register("ab", tagging("short")).unwrap();
        assert_eq!(resolve_tag(&reversed, "abcdef").as_deref(), Some("long"));
        assert_eq!(resolve_tag(&reversed, "abX").as_deref(), Some("short"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let registry = ClassifierRegistry::with_builtin_formats("direct_").unwrap();
        assert!(registry.resolve("plain text").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn test_builtin_prefixes_in_order() {
        let registry = ClassifierRegistry::with_builtin_formats("bench_").unwrap();
        let prefixes: Vec<_> = registry.prefixes().collect();
        assert_eq!(prefixes, vec!["E[", "I[", "bench_"]);
    }

    #[test]
    fn test_builtin_rejects_colliding_benchmark_prefix() {
        let err = ClassifierRegistry::with_builtin_formats("I[").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePrefix { .. }));
    }
}
