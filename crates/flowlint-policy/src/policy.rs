//! The ordered collection of patterns, with indexed queries

use crate::pattern::{parse_patterns, Pattern};
use flowlint_core::{AnalysisError, Result};
use std::collections::{HashMap, HashSet};

/// An ordered collection of [`Pattern`]s with indices by source, sanitizer
/// and sink name so that the hot-path queries in §4.1 don't rescan every
/// pattern on every AST node visited.
#[derive(Debug, Clone)]
pub struct Policy {
    patterns: Vec<Pattern>,
    by_source: HashMap<String, HashSet<usize>>,
    by_sanitizer: HashMap<String, HashSet<usize>>,
    by_sink: HashMap<String, HashSet<usize>>,
}

impl Policy {
    /// Build a policy from its patterns. `vuln_name` must be unique across
    /// patterns; a duplicate is a malformed policy.
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        let mut seen = HashSet::new();
        for pattern in &patterns {
            if !seen.insert(pattern.vuln_name().to_string()) {
                return Err(AnalysisError::policy_error(format!(
                    "duplicate vulnerability name in policy: {}",
                    pattern.vuln_name()
                )));
            }
        }

        let mut by_source: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut by_sanitizer: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut by_sink: HashMap<String, HashSet<usize>> = HashMap::new();

        for (idx, pattern) in patterns.iter().enumerate() {
            for name in pattern.sources() {
                by_source.entry(name.clone()).or_default().insert(idx);
            }
            for name in pattern.sanitizers() {
                by_sanitizer.entry(name.clone()).or_default().insert(idx);
            }
            for name in pattern.sinks() {
                by_sink.entry(name.clone()).or_default().insert(idx);
            }
        }

        Ok(Self {
            patterns,
            by_source,
            by_sanitizer,
            by_sink,
        })
    }

    /// Parse a policy directly from its JSON array form (§6).
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Self::new(parse_patterns(value)?)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn patterns_by_source(&self, name: &str) -> HashSet<&Pattern> {
        self.by_source
            .get(name)
            .into_iter()
            .flatten()
            .map(|&idx| &self.patterns[idx])
            .collect()
    }

    pub fn patterns_by_sanitizer(&self, name: &str) -> HashSet<&Pattern> {
        self.by_sanitizer
            .get(name)
            .into_iter()
            .flatten()
            .map(|&idx| &self.patterns[idx])
            .collect()
    }

    pub fn vulns(&self) -> HashSet<String> {
        self.patterns.iter().map(|p| p.vuln_name().to_string()).collect()
    }

    pub fn vulns_by_source(&self, name: &str) -> HashSet<String> {
        self.patterns_by_source(name)
            .into_iter()
            .map(|p| p.vuln_name().to_string())
            .collect()
    }

    pub fn vulns_by_sanitizer(&self, name: &str) -> HashSet<String> {
        self.patterns_by_sanitizer(name)
            .into_iter()
            .map(|p| p.vuln_name().to_string())
            .collect()
    }

    pub fn vulns_by_sink(&self, name: &str) -> HashSet<String> {
        self.by_sink
            .get(name)
            .into_iter()
            .flatten()
            .map(|&idx| self.patterns[idx].vuln_name().to_string())
            .collect()
    }

    /// Vulns whose pattern does *not* name `node_name` as a sink.
    pub fn non_sink_vulns(&self, node_name: &str) -> HashSet<String> {
        let sinks = self.vulns_by_sink(node_name);
        self.vulns().difference(&sinks).cloned().collect()
    }

    pub fn non_implicit_vulns(&self) -> HashSet<String> {
        self.patterns
            .iter()
            .filter(|p| !p.is_implicit())
            .map(|p| p.vuln_name().to_string())
            .collect()
    }

    pub fn implicit_vulns(&self) -> HashSet<String> {
        self.patterns
            .iter()
            .filter(|p| p.is_implicit())
            .map(|p| p.vuln_name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_policy() -> Policy {
        Policy::from_json(&json!([
            {"vulnerability": "A", "sources": ["a"], "sanitizers": ["clean"], "sinks": ["sink"], "implicit": "no"},
            {"vulnerability": "B", "sources": ["b"], "sanitizers": [], "sinks": ["sink"], "implicit": "yes"},
        ]))
        .unwrap()
    }

    #[test]
    fn indexes_patterns_by_source_sanitizer_sink() {
        let policy = sample_policy();
        assert_eq!(policy.vulns_by_source("a"), HashSet::from(["A".to_string()]));
        assert_eq!(policy.vulns_by_sanitizer("clean"), HashSet::from(["A".to_string()]));
        assert_eq!(
            policy.vulns_by_sink("sink"),
            HashSet::from(["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn splits_implicit_and_non_implicit_vulns() {
        let policy = sample_policy();
        assert_eq!(policy.implicit_vulns(), HashSet::from(["B".to_string()]));
        assert_eq!(policy.non_implicit_vulns(), HashSet::from(["A".to_string()]));
    }

    #[test]
    fn non_sink_vulns_excludes_matching_sink() {
        let policy = sample_policy();
        assert_eq!(policy.non_sink_vulns("sink"), HashSet::new());
        assert_eq!(
            policy.non_sink_vulns("other"),
            HashSet::from(["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn duplicate_vuln_name_is_rejected() {
        let result = Policy::from_json(&json!([
            {"vulnerability": "A", "sources": [], "sanitizers": [], "sinks": [], "implicit": "no"},
            {"vulnerability": "A", "sources": [], "sanitizers": [], "sinks": [], "implicit": "no"},
        ]));
        assert!(result.is_err());
    }
}
