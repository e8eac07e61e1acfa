//! Vulnerability pattern definitions

use flowlint_core::{AnalysisError, Result};
use serde::Deserialize;
use std::collections::HashSet;

/// The policy input shape exactly as received (§6): three string sets and
/// an `implicit` flag given as the literal `"yes"`/`"no"`, not a native
/// JSON boolean. Deserializing into this intermediate struct first means a
/// missing key surfaces as the ordinary `serde_json` "missing field"
/// message, which is what callers of [`Pattern::from_json`] see wrapped in
/// [`AnalysisError::Json`].
#[derive(Debug, Clone, Deserialize)]
struct RawPattern {
    vulnerability: String,
    sources: Vec<String>,
    sanitizers: Vec<String>,
    sinks: Vec<String>,
    implicit: String,
}

/// An immutable vulnerability descriptor: `(vuln_name, sources,
/// sanitizers, sinks, implicit)`.
///
/// Equality and hashing are on `vuln_name` alone — a `Policy` already
/// enforces uniqueness of that field, so it identifies a pattern as well
/// as comparing the full contents would, and it's what lets `Policy`
/// index patterns into `HashSet<&Pattern>` query results.
#[derive(Debug, Clone)]
pub struct Pattern {
    vuln_name: String,
    sources: HashSet<String>,
    sanitizers: HashSet<String>,
    sinks: HashSet<String>,
    implicit: bool,
}

impl Pattern {
    pub fn new(
        vuln_name: impl Into<String>,
        sources: HashSet<String>,
        sanitizers: HashSet<String>,
        sinks: HashSet<String>,
        implicit: bool,
    ) -> Self {
        Self {
            vuln_name: vuln_name.into(),
            sources,
            sanitizers,
            sinks,
            implicit,
        }
    }

    /// Parse one policy entry from its JSON value. `implicit` is true iff
    /// it is the literal string `"yes"` — any other value, including a
    /// typo, is false rather than an error (the policy's own schema
    /// doesn't constrain the field to an enum).
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let raw: RawPattern = serde_json::from_value(value.clone())?;
        Ok(Self {
            vuln_name: raw.vulnerability,
            sources: raw.sources.into_iter().collect(),
            sanitizers: raw.sanitizers.into_iter().collect(),
            sinks: raw.sinks.into_iter().collect(),
            implicit: raw.implicit == "yes",
        })
    }

    pub fn vuln_name(&self) -> &str {
        &self.vuln_name
    }

    pub fn sources(&self) -> &HashSet<String> {
        &self.sources
    }

    pub fn sanitizers(&self) -> &HashSet<String> {
        &self.sanitizers
    }

    pub fn sinks(&self) -> &HashSet<String> {
        &self.sinks
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn is_source(&self, name: &str) -> bool {
        self.sources.contains(name)
    }

    pub fn is_sanitizer(&self, name: &str) -> bool {
        self.sanitizers.contains(name)
    }

    pub fn is_sink(&self, name: &str) -> bool {
        self.sinks.contains(name)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.vuln_name == other.vuln_name
    }
}

impl Eq for Pattern {}

impl std::hash::Hash for Pattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.vuln_name.hash(state);
    }
}

/// Parse a whole policy array (§6), failing fast on the first malformed
/// entry.
pub fn parse_patterns(value: &serde_json::Value) -> Result<Vec<Pattern>> {
    let entries = value.as_array().ok_or_else(|| {
        AnalysisError::policy_error("policy input must be a JSON array of pattern objects")
    })?;
    entries.iter().map(Pattern::from_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_is_true_only_for_literal_yes() {
        let yes = Pattern::from_json(&json!({
            "vulnerability": "v", "sources": [], "sanitizers": [], "sinks": [], "implicit": "yes"
        }))
        .unwrap();
        assert!(yes.is_implicit());

        let no = Pattern::from_json(&json!({
            "vulnerability": "v", "sources": [], "sanitizers": [], "sinks": [], "implicit": "no"
        }))
        .unwrap();
        assert!(!no.is_implicit());

        let typo = Pattern::from_json(&json!({
            "vulnerability": "v", "sources": [], "sanitizers": [], "sinks": [], "implicit": "Yes"
        }))
        .unwrap();
        assert!(!typo.is_implicit());
    }

    #[test]
    fn missing_key_is_rejected() {
        let result = Pattern::from_json(&json!({
            "vulnerability": "v", "sources": [], "sanitizers": [], "implicit": "no"
        }));
        assert!(result.is_err());
    }
}
