//! `Vulnerabilities`: `vuln_name -> list of (Label, sink_node)` observations.

use crate::label::Label;
use crate::multilabel::MultiLabel;
use crate::policy_queries::illegal_flows_multilabel;
use flowlint_ast::Node;
use flowlint_policy::Policy;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Vulnerabilities {
    map: HashMap<String, Vec<(Label, Node)>>,
}

impl Vulnerabilities {
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    pub fn get(&self, vuln_name: &str) -> &[(Label, Node)] {
        self.map.get(vuln_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vulns(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// Restrict `ml` to the vulns whose pattern names `sink.name()` as a
    /// sink, and record `(label, sink)` for each, unless an identical
    /// observation is already present.
    pub fn add_vulnerability(&mut self, policy: &Policy, ml: &MultiLabel, sink: &Node) {
        let restricted = illegal_flows_multilabel(policy, ml, sink);
        for vuln in restricted.vulns() {
            let Some(label) = restricted.get(&vuln) else {
                continue;
            };
            let entries = self.map.entry(vuln.clone()).or_default();
            if !entries.iter().any(|(l, s)| l == label && s == sink) {
                entries.push((label.clone(), sink.clone()));
            }
        }
    }

    /// Union observation lists, preserving `self`'s insertion order then
    /// appending any new entries from `other`.
    pub fn conciliate(&mut self, other: &Vulnerabilities) {
        for (vuln, other_entries) in &other.map {
            let entries = self.map.entry(vuln.clone()).or_default();
            for (label, sink) in other_entries {
                if !entries.iter().any(|(l, s)| l == label && s == sink) {
                    entries.push((label.clone(), sink.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> Policy {
        Policy::from_json(&json!([
            {"vulnerability": "v", "sources": ["a"], "sanitizers": [], "sinks": ["sink"], "implicit": "no"},
        ]))
        .unwrap()
    }

    #[test]
    fn duplicate_observation_is_not_recorded_twice() {
        let policy = policy();
        let patterns = policy.patterns_by_source("a");
        let ml = MultiLabel::new(&patterns, &[Label::for_source(Node::new("a", 1))]);
        let sink = Node::new("sink", 2);

        let mut v = Vulnerabilities::empty();
        v.add_vulnerability(&policy, &ml, &sink);
        v.add_vulnerability(&policy, &ml, &sink);

        assert_eq!(v.get("v").len(), 1);
    }
}
