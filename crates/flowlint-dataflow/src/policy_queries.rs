//! Policy queries that need [`MultiLabel`], and so can't live on [`Policy`]
//! itself without a circular crate dependency (§4.1).

use crate::multilabel::MultiLabel;
use flowlint_ast::Node;
use flowlint_policy::Policy;

/// Copy of `ml` with every vuln whose pattern does not declare
/// `node.name()` as a sink removed.
pub fn illegal_flows_multilabel(policy: &Policy, ml: &MultiLabel, node: &Node) -> MultiLabel {
    let sinks = policy.vulns_by_sink(node.name());
    restrict(ml, &sinks)
}

/// Copy of `ml` restricted to patterns with `implicit = true`.
pub fn implicit_patterns_multilabel(policy: &Policy, ml: &MultiLabel) -> MultiLabel {
    let implicit = policy.implicit_vulns();
    restrict(ml, &implicit)
}

fn restrict(ml: &MultiLabel, keep: &std::collections::HashSet<String>) -> MultiLabel {
    let mut result = MultiLabel::empty();
    for vuln in ml.vulns() {
        if keep.contains(&vuln) {
            if let Some(label) = ml.get(&vuln) {
                result = MultiLabel::combine(&result, &single(&vuln, label.clone()));
            }
        }
    }
    result
}

fn single(vuln: &str, label: crate::label::Label) -> MultiLabel {
    let mut m = MultiLabel::empty();
    m.install(vuln, label);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;
    use serde_json::json;

    fn policy() -> Policy {
        Policy::from_json(&json!([
            {"vulnerability": "A", "sources": ["a"], "sanitizers": [], "sinks": ["sink"], "implicit": "no"},
            {"vulnerability": "B", "sources": ["a"], "sanitizers": [], "sinks": ["other"], "implicit": "yes"},
        ]))
        .unwrap()
    }

    #[test]
    fn illegal_flows_keeps_only_matching_sink() {
        let policy = policy();
        let patterns = policy.patterns_by_source("a");
        let ml = MultiLabel::new(&patterns, &[Label::for_source(Node::new("a", 1))]);
        let restricted = illegal_flows_multilabel(&policy, &ml, &Node::new("sink", 1));
        assert_eq!(restricted.vulns(), std::collections::HashSet::from(["A".to_string()]));
    }

    #[test]
    fn implicit_patterns_keeps_only_implicit_vulns() {
        let policy = policy();
        let patterns = policy.patterns_by_source("a");
        let ml = MultiLabel::new(&patterns, &[Label::for_source(Node::new("a", 1))]);
        let restricted = implicit_patterns_multilabel(&policy, &ml);
        assert_eq!(restricted.vulns(), std::collections::HashSet::from(["B".to_string()]));
    }
}
