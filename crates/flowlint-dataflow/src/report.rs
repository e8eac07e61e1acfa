//! JSON report serialization (§6).

use crate::vulnerabilities::Vulnerabilities;
use flowlint_ast::Node;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VulnerabilityRecord {
    pub vulnerability: String,
    pub source: (String, i64),
    pub sink: (String, i64),
    pub unsanitized_flows: &'static str,
    pub sanitized_flows: Vec<Vec<(String, i64)>>,
}

fn node_pair(node: &Node) -> (String, i64) {
    (node.name().to_string(), node.line())
}

/// Flatten `Vulnerabilities` into the output records of §6. One
/// `(Label, sink)` observation expands into one record per distinct
/// source in the Label, numbered `<vuln_name>_<index>` by a 1-based
/// counter over all `(source, sink)` observations for that vuln name, in
/// insertion order.
pub fn to_report(vulnerabilities: &Vulnerabilities) -> Vec<VulnerabilityRecord> {
    let mut vuln_names: Vec<&String> = vulnerabilities.vulns().collect();
    vuln_names.sort();

    let mut records = Vec::new();
    for vuln_name in vuln_names {
        let mut index = 1;
        for (label, sink) in vulnerabilities.get(vuln_name) {
            for (source, flows) in label.pairs() {
                let unsanitized = flows.iter().any(|flow| flow.is_empty());
                let sanitized_flows: Vec<Vec<(String, i64)>> = flows
                    .iter()
                    .filter(|flow| !flow.is_empty())
                    .map(|flow| flow.iter().map(node_pair).collect())
                    .collect();
                records.push(VulnerabilityRecord {
                    vulnerability: format!("{vuln_name}_{index}"),
                    source: node_pair(source),
                    sink: node_pair(sink),
                    unsanitized_flows: if unsanitized { "yes" } else { "no" },
                    sanitized_flows,
                });
                index += 1;
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;
    use flowlint_policy::Policy;
    use serde_json::json;

    #[test]
    fn unsanitized_flows_is_yes_when_a_chain_is_empty() {
        let policy = Policy::from_json(&json!([
            {"vulnerability": "v", "sources": ["a"], "sanitizers": [], "sinks": ["sink"], "implicit": "no"},
        ]))
        .unwrap();
        let patterns = policy.patterns_by_source("a");
        let ml = crate::multilabel::MultiLabel::new(&patterns, &[Label::for_source(Node::new("a", 1))]);
        let mut vulns = Vulnerabilities::empty();
        vulns.add_vulnerability(&policy, &ml, &Node::new("sink", 1));

        let report = to_report(&vulns);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].vulnerability, "v_1");
        assert_eq!(report[0].unsanitized_flows, "yes");
        assert!(report[0].sanitized_flows.is_empty());
    }
}
