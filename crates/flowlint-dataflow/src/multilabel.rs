//! `MultiLabel`: a family of [`Label`]s keyed by vulnerability name.

use crate::label::Label;
use flowlint_ast::Node;
use flowlint_policy::Policy;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiLabel {
    label_map: HashMap<String, Label>,
}

impl MultiLabel {
    pub fn empty() -> Self {
        Self {
            label_map: HashMap::new(),
        }
    }

    /// Build from `(patterns, labels)`: for each pattern × label, keep only
    /// pairs whose source name is one of the pattern's sources, intersect
    /// each flow with the pattern's sanitizers, and install the result
    /// under the pattern's `vuln_name` if non-empty. Labels for a
    /// vuln_name seen more than once are combined rather than overwritten.
    pub fn new(patterns: &HashSet<&flowlint_policy::Pattern>, labels: &[Label]) -> Self {
        let mut label_map: HashMap<String, Label> = HashMap::new();
        for pattern in patterns {
            let mut filtered = Label::empty();
            for label in labels {
                for (node, flows) in label.pairs() {
                    if !pattern.is_source(node.name()) {
                        continue;
                    }
                    let kept_flows: Vec<Vec<Node>> = flows
                        .iter()
                        .map(|chain| {
                            chain
                                .iter()
                                .filter(|s| pattern.is_sanitizer(s.name()))
                                .cloned()
                                .collect()
                        })
                        .collect();
                    filtered.add_pair(node.clone(), kept_flows);
                }
            }
            if !filtered.is_empty() {
                label_map
                    .entry(pattern.vuln_name().to_string())
                    .and_modify(|existing| *existing = Label::combine(existing, &filtered))
                    .or_insert(filtered);
            }
        }
        Self { label_map }
    }

    /// One Label, `(node, [[]])`, installed under every vuln in the policy.
    pub fn for_uninitialised_variable(policy: &Policy, node: Node) -> Self {
        let label = Label::for_source(node);
        let label_map = policy
            .vulns()
            .into_iter()
            .map(|vuln| (vuln, label.clone()))
            .collect();
        Self { label_map }
    }

    pub fn is_empty(&self) -> bool {
        self.label_map.is_empty()
    }

    pub fn get(&self, vuln_name: &str) -> Option<&Label> {
        self.label_map.get(vuln_name)
    }

    /// Install a label under a vuln name directly, overwriting. Used by
    /// the policy-query restriction helpers, which already have a
    /// filtered label in hand.
    pub(crate) fn install(&mut self, vuln_name: &str, label: Label) {
        self.label_map.insert(vuln_name.to_string(), label);
    }

    pub fn vulns(&self) -> HashSet<String> {
        self.label_map.keys().cloned().collect()
    }

    /// Per-vuln `Label::combine`; a vuln present in only one side passes
    /// through unchanged.
    pub fn combine(a: &MultiLabel, b: &MultiLabel) -> MultiLabel {
        let mut label_map = a.label_map.clone();
        for (vuln, label) in &b.label_map {
            label_map
                .entry(vuln.clone())
                .and_modify(|existing| *existing = Label::combine(existing, label))
                .or_insert_with(|| label.clone());
        }
        Self { label_map }
    }

    /// Apply `Label::sanitise` only under vulns whose pattern lists
    /// `node.name()` as a sanitizer.
    pub fn sanitise(&mut self, policy: &Policy, node: &Node) {
        for vuln in policy.vulns_by_sanitizer(node.name()) {
            if let Some(label) = self.label_map.get_mut(&vuln) {
                label.sanitise(node);
            }
        }
    }

    pub fn fix_lineno(&mut self, ln: i64) {
        for label in self.label_map.values_mut() {
            label.fix_lineno(ln);
        }
    }
}
