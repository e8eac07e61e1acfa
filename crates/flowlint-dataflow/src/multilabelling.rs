//! `MultiLabelling`: the abstract store, `variable name -> MultiLabel`.

use crate::multilabel::MultiLabel;
use flowlint_ast::Node;
use flowlint_policy::Policy;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiLabelling {
    variable_map: HashMap<String, MultiLabel>,
}

impl MultiLabelling {
    pub fn empty() -> Self {
        Self {
            variable_map: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MultiLabel> {
        self.variable_map.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, ml: MultiLabel) {
        self.variable_map.insert(name.into(), ml);
    }

    pub fn is_initialised(&self, name: &str) -> bool {
        self.variable_map.contains_key(name)
    }

    pub fn delete(&mut self, name: &str) {
        self.variable_map.remove(name);
    }

    /// Combine `ml` into the existing entry for `name`, or install it as-is.
    pub fn add_multilabel(&mut self, name: impl Into<String>, ml: MultiLabel) {
        let name = name.into();
        match self.variable_map.get(&name) {
            Some(existing) => {
                let combined = MultiLabel::combine(existing, &ml);
                self.variable_map.insert(name, combined);
            }
            None => {
                self.variable_map.insert(name, ml);
            }
        }
    }

    /// Per-variable `MultiLabel::combine`; a variable present in only one
    /// side passes through unchanged.
    pub fn combine(a: &MultiLabelling, b: &MultiLabelling) -> MultiLabelling {
        let mut variable_map = a.variable_map.clone();
        for (name, ml) in &b.variable_map {
            variable_map
                .entry(name.clone())
                .and_modify(|existing| *existing = MultiLabel::combine(existing, ml))
                .or_insert_with(|| ml.clone());
        }
        Self { variable_map }
    }

    /// Branch join: a variable present on only one side is combined with
    /// `MultiLabel::for_uninitialised_variable` on the missing side, to
    /// record that it may be unbound on the path that didn't set it.
    pub fn conciliate(&mut self, policy: &Policy, other: &MultiLabelling) {
        for (name, other_ml) in &other.variable_map {
            match self.variable_map.get(name) {
                Some(existing) => {
                    let combined = MultiLabel::combine(existing, other_ml);
                    self.variable_map.insert(name.clone(), combined);
                }
                None => {
                    let missing =
                        MultiLabel::for_uninitialised_variable(policy, Node::new(name.clone(), Node::UNKNOWN_LINE));
                    self.variable_map
                        .insert(name.clone(), MultiLabel::combine(&missing, other_ml));
                }
            }
        }
        for (name, existing_ml) in self.variable_map.clone().iter() {
            if !other.variable_map.contains_key(name) {
                let missing =
                    MultiLabel::for_uninitialised_variable(policy, Node::new(name.clone(), Node::UNKNOWN_LINE));
                self.variable_map
                    .insert(name.clone(), MultiLabel::combine(existing_ml, &missing));
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
    fn conciliate_synthesizes_uninitialised_entry_for_missing_side() {
        let policy = policy();
        let mut s1 = MultiLabelling::empty();
        let patterns = policy.patterns_by_source("a");
        s1.set(
            "a",
            MultiLabel::new(&patterns, &[crate::label::Label::for_source(Node::new("a", 1))]),
        );
        let s2 = MultiLabelling::empty();

        s1.conciliate(&policy, &s2);
        let ml = s1.get("a").unwrap();
        let label = ml.get("v").unwrap();
        assert_eq!(label.pairs().len(), 2);
    }
}
