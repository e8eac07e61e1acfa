//! The transfer engine: walks the AST maintaining a [`MultiLabelling`], a
//! [`Vulnerabilities`] accumulator, and a stack of active implicit-flow
//! contexts (§4.2-§4.4).

use crate::multilabel::MultiLabel;
use crate::multilabelling::MultiLabelling;
use crate::policy_queries::implicit_patterns_multilabel;
use crate::vulnerabilities::Vulnerabilities;
use flowlint_ast::{Expr, Keyword, MatchCase, MatchPattern, Stmt};
use flowlint_core::{Result, MAX_LOOP_ITERATIONS};
use flowlint_policy::Policy;

/// The mutable parts of visitor state that branches fork and conciliate.
/// `conditions_stack` is deliberately *not* part of this — it is shared,
/// single-threaded context pushed/popped around control constructs, not
/// forked per branch (§2, §4.2).
#[derive(Debug, Clone, Default)]
struct Frame {
    multilabelling: MultiLabelling,
    vulnerabilities: Vulnerabilities,
}

impl Frame {
    fn conciliate(&mut self, policy: &Policy, other: &Frame) {
        self.multilabelling.conciliate(policy, &other.multilabelling);
        self.vulnerabilities.conciliate(&other.vulnerabilities);
    }
}

/// The effect a statement sequence had on control flow. `Break`/`Continue`
/// propagate up through `If`/`Match` (neither is a loop boundary) and are
/// absorbed by the nearest enclosing `While`/`For`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlFlow {
    Normal,
    Break,
    Continue,
}

impl ControlFlow {
    /// Conservative join across sibling branches: if either side could
    /// break, the combined construct could break.
    fn join(a: ControlFlow, b: ControlFlow) -> ControlFlow {
        use ControlFlow::*;
        match (a, b) {
            (Break, _) | (_, Break) => Break,
            (Continue, _) | (_, Continue) => Continue,
            _ => Normal,
        }
    }
}

pub struct Visitor<'a> {
    policy: &'a Policy,
    frame: Frame,
    conditions_stack: Vec<MultiLabel>,
}

impl<'a> Visitor<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self {
            policy,
            frame: Frame::default(),
            conditions_stack: Vec::new(),
        }
    }

    pub fn run(&mut self, program: &[Stmt]) -> Result<()> {
        self.visit_stmts(program)?;
        Ok(())
    }

    pub fn multilabelling(&self) -> &MultiLabelling {
        &self.frame.multilabelling
    }

    pub fn vulnerabilities(&self) -> &Vulnerabilities {
        &self.frame.vulnerabilities
    }

    // ---- expressions -------------------------------------------------

    /// Returns `(handle, MultiLabel)`. `handle` collapses the spec's
    /// `Node | [Node] | None` into a single `Vec<Node>`: empty for a pure
    /// value, one element for a simple name, more for an attribute chain.
    /// Every handle consumer normalizes to a list anyway (§4.3 Call,
    /// Attribute), so this avoids a redundant sum type.
    fn visit_expr(&mut self, expr: &Expr) -> Result<(Vec<flowlint_ast::Node>, MultiLabel)> {
        match expr {
            Expr::Constant { .. } => Ok((Vec::new(), MultiLabel::empty())),
            Expr::Name { id, lineno } => Ok(self.visit_name(id, *lineno)),
            Expr::BinOp { left, right, .. } => {
                let (_, left_ml) = self.visit_expr(left)?;
                let (_, right_ml) = self.visit_expr(right)?;
                Ok((Vec::new(), MultiLabel::combine(&left_ml, &right_ml)))
            }
            Expr::UnaryOp { operand, .. } => {
                let (_, ml) = self.visit_expr(operand)?;
                Ok((Vec::new(), ml))
            }
            Expr::BoolOp { values, .. } => {
                let mut ml = MultiLabel::empty();
                for value in values {
                    let (_, value_ml) = self.visit_expr(value)?;
                    ml = MultiLabel::combine(&ml, &value_ml);
                }
                Ok((Vec::new(), ml))
            }
            Expr::Compare { left, comparators, .. } => {
                let (_, mut ml) = self.visit_expr(left)?;
                for comparator in comparators {
                    let (_, comp_ml) = self.visit_expr(comparator)?;
                    ml = MultiLabel::combine(&ml, &comp_ml);
                }
                Ok((Vec::new(), ml))
            }
            Expr::Call { func, args, keywords, .. } => self.visit_call(func, args, keywords),
            Expr::Attribute { value, attr, lineno } => self.visit_attribute(value, attr, *lineno),
            Expr::Unsupported => Err(flowlint_core::AnalysisError::unsupported_node(
                expr.kind_name(),
                expr.lineno(),
            )),
        }
    }

    /// Name(id, lineno) — §4.3. The uninitialized-variable branch is only
    /// taken when `id` is neither an already-initialized variable nor
    /// itself a declared source/sanitizer name; an uninitialized variable
    /// that happens to share a name with a declared source is treated as
    /// that source (this is how scenario 1, `sink(a)` with no prior
    /// assignment to `a`, produces a tainted read rather than the blanket
    /// every-vuln uninitialized label).
    fn visit_name(&mut self, id: &str, lineno: i64) -> (Vec<flowlint_ast::Node>, MultiLabel) {
        let simple_node = flowlint_ast::Node::new(id, lineno);
        let source_patterns = self.policy.patterns_by_source(id);
        let fresh = MultiLabel::new(&source_patterns, &[crate::label::Label::for_source(simple_node.clone())]);

        let mut ml = if self.frame.multilabelling.is_initialised(id) {
            let stored = self.frame.multilabelling.get(id).unwrap().clone();
            MultiLabel::combine(&stored, &fresh)
        } else if !fresh.is_empty() || !self.policy.vulns_by_sanitizer(id).is_empty() {
            fresh
        } else {
            MultiLabel::for_uninitialised_variable(self.policy, simple_node.clone())
        };
        ml.fix_lineno(lineno);
        (vec![simple_node], ml)
    }

    fn visit_call(
        &mut self,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
    ) -> Result<(Vec<flowlint_ast::Node>, MultiLabel)> {
        let (func_handle, _discarded) = self.visit_expr(func)?;

        let mut ret_ml = MultiLabel::empty();
        for arg in args {
            let (_, arg_ml) = self.visit_expr(arg)?;
            ret_ml = MultiLabel::combine(&ret_ml, &arg_ml);
        }
        for keyword in keywords {
            let (_, kw_ml) = self.visit_expr(&keyword.value)?;
            ret_ml = MultiLabel::combine(&ret_ml, &kw_ml);
        }
        for condition in &self.conditions_stack {
            ret_ml = MultiLabel::combine(&ret_ml, condition);
        }

        for node in &func_handle {
            ret_ml.sanitise(self.policy, node);
            self.frame.vulnerabilities.add_vulnerability(self.policy, &ret_ml, node);
        }

        if let Some((last, receivers)) = func_handle.split_last() {
            for receiver in receivers {
                let (_, receiver_ml) = self.visit_name(receiver.name(), receiver.line());
                ret_ml = MultiLabel::combine(&ret_ml, &receiver_ml);
            }
            self.frame.multilabelling.set(last.name().to_string(), MultiLabel::empty());
            let (_, last_ml) = self.visit_name(last.name(), last.line());
            ret_ml = MultiLabel::combine(&ret_ml, &last_ml);
        }

        Ok((func_handle, ret_ml))
    }

    fn visit_attribute(
        &mut self,
        value: &Expr,
        attr: &str,
        lineno: i64,
    ) -> Result<(Vec<flowlint_ast::Node>, MultiLabel)> {
        let (mut chain_nodes, value_ml) = self.visit_expr(value)?;
        for node in &mut chain_nodes {
            node.do_not_initialise();
        }
        let (_, attr_ml) = self.visit_name(attr, lineno);
        let attr_node = flowlint_ast::Node::new(attr, lineno);
        chain_nodes.push(attr_node);
        Ok((chain_nodes, MultiLabel::combine(&value_ml, &attr_ml)))
    }

    // ---- statements ----------------------------------------------------

    fn visit_stmts(&mut self, stmts: &[Stmt]) -> Result<ControlFlow> {
        for stmt in stmts {
            let cf = self.visit_stmt(stmt)?;
            if cf != ControlFlow::Normal {
                return Ok(cf);
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<ControlFlow> {
        match stmt {
            Stmt::Expr { value, .. } => {
                self.visit_expr(value)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Assign { targets, value, .. } => {
                self.visit_assign(targets, value)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::AugAssign { target, op, value, lineno } => {
                self.visit_aug_assign(target, op, value, *lineno)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::If { test, body, orelse, .. } => self.visit_if(test, body, orelse),
            Stmt::While { test, body, orelse, .. } => {
                self.visit_while(test, body, orelse)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::For { target, iter, body, orelse, .. } => {
                self.visit_for(target, iter, body, orelse)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Match { subject, cases, .. } => self.visit_match(subject, cases),
            Stmt::Break { .. } => Ok(ControlFlow::Break),
            Stmt::Continue { .. } => Ok(ControlFlow::Continue),
            Stmt::Unsupported => Err(flowlint_core::AnalysisError::unsupported_node(
                stmt.kind_name(),
                stmt.lineno(),
            )),
        }
    }

    /// Assign(targets, value) — §4.4. A target's handle may carry more
    /// than one node (an attribute chain); each node in it is treated as
    /// its own target handle, independently.
    fn visit_assign(&mut self, targets: &[Expr], value: &Expr) -> Result<()> {
        let (_, value_ml) = self.visit_expr(value)?;
        for target in targets {
            let (handles, _discarded) = self.visit_expr(target)?;
            for target_node in &handles {
                let mut v_ml = value_ml.clone();
                for condition in &self.conditions_stack {
                    v_ml = MultiLabel::combine(&v_ml, condition);
                }
                self.frame.vulnerabilities.add_vulnerability(self.policy, &v_ml, target_node);
                if target_node.should_initialise() {
                    self.frame.multilabelling.set(target_node.name().to_string(), v_ml);
                }
            }
        }
        Ok(())
    }

    fn visit_aug_assign(&mut self, target: &Expr, op: &str, value: &Expr, lineno: i64) -> Result<()> {
        let synthetic = Expr::BinOp {
            left: Box::new(target.clone()),
            op: op.to_string(),
            right: Box::new(value.clone()),
            lineno,
        };
        self.visit_assign(std::slice::from_ref(target), &synthetic)
    }

    fn visit_if(&mut self, test: &Expr, body: &[Stmt], orelse: &[Stmt]) -> Result<ControlFlow> {
        let (_, test_ml) = self.visit_expr(test)?;
        self.conditions_stack.push(implicit_patterns_multilabel(self.policy, &test_ml));

        let base = self.frame.clone();
        self.frame = base.clone();
        let cf1 = self.visit_stmts(body)?;
        let frame1 = std::mem::replace(&mut self.frame, base);
        let cf2 = self.visit_stmts(orelse)?;
        let frame2 = std::mem::take(&mut self.frame);

        let mut merged = frame1;
        merged.conciliate(self.policy, &frame2);
        self.frame = merged;

        self.conditions_stack.pop();
        Ok(ControlFlow::join(cf1, cf2))
    }

    /// While(test, body, orelse) — §4.4: bounded fixpoint with a reserved
    /// `conditions_stack` slot that's overwritten (not re-pushed) every
    /// iteration as the test's implicit taint may change with the store.
    fn visit_while(&mut self, test: &Expr, body: &[Stmt], orelse: &[Stmt]) -> Result<()> {
        let (_, test_ml0) = self.visit_expr(test)?;
        let slot = self.conditions_stack.len();
        self.conditions_stack.push(implicit_patterns_multilabel(self.policy, &test_ml0));

        let base_frame = self.frame.clone();
        let mut history = vec![base_frame.multilabelling.clone()];
        let mut found_break = false;

        for _ in 0..MAX_LOOP_ITERATIONS {
            let cf = self.visit_stmts(body)?;
            if cf == ControlFlow::Break {
                found_break = true;
                break;
            }
            if history.contains(&self.frame.multilabelling) {
                break;
            }
            history.push(self.frame.multilabelling.clone());

            let (_, test_ml) = self.visit_expr(test)?;
            self.conditions_stack[slot] = implicit_patterns_multilabel(self.policy, &test_ml);
        }
        if history.len() >= MAX_LOOP_ITERATIONS {
            tracing::warn!("while loop at line {} exceeded the fixpoint iteration cap", test.lineno());
        }

        if !found_break {
            self.conditions_stack.pop();
            self.visit_stmts(orelse)?;
        } else {
            let saved = std::mem::replace(&mut self.frame, base_frame);
            self.visit_stmts(orelse)?;
            let orelse_frame = std::mem::replace(&mut self.frame, saved);
            self.frame.conciliate(self.policy, &orelse_frame);
            self.conditions_stack.pop();
        }
        Ok(())
    }

    /// For(target, iter, body, orelse) — §4.4: like `while`, but each
    /// iteration first runs `Assign([target], iter)`. The iterable's
    /// multilabel, computed once up front, is pushed onto
    /// `conditions_stack` for the loop's duration so implicit flows through
    /// `for x in leak(): ...` are tracked the same way they are for
    /// `if`/`while`/`match` (§4.2).
    fn visit_for(&mut self, target: &Expr, iter: &Expr, body: &[Stmt], orelse: &[Stmt]) -> Result<()> {
        let (_, iter_ml) = self.visit_expr(iter)?;
        self.conditions_stack.push(implicit_patterns_multilabel(self.policy, &iter_ml));

        let base_frame = self.frame.clone();
        let mut history = vec![base_frame.multilabelling.clone()];
        let mut found_break = false;

        for _ in 0..MAX_LOOP_ITERATIONS {
            self.visit_assign(std::slice::from_ref(target), iter)?;
            let cf = self.visit_stmts(body)?;
            if cf == ControlFlow::Break {
                found_break = true;
                break;
            }
            if history.contains(&self.frame.multilabelling) {
                break;
            }
            history.push(self.frame.multilabelling.clone());
        }
        if history.len() >= MAX_LOOP_ITERATIONS {
            tracing::warn!("for loop at line {} exceeded the fixpoint iteration cap", iter.lineno());
        }

        if !found_break {
            self.conditions_stack.pop();
            self.visit_stmts(orelse)?;
        } else {
            let saved = std::mem::replace(&mut self.frame, base_frame);
            self.visit_stmts(orelse)?;
            let orelse_frame = std::mem::replace(&mut self.frame, saved);
            self.frame.conciliate(self.policy, &orelse_frame);
            self.conditions_stack.pop();
        }
        Ok(())
    }

    /// Match(subject, cases) — §4.4. Case-level condition pushes are
    /// intentionally never popped (§9 design note): later cases, and
    /// everything analyzed after the match statement, keep observing
    /// earlier cases' implicit contexts.
    fn visit_match(&mut self, subject: &Expr, cases: &[MatchCase]) -> Result<ControlFlow> {
        let (_, subject_ml) = self.visit_expr(subject)?;
        self.conditions_stack.push(implicit_patterns_multilabel(self.policy, &subject_ml));

        let base = self.frame.clone();
        let mut merged: Option<Frame> = None;
        let mut cf = ControlFlow::Normal;
        for case in cases {
            self.frame = base.clone();
            let case_cf = self.visit_match_case(case)?;
            cf = ControlFlow::join(cf, case_cf);
            merged = Some(match merged {
                None => self.frame.clone(),
                Some(mut acc) => {
                    acc.conciliate(self.policy, &self.frame);
                    acc
                }
            });
        }
        self.frame = merged.unwrap_or(base);
        self.conditions_stack.pop();
        Ok(cf)
    }

    fn visit_match_case(&mut self, case: &MatchCase) -> Result<ControlFlow> {
        let pattern_ml = self.visit_match_pattern(&case.pattern)?;
        self.conditions_stack.push(implicit_patterns_multilabel(self.policy, &pattern_ml));
        if let Some(guard) = &case.guard {
            let (_, guard_ml) = self.visit_expr(guard)?;
            self.conditions_stack.push(implicit_patterns_multilabel(self.policy, &guard_ml));
        }
        self.visit_stmts(&case.body)
    }

    fn visit_match_pattern(&mut self, pattern: &MatchPattern) -> Result<MultiLabel> {
        match pattern {
            MatchPattern::MatchValue { value, .. } => Ok(self.visit_expr(value)?.1),
            MatchPattern::MatchSingleton { .. } => Ok(MultiLabel::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlint_ast::Node;
    use serde_json::json;

    fn parse_program(json: &str) -> Vec<Stmt> {
        serde_json::from_str(json).unwrap()
    }

    fn direct_sink_policy() -> Policy {
        Policy::from_json(&json!([
            {"vulnerability": "v", "sources": ["a"], "sanitizers": [], "sinks": ["sink"], "implicit": "no"},
        ]))
        .unwrap()
    }

    #[test]
    fn scenario_1_direct_source_to_sink() {
        let policy = direct_sink_policy();
        let program = parse_program(
            r#"[{"ast_type":"Expr","lineno":1,"value":{"ast_type":"Call","lineno":1,
            "func":{"ast_type":"Name","id":"sink","lineno":1},
            "args":[{"ast_type":"Name","id":"a","lineno":1}],"keywords":[]}}]"#,
        );
        let mut visitor = Visitor::new(&policy);
        visitor.run(&program).unwrap();
        let report = crate::report::to_report(visitor.vulnerabilities());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].vulnerability, "v_1");
        assert_eq!(report[0].source, ("a".to_string(), 1));
        assert_eq!(report[0].sink, ("sink".to_string(), 1));
        assert_eq!(report[0].unsanitized_flows, "yes");
    }

    #[test]
    fn scenario_6_attribute_sink() {
        let policy = Policy::from_json(&json!([
            {"vulnerability": "v", "sources": ["a"], "sanitizers": [], "sinks": ["write"], "implicit": "no"},
        ]))
        .unwrap();
        let program = parse_program(
            r#"[{"ast_type":"Expr","lineno":1,"value":{"ast_type":"Call","lineno":1,
            "func":{"ast_type":"Attribute","attr":"write","lineno":1,
                "value":{"ast_type":"Name","id":"obj","lineno":1}},
            "args":[{"ast_type":"Name","id":"a","lineno":1}],"keywords":[]}}]"#,
        );
        let mut visitor = Visitor::new(&policy);
        visitor.run(&program).unwrap();
        let report = crate::report::to_report(visitor.vulnerabilities());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].sink, ("write".to_string(), 1));
    }

    #[test]
    fn unsupported_node_is_a_fatal_error() {
        let policy = direct_sink_policy();
        let program: Vec<Stmt> = serde_json::from_str(r#"[{"ast_type":"Try","lineno":1}]"#).unwrap();
        let mut visitor = Visitor::new(&policy);
        assert!(visitor.run(&program).is_err());
    }

    #[test]
    fn assignment_initialises_variable() {
        let policy = direct_sink_policy();
        let mut visitor = Visitor::new(&policy);
        let program = parse_program(
            r#"[{"ast_type":"Assign","lineno":1,
            "targets":[{"ast_type":"Name","id":"b","lineno":1}],
            "value":{"ast_type":"Name","id":"a","lineno":1}}]"#,
        );
        visitor.run(&program).unwrap();
        assert!(visitor.multilabelling().is_initialised("b"));
        let _ = Node::new("b", 1);
    }
}
