//! The rule-graph planner: resolves a query's prerequisites into a
//! topologically sorted execution order, detecting cycles (spec §4.1
//! "Planning").

use std::collections::HashSet;

use tracing::debug;

use crate::dom::Dom;
use crate::error::{EngineError, EngineResult};
use crate::rule::{Lhs, RuleKind};
use crate::ruleset::Ruleset;
use crate::types::Type;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Depth-first visits the rules that could produce any type in `types`,
/// appending them to `order` in dependency-first order. `done` are rule ids
/// already executed in a prior query on this bound ruleset and are treated
/// as satisfied without being re-added to `order` (spec §3 "doneInwardRules").
struct Visitor<'a, D: Dom> {
    ruleset: &'a Ruleset<D>,
    done: &'a HashSet<usize>,
    marks: std::collections::HashMap<usize, Mark>,
    order: Vec<usize>,
}

impl<'a, D: Dom> Visitor<'a, D> {
    fn visit(&mut self, rule_id: usize) -> EngineResult<()> {
        if self.done.contains(&rule_id) {
            return Ok(());
        }
        match self.marks.get(&rule_id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(EngineError::Cycle {
                    rule: self.ruleset.rule(rule_id).debug_label(),
                });
            }
            None => {}
        }
        self.marks.insert(rule_id, Mark::InProgress);

        let rule = self.ruleset.rule(rule_id);
        if let RuleKind::Inward(_) = rule.kind() {
            // spec §4.1 "Prerequisite relation": finalized mentioned types
            // require every emitter to have run; non-finalized ones require
            // only the rules that could newly add the type.
            let finalizes = rule.finalizes_mentioned_types();
            for ty in rule.lhs().mentioned_types() {
                if finalizes {
                    self.visit_emitters(&ty)?;
                } else {
                    self.visit_adders(&ty)?;
                }
            }
        }

        self.marks.insert(rule_id, Mark::Done);
        self.order.push(rule_id);
        debug!(rule_id, label = %rule.debug_label(), "planner: scheduled rule");
        Ok(())
    }

    fn visit_emitters(&mut self, ty: &Type) -> EngineResult<()> {
        let emitters: Vec<usize> = self.ruleset.emitters_of(ty).to_vec();
        for rule_id in emitters {
            self.visit(rule_id)?;
        }
        Ok(())
    }

    fn visit_adders(&mut self, ty: &Type) -> EngineResult<()> {
        let adders: Vec<usize> = self.ruleset.adders_of(ty).to_vec();
        for rule_id in adders {
            self.visit(rule_id)?;
        }
        Ok(())
    }

    /// Visits the prerequisites of an *outward* (or ad hoc) LHS, which always
    /// finalizes every type it mentions (spec §4.1 "An outward rule finalizes
    /// every type its LHS mentions").
    fn visit_type(&mut self, ty: &Type) -> EngineResult<()> {
        self.visit_emitters(ty)
    }
}

/// Computes the execution order (dependency-first) for the rules that must
/// run before `rule_id` itself, then `rule_id`, skipping anything in `done`.
pub(crate) fn plan_for_rule<D: Dom>(
    ruleset: &Ruleset<D>,
    rule_id: usize,
    done: &HashSet<usize>,
) -> EngineResult<Vec<usize>> {
    let mut visitor = Visitor {
        ruleset,
        done,
        marks: std::collections::HashMap::new(),
        order: Vec::new(),
    };
    visitor.visit(rule_id)?;
    Ok(visitor.order)
}

/// Computes the execution order needed to evaluate an ad hoc LHS directly
/// (spec §6 "get(lhs)"), without any rule of its own to append at the end.
pub(crate) fn plan_for_lhs<D: Dom>(
    ruleset: &Ruleset<D>,
    lhs: &Lhs<D>,
    done: &HashSet<usize>,
) -> EngineResult<Vec<usize>> {
    let mut visitor = Visitor {
        ruleset,
        done,
        marks: std::collections::HashMap::new(),
        order: Vec::new(),
    };
    for ty in lhs.mentioned_types() {
        visitor.visit_type(&ty)?;
    }
    Ok(visitor.order)
}

/// Computes the execution order needed to populate `key`'s outward rule(s)
/// (spec §6 "get(key)").
pub(crate) fn plan_for_key<D: Dom>(
    ruleset: &Ruleset<D>,
    key: &str,
    done: &HashSet<usize>,
) -> EngineResult<Vec<usize>> {
    if ruleset.outward_rules_for(key).is_empty() {
        return Err(EngineError::MissingOutKey { key: key.to_string() });
    }
    let mut visitor = Visitor {
        ruleset,
        done,
        marks: std::collections::HashMap::new(),
        order: Vec::new(),
    };
    let outward_ids: Vec<usize> = ruleset.outward_rules_for(key).to_vec();
    for rule_id in outward_ids {
        let rule = ruleset.rule(rule_id);
        for ty in rule.lhs().mentioned_types() {
            visitor.visit_type(&ty)?;
        }
    }
    Ok(visitor.order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SimpleDom;
    use crate::rule_builder::{dom, of_type};

    #[test]
    fn linear_dependency_plans_in_order() {
        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(dom("p").rhs().emit_type("a").score(1.0).rule().unwrap())
            .rule(of_type("a").rhs().emit_type("b").score(1.0).rule().unwrap())
            .build();

        let done = HashSet::new();
        let plan = plan_for_rule(&ruleset, 1, &done).unwrap();
        assert_eq!(plan, vec![0, 1]);
    }

    #[test]
    fn cycle_is_detected() {
        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(of_type("b").rhs().emit_type("a").score(1.0).rule().unwrap())
            .rule(of_type("a").rhs().emit_type("b").score(1.0).rule().unwrap())
            .build();

        let done = HashSet::new();
        let result = plan_for_rule(&ruleset, 1, &done);
        assert!(matches!(result, Err(EngineError::Cycle { .. })));
    }

    #[test]
    fn done_rules_are_skipped() {
        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(dom("p").rhs().emit_type("a").score(1.0).rule().unwrap())
            .rule(of_type("a").rhs().emit_type("b").score(1.0).rule().unwrap())
            .build();

        let mut done = HashSet::new();
        done.insert(0);
        let plan = plan_for_rule(&ruleset, 1, &done).unwrap();
        assert_eq!(plan, vec![1]);
    }

    /// A non-finalizing rule (plain `OfType` whose RHS re-emits the same
    /// guaranteed type) must not require *every* emitter of that type as a
    /// prerequisite — only the rules that could newly *add* it (spec §4.1:
    /// "For each t in M(R) \ F(R), every rule in addersByType[t] is a
    /// prerequisite"). A same-type re-emitting rule is an emitter but not an
    /// adder, so it must be excluded from a sibling non-finalizing rule's plan.
    #[test]
    fn non_finalizing_rule_depends_only_on_adders() {
        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(dom("p").rhs().emit_type("a").score(1.0).rule().unwrap()) // 0: adder of a
            .rule(of_type("a").rhs().emit_type("a").score(2.0).rule().unwrap()) // 1: emitter, not adder
            .rule(of_type("a").rhs().score(3.0).rule().unwrap()) // 2: emitter, not adder; doesn't finalize
            .build();

        let done = HashSet::new();
        let plan = plan_for_rule(&ruleset, 2, &done).unwrap();
        assert_eq!(plan, vec![0, 2], "rule 1 only emits, never adds, so it must not appear");
    }

    /// The same ruleset's aggregate consumer (`Max`, via an outward rule)
    /// finalizes the type, so it *does* need every emitter to have run first.
    #[test]
    fn finalizing_consumer_depends_on_every_emitter() {
        use crate::rule_builder::max;

        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(dom("p").rhs().emit_type("a").score(1.0).rule().unwrap()) // 0
            .rule(of_type("a").rhs().emit_type("a").score(2.0).rule().unwrap()) // 1
            .rule(of_type("a").rhs().score(3.0).rule().unwrap()) // 2
            .rule(max("a").rule_to("best"))
            .build();

        let done = HashSet::new();
        let plan = plan_for_key(&ruleset, "best", &done).unwrap();
        let mut sorted = plan.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2], "an aggregate consumer must wait on every emitter");
        assert!(plan.iter().position(|&r| r == 0).unwrap() < plan.iter().position(|&r| r == 1).unwrap());
        assert!(plan.iter().position(|&r| r == 0).unwrap() < plan.iter().position(|&r| r == 2).unwrap());
    }
}
