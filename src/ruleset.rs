//! Ruleset construction: accumulates [`Rule`] values, assigns stable ids,
//! and precomputes the type → producing-rules index the planner needs
//! (spec §4.1 "Emit/add metadata").

use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::Dom;
use crate::rule::{Rule, RuleKind};
use crate::types::Type;

/// Accumulates rules before they're frozen into a [`Ruleset`].
pub struct RulesetBuilder<D: Dom> {
    rules: Vec<Rule<D>>,
}

/// The types an inward rule's RHS could introduce on an fnode that lacked
/// them (spec §4.1 "could add": could-emit minus the LHS-guaranteed type).
fn could_add<D: Dom>(rule: &Rule<D>) -> Vec<Type> {
    let RuleKind::Inward(rhs) = rule.kind() else {
        return Vec::new();
    };
    let guaranteed = rule.lhs().guaranteed_type();
    rhs.possible_emissions()
        .possible_types
        .into_iter()
        .filter(|ty| Some(ty) != guaranteed)
        .collect()
}

impl<D: Dom> Default for RulesetBuilder<D> {
    fn default() -> Self {
        RulesetBuilder { rules: Vec::new() }
    }
}

impl<D: Dom> RulesetBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, assigning it the next sequential id (spec §4.1
    /// "Tie-breaking: independent rules ... are ordered by declaration").
    #[must_use]
    pub fn rule(mut self, mut rule: Rule<D>) -> Self {
        rule.id = self.rules.len();
        self.rules.push(rule);
        self
    }

    /// Freezes the accumulated rules into a [`Ruleset`], building the
    /// type-producer index used by the planner.
    pub fn build(self) -> Ruleset<D> {
        let mut emitters_by_type: HashMap<Type, Vec<usize>> = HashMap::new();
        let mut adders_by_type: HashMap<Type, Vec<usize>> = HashMap::new();
        let mut outward_rules_by_key: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, rule) in self.rules.iter().enumerate() {
            match &rule.kind {
                RuleKind::Inward(rhs) => {
                    for ty in rhs.possible_emissions().possible_types {
                        emitters_by_type.entry(ty).or_default().push(idx);
                    }
                    for ty in could_add(rule) {
                        adders_by_type.entry(ty).or_default().push(idx);
                    }
                }
                RuleKind::Outward(out) => {
                    outward_rules_by_key.entry(out.key().to_string()).or_default().push(idx);
                }
            }
        }

        Ruleset {
            inner: Rc::new(RulesetInner {
                rules: self.rules,
                emitters_by_type,
                adders_by_type,
                outward_rules_by_key,
            }),
        }
    }
}

pub(crate) struct RulesetInner<D: Dom> {
    pub(crate) rules: Vec<Rule<D>>,
    /// Maps a type to the ids of inward rules whose RHS could emit it
    /// (spec §4.1's basis for prerequisite computation on finalized types).
    pub(crate) emitters_by_type: HashMap<Type, Vec<usize>>,
    /// Maps a type to the ids of inward rules that could introduce it fresh
    /// on an fnode that lacked it (spec §4.1's basis for prerequisites on
    /// mentioned-but-not-finalized types).
    pub(crate) adders_by_type: HashMap<Type, Vec<usize>>,
    pub(crate) outward_rules_by_key: HashMap<String, Vec<usize>>,
}

/// An immutable, compiled set of rules. Cheaply clonable (an `Rc` bump) so
/// the same compiled ruleset can be bound to many documents without
/// recompiling the producer index each time (SPEC_FULL.md §5).
pub struct Ruleset<D: Dom> {
    inner: Rc<RulesetInner<D>>,
}

impl<D: Dom> Clone for Ruleset<D> {
    fn clone(&self) -> Self {
        Ruleset { inner: Rc::clone(&self.inner) }
    }
}

impl<D: Dom> Ruleset<D> {
    pub fn builder() -> RulesetBuilder<D> {
        RulesetBuilder::new()
    }

    pub(crate) fn rules(&self) -> &[Rule<D>] {
        &self.inner.rules
    }

    pub(crate) fn rule(&self, id: usize) -> &Rule<D> {
        &self.inner.rules[id]
    }

    pub(crate) fn adders_of(&self, ty: &Type) -> &[usize] {
        self.inner.adders_by_type.get(ty).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn emitters_of(&self, ty: &Type) -> &[usize] {
        self.inner.emitters_by_type.get(ty).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn outward_rules_for(&self, key: &str) -> &[usize] {
        self.inner.outward_rules_by_key.get(key).map_or(&[], Vec::as_slice)
    }

    /// Binds this ruleset to a document, ready to execute queries against
    /// it (spec §3 "BoundRuleset").
    pub fn bind(&self, dom: D) -> crate::executor::BoundRuleset<D> {
        crate::executor::BoundRuleset::new(self.clone(), dom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SimpleDom;
    use crate::rule_builder::{dom, of_type};

    #[test]
    fn build_assigns_sequential_ids_and_indexes_emitters() {
        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(dom("p").rhs().emit_type("paragraphish").score(1.0).rule().unwrap())
            .rule(
                of_type("paragraphish")
                    .rhs()
                    .emit_type("candidate")
                    .score(2.0)
                    .rule()
                    .unwrap(),
            )
            .build();

        assert_eq!(ruleset.rules().len(), 2);
        assert_eq!(ruleset.rule(0).id(), 0);
        assert_eq!(ruleset.rule(1).id(), 1);
        assert_eq!(ruleset.emitters_of(&"paragraphish".into()), &[0]);
        assert_eq!(ruleset.emitters_of(&"candidate".into()), &[1]);
    }

    #[test]
    fn a_rule_that_re_emits_its_guaranteed_type_is_an_emitter_but_not_an_adder() {
        let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
            .rule(dom("p").rhs().emit_type("a").score(1.0).rule().unwrap())
            .rule(of_type("a").rhs().emit_type("a").score(2.0).rule().unwrap())
            .build();

        assert_eq!(ruleset.emitters_of(&"a".into()), &[0, 1]);
        assert_eq!(ruleset.adders_of(&"a".into()), &[0]);
    }
}
