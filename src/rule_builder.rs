//! Fluent rule construction (SPEC_FULL.md §4.7), grounded in the teacher's
//! `ast::builders` pattern: free functions start a builder, chained methods
//! narrow it, and a terminal method performs validation and produces the
//! immutable value.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cluster::ClusterOpts;
use crate::dom::Dom;
use crate::error::{EngineError, EngineResult};
use crate::executor::FnodeRef;
use crate::rule::{ClosureRhs, InwardRhs, Lhs, OutwardRhs, PossibleEmissions, Predicate, Rule, RuleKind};
use crate::types::Type;

/// Starts an LHS builder matching every element returned by `selector`
/// (spec §4.3 `Dom(selector)`).
pub fn dom<D: Dom>(selector: impl Into<String>) -> LhsBuilder<D> {
    LhsBuilder {
        lhs: Lhs::Dom {
            selector: selector.into(),
            predicate: None,
        },
    }
}

/// Starts an LHS builder matching every fnode bearing `ty` (spec §4.3 `OfType(ty)`).
pub fn of_type<D: Dom>(ty: impl Into<Type>) -> LhsBuilder<D> {
    LhsBuilder {
        lhs: Lhs::OfType {
            ty: ty.into(),
            predicate: None,
        },
    }
}

/// Starts an LHS builder matching every fnode of `ty` tied for the highest
/// score (spec §4.3 `Max(ty)`: "ties return all tied fnodes").
pub fn max<D: Dom>(ty: impl Into<Type>) -> LhsBuilder<D> {
    LhsBuilder {
        lhs: Lhs::Max {
            ty: ty.into(),
            predicate: None,
        },
    }
}

/// Starts an LHS builder matching the highest-scoring cluster of `ty`
/// fnodes (spec §4.3 `BestCluster(ty, opts)`).
pub fn best_cluster<D: Dom>(ty: impl Into<Type>, opts: ClusterOpts<D>) -> LhsBuilder<D> {
    LhsBuilder {
        lhs: Lhs::BestCluster {
            ty: ty.into(),
            opts,
            predicate: None,
        },
    }
}

/// Starts an LHS builder matching fnodes bearing every type in `types`
/// (spec §4.3 `And(types)`).
pub fn and<D: Dom>(types: impl IntoIterator<Item = impl Into<Type>>) -> LhsBuilder<D> {
    LhsBuilder {
        lhs: Lhs::And {
            types: types.into_iter().map(Into::into).collect(),
            predicate: None,
        },
    }
}

pub struct LhsBuilder<D: Dom> {
    lhs: Lhs<D>,
}

impl<D: Dom> LhsBuilder<D> {
    /// Attaches a post-filter predicate (spec §4.3 ".when(predicate)").
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(FnodeRef<'_, D>) -> bool + Send + Sync + 'static) -> Self {
        self.lhs = self.lhs.when(predicate);
        self
    }

    /// Moves to building the RHS that will pair with this LHS.
    pub fn rhs(self) -> RhsBuilder<D> {
        RhsBuilder {
            lhs: self.lhs,
            could_change_type: false,
            possible_types: HashSet::new(),
            type_fn: None,
            score_fn: None,
            note_fn: None,
            element_fn: None,
            conserve_score: false,
        }
    }
}

type TypeFn<D> = Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<Type> + Send + Sync>;
type ScoreFn<D> = Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> f64 + Send + Sync>;
type NoteFn<D> = Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<Arc<dyn Any + Send + Sync>> + Send + Sync>;
type ElementFn<D> = Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<<D as Dom>::Element> + Send + Sync>;

/// Accumulates an inward RHS's behavior before `.rule()` validates and
/// assembles the pair (spec §4.1 "Emit/add metadata").
pub struct RhsBuilder<D: Dom> {
    lhs: Lhs<D>,
    could_change_type: bool,
    possible_types: HashSet<Type>,
    type_fn: Option<TypeFn<D>>,
    score_fn: Option<ScoreFn<D>>,
    note_fn: Option<NoteFn<D>>,
    element_fn: Option<ElementFn<D>>,
    conserve_score: bool,
}

impl<D: Dom> RhsBuilder<D> {
    /// Declares the type this RHS emits is computed per-input (spec §4.1).
    /// `possible_types` must list every type the closure might return.
    #[must_use]
    pub fn type_fn(
        mut self,
        possible_types: impl IntoIterator<Item = impl Into<Type>>,
        f: impl Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<Type> + Send + Sync + 'static,
    ) -> Self {
        let types: Vec<Type> = possible_types.into_iter().map(Into::into).collect();
        self.could_change_type = true;
        self.possible_types.extend(types);
        self.type_fn = Some(Arc::new(f));
        self
    }

    /// Declares a single fixed emitted type (spec §4.1 "static `emit`").
    #[must_use]
    pub fn emit_type(mut self, ty: impl Into<Type>) -> Self {
        let ty = ty.into();
        self.possible_types.insert(ty.clone());
        self.type_fn = Some(Arc::new(move |_, _| Some(ty.clone())));
        self
    }

    #[must_use]
    pub fn score_fn(mut self, f: impl Fn(FnodeRef<'_, D>, Option<&Type>) -> f64 + Send + Sync + 'static) -> Self {
        self.score_fn = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn score(self, value: f64) -> Self {
        self.score_fn(move |_, _| value)
    }

    #[must_use]
    pub fn note_fn<T: Send + Sync + 'static>(
        mut self,
        f: impl Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        self.note_fn = Some(Arc::new(move |fref, ty| {
            f(fref, ty).map(|v| Arc::new(v) as Arc<dyn Any + Send + Sync>)
        }));
        self
    }

    /// Redirects the fact to a different element (spec §3 `Fact.element`).
    #[must_use]
    pub fn redirect_fn(mut self, f: impl Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<D::Element> + Send + Sync + 'static) -> Self {
        self.element_fn = Some(Arc::new(f));
        self
    }

    /// Requests that the LHS type's score be folded into the emitted type's
    /// score before this RHS's own `score` is applied (spec §4.2 `conserve_score`).
    #[must_use]
    pub fn conserve_score(mut self) -> Self {
        self.conserve_score = true;
        self
    }

    fn validate(&self) -> EngineResult<()> {
        let label = self.lhs.debug_label();
        if self.conserve_score && self.lhs.guaranteed_type().is_none() {
            return Err(EngineError::ConserveScoreWithoutType { rule: label });
        }
        let emits_type = self.type_fn.is_some() || self.lhs.guaranteed_type().is_some();
        if self.score_fn.is_some() && !emits_type {
            return Err(EngineError::ScoreWithoutInferableType { rule: label });
        }
        if self.note_fn.is_some() && !emits_type {
            return Err(EngineError::NoteWithoutInferableType { rule: label });
        }
        if matches!(self.lhs, Lhs::Dom { .. }) && !emits_type {
            return Err(EngineError::DomRuleMustAssignType { rule: label });
        }
        if !emits_type && self.element_fn.is_none() {
            return Err(EngineError::UnderspecifiedEmission { rule: label });
        }
        Ok(())
    }

    /// Finalizes this as an inward rule (spec §3 "Rule").
    pub fn rule(self) -> EngineResult<Rule<D>> {
        self.validate()?;
        let possible_types = if self.possible_types.is_empty() {
            self.lhs
                .guaranteed_type()
                .cloned()
                .into_iter()
                .collect()
        } else {
            self.possible_types.clone()
        };
        let rhs = ClosureRhs {
            emissions: PossibleEmissions {
                could_change_type: self.could_change_type,
                possible_types,
            },
            type_fn: self.type_fn,
            score_fn: self.score_fn,
            note_fn: self.note_fn,
            element_fn: self.element_fn,
            conserve_score: self.conserve_score,
        };
        Ok(Rule {
            id: 0,
            lhs: self.lhs,
            kind: RuleKind::Inward(Arc::new(rhs) as Arc<dyn InwardRhs<D> + Send + Sync>),
        })
    }

    /// Finalizes this LHS as an outward rule feeding the named sink (spec
    /// §3 "Outward"). The RHS-shaping methods above (`type_fn`, `score_fn`,
    /// ...) do not apply to outward rules; use [`OutwardRhs`]'s own builder
    /// methods via [`LhsBuilder::rule_to`] instead.
    pub fn key(self, key: impl Into<String>) -> Rule<D> {
        Rule {
            id: 0,
            lhs: self.lhs,
            kind: RuleKind::Outward(OutwardRhs::new(key)),
        }
    }
}

impl<D: Dom> LhsBuilder<D> {
    /// Shortcut for an outward rule: this LHS feeding straight into `key`
    /// with the identity `through`/`all_through` callbacks (spec §3
    /// "Outward"). Use [`OutwardRhs::through`]/[`OutwardRhs::all_through`]
    /// on the result to customize.
    pub fn rule_to(self, key: impl Into<String>) -> Rule<D> {
        Rule {
            id: 0,
            lhs: self.lhs,
            kind: RuleKind::Outward(OutwardRhs::new(key)),
        }
    }

    /// A predicate-only LHS used purely as an aggregate/selection helper,
    /// not paired with any RHS (e.g. for `get(lhs)` queries). Exposed so
    /// callers can hold onto an `Lhs` value without going through `.rhs()`.
    pub fn build(self) -> Lhs<D> {
        self.lhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SimpleDom;

    #[test]
    fn dom_rule_without_type_is_rejected() {
        let result = dom::<SimpleDom>("p").rhs().score(1.0).rule();
        assert!(matches!(result, Err(EngineError::DomRuleMustAssignType { .. })));
    }

    #[test]
    fn dom_rule_with_type_builds() {
        let result = dom::<SimpleDom>("p").rhs().emit_type("paragraphish").score(1.0).rule();
        assert!(result.is_ok());
    }

    #[test]
    fn conserve_score_without_guaranteed_type_is_rejected() {
        let result = dom::<SimpleDom>("p")
            .rhs()
            .emit_type("paragraphish")
            .conserve_score()
            .rule();
        assert!(matches!(result, Err(EngineError::ConserveScoreWithoutType { .. })));
    }

    #[test]
    fn of_type_rule_can_conserve_score() {
        let result = of_type::<SimpleDom>("paragraphish")
            .rhs()
            .emit_type("candidate")
            .conserve_score()
            .rule();
        assert!(result.is_ok());
    }

    #[test]
    fn predicate_only_lhs_builds_without_rhs() {
        let lhs = of_type::<SimpleDom>("candidate").when(|_f| true).build();
        assert!(matches!(lhs, Lhs::OfType { .. }));
    }
}
