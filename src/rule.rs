//! LHS / RHS values and the `Rule` they pair into (spec §3 "Rule", §4.3 "LHS
//! variants"). Data descriptions live here; the behavior that interprets
//! them (matching an LHS against a bound ruleset, applying an RHS's fact)
//! lives in [`crate::executor`].

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cluster::ClusterOpts;
use crate::dom::Dom;
use crate::executor::{BoundRuleset, FnodeRef};
use crate::fact::Fact;
use crate::fnode::FnodeId;
use crate::types::Type;

pub type Predicate<D> = Arc<dyn Fn(FnodeRef<'_, D>) -> bool + Send + Sync>;

/// What an RHS declares it might produce, independent of any one input
/// (spec §4.1 "Emit/add metadata").
#[derive(Debug, Clone, Default)]
pub struct PossibleEmissions {
    /// Whether the RHS can emit a type other than the LHS's guaranteed type.
    pub could_change_type: bool,
    /// The static set of types the RHS may produce.
    pub possible_types: HashSet<Type>,
}

/// Left-hand side: selects input fnodes (spec §4.3).
pub enum Lhs<D: Dom> {
    Dom {
        selector: String,
        predicate: Option<Predicate<D>>,
    },
    OfType {
        ty: Type,
        predicate: Option<Predicate<D>>,
    },
    Max {
        ty: Type,
        predicate: Option<Predicate<D>>,
    },
    BestCluster {
        ty: Type,
        opts: ClusterOpts<D>,
        predicate: Option<Predicate<D>>,
    },
    And {
        types: Vec<Type>,
        predicate: Option<Predicate<D>>,
    },
}

impl<D: Dom> Clone for Lhs<D> {
    fn clone(&self) -> Self {
        match self {
            Lhs::Dom { selector, predicate } => Lhs::Dom {
                selector: selector.clone(),
                predicate: predicate.clone(),
            },
            Lhs::OfType { ty, predicate } => Lhs::OfType {
                ty: ty.clone(),
                predicate: predicate.clone(),
            },
            Lhs::Max { ty, predicate } => Lhs::Max {
                ty: ty.clone(),
                predicate: predicate.clone(),
            },
            Lhs::BestCluster { ty, opts, predicate } => Lhs::BestCluster {
                ty: ty.clone(),
                opts: opts.clone(),
                predicate: predicate.clone(),
            },
            Lhs::And { types, predicate } => Lhs::And {
                types: types.clone(),
                predicate: predicate.clone(),
            },
        }
    }
}

impl<D: Dom> Lhs<D> {
    /// The type every match is guaranteed to bear, if any (spec §4.3).
    pub fn guaranteed_type(&self) -> Option<&Type> {
        match self {
            Lhs::Dom { .. } | Lhs::And { .. } => None,
            Lhs::OfType { ty, .. } | Lhs::Max { ty, .. } | Lhs::BestCluster { ty, .. } => Some(ty),
        }
    }

    /// The types this LHS depends on (spec §4.1 `M(R)`).
    pub fn mentioned_types(&self) -> Vec<Type> {
        match self {
            Lhs::Dom { .. } => Vec::new(),
            Lhs::OfType { ty, .. } | Lhs::Max { ty, .. } | Lhs::BestCluster { ty, .. } => {
                vec![ty.clone()]
            }
            Lhs::And { types, .. } => types.clone(),
        }
    }

    /// `true` for the aggregate LHS variants that finalize their type
    /// unconditionally (spec §4.1).
    pub fn is_blanket_aggregate(&self) -> bool {
        matches!(self, Lhs::Max { .. } | Lhs::BestCluster { .. })
    }

    pub fn predicate(&self) -> Option<&Predicate<D>> {
        match self {
            Lhs::Dom { predicate, .. }
            | Lhs::OfType { predicate, .. }
            | Lhs::Max { predicate, .. }
            | Lhs::BestCluster { predicate, .. }
            | Lhs::And { predicate, .. } => predicate.as_ref(),
        }
    }

    /// Returns a clone of this LHS with an additional post-filter applied
    /// to matches (spec §4.3 ".when(predicate)").
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(FnodeRef<'_, D>) -> bool + Send + Sync + 'static) -> Self {
        let boxed: Predicate<D> = Arc::new(predicate);
        match &mut self {
            Lhs::Dom { predicate, .. }
            | Lhs::OfType { predicate, .. }
            | Lhs::Max { predicate, .. }
            | Lhs::BestCluster { predicate, .. }
            | Lhs::And { predicate, .. } => *predicate = Some(boxed),
        }
        self
    }

    pub(crate) fn debug_label(&self) -> String {
        match self {
            Lhs::Dom { selector, .. } => format!("dom({selector:?})"),
            Lhs::OfType { ty, .. } => format!("type({ty})"),
            Lhs::Max { ty, .. } => format!("max({ty})"),
            Lhs::BestCluster { ty, .. } => format!("best_cluster({ty})"),
            Lhs::And { types, .. } => {
                format!(
                    "and({})",
                    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                )
            }
        }
    }
}

/// The right-hand side of an inward rule: given an input fnode, produces a
/// fact plus static emission metadata (spec §6 "RHS interface").
pub trait InwardRhs<D: Dom> {
    fn fact(&self, input: FnodeRef<'_, D>, input_type: Option<&Type>) -> crate::error::EngineResult<Fact<D::Element>>;
    fn possible_emissions(&self) -> PossibleEmissions;
}

type ThroughFn<D> = Arc<dyn Fn(FnodeRef<'_, D>) -> FnodeId + Send + Sync>;
type AllThroughFn<D> = Arc<dyn Fn(&BoundRuleset<D>, Vec<FnodeId>) -> Vec<FnodeId> + Send + Sync>;

/// The right-hand side of an outward rule: a named sink, with per-item and
/// whole-sequence post-processing callbacks (spec §3 "Outward").
#[derive(Clone)]
pub struct OutwardRhs<D: Dom> {
    pub(crate) key: String,
    pub(crate) through: ThroughFn<D>,
    pub(crate) all_through: AllThroughFn<D>,
}

impl<D: Dom> OutwardRhs<D> {
    pub fn new(key: impl Into<String>) -> Self {
        OutwardRhs {
            key: key.into(),
            through: Arc::new(|f: FnodeRef<'_, D>| f.id()),
            all_through: Arc::new(|_, v| v),
        }
    }

    #[must_use]
    pub fn through(mut self, f: impl Fn(FnodeRef<'_, D>) -> FnodeId + Send + Sync + 'static) -> Self {
        self.through = Arc::new(f);
        self
    }

    #[must_use]
    pub fn all_through(
        mut self,
        f: impl Fn(&BoundRuleset<D>, Vec<FnodeId>) -> Vec<FnodeId> + Send + Sync + 'static,
    ) -> Self {
        self.all_through = Arc::new(f);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

pub enum RuleKind<D: Dom> {
    Inward(Arc<dyn InwardRhs<D> + Send + Sync>),
    Outward(OutwardRhs<D>),
}

impl<D: Dom> Clone for RuleKind<D> {
    fn clone(&self) -> Self {
        match self {
            RuleKind::Inward(rhs) => RuleKind::Inward(rhs.clone()),
            RuleKind::Outward(rhs) => RuleKind::Outward(rhs.clone()),
        }
    }
}

/// An immutable (LHS, RHS) pair (spec §3 "Rule").
pub struct Rule<D: Dom> {
    /// Insertion order, used for tie-breaking independent rules (spec §4.1
    /// "Tie-breaking").
    pub(crate) id: usize,
    pub(crate) lhs: Lhs<D>,
    pub(crate) kind: RuleKind<D>,
}

impl<D: Dom> Clone for Rule<D> {
    fn clone(&self) -> Self {
        Rule {
            id: self.id,
            lhs: self.lhs.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl<D: Dom> Rule<D> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn lhs(&self) -> &Lhs<D> {
        &self.lhs
    }

    pub fn kind(&self) -> &RuleKind<D> {
        &self.kind
    }

    pub fn is_outward(&self) -> bool {
        matches!(self.kind, RuleKind::Outward(_))
    }

    /// `true` if this rule's prerequisite types are *finalized* — i.e. every
    /// rule that could emit them must run first, rather than only the rules
    /// that could newly add them (spec §4.1 "Finalization rules").
    ///
    /// An aggregate LHS (`Max`/`BestCluster`) always finalizes, as does an
    /// outward rule's LHS. A plain `OfType`/`And` LHS finalizes only if its
    /// RHS could emit some type outside the LHS's guaranteed-type
    /// combination `C` (spec §4.1: "over every possible guaranteed-type
    /// combination C from the LHS, if the RHS can emit some type not in C,
    /// the types in C are finalized") — `C` is `{ty}` for `OfType`, the full
    /// set for `And`. This is derived from the RHS's declared
    /// `possible_types` rather than from a separately tracked flag, so a
    /// statically-declared type that merely differs from the guaranteed one
    /// (e.g. `.emit_type("b")` on an `OfType("a")` LHS) is still correctly
    /// seen as type-changing. `Dom` mentions no types, so the question never
    /// arises for it.
    pub(crate) fn finalizes_mentioned_types(&self) -> bool {
        if self.lhs.is_blanket_aggregate() {
            return true;
        }
        let RuleKind::Inward(rhs) = &self.kind else {
            return true; // outward rules always finalize every mentioned type
        };
        let possible_types = rhs.possible_emissions().possible_types;
        match &self.lhs {
            Lhs::Dom { .. } => false,
            Lhs::OfType { ty, .. } => possible_types.iter().any(|t| t != ty),
            Lhs::And { types, .. } => possible_types.iter().any(|t| !types.contains(t)),
            Lhs::Max { .. } | Lhs::BestCluster { .. } => true,
        }
    }

    pub(crate) fn debug_label(&self) -> String {
        match &self.kind {
            RuleKind::Inward(_) => format!("rule#{} ({})", self.id, self.lhs.debug_label()),
            RuleKind::Outward(rhs) => format!("rule#{} -> {:?}", self.id, rhs.key()),
        }
    }
}

/// A closure-driven [`InwardRhs`] built by the fluent builder in
/// [`crate::rule_builder`].
pub(crate) struct ClosureRhs<D: Dom> {
    pub(crate) emissions: PossibleEmissions,
    pub(crate) type_fn: Option<Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<Type> + Send + Sync>>,
    pub(crate) score_fn: Option<Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> f64 + Send + Sync>>,
    #[allow(clippy::type_complexity)]
    pub(crate) note_fn:
        Option<Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<Arc<dyn Any + Send + Sync>> + Send + Sync>>,
    pub(crate) element_fn: Option<Arc<dyn Fn(FnodeRef<'_, D>, Option<&Type>) -> Option<D::Element> + Send + Sync>>,
    pub(crate) conserve_score: bool,
}

impl<D: Dom> InwardRhs<D> for ClosureRhs<D> {
    fn fact(&self, input: FnodeRef<'_, D>, input_type: Option<&Type>) -> crate::error::EngineResult<Fact<D::Element>> {
        let mut fact = Fact::new();
        if let Some(f) = &self.element_fn {
            if let Some(el) = f(input, input_type) {
                fact = fact.with_element(el);
            }
        }
        if let Some(f) = &self.type_fn {
            if let Some(ty) = f(input, input_type) {
                fact = fact.with_type(ty);
            }
        }
        if let Some(f) = &self.score_fn {
            fact = fact.with_score(f(input, input_type));
        }
        if let Some(f) = &self.note_fn {
            if let Some(note) = f(input, input_type) {
                fact.note = Some(note);
            }
        }
        if self.conserve_score {
            fact = fact.conserving_score();
        }
        Ok(fact)
    }

    fn possible_emissions(&self) -> PossibleEmissions {
        self.emissions.clone()
    }
}
