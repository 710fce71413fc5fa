//! The execution engine: binds a [`Ruleset`] to one document, runs inward
//! rules on demand, and answers outward queries (spec §3 "BoundRuleset",
//! §4.2 "Fact merging").

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cluster::{self, ClusterOpts};
use crate::dom::Dom;
use crate::error::{EngineError, EngineResult};
use crate::fact::Fact;
use crate::fnode::{FnodeData, FnodeId};
use crate::planner;
use crate::rule::{Lhs, Rule, RuleKind};
use crate::ruleset::Ruleset;
use crate::types::Type;

/// Whether two scores are close enough to count as tied for `Max(t)`,
/// within the relative floating-point tolerance spec §8 allows for score
/// comparisons (`≤ 10⁻⁹ relative`).
fn scores_tie(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

/// A borrowed view of one fnode, handed to predicates and RHS callbacks.
///
/// Cheap to copy; never outlives the [`BoundRuleset`] call that produced it,
/// so callbacks cannot stash one and inspect it after the engine mutates
/// state underneath it (spec §5 "user callbacks run inline").
#[derive(Clone, Copy)]
pub struct FnodeRef<'a, D: Dom> {
    bound: &'a BoundRuleset<D>,
    id: FnodeId,
}

impl<'a, D: Dom> FnodeRef<'a, D> {
    pub fn id(&self) -> FnodeId {
        self.id
    }

    pub fn element(&self) -> D::Element {
        self.bound.fnodes[self.id.0].element
    }

    pub fn dom(&self) -> &D {
        &self.bound.dom
    }

    pub fn bears(&self, ty: impl Into<Type>) -> bool {
        self.bound.fnodes[self.id.0].bears(&ty.into())
    }

    /// The fnode's current score for `ty`, or `0.0` if it doesn't bear it.
    pub fn score(&self, ty: impl Into<Type>) -> f64 {
        self.bound.fnodes[self.id.0].score_for(&ty.into())
    }

    /// The fnode's note for `ty`, downcast to `T`, if present and of that type.
    pub fn note<T: 'static>(&self, ty: impl Into<Type>) -> Option<&T> {
        self.bound.fnodes[self.id.0]
            .note_slot(&ty.into())
            .and_then(|note| note.downcast_ref::<T>())
    }
}

/// A ruleset bound to one document: owns the fnode arena and the caches
/// that let repeated queries reuse prior work (spec §3 "BoundRuleset").
pub struct BoundRuleset<D: Dom> {
    ruleset: Ruleset<D>,
    dom: D,
    fnodes: Vec<FnodeData<D::Element>>,
    fnodes_by_element: HashMap<D::Element, FnodeId>,
    fnodes_by_type: HashMap<Type, Vec<FnodeId>>,
    max_cache_by_type: HashMap<Type, Vec<FnodeId>>,
    best_cluster_cache_by_type: HashMap<Type, Vec<FnodeId>>,
    done_inward_rules: HashSet<usize>,
}

impl<D: Dom> BoundRuleset<D> {
    pub(crate) fn new(ruleset: Ruleset<D>, dom: D) -> Self {
        BoundRuleset {
            ruleset,
            dom,
            fnodes: Vec::new(),
            fnodes_by_element: HashMap::new(),
            fnodes_by_type: HashMap::new(),
            max_cache_by_type: HashMap::new(),
            best_cluster_cache_by_type: HashMap::new(),
            done_inward_rules: HashSet::new(),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub(crate) fn fref(&self, id: FnodeId) -> FnodeRef<'_, D> {
        FnodeRef { bound: self, id }
    }

    fn get_or_create_fnode(&mut self, element: D::Element) -> FnodeId {
        if let Some(&id) = self.fnodes_by_element.get(&element) {
            return id;
        }
        let id = FnodeId(self.fnodes.len());
        self.fnodes.push(FnodeData::new(element));
        self.fnodes_by_element.insert(element, id);
        id
    }

    /// The fnode already recorded for `element`, if any query has touched it.
    pub fn fnode_for_element(&self, element: D::Element) -> Option<FnodeId> {
        self.fnodes_by_element.get(&element).copied()
    }

    fn invalidate_type_caches(&mut self, ty: &Type) {
        self.max_cache_by_type.remove(ty);
        self.best_cluster_cache_by_type.remove(ty);
    }

    /// Applies `fact`, the result of running `rule` against `input_id`, to
    /// whichever fnode it targets (spec §4.2 "Fact merging").
    fn apply_fact(&mut self, rule: &Rule<D>, input_id: FnodeId, fact: Fact<D::Element>) -> EngineResult<()> {
        let target_id = match fact.element {
            Some(el) => self.get_or_create_fnode(el),
            None => input_id,
        };

        let effective_type = fact.ty.clone().or_else(|| rule.lhs().guaranteed_type().cloned());

        let Some(ty) = effective_type else {
            // A pure redirect with no type to merge in (e.g. just relocating
            // the subject element); nothing further to apply.
            return Ok(());
        };

        let is_new = self.fnodes[target_id.0].ensure_type(ty.clone());

        if fact.conserve_score {
            let source_type = rule
                .lhs()
                .guaranteed_type()
                .expect("conserve_score is validated against a guaranteed LHS type at rule construction");
            let carried = self.fnodes[input_id.0].score_for(source_type);
            self.fnodes[target_id.0].multiply_score(ty.clone(), carried);
        }

        if let Some(score) = fact.score {
            self.fnodes[target_id.0].multiply_score(ty.clone(), score);
        }

        if let Some(note) = fact.note {
            if self.fnodes[target_id.0].set_note(ty.clone(), note).is_err() {
                return Err(EngineError::NoteOverwrite {
                    rule: rule.debug_label(),
                    ty: ty.to_string(),
                });
            }
        }

        if is_new {
            self.fnodes_by_type.entry(ty.clone()).or_default().push(target_id);
        }
        self.invalidate_type_caches(&ty);
        trace!(rule = %rule.debug_label(), ty = %ty, target = target_id.0, "executor: fact merged");
        Ok(())
    }

    /// Evaluates `lhs` against the current fnode state without running any
    /// further rules; callers must ensure prerequisites already ran.
    fn match_lhs(&mut self, lhs: &Lhs<D>) -> EngineResult<Vec<FnodeId>> {
        match lhs {
            Lhs::Dom { selector, predicate } => {
                let elements = self.dom.query_selector_all(selector);
                let mut out = Vec::with_capacity(elements.len());
                for element in elements {
                    let id = self.get_or_create_fnode(element);
                    if predicate.as_ref().is_none_or(|p| p(self.fref(id))) {
                        out.push(id);
                    }
                }
                Ok(out)
            }
            Lhs::OfType { ty, predicate } => Ok(self.matches_of_type(ty, predicate.as_deref())),
            Lhs::Max { ty, predicate } => self.match_max(ty, predicate.as_deref()),
            Lhs::BestCluster { ty, opts, predicate } => self.match_best_cluster(ty, opts, predicate.as_deref()),
            Lhs::And { types, predicate } => Ok(self.match_and(types, predicate.as_deref())),
        }
    }

    fn matches_of_type(&self, ty: &Type, predicate: Option<&(dyn Fn(FnodeRef<'_, D>) -> bool + Send + Sync)>) -> Vec<FnodeId> {
        let ids = self.fnodes_by_type.get(ty).cloned().unwrap_or_default();
        match predicate {
            None => ids,
            Some(p) => ids.into_iter().filter(|&id| p(self.fref(id))).collect(),
        }
    }

    /// Returns every fnode tied for the highest `scoreFor(ty)`, not just one
    /// of them (spec §4.3 "ties return all tied fnodes"; spec §8 "`Max(t)`
    /// returns all tied top-scoring fnodes, count ≥ 1 unless set is empty").
    fn match_max(
        &mut self,
        ty: &Type,
        predicate: Option<&(dyn Fn(FnodeRef<'_, D>) -> bool + Send + Sync)>,
    ) -> EngineResult<Vec<FnodeId>> {
        if predicate.is_none() {
            if let Some(cached) = self.max_cache_by_type.get(ty) {
                debug!(ty = %ty, "executor: max cache hit");
                return Ok(cached.clone());
            }
        }
        let candidates = self.matches_of_type(ty, predicate);
        let max_score = candidates
            .iter()
            .map(|&id| self.fnodes[id.0].score_for(ty))
            .fold(f64::NEG_INFINITY, f64::max);
        let best: Vec<FnodeId> = candidates
            .into_iter()
            .filter(|&id| scores_tie(self.fnodes[id.0].score_for(ty), max_score))
            .collect();
        if predicate.is_none() && !best.is_empty() {
            self.max_cache_by_type.insert(ty.clone(), best.clone());
        }
        Ok(best)
    }

    fn match_best_cluster(
        &mut self,
        ty: &Type,
        opts: &ClusterOpts<D>,
        predicate: Option<&(dyn Fn(FnodeRef<'_, D>) -> bool + Send + Sync)>,
    ) -> EngineResult<Vec<FnodeId>> {
        if predicate.is_none() {
            if let Some(cached) = self.best_cluster_cache_by_type.get(ty) {
                debug!(ty = %ty, "executor: best-cluster cache hit");
                return Ok(cached.clone());
            }
        }
        let candidates = self.matches_of_type(ty, predicate);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let elements: Vec<D::Element> = candidates.iter().map(|&id| self.fnodes[id.0].element).collect();
        let clusters = cluster::agglomerative_cluster(&elements, opts.splitting_distance, |&a, &b| {
            cluster::distance(&self.dom, a, b, opts)
        });

        let best_cluster = clusters
            .into_iter()
            .max_by(|a, b| {
                let score_of = |cl: &Vec<usize>| -> f64 {
                    cl.iter().map(|&i| self.fnodes[candidates[i].0].score_for(ty)).sum()
                };
                score_of(a)
                    .partial_cmp(&score_of(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or_default();

        let result: Vec<FnodeId> = best_cluster.into_iter().map(|i| candidates[i]).collect();
        if predicate.is_none() {
            self.best_cluster_cache_by_type.insert(ty.clone(), result.clone());
        }
        Ok(result)
    }

    fn match_and(&self, types: &[Type], predicate: Option<&(dyn Fn(FnodeRef<'_, D>) -> bool + Send + Sync)>) -> Vec<FnodeId> {
        let Some((first, rest)) = types.split_first() else {
            return Vec::new();
        };
        let ids = self.fnodes_by_type.get(first).cloned().unwrap_or_default();
        let mut out: Vec<FnodeId> = ids
            .into_iter()
            .filter(|id| rest.iter().all(|ty| self.fnodes[id.0].bears(ty)))
            .collect();
        if let Some(p) = predicate {
            out.retain(|&id| p(self.fref(id)));
        }
        out
    }

    fn run_rule(&mut self, rule_id: usize) -> EngineResult<()> {
        if self.done_inward_rules.contains(&rule_id) {
            return Err(EngineError::DoubleExecution {
                rule: self.ruleset.rule(rule_id).debug_label(),
            });
        }
        let rule = self.ruleset.rule(rule_id).clone();
        let rhs = match rule.kind() {
            RuleKind::Inward(rhs) => Arc::clone(rhs),
            RuleKind::Outward(_) => {
                self.done_inward_rules.insert(rule_id);
                return Ok(());
            }
        };

        let matches = self.match_lhs(rule.lhs())?;
        let input_type = rule.lhs().guaranteed_type().cloned();
        for input_id in matches {
            let fact = rhs.fact(self.fref(input_id), input_type.as_ref())?;
            self.apply_fact(&rule, input_id, fact)?;
        }

        self.done_inward_rules.insert(rule_id);
        Ok(())
    }

    fn run_plan(&mut self, plan: Vec<usize>) -> EngineResult<()> {
        let rule_count = plan.len();
        for rule_id in plan {
            self.run_rule(rule_id)?;
        }
        debug!(rule_count, "executor: plan finished");
        Ok(())
    }

    /// Runs whatever inward rules are needed, then returns the outward
    /// sink's accumulated results (spec §6 "get(key)").
    pub fn get(&mut self, key: &str) -> EngineResult<Vec<FnodeId>> {
        let plan = planner::plan_for_key(&self.ruleset, key, &self.done_inward_rules)?;
        self.run_plan(plan)?;

        let rule_ids = self.ruleset.outward_rules_for(key).to_vec();
        let mut results = Vec::new();
        for rule_id in rule_ids {
            let rule = self.ruleset.rule(rule_id).clone();
            let RuleKind::Outward(out) = rule.kind() else { continue };
            let matches = self.match_lhs(rule.lhs())?;
            let per_item: Vec<FnodeId> = matches.into_iter().map(|id| (out.through)(self.fref(id))).collect();
            let transformed = (out.all_through)(self, per_item);
            results.extend(transformed);
        }
        Ok(results)
    }

    /// Runs whatever inward rules are needed, then evaluates `lhs` directly
    /// (spec §6 "get(lhs)") without going through any outward sink.
    pub fn get_matching(&mut self, lhs: &Lhs<D>) -> EngineResult<Vec<FnodeId>> {
        let plan = planner::plan_for_lhs(&self.ruleset, lhs, &self.done_inward_rules)?;
        self.run_plan(plan)?;
        self.match_lhs(lhs)
    }

    /// The fnode already recorded for `element`, without running any rules
    /// (spec §6 "get(element)"). Returns `None` if no prior query has
    /// touched this element yet.
    pub fn get_element(&self, element: D::Element) -> Option<FnodeRef<'_, D>> {
        self.fnodes_by_element.get(&element).map(|&id| self.fref(id))
    }

    pub fn score_of(&self, fnode: FnodeId, ty: impl Into<Type>) -> f64 {
        self.fnodes[fnode.0].score_for(&ty.into())
    }

    pub fn note_of<T: Any + 'static>(&self, fnode: FnodeId, ty: impl Into<Type>) -> Option<&T> {
        self.fnodes[fnode.0].note_slot(&ty.into()).and_then(|n| n.downcast_ref::<T>())
    }

    pub fn element_of(&self, fnode: FnodeId) -> D::Element {
        self.fnodes[fnode.0].element
    }
}
