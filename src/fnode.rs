//! Fnodes: per-element annotation records bearing per-type scores and notes
//! (spec §3 "Fnode").
//!
//! Fnodes live in a flat arena owned by the [`crate::executor::BoundRuleset`]
//! rather than holding a back-pointer to it — the cyclic-ownership problem
//! spec §9 calls out ("Cyclic owner graph") is resolved by handing out a thin
//! [`FnodeRef`] (an index plus a borrow of the arena's owner) instead.

use std::any::Any;
use std::collections::HashMap;

use crate::types::Type;

/// An index into a [`crate::executor::BoundRuleset`]'s fnode arena. Cheap to
/// copy; meaningless outside the bound ruleset that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FnodeId(pub(crate) usize);

/// The score and (optional) note an fnode carries for one type.
#[derive(Debug, Clone, Default)]
pub struct ScoreAndNote {
    /// Defaults to `1.0` when a type is first added to an fnode (spec §3).
    pub score: f64,
    note: Option<std::sync::Arc<dyn Any + Send + Sync>>,
}

impl ScoreAndNote {
    fn new() -> Self {
        ScoreAndNote {
            score: 1.0,
            note: None,
        }
    }
}

/// Per-element record: the types an element bears plus, for each, a score
/// and optional note.
#[derive(Debug, Clone)]
pub struct FnodeData<E> {
    pub(crate) element: E,
    pub(crate) by_type: HashMap<Type, ScoreAndNote>,
}

impl<E> FnodeData<E> {
    pub(crate) fn new(element: E) -> Self {
        FnodeData {
            element,
            by_type: HashMap::new(),
        }
    }

    pub(crate) fn bears(&self, ty: &Type) -> bool {
        self.by_type.contains_key(ty)
    }

    pub(crate) fn score_for(&self, ty: &Type) -> f64 {
        self.by_type.get(ty).map_or(0.0, |sn| sn.score)
    }

    pub(crate) fn note_slot(&self, ty: &Type) -> Option<&std::sync::Arc<dyn Any + Send + Sync>> {
        self.by_type.get(ty).and_then(|sn| sn.note.as_ref())
    }

    /// Ensures `ty` is present (inserting the default score/note slot if it
    /// wasn't), then multiplies its score by `factor`.
    pub(crate) fn multiply_score(&mut self, ty: Type, factor: f64) {
        let entry = self.by_type.entry(ty).or_insert_with(ScoreAndNote::new);
        entry.score *= factor;
    }

    /// Ensures `ty` is present with the default score/note slot.
    pub(crate) fn ensure_type(&mut self, ty: Type) -> bool {
        if self.by_type.contains_key(&ty) {
            false
        } else {
            self.by_type.insert(ty, ScoreAndNote::new());
            true
        }
    }

    /// Sets the note for `ty`. Returns `Err(())` if a non-undefined note was
    /// already set for this (fnode, type) pair (spec §3 `noteOverwrite`).
    pub(crate) fn set_note(&mut self, ty: Type, note: std::sync::Arc<dyn Any + Send + Sync>) -> Result<(), ()> {
        let entry = self.by_type.entry(ty).or_insert_with(ScoreAndNote::new);
        if entry.note.is_some() {
            return Err(());
        }
        entry.note = Some(note);
        Ok(())
    }

    pub(crate) fn types(&self) -> impl Iterator<Item = &Type> {
        self.by_type.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_type_defaults_score_to_one() {
        let mut fnode = FnodeData::new(());
        fnode.multiply_score("t".into(), 1.0);
        assert_eq!(fnode.score_for(&"t".into()), 1.0);
    }

    #[test]
    fn multiplying_score_is_cumulative() {
        let mut fnode = FnodeData::new(());
        fnode.multiply_score("t".into(), 3.0);
        fnode.multiply_score("t".into(), 2.0);
        assert_eq!(fnode.score_for(&"t".into()), 6.0);
    }

    #[test]
    fn setting_note_twice_fails() {
        let mut fnode = FnodeData::new(());
        let note_a: std::sync::Arc<dyn Any + Send + Sync> = std::sync::Arc::new("a".to_string());
        let note_b: std::sync::Arc<dyn Any + Send + Sync> = std::sync::Arc::new("b".to_string());
        assert!(fnode.set_note("t".into(), note_a).is_ok());
        assert!(fnode.set_note("t".into(), note_b).is_err());
    }
}
