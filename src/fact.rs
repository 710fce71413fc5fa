//! Facts: the payload an RHS emits for one input fnode, and the merge
//! semantics that apply it to a target fnode (spec §3 "Fact").

use std::any::Any;
use std::sync::Arc;

use crate::types::Type;

/// A value emitted from an RHS for one input fnode.
///
/// Constructed via the `Fact::new()` builder methods rather than struct
/// literal, since most facts only set one or two of these fields.
#[derive(Clone)]
pub struct Fact<E> {
    /// Redirects the fact to another element's fnode.
    pub(crate) element: Option<E>,
    /// Adds this type to the target fnode, if absent.
    pub(crate) ty: Option<Type>,
    /// Multiplies the target fnode's score for the effective type.
    pub(crate) score: Option<f64>,
    /// Sets the note for the effective type (subject to the overwrite invariant).
    pub(crate) note: Option<Arc<dyn Any + Send + Sync>>,
    /// Multiplies the LHS type's score on the source fnode into the
    /// target's effective type before the RHS's own score.
    pub(crate) conserve_score: bool,
}

impl<E> Default for Fact<E> {
    fn default() -> Self {
        Fact {
            element: None,
            ty: None,
            score: None,
            note: None,
            conserve_score: false,
        }
    }
}

impl<E> Fact<E> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_element(mut self, element: E) -> Self {
        self.element = Some(element);
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: impl Into<Type>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_note<T: Send + Sync + 'static>(mut self, note: T) -> Self {
        self.note = Some(Arc::new(note));
        self
    }

    #[must_use]
    pub fn conserving_score(mut self) -> Self {
        self.conserve_score = true;
        self
    }
}
