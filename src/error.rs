//! Stable error kinds surfaced to callers (spec §7).
//!
//! Mirrors the layered `thiserror` enums the rest of the pack uses for its
//! own subsystems (e.g. storage and execution error types): one enum per
//! subsystem boundary, each variant carrying enough context to identify the
//! offending rule without the caller needing to re-derive it.

use thiserror::Error;

/// Errors the engine can raise. Each variant corresponds to one of the
/// stable identifiers named in spec §7, used by the crate's own test suite
/// and expected to remain stable for embedders' test suites too.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The planner detected a cyclic prerequisite graph.
    #[error("cycle detected in rule prerequisites while planning rule {rule}")]
    Cycle { rule: String },

    /// `get(key)` was called with a key no outward rule produces.
    #[error("no outward rule produces key {key:?}")]
    MissingOutKey { key: String },

    /// `get` received an argument that is neither a key, an LHS, nor an element.
    #[error("get() argument must be a key, an LHS, or a DOM element")]
    BadGetArgument,

    /// An RHS requested `conserve_score` but its LHS has no guaranteed type.
    #[error("rule {rule}: conserve_score requires an LHS with a guaranteed type")]
    ConserveScoreWithoutType { rule: String },

    /// An RHS supplied `score` and neither explicit nor inferable type.
    #[error("rule {rule}: score given without an inferable type")]
    ScoreWithoutInferableType { rule: String },

    /// An RHS supplied `note` (or a bare type add) without an inferable type.
    #[error("rule {rule}: note given without an inferable type")]
    NoteWithoutInferableType { rule: String },

    /// Rule construction could not determine what type the RHS may emit.
    #[error("rule {rule}: could not determine what type this rule may emit")]
    UnderspecifiedEmission { rule: String },

    /// A `Dom(selector)` LHS was paired with an RHS that emits no type.
    #[error("rule {rule}: a dom() rule's RHS must assign a type")]
    DomRuleMustAssignType { rule: String },

    /// A note already set to a non-undefined value was reassigned.
    #[error("rule {rule}: note for type {ty} was already set and cannot be overwritten")]
    NoteOverwrite { rule: String, ty: String },

    /// `And(...)` received a non-simple-type argument.
    #[error("and() only supports simple type arguments, got an aggregate LHS")]
    UnsupportedAnd,

    /// Internal invariant violation: an inward rule ran more than once.
    #[error("internal error: inward rule {rule} was scheduled to execute twice (planner bug)")]
    DoubleExecution { rule: String },

    /// An error raised by a user-supplied RHS, predicate, or cost-function
    /// callback. Per spec §4.2 these propagate unchanged rather than being
    /// reinterpreted as one of the structural kinds above.
    #[error("{0}")]
    Custom(String),
}

impl EngineError {
    /// Wrap an arbitrary user-callback error for propagation (spec §4.2
    /// "Error propagation: Execution errors from user callbacks propagate
    /// unchanged").
    pub fn custom(message: impl std::fmt::Display) -> Self {
        EngineError::Custom(message.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
