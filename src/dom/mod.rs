//! The document contract (spec §6 "Document interface") plus a minimal,
//! dependency-free tree that satisfies it.
//!
//! The engine is generic over any type implementing [`Dom`]; a real embedder
//! swaps in a DOM crate of their own behind the same trait. The [`SimpleDom`]
//! provided here exists so the crate's own tests, doctests, and example
//! rulesets have something to run against — it is fixture scaffolding, not a
//! general HTML engine (spec §1 Non-goals).

mod selector;
mod tree;

pub use selector::SelectorError;
pub use tree::{ElementId, SimpleDom};

use std::fmt::Debug;
use std::hash::Hash;

/// The minimal shape the engine needs from a document.
///
/// An element handle must be cheap to copy and usable as a hash-map key —
/// real DOM crates typically already expose something like this (an index,
/// a pointer wrapper, or similar).
pub trait Dom {
    type Element: Copy + Eq + Hash + Debug;

    /// Query the document by a CSS-selector-like expression, in document
    /// order. Supports the subset described on [`SimpleDom::query_selector_all`];
    /// other implementations may support more.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;

    /// The element's parent, if any.
    fn parent(&self, element: Self::Element) -> Option<Self::Element>;

    /// The element's children, in document order.
    fn children(&self, element: Self::Element) -> Vec<Self::Element>;

    /// The element immediately following `element` among its siblings.
    fn next_sibling(&self, element: Self::Element) -> Option<Self::Element>;

    /// The element immediately preceding `element` among its siblings.
    fn previous_sibling(&self, element: Self::Element) -> Option<Self::Element>;

    /// The element's tag name (lowercase, no namespace prefix).
    fn tag_name(&self, element: Self::Element) -> &str;
}
