//! # Fathom Core
//!
//! A declarative rule-graph engine for scoring and classifying regions of a
//! DOM tree: rules written against a small set of selectors (`dom`,
//! `of_type`, `max`, `best_cluster`, `and`) accumulate typed, scored, and
//! annotated facts onto elements, which outward rules then collect into
//! named results.
//!
//! ## Pipeline
//!
//! ```text
//! Ruleset (built once, Rc-shared)
//!     ↓ .bind(dom)
//! BoundRuleset                    → per-document fnode arena
//!     ↓ .get("key")
//! [Planner]                       → topo-sorted prerequisite rules
//!     ↓
//! [Executor]                      → runs inward rules, merges facts
//!     ↓
//! [Outward RHS]                   → through() / all_through() postprocessing
//!     ↓
//! Vec<FnodeId>
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fathom_core::dom::SimpleDom;
//! use fathom_core::rule_builder::{dom, max};
//! use fathom_core::ruleset::Ruleset;
//!
//! let mut builder = SimpleDom::builder();
//! let body = builder.leaf("body", None);
//! let _p = builder.leaf("p", Some(body));
//! let document = builder.build();
//!
//! let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
//!     .rule(dom("p").rhs().emit_type("paragraphish").score(1.0).rule().unwrap())
//!     .rule(max("paragraphish").rule_to("best_paragraph"))
//!     .build();
//!
//! let mut bound = ruleset.bind(document);
//! let results = bound.get("best_paragraph").unwrap();
//! ```
//!
//! ## Module organization
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | The `Type` label rules are keyed by |
//! | [`dom`] | The `Dom` document contract plus a reference implementation |
//! | [`fnode`] | Per-element score/note storage |
//! | [`fact`] | The value an RHS emits for one input |
//! | [`rule`] | LHS/RHS value types and the `Rule` they pair into |
//! | [`rule_builder`] | Fluent construction of rules |
//! | [`ruleset`] | Accumulating and freezing rules into a `Ruleset` |
//! | [`planner`] | Prerequisite resolution and cycle detection |
//! | [`executor`] | Binding a ruleset to a document and running queries |
//! | [`cluster`] | Tree-position distance and agglomerative clustering |
//! | [`anneal`] | Simulated-annealing parameter search |
//! | [`config`] | Hierarchical TOML/env configuration |
//! | [`error`] | The engine's stable error kinds |
//! | [`utils`] | Small text helpers reused across rules |

pub mod anneal;
pub mod cluster;
pub mod config;
pub mod dom;
pub mod error;
pub mod executor;
pub mod fact;
pub mod fnode;
mod planner;
pub mod rule;
pub mod rule_builder;
pub mod ruleset;
pub mod types;
pub mod utils;

pub use cluster::{ClusterCosts, ClusterOpts};
pub use error::{EngineError, EngineResult};
pub use executor::{BoundRuleset, FnodeRef};
pub use fact::Fact;
pub use fnode::FnodeId;
pub use rule::{InwardRhs, Lhs, OutwardRhs, Rule};
pub use ruleset::{Ruleset, RulesetBuilder};
pub use types::Type;
