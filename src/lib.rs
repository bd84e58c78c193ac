//! Stackreg is a rule-driven registration scheduler for multi-dimensional
//! image stacks.
//!
//! Given an input stack and a reference stack, both addressable by
//! `(channel, depth, time)` slice position, stackreg decides how each slice
//! is aligned by matching it against an ordered list of user rules, builds a
//! per-slice dependency graph from those rules, validates the graph, and
//! drives an external alignment routine in a deterministic topological
//! order, propagating already-computed transforms to dependent slices.
//!
//! # Pipeline overview
//!
//! 1. **Match**: every slice index is tested against the rule list (first
//!    match wins; unmatched slices are ignored).
//! 2. **Build**: one graph vertex per slice; `use transformation` rules add
//!    an edge from the referenced slice's vertex.
//! 3. **Validate**: in-degree at most 1, all reuse inputs resolved, no
//!    cycles. All violations are reported at once.
//! 4. **Schedule**: deterministic topological order (lexicographic
//!    tie-break among independent slices).
//! 5. **Execute**: per vertex, pass through, align via the [`Aligner`], or
//!    reapply the predecessor's transform; the transform log records every
//!    computed or propagated transform in execution order.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: for a fixed stack shape and rule list,
//!   the schedule and the serialized transform log are byte-identical
//!   across runs.
//! - **Sequential execution**: later vertices may consume transforms
//!   computed for earlier ones; there is no internal parallelism.
//! - **External collaborators behind traits**: the numeric aligner
//!   ([`Aligner`]) and the expression language ([`Evaluator`]) are
//!   capability contracts; built-in [`ExprEvaluator`] covers the stock
//!   expression syntax.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod align;
mod expr;
mod foundation;
mod graph;
mod registration;
mod rules;
mod stack;

pub use align::aligner::{AlignOutcome, AlignParams, Aligner, TransformLog, TransformResult};
pub use expr::context::{VarValue, VariableContext};
pub use expr::evaluator::{Evaluator, ExprEvaluator};
pub use foundation::core::{CancellationToken, SliceIndex, StackDims, TransformKind};
pub use foundation::error::{GraphIntegrityReport, GraphViolation, RegError, RegResult};
pub use graph::builder::{TransformGraph, TransformVertex, build_transform_graph};
pub use graph::topo::topological_order;
pub use graph::validate::validate_graph;
pub use registration::{RegistrationOpts, RegistrationOutput, register_stack};
pub use rules::matcher::match_rule;
pub use rules::model::{Rule, RuleBehavior};
pub use stack::model::{ImageStack, Plane, SlicePixels};
