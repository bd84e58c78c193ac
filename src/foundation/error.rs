use std::fmt;

use crate::foundation::core::SliceIndex;

/// Convenience result type used across stackreg.
pub type RegResult<T> = Result<T, RegError>;

/// Top-level error taxonomy used by registration APIs.
#[derive(thiserror::Error, Debug)]
pub enum RegError {
    /// Invalid user-provided configuration or stack data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating a rule condition or reference expression.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A `UseTransformation` rule referenced a slice that does not exist,
    /// or referenced the slice it was matched against.
    #[error(
        "unresolved transformation reference for slice {at}: no usable slice at (c={}, z={}, t={})",
        .referenced.0, .referenced.1, .referenced.2
    )]
    UnresolvedReference {
        /// Slice whose rule failed to resolve.
        at: SliceIndex,
        /// The raw referenced coordinates that could not be used.
        referenced: (i64, i64, i64),
    },

    /// The dependency graph violates its structural invariants.
    #[error("transformation graph is invalid: {0}")]
    GraphIntegrity(GraphIntegrityReport),

    /// Failure propagated from the external alignment routine.
    #[error("alignment error: {0}")]
    Align(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The run was cancelled cooperatively; a clean abort, not a failure.
    #[error("registration run cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RegError {
    /// Build a [`RegError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RegError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`RegError::Align`] value.
    pub fn align(msg: impl Into<String>) -> Self {
        Self::Align(msg.into())
    }

    /// Build a [`RegError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// A single structural violation found during graph validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphViolation {
    /// More than one transformation source feeds the vertex at this index.
    ConflictingSource(SliceIndex),
    /// A `UseTransformation` vertex ended up without a resolved input edge.
    UnresolvedInput(SliceIndex),
    /// The vertex at this index participates in a dependency cycle.
    Cycle(SliceIndex),
}

impl fmt::Display for GraphViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphViolation::ConflictingSource(at) => {
                write!(f, "conflicting transformation source for slice {at}")
            }
            GraphViolation::UnresolvedInput(at) => {
                write!(f, "unresolved transformation input for slice {at}")
            }
            GraphViolation::Cycle(at) => {
                write!(f, "dependency cycle through slice {at}")
            }
        }
    }
}

/// Aggregated graph validation failures, in lexicographic vertex order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphIntegrityReport {
    /// Every violation found; never empty when surfaced as an error.
    pub violations: Vec<GraphViolation>,
}

impl fmt::Display for GraphIntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
