use kurbo::Point;

use crate::foundation::core::{SliceIndex, TransformKind};
use crate::foundation::error::{RegError, RegResult};
use crate::stack::model::Plane;

/// Tunable parameters forwarded opaquely to the alignment routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AlignParams {
    /// Minimum image size of the coarsest resolution level.
    pub min_size: u32,
    /// Iteration budget of the optimizer per resolution level.
    pub max_iterations: u32,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            min_size: 12,
            max_iterations: 10,
        }
    }
}

/// Landmark correspondences returned by [`Aligner::align`], plus the
/// transformed source plane.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignOutcome {
    /// Landmark positions in the source slice.
    pub source_points: Vec<Point>,
    /// Matching landmark positions in the reference slice.
    pub target_points: Vec<Point>,
    /// The source plane warped onto the reference.
    pub transformed: Plane,
}

/// A computed transform, tagged with the slices it maps between.
///
/// Immutable once created; propagation to dependent slices copies the value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformResult {
    /// The input slice the transform was computed (or reused) for.
    pub source_index: SliceIndex,
    /// The reference slice the source was aligned against.
    pub target_index: SliceIndex,
    /// Transform family.
    pub kind: TransformKind,
    /// Landmark positions in the source slice.
    pub source_points: Vec<Point>,
    /// Matching landmark positions in the reference slice.
    pub target_points: Vec<Point>,
}

/// Ordered record of every transform computed or propagated during a run.
///
/// Serialized as human-diffable JSON; an empty log still serializes as an
/// empty entry list.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformLog {
    /// Entries in execution order.
    pub entries: Vec<TransformResult>,
}

impl TransformLog {
    /// Serialize the log as pretty-printed JSON.
    pub fn to_pretty_json(&self) -> RegResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RegError::serde(e.to_string()))
    }
}

/// Contract for the external numeric alignment routine.
///
/// Alignment always operates on greyscale planes; the scheduler reduces
/// color slices before calling [`Aligner::align`] and reapplies the computed
/// transform per channel with [`Aligner::apply_transform`].
pub trait Aligner {
    /// Register `source` against `reference`, returning the landmark
    /// correspondences and the transformed source plane.
    fn align(
        &self,
        source: &Plane,
        reference: &Plane,
        kind: TransformKind,
        params: &AlignParams,
    ) -> RegResult<AlignOutcome>;

    /// Warp `source` with an already-computed landmark correspondence.
    fn apply_transform(
        &self,
        source: &Plane,
        out_width: u32,
        out_height: u32,
        kind: TransformKind,
        source_points: &[Point],
        target_points: &[Point],
    ) -> RegResult<Plane>;
}
