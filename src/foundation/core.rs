use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{RegError, RegResult};

/// Position of one 2D slice inside a channel × depth × time stack.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct SliceIndex {
    /// Channel coordinate.
    pub channel: u32,
    /// Depth (z) coordinate.
    pub depth: u32,
    /// Time (frame) coordinate.
    pub time: u32,
}

impl SliceIndex {
    /// Build a slice index from `(channel, depth, time)` coordinates.
    pub fn new(channel: u32, depth: u32, time: u32) -> Self {
        Self {
            channel,
            depth,
            time,
        }
    }
}

impl fmt::Display for SliceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(c={}, z={}, t={})", self.channel, self.depth, self.time)
    }
}

/// Extent of a stack along its channel, depth, and time axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StackDims {
    /// Number of channels.
    pub channels: u32,
    /// Number of depth (z) slices.
    pub depths: u32,
    /// Number of time frames.
    pub times: u32,
}

impl StackDims {
    /// Build stack dimensions; every axis must have at least one slice.
    pub fn new(channels: u32, depths: u32, times: u32) -> RegResult<Self> {
        if channels == 0 || depths == 0 || times == 0 {
            return Err(RegError::validation(
                "StackDims axes must all be at least 1",
            ));
        }
        Ok(Self {
            channels,
            depths,
            times,
        })
    }

    /// Total number of slices in the stack.
    pub fn slice_count(self) -> u64 {
        u64::from(self.channels) * u64::from(self.depths) * u64::from(self.times)
    }

    /// Whether `index` addresses a slice within these dimensions.
    pub fn contains(self, index: SliceIndex) -> bool {
        index.channel < self.channels && index.depth < self.depths && index.time < self.times
    }

    /// Clamp `index` onto the nearest valid slice along each axis.
    pub fn clamp(self, index: SliceIndex) -> SliceIndex {
        SliceIndex {
            channel: index.channel.min(self.channels - 1),
            depth: index.depth.min(self.depths - 1),
            time: index.time.min(self.times - 1),
        }
    }

    /// Iterate every slice index in lexicographic `(channel, depth, time)` order.
    pub fn iter(self) -> impl Iterator<Item = SliceIndex> {
        (0..self.channels).flat_map(move |c| {
            (0..self.depths)
                .flat_map(move |z| (0..self.times).map(move |t| SliceIndex::new(c, z, t)))
        })
    }
}

/// Geometric transform family used for alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Pure translation; one landmark.
    Translation,
    /// Translation plus rotation; distances conserved.
    RigidBody,
    /// Conformal mapping; rotation, translation, and uniform scale.
    ScaledRotation,
    /// General affine mapping; three landmarks.
    Affine,
    /// Bilinear mapping; four landmarks.
    Bilinear,
    /// Sentinel: skip registration entirely.
    None,
}

impl TransformKind {
    /// Whether this is the "no transformation" sentinel.
    pub fn is_none(self) -> bool {
        matches!(self, TransformKind::None)
    }
}

#[derive(Clone, Debug, Default)]
/// Cooperative cancellation flag polled between scheduling steps.
///
/// Clones share the same flag. Cancellation aborts the run cleanly with
/// [`RegError::Cancelled`]; no partial output is emitted.
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation on this token and all of its clones.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with [`RegError::Cancelled`] if cancellation has been requested.
    pub fn check(&self) -> RegResult<()> {
        if self.is_cancelled() {
            Err(RegError::Cancelled)
        } else {
            Ok(())
        }
    }
}
