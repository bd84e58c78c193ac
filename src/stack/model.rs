use std::collections::BTreeMap;

use crate::foundation::core::{SliceIndex, StackDims};
use crate::foundation::error::{RegError, RegResult};

/// A single greyscale pixel plane, row-major `f32` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major samples; length is `width * height`.
    pub data: Vec<f32>,
}

impl Plane {
    /// Build a plane from raw samples; the buffer length must match.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> RegResult<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(RegError::validation(format!(
                "plane buffer length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a plane filled with a uniform value.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }
}

/// Pixel payload of one slice: a greyscale plane or three RGB planes.
#[derive(Clone, Debug, PartialEq)]
pub enum SlicePixels {
    /// Single-plane greyscale slice.
    Grey(Plane),
    /// Color slice as separate R, G, B planes of equal size.
    Rgb([Plane; 3]),
}

impl SlicePixels {
    /// Build an RGB slice; all three planes must share dimensions.
    pub fn rgb(r: Plane, g: Plane, b: Plane) -> RegResult<Self> {
        if r.width != g.width
            || r.width != b.width
            || r.height != g.height
            || r.height != b.height
        {
            return Err(RegError::validation(
                "RGB planes must share width and height",
            ));
        }
        Ok(Self::Rgb([r, g, b]))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            SlicePixels::Grey(p) => p.width,
            SlicePixels::Rgb(planes) => planes[0].width,
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            SlicePixels::Grey(p) => p.height,
            SlicePixels::Rgb(planes) => planes[0].height,
        }
    }

    /// Whether this slice carries color planes.
    pub fn is_color(&self) -> bool {
        matches!(self, SlicePixels::Rgb(_))
    }

    /// Greyscale reduction of this slice.
    ///
    /// Alignment itself always runs on a greyscale plane; color slices are
    /// reduced with Rec. 601 luma weights and the computed transform is
    /// reapplied per channel afterwards.
    pub fn to_luma(&self) -> Plane {
        match self {
            SlicePixels::Grey(p) => p.clone(),
            SlicePixels::Rgb([r, g, b]) => {
                let data = r
                    .data
                    .iter()
                    .zip(&g.data)
                    .zip(&b.data)
                    .map(|((&r, &g), &b)| 0.299 * r + 0.587 * g + 0.114 * b)
                    .collect();
                Plane {
                    width: r.width,
                    height: r.height,
                    data,
                }
            }
        }
    }
}

/// A multi-dimensional image stack addressable by [`SliceIndex`].
///
/// Every `(channel, depth, time)` position within [`ImageStack::dims`] holds
/// exactly one slice; all slices share the stack's pixel width and height.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStack {
    width: u32,
    height: u32,
    dims: StackDims,
    slices: BTreeMap<SliceIndex, SlicePixels>,
}

impl ImageStack {
    /// Assemble a stack from per-index slices, validating full coverage.
    pub fn from_slices(
        width: u32,
        height: u32,
        dims: StackDims,
        slices: BTreeMap<SliceIndex, SlicePixels>,
    ) -> RegResult<Self> {
        if slices.len() as u64 != dims.slice_count() {
            return Err(RegError::validation(format!(
                "stack requires {} slices, got {}",
                dims.slice_count(),
                slices.len()
            )));
        }
        for (index, pixels) in &slices {
            if !dims.contains(*index) {
                return Err(RegError::validation(format!(
                    "slice {index} is outside the stack dimensions"
                )));
            }
            if pixels.width() != width || pixels.height() != height {
                return Err(RegError::validation(format!(
                    "slice {index} is {}x{}, stack is {width}x{height}",
                    pixels.width(),
                    pixels.height()
                )));
            }
        }
        Ok(Self {
            width,
            height,
            dims,
            slices,
        })
    }

    /// Build a stack with every slice filled by a uniform greyscale value.
    pub fn filled(width: u32, height: u32, dims: StackDims, value: f32) -> Self {
        let slices = dims
            .iter()
            .map(|index| (index, SlicePixels::Grey(Plane::filled(width, height, value))))
            .collect();
        Self {
            width,
            height,
            dims,
            slices,
        }
    }

    /// Pixel width shared by all slices.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height shared by all slices.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Stack dimensions.
    pub fn dims(&self) -> StackDims {
        self.dims
    }

    /// Fetch the slice at `index`.
    pub fn slice(&self, index: SliceIndex) -> RegResult<&SlicePixels> {
        self.slices
            .get(&index)
            .ok_or_else(|| RegError::validation(format!("no slice at {index}")))
    }

    /// Replace the slice at `index`; dimensions must match the stack.
    pub fn set_slice(&mut self, index: SliceIndex, pixels: SlicePixels) -> RegResult<()> {
        if !self.dims.contains(index) {
            return Err(RegError::validation(format!(
                "slice {index} is outside the stack dimensions"
            )));
        }
        if pixels.width() != self.width || pixels.height() != self.height {
            return Err(RegError::validation(format!(
                "slice {index} is {}x{}, stack is {}x{}",
                pixels.width(),
                pixels.height(),
                self.width,
                self.height
            )));
        }
        self.slices.insert(index, pixels);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/model.rs"]
mod tests;
