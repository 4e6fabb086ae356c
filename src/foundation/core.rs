use crate::foundation::error::{BoilError, BoilResult};

/// Pixel dimensions `width x height`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a validated, non-empty size.
    pub fn new(width: u32, height: u32) -> BoilResult<Self> {
        if width == 0 || height == 0 {
            return Err(BoilError::validation("size width/height must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Pixel count.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Axis-aligned pixel rectangle with an inclusive top-left corner.
///
/// A chroma region as reported by detection: the smallest rectangle containing every matching
/// pixel of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Region {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels, always `>= 1`.
    pub width: u32,
    /// Height in pixels, always `>= 1`.
    pub height: u32,
}

impl Region {
    /// Build a region from inclusive min/max corners.
    pub fn from_corners(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Self {
        debug_assert!(x_min <= x_max && y_min <= y_max);
        Self {
            x: x_min,
            y: y_min,
            width: x_max - x_min + 1,
            height: y_max - y_min + 1,
        }
    }

    /// Region dimensions.
    pub fn size(self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Return `true` when pixel `(px, py)` lies inside the region.
    pub fn contains(self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px - self.x < self.width && py - self.y < self.height
    }
}
