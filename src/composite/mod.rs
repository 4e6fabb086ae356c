//! Per-frame compositing: resize the insert to a detected region, soften it, paste it.

/// Separable gaussian blur on RGBA8 buffers.
pub mod blur;
/// Alpha-masked pasting.
pub mod paste;

use image::{RgbaImage, imageops::FilterType};

use crate::foundation::core::Region;
use crate::foundation::error::BoilResult;

/// Resize `insert` to `region`'s size (Lanczos3) and blur it when `blur_radius > 0`.
pub fn prepare_insert(
    insert: &RgbaImage,
    region: Region,
    blur_radius: f32,
) -> BoilResult<RgbaImage> {
    let resized = image::imageops::resize(insert, region.width, region.height, FilterType::Lanczos3);
    if blur_radius > 0.0 {
        blur::gaussian_blur(&resized, blur_radius)
    } else {
        Ok(resized)
    }
}

/// Composite `insert` over a copy of `frame` at `region`.
///
/// The input frame is never modified; the result has the frame's dimensions and differs from it
/// only inside `region`.
pub fn composite_frame(
    frame: &RgbaImage,
    insert: &RgbaImage,
    region: Region,
    blur_radius: f32,
) -> BoilResult<RgbaImage> {
    let prepared = prepare_insert(insert, region, blur_radius)?;
    let mut out = frame.clone();
    paste::paste_into_region(&mut out, &prepared, region);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/frame.rs"]
mod tests;
