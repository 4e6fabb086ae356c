use std::collections::{BTreeSet, HashMap};

use color_quant::NeuQuant;
use image::RgbaImage;

use crate::foundation::error::{BoilError, BoilResult};

/// NeuQuant sampling factor (1 = best, 30 = fastest).
pub const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// A frame reduced to an indexed palette. Alpha is discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGB palette entries, every entry referenced by at least one pixel.
    pub palette: Vec<[u8; 3]>,
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
}

impl IndexedFrame {
    /// Palette as the flat `r, g, b, r, g, b, ...` byte list GIF encoders expect.
    pub fn palette_bytes(&self) -> Vec<u8> {
        self.palette.iter().flatten().copied().collect()
    }

    /// Expand back to opaque RGBA.
    pub fn to_rgba(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (px, &idx) in out.pixels_mut().zip(&self.indices) {
            let [r, g, b] = self.palette[usize::from(idx)];
            px.0 = [r, g, b, 255];
        }
        out
    }
}

/// Reduce `img` to at most `colors` palette entries (adaptive palette, alpha dropped).
///
/// Frames that already have `colors` or fewer distinct colors keep them exactly; others are
/// quantized with NeuQuant. The result is deterministic for identical input.
pub fn quantize_frame(img: &RgbaImage, colors: u16) -> BoilResult<IndexedFrame> {
    if !(2..=256).contains(&colors) {
        return Err(BoilError::validation("palette colors must be in 2..=256"));
    }
    let (width, height) = img.dimensions();

    if let Some(exact) = exact_palette(img, usize::from(colors)) {
        let lookup: HashMap<[u8; 3], u8> = exact
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i as u8))
            .collect();
        let indices = img
            .pixels()
            .map(|px| lookup[&[px.0[0], px.0[1], px.0[2]]])
            .collect();
        return Ok(IndexedFrame {
            width,
            height,
            palette: exact,
            indices,
        });
    }

    let opaque: Vec<u8> = img
        .pixels()
        .flat_map(|px| [px.0[0], px.0[1], px.0[2], 255])
        .collect();
    let nq = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, usize::from(colors), &opaque);
    let palette: Vec<[u8; 3]> = nq
        .color_map_rgb()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let indices: Vec<u8> = opaque
        .chunks_exact(4)
        .map(|px| nq.index_of(px) as u8)
        .collect();

    Ok(compact_palette(IndexedFrame {
        width,
        height,
        palette,
        indices,
    }))
}

/// Sorted distinct RGB colors, or `None` when there are more than `limit`.
fn exact_palette(img: &RgbaImage, limit: usize) -> Option<Vec<[u8; 3]>> {
    let mut seen = BTreeSet::new();
    for px in img.pixels() {
        seen.insert([px.0[0], px.0[1], px.0[2]]);
        if seen.len() > limit {
            return None;
        }
    }
    Some(seen.into_iter().collect())
}

/// Drop palette entries no pixel references and renumber indices, keeping entry order.
pub(crate) fn compact_palette(frame: IndexedFrame) -> IndexedFrame {
    let mut used = vec![false; frame.palette.len()];
    for &i in &frame.indices {
        used[usize::from(i)] = true;
    }
    if used.iter().all(|&u| u) {
        return frame;
    }

    let mut remap = vec![0u8; frame.palette.len()];
    let mut palette = Vec::with_capacity(frame.palette.len());
    for (old, color) in frame.palette.iter().enumerate() {
        if used[old] {
            remap[old] = palette.len() as u8;
            palette.push(*color);
        }
    }
    let indices = frame
        .indices
        .iter()
        .map(|&i| remap[usize::from(i)])
        .collect();

    IndexedFrame {
        width: frame.width,
        height: frame.height,
        palette,
        indices,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/quantize.rs"]
mod tests;
