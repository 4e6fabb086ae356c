use image::{Rgba, RgbaImage};

use crate::foundation::error::{BoilError, BoilResult};

/// Color weighted by its own coverage: `[r * a, g * a, b * a, a]`, with `a` in `0.0..=1.0`.
type Premul = [f32; 4];

/// Normalized 1-D gaussian taps, `2 * radius + 1` long.
#[derive(Clone, Debug)]
pub(crate) struct Kernel {
    taps: Vec<f32>,
}

impl Kernel {
    /// Kernel for `sigma > 0` with radius `ceil(3 * sigma)`.
    pub(crate) fn gaussian(sigma: f32) -> Self {
        let radius = (3.0 * sigma).ceil() as i32;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let raw: Vec<f32> = (-radius..=radius)
            .map(|d| (-((d * d) as f32) / two_sigma_sq).exp())
            .collect();
        let total: f32 = raw.iter().sum();
        Self {
            taps: raw.into_iter().map(|w| w / total).collect(),
        }
    }

    pub(crate) fn radius(&self) -> usize {
        self.taps.len() / 2
    }

    pub(crate) fn taps(&self) -> &[f32] {
        &self.taps
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Columns,
}

/// Gaussian blur of a straight-alpha image with standard deviation `sigma`.
///
/// Pixels are weighted by their alpha while filtering, so transparent pixels around an insert
/// fade its coverage without pulling their (meaningless) color into it. Edges are clamped and
/// fully opaque images stay fully opaque. `sigma == 0` returns a copy.
pub fn gaussian_blur(img: &RgbaImage, sigma: f32) -> BoilResult<RgbaImage> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(BoilError::validation("blur sigma must be finite and >= 0"));
    }
    let (width, height) = img.dimensions();
    if sigma == 0.0 || width == 0 || height == 0 {
        return Ok(img.clone());
    }

    let kernel = Kernel::gaussian(sigma);
    let (w, h) = (width as usize, height as usize);
    let premul: Vec<Premul> = img.pixels().map(|px| premultiply(px.0)).collect();
    let rows = convolve(&premul, w, h, &kernel, Axis::Rows);
    let both = convolve(&rows, w, h, &kernel, Axis::Columns);

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        Rgba(unpremultiply(both[y as usize * w + x as usize]))
    }))
}

fn convolve(src: &[Premul], w: usize, h: usize, kernel: &Kernel, axis: Axis) -> Vec<Premul> {
    let radius = kernel.radius() as isize;
    let last = match axis {
        Axis::Rows => w as isize - 1,
        Axis::Columns => h as isize - 1,
    };

    let mut out = vec![[0.0f32; 4]; src.len()];
    for y in 0..h {
        for x in 0..w {
            let pos = match axis {
                Axis::Rows => x as isize,
                Axis::Columns => y as isize,
            };
            let mut acc = [0.0f32; 4];
            for (t, &weight) in kernel.taps().iter().enumerate() {
                let along = (pos + t as isize - radius).clamp(0, last) as usize;
                let sample = match axis {
                    Axis::Rows => src[y * w + along],
                    Axis::Columns => src[along * w + x],
                };
                for (a, s) in acc.iter_mut().zip(sample) {
                    *a += weight * s;
                }
            }
            out[y * w + x] = acc;
        }
    }
    out
}

fn premultiply([r, g, b, a]: [u8; 4]) -> Premul {
    let cov = f32::from(a) / 255.0;
    [f32::from(r) * cov, f32::from(g) * cov, f32::from(b) * cov, cov]
}

fn unpremultiply([r, g, b, cov]: Premul) -> [u8; 4] {
    let alpha = to_u8(cov * 255.0);
    if alpha == 0 {
        return [0, 0, 0, 0];
    }
    [to_u8(r / cov), to_u8(g / cov), to_u8(b / cov), alpha]
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blur.rs"]
mod tests;
