use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::composite::composite_frame;
use crate::detect::chroma::{ChromaKey, count_matches, detect_region};
use crate::foundation::core::Size;
use crate::foundation::error::{BoilError, BoilResult};
use crate::sequence::assemble::{PaletteFrame, encode_gif};
use crate::sequence::quantize::quantize_frame;
use crate::sequence::template::{AnimatedTemplate, TimedFrame, decode_source_image};

/// Tunables for one compositing run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComposeOpts {
    /// Explicit target size. When `None`, the largest region found by the pre-scan is reported.
    pub target_size: Option<Size>,
    /// Gaussian sigma applied to the resized insert; `0` disables blurring.
    pub blur_radius: f32,
    /// Palette size of every output frame.
    pub colors: u16,
    /// Predicate used by the largest-region pre-scan.
    pub prescan_key: ChromaKey,
    /// Predicate used for per-frame placement.
    pub detect_key: ChromaKey,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            target_size: None,
            blur_radius: 0.5,
            colors: 60,
            prescan_key: ChromaKey::strict(),
            detect_key: ChromaKey::strict(),
        }
    }
}

impl ComposeOpts {
    /// Reject values the pipeline cannot honor.
    pub fn validate(&self) -> BoilResult<()> {
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(BoilError::validation("blur_radius must be finite and >= 0"));
        }
        if !(2..=256).contains(&self.colors) {
            return Err(BoilError::validation("colors must be in 2..=256"));
        }
        if let Some(size) = self.target_size {
            Size::new(size.width, size.height)?;
        }
        Ok(())
    }
}

/// Counters describing one compositing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposeStats {
    /// Frames in the template (and in the output).
    pub frames: usize,
    /// Frames where a region was found and the insert pasted.
    pub composited: usize,
    /// Frames passed through untouched.
    pub passthrough: usize,
    /// Explicit target size, or the largest pre-scanned region.
    pub target_size: Option<Size>,
}

/// Finished animation bytes plus run statistics.
#[derive(Clone, Debug)]
pub struct ComposedAnimation {
    /// Encoded GIF.
    pub bytes: Vec<u8>,
    /// Run statistics.
    pub stats: ComposeStats,
}

/// Largest region (by area) detected in any frame with `key`.
///
/// This is an estimate: it is computed independently of per-frame placement and may use a
/// different predicate.
pub fn largest_region(template: &AnimatedTemplate, key: &ChromaKey) -> Option<Size> {
    template
        .frames()
        .iter()
        .filter_map(|f| detect_region(&f.image, key))
        .map(|r| r.size())
        .fold(None, |best: Option<Size>, size| match best {
            Some(b) if b.area() >= size.area() => Some(b),
            _ => Some(size),
        })
}

/// Composite `insert` into every frame, in order, without quantizing.
///
/// Frames where `opts.detect_key` matches nothing are returned unchanged.
pub fn composite_frames(
    template: &AnimatedTemplate,
    insert: &RgbaImage,
    opts: &ComposeOpts,
) -> BoilResult<(Vec<TimedFrame>, ComposeStats)> {
    opts.validate()?;

    let target_size = match opts.target_size {
        Some(size) => Some(size),
        None => largest_region(template, &opts.prescan_key),
    };
    tracing::debug!(?target_size, "pre-scan finished");

    let mut stats = ComposeStats {
        frames: template.len(),
        target_size,
        ..ComposeStats::default()
    };
    let mut out = Vec::with_capacity(template.len());

    for (i, frame) in template.frames().iter().enumerate() {
        let image = match detect_region(&frame.image, &opts.detect_key) {
            Some(region) => {
                tracing::debug!(
                    frame = i,
                    matches = count_matches(&frame.image, &opts.detect_key),
                    ?region,
                    "chroma region found"
                );
                stats.composited += 1;
                composite_frame(&frame.image, insert, region, opts.blur_radius)?
            }
            None => {
                tracing::debug!(frame = i, "no chroma region, passing frame through");
                stats.passthrough += 1;
                frame.image.clone()
            }
        };
        out.push(TimedFrame {
            image,
            duration_ms: frame.duration_ms,
        });
    }

    Ok((out, stats))
}

/// Full sequence run: composite, quantize each frame, assemble a looping GIF.
#[tracing::instrument(skip_all, fields(frames = template.len()))]
pub fn compose(
    template: &AnimatedTemplate,
    insert: &RgbaImage,
    opts: &ComposeOpts,
) -> BoilResult<ComposedAnimation> {
    let (frames, stats) = composite_frames(template, insert, opts)?;

    let palette_frames = frames
        .iter()
        .map(|f| {
            Ok(PaletteFrame {
                indexed: quantize_frame(&f.image, opts.colors)?,
                duration_ms: f.duration_ms,
            })
        })
        .collect::<BoilResult<Vec<_>>>()?;
    let bytes = encode_gif(&palette_frames)?;

    tracing::info!(
        composited = stats.composited,
        passthrough = stats.passthrough,
        bytes = bytes.len(),
        "animation assembled"
    );
    Ok(ComposedAnimation { bytes, stats })
}

/// Decode both inputs and run [`compose`].
pub fn compose_bytes(
    template_bytes: &[u8],
    source_bytes: &[u8],
    opts: &ComposeOpts,
) -> BoilResult<ComposedAnimation> {
    let template = AnimatedTemplate::decode(template_bytes)?;
    let insert = decode_source_image(source_bytes)?;
    compose(&template, &insert, opts)
}

/// Read both inputs from disk and run [`compose`].
pub fn compose_files(
    template_path: &Path,
    source_path: &Path,
    opts: &ComposeOpts,
) -> BoilResult<ComposedAnimation> {
    let template = AnimatedTemplate::open(template_path)?;
    let source = std::fs::read(source_path)
        .with_context(|| format!("read source image '{}'", source_path.display()))
        .map_err(|e| BoilError::input(format!("{e:#}")))?;
    let insert = decode_source_image(&source)?;
    compose(&template, &insert, opts)
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/processor.rs"]
mod tests;
