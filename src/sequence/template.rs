use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;
use image::{AnimationDecoder as _, ImageFormat, RgbaImage, codecs::gif::GifDecoder};

use crate::foundation::error::{BoilError, BoilResult};

/// Duration of still images, and of frames whose delay cannot be read.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

/// One template frame: full-canvas RGBA pixels plus display duration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedFrame {
    /// Full-canvas RGBA pixels.
    pub image: RgbaImage,
    /// Display duration in milliseconds.
    pub duration_ms: u32,
}

/// Decoded animated template, frames in display order.
#[derive(Clone, Debug)]
pub struct AnimatedTemplate {
    frames: Vec<TimedFrame>,
}

impl AnimatedTemplate {
    /// Build a template from already decoded frames. Frames must be non-empty and share one
    /// canvas size.
    pub fn from_frames(frames: Vec<TimedFrame>) -> BoilResult<Self> {
        let Some(first) = frames.first() else {
            return Err(BoilError::input("template has no frames"));
        };
        let dims = first.image.dimensions();
        if frames.iter().any(|f| f.image.dimensions() != dims) {
            return Err(BoilError::input("template frames differ in size"));
        }
        Ok(Self { frames })
    }

    /// Decode a template from encoded bytes.
    ///
    /// GIFs are decoded as an animation; any other format the `image` crate reads becomes a
    /// single frame of [`DEFAULT_FRAME_DURATION_MS`].
    pub fn decode(bytes: &[u8]) -> BoilResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| BoilError::input(format!("unrecognized template format: {e}")))?;

        if format != ImageFormat::Gif {
            let img = image::load_from_memory_with_format(bytes, format)
                .map_err(|e| BoilError::input(format!("failed to decode template: {e}")))?;
            return Self::from_frames(vec![TimedFrame {
                image: img.to_rgba8(),
                duration_ms: DEFAULT_FRAME_DURATION_MS,
            }]);
        }

        let decoder = GifDecoder::new(Cursor::new(bytes))
            .map_err(|e| BoilError::input(format!("failed to open template gif: {e}")))?;
        let raw = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| BoilError::input(format!("failed to decode template frames: {e}")))?;

        let frames = raw
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                TimedFrame {
                    duration_ms: duration_from_ratio(numer, denom),
                    image: frame.into_buffer(),
                }
            })
            .collect();
        Self::from_frames(frames)
    }

    /// Read and decode a template file.
    pub fn open(path: &Path) -> BoilResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read template '{}'", path.display()))
            .map_err(|e| BoilError::input(format!("{e:#}")))?;
        Self::decode(&bytes)
    }

    /// Frames in display order.
    pub fn frames(&self) -> &[TimedFrame] {
        &self.frames
    }

    /// Number of frames (always `>= 1`).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when the template has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Canvas size shared by every frame.
    pub fn dimensions(&self) -> (u32, u32) {
        self.frames[0].image.dimensions()
    }
}

/// Decode a single source image (the insert) to RGBA.
pub fn decode_source_image(bytes: &[u8]) -> BoilResult<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| BoilError::input(format!("failed to decode source image: {e}")))?;
    Ok(img.to_rgba8())
}

fn duration_from_ratio(numer: u32, denom: u32) -> u32 {
    if denom == 0 {
        return DEFAULT_FRAME_DURATION_MS;
    }
    let ms = (u64::from(numer) + u64::from(denom) / 2) / u64::from(denom);
    u32::try_from(ms).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/template.rs"]
mod tests;
