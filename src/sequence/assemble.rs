use std::borrow::Cow;

use anyhow::Context as _;

use crate::foundation::error::{BoilError, BoilResult};
use crate::sequence::quantize::IndexedFrame;

/// A palette-quantized frame ready for encoding.
#[derive(Clone, Debug)]
pub struct PaletteFrame {
    /// Indexed pixels with a local palette.
    pub indexed: IndexedFrame,
    /// Display duration in milliseconds.
    pub duration_ms: u32,
}

/// Encode frames as a looping GIF.
///
/// Every frame carries its own palette and uses "restore to background" disposal so nothing from
/// one frame shows through the next. All frames must share one canvas size.
pub fn encode_gif(frames: &[PaletteFrame]) -> BoilResult<Vec<u8>> {
    let Some(first) = frames.first() else {
        return Err(BoilError::validation("cannot encode an animation with no frames"));
    };
    let (width, height) = (first.indexed.width, first.indexed.height);
    let w = u16::try_from(width)
        .map_err(|_| BoilError::validation(format!("gif width {width} exceeds 65535")))?;
    let h = u16::try_from(height)
        .map_err(|_| BoilError::validation(format!("gif height {height} exceeds 65535")))?;

    let mut buf = Vec::new();
    {
        let mut encoder =
            gif::Encoder::new(&mut buf, w, h, &[]).context("start gif encoder")?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .context("write gif loop extension")?;

        for (i, f) in frames.iter().enumerate() {
            if (f.indexed.width, f.indexed.height) != (width, height) {
                return Err(BoilError::validation(format!(
                    "frame {i} is {}x{}, expected {width}x{height}",
                    f.indexed.width, f.indexed.height
                )));
            }
            let frame = gif::Frame {
                width: w,
                height: h,
                delay: delay_centis(f.duration_ms),
                dispose: gif::DisposalMethod::Background,
                palette: Some(f.indexed.palette_bytes()),
                buffer: Cow::Borrowed(&f.indexed.indices),
                ..gif::Frame::default()
            };
            encoder
                .write_frame(&frame)
                .with_context(|| format!("encode gif frame {i}"))?;
        }
    }

    Ok(buf)
}

/// Milliseconds to GIF centiseconds, never rounding a visible frame down to zero.
fn delay_centis(duration_ms: u32) -> u16 {
    if duration_ms == 0 {
        return 0;
    }
    let cs = (u64::from(duration_ms) + 5) / 10;
    cs.clamp(1, u64::from(u16::MAX)) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/assemble.rs"]
mod tests;
