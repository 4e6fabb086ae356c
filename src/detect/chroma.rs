use image::RgbaImage;

use crate::foundation::core::Region;

/// Strategy value deciding whether a pixel belongs to the chroma-key region.
///
/// Thresholds are configuration: both variants are serializable so a template can ship with
/// its own tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChromaKey {
    /// Saturated green: `g > min_green`, `r < max_red`, `b < max_blue`.
    Strict {
        /// Exclusive lower bound for the green channel.
        min_green: u8,
        /// Exclusive upper bound for the red channel.
        max_red: u8,
        /// Exclusive upper bound for the blue channel.
        max_blue: u8,
    },
    /// Tolerant green: green exceeds red and blue by `margin` and exceeds `min_green`.
    Dominant {
        /// Required lead of green over both red and blue.
        margin: u8,
        /// Exclusive brightness floor for the green channel.
        min_green: u8,
    },
}

impl Default for ChromaKey {
    fn default() -> Self {
        Self::strict()
    }
}

impl ChromaKey {
    /// `Strict` with the stock thresholds (200 / 100 / 100).
    pub const fn strict() -> Self {
        Self::Strict {
            min_green: 200,
            max_red: 100,
            max_blue: 100,
        }
    }

    /// `Dominant` with the stock thresholds (margin 50, floor 150).
    pub const fn dominant() -> Self {
        Self::Dominant {
            margin: 50,
            min_green: 150,
        }
    }

    /// Evaluate the predicate for one RGBA pixel. Alpha is ignored.
    pub fn matches(&self, px: [u8; 4]) -> bool {
        let [r, g, b, _] = px;
        match *self {
            Self::Strict {
                min_green,
                max_red,
                max_blue,
            } => g > min_green && r < max_red && b < max_blue,
            Self::Dominant { margin, min_green } => {
                let (r, g, b) = (u16::from(r), u16::from(g), u16::from(b));
                let margin = u16::from(margin);
                g > r + margin && g > b + margin && g > u16::from(min_green)
            }
        }
    }
}

/// Bounding box of every pixel matching `key`, or `None` when nothing matches.
pub fn detect_region(frame: &RgbaImage, key: &ChromaKey) -> Option<Region> {
    detect_region_with(frame, |px| key.matches(px))
}

/// Bounding box of every pixel accepted by `pred`.
///
/// Disjoint matches are not separated: the result is the single rectangle enclosing all of
/// them.
pub fn detect_region_with(frame: &RgbaImage, pred: impl Fn([u8; 4]) -> bool) -> Option<Region> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, px) in frame.enumerate_pixels() {
        if !pred(px.0) {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    bounds.map(|(x0, y0, x1, y1)| Region::from_corners(x0, y0, x1, y1))
}

/// Count of pixels accepted by `key`.
pub fn count_matches(frame: &RgbaImage, key: &ChromaKey) -> u64 {
    frame.pixels().filter(|px| key.matches(px.0)).count() as u64
}

#[cfg(test)]
#[path = "../../tests/unit/detect/chroma.rs"]
mod tests;
