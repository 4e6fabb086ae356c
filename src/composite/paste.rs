use image::RgbaImage;

use crate::foundation::core::Region;
use crate::foundation::math::mul_div255_u8;

/// Straight-alpha RGBA pixel.
pub type Rgba8 = [u8; 4];

/// Blend `src` onto `dst` weighted by `mask`, every channel including alpha.
///
/// `mask == 255` yields `src`, `mask == 0` yields `dst`.
pub fn masked_blend(dst: Rgba8, src: Rgba8, mask: u8) -> Rgba8 {
    match mask {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let m = u16::from(mask);
    let inv = 255u16 - m;
    let mut out = [0u8; 4];
    for i in 0..4 {
        let s = mul_div255_u8(u16::from(src[i]), m);
        let d = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = s.saturating_add(d);
    }
    out
}

/// Paste `src` into `dst` with its top-left at `(x, y)`, using `src`'s alpha as the mask.
///
/// Pixels of `src` falling outside `dst` are dropped.
pub fn paste_with_alpha_mask(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    let (dw, dh) = dst.dimensions();
    for (sx, sy, px) in src.enumerate_pixels() {
        let (Some(tx), Some(ty)) = (x.checked_add(sx), y.checked_add(sy)) else {
            continue;
        };
        if tx >= dw || ty >= dh {
            continue;
        }
        let d = dst.get_pixel_mut(tx, ty);
        d.0 = masked_blend(d.0, px.0, px.0[3]);
    }
}

/// Paste `src` at `region`'s corner. `src` must already be sized to the region.
pub(crate) fn paste_into_region(dst: &mut RgbaImage, src: &RgbaImage, region: Region) {
    debug_assert_eq!(src.dimensions(), (region.width, region.height));
    paste_with_alpha_mask(dst, src, region.x, region.y);
}

#[cfg(test)]
#[path = "../../tests/unit/composite/paste.rs"]
mod tests;
