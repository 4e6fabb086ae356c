use super::*;

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 255 / (w - 1)) as u8, (y * 255 / (h - 1)) as u8, 128, 255])
    })
}

#[test]
fn few_colors_are_kept_exactly() {
    let img = RgbaImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            image::Rgba([255, 0, 0, 255])
        } else {
            image::Rgba([40, 40, 40, 255])
        }
    });
    let q = quantize_frame(&img, 60).unwrap();
    assert_eq!(q.palette, vec![[40, 40, 40], [255, 0, 0]]);
    assert_eq!(q.to_rgba(), img);
}

#[test]
fn alpha_is_dropped() {
    let img = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 0]));
    let q = quantize_frame(&img, 16).unwrap();
    assert_eq!(q.to_rgba().get_pixel(0, 0).0, [10, 20, 30, 255]);
}

#[test]
fn many_colors_are_reduced_to_the_limit() {
    let img = gradient(64, 64);
    let q = quantize_frame(&img, 60).unwrap();
    assert!(q.palette.len() <= 60);
    assert_eq!(q.indices.len(), 64 * 64);
    assert!(q.indices.iter().all(|&i| usize::from(i) < q.palette.len()));
}

#[test]
fn quantization_is_deterministic() {
    let img = gradient(48, 32);
    let a = quantize_frame(&img, 32).unwrap();
    let b = quantize_frame(&img, 32).unwrap();
    assert_eq!(a, b);
}

#[test]
fn color_count_out_of_range_is_rejected() {
    let img = gradient(4, 4);
    assert!(quantize_frame(&img, 1).is_err());
    assert!(quantize_frame(&img, 257).is_err());
}

#[test]
fn compact_palette_drops_unused_entries() {
    let frame = IndexedFrame {
        width: 3,
        height: 1,
        palette: vec![[1, 1, 1], [2, 2, 2], [3, 3, 3], [4, 4, 4]],
        indices: vec![3, 1, 3],
    };
    let compact = compact_palette(frame);
    assert_eq!(compact.palette, vec![[2, 2, 2], [4, 4, 4]]);
    assert_eq!(compact.indices, vec![1, 0, 1]);
    assert_eq!(compact.palette_bytes(), vec![2, 2, 2, 4, 4, 4]);
}
