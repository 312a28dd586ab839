//! Resize geometry.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Target dimensions for fitting a `src_w`x`src_h` image to an optional box.
///
/// With `keep_aspect` the image is scaled uniformly so that it fits inside every
/// given bound. Without it each given bound is applied as-is. Unless `upsize` is set
/// no dimension grows beyond the source. Results are never below 1.
pub fn fit_dimensions(
    src_w: u32,
    src_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
    keep_aspect: bool,
    upsize: bool,
) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (src_w.max(1), src_h.max(1));
    }

    if keep_aspect {
        let ratio_w = target_w.map(|w| w as f64 / src_w as f64);
        let ratio_h = target_h.map(|h| h as f64 / src_h as f64);
        let mut scale = match (ratio_w, ratio_h) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => 1.0,
        };
        if !upsize {
            scale = scale.min(1.0);
        }
        let w = (src_w as f64 * scale).round() as u32;
        let h = (src_h as f64 * scale).round() as u32;
        return (w.max(1), h.max(1));
    }

    let pick = |target: Option<u32>, src: u32| match target {
        Some(t) if upsize => t,
        Some(t) => t.min(src),
        None => src,
    };
    (pick(target_w, src_w).max(1), pick(target_h, src_h).max(1))
}

/// Largest centered box of the `box_w`:`box_h` aspect ratio inside the source.
/// Returns `(x, y, width, height)`.
pub fn cover_crop(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32, u32, u32) {
    if box_w == 0 || box_h == 0 || src_w == 0 || src_h == 0 {
        return (0, 0, src_w, src_h);
    }
    // Compare src_w / src_h against box_w / box_h without floats.
    let (w, h) = if (src_w as u64) * (box_h as u64) > (src_h as u64) * (box_w as u64) {
        let w = ((src_h as u64 * box_w as u64) / box_h as u64).max(1) as u32;
        (w, src_h)
    } else {
        let h = ((src_w as u64 * box_h as u64) / box_w as u64).max(1) as u32;
        (src_w, h)
    };
    ((src_w - w) / 2, (src_h - h) / 2, w, h)
}

/// Resampling filter for a resize from one size to another.
pub fn select_filter(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> FilterType {
    let src_area = src_w as u64 * src_h as u64;
    let dst_area = (dst_w as u64 * dst_h as u64).max(1);
    if src_area / dst_area >= 4 {
        // Heavy downscale
        FilterType::Lanczos3
    } else {
        FilterType::CatmullRom
    }
}

/// Resize to the fitted dimensions. Returns the input unchanged when nothing changes.
pub fn apply(
    img: DynamicImage,
    width: Option<u32>,
    height: Option<u32>,
    keep_aspect: bool,
    upsize: bool,
) -> DynamicImage {
    let (src_w, src_h) = img.dimensions();
    let (w, h) = fit_dimensions(src_w, src_h, width, height, keep_aspect, upsize);
    if (w, h) == (src_w, src_h) {
        return img;
    }
    tracing::debug!(from_w = src_w, from_h = src_h, to_w = w, to_h = h, "Resizing image");
    img.resize_exact(w, h, select_filter(src_w, src_h, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect_within_box() {
        assert_eq!(fit_dimensions(1600, 1200, Some(800), Some(600), true, false), (800, 600));
        assert_eq!(fit_dimensions(2000, 1000, Some(800), Some(600), true, false), (800, 400));
        assert_eq!(fit_dimensions(1000, 2000, Some(800), Some(600), true, false), (300, 600));
    }

    #[test]
    fn test_fit_single_bound() {
        assert_eq!(fit_dimensions(1000, 500, Some(500), None, true, false), (500, 250));
        assert_eq!(fit_dimensions(1000, 500, None, Some(100), true, false), (200, 100));
    }

    #[test]
    fn test_fit_never_upsizes_by_default() {
        assert_eq!(fit_dimensions(400, 300, Some(800), Some(600), true, false), (400, 300));
        assert_eq!(fit_dimensions(400, 300, Some(800), Some(600), true, true), (800, 600));
        assert_eq!(fit_dimensions(400, 300, Some(800), Some(100), false, false), (400, 100));
        assert_eq!(fit_dimensions(400, 300, Some(800), Some(100), false, true), (800, 100));
    }

    #[test]
    fn test_fit_minimum_one_pixel() {
        assert_eq!(fit_dimensions(10000, 1, Some(10), None, true, false), (10, 1));
    }

    #[test]
    fn test_cover_crop() {
        assert_eq!(cover_crop(400, 200, 100, 100), (100, 0, 200, 200));
        assert_eq!(cover_crop(200, 400, 100, 100), (0, 100, 200, 200));
        assert_eq!(cover_crop(300, 200, 3, 2), (0, 0, 300, 200));
    }

    #[test]
    fn test_apply_is_noop_when_already_fits() {
        let img = DynamicImage::new_rgb8(50, 40);
        let out = apply(img, Some(800), Some(600), true, false);
        assert_eq!(out.dimensions(), (50, 40));
    }
}
