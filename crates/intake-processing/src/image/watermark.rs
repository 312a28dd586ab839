use crate::image::resize::select_filter;
use image::{imageops, DynamicImage, GenericImageView, ImageReader};
use intake_core::config::{WatermarkPosition, WatermarkSettings};
use std::io::Cursor;

/// Watermark placement
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    pub position: WatermarkPosition,
    /// Horizontal distance from the anchored edge, ignored for centered columns.
    pub offset_x: u32,
    /// Vertical distance from the anchored edge, ignored for centered rows.
    pub offset_y: u32,
    /// 0 to 100
    pub opacity: u8,
}

impl From<&WatermarkSettings> for WatermarkConfig {
    fn from(settings: &WatermarkSettings) -> Self {
        Self {
            position: settings.position,
            offset_x: settings.offset_x,
            offset_y: settings.offset_y,
            opacity: settings.opacity.min(100),
        }
    }
}

pub struct Watermark;

impl Watermark {
    /// Top-left corner of a `wm_w`x`wm_h` mark on an `img_w`x`img_h` image.
    pub fn position(
        config: &WatermarkConfig,
        img_w: u32,
        img_h: u32,
        wm_w: u32,
        wm_h: u32,
    ) -> (i64, i64) {
        let free_x = img_w as i64 - wm_w as i64;
        let free_y = img_h as i64 - wm_h as i64;
        let (ox, oy) = (config.offset_x as i64, config.offset_y as i64);

        let left = ox;
        let center_x = free_x / 2;
        let right = free_x - ox;
        let top = oy;
        let center_y = free_y / 2;
        let bottom = free_y - oy;

        let (x, y) = match config.position {
            WatermarkPosition::TopLeft => (left, top),
            WatermarkPosition::Top => (center_x, top),
            WatermarkPosition::TopRight => (right, top),
            WatermarkPosition::Left => (left, center_y),
            WatermarkPosition::Center => (center_x, center_y),
            WatermarkPosition::Right => (right, center_y),
            WatermarkPosition::BottomLeft => (left, bottom),
            WatermarkPosition::Bottom => (center_x, bottom),
            WatermarkPosition::BottomRight => (right, bottom),
        };
        (x.clamp(0, free_x.max(0)), y.clamp(0, free_y.max(0)))
    }

    /// Overlay a watermark image onto `img`.
    ///
    /// A watermark larger than the image is scaled down to fit inside it.
    pub fn apply(
        img: DynamicImage,
        watermark_data: &[u8],
        config: &WatermarkConfig,
    ) -> Result<DynamicImage, anyhow::Error> {
        let reader = ImageReader::new(Cursor::new(watermark_data)).with_guessed_format()?;
        let mut watermark_img = reader.decode()?.to_rgba8();

        let (img_width, img_height) = img.dimensions();
        let (wm_width, wm_height) = watermark_img.dimensions();

        if wm_width > img_width || wm_height > img_height {
            let (w, h) = crate::image::resize::fit_dimensions(
                wm_width,
                wm_height,
                Some(img_width),
                Some(img_height),
                true,
                false,
            );
            let filter = select_filter(wm_width, wm_height, w, h);
            watermark_img = DynamicImage::ImageRgba8(watermark_img)
                .resize_exact(w, h, filter)
                .to_rgba8();
        }

        if config.opacity < 100 {
            for pixel in watermark_img.pixels_mut() {
                pixel[3] = (pixel[3] as u32 * config.opacity as u32 / 100) as u8;
            }
        }

        let (x, y) = Self::position(
            config,
            img_width,
            img_height,
            watermark_img.width(),
            watermark_img.height(),
        );
        tracing::debug!(position = %config.position, x = x, y = y, "Applying watermark");

        let mut img_rgba = img.to_rgba8();
        imageops::overlay(&mut img_rgba, &watermark_img, x, y);

        Ok(DynamicImage::ImageRgba8(img_rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    fn create_test_watermark(size: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn config(position: WatermarkPosition, opacity: u8) -> WatermarkConfig {
        WatermarkConfig {
            position,
            offset_x: 10,
            offset_y: 10,
            opacity,
        }
    }

    #[test]
    fn test_position_grid() {
        let pos = |p| Watermark::position(&config(p, 100), 200, 100, 50, 20);
        assert_eq!(pos(WatermarkPosition::TopLeft), (10, 10));
        assert_eq!(pos(WatermarkPosition::Top), (75, 10));
        assert_eq!(pos(WatermarkPosition::BottomRight), (140, 70));
        assert_eq!(pos(WatermarkPosition::Center), (75, 40));
        assert_eq!(pos(WatermarkPosition::Left), (10, 40));
    }

    #[test]
    fn test_position_clamped_inside_image() {
        let mut cfg = config(WatermarkPosition::BottomRight, 100);
        cfg.offset_x = 500;
        assert_eq!(Watermark::position(&cfg, 100, 100, 50, 50), (0, 40));
    }

    #[test]
    fn test_watermark_bottom_right_pixels() {
        let img = create_test_image(200, 200);
        let result = Watermark::apply(
            img,
            &create_test_watermark(50),
            &config(WatermarkPosition::BottomRight, 100),
        )
        .unwrap()
        .to_rgba8();
        assert_eq!(result.dimensions(), (200, 200));
        assert_eq!(result.get_pixel(180, 180), &Rgba([0, 0, 0, 255]));
        assert_eq!(result.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
        assert_eq!(result.get_pixel(195, 195), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_watermark_opacity_blends() {
        let img = create_test_image(100, 100);
        let result = Watermark::apply(
            img,
            &create_test_watermark(20),
            &config(WatermarkPosition::TopLeft, 50),
        )
        .unwrap()
        .to_rgba8();
        let px = result.get_pixel(15, 15);
        assert!(px[0] > 100 && px[0] < 160, "blended value was {}", px[0]);
    }

    #[test]
    fn test_watermark_larger_than_image_is_scaled() {
        let img = create_test_image(40, 40);
        let result = Watermark::apply(
            img,
            &create_test_watermark(200),
            &config(WatermarkPosition::Center, 100),
        )
        .unwrap();
        assert_eq!(result.dimensions(), (40, 40));
        assert_eq!(result.to_rgba8().get_pixel(20, 20), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_invalid_watermark_data_errors() {
        let img = create_test_image(10, 10);
        assert!(Watermark::apply(img, b"not an image", &config(WatermarkPosition::Center, 100)).is_err());
    }
}
