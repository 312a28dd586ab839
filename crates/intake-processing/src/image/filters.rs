use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Supported image filters.
///
/// Filters are configured as `name=value` pairs; names outside this set are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFilter {
    Greyscale,
    /// Gaussian blur sigma.
    Blur(f32),
    /// Unsharp mask sigma.
    Sharpen(f32),
    /// -100 (black) to 100 (white).
    Brightness(i32),
    /// -100 to 100.
    Contrast(f32),
    Invert,
    /// Block size in pixels.
    Pixelate(u32),
    FlipHorizontal,
    FlipVertical,
    /// Degrees clockwise: 90, 180 or 270.
    Rotate(u32),
    /// Hue rotation in degrees.
    Hue(i32),
}

impl ImageFilter {
    /// Parse one configured filter. Returns `None` for unknown names or unusable values.
    pub fn parse(name: &str, value: &str) -> Option<Self> {
        let value = value.trim();
        let number = || value.parse::<f32>().ok();
        let filter = match name.trim().to_lowercase().as_str() {
            "greyscale" | "grayscale" => ImageFilter::Greyscale,
            "blur" => ImageFilter::Blur(number().unwrap_or(1.0).max(0.1)),
            "sharpen" => ImageFilter::Sharpen(number().unwrap_or(1.0).max(0.1)),
            "brightness" => ImageFilter::Brightness(number()?.clamp(-100.0, 100.0) as i32),
            "contrast" => ImageFilter::Contrast(number()?.clamp(-100.0, 100.0)),
            "invert" => ImageFilter::Invert,
            "pixelate" => ImageFilter::Pixelate(number()?.max(1.0) as u32),
            "flip" => match value.to_lowercase().as_str() {
                "" | "h" | "horizontal" => ImageFilter::FlipHorizontal,
                "v" | "vertical" => ImageFilter::FlipVertical,
                _ => return None,
            },
            "rotate" => match value.parse::<i64>().ok()?.rem_euclid(360) {
                angle @ (90 | 180 | 270) => ImageFilter::Rotate(angle as u32),
                _ => return None,
            },
            "hue" | "colorize" => ImageFilter::Hue(number()? as i32),
            _ => return None,
        };
        Some(filter)
    }

    /// Parse an ordered filter list, warning about and skipping entries that do not parse.
    pub fn parse_all(filters: &[(String, String)]) -> Vec<Self> {
        filters
            .iter()
            .filter_map(|(name, value)| {
                let parsed = Self::parse(name, value);
                if parsed.is_none() {
                    tracing::warn!(filter = %name, value = %value, "Skipping unsupported image filter");
                }
                parsed
            })
            .collect()
    }

    pub fn apply(self, mut img: DynamicImage) -> DynamicImage {
        tracing::debug!(filter = ?self, "Applying image filter");
        match self {
            ImageFilter::Greyscale => img.grayscale(),
            ImageFilter::Blur(sigma) => img.blur(sigma),
            ImageFilter::Sharpen(sigma) => img.unsharpen(sigma, 1),
            ImageFilter::Brightness(level) => img.brighten(level * 255 / 100),
            ImageFilter::Contrast(level) => img.adjust_contrast(level),
            ImageFilter::Invert => {
                img.invert();
                img
            }
            ImageFilter::Pixelate(block) => {
                let (w, h) = img.dimensions();
                if block <= 1 {
                    return img;
                }
                let small = img.resize_exact(
                    (w / block).max(1),
                    (h / block).max(1),
                    FilterType::Triangle,
                );
                small.resize_exact(w, h, FilterType::Nearest)
            }
            ImageFilter::FlipHorizontal => img.fliph(),
            ImageFilter::FlipVertical => img.flipv(),
            ImageFilter::Rotate(90) => img.rotate90(),
            ImageFilter::Rotate(180) => img.rotate180(),
            ImageFilter::Rotate(270) => img.rotate270(),
            ImageFilter::Rotate(_) => img,
            ImageFilter::Hue(degrees) => img.huerotate(degrees),
        }
    }
}
