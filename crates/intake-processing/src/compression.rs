use anyhow::{anyhow, Result};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Output format for re-encoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Avif,
    Bmp,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "webp" => Ok(OutputFormat::WebP),
            "avif" => Ok(OutputFormat::Avif),
            "bmp" => Ok(OutputFormat::Bmp),
            _ => Err(anyhow!("Invalid format: {}", s)),
        }
    }

    /// Encodable counterpart of a decoded format, if there is one.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            ImageFormat::Avif => Some(OutputFormat::Avif),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Avif => "image/avif",
            OutputFormat::Bmp => "image/bmp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Bmp => "bmp",
        }
    }

    pub fn to_image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Avif => ImageFormat::Avif,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Encodes decoded images. Quality (0-100) applies to the lossy formats only.
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Bytes> {
        let quality = quality.clamp(1, 100);
        match format {
            OutputFormat::Jpeg => Self::encode_jpeg(img, quality),
            OutputFormat::WebP => Self::encode_webp(img, quality),
            OutputFormat::Avif => Self::encode_avif(img, quality),
            OutputFormat::Png => Self::write_with(img, ImageFormat::Png),
            // GIF and BMP encoders want 8-bit RGBA.
            OutputFormat::Gif | OutputFormat::Bmp => Self::write_with(
                &DynamicImage::ImageRgba8(img.to_rgba8()),
                format.to_image_format(),
            ),
        }
    }

    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes> {
        let rgb_img = img.to_rgb8();
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb_img.write_with_encoder(encoder)?;
        Ok(Bytes::from(buffer))
    }

    fn write_with(img: &DynamicImage, format: ImageFormat) -> Result<Bytes> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format)?;
        Ok(Bytes::from(buffer))
    }

    fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality as f32);

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    fn encode_avif(img: &DynamicImage, quality: u8) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let rgb_img = img.to_rgb8();

        let rgb_data: Vec<rgb::RGB8> = rgb_img
            .as_raw()
            .chunks_exact(3)
            .map(|px| rgb::RGB8::new(px[0], px[1], px[2]))
            .collect();

        let img_buf = ravif::Img::new(rgb_data.as_slice(), width as usize, height as usize);

        let encoded = ravif::Encoder::new()
            .with_quality(quality as f32)
            .with_speed(6)
            .encode_rgb(img_buf)?;

        Ok(Bytes::from(encoded.avif_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 8, Rgba([200, 10, 10, 255])))
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JPG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("webp").unwrap(), OutputFormat::WebP);
        assert_eq!(OutputFormat::parse("bmp").unwrap(), OutputFormat::Bmp);
        assert!(OutputFormat::parse("tiff").is_err());
    }

    #[test]
    fn test_from_image_format() {
        assert_eq!(
            OutputFormat::from_image_format(ImageFormat::Png),
            Some(OutputFormat::Png)
        );
        assert_eq!(OutputFormat::from_image_format(ImageFormat::Tiff), None);
    }

    #[test]
    fn test_encode_lossless_formats_decode_back() {
        for format in [OutputFormat::Png, OutputFormat::Gif, OutputFormat::Bmp] {
            let bytes = ImageEncoder::encode(&sample(), format, 90).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (16, 8), "{:?}", format);
            assert_eq!(
                image::guess_format(&bytes).unwrap(),
                format.to_image_format()
            );
        }
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let noisy = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        }));
        let low = ImageEncoder::encode(&noisy, OutputFormat::Jpeg, 10).unwrap();
        let high = ImageEncoder::encode(&noisy, OutputFormat::Jpeg, 95).unwrap();
        assert!(low.len() < high.len());
        assert_eq!(image::guess_format(&low).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_encode_webp() {
        let bytes = ImageEncoder::encode(&sample(), OutputFormat::WebP, 80).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }
}
