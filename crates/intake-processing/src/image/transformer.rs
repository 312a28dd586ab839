//! Image transformer - runs the configured upload transforms
//!
//! Order: decode, resize, watermark, filters, encode. The encode format is the
//! per-upload override, else the configured conversion, else the source format.

use crate::compression::{ImageEncoder, OutputFormat};
use crate::image::filters::ImageFilter;
use crate::image::resize;
use crate::image::watermark::{Watermark, WatermarkConfig};
use bytes::Bytes;
use image::{GenericImageView, ImageReader};
use intake_core::config::ImageProcessingConfig;
use intake_core::models::ResizeOverride;
use intake_core::UploadError;
use std::io::Cursor;

/// Per-upload settings that take precedence over the configured ones.
#[derive(Debug, Clone, Default)]
pub struct TransformOverrides {
    pub convert_to: Option<String>,
    pub quality: Option<u8>,
    pub resize: Option<ResizeOverride>,
}

/// Result of a successful transform
#[derive(Debug, Clone)]
pub struct Transformed {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl Transformed {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

pub struct ImageTransformer;

impl ImageTransformer {
    /// Run the transform pipeline over encoded image bytes.
    ///
    /// `watermark` holds the encoded watermark image when one is configured and readable.
    pub fn process(
        data: &[u8],
        config: &ImageProcessingConfig,
        overrides: &TransformOverrides,
        watermark: Option<&[u8]>,
    ) -> Result<Transformed, UploadError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| UploadError::Processing(format!("Failed to read image: {}", e)))?;
        let source_format = reader.format();
        let mut img = reader
            .decode()
            .map_err(|e| UploadError::Processing(format!("Failed to decode image: {}", e)))?;

        let target = Self::output_format(config, overrides, source_format)?;

        if let Some(ref over) = overrides.resize {
            let keep_aspect = config
                .resize
                .as_ref()
                .map(|r| r.maintain_aspect_ratio)
                .unwrap_or(true);
            let upsize = config.resize.as_ref().map(|r| r.upsize).unwrap_or(false);
            img = resize::apply(img, over.width, over.height, keep_aspect, upsize);
        } else if let Some(ref r) = config.resize {
            img = resize::apply(img, r.width, r.height, r.maintain_aspect_ratio, r.upsize);
        }

        if let Some(watermark_bytes) = watermark {
            let wm_config = WatermarkConfig::from(&config.watermark);
            img = Watermark::apply(img, watermark_bytes, &wm_config).map_err(|e| {
                UploadError::Processing(format!("Failed to apply watermark: {}", e))
            })?;
        }

        for filter in ImageFilter::parse_all(&config.filters) {
            img = filter.apply(img);
        }

        let quality = overrides.quality.unwrap_or(config.quality);
        let (width, height) = img.dimensions();
        let bytes = ImageEncoder::encode(&img, target, quality).map_err(|e| {
            UploadError::Processing(format!("Failed to encode {:?}: {}", target, e))
        })?;

        tracing::debug!(
            format = ?target,
            width = width,
            height = height,
            size_bytes = bytes.len(),
            "Image transformed"
        );

        Ok(Transformed {
            bytes,
            format: target,
            width,
            height,
        })
    }

    fn output_format(
        config: &ImageProcessingConfig,
        overrides: &TransformOverrides,
        source: Option<image::ImageFormat>,
    ) -> Result<OutputFormat, UploadError> {
        if let Some(requested) = overrides
            .convert_to
            .as_deref()
            .or(config.convert_to.as_deref())
        {
            return OutputFormat::parse(requested)
                .map_err(|e| UploadError::Processing(e.to_string()));
        }
        source
            .and_then(OutputFormat::from_image_format)
            .ok_or_else(|| {
                UploadError::Processing(format!(
                    "Cannot re-encode source format {:?}",
                    source
                ))
            })
    }
}
