use crate::compression::{ImageEncoder, OutputFormat};
use crate::image::resize::{cover_crop, fit_dimensions, select_filter};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageReader};
use intake_core::{ThumbnailSize, UploadError};
use std::io::Cursor;

/// Derives the configured thumbnail set from a stored image.
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Render one thumbnail per size.
    ///
    /// The source is decoded once. A failure to decode fails the whole call; a failure
    /// for one size is reported in that size's slot and does not affect the others.
    /// `format` defaults to the source format.
    pub fn generate(
        data: &[u8],
        sizes: &[ThumbnailSize],
        format: Option<OutputFormat>,
        quality: u8,
    ) -> Result<Vec<(ThumbnailSize, Result<Bytes, UploadError>)>, UploadError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| UploadError::Processing(format!("Failed to read image: {}", e)))?;
        let source_format = reader.format().and_then(OutputFormat::from_image_format);
        let img = reader
            .decode()
            .map_err(|e| UploadError::Processing(format!("Failed to decode image: {}", e)))?;

        let format = format.or(source_format).unwrap_or(OutputFormat::Jpeg);

        Ok(sizes
            .iter()
            .map(|size| {
                let thumb = Self::render(&img, size);
                let encoded = ImageEncoder::encode(&thumb, format, quality).map_err(|e| {
                    UploadError::Processing(format!(
                        "Failed to encode thumbnail '{}': {}",
                        size.label, e
                    ))
                });
                (size.clone(), encoded)
            })
            .collect())
    }

    /// Crop sizes fill the box, trimming overflow around the center. Other sizes fit
    /// inside it. Neither enlarges the source.
    pub fn render(img: &DynamicImage, size: &ThumbnailSize) -> DynamicImage {
        let (src_w, src_h) = img.dimensions();
        let base = if size.crop {
            let (x, y, w, h) = cover_crop(src_w, src_h, size.width, size.height);
            img.crop_imm(x, y, w, h)
        } else {
            img.clone()
        };

        let (bw, bh) = base.dimensions();
        let (w, h) = fit_dimensions(bw, bh, Some(size.width), Some(size.height), true, false);
        if (w, h) == (bw, bh) {
            return base;
        }
        base.resize_exact(w, h, select_filter(bw, bh, w, h))
    }
}
