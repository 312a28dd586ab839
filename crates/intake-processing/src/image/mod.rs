//! Image processing module
//!
//! - Resize geometry (resize)
//! - Named filters (filters)
//! - Watermark overlay (watermark)
//! - The upload transform pipeline (transformer)
//! - Thumbnail derivation (thumbnail)

pub mod filters;
pub mod resize;
pub mod thumbnail;
pub mod transformer;
pub mod watermark;

pub use filters::ImageFilter;
pub use thumbnail::ThumbnailGenerator;
pub use transformer::{ImageTransformer, TransformOverrides, Transformed};
pub use watermark::{Watermark, WatermarkConfig};
