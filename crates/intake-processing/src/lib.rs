//! Intake Processing Library
//!
//! Content inspection and transformation for the ingestion pipeline:
//! - Rule-based upload validation ([`FileValidator`])
//! - MIME sniffing and canonical extension lookup ([`mime`])
//! - Image transforms and thumbnail derivation (behind the `image` feature)

#[cfg(feature = "image")]
pub mod compression;
#[cfg(feature = "image")]
pub mod image;
pub mod mime;
pub mod validator;

#[cfg(feature = "image")]
pub use compression::{ImageEncoder, OutputFormat};
#[cfg(feature = "image")]
pub use self::image::{ImageTransformer, ThumbnailGenerator, TransformOverrides, Transformed};
pub use validator::{FileFacts, FileValidator, ValidationError};
