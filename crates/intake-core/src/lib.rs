//! Intake Core Library
//!
//! This crate provides the configuration object, error taxonomy, domain models and the
//! validation-rule grammar shared by every intake component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel, UploadError};
pub use models::{FileCategory, NewStoredFile, StoredFile, ThumbnailSize};
pub use storage_types::StorageBackend;
pub use validation::{RuleConstraint, ValidationRule};
