//! Intake Storage Library
//!
//! Blob storage abstraction for the ingestion pipeline: the [`Storage`] trait, a local
//! filesystem backend, an S3-compatible backend and the named-disk registry.
//!
//! # Storage paths
//!
//! Every backend addresses blobs by a relative, `/`-separated path such as
//! `uploads/2024/05/01/{uuid}.jpg`. Paths must not be empty, contain `..` segments or
//! start with `/`. Validation is centralized in the `keys` module so all backends agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_disks, create_storage, Disks};
pub use intake_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteReader, ByteStream, Storage, StorageError, StorageResult};
