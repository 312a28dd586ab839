//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use intake_core::UploadError;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => UploadError::NotFound(path),
            StorageError::ConfigError(msg) => UploadError::Config(msg),
            other => UploadError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of blob content chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Reader consumed by [`Storage::put_stream`]
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Blob storage abstraction
///
/// Backends address blobs by relative path (see the crate root documentation). Writes
/// replace existing content. Deletes are idempotent.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` at `path`, replacing any existing blob
    async fn put(&self, path: &str, data: Bytes) -> StorageResult<()>;

    /// Write a blob from a reader without buffering it in memory.
    ///
    /// Returns the number of bytes written.
    async fn put_stream(&self, path: &str, reader: ByteReader) -> StorageResult<u64>;

    /// Read a whole blob
    async fn get(&self, path: &str) -> StorageResult<Bytes>;

    /// Read a blob as a stream of chunks
    async fn get_stream(&self, path: &str) -> StorageResult<ByteStream>;

    /// Check if a blob exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Delete a blob. Returns `false` when there was nothing to delete.
    async fn delete(&self, path: &str) -> StorageResult<bool>;

    /// Size in bytes of a blob
    async fn size(&self, path: &str) -> StorageResult<u64>;

    /// Public URL of the blob at `path`
    fn url(&self, path: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
