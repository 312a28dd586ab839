//! Error types module
//!
//! Every failure an upload or delete can produce is unified under [`UploadError`]. The
//! variants follow the ingestion taxonomy: user-correctable failures (validation, quota,
//! remote fetch), degradable failures (processing) and fatal-per-item failures (storage,
//! not found).
//!
//! The `Database` variant carries a `sqlx::Error` when the `sqlx` feature is enabled and a
//! plain message otherwise.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected, user-correctable failures
    Debug,
    /// Policy limits and degraded paths
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a caller.
///
/// Lets an outer HTTP or CLI layer map errors without matching on every variant.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "QUOTA_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// First violated validation constraint, message ready for display.
    #[error("{0}")]
    Validation(String),

    #[error("Storage quota exceeded: {used} bytes stored + {incoming} bytes incoming exceeds limit of {limit} bytes")]
    QuotaExceeded { used: u64, incoming: u64, limit: u64 },

    #[error("Remote fetch failed: {message}")]
    RemoteFetch {
        status: Option<u16>,
        message: String,
    },

    #[error("Image processing error: {0}")]
    Processing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Chunk session error: {0}")]
    ChunkSession(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        UploadError::RemoteFetch {
            status,
            message: message.into(),
        }
    }

    /// HTTP status reported by the remote server, if this is a fetch failure that got one.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            UploadError::RemoteFetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "ValidationError",
            UploadError::QuotaExceeded { .. } => "QuotaExceeded",
            UploadError::RemoteFetch { .. } => "RemoteFetchError",
            UploadError::Processing(_) => "ProcessingError",
            UploadError::Storage(_) => "StorageError",
            UploadError::NotFound(_) => "NotFoundError",
            UploadError::ChunkSession(_) => "ChunkSessionError",
            UploadError::Database(_) => "DatabaseError",
            UploadError::Config(_) => "ConfigError",
            UploadError::InvalidInput(_) => "InvalidInput",
            UploadError::Internal(_) => "Internal",
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for UploadError {
    fn from(err: SqlxError) -> Self {
        UploadError::Database(err)
    }
}

impl From<io::Error> for UploadError {
    fn from(err: io::Error) -> Self {
        UploadError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        UploadError::Validation(_) => (422, "VALIDATION_ERROR", false, LogLevel::Debug),
        UploadError::QuotaExceeded { .. } => (413, "QUOTA_EXCEEDED", false, LogLevel::Warn),
        UploadError::RemoteFetch { .. } => (502, "REMOTE_FETCH_ERROR", true, LogLevel::Warn),
        UploadError::Processing(_) => (422, "PROCESSING_ERROR", false, LogLevel::Warn),
        UploadError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        UploadError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        UploadError::ChunkSession(_) => (409, "CHUNK_SESSION_ERROR", false, LogLevel::Warn),
        UploadError::Database(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        UploadError::Config(_) => (500, "CONFIG_ERROR", false, LogLevel::Error),
        UploadError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        UploadError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_quota_exceeded() {
        let err = UploadError::QuotaExceeded {
            used: 90,
            incoming: 20,
            limit: 100,
        };
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "QUOTA_EXCEEDED");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = UploadError::Validation(
            "The file field must not be greater than 1 kilobytes.".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "The file field must not be greater than 1 kilobytes."
        );
        assert_eq!(err.error_type(), "ValidationError");
    }

    #[test]
    fn test_remote_status_is_exposed() {
        let err = UploadError::remote(Some(404), "URL returned status code: 404");
        assert_eq!(err.remote_status(), Some(404));
        assert_eq!(err.error_code(), "REMOTE_FETCH_ERROR");
        assert!(err.is_recoverable());

        let err = UploadError::NotFound("file 7".to_string());
        assert_eq!(err.remote_status(), None);
        assert_eq!(err.http_status_code(), 404);
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_database_error_conversion() {
        let err = UploadError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
