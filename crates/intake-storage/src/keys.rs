//! Shared path validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject paths that are empty, absolute or contain parent-directory segments.
pub fn validate_key(path: &str) -> StorageResult<()> {
    if path.trim().is_empty() {
        return Err(StorageError::InvalidKey("Storage path is empty".to_string()));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage path must be relative: {}",
            path
        )));
    }
    if path.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(StorageError::InvalidKey(format!(
            "Storage path contains invalid segments: {}",
            path
        )));
    }
    Ok(())
}

/// Join a base URL and a storage path with exactly one separator.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
