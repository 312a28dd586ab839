use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FileCategory;

/// Per-call resize target overriding the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOverride {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Per-call overrides for remote fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOverrides {
    pub timeout_secs: Option<u64>,
    pub max_size: Option<u64>,
    pub chunk_size: Option<u64>,
    pub chunked: Option<bool>,
}

/// Per-call options for the upload entry point. Every field falls back to configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Folder appended to the base path before the organisation policy.
    pub folder_name: Option<String>,
    /// Named disk to write to.
    pub disk: Option<String>,
    pub convert_to: Option<String>,
    pub quality: Option<u8>,
    /// Field name used to select validation rules. Request fields use their own names.
    pub field_name: Option<String>,
    /// Rules keyed by field name, taking precedence over configured rules.
    pub custom_rules: HashMap<String, String>,
    pub resize: Option<ResizeOverride>,
    pub user_id: Option<i64>,
    pub fetch: FetchOverrides,
}

/// A generated thumbnail of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailArtifact {
    pub label: String,
    pub path: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Cropped to the exact box rather than fitted inside it.
    pub crop: bool,
}

/// Result of one successfully persisted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Metadata record id, absent when the metadata store is disabled.
    pub id: Option<i64>,
    pub name: String,
    pub original_name: String,
    pub path: String,
    pub disk: String,
    pub url: String,
    pub thumbnails: Vec<ThumbnailArtifact>,
    pub mime_type: String,
    pub category: FileCategory,
    pub size: u64,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Returned while a chunked upload is still receiving fragments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressStatus {
    /// Percentage of chunks received, 0 to 100.
    pub done: f64,
    pub status: bool,
}

impl ProgressStatus {
    pub fn new(done: f64) -> Self {
        Self { done, status: true }
    }
}

/// Failure of a single element of a batch upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemError {
    /// Original file name or URL of the failed element.
    pub source: String,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemOutcome {
    Uploaded(Box<UploadResult>),
    Failed(ItemError),
}

impl ItemOutcome {
    pub fn as_uploaded(&self) -> Option<&UploadResult> {
        match self {
            ItemOutcome::Uploaded(result) => Some(result),
            ItemOutcome::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&ItemError> {
        match self {
            ItemOutcome::Failed(err) => Some(err),
            ItemOutcome::Uploaded(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    Single(Box<UploadResult>),
    Batch(Vec<ItemOutcome>),
    Progress(ProgressStatus),
}

impl UploadOutcome {
    pub fn into_single(self) -> Option<UploadResult> {
        match self {
            UploadOutcome::Single(result) => Some(*result),
            _ => None,
        }
    }

    pub fn into_batch(self) -> Option<Vec<ItemOutcome>> {
        match self {
            UploadOutcome::Batch(items) => Some(items),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<ProgressStatus> {
        match self {
            UploadOutcome::Progress(p) => Some(*p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_serializes_flat() {
        let outcome = UploadOutcome::Progress(ProgressStatus::new(50.0));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "done": 50.0, "status": true }));
    }

    #[test]
    fn test_batch_failure_serializes_error() {
        let outcome = UploadOutcome::Batch(vec![ItemOutcome::Failed(ItemError {
            source: "a.exe".to_string(),
            error: "The file field must be a file of type: jpg.".to_string(),
            code: "VALIDATION_ERROR".to_string(),
        })]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json[0]["source"], "a.exe");
        assert_eq!(json[0]["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: UploadOptions =
            serde_json::from_str(r#"{"folder_name":"avatars","quality":70}"#).unwrap();
        assert_eq!(options.folder_name.as_deref(), Some("avatars"));
        assert_eq!(options.quality, Some(70));
        assert!(options.custom_rules.is_empty());
        assert_eq!(options.fetch, FetchOverrides::default());
    }
}
