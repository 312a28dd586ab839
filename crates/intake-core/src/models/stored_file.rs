use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FileCategory;

/// Metadata record of a persisted upload.
///
/// `path` is unique within `disk` and `name` is always the basename of `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoredFile {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub disk: String,
    pub mime_type: String,
    pub size: i64,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(&self.mime_type)
    }
}

/// Fields needed to create a [`StoredFile`]; identity and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStoredFile {
    pub name: String,
    pub path: String,
    pub disk: String,
    pub mime_type: String,
    pub size: i64,
    pub user_id: Option<i64>,
}
