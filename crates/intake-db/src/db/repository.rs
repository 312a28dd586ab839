//! Store-agnostic metadata repository trait.

use async_trait::async_trait;
use intake_core::{NewStoredFile, StoredFile, UploadError};

/// Unique-enough columns a record can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    Path,
    Name,
}

impl LookupField {
    pub fn column(&self) -> &'static str {
        match self {
            LookupField::Path => "path",
            LookupField::Name => "name",
        }
    }
}

/// Metadata store for [`StoredFile`] records.
///
/// Selected once at startup and injected into the upload service.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record, assigning its id and creation time.
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, UploadError>;

    async fn find(&self, id: i64) -> Result<Option<StoredFile>, UploadError>;

    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<StoredFile>, UploadError>;

    /// Sum of `size` over every record owned by `user_id`.
    async fn total_size_for_owner(&self, user_id: i64) -> Result<u64, UploadError>;

    /// Delete a record. Returns `false` when no record had that id.
    async fn delete(&self, id: i64) -> Result<bool, UploadError>;
}
