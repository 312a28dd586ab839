use async_trait::async_trait;
use intake_core::{NewStoredFile, StoredFile, UploadError};
use intake_db::{FileRepository, LookupField};

/// Metadata store whose writes always fail.
pub struct FailingRepository;

#[async_trait]
impl FileRepository for FailingRepository {
    async fn create(&self, _file: NewStoredFile) -> Result<StoredFile, UploadError> {
        Err(UploadError::Internal("metadata store unavailable".to_string()))
    }

    async fn find(&self, _id: i64) -> Result<Option<StoredFile>, UploadError> {
        Ok(None)
    }

    async fn find_by(
        &self,
        _field: LookupField,
        _value: &str,
    ) -> Result<Option<StoredFile>, UploadError> {
        Ok(None)
    }

    async fn total_size_for_owner(&self, _user_id: i64) -> Result<u64, UploadError> {
        Ok(0)
    }

    async fn delete(&self, _id: i64) -> Result<bool, UploadError> {
        Ok(false)
    }
}
