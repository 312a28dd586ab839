//! In-process metadata store.

use async_trait::async_trait;
use chrono::Utc;
use intake_core::{NewStoredFile, StoredFile, UploadError};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::repository::{FileRepository, LookupField};

/// Metadata store kept in memory. Records are lost when the process exits.
#[derive(Default)]
pub struct InMemoryFileRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    records: BTreeMap<i64, StoredFile>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn all(&self) -> Vec<StoredFile> {
        self.state.read().await.records.values().cloned().collect()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, UploadError> {
        let mut state = self.state.write().await;

        if state
            .records
            .values()
            .any(|r| r.disk == file.disk && r.path == file.path)
        {
            return Err(UploadError::InvalidInput(format!(
                "A file is already recorded at {} on disk {}",
                file.path, file.disk
            )));
        }

        state.next_id += 1;
        let record = StoredFile {
            id: state.next_id,
            name: file.name,
            path: file.path,
            disk: file.disk,
            mime_type: file.mime_type,
            size: file.size,
            user_id: file.user_id,
            created_at: Utc::now(),
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: i64) -> Result<Option<StoredFile>, UploadError> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<StoredFile>, UploadError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .find(|r| match field {
                LookupField::Path => r.path == value,
                LookupField::Name => r.name == value,
            })
            .cloned())
    }

    async fn total_size_for_owner(&self, user_id: i64) -> Result<u64, UploadError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.user_id == Some(user_id))
            .map(|r| r.size.max(0) as u64)
            .sum())
    }

    async fn delete(&self, id: i64) -> Result<bool, UploadError> {
        Ok(self.state.write().await.records.remove(&id).is_some())
    }
}
