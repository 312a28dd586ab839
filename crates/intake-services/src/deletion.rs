//! Deletion of stored files, their thumbnails and their metadata records.

use crate::gateway::Gateway;
use intake_core::models::{thumbnail_path, DeleteItem};
use intake_core::{FileCategory, UploadError};
use intake_db::LookupField;
use intake_storage::Storage;

impl Gateway {
    /// Delete one file addressed by record id or storage path.
    ///
    /// With a metadata store the record must exist; the blob is deleted before the
    /// record so a failed blob delete leaves the record in place. Without one the target
    /// is a path on the default disk and a missing blob is not an error.
    #[tracing::instrument(skip(self))]
    pub(crate) async fn delete_one(&self, target: &str) -> Result<(), UploadError> {
        match &self.repository {
            Some(repository) => {
                let record = match target.parse::<i64>() {
                    Ok(id) => repository.find(id).await?,
                    Err(_) => repository.find_by(LookupField::Path, target).await?,
                }
                .ok_or_else(|| UploadError::NotFound(format!("File '{}' not found", target)))?;

                let (_, storage) = self.disks.get(Some(&record.disk))?;
                self.delete_blob(storage.as_ref(), &record.path).await?;
                if record.category() == FileCategory::Image {
                    self.delete_thumbnails(storage.as_ref(), &record.path).await;
                }
                repository.delete(record.id).await?;
                tracing::info!(id = record.id, path = %record.path, "File deleted");
            }
            None => {
                let (_, storage) = self.disks.get(None)?;
                self.delete_blob(storage.as_ref(), target).await?;
                self.delete_thumbnails(storage.as_ref(), target).await;
                tracing::info!(path = %target, "File deleted");
            }
        }
        Ok(())
    }

    /// Delete each target independently, reporting per-item status.
    pub(crate) async fn delete_many(&self, targets: &[String]) -> Vec<DeleteItem> {
        let mut items = Vec::with_capacity(targets.len());
        for target in targets {
            let item = match self.delete_one(target).await {
                Ok(()) => DeleteItem {
                    target: target.clone(),
                    status: true,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(target = %target, error = %e, "Batch delete item failed");
                    DeleteItem {
                        target: target.clone(),
                        status: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            items.push(item);
        }
        items
    }

    async fn delete_blob(&self, storage: &dyn Storage, path: &str) -> Result<(), UploadError> {
        if !storage.delete(path).await? {
            tracing::warn!(path = %path, "Blob already absent");
        }
        Ok(())
    }

    /// Remove thumbnails of every configured size. Failures are logged and ignored.
    async fn delete_thumbnails(&self, storage: &dyn Storage, parent_path: &str) {
        for size in &self.config.thumbnails.sizes {
            let path = thumbnail_path(parent_path, &size.label);
            if let Err(e) = storage.delete(&path).await {
                tracing::warn!(path = %path, error = %e, "Failed to delete thumbnail");
            }
        }
    }
}
