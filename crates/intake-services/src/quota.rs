use intake_core::config::QuotaConfig;
use intake_core::UploadError;
use intake_db::FileRepository;
use std::sync::Arc;

/// Per-user storage cap.
///
/// The check reads committed usage and decides without a lock held across the later
/// write, so concurrent uploads from one user can jointly overshoot the cap.
pub struct QuotaEnforcer {
    config: QuotaConfig,
    repository: Option<Arc<dyn FileRepository>>,
}

impl QuotaEnforcer {
    pub fn new(config: QuotaConfig, repository: Option<Arc<dyn FileRepository>>) -> Self {
        Self { config, repository }
    }

    /// Fail with `QuotaExceeded` when `user_id`'s stored bytes plus `incoming` exceed the cap.
    ///
    /// No-op when quota is disabled, the upload is anonymous, or there is no metadata store.
    #[tracing::instrument(skip(self), fields(user_id = ?user_id, size_bytes = incoming))]
    pub async fn check(&self, user_id: Option<i64>, incoming: u64) -> Result<(), UploadError> {
        if !self.config.enabled {
            return Ok(());
        }
        let Some(user_id) = user_id else {
            return Ok(());
        };
        let Some(repository) = &self.repository else {
            tracing::warn!("Quota enabled without a metadata store; skipping quota check");
            return Ok(());
        };

        let used = repository.total_size_for_owner(user_id).await?;
        let limit = self.config.max_size_per_user;
        if used.saturating_add(incoming) > limit {
            tracing::warn!(used = used, limit = limit, "Upload rejected by quota");
            return Err(UploadError::QuotaExceeded {
                used,
                incoming,
                limit,
            });
        }
        Ok(())
    }
}
