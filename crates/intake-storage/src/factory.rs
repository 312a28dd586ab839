#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageError, StorageResult};
use intake_core::config::DiskConfig;
use intake_core::Config;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of named disks with a default.
#[derive(Clone)]
pub struct Disks {
    default: String,
    disks: HashMap<String, Arc<dyn Storage>>,
}

impl fmt::Debug for Disks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.disks.keys().collect();
        names.sort();
        f.debug_struct("Disks")
            .field("default", &self.default)
            .field("disks", &names)
            .finish()
    }
}

impl Disks {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            disks: HashMap::new(),
        }
    }

    /// Registry holding a single disk that is also the default.
    pub fn single(name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        let name = name.into();
        Self::new(name.clone()).with_disk(name, storage)
    }

    pub fn with_disk(mut self, name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        self.disks.insert(name.into(), storage);
        self
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Resolve a disk by name, or the default disk when `name` is `None`.
    pub fn get<'a>(&'a self, name: Option<&'a str>) -> StorageResult<(&'a str, Arc<dyn Storage>)> {
        let name = name.unwrap_or(&self.default);
        self.disks
            .get(name)
            .map(|storage| (name, storage.clone()))
            .ok_or_else(|| StorageError::ConfigError(format!("Disk '{}' is not configured", name)))
    }
}

/// Create a storage backend for one disk
pub async fn create_storage(disk: &DiskConfig) -> StorageResult<Arc<dyn Storage>> {
    match disk {
        #[cfg(feature = "storage-s3")]
        DiskConfig::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let storage = S3Storage::new(bucket.clone(), region.clone(), endpoint.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        DiskConfig::S3 { .. } => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        DiskConfig::Local { root, base_url } => {
            let storage = LocalStorage::new(root.clone(), base_url.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        DiskConfig::Local { .. } => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create every configured disk
pub async fn create_disks(config: &Config) -> StorageResult<Disks> {
    let mut disks = Disks::new(config.storage.disk.clone());
    for (name, disk) in &config.storage.disks {
        let storage = create_storage(disk).await?;
        tracing::debug!(disk = %name, backend = %disk.backend(), "Storage disk initialized");
        disks = disks.with_disk(name.clone(), storage);
    }
    // Surface a missing default disk at startup rather than on first upload.
    disks.get(None)?;
    Ok(disks)
}
