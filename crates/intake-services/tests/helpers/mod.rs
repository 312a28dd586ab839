#![allow(dead_code)]

pub mod fixtures;
pub mod repository;
pub mod storage;

use intake_core::Config;
use intake_db::{FileRepository, InMemoryFileRepository};
use intake_services::FileUploadService;
use intake_storage::{Disks, LocalStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Service over a temporary local disk.
pub struct TestApp {
    pub service: FileUploadService,
    pub storage: Arc<dyn Storage>,
    pub repository: Option<Arc<InMemoryFileRepository>>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Every regular file under the disk root.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        collect_files(self.root(), &mut found);
        found.sort();
        found
    }

    pub async fn record_count(&self) -> usize {
        match &self.repository {
            Some(repo) => repo.len().await,
            None => 0,
        }
    }
}

fn collect_files(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, found);
        } else {
            found.push(path);
        }
    }
}

async fn local_disk() -> (TempDir, Arc<dyn Storage>) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = LocalStorage::new(
        temp_dir.path().to_path_buf(),
        "http://localhost/storage".to_string(),
    )
    .await
    .expect("Failed to create local storage");
    (temp_dir, Arc::new(storage))
}

/// Default configuration with the in-memory metadata store.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(Config::default()).await
}

pub async fn setup_test_app_with(config: Config) -> TestApp {
    let (temp_dir, storage) = local_disk().await;
    let repository = Arc::new(InMemoryFileRepository::new());
    let service = FileUploadService::new(
        config,
        Disks::single("local", storage.clone()),
        Some(repository.clone()),
    )
    .expect("Failed to build service");

    TestApp {
        service,
        storage,
        repository: Some(repository),
        _temp_dir: temp_dir,
    }
}

/// Blob-only service without a metadata store.
pub async fn setup_without_db(config: Config) -> TestApp {
    let (temp_dir, storage) = local_disk().await;
    let service = FileUploadService::new(config, Disks::single("local", storage.clone()), None)
        .expect("Failed to build service");

    TestApp {
        service,
        storage,
        repository: None,
        _temp_dir: temp_dir,
    }
}

pub async fn setup_with_repository(config: Config, repository: Arc<dyn FileRepository>) -> TestApp {
    let (temp_dir, storage) = local_disk().await;
    let service = FileUploadService::new(
        config,
        Disks::single("local", storage.clone()),
        Some(repository),
    )
    .expect("Failed to build service");

    TestApp {
        service,
        storage,
        repository: None,
        _temp_dir: temp_dir,
    }
}

/// Service over a temporary local disk seen through `wrap`.
pub async fn setup_with_storage<F>(config: Config, wrap: F) -> TestApp
where
    F: FnOnce(Arc<dyn Storage>) -> Arc<dyn Storage>,
{
    let (temp_dir, local) = local_disk().await;
    let storage = wrap(local);
    let repository = Arc::new(InMemoryFileRepository::new());
    let service = FileUploadService::new(
        config,
        Disks::single("local", storage.clone()),
        Some(repository.clone()),
    )
    .expect("Failed to build service");

    TestApp {
        service,
        storage,
        repository: Some(repository),
        _temp_dir: temp_dir,
    }
}
