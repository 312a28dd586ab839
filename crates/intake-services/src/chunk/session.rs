use crate::source::{FileBody, FilePayload};
use intake_core::UploadError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::{NamedTempFile, TempDir};

/// Lifecycle of one logical chunked upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Created, no fragment stored yet.
    Pending,
    /// Some but not all fragments stored.
    Receiving,
    /// All fragments merged. Terminal.
    Complete,
}

/// Fragments of one logical upload, spooled one file per index under a private directory.
///
/// Dropping the session removes the directory and every fragment in it.
#[derive(Debug)]
pub(crate) struct ChunkSession {
    total: u32,
    received: BTreeSet<u32>,
    state: ChunkState,
    original_name: String,
    content_type: Option<String>,
    dir: TempDir,
    last_activity: Instant,
}

impl ChunkSession {
    pub(crate) fn new(total: u32, temp_root: Option<&Path>) -> Result<Self, UploadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("intake-chunks-");
        let dir = match temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self {
            total,
            received: BTreeSet::new(),
            state: ChunkState::Pending,
            original_name: String::new(),
            content_type: None,
            dir,
            last_activity: Instant::now(),
        })
    }

    pub(crate) fn total(&self) -> u32 {
        self.total
    }

    pub(crate) fn received(&self) -> u32 {
        self.received.len() as u32
    }

    pub(crate) fn state(&self) -> ChunkState {
        self.state
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.received() == self.total
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    fn fragment_path(&self, index: u32) -> PathBuf {
        self.dir.path().join(format!("{:06}.part", index))
    }

    /// Spool fragment `index`. A re-sent index replaces the earlier copy.
    pub(crate) async fn store(&mut self, index: u32, payload: &FilePayload) -> Result<(), UploadError> {
        if self.state == ChunkState::Complete {
            return Err(UploadError::ChunkSession(
                "Upload session is already complete".to_string(),
            ));
        }

        let target = self.fragment_path(index);
        match &payload.body {
            FileBody::Memory(bytes) => tokio::fs::write(&target, bytes).await?,
            FileBody::Spooled(file) => {
                tokio::fs::copy(file.path(), &target).await?;
            }
        }

        if self.original_name.is_empty() {
            self.original_name = payload.original_name.clone();
        }
        if self.content_type.is_none() {
            self.content_type = payload.content_type.clone();
        }
        self.received.insert(index);
        self.state = ChunkState::Receiving;
        self.last_activity = Instant::now();

        tracing::debug!(
            index = index,
            received = self.received(),
            total = self.total,
            "Chunk stored"
        );
        Ok(())
    }

    /// Merge fragments in index order into one spooled payload.
    pub(crate) async fn assemble(&mut self, temp_root: Option<&Path>) -> Result<FilePayload, UploadError> {
        if !self.is_finished() {
            return Err(UploadError::ChunkSession(format!(
                "Cannot assemble upload with {} of {} chunks",
                self.received(),
                self.total
            )));
        }

        let merged = match temp_root {
            Some(root) => NamedTempFile::new_in(root)?,
            None => NamedTempFile::new()?,
        };
        let mut out = tokio::fs::File::from_std(merged.reopen()?);

        for index in 0..self.total {
            let path = self.fragment_path(index);
            let mut part = tokio::fs::File::open(&path).await.map_err(|e| {
                UploadError::ChunkSession(format!("Chunk {} is missing: {}", index, e))
            })?;
            tokio::io::copy(&mut part, &mut out).await?;
        }
        tokio::io::AsyncWriteExt::flush(&mut out).await?;
        out.sync_all().await?;

        self.state = ChunkState::Complete;
        Ok(FilePayload::spooled(
            std::mem::take(&mut self.original_name),
            self.content_type.take(),
            merged,
        ))
    }
}
