//! Chunked upload assembly
//!
//! A logical upload arrives as `total` fragments spread over several requests. Fragments
//! are keyed by index and merged by index once every index has been received, so arrival
//! order does not matter. Sessions are keyed by field name plus the client's upload id
//! and live in memory until they complete, fail, or sit idle past the configured TTL.
//!
//! Concurrent fragments of different uploads proceed independently. Fragments of the
//! same upload are serialised on that session's lock.

mod session;

pub use session::ChunkState;

use crate::source::{ChunkInfo, FilePayload};
use intake_core::config::ChunkUploadConfig;
use intake_core::models::ProgressStatus;
use intake_core::UploadError;
use session::ChunkSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type SessionKey = (String, String);

/// Outcome of receiving one fragment.
#[derive(Debug)]
pub enum ChunkProgress {
    Receiving { received: u32, total: u32 },
    Complete(FilePayload),
}

impl ChunkProgress {
    /// Percentage of fragments received.
    pub fn percent(&self) -> f64 {
        match self {
            ChunkProgress::Receiving { received, total } if *total > 0 => {
                (*received as f64 / *total as f64) * 100.0
            }
            ChunkProgress::Receiving { .. } => 0.0,
            ChunkProgress::Complete(_) => 100.0,
        }
    }

    pub fn status(&self) -> ProgressStatus {
        ProgressStatus::new(self.percent())
    }
}

pub struct ChunkAssembler {
    config: ChunkUploadConfig,
    sessions: Mutex<HashMap<SessionKey, Arc<Mutex<ChunkSession>>>>,
}

impl ChunkAssembler {
    pub fn new(config: ChunkUploadConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.session_ttl_secs)
    }

    /// Store one fragment of the upload identified by `field` and `chunk.upload_id`.
    ///
    /// Returns the merged file when this fragment completes the upload. A fragment whose
    /// index or total contradicts the session destroys the session and fails.
    #[tracing::instrument(skip(self, field, chunk, payload), fields(field_name = %field, upload_id = %chunk.upload_id, index = chunk.index))]
    pub async fn receive(
        &self,
        field: &str,
        chunk: &ChunkInfo,
        payload: FilePayload,
    ) -> Result<ChunkProgress, UploadError> {
        if chunk.total == 0 || chunk.total > self.config.max_chunks {
            return Err(UploadError::ChunkSession(format!(
                "Chunk total {} must be between 1 and {}",
                chunk.total, self.config.max_chunks
            )));
        }

        self.purge_expired().await;

        let key: SessionKey = (field.to_string(), chunk.upload_id.clone());
        let session = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let created = Arc::new(Mutex::new(ChunkSession::new(
                        chunk.total,
                        self.config.temp_dir.as_deref(),
                    )?));
                    sessions.insert(key.clone(), created.clone());
                    created
                }
            }
        };

        let mut guard = session.lock().await;

        let violation = if guard.total() != chunk.total {
            Some(format!(
                "Chunk total changed from {} to {}",
                guard.total(),
                chunk.total
            ))
        } else if chunk.index >= chunk.total {
            Some(format!(
                "Chunk index {} out of range for {} chunks",
                chunk.index, chunk.total
            ))
        } else {
            None
        };
        if let Some(message) = violation {
            drop(guard);
            self.remove(&key).await;
            tracing::warn!(error = %message, "Chunk session aborted");
            return Err(UploadError::ChunkSession(message));
        }

        if let Err(e) = guard.store(chunk.index, &payload).await {
            drop(guard);
            self.remove(&key).await;
            return Err(e);
        }

        if !guard.is_finished() {
            return Ok(ChunkProgress::Receiving {
                received: guard.received(),
                total: guard.total(),
            });
        }

        let assembled = guard.assemble(self.config.temp_dir.as_deref()).await;
        drop(guard);
        self.remove(&key).await;

        let payload = assembled?;
        tracing::debug!(total = chunk.total, "Chunked upload assembled");
        Ok(ChunkProgress::Complete(payload))
    }

    async fn remove(&self, key: &SessionKey) {
        self.sessions.lock().await.remove(key);
    }

    /// State of a live session, if any.
    pub async fn session_state(&self, field: &str, upload_id: &str) -> Option<ChunkState> {
        let session = self
            .sessions
            .lock()
            .await
            .get(&(field.to_string(), upload_id.to_string()))
            .cloned()?;
        let state = session.lock().await.state();
        Some(state)
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drop sessions idle for longer than the TTL. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        // A session whose lock is held is in use and therefore not idle.
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => s.idle_for() <= ttl,
            Err(_) => true,
        });
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged = purged, "Expired chunk sessions removed");
        }
        purged
    }
}
