//! Ingestion dispatcher
//!
//! Routes an [`UploadSource`] to one intake strategy: direct payload, request fields
//! (possibly one fragment of a chunked upload) or remote URL. Collections are processed
//! element by element; a failing element becomes an [`ItemOutcome::Failed`] in its slot
//! and does not abort its siblings.

use crate::chunk::{ChunkAssembler, ChunkProgress};
use crate::gateway::Gateway;
use crate::remote::RemoteFetcher;
use crate::source::{FilePayload, IncomingRequest, UploadSource};
use intake_core::models::{
    DeleteOutcome, DeleteRequest, DeleteStatus, ItemError, ItemOutcome, UploadOptions,
    UploadOutcome, UploadResult,
};
use intake_core::{Config, ErrorMetadata, UploadError};
use intake_db::FileRepository;
use intake_storage::Disks;
use std::sync::Arc;

const DEFAULT_FIELD: &str = "file";

pub struct FileUploadService {
    gateway: Gateway,
    fetcher: RemoteFetcher,
    chunks: ChunkAssembler,
}

impl FileUploadService {
    /// Build the service. Passing a repository enables the metadata store; without one
    /// uploads are blob-only and deletes address storage paths.
    pub fn new(
        config: Config,
        disks: Disks,
        repository: Option<Arc<dyn FileRepository>>,
    ) -> Result<Self, UploadError> {
        config
            .validate()
            .map_err(|e| UploadError::Config(e.to_string()))?;

        if config.database.enabled && repository.is_none() {
            tracing::warn!("Database enabled in configuration but no repository supplied, running without metadata");
        }
        if config.quota.enabled && repository.is_none() {
            tracing::warn!("Quota enabled without a metadata store, quota checks are disabled");
        }

        let fetcher = RemoteFetcher::new(config.url_download.clone())?;
        let chunks = ChunkAssembler::new(config.chunk_upload.clone());
        let gateway = Gateway::new(Arc::new(config), disks, repository);

        Ok(Self {
            gateway,
            fetcher,
            chunks,
        })
    }

    pub fn config(&self) -> &Config {
        &self.gateway.config
    }

    pub fn has_metadata_store(&self) -> bool {
        self.gateway.repository.is_some()
    }

    /// Ingest `source`.
    ///
    /// Returns `Single` for one file, `Batch` for collections and multi-file requests, and
    /// `Progress` while a chunked upload is still missing fragments.
    #[tracing::instrument(skip(self, source, options), fields(user_id = ?options.user_id, disk = ?options.disk))]
    pub async fn upload(
        &self,
        source: UploadSource,
        options: UploadOptions,
    ) -> Result<UploadOutcome, UploadError> {
        let field = options
            .field_name
            .clone()
            .unwrap_or_else(|| DEFAULT_FIELD.to_string());

        match source {
            UploadSource::File(payload) => {
                let result = self.gateway.save(payload, &field, &options).await?;
                Ok(UploadOutcome::Single(Box::new(result)))
            }
            UploadSource::Files(payloads) => {
                let mut items = Vec::with_capacity(payloads.len());
                for payload in payloads {
                    let name = payload.original_name.clone();
                    let result = self.gateway.save(payload, &field, &options).await;
                    items.push(item_outcome(name, result));
                }
                Ok(UploadOutcome::Batch(items))
            }
            UploadSource::Request(request) => self.upload_request(request, &field, &options).await,
            UploadSource::Url(url) => {
                let result = self.upload_url(&url, &field, &options).await?;
                Ok(UploadOutcome::Single(Box::new(result)))
            }
            UploadSource::Urls(urls) => {
                let mut items = Vec::with_capacity(urls.len());
                for url in urls {
                    let result = self.upload_url(&url, &field, &options).await;
                    items.push(item_outcome(url, result));
                }
                Ok(UploadOutcome::Batch(items))
            }
        }
    }

    async fn upload_url(
        &self,
        url: &str,
        field: &str,
        options: &UploadOptions,
    ) -> Result<UploadResult, UploadError> {
        let fetch_options = self.fetcher.options(&options.fetch);
        let payload = self.fetcher.fetch(url, &fetch_options).await?;
        self.gateway.save(payload, field, options).await
    }

    /// Request fields. Chunk fragments go to the assembler first; a field whose upload is
    /// still incomplete turns the whole call into a progress response.
    async fn upload_request(
        &self,
        request: IncomingRequest,
        default_field: &str,
        options: &UploadOptions,
    ) -> Result<UploadOutcome, UploadError> {
        if request.files.is_empty() {
            self.gateway
                .validator()
                .validate(None, default_field, &options.custom_rules)?;
            return Ok(UploadOutcome::Batch(Vec::new()));
        }

        let mut ready: Vec<(String, FilePayload)> = Vec::with_capacity(request.files.len());
        for file in request.files {
            match file.chunk {
                Some(chunk) => {
                    match self.chunks.receive(&file.field, &chunk, file.payload).await? {
                        ChunkProgress::Complete(payload) => ready.push((file.field, payload)),
                        progress @ ChunkProgress::Receiving { .. } => {
                            return Ok(UploadOutcome::Progress(progress.status()));
                        }
                    }
                }
                None => ready.push((file.field, file.payload)),
            }
        }

        if ready.len() == 1 {
            if let Some((field, payload)) = ready.pop() {
                let result = self.gateway.save(payload, &field, options).await?;
                return Ok(UploadOutcome::Single(Box::new(result)));
            }
        }

        let mut items = Vec::with_capacity(ready.len());
        for (field, payload) in ready {
            let name = payload.original_name.clone();
            let result = self.gateway.save(payload, &field, options).await;
            items.push(item_outcome(name, result));
        }
        Ok(UploadOutcome::Batch(items))
    }

    /// Delete by record id or storage path, or a batch of them.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, request: DeleteRequest) -> Result<DeleteOutcome, UploadError> {
        match request {
            DeleteRequest::One(target) => {
                self.gateway.delete_one(&target).await?;
                Ok(DeleteOutcome::Single(DeleteStatus { status: true }))
            }
            DeleteRequest::Many(targets) => {
                Ok(DeleteOutcome::Batch(self.gateway.delete_many(&targets).await))
            }
        }
    }

    /// Drop chunk sessions idle past the configured TTL.
    pub async fn purge_expired_chunks(&self) -> usize {
        self.chunks.purge_expired().await
    }

    pub fn chunk_assembler(&self) -> &ChunkAssembler {
        &self.chunks
    }
}

fn item_outcome(source: String, result: Result<UploadResult, UploadError>) -> ItemOutcome {
    match result {
        Ok(result) => ItemOutcome::Uploaded(Box::new(result)),
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "Batch element failed");
            ItemOutcome::Failed(ItemError {
                source,
                code: e.error_code().to_string(),
                error: e.to_string(),
            })
        }
    }
}
