//! Upload inputs accepted by the dispatcher.

use bytes::Bytes;
use intake_core::UploadError;
use intake_storage::ByteReader;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

/// File content, either held in memory or spooled to a temporary file.
///
/// Spooled files are removed when the payload is dropped.
#[derive(Debug)]
pub enum FileBody {
    Memory(Bytes),
    Spooled(NamedTempFile),
}

/// One incoming file.
#[derive(Debug)]
pub struct FilePayload {
    /// Client file name, or the name derived from a URL.
    pub original_name: String,
    /// Declared MIME type. Only a hint; content is sniffed.
    pub content_type: Option<String>,
    pub body: FileBody,
}

impl FilePayload {
    pub fn from_bytes(
        original_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.map(str::to_string),
            body: FileBody::Memory(bytes.into()),
        }
    }

    pub fn spooled(
        original_name: impl Into<String>,
        content_type: Option<String>,
        file: NamedTempFile,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type,
            body: FileBody::Spooled(file),
        }
    }

    /// Read a local file into a payload named after its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::from_bytes(name, None, bytes))
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self.body, FileBody::Spooled(_))
    }

    pub async fn len(&self) -> Result<u64, UploadError> {
        match &self.body {
            FileBody::Memory(bytes) => Ok(bytes.len() as u64),
            FileBody::Spooled(file) => Ok(tokio::fs::metadata(file.path()).await?.len()),
        }
    }

    /// Up to `limit` leading bytes, for content sniffing.
    pub async fn head(&self, limit: usize) -> Result<Vec<u8>, UploadError> {
        match &self.body {
            FileBody::Memory(bytes) => Ok(bytes[..bytes.len().min(limit)].to_vec()),
            FileBody::Spooled(file) => {
                let handle = tokio::fs::File::open(file.path()).await?;
                let mut buf = Vec::with_capacity(limit);
                handle.take(limit as u64).read_to_end(&mut buf).await?;
                Ok(buf)
            }
        }
    }

    pub async fn read_all(&self) -> Result<Bytes, UploadError> {
        match &self.body {
            FileBody::Memory(bytes) => Ok(bytes.clone()),
            FileBody::Spooled(file) => Ok(Bytes::from(tokio::fs::read(file.path()).await?)),
        }
    }

    /// Reader over the content, for streaming into a backend.
    pub async fn reader(&self) -> Result<ByteReader, UploadError> {
        match &self.body {
            FileBody::Memory(bytes) => Ok(Box::pin(std::io::Cursor::new(bytes.clone()))),
            FileBody::Spooled(file) => {
                let handle = tokio::fs::File::open(file.path()).await?;
                Ok(Box::pin(handle))
            }
        }
    }
}

/// Position of one fragment within a chunked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Client-chosen identity of the logical upload.
    pub upload_id: String,
    /// Zero-based fragment index.
    pub index: u32,
    pub total: u32,
}

/// A named file field of an incoming request.
#[derive(Debug)]
pub struct RequestFile {
    pub field: String,
    pub payload: FilePayload,
    /// Present when the field carries one fragment of a chunked upload.
    pub chunk: Option<ChunkInfo>,
}

impl RequestFile {
    pub fn new(field: impl Into<String>, payload: FilePayload) -> Self {
        Self {
            field: field.into(),
            payload,
            chunk: None,
        }
    }

    pub fn chunked(field: impl Into<String>, payload: FilePayload, chunk: ChunkInfo) -> Self {
        Self {
            field: field.into(),
            payload,
            chunk: Some(chunk),
        }
    }
}

/// Request-like input exposing named file fields.
#[derive(Debug, Default)]
pub struct IncomingRequest {
    pub files: Vec<RequestFile>,
}

impl IncomingRequest {
    pub fn with_file(mut self, file: RequestFile) -> Self {
        self.files.push(file);
        self
    }
}

/// What to ingest.
#[derive(Debug)]
pub enum UploadSource {
    File(FilePayload),
    Files(Vec<FilePayload>),
    Request(IncomingRequest),
    Url(String),
    Urls(Vec<String>),
}
