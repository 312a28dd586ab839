//! Intake Services Library
//!
//! The ingestion pipeline wired together: the [`FileUploadService`] dispatcher, chunked
//! upload assembly, remote URL fetching, per-user quotas, storage path generation and
//! the storage/metadata gateway that persists and deletes files.

pub mod chunk;
mod deletion;
mod gateway;
pub mod paths;
pub mod quota;
pub mod remote;
pub mod service;
pub mod source;

pub use chunk::{ChunkAssembler, ChunkProgress, ChunkState};
pub use quota::QuotaEnforcer;
pub use remote::{FetchOptions, RemoteFetcher};
pub use service::FileUploadService;
pub use source::{ChunkInfo, FileBody, FilePayload, IncomingRequest, RequestFile, UploadSource};
