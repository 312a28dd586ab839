use async_trait::async_trait;
use bytes::Bytes;
use intake_storage::{
    ByteReader, ByteStream, Storage, StorageBackend, StorageError, StorageResult,
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Bytes that land before a write is cut off.
pub const LANDED_BYTES: usize = 16;

/// Disk whose writes store a prefix of the content and then fail.
pub struct InterruptedStorage {
    inner: Arc<dyn Storage>,
}

impl InterruptedStorage {
    pub fn wrap(inner: Arc<dyn Storage>) -> Arc<dyn Storage> {
        Arc::new(Self { inner })
    }

    async fn interrupt(&self, path: &str, data: Vec<u8>) -> StorageError {
        if let Err(e) = self.inner.put(path, Bytes::from(data)).await {
            return e;
        }
        StorageError::UploadFailed(format!("Connection lost while writing {}", path))
    }
}

#[async_trait]
impl Storage for InterruptedStorage {
    async fn put(&self, path: &str, data: Bytes) -> StorageResult<()> {
        let landed = data.slice(..data.len().min(LANDED_BYTES)).to_vec();
        Err(self.interrupt(path, landed).await)
    }

    async fn put_stream(&self, path: &str, reader: ByteReader) -> StorageResult<u64> {
        let mut landed = Vec::new();
        reader
            .take(LANDED_BYTES as u64)
            .read_to_end(&mut landed)
            .await?;
        Err(self.interrupt(path, landed).await)
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        self.inner.get(path).await
    }

    async fn get_stream(&self, path: &str) -> StorageResult<ByteStream> {
        self.inner.get_stream(path).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.inner.exists(path).await
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        self.inner.delete(path).await
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        self.inner.size(path).await
    }

    fn url(&self, path: &str) -> String {
        self.inner.url(path)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
