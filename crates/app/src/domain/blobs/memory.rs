//! In-memory blob store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use jiff::Timestamp;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::domain::blobs::{
    errors::BlobError,
    records::{BlobDownload, BlobMetadata, BlobUpload, BlobUuid, ByteStream},
    store::BlobStore,
};

#[derive(Debug, Clone)]
struct StoredBlob {
    metadata: BlobMetadata,
    chunks: Vec<Bytes>,
}

/// Blob store keeping every object in process memory.
///
/// Chunks are kept exactly as the writer produced them; a blob only becomes
/// visible once its body has been fully consumed.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<FxHashMap<BlobUuid, StoredBlob>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, blob: BlobUuid) -> bool {
        self.blobs.read().contains_key(&blob)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    #[tracing::instrument(name = "blobs.memory.write", skip(self, body), err)]
    async fn write(
        &self,
        upload: BlobUpload,
        mut body: ByteStream,
    ) -> Result<BlobMetadata, BlobError> {
        let mut chunks = Vec::new();
        let mut length = 0_u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;

            length += u64::try_from(chunk.len())?;
            chunks.push(chunk);
        }

        let chunk_size = chunks
            .iter()
            .map(Bytes::len)
            .max()
            .map(u32::try_from)
            .transpose()?
            .unwrap_or_default();

        let metadata = BlobMetadata {
            uuid: BlobUuid::new(),
            filename: upload.filename,
            content_type: upload.content_type,
            length,
            chunk_size,
            created_at: Timestamp::now(),
        };

        self.blobs.write().insert(
            metadata.uuid,
            StoredBlob {
                metadata: metadata.clone(),
                chunks,
            },
        );

        debug!(blob = %metadata.uuid, length, "stored blob");

        Ok(metadata)
    }

    #[tracing::instrument(name = "blobs.memory.open_read", skip(self), err)]
    async fn open_read(&self, blob: BlobUuid) -> Result<BlobDownload, BlobError> {
        let stored = self
            .blobs
            .read()
            .get(&blob)
            .cloned()
            .ok_or(BlobError::NotFound(blob))?;

        Ok(BlobDownload {
            metadata: stored.metadata,
            stream: stream::iter(stored.chunks.into_iter().map(Ok)).boxed(),
        })
    }

    #[tracing::instrument(name = "blobs.memory.delete", skip(self), err)]
    async fn delete(&self, blob: BlobUuid) -> Result<(), BlobError> {
        self.blobs
            .write()
            .remove(&blob)
            .map(|_| ())
            .ok_or(BlobError::NotFound(blob))
    }
}
