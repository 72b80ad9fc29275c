//! Blob Store

use async_trait::async_trait;

use crate::domain::blobs::{
    errors::BlobError,
    records::{BlobDownload, BlobMetadata, BlobUpload, BlobUuid, ByteStream},
};

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Consume `body` and persist it as a new blob, returning the metadata
    /// (including the minted id) once the last chunk is stored.
    ///
    /// Nothing is persisted when the body yields an error or the future is
    /// dropped before completion.
    async fn write(&self, upload: BlobUpload, body: ByteStream)
    -> Result<BlobMetadata, BlobError>;

    /// Open a blob for streaming reads.
    async fn open_read(&self, blob: BlobUuid) -> Result<BlobDownload, BlobError>;

    /// Delete a blob. Returns [`BlobError::NotFound`] when it is already gone.
    async fn delete(&self, blob: BlobUuid) -> Result<(), BlobError>;
}
