//! Blob Records

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io,
};

use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use jiff::Timestamp;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{domain::blobs::errors::BlobError, uuids::TypedUuid};

/// Blob UUID
pub type BlobUuid = TypedUuid<BlobMetadata>;

/// Body of a blob, produced or consumed chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// Blob Metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub uuid: BlobUuid,
    pub filename: String,
    pub content_type: String,
    pub length: u64,
    pub chunk_size: u32,
    pub created_at: Timestamp,
}

/// Metadata supplied when opening a blob for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUpload {
    pub filename: String,
    pub content_type: String,
}

/// A blob opened for reading. The body is lazy: nothing beyond the metadata
/// has been fetched until the stream is polled.
pub struct BlobDownload {
    pub metadata: BlobMetadata,
    pub stream: ByteStream,
}

impl BlobDownload {
    /// Pipe the body into `writer` one chunk at a time.
    ///
    /// # Errors
    ///
    /// Returns an error when reading a chunk or writing it out fails.
    pub async fn write_to<W>(mut self, writer: &mut W) -> Result<u64, BlobError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut written = 0_u64;

        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;

            writer.write_all(&chunk).await?;
            written += u64::try_from(chunk.len())?;
        }

        writer.flush().await?;

        Ok(written)
    }
}

impl Debug for BlobDownload {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BlobDownload")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
