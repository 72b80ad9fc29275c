//! Blob store errors.

use std::{io, num::TryFromIntError};

use thiserror::Error;

use crate::domain::blobs::records::BlobUuid;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob {0} not found")]
    NotFound(BlobUuid),

    #[error("failed to stream blob body: {0}")]
    Io(#[from] io::Error),

    #[error("blob size out of range")]
    Length(#[from] TryFromIntError),

    #[error("blob storage error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl BlobError {
    /// Whether the blob was already absent, which deletions treat as benign.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
