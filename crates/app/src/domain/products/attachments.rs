//! Attachments
//!
//! Files sent alongside a create or update request. Each attachment owns a
//! temporary copy of the upload; the copy is removed once the attachment has
//! been uploaded, skipped, or dropped.

use std::{io, path::Path};

use futures::StreamExt;
use tempfile::{NamedTempFile, TempPath};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::domain::blobs::{BlobUpload, ByteStream};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug)]
pub struct Attachment {
    file: TempPath,
    filename: String,
    content_type: String,
}

impl Attachment {
    /// Wrap a temporary file that this attachment now owns.
    #[must_use]
    pub fn new(file: TempPath, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            file,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Write `contents` to a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary file cannot be created or written.
    pub async fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        contents: &[u8],
    ) -> io::Result<Self> {
        let file = NamedTempFile::new()?.into_temp_path();

        tokio::fs::write(&file, contents).await?;

        Ok(Self::new(file, filename, content_type))
    }

    /// Stage a copy of `source`, guessing the content type from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error when `source` cannot be read or the copy written.
    pub async fn stage(source: &Path) -> io::Result<Self> {
        let file = NamedTempFile::new()?.into_temp_path();

        tokio::fs::copy(source, &file).await?;

        let filename = source
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self::new(file, filename, content_type_for(source)))
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file
    }

    pub(crate) fn upload(&self) -> BlobUpload {
        BlobUpload {
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
        }
    }

    /// Open the staged file as a chunked body.
    pub(crate) async fn open(&self) -> io::Result<ByteStream> {
        let file = File::open(&self.file).await?;

        Ok(ReaderStream::new(file).boxed())
    }

    /// Remove the staged file now rather than on drop.
    pub fn release(self) {
        let path = self.file.to_path_buf();

        if let Err(error) = self.file.close()
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), %error, "failed to remove attachment file");
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
