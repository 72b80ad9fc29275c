//! Chunked PostgreSQL blob store.

use std::io;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, stream};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;

use crate::{
    database::Db,
    domain::blobs::{
        errors::BlobError,
        records::{BlobDownload, BlobMetadata, BlobUpload, BlobUuid, ByteStream},
        store::BlobStore,
    },
};

const CREATE_BLOB_SQL: &str = include_str!("sql/create_blob.sql");
const CREATE_BLOB_CHUNK_SQL: &str = include_str!("sql/create_blob_chunk.sql");
const FINISH_BLOB_SQL: &str = include_str!("sql/finish_blob.sql");
const GET_BLOB_SQL: &str = include_str!("sql/get_blob.sql");
const GET_BLOB_CHUNK_SQL: &str = include_str!("sql/get_blob_chunk.sql");
const DELETE_BLOB_SQL: &str = include_str!("sql/delete_blob.sql");

/// Default chunk size, 255 KiB.
pub const DEFAULT_CHUNK_SIZE: u32 = 255 * 1024;

const MIN_CHUNK_SIZE: u32 = 1024;
const MAX_CHUNK_SIZE: u32 = 16 * 1024 * 1024;

/// Blob store splitting each object into fixed-size `bytea` chunks.
///
/// A write runs inside a single transaction, so a failed or abandoned upload
/// leaves neither the `blobs` row nor any of its chunks behind.
#[derive(Debug, Clone)]
pub struct PgBlobStore {
    db: Db,
    chunk_size: u32,
}

impl PgBlobStore {
    /// Create a store writing chunks of `chunk_size` bytes (clamped to 1 KiB..=16 MiB).
    #[must_use]
    pub fn new(db: Db, chunk_size: u32) -> Self {
        Self {
            db,
            chunk_size: chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
        }
    }

    async fn insert_chunk(
        tx: &mut Transaction<'_, Postgres>,
        blob: BlobUuid,
        n: i32,
        data: &[u8],
    ) -> Result<(), sqlx::Error> {
        query(CREATE_BLOB_CHUNK_SQL)
            .bind(blob.into_uuid())
            .bind(n)
            .bind(data)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for PgBlobStore {
    #[tracing::instrument(
        name = "blobs.pg.write",
        skip(self, body),
        fields(blob_uuid = tracing::field::Empty, length = tracing::field::Empty),
        err
    )]
    async fn write(
        &self,
        upload: BlobUpload,
        mut body: ByteStream,
    ) -> Result<BlobMetadata, BlobError> {
        let blob = BlobUuid::new();
        let chunk_size = usize::try_from(self.chunk_size)?;

        tracing::Span::current().record("blob_uuid", tracing::field::display(blob));

        let mut tx = self.db.begin().await?;

        query(CREATE_BLOB_SQL)
            .bind(blob.into_uuid())
            .bind(&upload.filename)
            .bind(&upload.content_type)
            .bind(i32::try_from(self.chunk_size)?)
            .execute(&mut *tx)
            .await?;

        let mut buffer = BytesMut::with_capacity(chunk_size);
        let mut length = 0_u64;
        let mut n = 0_i32;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;

            length += u64::try_from(chunk.len())?;
            buffer.extend_from_slice(&chunk);

            while buffer.len() >= chunk_size {
                let full = buffer.split_to(chunk_size);

                Self::insert_chunk(&mut tx, blob, n, &full).await?;
                n += 1;
            }
        }

        if !buffer.is_empty() {
            Self::insert_chunk(&mut tx, blob, n, &buffer).await?;
        }

        let metadata = query_as::<Postgres, BlobMetadata>(FINISH_BLOB_SQL)
            .bind(blob.into_uuid())
            .bind(i64::try_from(length)?)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::Span::current().record("length", length);

        debug!(%blob, length, "stored blob");

        Ok(metadata)
    }

    #[tracing::instrument(name = "blobs.pg.open_read", skip(self), err)]
    async fn open_read(&self, blob: BlobUuid) -> Result<BlobDownload, BlobError> {
        let metadata = query_as::<Postgres, BlobMetadata>(GET_BLOB_SQL)
            .bind(blob.into_uuid())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(BlobError::NotFound(blob))?;

        let chunk_count = i32::try_from(metadata.length.div_ceil(u64::from(metadata.chunk_size)))?;
        let pool = self.db.pool().clone();

        let chunks = stream::iter(0..chunk_count)
            .then(move |n| {
                let pool = pool.clone();

                async move {
                    query_scalar::<Postgres, Vec<u8>>(GET_BLOB_CHUNK_SQL)
                        .bind(blob.into_uuid())
                        .bind(n)
                        .fetch_optional(&pool)
                        .await
                        .map_err(io::Error::other)?
                        .map(Bytes::from)
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::UnexpectedEof,
                                format!("blob {blob} is missing chunk {n}"),
                            )
                        })
                }
            })
            .boxed();

        Ok(BlobDownload {
            metadata,
            stream: chunks,
        })
    }

    #[tracing::instrument(name = "blobs.pg.delete", skip(self), err)]
    async fn delete(&self, blob: BlobUuid) -> Result<(), BlobError> {
        let rows_affected = query(DELETE_BLOB_SQL)
            .bind(blob.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(BlobError::NotFound(blob));
        }

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for BlobMetadata {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let length: i64 = row.try_get("length")?;
        let chunk_size: i32 = row.try_get("chunk_size")?;

        Ok(Self {
            uuid: BlobUuid::from_uuid(row.try_get("uuid")?),
            filename: row.try_get("filename")?,
            content_type: row.try_get("content_type")?,
            length: u64::try_from(length).map_err(|e| sqlx::Error::ColumnDecode {
                index: "length".to_string(),
                source: Box::new(e),
            })?,
            chunk_size: u32::try_from(chunk_size).map_err(|e| sqlx::Error::ColumnDecode {
                index: "chunk_size".to_string(),
                source: Box::new(e),
            })?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
