//! Upload batches
//!
//! Blobs written for a single request are tracked until the request either
//! commits them (they are referenced by a saved product) or rolls them back.
//! A batch dropped without either, e.g. because the request future was
//! cancelled, schedules deletion of whatever it had written.
//!
//! Once the product write has been issued the batch cannot tell whether it
//! landed, so cleanup first re-reads the product and keeps every blob the
//! stored document references.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::domain::{
    blobs::{BlobError, BlobStore, BlobUuid},
    products::{
        attachments::Attachment, errors::ProductsRepositoryError, records::ProductUuid,
        repository::ProductsRepository,
    },
};

/// Product whose write may already have stored references to the batch.
struct Persisting {
    products: Arc<dyn ProductsRepository>,
    product: ProductUuid,
}

pub(crate) struct UploadBatch {
    store: Arc<dyn BlobStore>,
    uploaded: Mutex<Vec<BlobUuid>>,
    persisting: Option<Persisting>,
    settled: bool,
}

impl UploadBatch {
    pub(crate) fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            uploaded: Mutex::new(Vec::new()),
            persisting: None,
            settled: false,
        }
    }

    /// Upload every attachment concurrently, returning the new blob ids in
    /// attachment order.
    ///
    /// All uploads are awaited even when one fails; the first failure is
    /// returned and the successful uploads stay recorded for rollback.
    pub(crate) async fn upload_all(
        &self,
        attachments: Vec<Attachment>,
    ) -> Result<Vec<BlobUuid>, BlobError> {
        join_all(attachments.into_iter().map(|attachment| self.upload(attachment)))
            .await
            .into_iter()
            .collect()
    }

    async fn upload(&self, attachment: Attachment) -> Result<BlobUuid, BlobError> {
        let result = match attachment.open().await {
            Ok(body) => self.store.write(attachment.upload(), body).await,
            Err(error) => Err(error.into()),
        };

        attachment.release();

        let metadata = result?;

        self.uploaded.lock().push(metadata.uuid);

        Ok(metadata.uuid)
    }

    /// Mark the start of the write of `product`.
    ///
    /// From here on an abandoned batch only deletes the blobs that the stored
    /// `product`, if any, does not reference.
    pub(crate) fn persisting(
        &mut self,
        products: Arc<dyn ProductsRepository>,
        product: ProductUuid,
    ) {
        self.persisting = Some(Persisting { products, product });
    }

    /// Keep every uploaded blob.
    pub(crate) fn commit(mut self) {
        self.settled = true;
    }

    /// Delete every blob uploaded so far.
    pub(crate) async fn rollback(mut self) {
        self.settled = true;

        let uploaded = std::mem::take(self.uploaded.get_mut());

        delete_uploaded(self.store.as_ref(), uploaded).await;
    }
}

impl Drop for UploadBatch {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let uploaded = std::mem::take(self.uploaded.get_mut());

        if uploaded.is_empty() {
            return;
        }

        let Ok(handle) = Handle::try_current() else {
            warn!(count = uploaded.len(), "no runtime to delete abandoned uploads");
            return;
        };

        let store = Arc::clone(&self.store);
        let persisting = self.persisting.take();

        handle.spawn(async move {
            let abandoned = match persisting {
                Some(persisting) => unreferenced(persisting, uploaded).await,
                None => uploaded,
            };

            delete_uploaded(store.as_ref(), abandoned).await;
        });
    }
}

/// Filter out the blobs the stored product still references.
///
/// When the product cannot be read nothing is deleted: an orphaned blob is
/// recoverable, a dangling image reference is not.
async fn unreferenced(persisting: Persisting, uploaded: Vec<BlobUuid>) -> Vec<BlobUuid> {
    let Persisting { products, product } = persisting;

    match products.get_product(product).await {
        Ok(stored) => {
            let referenced: FxHashSet<BlobUuid> = stored.images().collect();

            uploaded
                .into_iter()
                .filter(|blob| {
                    let keep = referenced.contains(blob);

                    if keep {
                        debug!(%blob, %product, "keeping upload referenced by stored product");
                    }

                    !keep
                })
                .collect()
        }
        Err(ProductsRepositoryError::NotFound) => uploaded,
        Err(error) => {
            warn!(
                %product,
                %error,
                count = uploaded.len(),
                "cannot check abandoned uploads against stored product, keeping them"
            );

            Vec::new()
        }
    }
}

async fn delete_uploaded(store: &dyn BlobStore, uploaded: Vec<BlobUuid>) {
    for blob in uploaded {
        match store.delete(blob).await {
            Ok(()) => debug!(%blob, "rolled back upload"),
            Err(error) => warn!(%blob, %error, "failed to roll back upload"),
        }
    }
}
