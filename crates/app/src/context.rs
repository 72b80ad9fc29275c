//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        blobs::PgBlobStore,
        products::{Catalog, PgProductsRepository, ProductsService},
        references::{PgReferencesRepository, ReferencesRepository},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub references: Arc<dyn ReferencesRepository>,
}

impl AppContext {
    /// Wire the PostgreSQL backends into a catalog.
    #[must_use]
    pub fn new(db: Db, chunk_size: u32) -> Self {
        let references: Arc<dyn ReferencesRepository> =
            Arc::new(PgReferencesRepository::new(db.clone()));

        let products = Catalog::new(
            Arc::new(PgProductsRepository::new(db.clone())),
            Arc::clone(&references),
            Arc::new(PgBlobStore::new(db, chunk_size)),
        );

        Self {
            products: Arc::new(products),
            references,
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, chunk_size: u32) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), chunk_size))
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}
