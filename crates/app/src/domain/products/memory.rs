//! In-memory products repository.

use std::{cmp::Reverse, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::domain::products::{
    data::{FilteredProducts, ProductFilter},
    errors::ProductsRepositoryError,
    records::{Product, ProductUuid},
    repository::ProductsRepository,
};

/// Product documents held in process memory. Every write swaps a whole
/// document under the map's write lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryProductsRepository {
    products: Arc<RwLock<FxHashMap<ProductUuid, Product>>>,
}

impl MemoryProductsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_match(product: &Product, filter: &ProductFilter, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| product.name.to_lowercase().contains(needle))
        && filter.category.is_none_or(|c| product.category == Some(c))
        && filter.brand.is_none_or(|b| product.brand == Some(b))
}

#[async_trait]
impl ProductsRepository for MemoryProductsRepository {
    async fn create_product(&self, product: Product) -> Result<Product, ProductsRepositoryError> {
        let now = Timestamp::now();
        let product = Product {
            created_at: now,
            updated_at: now,
            ..product
        };

        let mut products = self.products.write();

        if products.contains_key(&product.uuid) {
            return Err(ProductsRepositoryError::AlreadyExists);
        }

        products.insert(product.uuid, product.clone());

        Ok(product)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsRepositoryError> {
        self.products
            .read()
            .get(&product)
            .cloned()
            .ok_or(ProductsRepositoryError::NotFound)
    }

    async fn update_product(&self, product: Product) -> Result<Product, ProductsRepositoryError> {
        let mut products = self.products.write();

        let stored = products
            .get_mut(&product.uuid)
            .ok_or(ProductsRepositoryError::NotFound)?;

        *stored = Product {
            created_at: stored.created_at,
            updated_at: Timestamp::now(),
            ..product
        };

        Ok(stored.clone())
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<u64, ProductsRepositoryError> {
        Ok(u64::from(self.products.write().remove(&product).is_some()))
    }

    async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<FilteredProducts, ProductsRepositoryError> {
        let skip = usize::try_from(filter.skip)?;
        let limit = usize::try_from(filter.limit)?;
        let needle = filter.text.as_deref().map(str::to_lowercase);

        let mut matched: Vec<Product> = self
            .products
            .read()
            .values()
            .filter(|product| is_match(product, &filter, needle.as_deref()))
            .cloned()
            .collect();

        matched.sort_by_key(|product| Reverse((product.created_at, product.uuid)));

        let count = u64::try_from(matched.len())?;

        Ok(FilteredProducts {
            products: matched.into_iter().skip(skip).take(limit).collect(),
            count,
        })
    }
}
