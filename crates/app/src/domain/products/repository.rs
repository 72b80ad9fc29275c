//! Products Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as, query_scalar, types::Json};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        products::{
            data::{FilteredProducts, ProductFilter},
            errors::ProductsRepositoryError,
            records::{ColorVariant, Product, ProductUuid},
        },
        references::{BrandUuid, CategoryUuid},
    },
    uuids::TypedUuid,
};

const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const COUNT_PRODUCTS_SQL: &str = include_str!("sql/count_products.sql");

/// Products stored one row per product, the variant tree in a JSONB column.
#[derive(Debug, Clone)]
pub struct PgProductsRepository {
    db: Db,
}

impl PgProductsRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row
                .try_get::<Option<Uuid>, _>("category_uuid")?
                .map(CategoryUuid::from_uuid),
            brand: row
                .try_get::<Option<Uuid>, _>("brand_uuid")?
                .map(BrandUuid::from_uuid),
            colors: row.try_get::<Json<Vec<ColorVariant>>, _>("colors")?.0,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

#[async_trait]
impl ProductsRepository for PgProductsRepository {
    #[tracing::instrument(
        name = "products.repository.create_product",
        skip(self, product),
        fields(product_uuid = %product.uuid),
        err
    )]
    async fn create_product(&self, product: Product) -> Result<Product, ProductsRepositoryError> {
        query_as::<Postgres, Product>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.category.map(TypedUuid::into_uuid))
            .bind(product.brand.map(TypedUuid::into_uuid))
            .bind(Json(&product.colors))
            .fetch_one(self.db.pool())
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(name = "products.repository.get_product", skip(self), err)]
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsRepositoryError> {
        query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(self.db.pool())
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "products.repository.update_product",
        skip(self, product),
        fields(product_uuid = %product.uuid),
        err
    )]
    async fn update_product(&self, product: Product) -> Result<Product, ProductsRepositoryError> {
        query_as::<Postgres, Product>(UPDATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.category.map(TypedUuid::into_uuid))
            .bind(product.brand.map(TypedUuid::into_uuid))
            .bind(Json(&product.colors))
            .fetch_one(self.db.pool())
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(name = "products.repository.delete_product", skip(self), err)]
    async fn delete_product(&self, product: ProductUuid) -> Result<u64, ProductsRepositoryError> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    #[tracing::instrument(
        name = "products.repository.list_products",
        skip(self),
        fields(count = tracing::field::Empty),
        err
    )]
    async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<FilteredProducts, ProductsRepositoryError> {
        let category = filter.category.map(TypedUuid::into_uuid);
        let brand = filter.brand.map(TypedUuid::into_uuid);

        let mut tx = self.db.begin().await?;

        let count: i64 = query_scalar(COUNT_PRODUCTS_SQL)
            .bind(&filter.text)
            .bind(category)
            .bind(brand)
            .fetch_one(&mut *tx)
            .await?;

        let products = query_as::<Postgres, Product>(LIST_PRODUCTS_SQL)
            .bind(&filter.text)
            .bind(category)
            .bind(brand)
            .bind(i64::try_from(filter.skip)?)
            .bind(i64::try_from(filter.limit)?)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let count = u64::try_from(count)?;

        tracing::Span::current().record("count", count);

        Ok(FilteredProducts { products, count })
    }
}

/// Persistence for whole product documents.
#[automock]
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    /// Insert a new product.
    async fn create_product(&self, product: Product) -> Result<Product, ProductsRepositoryError>;

    /// Fetch a product; [`ProductsRepositoryError::NotFound`] when absent.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsRepositoryError>;

    /// Replace every field of a stored product in one write.
    async fn update_product(&self, product: Product) -> Result<Product, ProductsRepositoryError>;

    /// Delete a product, returning the number of rows removed.
    async fn delete_product(&self, product: ProductUuid) -> Result<u64, ProductsRepositoryError>;

    /// Newest first, with the size of the whole filtered set.
    async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<FilteredProducts, ProductsRepositoryError>;
}
