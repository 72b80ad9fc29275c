//! Products service.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    blobs::{BlobDownload, BlobStore, BlobUuid},
    products::{
        attachments::Attachment,
        data::{
            BlobCleanupWarning, DeletedProduct, NewProduct, ProductChanges, ProductDetails,
            ProductFilter, ProductPage, ProductQuery, UpdateTarget,
        },
        errors::{ProductsServiceError, Resource},
        records::{Product, ProductUuid},
        repository::ProductsRepository,
        uploads::UploadBatch,
        validation::{ValidationErrors, required_text},
        variants::{apply, build_colors, color_drafts, description, plan, superseded},
    },
    references::{
        BrandUuid, CategoryUuid, Reference, ReferenceKind, ReferencesError, ReferencesRepository,
        search_text,
    },
};

type ReferenceCache = FxHashMap<(ReferenceKind, Uuid), Option<Reference>>;

/// Catalog of products, their variant trees and color images.
///
/// Documents, references and blobs live behind separate stores with no
/// shared transaction. Blob writes happen before the document write and are
/// rolled back if it fails; blobs a saved document no longer references are
/// deleted afterwards, with failures logged rather than returned.
#[derive(Clone)]
pub struct Catalog {
    products: Arc<dyn ProductsRepository>,
    references: Arc<dyn ReferencesRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl Catalog {
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductsRepository>,
        references: Arc<dyn ReferencesRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            products,
            references,
            blobs,
        }
    }

    async fn resolve(
        &self,
        kind: ReferenceKind,
        text: Option<&str>,
    ) -> Result<Option<Uuid>, ReferencesError> {
        let Some(text) = text.and_then(search_text) else {
            return Ok(None);
        };

        let resolved = self.references.resolve(kind, text).await?;

        if resolved.is_none() {
            debug!(%kind, text, "no match, dropping reference");
        }

        Ok(resolved)
    }

    async fn reference(
        &self,
        cache: &mut ReferenceCache,
        kind: ReferenceKind,
        uuid: Option<Uuid>,
    ) -> Result<Option<Reference>, ReferencesError> {
        let Some(uuid) = uuid else {
            return Ok(None);
        };

        if let Some(cached) = cache.get(&(kind, uuid)) {
            return Ok(cached.clone());
        }

        let reference = match self.references.get_reference(kind, uuid).await {
            Ok(reference) => Some(reference),
            Err(ReferencesError::NotFound) => None,
            Err(error) => return Err(error),
        };

        cache.insert((kind, uuid), reference.clone());

        Ok(reference)
    }

    async fn details(
        &self,
        cache: &mut ReferenceCache,
        product: Product,
    ) -> Result<ProductDetails, ReferencesError> {
        let category = self
            .reference(
                cache,
                ReferenceKind::Category,
                product.category.map(CategoryUuid::into_uuid),
            )
            .await?;

        let brand = self
            .reference(
                cache,
                ReferenceKind::Brand,
                product.brand.map(BrandUuid::into_uuid),
            )
            .await?;

        Ok(ProductDetails {
            product,
            category,
            brand,
        })
    }

    /// Delete blobs the saved product no longer references.
    async fn delete_superseded(&self, stale: Vec<BlobUuid>) {
        for blob in stale {
            match self.blobs.delete(blob).await {
                Ok(()) => debug!(%blob, "deleted superseded image"),
                Err(error) => warn!(%blob, %error, "failed to delete superseded image"),
            }
        }
    }
}

impl Debug for Catalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

/// Split off attachments beyond the first `slots`, releasing them unused.
fn take_slotted(mut attachments: Vec<Attachment>, slots: usize) -> Vec<Attachment> {
    for (i, unused) in attachments.split_off(slots).into_iter().enumerate() {
        warn!(
            index = slots + i,
            filename = unused.filename(),
            "no color for attachment, skipping"
        );

        unused.release();
    }

    attachments
}

/// Keep the batch when `result` is `Ok`, otherwise delete what it uploaded.
async fn settle<T>(
    batch: UploadBatch,
    result: Result<T, ProductsServiceError>,
) -> Result<T, ProductsServiceError> {
    match result {
        Ok(value) => {
            batch.commit();
            Ok(value)
        }
        Err(error) => {
            batch.rollback().await;
            Err(error)
        }
    }
}

#[async_trait]
impl ProductsService for Catalog {
    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, product, attachments),
        fields(
            colors = product.colors.len(),
            attachments = attachments.len(),
            product_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn create_product(
        &self,
        product: NewProduct,
        attachments: Vec<Attachment>,
    ) -> Result<Product, ProductsServiceError> {
        let slots = attachments.len().min(product.colors.len());

        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name".to_string(), &product.name);
        let drafts = color_drafts(&mut errors, &product.colors, slots, &FxHashSet::default());

        errors.into_result()?;

        let category = self
            .resolve(ReferenceKind::Category, product.category.as_deref())
            .await?;
        let brand = self
            .resolve(ReferenceKind::Brand, product.brand.as_deref())
            .await?;

        let attachments = take_slotted(attachments, slots);
        let mut batch = UploadBatch::new(Arc::clone(&self.blobs));

        let uploaded = match batch.upload_all(attachments).await {
            Ok(uploaded) => uploaded,
            Err(error) => {
                batch.rollback().await;
                return Err(error.into());
            }
        };

        let uuid = ProductUuid::new();

        batch.persisting(Arc::clone(&self.products), uuid);

        let result = async {
            let now = Timestamp::now();
            let product = Product {
                uuid,
                name,
                description: product.description.as_deref().and_then(description),
                category: category.map(CategoryUuid::from_uuid),
                brand: brand.map(BrandUuid::from_uuid),
                colors: build_colors(drafts, &uploaded)?,
                created_at: now,
                updated_at: now,
            };

            Ok::<_, ProductsServiceError>(self.products.create_product(product).await?)
        }
        .await;

        let created = settle(batch, result).await?;

        tracing::Span::current().record("product_uuid", tracing::field::display(created.uuid));

        info!(product = %created.uuid, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.service.update_product",
        skip(self, changes, attachments),
        fields(attachments = attachments.len()),
        err
    )]
    async fn update_product(
        &self,
        product: ProductUuid,
        target: UpdateTarget,
        changes: ProductChanges,
        attachments: Vec<Attachment>,
    ) -> Result<Product, ProductsServiceError> {
        let original = self.products.get_product(product).await?;
        let slots = attachments.len().min(original.colors.len());

        let patch = plan(&original, target, &changes, slots)?;

        let (category, brand) = if target == UpdateTarget::Product {
            (
                self.resolve(ReferenceKind::Category, changes.category.as_deref())
                    .await?,
                self.resolve(ReferenceKind::Brand, changes.brand.as_deref())
                    .await?,
            )
        } else {
            (None, None)
        };

        let attachments = take_slotted(attachments, slots);
        let mut batch = UploadBatch::new(Arc::clone(&self.blobs));

        let uploaded = match batch.upload_all(attachments).await {
            Ok(uploaded) => uploaded,
            Err(error) => {
                batch.rollback().await;
                return Err(error.into());
            }
        };

        batch.persisting(Arc::clone(&self.products), product);

        let result = async {
            let mut updated = original.clone();

            apply(&mut updated, patch, &uploaded)?;

            if let Some(category) = category {
                updated.category = Some(CategoryUuid::from_uuid(category));
            }

            if let Some(brand) = brand {
                updated.brand = Some(BrandUuid::from_uuid(brand));
            }

            Ok::<_, ProductsServiceError>(self.products.update_product(updated).await?)
        }
        .await;

        let saved = settle(batch, result).await?;

        self.delete_superseded(superseded(&original, &uploaded, &saved))
            .await;

        info!(product = %saved.uuid, "updated product");

        Ok(saved)
    }

    #[tracing::instrument(name = "products.service.delete_product", skip(self), err)]
    async fn delete_product(
        &self,
        product: ProductUuid,
    ) -> Result<DeletedProduct, ProductsServiceError> {
        let stored = self.products.get_product(product).await?;

        let mut seen = FxHashSet::default();
        let mut warnings = Vec::new();

        for image in stored.images().filter(|image| seen.insert(*image)) {
            if let Err(error) = self.blobs.delete(image).await {
                warn!(blob = %image, %error, "failed to delete product image");

                warnings.push(BlobCleanupWarning {
                    blob: image,
                    reason: error.to_string(),
                });
            }
        }

        if self.products.delete_product(product).await? == 0 {
            return Err(ProductsServiceError::NotFound(Resource::Product));
        }

        info!(%product, warnings = warnings.len(), "deleted product");

        Ok(DeletedProduct {
            uuid: product,
            warnings,
        })
    }

    #[tracing::instrument(name = "products.service.list_products", skip(self), err)]
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ProductsServiceError> {
        let category = self
            .resolve(ReferenceKind::Category, query.category.as_deref())
            .await?;
        let brand = self
            .resolve(ReferenceKind::Brand, query.brand.as_deref())
            .await?;

        let filtered = self
            .products
            .list_products(ProductFilter {
                text: query.text.as_deref().and_then(search_text).map(str::to_string),
                category: category.map(CategoryUuid::from_uuid),
                brand: brand.map(BrandUuid::from_uuid),
                skip: query.skip,
                limit: query.limit,
            })
            .await?;

        let mut cache = ReferenceCache::default();
        let mut items = Vec::with_capacity(filtered.products.len());

        for product in filtered.products {
            items.push(self.details(&mut cache, product).await?);
        }

        Ok(ProductPage {
            items,
            count: filtered.count,
        })
    }

    #[tracing::instrument(name = "products.service.get_product", skip(self), err)]
    async fn get_product(&self, product: ProductUuid) -> Result<ProductDetails, ProductsServiceError> {
        let product = self.products.get_product(product).await?;

        Ok(self.details(&mut ReferenceCache::default(), product).await?)
    }

    #[tracing::instrument(name = "products.service.get_image", skip(self), err)]
    async fn get_image(&self, blob: BlobUuid) -> Result<BlobDownload, ProductsServiceError> {
        self.blobs.open_read(blob).await.map_err(|error| {
            if error.is_not_found() {
                ProductsServiceError::NotFound(Resource::Image)
            } else {
                ProductsServiceError::BlobStore(error)
            }
        })
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Create a product. Attachment `i` becomes the image of color `i`.
    async fn create_product(
        &self,
        product: NewProduct,
        attachments: Vec<Attachment>,
    ) -> Result<Product, ProductsServiceError>;

    /// Update the product, one of its colors, or one of its sizes.
    /// Attachment `i` replaces the image of the product's current color `i`.
    async fn update_product(
        &self,
        product: ProductUuid,
        target: UpdateTarget,
        changes: ProductChanges,
        attachments: Vec<Attachment>,
    ) -> Result<Product, ProductsServiceError>;

    /// Delete a product and its images. Image deletion failures are
    /// reported as warnings.
    async fn delete_product(
        &self,
        product: ProductUuid,
    ) -> Result<DeletedProduct, ProductsServiceError>;

    /// List products newest first, with category and brand populated.
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ProductsServiceError>;

    /// Retrieve a single product with category and brand populated.
    async fn get_product(&self, product: ProductUuid) -> Result<ProductDetails, ProductsServiceError>;

    /// Open a color image for streaming.
    async fn get_image(&self, blob: BlobUuid) -> Result<BlobDownload, ProductsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use testresult::TestResult;
    use tokio::time::{sleep, timeout};

    use crate::{
        domain::{
            blobs::BlobError,
            products::{
                data::{NewColor, NewSize},
                errors::ProductsRepositoryError,
                records::{ColorUuid, SizeUuid},
                repository::MockProductsRepository,
            },
        },
        test::{
            context::TestContext,
            helpers::{attachment, attachments_for, create_product, new_product, read_image},
            products::{Stall, StallingProductsRepository},
        },
    };

    use super::*;

    #[tokio::test]
    async fn create_two_colors_gets_distinct_images_and_lists_by_name() -> TestResult {
        let ctx = TestContext::new();

        let product = ctx
            .catalog
            .create_product(
                new_product("Canvas Sneaker", &["red", "blue"]),
                vec![
                    attachment("red.png", b"red pixels").await?,
                    attachment("blue.png", b"blue pixels").await?,
                ],
            )
            .await?;

        let red = product.colors[0].image;
        let blue = product.colors[1].image;

        assert_ne!(red, blue);
        assert_eq!(read_image(&ctx, red).await?, b"red pixels");
        assert_eq!(read_image(&ctx, blue).await?, b"blue pixels");

        let download = ctx.catalog.get_image(red).await?;

        assert_eq!(download.metadata.content_type, "image/png");
        assert_eq!(download.metadata.filename, "red.png");

        let page = ctx
            .catalog
            .list_products(ProductQuery {
                text: Some("canvas sneak".to_string()),
                ..ProductQuery::default()
            })
            .await?;

        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].product.uuid, product.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn create_every_color_image_resolves_to_a_blob() -> TestResult {
        let ctx = TestContext::new();

        let product = create_product(&ctx, "Hoodie", &["black", "grey", "navy"]).await?;

        for color in &product.colors {
            assert!(ctx.blobs.contains(color.image), "missing image for {}", color.color);
            assert_eq!(
                read_image(&ctx, color.image).await?,
                format!("{} image", color.color).as_bytes()
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn create_color_without_attachment_fails_before_uploading() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx
            .catalog
            .create_product(
                new_product("Scarf", &["red", "blue"]),
                vec![attachment("red.png", b"red").await?],
            )
            .await;

        assert!(
            matches!(&result, Err(ProductsServiceError::Validation(errors))
                if errors.contains_field("colors.1.image")),
            "expected Validation, got {result:?}"
        );
        assert!(ctx.blobs.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn create_collects_field_errors() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx
            .catalog
            .create_product(
                NewProduct {
                    name: "  ".to_string(),
                    colors: vec![NewColor {
                        color: "red".to_string(),
                        image: None,
                        sizes: vec![NewSize {
                            size: "M".to_string(),
                            price: Some(-10),
                            stock: Some(-1),
                        }],
                    }],
                    ..NewProduct::default()
                },
                vec![attachment("red.png", b"red").await?],
            )
            .await;

        let Err(ProductsServiceError::Validation(errors)) = result else {
            panic!("expected Validation, got {result:?}");
        };

        assert!(errors.contains_field("name"));
        assert!(errors.contains_field("colors.0.sizes.0.price"));
        assert!(errors.contains_field("colors.0.sizes.0.stock"));
        assert!(ctx.blobs.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn create_skips_attachments_without_a_color() -> TestResult {
        let ctx = TestContext::new();

        let extra = attachment("extra.png", b"extra").await?;
        let extra_path = extra.path().to_path_buf();

        let product = ctx
            .catalog
            .create_product(
                new_product("Belt", &["brown"]),
                vec![attachment("brown.png", b"brown").await?, extra],
            )
            .await?;

        assert_eq!(product.colors.len(), 1);
        assert_eq!(ctx.blobs.len(), 1);
        assert!(!extra_path.exists());

        Ok(())
    }

    #[tokio::test]
    async fn create_persistence_failure_deletes_every_upload() -> TestResult {
        let mut repository = MockProductsRepository::new();

        repository
            .expect_create_product()
            .times(1)
            .returning(|_| Err(ProductsRepositoryError::InvalidData));

        let ctx = TestContext::builder()
            .products(Arc::new(repository))
            .build();

        let result = ctx
            .catalog
            .create_product(
                new_product("Parka", &["green", "olive", "sand"]),
                attachments_for(&["green", "olive", "sand"]).await?,
            )
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::Storage(_))),
            "expected Storage, got {result:?}"
        );
        assert!(ctx.blobs.is_empty());
        assert_eq!(ctx.flaky.delete_attempts().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn create_cancelled_after_the_write_keeps_stored_images() -> TestResult {
        let products = Arc::new(StallingProductsRepository::default());
        let ctx = TestContext::builder().products(products.clone()).build();

        products.stall_writes(Stall::AfterWrite);

        let result = timeout(
            Duration::from_millis(100),
            ctx.catalog.create_product(
                new_product("Tent", &["green", "orange"]),
                attachments_for(&["green", "orange"]).await?,
            ),
        )
        .await;

        assert!(result.is_err(), "expected the write to hang, got {result:?}");

        sleep(Duration::from_millis(50)).await;

        let page = ctx.catalog.list_products(ProductQuery::default()).await?;

        assert_eq!(page.count, 1);

        let stored = &page.items[0].product;

        assert_eq!(read_image(&ctx, stored.colors[0].image).await?, b"green image");
        assert_eq!(read_image(&ctx, stored.colors[1].image).await?, b"orange image");
        assert_eq!(ctx.blobs.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn create_cancelled_before_the_write_deletes_uploads() -> TestResult {
        let products = Arc::new(StallingProductsRepository::default());
        let ctx = TestContext::builder().products(products.clone()).build();

        products.stall_writes(Stall::BeforeWrite);

        let result = timeout(
            Duration::from_millis(100),
            ctx.catalog.create_product(
                new_product("Tent", &["green", "orange"]),
                attachments_for(&["green", "orange"]).await?,
            ),
        )
        .await;

        assert!(result.is_err(), "expected the write to hang, got {result:?}");

        for _ in 0..50 {
            if ctx.blobs.is_empty() {
                break;
            }

            sleep(Duration::from_millis(10)).await;
        }

        assert!(ctx.blobs.is_empty());
        assert_eq!(
            ctx.catalog
                .list_products(ProductQuery::default())
                .await?
                .count,
            0
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_upload_failure_rolls_back_the_batch() -> TestResult {
        let ctx = TestContext::builder().fail_write_on(1).build();

        let result = ctx
            .catalog
            .create_product(
                new_product("Gloves", &["red", "blue", "green"]),
                attachments_for(&["red", "blue", "green"]).await?,
            )
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::BlobStore(BlobError::Io(_)))),
            "expected BlobStore, got {result:?}"
        );
        assert!(ctx.blobs.is_empty());

        let page = ctx.catalog.list_products(ProductQuery::default()).await?;

        assert_eq!(page.count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn create_resolves_references_and_omits_unmatched() -> TestResult {
        let ctx = TestContext::new();

        let shoes = ctx
            .references
            .create_reference(ReferenceKind::Category, "Shoes".to_string())
            .await?;

        let product = ctx
            .catalog
            .create_product(
                NewProduct {
                    category: Some("sho".to_string()),
                    brand: Some("Unknown Brand".to_string()),
                    ..new_product("Loafer", &[])
                },
                Vec::new(),
            )
            .await?;

        assert_eq!(product.category.map(CategoryUuid::into_uuid), Some(shoes.uuid));
        assert_eq!(product.brand, None);

        let details = ctx.catalog.get_product(product.uuid).await?;

        assert_eq!(details.category, Some(shoes));
        assert_eq!(details.brand, None);

        Ok(())
    }

    #[tokio::test]
    async fn update_unknown_size_appends_a_new_size() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Tee", &["white"]).await?;
        let color = product.colors[0].uuid;

        let updated = ctx
            .catalog
            .update_product(
                product.uuid,
                UpdateTarget::from_ids(Some(color), Some(SizeUuid::new()))?,
                ProductChanges {
                    size: Some("XXL".to_string()),
                    price: Some(2_500),
                    ..ProductChanges::default()
                },
                Vec::new(),
            )
            .await?;

        let sizes = &updated.colors[0].sizes;

        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1].size, "XXL");
        assert_eq!(sizes[1].price, 2_500);
        assert_eq!(sizes[1].stock, 0);

        Ok(())
    }

    #[tokio::test]
    async fn update_one_attachment_only_replaces_first_color_image() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Cap", &["red", "green", "blue"]).await?;
        let before: Vec<BlobUuid> = product.images().collect();

        let updated = ctx
            .catalog
            .update_product(
                product.uuid,
                UpdateTarget::Product,
                ProductChanges::default(),
                vec![attachment("new-red.png", b"new red").await?],
            )
            .await?;

        let after: Vec<BlobUuid> = updated.images().collect();

        assert_ne!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2], before[2]);
        assert_eq!(read_image(&ctx, after[0]).await?, b"new red");
        assert!(!ctx.blobs.contains(before[0]), "superseded image left behind");
        assert_eq!(ctx.blobs.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn update_color_target_still_replaces_image_by_position() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Sock", &["red", "blue"]).await?;
        let blue = product.colors[1].uuid;

        let updated = ctx
            .catalog
            .update_product(
                product.uuid,
                UpdateTarget::Color(blue),
                ProductChanges {
                    color: Some("navy".to_string()),
                    ..ProductChanges::default()
                },
                vec![attachment("red-2.png", b"red again").await?],
            )
            .await?;

        assert_eq!(updated.colors[1].color, "navy");
        assert_eq!(updated.colors[1].image, product.colors[1].image);
        assert_ne!(updated.colors[0].image, product.colors[0].image);

        Ok(())
    }

    #[tokio::test]
    async fn update_colors_replacement_deletes_dropped_images() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Jacket", &["red", "blue"]).await?;
        let blue_image = product.colors[1].image;

        let updated = ctx
            .catalog
            .update_product(
                product.uuid,
                UpdateTarget::Product,
                ProductChanges {
                    name: Some("Rain Jacket".to_string()),
                    colors: Some(vec![NewColor {
                        color: "blue".to_string(),
                        image: Some(blue_image),
                        sizes: Vec::new(),
                    }]),
                    ..ProductChanges::default()
                },
                Vec::new(),
            )
            .await?;

        assert_eq!(updated.name, "Rain Jacket");
        assert_eq!(updated.colors.len(), 1);
        assert_eq!(updated.colors[0].image, blue_image);
        assert!(!ctx.blobs.contains(product.colors[0].image));
        assert!(ctx.blobs.contains(blue_image));

        Ok(())
    }

    #[tokio::test]
    async fn update_unknown_color_is_not_found_and_uploads_nothing() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Bag", &["tan"]).await?;

        let result = ctx
            .catalog
            .update_product(
                product.uuid,
                UpdateTarget::Color(ColorUuid::new()),
                ProductChanges::default(),
                vec![attachment("tan.png", b"tan").await?],
            )
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound(Resource::Color))),
            "expected NotFound(Color), got {result:?}"
        );
        assert_eq!(ctx.blobs.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_unknown_product_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .catalog
            .update_product(
                ProductUuid::new(),
                UpdateTarget::Product,
                ProductChanges::default(),
                Vec::new(),
            )
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound(Resource::Product))),
            "expected NotFound(Product), got {result:?}"
        );
    }

    #[tokio::test]
    async fn update_persistence_failure_deletes_new_uploads_only() -> TestResult {
        let seeded = TestContext::new();
        let product = create_product(&seeded, "Boot", &["black", "brown"]).await?;
        let originals: Vec<BlobUuid> = product.images().collect();

        let mut repository = MockProductsRepository::new();

        repository
            .expect_get_product()
            .returning(move |_| Ok(product.clone()));
        repository
            .expect_update_product()
            .times(1)
            .returning(|_| Err(ProductsRepositoryError::InvalidData));

        let ctx = TestContext::builder()
            .products(Arc::new(repository))
            .build();

        let result = ctx
            .catalog
            .update_product(
                ProductUuid::new(),
                UpdateTarget::Product,
                ProductChanges::default(),
                attachments_for(&["black", "brown"]).await?,
            )
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::Storage(_))),
            "expected Storage, got {result:?}"
        );
        assert!(ctx.blobs.is_empty(), "new uploads left behind");

        let attempts = ctx.flaky.delete_attempts();

        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|blob| !originals.contains(blob)));

        Ok(())
    }

    #[tokio::test]
    async fn update_cancelled_after_the_write_keeps_the_new_image() -> TestResult {
        let products = Arc::new(StallingProductsRepository::default());
        let ctx = TestContext::builder().products(products.clone()).build();
        let product = create_product(&ctx, "Tent", &["green", "orange"]).await?;

        products.stall_writes(Stall::AfterWrite);

        let result = timeout(
            Duration::from_millis(100),
            ctx.catalog.update_product(
                product.uuid,
                UpdateTarget::Product,
                ProductChanges::default(),
                attachments_for(&["navy"]).await?,
            ),
        )
        .await;

        assert!(result.is_err(), "expected the write to hang, got {result:?}");

        sleep(Duration::from_millis(50)).await;

        let stored = ctx.catalog.get_product(product.uuid).await?.product;

        assert_ne!(stored.colors[0].image, product.colors[0].image);
        assert_eq!(read_image(&ctx, stored.colors[0].image).await?, b"navy image");
        assert_eq!(read_image(&ctx, stored.colors[1].image).await?, b"orange image");

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_updates_leave_one_whole_name() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Original", &["red", "blue"]).await?;
        let catalog = &ctx.catalog;
        let uuid = product.uuid;

        let rename = move |name: &str| {
            catalog.update_product(
                uuid,
                UpdateTarget::Product,
                ProductChanges {
                    name: Some(name.to_string()),
                    ..ProductChanges::default()
                },
                Vec::new(),
            )
        };

        let (a, b) = tokio::join!(rename("A"), rename("B"));

        a?;
        b?;

        let stored = ctx.catalog.get_product(product.uuid).await?.product;

        assert!(
            stored.name == "A" || stored.name == "B",
            "unexpected name {:?}",
            stored.name
        );
        assert_eq!(stored.colors, product.colors);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_updates_across_threads_never_interleave() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Original", &["red"]).await?;
        let uuid = product.uuid;

        let spawn_rename = |name: &'static str| {
            let catalog = ctx.catalog.clone();

            tokio::spawn(async move {
                catalog
                    .update_product(
                        uuid,
                        UpdateTarget::Product,
                        ProductChanges {
                            name: Some(name.to_string()),
                            description: Some(format!("{name} description")),
                            ..ProductChanges::default()
                        },
                        Vec::new(),
                    )
                    .await
            })
        };

        let first = spawn_rename("A");
        let second = spawn_rename("B");

        first.await??;
        second.await??;

        let stored = ctx.catalog.get_product(uuid).await?.product;
        let description = stored.description.clone().unwrap_or_default();

        assert!(stored.name == "A" || stored.name == "B");
        assert_eq!(description, format!("{} description", stored.name));

        Ok(())
    }

    #[tokio::test]
    async fn delete_attempts_every_image_even_when_one_fails() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "Dress", &["red", "green", "blue"]).await?;
        let images: Vec<BlobUuid> = product.images().collect();

        ctx.flaky.fail_delete_of(images[1]);

        let deleted = ctx.catalog.delete_product(product.uuid).await?;

        assert_eq!(deleted.uuid, product.uuid);
        assert_eq!(deleted.warnings.len(), 1);
        assert_eq!(deleted.warnings[0].blob, images[1]);
        assert_eq!(ctx.flaky.delete_attempts(), images);
        assert!(!ctx.blobs.contains(images[0]));
        assert!(!ctx.blobs.contains(images[2]));

        let result = ctx.catalog.get_product(product.uuid).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound(Resource::Product))),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_product_touches_no_blobs() {
        let ctx = TestContext::new();

        let result = ctx.catalog.delete_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound(Resource::Product))),
            "expected NotFound, got {result:?}"
        );
        assert!(ctx.flaky.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn list_unmatched_category_drops_the_criterion() -> TestResult {
        let ctx = TestContext::new();

        ctx.references
            .create_reference(ReferenceKind::Category, "Outerwear".to_string())
            .await?;

        create_product(&ctx, "Coat", &["black"]).await?;
        create_product(&ctx, "Vest", &["grey"]).await?;

        let unfiltered = ctx.catalog.list_products(ProductQuery::default()).await?;

        let page = ctx
            .catalog
            .list_products(ProductQuery {
                category: Some("no such category".to_string()),
                ..ProductQuery::default()
            })
            .await?;

        assert_eq!(page.count, 2);
        assert_eq!(page, unfiltered);

        let matched = ctx
            .catalog
            .list_products(ProductQuery {
                category: Some("outer".to_string()),
                ..ProductQuery::default()
            })
            .await?;

        assert_eq!(matched.count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn list_pages_newest_first_with_populated_references() -> TestResult {
        let ctx = TestContext::new();

        let brand = ctx
            .references
            .create_reference(ReferenceKind::Brand, "Acme".to_string())
            .await?;

        let mut created = Vec::new();

        for i in 0..12 {
            let product = ctx
                .catalog
                .create_product(
                    NewProduct {
                        brand: Some("acme".to_string()),
                        ..new_product(&format!("Widget {i}"), &[])
                    },
                    Vec::new(),
                )
                .await?;

            created.push(product.uuid);
        }

        let first_page = ctx.catalog.list_products(ProductQuery::default()).await?;

        assert_eq!(first_page.count, 12);
        assert_eq!(first_page.items.len(), 10);
        assert_eq!(first_page.items[0].product.uuid, created[11]);
        assert!(
            first_page
                .items
                .iter()
                .all(|item| item.brand.as_ref() == Some(&brand))
        );

        let second_page = ctx
            .catalog
            .list_products(ProductQuery {
                skip: 10,
                ..ProductQuery::default()
            })
            .await?;

        let uuids: Vec<ProductUuid> = second_page.items.iter().map(|i| i.product.uuid).collect();

        assert_eq!(uuids, [created[1], created[0]]);

        Ok(())
    }

    #[tokio::test]
    async fn get_image_unknown_blob_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx.catalog.get_image(BlobUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound(Resource::Image))),
            "expected NotFound(Image), got {result:?}"
        );
    }
}
