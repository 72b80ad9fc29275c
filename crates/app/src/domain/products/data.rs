//! Products Data

use serde::{Deserialize, Serialize};

use crate::domain::{
    blobs::BlobUuid,
    products::{
        records::{ColorUuid, Product, ProductUuid, SizeUuid},
        validation::ValidationErrors,
    },
    references::{BrandUuid, CategoryUuid, Reference},
};

/// Default page size for product listings.
pub const DEFAULT_LIMIT: u64 = 10;

/// New Product Data
///
/// Category and brand are free text, resolved against existing entries.
/// Color images come from the attachments sent alongside, matched by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub colors: Vec<NewColor>,
}

/// Color entry of a create payload or of a colors replacement.
///
/// `image` is only honoured when no attachment fills the color's slot, and
/// only if it names an image the product already owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColor {
    pub color: String,
    #[serde(default)]
    pub image: Option<BlobUuid>,
    #[serde(default)]
    pub sizes: Vec<NewSize>,
}

/// Size entry as received; amounts are checked before they become unsigned.
///
/// `price` is a whole number of minor currency units (cents): `19.99` is
/// sent as `1999`, and fractional JSON numbers are rejected when the payload
/// is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSize {
    pub size: String,
    /// Minor currency units.
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Product Changes Data
///
/// Partial payload for an update. Which fields apply depends on the
/// [`UpdateTarget`]; fields meant for another target are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Replaces the whole color list (product target).
    #[serde(default)]
    pub colors: Option<Vec<NewColor>>,
    /// Color label (color target).
    #[serde(default)]
    pub color: Option<String>,
    /// Replaces the color's size list (color target).
    #[serde(default)]
    pub sizes: Option<Vec<NewSize>>,
    /// Size label (size target).
    #[serde(default)]
    pub size: Option<String>,
    /// Size price in minor currency units (size target).
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Part of the variant tree an update is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTarget {
    Product,
    Color(ColorUuid),
    Size(ColorUuid, SizeUuid),
}

impl UpdateTarget {
    /// Build a target from optional color and size ids.
    ///
    /// # Errors
    ///
    /// A size id without a color id cannot be addressed.
    pub fn from_ids(
        color: Option<ColorUuid>,
        size: Option<SizeUuid>,
    ) -> Result<Self, ValidationErrors> {
        match (color, size) {
            (None, None) => Ok(Self::Product),
            (Some(color), None) => Ok(Self::Color(color)),
            (Some(color), Some(size)) => Ok(Self::Size(color, size)),
            (None, Some(_)) => Err(ValidationErrors::single(
                "sizeId",
                "requires a colorId",
            )),
        }
    }
}

/// Product listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            brand: None,
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Resolved listing criteria handed to the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub text: Option<String>,
    pub category: Option<CategoryUuid>,
    pub brand: Option<BrandUuid>,
    pub skip: u64,
    pub limit: u64,
}

/// One page of filtered products plus the size of the whole filtered set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredProducts {
    pub products: Vec<Product>,
    pub count: u64,
}

/// Product with its category and brand populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product: Product,
    pub category: Option<Reference>,
    pub brand: Option<Reference>,
}

/// Product Page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductDetails>,
    pub count: u64,
}

/// A blob that could not be deleted while cleaning up after a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobCleanupWarning {
    pub blob: BlobUuid,
    pub reason: String,
}

/// Outcome of a product deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedProduct {
    pub uuid: ProductUuid,
    pub warnings: Vec<BlobCleanupWarning>,
}
