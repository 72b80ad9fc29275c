//! Product Records

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        blobs::BlobUuid,
        references::{BrandUuid, CategoryUuid},
    },
    uuids::TypedUuid,
};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Color UUID
pub type ColorUuid = TypedUuid<ColorVariant>;

/// Size UUID
pub type SizeUuid = TypedUuid<SizeVariant>;

/// Product Record
///
/// Root of the variant tree. Colors and their sizes are stored with the
/// product as one document and always written back as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<CategoryUuid>,
    pub brand: Option<BrandUuid>,
    pub colors: Vec<ColorVariant>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    #[must_use]
    pub fn color(&self, color: ColorUuid) -> Option<&ColorVariant> {
        self.colors.iter().find(|c| c.uuid == color)
    }

    pub fn color_mut(&mut self, color: ColorUuid) -> Option<&mut ColorVariant> {
        self.colors.iter_mut().find(|c| c.uuid == color)
    }

    /// Images owned by this product, in color order.
    pub fn images(&self) -> impl Iterator<Item = BlobUuid> + '_ {
        self.colors.iter().map(|color| color.image)
    }
}

/// Color Variant Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub uuid: ColorUuid,
    pub color: String,
    pub image: BlobUuid,
    pub sizes: Vec<SizeVariant>,
}

impl ColorVariant {
    pub fn size_mut(&mut self, size: SizeUuid) -> Option<&mut SizeVariant> {
        self.sizes.iter_mut().find(|s| s.uuid == size)
    }
}

/// Size Variant Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub uuid: SizeUuid,
    pub size: String,
    pub price: u64,
    #[serde(default)]
    pub stock: u64,
}
