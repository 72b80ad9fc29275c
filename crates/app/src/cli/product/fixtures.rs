use catalog_app::domain::{
    blobs::BlobUuid,
    products::records::{ColorUuid, ColorVariant, Product, ProductUuid, SizeUuid, SizeVariant},
};
use jiff::Timestamp;

pub(super) fn product(name: &str) -> Product {
    Product {
        uuid: ProductUuid::new(),
        name: name.to_string(),
        description: None,
        category: None,
        brand: None,
        colors: vec![ColorVariant {
            uuid: ColorUuid::new(),
            color: "red".to_string(),
            image: BlobUuid::new(),
            sizes: vec![SizeVariant {
                uuid: SizeUuid::new(),
                size: "M".to_string(),
                price: 1_500,
                stock: 3,
            }],
        }],
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
