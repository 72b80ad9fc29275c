//! Test Helpers

use futures::TryStreamExt;

use crate::{
    domain::{
        blobs::{BlobError, BlobStore, BlobUuid},
        products::{
            Attachment, ProductsService,
            data::{NewColor, NewProduct, NewSize},
            records::Product,
        },
    },
    test::context::TestContext,
};

/// Stage `bytes` as a PNG attachment named `filename`.
pub(crate) async fn attachment(
    filename: &str,
    bytes: &[u8],
) -> Result<Attachment, std::io::Error> {
    Attachment::from_bytes(filename, "image/png", bytes).await
}

/// One attachment per color, named `<color>.png` and holding `<color> image`.
pub(crate) async fn attachments_for(colors: &[&str]) -> Result<Vec<Attachment>, std::io::Error> {
    let mut attachments = Vec::with_capacity(colors.len());

    for color in colors {
        attachments.push(attachment(&format!("{color}.png"), format!("{color} image").as_bytes()).await?);
    }

    Ok(attachments)
}

/// A product payload with one `M` size per color.
pub(crate) fn new_product(name: &str, colors: &[&str]) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: None,
        category: None,
        brand: None,
        colors: colors
            .iter()
            .map(|color| NewColor {
                color: (*color).to_string(),
                image: None,
                sizes: vec![NewSize {
                    size: "M".to_string(),
                    price: Some(1_000),
                    stock: Some(5),
                }],
            })
            .collect(),
    }
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    name: &str,
    colors: &[&str],
) -> Result<Product, Box<dyn std::error::Error + Send + Sync>> {
    let attachments = attachments_for(colors).await?;

    Ok(ctx
        .catalog
        .create_product(new_product(name, colors), attachments)
        .await?)
}

/// Read a whole blob from the underlying store.
pub(crate) async fn read_image(ctx: &TestContext, blob: BlobUuid) -> Result<Vec<u8>, BlobError> {
    let download = ctx.blobs.open_read(blob).await?;
    let chunks: Vec<_> = download.stream.try_collect().await?;

    Ok(chunks.concat())
}
