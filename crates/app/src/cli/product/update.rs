use std::{
    io::{self, Write},
    path::PathBuf,
};

use catalog_app::domain::products::{
    Attachment, ProductsService,
    data::{ProductChanges, UpdateTarget},
    records::{ColorUuid, ProductUuid, SizeUuid},
};
use clap::Args;

use crate::cli::{CatalogArgs, parse_json, write_json};

use super::stage_images;

#[derive(Debug, Args)]
pub(crate) struct UpdateProductArgs {
    /// Product UUID
    uuid: ProductUuid,

    /// Address one color of the product
    #[arg(long)]
    color_id: Option<ColorUuid>,

    /// Address one size of the color; unknown ids append a new size
    #[arg(long, requires = "color_id")]
    size_id: Option<SizeUuid>,

    /// Changes as JSON, e.g. '{"name":"Polo"}' or '{"price":1800}'
    #[arg(long, value_parser = parse_json::<ProductChanges>, default_value = "{}")]
    changes: ProductChanges,

    /// Replacement image for the color at the same position
    #[arg(long = "image", value_name = "PATH")]
    images: Vec<PathBuf>,

    #[command(flatten)]
    catalog: CatalogArgs,
}

pub(crate) async fn run(args: UpdateProductArgs) -> Result<(), String> {
    let target = UpdateTarget::from_ids(args.color_id, args.size_id)
        .map_err(|error| format!("invalid target: {error}"))?;

    let attachments = stage_images(&args.images).await?;
    let ctx = args.catalog.connect().await?;

    execute(
        &*ctx.products,
        args.uuid,
        target,
        args.changes,
        attachments,
        &mut io::stdout(),
    )
    .await
}

async fn execute<W: Write>(
    service: &dyn ProductsService,
    product: ProductUuid,
    target: UpdateTarget,
    changes: ProductChanges,
    attachments: Vec<Attachment>,
    out: &mut W,
) -> Result<(), String> {
    let product = service
        .update_product(product, target, changes, attachments)
        .await
        .map_err(|error| format!("failed to update product: {error}"))?;

    write_json(out, &product)
}
