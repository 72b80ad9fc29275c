use std::{
    io::{self, Write},
    path::PathBuf,
};

use catalog_app::domain::products::{Attachment, ProductsService, data::NewProduct};
use clap::Args;

use crate::cli::{CatalogArgs, parse_json, write_json};

use super::stage_images;

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// Product as JSON, e.g. '{"name":"Tee","colors":[{"color":"red","sizes":[{"size":"M","price":1500}]}]}'
    #[arg(long, value_parser = parse_json::<NewProduct>)]
    product: NewProduct,

    /// Color image, repeated once per color in color order
    #[arg(long = "image", value_name = "PATH")]
    images: Vec<PathBuf>,

    #[command(flatten)]
    catalog: CatalogArgs,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    let attachments = stage_images(&args.images).await?;
    let ctx = args.catalog.connect().await?;

    execute(&*ctx.products, args.product, attachments, &mut io::stdout()).await
}

async fn execute<W: Write>(
    service: &dyn ProductsService,
    product: NewProduct,
    attachments: Vec<Attachment>,
    out: &mut W,
) -> Result<(), String> {
    let product = service
        .create_product(product, attachments)
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    write_json(out, &product)
}
