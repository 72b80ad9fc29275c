use std::io::{self, Write};

use catalog_app::domain::products::{ProductsService, records::ProductUuid};
use clap::Args;

use crate::cli::{CatalogArgs, write_json};

#[derive(Debug, Args)]
pub(crate) struct GetProductArgs {
    /// Product UUID
    uuid: ProductUuid,

    #[command(flatten)]
    catalog: CatalogArgs,
}

pub(crate) async fn run(args: GetProductArgs) -> Result<(), String> {
    let ctx = args.catalog.connect().await?;

    execute(&*ctx.products, args.uuid, &mut io::stdout()).await
}

async fn execute<W: Write>(
    service: &dyn ProductsService,
    product: ProductUuid,
    out: &mut W,
) -> Result<(), String> {
    let details = service
        .get_product(product)
        .await
        .map_err(|error| format!("failed to get product: {error}"))?;

    write_json(out, &details)
}
