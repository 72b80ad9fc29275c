use std::io::{self, Write};

use catalog_app::domain::products::{ProductsService, records::ProductUuid};
use clap::Args;

use crate::cli::CatalogArgs;

#[derive(Debug, Args)]
pub(crate) struct DeleteProductArgs {
    /// Product UUID
    uuid: ProductUuid,

    #[command(flatten)]
    catalog: CatalogArgs,
}

pub(crate) async fn run(args: DeleteProductArgs) -> Result<(), String> {
    let ctx = args.catalog.connect().await?;

    execute(&*ctx.products, args.uuid, &mut io::stdout()).await
}

async fn execute<W: Write>(
    service: &dyn ProductsService,
    product: ProductUuid,
    out: &mut W,
) -> Result<(), String> {
    let deleted = service
        .delete_product(product)
        .await
        .map_err(|error| format!("failed to delete product: {error}"))?;

    let write = |out: &mut W| -> io::Result<()> {
        writeln!(out, "deleted product {}", deleted.uuid)?;

        for warning in &deleted.warnings {
            writeln!(out, "warning: image {} left behind: {}", warning.blob, warning.reason)?;
        }

        Ok(())
    };

    write(out).map_err(|error| format!("failed to write output: {error}"))
}
