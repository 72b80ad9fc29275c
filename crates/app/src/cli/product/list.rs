use std::io::{self, Write};

use catalog_app::domain::products::{
    ProductsService,
    data::{DEFAULT_LIMIT, ProductQuery},
};
use clap::Args;

use crate::cli::{CatalogArgs, write_json};

#[derive(Debug, Args)]
pub(crate) struct ListProductsArgs {
    /// Case-insensitive product name substring
    #[arg(long)]
    text: Option<String>,

    /// Category name; ignored when nothing matches
    #[arg(long)]
    category: Option<String>,

    /// Brand name; ignored when nothing matches
    #[arg(long)]
    brand: Option<String>,

    /// Number of products to skip
    #[arg(long, default_value_t = 0)]
    skip: u64,

    /// Maximum number of products to list
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u64,

    #[command(flatten)]
    catalog: CatalogArgs,
}

impl ListProductsArgs {
    fn query(&self) -> ProductQuery {
        ProductQuery {
            text: self.text.clone(),
            category: self.category.clone(),
            brand: self.brand.clone(),
            skip: self.skip,
            limit: self.limit,
        }
    }
}

pub(crate) async fn run(args: ListProductsArgs) -> Result<(), String> {
    let ctx = args.catalog.connect().await?;

    execute(&*ctx.products, args.query(), &mut io::stdout()).await
}

async fn execute<W: Write>(
    service: &dyn ProductsService,
    query: ProductQuery,
    out: &mut W,
) -> Result<(), String> {
    let page = service
        .list_products(query)
        .await
        .map_err(|error| format!("failed to list products: {error}"))?;

    write_json(out, &page)
}
