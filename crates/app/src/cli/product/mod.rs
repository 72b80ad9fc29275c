use std::path::PathBuf;

use catalog_app::domain::products::Attachment;
use clap::{Args, Subcommand};

mod create;
mod delete;
#[cfg(test)]
mod fixtures;
mod get;
mod list;
mod update;

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Create a product; the nth --image becomes the nth color's image
    Create(create::CreateProductArgs),
    /// Update a product, one of its colors, or one of its sizes
    Update(update::UpdateProductArgs),
    /// Delete a product and its images
    Delete(delete::DeleteProductArgs),
    /// Show a product with its category and brand
    Get(get::GetProductArgs),
    /// List products, newest first
    List(list::ListProductsArgs),
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::Create(args) => create::run(args).await,
        ProductSubcommand::Update(args) => update::run(args).await,
        ProductSubcommand::Delete(args) => delete::run(args).await,
        ProductSubcommand::Get(args) => get::run(args).await,
        ProductSubcommand::List(args) => list::run(args).await,
    }
}

/// Stage each image file as an attachment, in order.
async fn stage_images(paths: &[PathBuf]) -> Result<Vec<Attachment>, String> {
    let mut attachments = Vec::with_capacity(paths.len());

    for path in paths {
        let attachment = Attachment::stage(path)
            .await
            .map_err(|error| format!("failed to read {}: {error}", path.display()))?;

        attachments.push(attachment);
    }

    Ok(attachments)
}
