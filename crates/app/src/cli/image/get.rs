use std::path::PathBuf;

use catalog_app::domain::{
    blobs::{BlobMetadata, BlobUuid},
    products::ProductsService,
};
use clap::Args;
use tokio::{
    fs::File,
    io::{self, AsyncWrite},
};
use tracing::info;

use crate::cli::CatalogArgs;

#[derive(Debug, Args)]
pub(crate) struct GetImageArgs {
    /// Image blob UUID, as found in a color's `image` field
    uuid: BlobUuid,

    /// File to write the image to; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[command(flatten)]
    catalog: CatalogArgs,
}

pub(crate) async fn run(args: GetImageArgs) -> Result<(), String> {
    let ctx = args.catalog.connect().await?;

    let Some(path) = args.output else {
        execute(&*ctx.products, args.uuid, &mut io::stdout()).await?;
        return Ok(());
    };

    let mut file = File::create(&path)
        .await
        .map_err(|error| format!("failed to create {}: {error}", path.display()))?;

    let (metadata, written) = execute(&*ctx.products, args.uuid, &mut file).await?;

    println!("image_uuid: {}", metadata.uuid);
    println!("filename: {}", metadata.filename);
    println!("content_type: {}", metadata.content_type);
    println!("wrote {written} bytes to {}", path.display());

    Ok(())
}

/// Stream the image into `writer`, returning its metadata and the byte count.
async fn execute<W>(
    service: &dyn ProductsService,
    image: BlobUuid,
    writer: &mut W,
) -> Result<(BlobMetadata, u64), String>
where
    W: AsyncWrite + Unpin + Send,
{
    let download = service
        .get_image(image)
        .await
        .map_err(|error| format!("failed to get image: {error}"))?;

    let metadata = download.metadata.clone();

    info!(blob = %metadata.uuid, length = metadata.length, "streaming image");

    let written = download
        .write_to(writer)
        .await
        .map_err(|error| format!("failed to write image: {error}"))?;

    Ok((metadata, written))
}
