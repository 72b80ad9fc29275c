use std::io::Write;

use catalog_app::{
    config::{BlobConfig, DatabaseConfig, LoggingConfig},
    context::AppContext,
    domain::references::ReferenceKind,
};
use clap::{Args, Parser, Subcommand};
use serde::{Serialize, de::DeserializeOwned};

mod db;
mod image;
mod product;
mod reference;

#[derive(Debug, Parser)]
#[command(name = "catalog-app", about = "Catalog CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Category(reference::ReferenceCommand),
    Brand(reference::ReferenceCommand),
    Product(product::ProductCommand),
    Image(image::ImageCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Category(command) => reference::run(ReferenceKind::Category, command).await,
            Commands::Brand(command) => reference::run(ReferenceKind::Brand, command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Image(command) => image::run(command).await,
        }
    }
}

/// Connection settings for commands that go through the catalog service.
#[derive(Debug, Args)]
pub(crate) struct CatalogArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    blobs: BlobConfig,
}

impl CatalogArgs {
    pub(crate) async fn connect(&self) -> Result<AppContext, String> {
        AppContext::from_database_url(&self.database.database_url, self.blobs.chunk_size)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))
    }
}

/// Parse a JSON command-line value.
pub(crate) fn parse_json<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_str(value).map_err(|error| format!("invalid JSON: {error}"))
}

/// Pretty-print `value` as JSON followed by a newline.
pub(crate) fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), String> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|error| format!("failed to write output: {error}"))?;

    writeln!(out).map_err(|error| format!("failed to write output: {error}"))
}
