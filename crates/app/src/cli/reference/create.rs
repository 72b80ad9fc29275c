use std::io::{self, Write};

use catalog_app::{
    config::DatabaseConfig,
    database::{self, Db},
    domain::references::{PgReferencesRepository, ReferenceKind, ReferencesRepository},
};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct CreateReferenceArgs {
    /// Display name, 3 to 20 characters
    #[arg(long)]
    name: String,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(kind: ReferenceKind, args: CreateReferenceArgs) -> Result<(), String> {
    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let repository = PgReferencesRepository::new(Db::new(pool));

    execute(&repository, kind, args.name, &mut io::stdout()).await
}

async fn execute<W: Write>(
    repository: &dyn ReferencesRepository,
    kind: ReferenceKind,
    name: String,
    out: &mut W,
) -> Result<(), String> {
    let reference = repository
        .create_reference(kind, name)
        .await
        .map_err(|error| format!("failed to create {kind}: {error}"))?;

    writeln!(out, "{kind}_uuid: {}", reference.uuid)
        .and_then(|()| writeln!(out, "{kind}_name: {}", reference.name))
        .map_err(|error| format!("failed to write output: {error}"))
}
