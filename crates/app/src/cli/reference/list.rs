use std::io::{self, Write};

use catalog_app::{
    config::DatabaseConfig,
    database::{self, Db},
    domain::references::{PgReferencesRepository, ReferenceKind, ReferencesRepository},
};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct ListReferencesArgs {
    /// Number of entries to skip
    #[arg(long, default_value_t = 0)]
    skip: u64,

    /// Maximum number of entries to list
    #[arg(long, default_value_t = 50)]
    limit: u64,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(kind: ReferenceKind, args: ListReferencesArgs) -> Result<(), String> {
    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let repository = PgReferencesRepository::new(Db::new(pool));

    execute(&repository, kind, &args, &mut io::stdout()).await
}

async fn execute<W: Write>(
    repository: &dyn ReferencesRepository,
    kind: ReferenceKind,
    args: &ListReferencesArgs,
    out: &mut W,
) -> Result<(), String> {
    let references = repository
        .list_references(kind, args.skip, args.limit)
        .await
        .map_err(|error| format!("failed to list {kind} entries: {error}"))?;

    if references.is_empty() {
        return writeln!(out, "no {kind} entries found")
            .map_err(|error| format!("failed to write output: {error}"));
    }

    for reference in references {
        writeln!(out, "{}  {}", reference.uuid, reference.name)
            .map_err(|error| format!("failed to write output: {error}"))?;
    }

    Ok(())
}
