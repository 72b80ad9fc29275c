use catalog_app::domain::references::ReferenceKind;
use clap::{Args, Subcommand};

mod create;
mod list;

#[derive(Debug, Args)]
pub(crate) struct ReferenceCommand {
    #[command(subcommand)]
    command: ReferenceSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReferenceSubcommand {
    /// Create an entry products can refer to by name
    Create(create::CreateReferenceArgs),
    /// List entries, oldest first
    List(list::ListReferencesArgs),
}

pub(crate) async fn run(kind: ReferenceKind, command: ReferenceCommand) -> Result<(), String> {
    match command.command {
        ReferenceSubcommand::Create(args) => create::run(kind, args).await,
        ReferenceSubcommand::List(args) => list::run(kind, args).await,
    }
}
