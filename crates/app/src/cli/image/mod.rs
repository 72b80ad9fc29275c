use clap::{Args, Subcommand};

mod get;

#[derive(Debug, Args)]
pub(crate) struct ImageCommand {
    #[command(subcommand)]
    command: ImageSubcommand,
}

#[derive(Debug, Subcommand)]
enum ImageSubcommand {
    /// Download a color image
    Get(get::GetImageArgs),
}

pub(crate) async fn run(command: ImageCommand) -> Result<(), String> {
    match command.command {
        ImageSubcommand::Get(args) => get::run(args).await,
    }
}
