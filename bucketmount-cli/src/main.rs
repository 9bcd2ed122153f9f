mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = bucketmount::logging::init_logging(cli.global.log_level.as_deref());

    match cli.command {
        Commands::Ensure(args) => commands::ensure::execute(args, &cli.global).await,
        Commands::Status(args) => commands::status::execute(args, &cli.global).await,
    }
}
