//! newswire CLI — two-stage article-ingestion pipeline.
//!
//! Harvests paginated search results into object storage, then loads the
//! staged batch into a document database collection. The two stages are
//! separate subcommands so an external scheduler can sequence them.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
