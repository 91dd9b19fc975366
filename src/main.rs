mod cli;
mod commands;
mod mcp;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output and the MCP protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfpick=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Extract {
            path,
            pages,
            output,
        } => {
            commands::extract::run(&path, &pages, &output)?;
        }
    }

    Ok(())
}
