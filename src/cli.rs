use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfpick")]
#[command(about = "Copy a chosen subset of a PDF's pages into a new PDF, with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp,

    /// Display PDF metadata and list its pages
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Extract pages, in the given order, to a new PDF
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Zero-based pages (e.g., "2,0,0" or "0-4,9,12-end")
        pages: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}
