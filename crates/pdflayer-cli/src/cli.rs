use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Extract normalized, paint-ordered layout items from PDF documents.
#[derive(Debug, Parser)]
#[command(name = "pdflayer", about, version)]
pub struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug). RUST_LOG overrides it
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract layout items as JSON
    Extract {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Keep pass-emission order instead of reconstructing paint order
        #[arg(long)]
        no_paint_order: bool,

        /// Font family assigned to every extracted text item
        #[arg(long, value_name = "NAME")]
        font_family: Option<String>,

        /// External rasterizer for full-page vector fragments (deprecated)
        #[arg(long, value_name = "EXE")]
        rasterizer: Option<PathBuf>,

        /// Seconds before the rasterizer is killed
        #[arg(long, value_name = "SECS", default_value_t = 30, requires = "rasterizer")]
        rasterizer_timeout: u64,

        /// Include the chosen strategy and extraction warnings in the output
        #[arg(long)]
        warnings: bool,
    },

    /// Print the embedded layout manifest
    Manifest {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List page indices and dimensions
    Pages {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}
