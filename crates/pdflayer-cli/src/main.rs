mod cli;
mod extract_cmd;
mod manifest_cmd;
mod pages_cmd;
mod shared;

use std::io;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            file,
            pretty,
            no_paint_order,
            font_family,
            rasterizer,
            rasterizer_timeout,
            warnings,
        } => extract_cmd::run(&extract_cmd::ExtractArgs {
            file,
            pretty,
            no_paint_order,
            font_family,
            rasterizer,
            rasterizer_timeout,
            warnings,
        }),
        Commands::Manifest { ref file, pretty } => manifest_cmd::run(file, pretty),
        Commands::Pages { ref file } => pages_cmd::run(file),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
