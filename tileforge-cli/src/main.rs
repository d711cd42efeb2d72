//! TileForge CLI - Command-line interface
//!
//! Exposes the tile resolution engine for scripting and manual testing:
//! `fetch` resolves one tile to an image file, `probe` reports how a
//! coordinate would resolve without producing output.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "tileforge", version, about = "Resolve and cache map tiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a tile and write the encoded image to a file.
    Fetch(commands::fetch::FetchArgs),

    /// Report how a coordinate would resolve, without fetching.
    Probe(commands::probe::ProbeArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tileforge::logging::init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Fetch(args) => commands::fetch::run(args).await,
        Command::Probe(args) => commands::probe::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
