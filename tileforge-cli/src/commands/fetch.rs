//! Fetch command - resolve a single tile and write it to a file.

use super::common::ConfigArgs;
use crate::error::CliError;
use std::path::PathBuf;
use std::sync::Arc;
use tileforge::{ReqwestClient, TileEngine, TileResult};

/// Arguments for the fetch command.
#[derive(Debug, clap::Args)]
pub struct FetchArgs {
    /// Tile column (X index).
    #[arg(long)]
    pub col: u32,

    /// Tile row (Y index).
    #[arg(long)]
    pub row: u32,

    /// Zoom level.
    #[arg(long)]
    pub zoom: u8,

    /// Output file for the encoded tile.
    #[arg(short, long, default_value = "tile.png")]
    pub output: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs) -> Result<(), CliError> {
    let config = args.config.resolve()?;
    tracing::debug!(?config, "Resolved engine configuration");
    let engine = TileEngine::new(config, Arc::new(ReqwestClient::new()?))?;

    println!("Resolving tile {}/{}/{}", args.zoom, args.col, args.row);
    let start = std::time::Instant::now();

    match engine.resolve_tile(args.col, args.row, args.zoom).await {
        TileResult::Present { bytes, width, height } => {
            std::fs::write(&args.output, &bytes)?;
            println!(
                "Wrote {}x{} tile ({} bytes) to {} in {:.2}s",
                width,
                height,
                bytes.len(),
                args.output.display(),
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        TileResult::Absent => Err(CliError::Unavailable),
    }
}
