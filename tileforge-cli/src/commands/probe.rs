//! Probe command - report how a coordinate would resolve.

use super::common::ConfigArgs;
use crate::error::CliError;
use tileforge::cache::TileCache;
use tileforge::engine::plan_for;
use tileforge::{Canvas, TileCoord};

/// Arguments for the probe command.
#[derive(Debug, clap::Args)]
pub struct ProbeArgs {
    /// Tile column (X index).
    #[arg(long)]
    pub col: u32,

    /// Tile row (Y index).
    #[arg(long)]
    pub row: u32,

    /// Zoom level.
    #[arg(long)]
    pub zoom: u8,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run the probe command.
///
/// Prints the resolution plan the engine would take and the state of the
/// cache entry, without touching the network or producing output bytes.
pub async fn run(args: ProbeArgs) -> Result<(), CliError> {
    let config = args.config.resolve()?;
    config.validate()?;
    let coord = TileCoord::new(args.col, args.row, args.zoom)?;

    let canvas = if config.double_tile_size {
        Canvas::Doubled
    } else {
        Canvas::Standard
    };
    let plan = plan_for(coord.zoom, &config, canvas);

    println!("Tile:  {}", coord);
    println!("Plan:  {:?}", plan);

    match &config.cache_root {
        Some(root) => {
            let cache = TileCache::new(root.clone());
            println!("Cache: {}", cache.path_for(&coord).display());
            match cache.read(&coord, config.cache_max_age_secs).await {
                Some(bytes) => {
                    let stale = cache.is_stale(&coord, config.cache_max_age_secs).await;
                    println!(
                        "       {} bytes, {}",
                        bytes.len(),
                        if stale { "stale" } else { "fresh" }
                    );
                }
                None => println!("       no entry"),
            }
        }
        None => println!("Cache: disabled"),
    }

    Ok(())
}
