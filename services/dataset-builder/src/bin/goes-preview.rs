//! Quick-look renderer for one channel at one instant.
//!
//! Writes `<stem>.png` (the whole raster) and `<stem>_grid.png` (the
//! raster with every patch outlined). With `--patch K` it also writes the
//! quantized patch `K` as `<stem>_patch<K>.png`.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use goes_common::parse_iso8601;
use grid_processor::PatchGrid;
use ndarray::Axis;
use renderer::{render_patch_grid_overlay, render_patch_preview, render_raster_preview};
use storage::BucketConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dataset_builder::{ChannelConfig, ChannelTable, GoesFetcher, RasterSource};

#[derive(Parser, Debug)]
#[command(name = "goes-preview")]
#[command(about = "Render a GOES channel and its patch grid to PNG")]
struct Args {
    /// Instant to look up (ISO 8601)
    #[arg(short, long)]
    time: String,

    /// Channel label from the channel table, e.g. C13
    #[arg(short, long, default_value = "C13")]
    label: String,

    /// Channel table (YAML); built-in 16-band table if missing
    #[arg(long, env = "CHANNELS_CONFIG", default_value = "config/channels.yaml")]
    channels: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Longest side of the rendered raster
    #[arg(long, default_value = "1024")]
    max_dim: usize,

    /// Also render this patch index
    #[arg(long)]
    patch: Option<usize>,

    /// Source bucket
    #[arg(long, env = "GOES_BUCKET", default_value = "noaa-goes16")]
    bucket: String,

    /// Timeout for each list/get request, in seconds
    #[arg(long, default_value = "300")]
    fetch_timeout: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    netcdf_parser::silence_hdf5_errors();

    let time = parse_iso8601(&args.time).with_context(|| format!("Invalid --time '{}'", args.time))?;
    let table = ChannelTable::load_or_default(&args.channels)?;
    let channel: ChannelConfig = table
        .get(&args.label)
        .cloned()
        .ok_or_else(|| anyhow!("Channel '{}' is not in the channel table", args.label))?;

    let bucket = BucketConfig {
        bucket: args.bucket.clone(),
        ..Default::default()
    };
    let fetcher = GoesFetcher::from_config(&bucket, std::time::Duration::from_secs(args.fetch_timeout))?;

    let raster = fetcher
        .get(&channel.product, time, channel.channel)
        .await?
        .ok_or_else(|| anyhow!("No {} object near {}", channel.label, time))?;

    let stem = raster
        .catalog
        .as_ref()
        .and_then(|entry| entry.filename.strip_suffix(".nc").map(str::to_string))
        .unwrap_or_else(|| format!("{}_{}", channel.label, time.format("%Y%m%dT%H%M%S")));
    let (rows, cols) = raster.shape();
    info!(stem = %stem, rows, cols, variable = %raster.variable, "Decoded raster");

    tokio::fs::create_dir_all(&args.output_dir).await?;

    let png = render_raster_preview(&raster.array, args.max_dim).map_err(|e| anyhow!(e))?;
    let path = args.output_dir.join(format!("{}.png", stem));
    tokio::fs::write(&path, png).await?;
    info!(path = %path.display(), "Wrote raster preview");

    let grid = PatchGrid::default();
    let png = render_patch_grid_overlay(&raster.array, &grid.corners(), grid.size, args.max_dim)
        .map_err(|e| anyhow!(e))?;
    let path = args.output_dir.join(format!("{}_grid.png", stem));
    tokio::fs::write(&path, png).await?;
    info!(path = %path.display(), patches = grid.len(), "Wrote patch grid overlay");

    if let Some(k) = args.patch {
        let batch = grid.extract(&raster.array, channel.scale, channel.offset)?;
        if k >= batch.len() {
            return Err(anyhow!("patch {} out of range (grid has {})", k, batch.len()));
        }
        let png = render_patch_preview(batch.patches.index_axis(Axis(0), k)).map_err(|e| anyhow!(e))?;
        let path = args.output_dir.join(format!("{}_patch{}.png", stem, k));
        tokio::fs::write(&path, png).await?;
        info!(path = %path.display(), patch = k, corner = ?batch.corners[k], "Wrote patch preview");
    }

    Ok(())
}
