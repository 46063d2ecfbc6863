//! GOES-16 patch dataset builder.
//!
//! Creates a new Zarr dataset and fills it with `--n-batches` batches of
//! patches, each batch cut from all configured channels at one random
//! instant.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use goes_common::{parse_iso8601, TimeRange};
use grid_processor::DatasetConfig;
use storage::BucketConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dataset_builder::{
    create_dataset, BuilderConfig, ChannelTable, DatasetBuilder, GoesFetcher, RetryPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "goes-dataset")]
#[command(about = "Build a GOES-16 patch dataset from the public noaa-goes16 bucket")]
struct Args {
    /// Dataset directory to create (must not exist)
    #[arg(short, long, env = "DATASET_OUTPUT")]
    output: PathBuf,

    /// Channel table (YAML); built-in 16-band table if missing
    #[arg(long, env = "CHANNELS_CONFIG", default_value = "config/channels.yaml")]
    channels: PathBuf,

    /// Number of batches to append
    #[arg(long, default_value = "500")]
    n_batches: usize,

    /// Patches drawn per batch (with replacement)
    #[arg(long, default_value = "50")]
    n_subsample: usize,

    /// Start of the sampling window (ISO 8601)
    #[arg(long)]
    start: Option<String>,

    /// End of the sampling window, exclusive (ISO 8601)
    #[arg(long)]
    end: Option<String>,

    /// Abandoned attempts allowed per batch before giving up
    #[arg(long, default_value = "20")]
    max_attempts: u32,

    /// Timeout for each list/get request, in seconds
    #[arg(long, default_value = "300")]
    fetch_timeout: u64,

    /// Maximum concurrent channel fetches
    #[arg(long, default_value = "4")]
    max_concurrent: usize,

    /// RNG seed for reproducible runs
    #[arg(long, env = "DATASET_SEED")]
    seed: Option<u64>,

    /// Source bucket
    #[arg(long, env = "GOES_BUCKET", default_value = "noaa-goes16")]
    bucket: String,

    /// Alternate S3-compatible endpoint
    #[arg(long, env = "GOES_ENDPOINT")]
    endpoint: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    netcdf_parser::silence_hdf5_errors();

    info!("Starting GOES dataset builder");

    let channels = ChannelTable::load_or_default(&args.channels)
        .with_context(|| format!("Failed to load channel table {}", args.channels.display()))?;

    let mut window = TimeRange::default();
    if let Some(start) = &args.start {
        window.start = parse_iso8601(start).with_context(|| format!("Invalid --start '{}'", start))?;
    }
    if let Some(end) = &args.end {
        window.end = parse_iso8601(end).with_context(|| format!("Invalid --end '{}'", end))?;
    }

    let mut config = BuilderConfig::new(args.output.clone(), channels);
    config.bucket = BucketConfig {
        bucket: args.bucket.clone(),
        allow_http: args.endpoint.as_deref().is_some_and(|e| e.starts_with("http://")),
        endpoint: args.endpoint.clone(),
        ..Default::default()
    };
    config.n_batches = args.n_batches;
    config.n_subsample = args.n_subsample;
    config.window = window;
    config.retry = RetryPolicy {
        max_attempts: args.max_attempts,
    };
    config.fetch_timeout_secs = args.fetch_timeout;
    config.max_concurrent_fetches = args.max_concurrent;
    config.seed = args.seed;
    config.dataset = DatasetConfig::from_env();

    // Refuse an existing output before touching the network.
    let mut dataset = create_dataset(&config)
        .with_context(|| format!("Cannot create dataset at {}", config.output.display()))?;

    info!(
        output = %config.output.display(),
        labels = config.channels.channels.len(),
        batches = config.n_batches,
        subsample = config.n_subsample,
        window_start = %config.window.start,
        window_end = %config.window.end,
        compression = config.dataset.compression.as_str(),
        "Created dataset"
    );

    let fetcher = GoesFetcher::from_config(&config.bucket, config.fetch_timeout())
        .context("Failed to create bucket client")?;
    let mut builder = DatasetBuilder::new(fetcher, config)?;

    let summary = builder.run(&mut dataset).await?;

    info!(
        batches = summary.batches,
        samples = summary.samples,
        abandoned = summary.abandoned_attempts,
        "Dataset complete"
    );

    Ok(())
}
