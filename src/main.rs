mod api_types;
mod config;
mod engagement;
mod fetch;
mod models;
mod orchestrator;
mod render;
mod risk;
mod score;
mod sentiment;
mod store;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::orchestrator::{run_daily, RunPaths};

/// Brand Pulse - social-mention scoring and rolling dashboard updater
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Dashboard state file, loaded and rewritten each run
    #[arg(short, long, default_value = "data.json")]
    data_file: PathBuf,

    /// Directory for raw mention drops (written online, read with --offline)
    #[arg(long, default_value = "raw")]
    raw_dir: PathBuf,

    /// Directory for scored-batch snapshots
    #[arg(long, default_value = "scored")]
    scored_dir: PathBuf,

    /// Posts archive to merge this run's mentions into (separate schema)
    #[arg(long)]
    posts_file: Option<PathBuf>,

    /// Path to a JSON config overriding the built-in scoring defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Env file holding TWITTER_BEARER_TOKEN=
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Skip the network and ingest raw files from --raw-dir instead
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting brand_pulse");

    let args = Args::parse();

    let cfg = config::PipelineConfig::load(args.config.as_deref())?;
    match &args.config {
        Some(path) => debug!("Config overrides loaded from {}", path.display()),
        None => debug!("Using built-in scoring defaults"),
    }

    info!(
        "Run setup - data_file={}, offline={}, posts_mode={}",
        args.data_file.display(),
        args.offline,
        args.posts_file.is_some()
    );

    let paths = RunPaths {
        data_file: args.data_file,
        raw_dir: args.raw_dir,
        scored_dir: args.scored_dir,
        posts_file: args.posts_file,
        env_file: args.env_file,
    };

    run_daily(&cfg, &paths, args.offline).await
}
