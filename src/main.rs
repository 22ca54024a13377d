//! handgrid - headless driver for the gesture interaction core.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use handgrid::backend::{self, headless, SourceType};
use handgrid::scene::LogSink;
use handgrid::{InteractionConfig, InteractionEngine};

#[derive(Parser, Debug)]
#[command(name = "handgrid", about = "Hand-gesture block structure interaction")]
struct Cli {
    /// Replay recorded keypoints from an s-expression file (default: no camera)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Interaction config plist
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detection tick period in milliseconds
    #[arg(long, default_value_t = 33)]
    detect_interval_ms: u64,

    /// Render tick period in milliseconds
    #[arg(long, default_value_t = 16)]
    render_interval_ms: u64,

    /// Exit after N seconds
    #[arg(long)]
    exit_after: Option<u64>,

    /// Print the effective config and exit
    #[arg(long)]
    dump_config: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handgrid {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handgrid=info".into()),
        )
        .init();

    let config = match &cli.config {
        Some(path) => InteractionConfig::load(path)?,
        None => InteractionConfig::default(),
    };

    if cli.dump_config {
        println!("{}", config.config_sexp());
        return Ok(());
    }

    info!("handgrid v{} starting", env!("CARGO_PKG_VERSION"));

    let source_type = match cli.replay {
        Some(path) => SourceType::Replay(path),
        None => {
            info!("no replay file given, running without keypoint input");
            SourceType::Idle
        }
    };
    let source = backend::open(&source_type)?;

    let headless_config = headless::HeadlessConfig {
        detect_interval_ms: cli.detect_interval_ms,
        render_interval_ms: cli.render_interval_ms,
        ..Default::default()
    };
    let summary = headless::run(
        InteractionEngine::new(config),
        source,
        Box::new(LogSink::default()),
        cli.exit_after.map(Duration::from_secs),
        headless_config,
    )?;
    info!(
        "Finished: {} event(s), {} render tick(s)",
        summary.events, summary.render_ticks
    );
    Ok(())
}
