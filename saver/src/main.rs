use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use saver::config::Config;
use saver::{Backends, HostSignals, PlaybackCore, VideoAsset, log_and_continue};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

#[derive(Parser)]
#[command(name = "loopsaver")]
#[command(about = "Looping video screensaver player", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/loopsaver/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an asset, driving ticks from a timer until stopped
    Run {
        /// Path or file:// URL (defaults to [playback] asset)
        asset: Option<String>,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        seconds: Option<f64>,

        /// Write the final surface to this image file
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Show the poster frame only
        #[arg(long)]
        preview: bool,
    },

    /// Write the poster frame of an asset to an image file
    Poster {
        /// Path or file:// URL of the asset
        asset: String,

        /// Output image (format from extension)
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,

        /// How long to wait for the first frame, in milliseconds
        #[arg(short, long, default_value = "10000")]
        timeout_ms: u64,
    },

    /// Print media information as JSON
    Probe {
        /// Path or file:// URL of the asset
        asset: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let log_level = loaded
        .as_ref()
        .map(|cfg| cfg.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("loopsaver v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("Failed to load config: {:#}. Using defaults.", e);
            Config::default()
        }
    };

    match cli.command {
        Commands::Run {
            asset,
            seconds,
            snapshot,
            preview,
        } => run(&config, asset, seconds, snapshot, preview).await,
        Commands::Poster {
            asset,
            output,
            timeout_ms,
        } => poster(&config, &asset, &output, timeout_ms),
        Commands::Probe { asset } => probe(&asset),
    }
}

async fn run(
    config: &Config,
    asset: Option<String>,
    seconds: Option<f64>,
    snapshot: Option<PathBuf>,
    preview: bool,
) -> Result<()> {
    let reference = asset
        .or_else(|| config.playback.asset.clone())
        .context("No asset given and none set in [playback] asset")?;

    let mut options = config.to_options()?;
    options.preview_mode |= preview;

    let run_for = seconds
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("Invalid --seconds value")?;

    let mut core = PlaybackCore::new(config.host.bounds());
    core.configure(&reference, options)
        .with_context(|| format!("Failed to configure {}", reference))?;
    core.start();

    drive(&mut core, config.host.tick_interval(), run_for).await;

    if let Some(path) = snapshot {
        log_and_continue!(save_snapshot(&mut core, &path), "save snapshot");
    }

    println!("{}", serde_json::to_string_pretty(&core.status())?);
    Ok(())
}

/// Deliver ticks at a fixed cadence until the deadline or Ctrl-C
async fn drive(host: &mut impl HostSignals, interval: Duration, run_for: Option<Duration>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let started = Instant::now();
    let mut last = started;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                host.on_tick(now - last);
                last = now;

                if run_for.is_some_and(|limit| now - started >= limit) {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                log::info!("Interrupted, stopping playback");
                break;
            }
        }
    }
}

fn save_snapshot(core: &mut PlaybackCore, path: &Path) -> Result<()> {
    let image = core
        .draw()
        .context("Surface is blank, nothing to snapshot")?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved snapshot to {}", path.display());
    Ok(())
}

fn poster(config: &Config, reference: &str, output: &Path, timeout_ms: u64) -> Result<()> {
    let mut options = config.to_options()?;
    options.preview_mode = true;
    options.poster_timeout_ms = timeout_ms;

    let mut core = PlaybackCore::new(config.host.bounds());
    core.configure(reference, options)
        .with_context(|| format!("Failed to configure {}", reference))?;

    let frame = core.current_poster_frame();
    if frame.is_placeholder() {
        match core.last_error() {
            Some(e) => anyhow::bail!("No poster frame for {}: {}", reference, e),
            None => anyhow::bail!("No poster frame for {} within {}ms", reference, timeout_ms),
        }
    }

    frame
        .image()
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let (width, height) = frame.dimensions();
    log::info!("Wrote {}x{} poster to {}", width, height, output.display());
    Ok(())
}

fn probe(reference: &str) -> Result<()> {
    let asset = VideoAsset::resolve(reference)?;
    let backends = Backends::default();
    let backend = backends
        .find(asset.kind())
        .map(|b| b.name())
        .with_context(|| format!("No backend available for {} assets", asset.kind().name()))?;

    let decoder = backends.open(&asset)?;
    let (width, height) = decoder.dimensions();

    let info = serde_json::json!({
        "path": asset.path(),
        "kind": asset.kind().name(),
        "backend": backend,
        "duration_ms": decoder.duration().as_millis() as u64,
        "frame_rate": decoder.frame_rate(),
        "width": width,
        "height": height,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
