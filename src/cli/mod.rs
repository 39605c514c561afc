//! Command-line interface for fpsmon.
//!
//! Runs a synthetic multi-channel load against the monitor so the report
//! files can be inspected end to end. Just run `fpsmon`.

use crate::core::{Config, ConfigBuilder, FpsError, LogLevel, RateKey, Result, SinkKind};
use crate::monitoring::FpsMonitor;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Frame periods in milliseconds for the two sub-streams of each channel
/// tier: slow (5/10 fps), medium (20/25 fps) and fast (40/50 fps).
const TIER_PERIODS_MS: [(u64, u64); 3] = [(200, 100), (50, 40), (25, 20)];

/// In-process frame-rate monitor demo.
#[derive(Parser, Debug)]
#[command(name = "fpsmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/fpsmon/config.yaml)
    #[arg(short, long, env = "FPSMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the report files
    #[arg(long, env = "FPSMON_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,

    /// Base name of the report files
    #[arg(long, env = "FPSMON_FILE_NAME")]
    pub file_name: Option<String>,

    /// Seconds between reports
    #[arg(long, env = "FPSMON_INTERVAL")]
    pub interval: Option<u64>,

    /// Lowest rate counted as valid
    #[arg(long)]
    pub min_rate: Option<f32>,

    /// Highest rate counted as valid
    #[arg(long)]
    pub max_rate: Option<f32>,

    /// Frames each simulated stream produces before stopping
    #[arg(long, default_value_t = 3000)]
    pub frames: u64,

    /// Channels per speed tier (three tiers, two streams per channel)
    #[arg(long, default_value_t = 10)]
    pub channels: u64,

    /// Write reports to the log instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Enable debug logging
    #[arg(short, long, env = "FPSMON_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("fpsmon").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/fpsmon/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
            },
            Err(e) if self.config.is_some() => {
                // User explicitly specified a config file that doesn't exist
                return Err(FpsError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {},
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(dir) = &self.session_dir {
            builder = builder.session_dir(dir.clone());
        }
        if let Some(name) = &self.file_name {
            builder = builder.file_name(name.clone());
        }
        if let Some(secs) = self.interval {
            builder = builder.interval(Duration::from_secs(secs));
        }
        if let Some(min) = self.min_rate {
            builder = builder.min_rate(min);
        }
        if let Some(max) = self.max_rate {
            builder = builder.max_rate(max);
        }
        if self.stdout {
            builder = builder.sink_kind(SinkKind::Tracing);
        }
        if self.debug {
            builder = builder.log_level(LogLevel::Debug);
        }

        builder.build()
    }

    /// Initialize logging at `level`, unless `RUST_LOG` says otherwise.
    pub fn init_logging(&self, level: LogLevel) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(self.debug)
            .with_thread_ids(self.debug)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| FpsError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the fpsmon demo.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Interval: {:?}", config.monitor.interval);
        println!(
            "  Valid band: {} - {} fps",
            config.monitor.band.min, config.monitor.band.max
        );
        println!("  Sink: {:?}", config.sink.kind);
        println!(
            "  Reports: {:?}/{}.log",
            config.sink.session_dir, config.sink.file_name
        );
        return Ok(());
    }

    cli.init_logging(config.logging.level)?;

    let monitor = Arc::new(FpsMonitor::from_config(&config)?);
    tracing::info!(
        streams = cli.channels * 6,
        frames = cli.frames,
        "Starting synthetic load"
    );

    let mut producers = spawn_load(&monitor, cli.channels, cli.frames);

    let interrupted = tokio::select! {
        () = async { while producers.join_next().await.is_some() {} } => false,
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        tracing::info!("Received shutdown signal, stopping...");
        producers.abort_all();
    } else {
        tracing::info!("All producers finished");
    }

    stop_monitor(monitor).await
}

/// Shut the monitor down off the async workers.
///
/// Shutdown joins the report threads and waits for the last lines to reach
/// the sink, which may block on disk.
async fn stop_monitor(monitor: Arc<FpsMonitor>) -> Result<()> {
    tokio::task::spawn_blocking(move || monitor.shutdown())
        .await
        .map_err(|e| FpsError::worker(format!("monitor shutdown failed: {}", e)))
}

/// Start one task per simulated stream.
///
/// Channel ids run from 1 to `3 * channels_per_tier`; each channel gets
/// sub-streams 0 and 1 at its tier's periods.
pub fn spawn_load(monitor: &FpsMonitor, channels_per_tier: u64, frames: u64) -> JoinSet<()> {
    let mut producers = JoinSet::new();

    for channel in 1..=channels_per_tier * 3 {
        let tier = usize::try_from((channel - 1) / channels_per_tier.max(1)).unwrap_or(0);
        let (first, second) = TIER_PERIODS_MS[tier.min(TIER_PERIODS_MS.len() - 1)];

        for (sub, period_ms) in [(0, first), (1, second)] {
            let handle = monitor.counter(RateKey::new(0, channel, sub), true);
            producers.spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_millis(period_ms));
                for _ in 0..frames {
                    ticker.tick().await;
                    handle.increment();
                }
            });
        }
    }

    producers
}
