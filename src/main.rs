use clap::Parser;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use rover_link::config::{
    BYTES_PER_TICK, DEFAULT_BAUDRATE, DEFAULT_PORT, LOOP_HZ, MAX_LOOP_HZ, RuntimeConfig,
    STALE_AFTER,
};

/// Drive the two-motor base from the handheld controller link
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Serial port the controller link is attached to
    #[arg(short, long, default_value = DEFAULT_PORT)]
    port: String,

    #[arg(short, long, default_value_t = DEFAULT_BAUDRATE)]
    baud: u32,

    /// Receive loop rate
    #[arg(
        long,
        default_value_t = LOOP_HZ,
        value_parser = clap::value_parser!(u64).range(1..=MAX_LOOP_HZ)
    )]
    hz: u64,

    /// Bytes taken from the link per loop iteration
    #[arg(long, default_value_t = BYTES_PER_TICK)]
    bytes_per_tick: usize,

    /// Report the link stale after this long without a valid frame
    #[arg(long, default_value_t = STALE_AFTER.as_millis() as u64)]
    stale_after_ms: u64,

    /// Zero the motors when the link goes stale
    #[arg(long)]
    stop_on_stale: bool,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            loop_hz: args.hz,
            bytes_per_tick: args.bytes_per_tick,
            stale_after: Duration::from_millis(args.stale_after_ms),
            stop_on_stale: args.stop_on_stale,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let config = RuntimeConfig::from(&args);

    if let Err(e) = rover_link::runtime::run(config, &args.port, args.baud).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
