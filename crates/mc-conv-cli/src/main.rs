mod config;

use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};

use config::{ConvConfig, Direction};
use mc_conv_core::{to_bedrock, to_java, Progress};
use tracing::{error, info};

/// Logs every whole percent once.
struct ProgressLog {
    last_percent: AtomicU64,
}

impl Progress for ProgressLog {
    fn report(&self, done: u64, total: u64) -> bool {
        if total == 0 {
            return true;
        }
        let percent = done * 100 / total;
        if self.last_percent.fetch_max(percent, Ordering::AcqRel) < percent {
            info!("{percent}% ({done}/{total} chunks)");
        }
        true
    }
}

fn main() -> ExitCode {
    let path = std::env::args().nth(1).unwrap_or_else(|| "mc-conv.toml".into());
    let config = match ConvConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            return ExitCode::from(2);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let options = match config.options() {
        Ok(o) => o,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    let conv = &config.conversion;
    info!(
        "mc-conv v{}: {:?} {} -> {}",
        env!("CARGO_PKG_VERSION"),
        conv.direction,
        conv.input.display(),
        conv.output.display()
    );
    info!(
        "Workers: {}, schedule: {:?}",
        options.effective_concurrency(),
        options.schedule
    );

    let progress = ProgressLog {
        last_percent: AtomicU64::new(0),
    };
    let result = match conv.direction {
        Direction::JavaToBedrock => to_bedrock::convert_world(&conv.input, &conv.output, &options, &progress).map(|s| {
            info!(
                "Converted {} chunks ({} skipped), {} actors, {} structure records",
                s.chunks, s.skipped, s.actors, s.structures
            );
        }),
        Direction::BedrockToJava => to_java::convert_world(&conv.input, &conv.output, &options, &progress).map(|s| {
            info!("Converted {} chunks ({} skipped)", s.chunks, s.skipped);
            info!(
                "Leashes: {} resolved, {} dropped; passengers: {} resolved, {} dropped",
                s.links.leashes, s.links.dropped_leashes, s.links.passengers, s.links.dropped_passengers
            );
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            info!("Conversion cancelled");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("Conversion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
