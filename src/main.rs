//! flac2opus - batch FLAC to Opus converter
//!
//! Scans a music directory, and for every FLAC file: extracts tags and
//! cover art, decodes to PCM, resamples with a clip-safe gain reduction
//! loop, and re-encodes to Opus with the metadata carried over. The heavy
//! lifting is done by external tools (ffmpeg, sox, opusenc); this program
//! sequences them across a worker pool.

mod audio;
mod config;
mod conversion;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use config::Config;

fn print_usage() {
    eprintln!("usage: flac2opus <music-dir> [config.json]");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let input_dir = match args.first() {
        Some(p) => PathBuf::from(p),
        None => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging();

    let mut config = if let Some(path) = args.get(1) {
        match Config::load(std::path::Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Could not load config: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Config::default()
    };
    config.input_dir = input_dir;

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    match conversion::run_batch(Arc::new(config)).await {
        Ok(report) => {
            if report.failed > 0 {
                for outcome in report.outcomes.iter().filter(|o| !o.success) {
                    log::warn!(
                        "Not converted: {} ({})",
                        outcome.input_path.display(),
                        outcome.error.as_deref().unwrap_or("unknown error")
                    );
                }
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            log::error!("Batch run aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
