//! Batch driver: scan, classify, dispatch to the worker pool
//!
//! Enumerates the immediate children of the input directory, sniffs each
//! file's format, and runs the full pipeline for every FLAC on a bounded
//! tokio worker pool. Per-file failures are recorded and the batch keeps
//! going; the summary and exit status report them at the end.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use super::pipeline::{self, FileOutcome};
use super::display_name;
use crate::audio::{detect_format, AudioFormat};
use crate::config::Config;

/// Progress tracking shared by the pool workers
#[derive(Debug)]
pub struct ConversionProgress {
    completed: AtomicUsize,
    failed: AtomicUsize,
    pub total: usize,
}

impl ConversionProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            total,
        }
    }

    pub fn increment_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn increment_failed(&self) -> usize {
        self.failed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }
}

/// What one batch run did
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Files converted to .opus
    pub converted: usize,
    /// Files whose pipeline failed
    pub failed: usize,
    /// Non-FLAC children that were never dispatched
    pub skipped: usize,
    /// Outcomes for every dispatched file, completion order
    pub outcomes: Vec<FileOutcome>,
}

/// Scan the immediate children of `input_dir`, returning the FLAC files
/// and the count of skipped non-FLAC children
fn scan_input_dir(config: &Config) -> (Vec<PathBuf>, usize) {
    let output_dir = config.output_dir();
    let mut flacs = Vec::new();
    let mut skipped = 0;

    for entry in WalkDir::new(&config.input_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
    {
        let path = entry.path();
        if !path.is_file() || path.starts_with(&output_dir) {
            continue;
        }
        match detect_format(path) {
            AudioFormat::Flac => flacs.push(path.to_path_buf()),
            AudioFormat::Mp3 => {
                log::debug!("'{}' is mp3, skipping", display_name(path));
                skipped += 1;
            }
            AudioFormat::Unrecognized => skipped += 1,
        }
    }

    flacs.sort();
    (flacs, skipped)
}

/// Run one batch conversion over the configured input directory
pub async fn run_batch(config: Arc<Config>) -> Result<BatchReport, String> {
    let started = chrono::Local::now();

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| format!("Failed to create output directory {:?}: {}", output_dir, e))?;
    let scratch_root = config.scratch_dir();
    std::fs::create_dir_all(&scratch_root)
        .map_err(|e| format!("Failed to create scratch directory {:?}: {}", scratch_root, e))?;

    let (flacs, skipped) = scan_input_dir(&config);
    let progress = Arc::new(ConversionProgress::new(flacs.len()));

    log::info!(
        "Converting {} files with {} workers ({} skipped)",
        flacs.len(),
        config.workers,
        skipped
    );

    let semaphore = Arc::new(Semaphore::new(config.workers));
    let mut futures = FuturesUnordered::new();

    for input in flacs {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| format!("Worker pool closed unexpectedly: {}", e))?;
        let config = config.clone();
        let progress = progress.clone();

        futures.push(tokio::spawn(async move {
            let outcome = pipeline::convert_file(&config, &input).await;

            if outcome.success {
                let count = progress.increment_completed();
                log::info!("Completed ({}/{}): {}", count, progress.total, display_name(&input));
                log::debug!("'{}' written to {}", display_name(&input), outcome.output_path.display());
            } else {
                progress.increment_failed();
            }

            drop(permit);
            outcome
        }));
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = futures.next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => return Err(format!("Conversion task panicked: {}", e)),
        }
    }

    let elapsed = chrono::Local::now().signed_duration_since(started);
    let report = BatchReport {
        converted: progress.completed_count(),
        failed: progress.failed_count(),
        skipped,
        outcomes,
    };

    log::info!(
        "Batch finished in {}s: {} converted, {} failed, {} skipped",
        elapsed.num_seconds(),
        report.converted,
        report.failed,
        report.skipped
    );

    Ok(report)
}
