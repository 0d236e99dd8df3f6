//! Run configuration
//!
//! Everything the batch driver needs in one struct, optionally loaded
//! from a JSON file and validated once before any work begins. Paths
//! that are not set fall back to locations derived from the input
//! directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for one batch run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for FLAC files (set from the command line)
    #[serde(skip)]
    pub input_dir: PathBuf,
    /// Where finished .opus files land; defaults to `<input>/opus`
    pub output_dir: Option<PathBuf>,
    /// Root for per-task scratch subdirectories; defaults to the system
    /// temp dir
    pub scratch_dir: Option<PathBuf>,
    /// Worker pool size
    pub workers: usize,
    /// Resample target rate in Hz
    pub sample_rate: u32,
    /// Resample target bit depth
    pub bit_depth: u32,
    /// opusenc VBR target bitrate in kbps
    pub bitrate_kbps: u32,
    /// opusenc compression effort (0-10)
    pub encoder_effort: u32,
    /// opusenc frame size in milliseconds
    pub frame_size_ms: u32,
    /// Tool names or paths, resolved through PATH when bare
    pub ffmpeg: String,
    pub sox: String,
    pub opusenc: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: None,
            scratch_dir: None,
            workers: default_workers(),
            sample_rate: 48_000,
            bit_depth: 16,
            bitrate_kbps: 320,
            encoder_effort: 10,
            frame_size_ms: 20,
            ffmpeg: "ffmpeg".to_string(),
            sox: "sox".to_string(),
            opusenc: "opusenc".to_string(),
        }
    }
}

/// Calculate the default worker count based on CPU cores
///
/// Uses 75% of cores, clamped between 2 and 6. Each worker drives one
/// file's external-tool pipeline, so there is little to gain from more.
fn default_workers() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);

    ((available as f32 * 0.75).ceil() as usize).clamp(2, 6)
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {:?}: {}", path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {:?}: {}", path, e))
    }

    /// Resolved output directory
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join("opus"))
    }

    /// Resolved scratch root
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("flac2opus"))
    }

    /// Validate once, before any work begins
    pub fn validate(&self) -> Result<(), String> {
        if !self.input_dir.is_dir() {
            return Err(format!("Input directory {:?} does not exist", self.input_dir));
        }
        if self.workers == 0 || self.workers > 16 {
            return Err(format!("Worker count {} out of range (1-16)", self.workers));
        }
        if self.sample_rate == 0 {
            return Err("Sample rate must be nonzero".to_string());
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(format!("Unsupported bit depth {}", self.bit_depth));
        }
        // Valid Opus bitrate range
        if !(6..=510).contains(&self.bitrate_kbps) {
            return Err(format!("Bitrate {} kbps out of range (6-510)", self.bitrate_kbps));
        }
        if self.encoder_effort > 10 {
            return Err(format!("Encoder effort {} out of range (0-10)", self.encoder_effort));
        }
        // opusenc only accepts these frame sizes (plus 2.5, which an
        // integer field cannot express)
        if !matches!(self.frame_size_ms, 5 | 10 | 20 | 40 | 60) {
            return Err(format!("Frame size {} ms is not a valid Opus frame size", self.frame_size_ms));
        }
        Ok(())
    }
}
