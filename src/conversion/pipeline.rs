//! One file's conversion from FLAC to Opus
//!
//! extract sidecars -> decode -> resample (clip guard) -> encode, with
//! the scratch guard cleaning up intermediates whichever way it ends.

use std::path::{Path, PathBuf};

use super::scratch::TaskScratch;
use super::{display_name, encode, extract, resample};
use crate::config::Config;

/// Result of one file's conversion
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Original input file path
    pub input_path: PathBuf,
    /// Path of the produced .opus file
    pub output_path: PathBuf,
    /// Whether conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
}

/// Convert a single FLAC file, capturing failure in the outcome rather
/// than propagating it
pub async fn convert_file(config: &Config, input: &Path) -> FileOutcome {
    let name = display_name(input);
    let output_path = config.output_dir().join(format!("{}.opus", name));

    match run_pipeline(config, input, &output_path, &name).await {
        Ok(()) => FileOutcome {
            input_path: input.to_path_buf(),
            output_path,
            success: true,
            error: None,
        },
        Err(e) => {
            log::error!("'{}' failed: {}", name, e);
            FileOutcome {
                input_path: input.to_path_buf(),
                output_path,
                success: false,
                error: Some(e),
            }
        }
    }
}

async fn run_pipeline(
    config: &Config,
    input: &Path,
    output_path: &Path,
    name: &str,
) -> Result<(), String> {
    // Dropped at the end of this function, success or not, taking every
    // intermediate with it.
    let scratch = TaskScratch::create(&config.scratch_dir())?;

    let sidecars = extract::extract_sidecars(config, input, &scratch).await?;
    let wav = extract::decode_to_wav(config, input, &scratch).await?;
    let (resampled, gain) = resample::resample(config, &wav, &scratch, name).await?;
    encode::encode_opus(config, &resampled, &sidecars, &gain, output_path).await?;

    Ok(())
}
