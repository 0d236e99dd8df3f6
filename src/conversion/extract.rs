//! Sidecar extraction and PCM decoding via ffmpeg

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::scratch::TaskScratch;
use super::{display_name, tool_failure};
use crate::config::Config;

/// Sidecar files extracted from one source FLAC
#[derive(Debug)]
pub struct Sidecars {
    /// Embedded picture, when the source had one
    pub cover: Option<PathBuf>,
    /// Flat key=value tag dump in ffmetadata format
    pub metadata: PathBuf,
}

/// Extract the embedded picture and the tag metadata from `input`
///
/// A missing or unextractable picture is not an error; a failed tag
/// extraction aborts this file's conversion.
pub async fn extract_sidecars(
    config: &Config,
    input: &Path,
    scratch: &TaskScratch,
) -> Result<Sidecars, String> {
    let cover_path = scratch.file("cover");
    let cover_result = Command::new(&config.ffmpeg)
        .arg("-i")
        .arg(input)
        .args(["-map", "0:v", "-f", "image2", "-y"])
        .arg(&cover_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    let cover = match cover_result {
        Ok(status) if status.success() && cover_path.exists() => Some(cover_path),
        _ => {
            log::debug!("'{}' has no extractable cover art", display_name(input));
            None
        }
    };

    let metadata = scratch.file("metadata.txt");
    let output = Command::new(&config.ffmpeg)
        .arg("-i")
        .arg(input)
        .args(["-f", "ffmetadata", "-y"])
        .arg(&metadata)
        .stdout(Stdio::null())
        .output()
        .await
        .map_err(|e| format!("Failed to spawn {}: {}", config.ffmpeg, e))?;

    if !output.status.success() {
        return Err(tool_failure(&config.ffmpeg, &output));
    }

    Ok(Sidecars { cover, metadata })
}

/// Decode `input` to an intermediate WAV inside the scratch directory
pub async fn decode_to_wav(
    config: &Config,
    input: &Path,
    scratch: &TaskScratch,
) -> Result<PathBuf, String> {
    let wav = scratch.file("decoded.wav");
    let output = Command::new(&config.ffmpeg)
        .arg("-i")
        .arg(input)
        .arg("-y")
        .arg(&wav)
        .stdout(Stdio::null())
        .output()
        .await
        .map_err(|e| format!("Failed to spawn {}: {}", config.ffmpeg, e))?;

    if !output.status.success() {
        return Err(tool_failure(&config.ffmpeg, &output));
    }

    Ok(wav)
}
