//! opusenc invocation with tags and cover art attached

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::extract::Sidecars;
use super::resample::GainDecision;
use super::tool_failure;
use crate::audio::tags;
use crate::config::Config;

/// Encode the resampled WAV to Opus at `output`
///
/// Tags from the metadata sidecar are remapped to Vorbis comment names
/// and passed one `--comment` each; the cover picture is attached when
/// present. Intermediates are not deleted here - the caller's scratch
/// guard owns them.
pub async fn encode_opus(
    config: &Config,
    wav: &Path,
    sidecars: &Sidecars,
    gain: &GainDecision,
    output: &Path,
) -> Result<(), String> {
    let metadata_text = tokio::fs::read_to_string(&sidecars.metadata)
        .await
        .map_err(|e| format!("Failed to read metadata sidecar: {}", e))?;

    let comments = tags::build_comments(&metadata_text, gain.gain_db, gain.clip_warning.as_deref());

    let mut cmd = Command::new(&config.opusenc);
    cmd.arg("--vbr")
        .args(["--bitrate", &config.bitrate_kbps.to_string()])
        .args(["--comp", &config.encoder_effort.to_string()])
        .args(["--framesize", &config.frame_size_ms.to_string()])
        .arg("--music");

    if let Some(cover) = &sidecars.cover {
        cmd.arg("--picture").arg(cover);
    }
    for comment in &comments {
        cmd.arg("--comment").arg(comment);
    }
    cmd.arg(wav).arg(output).stdout(Stdio::null());

    let result = cmd
        .output()
        .await
        .map_err(|e| format!("Failed to spawn {}: {}", config.opusenc, e))?;

    if !result.status.success() {
        return Err(tool_failure(&config.opusenc, &result));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::scratch::TaskScratch;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_metadata_sidecar_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            input_dir: root.path().to_path_buf(),
            ..Config::default()
        };
        let sidecars = Sidecars {
            cover: None,
            metadata: PathBuf::from("/nonexistent/metadata.txt"),
        };
        let gain = GainDecision {
            gain_db: 0.0,
            clip_warning: None,
        };

        let result = encode_opus(
            &config,
            Path::new("/nonexistent/resampled.wav"),
            &sidecars,
            &gain,
            Path::new("/nonexistent/out.opus"),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_opusenc_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let scratch = TaskScratch::create(root.path()).unwrap();
        std::fs::write(scratch.file("metadata.txt"), "title=Song\n").unwrap();

        let config = Config {
            input_dir: root.path().to_path_buf(),
            opusenc: "/nonexistent/opusenc".to_string(),
            ..Config::default()
        };
        let sidecars = Sidecars {
            cover: None,
            metadata: scratch.file("metadata.txt"),
        };
        let gain = GainDecision {
            gain_db: -0.4,
            clip_warning: None,
        };

        let result = encode_opus(
            &config,
            &scratch.file("resampled.wav"),
            &sidecars,
            &gain,
            &root.path().join("out.opus"),
        )
        .await;
        assert!(result.is_err());
    }
}
