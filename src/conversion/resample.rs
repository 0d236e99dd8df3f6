//! sox resampling with the clip-guard retry loop
//!
//! sox runs with automatic gain (`-G`) and reports on stderr when the
//! normalized signal would clip. The guard retries with an explicit
//! `vol` offset, stepping down 0.2 dB per retry to a -1.8 dB floor. A
//! file still clipping at the floor keeps the floor gain and carries a
//! warning note into its DESCRIPTION comment.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::scratch::TaskScratch;
use super::tool_failure;
use crate::config::Config;

/// Gain reduction per clip retry, in tenths of a dB (integer tenths so
/// repeated subtraction cannot drift)
const GAIN_STEP_TENTHS: i32 = 2;
/// Lowest gain the guard will apply, in tenths of a dB
const GAIN_FLOOR_TENTHS: i32 = -18;

/// What the clip guard decided for one file
#[derive(Debug, Clone)]
pub struct GainDecision {
    /// Gain actually applied, in dB (0.0 when none was needed)
    pub gain_db: f64,
    /// Set when the file still clipped at the floor gain
    pub clip_warning: Option<String>,
}

/// Matches sox's clipping diagnostic on stderr
///
/// The only place the fragile free-text match lives; if sox rewords the
/// message, this is the one predicate to update.
fn is_clip_warning(stderr: &str) -> bool {
    stderr.contains("decrease volume?")
}

/// Next gain step, or `None` once the floor is reached
fn next_gain_tenths(current: i32) -> Option<i32> {
    (current > GAIN_FLOOR_TENTHS).then(|| current - GAIN_STEP_TENTHS)
}

fn gain_db(tenths: i32) -> f64 {
    f64::from(tenths) / 10.0
}

/// One sox attempt; returns captured stderr on success
async fn run_sox(
    config: &Config,
    input: &Path,
    attempt: &Path,
    scratch: &TaskScratch,
    gain_tenths: i32,
) -> Result<String, String> {
    let mut cmd = Command::new(&config.sox);
    cmd.arg("--temp")
        .arg(scratch.path())
        .arg("-G")
        .arg(input)
        .args(["-b", &config.bit_depth.to_string()])
        .arg(attempt);
    if gain_tenths != 0 {
        cmd.args(["vol", &format!("{:.1}dB", gain_db(gain_tenths))]);
    }
    // Fixed quality profile: very-high-quality rate conversion with
    // intermediate phase and 97% bandwidth, noise-shaped dither
    cmd.args(["rate", "-v", "-I", "-b", "97"])
        .arg(config.sample_rate.to_string())
        .args(["dither", "-s"])
        .stdout(Stdio::null());

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("Failed to spawn {}: {}", config.sox, e))?;

    if !output.status.success() {
        return Err(tool_failure(&config.sox, &output));
    }

    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Resample `wav` to the configured rate/depth, retrying with reduced
/// gain while sox reports clipping
///
/// Returns the resampled file (inside the scratch dir) and the gain
/// decision. `name` keys the warning log entries to the source track.
pub async fn resample(
    config: &Config,
    wav: &Path,
    scratch: &TaskScratch,
    name: &str,
) -> Result<(PathBuf, GainDecision), String> {
    let attempt = scratch.file("resample-attempt.wav");
    let resampled = scratch.file("resampled.wav");

    let mut gain_tenths = 0;
    let mut clip_warning = None;

    loop {
        let stderr = run_sox(config, wav, &attempt, scratch, gain_tenths).await?;
        let diagnostic = stderr.split_whitespace().collect::<Vec<_>>().join(" ");

        if is_clip_warning(&stderr) {
            match next_gain_tenths(gain_tenths) {
                Some(lower) => {
                    gain_tenths = lower;
                    log::warn!(
                        "'{}' -> {} vol = {:.1}dB",
                        name,
                        diagnostic,
                        gain_db(gain_tenths)
                    );
                    let _ = std::fs::remove_file(&attempt);
                }
                None => {
                    log::warn!(
                        "'{}' still clipped at vol {:.1}dB. bad record!",
                        name,
                        gain_db(GAIN_FLOOR_TENTHS)
                    );
                    clip_warning = Some(diagnostic);
                    break;
                }
            }
        } else {
            // Anything else sox had to say is worth a look but not a retry
            if !diagnostic.is_empty() {
                log::warn!("'{}' -> {}", name, diagnostic);
            }
            break;
        }
    }

    std::fs::rename(&attempt, &resampled)
        .map_err(|e| format!("Failed to finalize resampled file: {}", e))?;

    Ok((
        resampled,
        GainDecision {
            gain_db: gain_db(gain_tenths),
            clip_warning,
        },
    ))
}
