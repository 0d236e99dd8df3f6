//! The per-file conversion pipeline and the batch driver
//!
//! Each FLAC flows through extract -> decode -> resample -> encode, all
//! of it external-tool orchestration. The driver fans files out across a
//! bounded worker pool and collects one outcome per file.

mod driver;
mod encode;
mod extract;
mod pipeline;
mod resample;
mod scratch;

pub use driver::run_batch;

use std::process::Output;

/// Format a failed tool invocation for logs and error values
///
/// The last stderr line is usually the one that says what went wrong.
pub(crate) fn tool_failure(tool: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!(
        "{} exited with status {}: {}",
        tool,
        output.status,
        stderr.lines().last().unwrap_or("Unknown error")
    )
}

/// File stem of a path, for log messages keyed by track name
pub(crate) fn display_name(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
