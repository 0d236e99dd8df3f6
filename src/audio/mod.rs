//! Input classification and tag handling

pub mod detection;
pub mod tags;

pub use detection::{detect_format, AudioFormat};
