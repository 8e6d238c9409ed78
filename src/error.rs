//! Error types for voxscript

use thiserror::Error;

/// Speech synthesis errors
#[derive(Error, Debug)]
pub enum SpeechError {
    /// No usable provider, or an invalid configuration value. Fatal at
    /// construction time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The normalized script or combined text ended up empty.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// The provider call failed (network, auth, quota, malformed response).
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
