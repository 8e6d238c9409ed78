//! TTS provider implementations

#[cfg(feature = "elevenlabs")]
pub mod elevenlabs;
#[cfg(feature = "speechify")]
pub mod speechify;

use crate::error::SpeechError;
use crate::voices::Voice;
use async_trait::async_trait;
use bytes::Bytes;

/// Output audio container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// The normalized request shape passed to whichever provider is active
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Combined transcript text
    pub text: String,
    /// Resolved language code
    pub language: String,
    /// Provider voice id
    pub voice_id: String,
    /// Provider-specific model hint derived from the language
    pub model: String,
    pub format: AudioFormat,
}

/// Capability interface over the synthesis backends.
///
/// The selector operates only against this trait; concrete types are
/// matched on once, at construction.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Synthesize the request into a single audio byte sequence
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, SpeechError>;

    /// Query the provider's voice catalog
    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError>;

    /// Model hint for a language code. The monolingual-English value
    /// differs from the one shared by every other supported code.
    fn model_for_language(&self, language: &str) -> &'static str;

    /// Whether the provider can be called (credential present)
    fn is_usable(&self) -> bool;

    fn name(&self) -> &'static str;
}
