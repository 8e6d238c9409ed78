//! voxscript: script-to-narration speech synthesis
//!
//! Converts a structured script (narrator/character entries) into a
//! single narrated audio file with:
//! - Interchangeable TTS backends (Speechify, ElevenLabs)
//! - Automatic fallback when the preferred backend is unusable
//! - Free-text script parsing with narrator/character markup
//! - A transcript sidecar next to every generated audio file

pub mod config;
pub mod error;
pub mod language;
pub mod providers;
pub mod script;
pub mod synthesizer;
pub mod voices;

pub use config::{ProviderKind, ProviderSettings, TtsConfig};
pub use error::SpeechError;
pub use providers::{AudioFormat, SynthesisRequest, TtsProvider};
pub use script::{RawEntry, Role, ScriptEntry, TtsStatistics};
pub use synthesizer::{NarrationSynthesizer, SynthesisResult};
pub use voices::{Voice, VoiceFilter, VoiceLanguage, VoiceModel};
