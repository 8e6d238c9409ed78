//! Narration synthesizer with provider selection and fallback

use crate::config::{ProviderKind, TtsConfig};
use crate::error::SpeechError;
use crate::language;
use crate::providers::{AudioFormat, SynthesisRequest, TtsProvider};
use crate::script::{self, RawEntry, ScriptEntry, TtsStatistics};
use crate::voices::Voice;
use bytes::Bytes;
use chrono::Local;
use parking_lot::RwLock;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Result of one synthesis invocation
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub audio: Bytes,
    pub audio_path: PathBuf,
    /// `None` when the sidecar write failed (non-fatal)
    pub transcript_path: Option<PathBuf>,
}

/// Basic information about a generated audio file
#[derive(Debug, Clone, Serialize)]
pub struct AudioFileInfo {
    pub exists: bool,
    pub file_size_bytes: u64,
    pub file_size_mb: f64,
}

struct SessionState {
    language: String,
    rate: u32,
}

enum ProviderProbe {
    Ready(Arc<dyn TtsProvider>),
    Unavailable(String),
}

/// Script narration synthesizer.
///
/// Selects a usable provider exactly once at construction, preferring
/// `TtsConfig::preferred_provider` and falling back to the other backend
/// when the preferred one is unusable. The selection is never
/// re-evaluated per call.
pub struct NarrationSynthesizer {
    config: Arc<TtsConfig>,
    provider: Arc<dyn TtsProvider>,
    active: ProviderKind,
    state: RwLock<SessionState>,
}

impl NarrationSynthesizer {
    /// Create a new synthesizer, selecting and initializing a provider
    pub fn new(config: TtsConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let (active, provider) = select_provider(&config)?;

        let state = SessionState {
            language: language::resolve(&config.language).to_string(),
            rate: config.rate,
        };

        Ok(Self {
            config: Arc::new(config),
            provider,
            active,
            state: RwLock::new(state),
        })
    }

    /// Create a synthesizer from environment configuration
    pub fn from_env() -> Result<Self, SpeechError> {
        let config = TtsConfig::from_env().map_err(SpeechError::Config)?;
        Self::new(config)
    }

    /// The provider activated at construction
    pub fn active_provider(&self) -> ProviderKind {
        self.active
    }

    pub fn current_language(&self) -> String {
        self.state.read().language.clone()
    }

    pub fn current_rate(&self) -> u32 {
        self.state.read().rate
    }

    /// Set the session language and speech rate.
    ///
    /// Unsupported language codes fall back to English with a warning.
    pub fn configure(&self, language: &str, rate: u32) {
        let resolved = language::resolve(language);
        let mut state = self.state.write();
        state.language = resolved.to_string();
        state.rate = rate;
    }

    /// Synthesize pre-structured script entries into one narrated file
    pub async fn synthesize_script(
        &self,
        entries: &[RawEntry],
        language: &str,
    ) -> Result<SynthesisResult, SpeechError> {
        let settings = self.config.provider_settings(self.active);
        let normalized = script::normalize_entries(entries, settings)?;
        self.synthesize_entries(&normalized, language).await
    }

    /// Synthesize free text with narrator/character markup
    pub async fn synthesize_text(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesisResult, SpeechError> {
        let settings = self.config.provider_settings(self.active);
        let entries = script::parse_free_text(text, settings);
        if entries.is_empty() {
            return Err(SpeechError::EmptyInput(
                "No valid segments found in script".to_string(),
            ));
        }
        self.synthesize_entries(&entries, language).await
    }

    async fn synthesize_entries(
        &self,
        entries: &[ScriptEntry],
        language: &str,
    ) -> Result<SynthesisResult, SpeechError> {
        let combined = script::combine_text(entries);
        if combined.trim().is_empty() {
            return Err(SpeechError::EmptyInput(
                "Combined transcript is empty".to_string(),
            ));
        }

        let language = language::resolve(language);
        let settings = self.config.provider_settings(self.active);

        // One combined-text call with the narrator voice. Per-entry voice
        // ids survive normalization but are not dispatched individually.
        let request = SynthesisRequest {
            text: combined.clone(),
            language: language.to_string(),
            voice_id: settings.narrator_voice_id.clone(),
            model: self.provider.model_for_language(language).to_string(),
            format: AudioFormat::Mp3,
        };

        info!(
            "Synthesizing {} segments ({} chars) with {}",
            entries.len(),
            combined.chars().count(),
            self.active
        );

        let audio = self.provider.synthesize(&request).await?;

        fs::create_dir_all(&self.config.output_dir)?;
        let base_name = self.generate_base_name();
        let audio_path = self
            .config
            .output_dir
            .join(format!("{}.{}", base_name, request.format.extension()));
        fs::write(&audio_path, &audio)?;
        info!("Audio saved at {}", audio_path.display());

        let transcript_path =
            match self.write_transcript(&base_name, entries, &combined, language) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Failed to write transcript sidecar: {}", e);
                    None
                }
            };

        Ok(SynthesisResult {
            audio,
            audio_path,
            transcript_path,
        })
    }

    fn generate_base_name(&self) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_{}_{}", self.active, timestamp, &suffix[..8])
    }

    fn write_transcript(
        &self,
        base_name: &str,
        entries: &[ScriptEntry],
        combined: &str,
        language: &str,
    ) -> std::io::Result<PathBuf> {
        let path = self
            .config
            .output_dir
            .join(format!("{}_transcript.txt", base_name));
        let rate = self.state.read().rate;

        let mut contents = format!("SCRIPT NARRATION TRANSCRIPT ({})\n", self.active);
        contents.push_str(&"=".repeat(60));
        contents.push_str("\n\n");
        contents.push_str(&format!(
            "Generated: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        contents.push_str(&format!("Provider: {}\n", self.active));
        contents.push_str(&format!("Script Segments: {}\n", entries.len()));
        contents.push_str(&format!("Language: {}\n", language));
        contents.push_str(&format!("Speech Rate: {} WPM\n\n", rate));
        contents.push_str(&format!(
            "Combined Text ({} chars):\n{}\n\n",
            combined.chars().count(),
            combined
        ));
        contents.push_str("Original Structured Script:\n");
        for (index, entry) in entries.iter().enumerate() {
            let role = entry.role.as_str().to_uppercase();
            match &entry.character_name {
                Some(name) => contents.push_str(&format!(
                    "{}. [{}] {}: {}\n",
                    index + 1,
                    role,
                    name,
                    entry.text
                )),
                None => {
                    contents.push_str(&format!("{}. [{}]: {}\n", index + 1, role, entry.text))
                }
            }
        }

        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Statistics for a text at the configured speech rate
    pub fn statistics(&self, text: &str) -> TtsStatistics {
        script::statistics(text, self.state.read().rate)
    }

    /// The active provider's voice catalog.
    ///
    /// Degrades to an empty list when the provider refuses or the call
    /// fails; listing problems never surface as errors.
    pub async fn available_voices(&self) -> Vec<Voice> {
        match self.provider.list_voices().await {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Voice listing failed for {}: {}", self.active, e);
                Vec::new()
            }
        }
    }

    /// Information about a generated audio file
    pub fn audio_info(&self, path: &Path) -> AudioFileInfo {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                let bytes = meta.len();
                AudioFileInfo {
                    exists: true,
                    file_size_bytes: bytes,
                    file_size_mb: (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
                }
            }
            _ => AudioFileInfo {
                exists: false,
                file_size_bytes: 0,
                file_size_mb: 0.0,
            },
        }
    }

    /// Remove files in the output directory older than the threshold.
    ///
    /// A missing directory is a no-op; per-file failures are logged and
    /// skipped. Returns the number of files removed.
    pub fn cleanup_stale_files(&self, max_age_hours: u64) -> usize {
        let dir = &self.config.output_dir;
        if !dir.exists() {
            return 0;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not read output directory {}: {}", dir.display(), e);
                return 0;
            }
        };

        let cutoff = match SystemTime::now()
            .checked_sub(Duration::from_secs(max_age_hours.saturating_mul(3600)))
        {
            Some(cutoff) => cutoff,
            None => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let modified = match entry.metadata().and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Could not stat {}: {}", path.display(), e);
                    continue;
                }
            };

            if modified < cutoff {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Could not remove {}: {}", path.display(), e),
                }
            }
        }

        info!("Cleaned up {} stale audio files", removed);
        removed
    }
}

fn select_provider(
    config: &TtsConfig,
) -> Result<(ProviderKind, Arc<dyn TtsProvider>), SpeechError> {
    let preferred = config.preferred_provider;
    let reason = match probe_provider(preferred, config) {
        ProviderProbe::Ready(provider) => {
            info!("TTS provider '{}' initialized", preferred);
            return Ok((preferred, provider));
        }
        ProviderProbe::Unavailable(reason) => reason,
    };

    let fallback = preferred.other();
    warn!(
        "Preferred provider '{}' unusable ({}), falling back to '{}'",
        preferred, reason, fallback
    );

    match probe_provider(fallback, config) {
        ProviderProbe::Ready(provider) => {
            info!("TTS provider '{}' initialized (fallback)", fallback);
            Ok((fallback, provider))
        }
        ProviderProbe::Unavailable(fallback_reason) => Err(SpeechError::Config(format!(
            "No usable TTS provider: {}: {}; {}: {}",
            preferred, reason, fallback, fallback_reason
        ))),
    }
}

fn probe_provider(kind: ProviderKind, config: &TtsConfig) -> ProviderProbe {
    match kind {
        ProviderKind::Speechify => probe_speechify(config),
        ProviderKind::ElevenLabs => probe_elevenlabs(config),
    }
}

#[cfg(feature = "speechify")]
fn probe_speechify(config: &TtsConfig) -> ProviderProbe {
    use crate::providers::speechify::SpeechifyProvider;

    if !config.speechify.has_credential() {
        return ProviderProbe::Unavailable("SPEECHIFY_API_KEY is not configured".to_string());
    }
    match SpeechifyProvider::new(config.speechify.clone()) {
        Ok(provider) if provider.is_usable() => ProviderProbe::Ready(Arc::new(provider)),
        Ok(_) => ProviderProbe::Unavailable("Speechify credential unusable".to_string()),
        Err(e) => ProviderProbe::Unavailable(e.to_string()),
    }
}

#[cfg(not(feature = "speechify"))]
fn probe_speechify(_config: &TtsConfig) -> ProviderProbe {
    ProviderProbe::Unavailable(
        "speechify support not compiled in (enable the `speechify` feature)".to_string(),
    )
}

#[cfg(feature = "elevenlabs")]
fn probe_elevenlabs(config: &TtsConfig) -> ProviderProbe {
    use crate::providers::elevenlabs::ElevenLabsProvider;

    if !config.elevenlabs.has_credential() {
        return ProviderProbe::Unavailable("ELEVENLABS_API_KEY is not configured".to_string());
    }
    match ElevenLabsProvider::new(config.elevenlabs.clone()) {
        Ok(provider) if provider.is_usable() => ProviderProbe::Ready(Arc::new(provider)),
        Ok(_) => ProviderProbe::Unavailable("ElevenLabs credential unusable".to_string()),
        Err(e) => ProviderProbe::Unavailable(e.to_string()),
    }
}

#[cfg(not(feature = "elevenlabs"))]
fn probe_elevenlabs(_config: &TtsConfig) -> ProviderProbe {
    ProviderProbe::Unavailable(
        "elevenlabs support not compiled in (enable the `elevenlabs` feature)".to_string(),
    )
}
