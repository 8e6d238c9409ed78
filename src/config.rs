//! Configuration for script narration

use crate::language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Speechify API endpoint
pub const SPEECHIFY_ENDPOINT: &str = "https://api.sia.speechify.com";
/// Default ElevenLabs API endpoint
pub const ELEVENLABS_ENDPOINT: &str = "https://api.elevenlabs.io";

/// TTS provider backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Speechify,
    ElevenLabs,
}

impl ProviderKind {
    /// The fallback partner of this provider
    pub fn other(&self) -> ProviderKind {
        match self {
            ProviderKind::Speechify => ProviderKind::ElevenLabs,
            ProviderKind::ElevenLabs => ProviderKind::Speechify,
        }
    }

    /// Tag used in output file names and transcripts
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Speechify => "speechify",
            ProviderKind::ElevenLabs => "elevenlabs",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speechify" => Ok(ProviderKind::Speechify),
            "elevenlabs" => Ok(ProviderKind::ElevenLabs),
            other => Err(format!(
                "Unknown TTS provider '{}' (expected 'speechify' or 'elevenlabs')",
                other
            )),
        }
    }
}

/// Per-provider settings, loaded once at startup and immutable afterward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API endpoint base URL
    pub endpoint: String,

    /// API key (can be set via environment)
    pub api_key: Option<String>,

    /// Voice used for narrator lines and for the combined request
    pub narrator_voice_id: String,

    /// Voice assigned to character lines during normalization
    pub character_voice_id: String,

    /// Fallback voice
    pub default_voice_id: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ProviderSettings {
    /// Built-in defaults for Speechify
    pub fn speechify_defaults() -> Self {
        Self {
            endpoint: SPEECHIFY_ENDPOINT.to_string(),
            api_key: None,
            narrator_voice_id: "scott".to_string(),
            character_voice_id: "scott".to_string(),
            default_voice_id: "scott".to_string(),
            timeout_secs: 60,
        }
    }

    /// Built-in defaults for ElevenLabs
    pub fn elevenlabs_defaults() -> Self {
        Self {
            endpoint: ELEVENLABS_ENDPOINT.to_string(),
            api_key: None,
            // Adam / Bella stock voices
            narrator_voice_id: "pNInz6obpgDQGcFmaJgB".to_string(),
            character_voice_id: "EXAVITQu4vr4xnSDxMaL".to_string(),
            default_voice_id: "pNInz6obpgDQGcFmaJgB".to_string(),
            timeout_secs: 60,
        }
    }

    /// An empty or all-whitespace key counts as absent
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    /// The voice id for a script role
    pub fn voice_for_role(&self, role: crate::script::Role) -> &str {
        match role {
            crate::script::Role::Narrator => &self.narrator_voice_id,
            crate::script::Role::Character => &self.character_voice_id,
        }
    }

    fn validate(&self, label: &str) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err(format!("{} endpoint cannot be empty", label));
        }

        let parsed = url::Url::parse(&self.endpoint)
            .map_err(|e| format!("{} endpoint is not a valid URL: {}", label, e))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(format!(
                "{} endpoint must be an http(s) URL (got scheme '{}')",
                label,
                parsed.scheme()
            ));
        }

        if self.timeout_secs == 0 {
            return Err(format!("{} timeout must be greater than 0", label));
        }
        if self.timeout_secs > 300 {
            return Err(format!("{} timeout too large (max 300 seconds)", label));
        }

        for (name, voice) in [
            ("narrator", &self.narrator_voice_id),
            ("character", &self.character_voice_id),
            ("default", &self.default_voice_id),
        ] {
            if voice.trim().is_empty() {
                return Err(format!("{} {} voice id cannot be empty", label, name));
            }
            if voice.len() > 256 {
                return Err(format!("{} {} voice id too long (max 256 chars)", label, name));
            }
        }

        Ok(())
    }
}

/// Narration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Preferred provider; the other one is the fallback
    pub preferred_provider: ProviderKind,

    /// Default language code (e.g. "en", "fr-FR")
    pub language: String,

    /// Speech rate in words per minute, used for duration estimates
    pub rate: u32,

    /// Directory for generated audio and transcript files
    pub output_dir: PathBuf,

    /// Age threshold for stale-file cleanup
    pub max_file_age_hours: u64,

    /// Speechify settings
    pub speechify: ProviderSettings,

    /// ElevenLabs settings
    pub elevenlabs: ProviderSettings,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            preferred_provider: ProviderKind::Speechify,
            language: language::DEFAULT_LANGUAGE.to_string(),
            rate: 150,
            output_dir: PathBuf::from("./audio_output"),
            max_file_age_hours: 24,
            speechify: ProviderSettings::speechify_defaults(),
            elevenlabs: ProviderSettings::elevenlabs_defaults(),
        }
    }
}

impl TtsConfig {
    /// Load configuration from the environment, honoring a `.env` file.
    ///
    /// Recognized variables: `TTS_PROVIDER`, `TTS_LANGUAGE`,
    /// `TTS_SPEECH_RATE`, `AUDIO_OUTPUT_DIR`, `MAX_AUDIO_FILE_AGE_HOURS`,
    /// `SPEECHIFY_API_KEY`, `SPEECHIFY_NARRATOR_VOICE_ID`,
    /// `SPEECHIFY_CHARACTER_VOICE_ID`, `ELEVENLABS_API_KEY`,
    /// `ELEVEN_NARRATOR_VOICE_ID`, `ELEVEN_ACTOR_VOICE_ID`.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(provider) = env_var("TTS_PROVIDER") {
            config.preferred_provider = provider.parse()?;
        }
        if let Some(language) = env_var("TTS_LANGUAGE") {
            config.language = language;
        }
        if let Some(rate) = env_var("TTS_SPEECH_RATE") {
            config.rate = rate
                .parse()
                .map_err(|_| format!("TTS_SPEECH_RATE is not a number: '{}'", rate))?;
        }
        if let Some(dir) = env_var("AUDIO_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(hours) = env_var("MAX_AUDIO_FILE_AGE_HOURS") {
            config.max_file_age_hours = hours
                .parse()
                .map_err(|_| format!("MAX_AUDIO_FILE_AGE_HOURS is not a number: '{}'", hours))?;
        }

        config.speechify.api_key = env_var("SPEECHIFY_API_KEY");
        if let Some(voice) = env_var("SPEECHIFY_NARRATOR_VOICE_ID") {
            config.speechify.narrator_voice_id = voice;
        }
        if let Some(voice) = env_var("SPEECHIFY_CHARACTER_VOICE_ID") {
            config.speechify.character_voice_id = voice;
        }

        config.elevenlabs.api_key = env_var("ELEVENLABS_API_KEY");
        if let Some(voice) = env_var("ELEVEN_NARRATOR_VOICE_ID") {
            config.elevenlabs.narrator_voice_id = voice;
        }
        if let Some(voice) = env_var("ELEVEN_ACTOR_VOICE_ID") {
            config.elevenlabs.character_voice_id = voice;
        }

        Ok(config)
    }

    /// The settings block for a provider
    pub fn provider_settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Speechify => &self.speechify,
            ProviderKind::ElevenLabs => &self.elevenlabs,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.language.is_empty() {
            return Err("Language code cannot be empty".to_string());
        }
        if self.language.len() > 32 {
            return Err("Language code too long (max 32 chars)".to_string());
        }
        if !self
            .language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(
                "Language code contains invalid characters (only alphanumeric and '-' allowed)"
                    .to_string(),
            );
        }

        if self.rate == 0 || self.rate > 500 {
            return Err("Speech rate must be between 1 and 500 WPM".to_string());
        }

        // Prevent path traversal in the output directory
        if self.output_dir.to_string_lossy().contains("..") {
            return Err("Output directory path cannot contain '..'".to_string());
        }

        self.speechify.validate("speechify")?;
        self.elevenlabs.validate("elevenlabs")?;

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
