//! ElevenLabs TTS provider (legacy backend)

use crate::config::ProviderSettings;
use crate::error::SpeechError;
use crate::providers::{SynthesisRequest, TtsProvider};
use crate::voices::{Voice, VoiceModel};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub struct ElevenLabsProvider {
    client: Client,
    settings: ProviderSettings,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<ElevenVoice>,
}

#[derive(Debug, Deserialize)]
struct ElevenVoice {
    voice_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    high_quality_base_model_ids: Vec<String>,
}

impl ElevenLabsProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings: ProviderSettings {
                endpoint: settings.endpoint.trim_end_matches('/').to_string(),
                ..settings
            },
        })
    }

    fn api_key(&self) -> Result<&str, SpeechError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SpeechError::Synthesis("ElevenLabs API key not provided".to_string()))
    }
}

#[async_trait]
impl TtsProvider for ElevenLabsProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, SpeechError> {
        let api_key = self.api_key()?;

        let request_body = json!({
            "text": request.text,
            "model_id": request.model,
            "voice_settings": {
                "stability": 0.2,
                "similarity_boost": 0.8,
                "style": 0.4,
                "use_speaker_boost": true,
            },
        });

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.settings.endpoint, request.voice_id
        );
        debug!("ElevenLabs synthesis: voice {}, model {}", request.voice_id, request.model);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("optimize_streaming_latency", "0"),
                ("output_format", "mp3_22050_32"),
            ])
            .header("xi-api-key", api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("ElevenLabs request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Synthesis(format!(
                "ElevenLabs API error ({}): {}",
                status, error_text
            )));
        }

        // Raw MP3 in the body; any chunked transfer is collapsed here
        let audio_bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to read audio response: {}", e)))?;

        Ok(audio_bytes)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let api_key = self.api_key()?;

        let url = format!("{}/v1/voices", self.settings.endpoint);
        let response = self
            .client
            .get(&url)
            .header("xi-api-key", api_key)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("ElevenLabs voice listing failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Synthesis(format!(
                "ElevenLabs voices error ({}): {}",
                status, error_text
            )));
        }

        let listing: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to parse ElevenLabs voices: {}", e)))?;

        let voices = listing
            .voices
            .into_iter()
            .map(|voice| Voice {
                gender: voice.labels.get("gender").cloned().unwrap_or_default(),
                tags: voice
                    .labels
                    .iter()
                    .map(|(key, value)| format!("{}:{}", key, value))
                    .collect(),
                models: voice
                    .high_quality_base_model_ids
                    .into_iter()
                    .map(|model| VoiceModel {
                        name: model,
                        languages: Vec::new(),
                    })
                    .collect(),
                id: voice.voice_id,
                display_name: voice.name,
            })
            .collect();

        Ok(voices)
    }

    fn model_for_language(&self, language: &str) -> &'static str {
        if language == "en" {
            "eleven_turbo_v2"
        } else {
            "eleven_multilingual_v2"
        }
    }

    fn is_usable(&self) -> bool {
        self.settings.has_credential()
    }

    fn name(&self) -> &'static str {
        "elevenlabs"
    }
}
