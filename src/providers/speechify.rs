//! Speechify TTS provider

use crate::config::ProviderSettings;
use crate::error::SpeechError;
use crate::providers::{SynthesisRequest, TtsProvider};
use crate::voices::Voice;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub struct SpeechifyProvider {
    client: Client,
    settings: ProviderSettings,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    audio_data: String,
}

impl SpeechifyProvider {
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
            .ok_or_else(|| SpeechError::Synthesis("Speechify API key not provided".to_string()))
    }
}

#[async_trait]
impl TtsProvider for SpeechifyProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, SpeechError> {
        let api_key = self.api_key()?;

        let request_body = json!({
            "input": request.text,
            "voice_id": request.voice_id,
            "language": request.language,
            "model": request.model,
            "audio_format": request.format.as_str(),
            "options": {
                "loudness_normalization": true,
                "text_normalization": true,
            },
        });

        let url = format!("{}/v1/audio/speech", self.settings.endpoint);
        debug!("Speechify synthesis: voice {}, model {}", request.voice_id, request.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Speechify request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Synthesis(format!(
                "Speechify API error ({}): {}",
                status, error_text
            )));
        }

        let speech: SpeechResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to parse Speechify response: {}", e)))?;

        // Audio arrives base64-encoded in the JSON body
        let audio_bytes = general_purpose::STANDARD
            .decode(&speech.audio_data)
            .map_err(|e| SpeechError::Synthesis(format!("Failed to decode base64 audio: {}", e)))?;

        Ok(Bytes::from(audio_bytes))
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let api_key = self.api_key()?;

        let url = format!("{}/v1/voices", self.settings.endpoint);
        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Speechify voice listing failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Synthesis(format!(
                "Speechify voices error ({}): {}",
                status, error_text
            )));
        }

        let voices: Vec<Voice> = response
            .json()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to parse Speechify voices: {}", e)))?;

        Ok(voices)
    }

    fn model_for_language(&self, language: &str) -> &'static str {
        if language == "en" {
            "simba-english"
        } else {
            "simba-multilingual"
        }
    }

    fn is_usable(&self) -> bool {
        self.settings.has_credential()
    }

    fn name(&self) -> &'static str {
        "speechify"
    }
}
