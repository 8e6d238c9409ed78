//! Voice catalog types and filtering

use serde::{Deserialize, Serialize};

/// A voice offered by a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub display_name: String,
    pub gender: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub models: Vec<VoiceModel>,
}

/// A synthesis model a voice is available in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceModel {
    pub name: String,
    #[serde(default)]
    pub languages: Vec<VoiceLanguage>,
}

/// A language a voice model supports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceLanguage {
    pub locale: String,
}

/// Catalog filter; all set fields must match (AND semantics)
#[derive(Debug, Clone, Default)]
pub struct VoiceFilter {
    /// e.g. "male", "female"; compared case-insensitively
    pub gender: Option<String>,
    /// e.g. "en-US"; matched against every model's languages
    pub locale: Option<String>,
    /// e.g. ["timbre:deep"]; every tag must be present
    pub tags: Option<Vec<String>>,
}

impl VoiceFilter {
    fn matches(&self, voice: &Voice) -> bool {
        if let Some(ref gender) = self.gender {
            if !voice.gender.eq_ignore_ascii_case(gender) {
                return false;
            }
        }

        if let Some(ref locale) = self.locale {
            let has_locale = voice.models.iter().any(|model| {
                model.languages.iter().any(|lang| &lang.locale == locale)
            });
            if !has_locale {
                return false;
            }
        }

        if let Some(ref tags) = self.tags {
            if !tags.iter().all(|tag| voice.tags.contains(tag)) {
                return false;
            }
        }

        true
    }
}

/// Flatten the model names of every voice matching the filter.
///
/// An empty filter selects all models of all voices.
pub fn filter_voice_models(voices: &[Voice], filter: &VoiceFilter) -> Vec<String> {
    voices
        .iter()
        .filter(|voice| filter.matches(voice))
        .flat_map(|voice| voice.models.iter().map(|model| model.name.clone()))
        .collect()
}
