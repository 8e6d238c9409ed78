//! Script normalization
//!
//! Turns heterogeneous script input (pre-structured entries or raw free
//! text with narrator/character markup) into an ordered list of
//! [`ScriptEntry`] values and a single combined transcript string.

use crate::config::ProviderSettings;
use crate::error::SpeechError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Separator joining entry texts in the combined transcript. The
/// ellipsis is a cue for provider-side pause insertion.
pub const PAUSE_SEPARATOR: &str = " ... ";

/// Narrator text enclosed in brackets at the start of a line
static NARRATOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.*?)\]").expect("narrator pattern"));

/// `Name:` dialogue label, capitalized word optionally followed by more words
static CHARACTER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][a-zA-Z\s]*?):\s*(.+)$").expect("character pattern"));

/// Script line classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Narrator,
    Character,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Narrator => "narrator",
            Role::Character => "character",
        }
    }
}

/// Caller-supplied structured script entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    pub role: String,
    pub description: String,
}

impl RawEntry {
    pub fn new(role: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            description: description.into(),
        }
    }
}

/// A normalized script entry ready for synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub role: Role,
    pub text: String,
    pub character_name: Option<String>,
    pub voice_id: String,
}

/// A classified free-text line, before voice assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub role: Role,
    pub character_name: Option<String>,
    pub text: String,
}

/// Classify one script line. Returns `None` for blank lines.
///
/// Rules, first match wins:
/// 1. `[text]` at the start of the line: narrator, bracket interior
/// 2. `Name: text` with a capitalized label: character dialogue
/// 3. anything else: narrator, whole line
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(captures) = NARRATOR_LINE.captures(line) {
        return Some(ParsedLine {
            role: Role::Narrator,
            character_name: None,
            text: captures[1].trim().to_string(),
        });
    }

    if let Some(captures) = CHARACTER_LINE.captures(line) {
        return Some(ParsedLine {
            role: Role::Character,
            character_name: Some(captures[1].trim().to_string()),
            text: captures[2].trim().to_string(),
        });
    }

    Some(ParsedLine {
        role: Role::Narrator,
        character_name: None,
        text: line.to_string(),
    })
}

/// Normalize pre-structured entries.
///
/// Descriptions are trimmed and empty ones dropped; order is preserved.
/// Fails with [`SpeechError::EmptyInput`] when nothing survives.
pub fn normalize_entries(
    entries: &[RawEntry],
    voices: &ProviderSettings,
) -> Result<Vec<ScriptEntry>, SpeechError> {
    let mut normalized = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let text = entry.description.trim();
        if text.is_empty() {
            debug!("Skipping entry {} with empty description", index + 1);
            continue;
        }

        let role = match entry.role.trim().to_lowercase().as_str() {
            "character" => Role::Character,
            _ => Role::Narrator,
        };

        normalized.push(ScriptEntry {
            role,
            text: text.to_string(),
            character_name: None,
            voice_id: voices.voice_for_role(role).to_string(),
        });
    }

    if normalized.is_empty() {
        return Err(SpeechError::EmptyInput(
            "No valid segments found in script".to_string(),
        ));
    }

    Ok(normalized)
}

/// Parse free text into script entries, one per non-empty line.
pub fn parse_free_text(text: &str, voices: &ProviderSettings) -> Vec<ScriptEntry> {
    text.lines()
        .filter_map(parse_line)
        .map(|line| ScriptEntry {
            voice_id: voices.voice_for_role(line.role).to_string(),
            role: line.role,
            text: line.text,
            character_name: line.character_name,
        })
        .collect()
}

/// Join entry texts into the combined transcript string.
pub fn combine_text(entries: &[ScriptEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join(PAUSE_SEPARATOR)
}

/// Word/character counts and a duration estimate for a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsStatistics {
    pub characters: usize,
    pub words: usize,
    pub estimated_duration_secs: f64,
}

/// Compute statistics for a text at a given speech rate.
///
/// Empty text yields all zeros; a zero rate yields a zero duration.
pub fn statistics(text: &str, rate_wpm: u32) -> TtsStatistics {
    if text.is_empty() {
        return TtsStatistics {
            characters: 0,
            words: 0,
            estimated_duration_secs: 0.0,
        };
    }

    let words = text.split_whitespace().count();
    let characters = text.chars().count();
    let estimated_duration_secs = if rate_wpm == 0 {
        0.0
    } else {
        let seconds = words as f64 / (rate_wpm as f64 / 60.0);
        (seconds * 10.0).round() / 10.0
    };

    TtsStatistics {
        characters,
        words,
        estimated_duration_secs,
    }
}
