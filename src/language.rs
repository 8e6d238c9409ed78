//! Supported languages for synthesis

use tracing::warn;

/// Language used when a requested code is unsupported
pub const DEFAULT_LANGUAGE: &str = "en";

/// A supported language code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub beta: bool,
}

/// Languages accepted by both providers. Regional variants beyond the
/// first block are in provider beta.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "en", beta: false },
    Language { code: "fr-FR", beta: false },
    Language { code: "de-DE", beta: false },
    Language { code: "es-ES", beta: false },
    Language { code: "pt-BR", beta: false },
    Language { code: "pt-PT", beta: false },
    Language { code: "ar-AE", beta: true },
    Language { code: "da-DK", beta: true },
    Language { code: "nl-NL", beta: true },
    Language { code: "et-EE", beta: true },
    Language { code: "fi-FI", beta: true },
    Language { code: "el-GR", beta: true },
    Language { code: "he-IL", beta: true },
    Language { code: "hi-IN", beta: true },
    Language { code: "it-IT", beta: true },
    Language { code: "ja-JP", beta: true },
    Language { code: "nb-NO", beta: true },
    Language { code: "pl-PL", beta: true },
    Language { code: "ru-RU", beta: true },
    Language { code: "sv-SE", beta: true },
    Language { code: "tr-TR", beta: true },
    Language { code: "uk-UA", beta: true },
    Language { code: "vi-VN", beta: true },
];

/// Whether a language code is in the supported set
pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|lang| lang.code == code)
}

/// Resolve a requested language code to a supported one.
///
/// Unsupported codes fall back to [`DEFAULT_LANGUAGE`] with a warning;
/// this never fails.
pub fn resolve(code: &str) -> &'static str {
    match SUPPORTED_LANGUAGES.iter().find(|lang| lang.code == code) {
        Some(lang) => lang.code,
        None => {
            warn!("Language '{}' not supported, using '{}'", code, DEFAULT_LANGUAGE);
            DEFAULT_LANGUAGE
        }
    }
}
