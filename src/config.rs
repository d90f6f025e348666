//! Configuration surface: supported languages and API call policy.

use serde::{Deserialize, Serialize};

/// A supported target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "ko").
    pub code: &'static str,
    /// Human-readable English name.
    pub name: &'static str,
}

/// Fixed list of target languages the pipeline supports.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "zh", name: "Chinese" },
    Language { code: "es", name: "Spanish" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "ar", name: "Arabic" },
    Language { code: "bn", name: "Bengali" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "ru", name: "Russian" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "pa", name: "Punjabi" },
    Language { code: "de", name: "German" },
    Language { code: "jv", name: "Javanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "fr", name: "French" },
    Language { code: "te", name: "Telugu" },
    Language { code: "mr", name: "Marathi" },
    Language { code: "tr", name: "Turkish" },
    Language { code: "ta", name: "Tamil" },
    Language { code: "vi", name: "Vietnamese" },
    Language { code: "ur", name: "Urdu" },
    Language { code: "it", name: "Italian" },
    Language { code: "th", name: "Thai" },
    Language { code: "pl", name: "Polish" },
    Language { code: "nl", name: "Dutch" },
];

/// Looks up the display name for a language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.code == code)
        .map(|lang| lang.name)
}

/// Returns whether a language code is in the supported list.
pub fn is_supported(code: &str) -> bool {
    language_name(code).is_some()
}

/// Minimum delay between consecutive API calls in milliseconds.
pub const RATE_LIMIT_DELAY_MS: u64 = 500;

/// Maximum number of retry attempts for transient API failures.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name_known() {
        assert_eq!(language_name("ko"), Some("Korean"));
        assert_eq!(language_name("nl"), Some("Dutch"));
    }

    #[test]
    fn test_language_name_unknown() {
        assert_eq!(language_name("xx"), None);
        assert_eq!(language_name(""), None);
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported("es"));
        assert!(!is_supported("tlh"));
    }

    #[test]
    fn test_language_codes_are_unique() {
        let mut codes: Vec<&str> = SUPPORTED_LANGUAGES.iter().map(|l| l.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SUPPORTED_LANGUAGES.len());
    }
}
