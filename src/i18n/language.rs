//! Language type: a resolved, validated target language.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static CODE_REGEX: OnceLock<Regex> = OnceLock::new();

/// A language known to a [`crate::i18n::LanguageDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "fa")
    code: String,
    /// English display name, used in provider prompts
    name: String,
    native_name: String,
}

impl Language {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        native_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            native_name: native_name.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native_name(&self) -> &str {
        &self.native_name
    }
}

/// Check that a code is exactly two lowercase ASCII letters.
pub fn is_valid_code(code: &str) -> bool {
    CODE_REGEX
        .get_or_init(|| Regex::new(r"^[a-z]{2}$").expect("static regex"))
        .is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("en"));
        assert!(is_valid_code("fa"));
        assert!(!is_valid_code("EN"));
        assert!(!is_valid_code("eng"));
        assert!(!is_valid_code("e"));
        assert!(!is_valid_code("pt-BR"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_accessors() {
        let fa = Language::new("fa", "Persian", "فارسی");
        assert_eq!(fa.code(), "fa");
        assert_eq!(fa.name(), "Persian");
        assert_eq!(fa.native_name(), "فارسی");
    }

    #[test]
    fn test_language_serializes_with_private_fields() {
        let json = serde_json::to_value(Language::new("de", "German", "Deutsch")).unwrap();
        assert_eq!(json["code"], "de");
        assert_eq!(json["native_name"], "Deutsch");
    }
}
