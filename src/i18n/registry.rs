//! Language registry: the languages content can be translated into.
//!
//! [`LanguageDirectory`] is the lookup contract the orchestrator depends on.
//! Two implementations exist: the built-in [`LanguageRegistry`] defined here
//! (used by the preview binary and tests) and the `languages` table behind
//! [`crate::db::Database`].

use crate::error::StoreError;
use crate::i18n::Language;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::OnceLock;

/// Resolves language codes to languages.
pub trait LanguageDirectory: Send + Sync {
    /// Look up one language code.
    fn resolve<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Option<Language>, StoreError>>;

    /// Look up many codes in one call. Unknown codes are silently omitted.
    fn resolve_many<'a>(
        &'a self,
        codes: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Language>, StoreError>>;
}

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "fa")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Persian")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "فارسی")
    pub native_name: &'static str,

    /// Whether this is the default authoring language (only one should be true)
    pub is_default: bool,

    /// Whether this language is enabled for use
    pub enabled: bool,
}

impl LanguageConfig {
    fn to_language(&self) -> Language {
        Language::new(self.code, self.name, self.native_name)
    }
}

/// In-memory language registry.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Build a registry from an explicit language list.
    pub fn new(languages: Vec<LanguageConfig>) -> Self {
        Self { languages }
    }

    /// A registry holding the built-in languages.
    pub fn builtin() -> Self {
        Self::new(default_languages())
    }

    /// Get the global built-in registry.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(LanguageRegistry::builtin)
    }

    /// Get a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get all enabled languages.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    fn lookup(&self, code: &str) -> Option<Language> {
        self.get_by_code(code)
            .filter(|lang| lang.enabled)
            .map(LanguageConfig::to_language)
    }
}

impl LanguageDirectory for LanguageRegistry {
    fn resolve<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Option<Language>, StoreError>> {
        async move { Ok(self.lookup(code)) }.boxed()
    }

    fn resolve_many<'a>(
        &'a self,
        codes: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Language>, StoreError>> {
        async move { Ok(codes.iter().filter_map(|code| self.lookup(code)).collect()) }.boxed()
    }
}

/// Built-in language configurations.
fn default_languages() -> Vec<LanguageConfig> {
    let entry = |code, name, native_name| LanguageConfig {
        code,
        name,
        native_name,
        is_default: false,
        enabled: true,
    };

    vec![
        LanguageConfig {
            is_default: true,
            ..entry("en", "English", "English")
        },
        entry("ar", "Arabic", "العربية"),
        entry("fa", "Persian", "فارسی"),
        entry("fr", "French", "Français"),
        entry("de", "German", "Deutsch"),
        entry("es", "Spanish", "Español"),
        entry("it", "Italian", "Italiano"),
        entry("pt", "Portuguese", "Português"),
        entry("tr", "Turkish", "Türkçe"),
        entry("ru", "Russian", "Русский"),
    ]
}
