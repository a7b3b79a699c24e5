//! Internationalization (i18n) module.
//!
//! # Architecture
//!
//! - `registry`: the `LanguageDirectory` lookup contract and the built-in language table
//! - `language`: the resolved `Language` value and language-code validation
//! - `validator`: markup-preservation checks on translated payloads
//! - `metrics`: translation observability counters
//!
//! # Example
//!
//! ```rust,ignore
//! use content_translator::i18n::{LanguageDirectory, LanguageRegistry};
//!
//! let persian = LanguageRegistry::get().resolve("fa").await?;
//! let resolved = LanguageRegistry::get().resolve_many(&codes).await?;
//! ```

mod language;
mod metrics;
mod registry;
mod validator;

pub use language::{is_valid_code, Language};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageDirectory, LanguageRegistry};
pub use validator::{MarkupValidator, ValidationReport};
