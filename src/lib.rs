pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod i18n;
pub mod limiter;
pub mod orchestrator;
pub mod shape;
pub mod store;
pub mod translation;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use content::ContentType;
pub use error::{ProviderError, StoreError, TranslationError};
pub use orchestrator::{BatchResult, TranslationOrchestrator};
