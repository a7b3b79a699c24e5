//! Preview binary - translates a JSON payload without touching a database
//!
//! Usage:
//!   cargo run --bin preview -- <content-type> <lang> <source.json>
//!
//! Languages come from the built-in table. The translated fields are printed
//! as JSON on stdout.
//!
//! Required environment variables:
//! - OPENAI_API_KEY
//!
//! Optional:
//! - OPENAI_MODEL (defaults to gpt-4o-mini)
//! - TRANSLATION_PROVIDER_TIMEOUT_SECS (defaults to 120)

use anyhow::{bail, Context, Result};
use content_translator::config::Config;
use content_translator::i18n::LanguageRegistry;
use content_translator::limiter::Limiter;
use content_translator::orchestrator::TranslationOrchestrator;
use content_translator::store::MemoryTranslationStore;
use content_translator::translation::OpenAiTranslator;
use content_translator::ContentType;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [content_type, language, path] = args.as_slice() else {
        bail!("usage: preview <content-type> <lang> <source.json>");
    };

    let content_type: ContentType = content_type.parse()?;
    let source: Value = serde_json::from_str(
        &fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
    )
    .with_context(|| format!("{} is not valid JSON", path))?;

    let config = Config::from_env()?;
    let orchestrator = TranslationOrchestrator::new(
        Arc::new(OpenAiTranslator::new(reqwest::Client::new(), &config)),
        Arc::new(LanguageRegistry::builtin()),
        Arc::new(MemoryTranslationStore::new()),
        Limiter::new(1)?,
    )
    .with_provider_timeout(config.provider_timeout());

    info!("Previewing {} translation into {}", content_type, language);
    let translated = orchestrator
        .translate_one(language, content_type, 0, &source)
        .await?;

    println!("{}", serde_json::to_string_pretty(&translated)?);
    Ok(())
}
