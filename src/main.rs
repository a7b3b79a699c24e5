//! Auto-translate one content item into a list of languages.
//!
//! Usage:
//!   content-translator <content-type> <content-id> <lang>[,<lang>...]
//!
//! Translations are made from the item's default translation and written to
//! Postgres. The batch result is printed as JSON on stdout.
//!
//! Required environment variables:
//! - OPENAI_API_KEY
//! - DATABASE_URL

use anyhow::{bail, Context, Result};
use content_translator::config::Config;
use content_translator::db::Database;
use content_translator::i18n::{LanguageRegistry, TranslationMetrics};
use content_translator::orchestrator::TranslationOrchestrator;
use content_translator::translation::OpenAiTranslator;
use content_translator::workflow::TranslationWorkflow;
use content_translator::ContentType;
use std::sync::Arc;
use tracing::{info, warn};

struct Args {
    content_type: ContentType,
    content_id: i64,
    languages: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 3 {
        bail!("usage: content-translator <content-type> <content-id> <lang>[,<lang>...]");
    }

    Ok(Args {
        content_type: args[0].parse()?,
        content_id: args[1]
            .parse()
            .with_context(|| format!("invalid content id '{}'", args[1]))?,
        languages: args[2]
            .split(',')
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = Config::from_env()?;

    let db = Arc::new(
        Database::connect(config.require_database_url()?, config.database_max_connections)
            .await
            .context("Failed to connect to database")?,
    );
    db.ensure_schema().await.context("Failed to prepare schema")?;
    db.seed_languages(LanguageRegistry::get())
        .await
        .context("Failed to seed languages")?;

    let translator = Arc::new(OpenAiTranslator::new(reqwest::Client::new(), &config));
    let orchestrator = TranslationOrchestrator::from_config(&config, translator, db.clone(), db.clone())?;
    let workflow = TranslationWorkflow::new(db, Arc::new(orchestrator));

    info!(
        "Auto-translating {} {} into {}",
        args.content_type,
        args.content_id,
        args.languages.join(", ")
    );
    let result = workflow
        .auto_translate(args.content_type, args.content_id, &args.languages)
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    let report = TranslationMetrics::global().report();
    info!(
        "Provider calls: {} ({:.0}% ok), rows written: {}",
        report.api_calls, report.api_success_rate, report.persisted
    );

    if !result.is_complete() {
        warn!(
            "{} language(s) failed: {}",
            result.failed.len(),
            result.failed_codes().join(", ")
        );
        std::process::exit(2);
    }

    Ok(())
}
