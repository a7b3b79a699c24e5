//! Content-authoring flows built on the orchestrator.
//!
//! These are the callers the orchestrator expects: they check that the content
//! item exists, own the default translation, and refuse to translate over
//! existing rows before any batch starts.

use crate::content::ContentType;
use crate::error::TranslationError;
use crate::orchestrator::{BatchResult, TranslationOrchestrator};
use crate::store::{NewTranslation, TranslationRecord, TranslationStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct TranslationWorkflow {
    store: Arc<dyn TranslationStore>,
    orchestrator: Arc<TranslationOrchestrator>,
}

impl TranslationWorkflow {
    pub fn new(store: Arc<dyn TranslationStore>, orchestrator: Arc<TranslationOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Store the default translation of a new content item, then translate it.
    ///
    /// The default language is removed from `translate_to` if present. Every
    /// batch check runs before the default row is written, so an error leaves
    /// no rows behind. The batch runs to completion before this returns.
    pub async fn create_with_translations(
        &self,
        content_type: ContentType,
        content_id: i64,
        default_language: &str,
        fields: &Value,
        translate_to: &[String],
    ) -> Result<(TranslationRecord, BatchResult), TranslationError> {
        self.require_content(content_type, content_id).await?;

        let targets: Vec<String> = dedupe(translate_to)
            .into_iter()
            .filter(|code| code != default_language)
            .collect();

        let mut all = vec![default_language.to_string()];
        all.extend(targets.iter().cloned());
        self.ensure_languages_exist(&all).await?;

        let default_fields = content_type
            .descriptor()
            .shape
            .conform(fields)
            .map_err(TranslationError::InvalidSource)?;

        let batch = self
            .orchestrator
            .prepare_batch(&targets, content_type, content_id, fields)
            .await?;

        let record = self
            .store
            .insert_translation(NewTranslation {
                content_type,
                owner_id: content_id,
                language_code: default_language,
                fields: &default_fields,
                is_default: true,
            })
            .await?;
        info!(
            "Stored default {} translation for {} {}",
            default_language, content_type, content_id
        );

        let result = self.orchestrator.run_batch(batch).await;
        Ok((record, result))
    }

    /// Translate an existing content item from its default translation.
    ///
    /// # Errors
    /// * `ContentNotFound` - no such content item
    /// * `TranslationsExist` - some requested languages are already translated
    /// * `DefaultTranslationMissing` - nothing to translate from
    pub async fn auto_translate(
        &self,
        content_type: ContentType,
        content_id: i64,
        translate_to: &[String],
    ) -> Result<BatchResult, TranslationError> {
        self.require_content(content_type, content_id).await?;

        let targets = dedupe(translate_to);
        self.ensure_languages_exist(&targets).await?;

        let existing = self
            .store
            .existing_languages(content_type, content_id, &targets)
            .await?;
        if !existing.is_empty() {
            return Err(TranslationError::TranslationsExist(existing));
        }

        let default = self
            .store
            .find_default_translation(content_type, content_id)
            .await?
            .ok_or_else(|| TranslationError::DefaultTranslationMissing {
                content_type: content_type.to_string(),
                id: content_id,
            })?;

        self.orchestrator
            .translate_to_languages(&targets, content_type, content_id, &default.fields.into_value())
            .await
    }

    /// Delete one non-default translation.
    pub async fn remove_translation(
        &self,
        content_type: ContentType,
        content_id: i64,
        language_code: &str,
    ) -> Result<(), TranslationError> {
        let record = self
            .store
            .find_translation(content_type, content_id, language_code)
            .await?
            .ok_or_else(|| TranslationError::TranslationNotFound {
                content_type: content_type.to_string(),
                id: content_id,
                language_code: language_code.to_string(),
            })?;

        if record.is_default {
            return Err(TranslationError::DefaultTranslationProtected);
        }

        self.store
            .delete_translation(content_type, content_id, language_code)
            .await?;
        info!(
            "Removed {} translation of {} {}",
            language_code, content_type, content_id
        );
        Ok(())
    }

    /// All translations of a content item.
    pub async fn translations(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<Vec<TranslationRecord>, TranslationError> {
        Ok(self.store.list_translations(content_type, content_id).await?)
    }

    async fn require_content(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<(), TranslationError> {
        if self.store.content_exists(content_type, content_id).await? {
            Ok(())
        } else {
            Err(TranslationError::ContentNotFound {
                content_type: content_type.to_string(),
                id: content_id,
            })
        }
    }

    async fn ensure_languages_exist(&self, codes: &[String]) -> Result<(), TranslationError> {
        if codes.is_empty() {
            return Ok(());
        }

        let found = self.orchestrator.languages().resolve_many(codes).await?;
        let missing: Vec<String> = codes
            .iter()
            .filter(|code| !found.iter().any(|lang| lang.code() == code.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TranslationError::UnknownLanguages(missing))
        }
    }
}

/// Drop repeated codes, keeping first occurrences in order.
fn dedupe(codes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        if !out.contains(code) {
            out.push(code.clone());
        }
    }
    out
}
