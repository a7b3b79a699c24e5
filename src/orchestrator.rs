//! Multi-language translation fan-out.
//!
//! A batch takes one content item's source fields and a list of target
//! languages. After pre-flight checks, every language becomes a
//! [`TranslationJob`]; all jobs run concurrently, each gated by the shared
//! [`Limiter`], and the batch waits for every one of them to finish. A job
//! that fails is recorded in [`BatchResult::failed`] and never affects its
//! siblings.

use crate::config::Config;
use crate::content::ContentType;
use crate::error::{ProviderError, StoreError, TranslationError};
use crate::i18n::{is_valid_code, Language, LanguageDirectory, TranslationMetrics};
use crate::limiter::{Limiter, LimiterError};
use crate::shape::TranslationFields;
use crate::store::{NewTranslation, TranslationStore};
use crate::translation::{TranslationRequest, Translator};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// One (content item, target language) unit of work within a batch.
#[derive(Debug, Clone)]
pub struct TranslationJob<'a> {
    pub content_type: ContentType,
    pub content_id: i64,
    pub language: Language,
    pub source: &'a TranslationFields,
}

/// A language that was translated and persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedLanguage {
    pub language_code: String,
    pub fields: TranslationFields,
}

/// Where in its lifecycle a job failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Permit,
    Provider,
    Persist,
}

/// A language that did not make it through.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedLanguage {
    pub language_code: String,
    pub stage: JobStage,
    pub reason: String,
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(TranslatedLanguage),
    Failed(FailedLanguage),
}

#[derive(Debug, thiserror::Error)]
enum JobError {
    #[error("{0}")]
    Permit(LimiterError),

    #[error("{0}")]
    Provider(ProviderError),

    #[error("{0}")]
    Persist(StoreError),
}

impl JobError {
    fn stage(&self) -> JobStage {
        match self {
            JobError::Permit(_) => JobStage::Permit,
            JobError::Provider(_) => JobStage::Provider,
            JobError::Persist(_) => JobStage::Persist,
        }
    }
}

/// Outcome of one batch.
///
/// Every requested language appears in exactly one of `succeeded` or `failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub requested: Vec<String>,
    pub succeeded: Vec<TranslatedLanguage>,
    pub failed: Vec<FailedLanguage>,
}

impl BatchResult {
    fn from_outcomes(requested: Vec<String>, outcomes: Vec<JobOutcome>) -> Self {
        let mut result = BatchResult {
            requested,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                JobOutcome::Succeeded(done) => result.succeeded.push(done),
                JobOutcome::Failed(failed) => result.failed.push(failed),
            }
        }
        result
    }

    /// True when no job failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded_codes(&self) -> Vec<&str> {
        self.succeeded.iter().map(|s| s.language_code.as_str()).collect()
    }

    pub fn failed_codes(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.language_code.as_str()).collect()
    }
}

/// A batch that passed every pre-flight check and has not started.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    content_type: ContentType,
    content_id: i64,
    requested: Vec<String>,
    languages: Vec<Language>,
    source: TranslationFields,
}

/// Runs translation batches against a provider, a language directory and a store.
pub struct TranslationOrchestrator {
    translator: Arc<dyn Translator>,
    languages: Arc<dyn LanguageDirectory>,
    store: Arc<dyn TranslationStore>,
    limiter: Limiter,
    provider_timeout: Option<Duration>,
    permit_timeout: Option<Duration>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator without timeouts.
    pub fn new(
        translator: Arc<dyn Translator>,
        languages: Arc<dyn LanguageDirectory>,
        store: Arc<dyn TranslationStore>,
        limiter: Limiter,
    ) -> Self {
        Self {
            translator,
            languages,
            store,
            limiter,
            provider_timeout: None,
            permit_timeout: None,
        }
    }

    /// Create an orchestrator with the limiter and timeouts from `config`.
    pub fn from_config(
        config: &Config,
        translator: Arc<dyn Translator>,
        languages: Arc<dyn LanguageDirectory>,
        store: Arc<dyn TranslationStore>,
    ) -> Result<Self, TranslationError> {
        let limiter = Limiter::new(config.translation_concurrency)?;
        Ok(Self::new(translator, languages, store, limiter)
            .with_provider_timeout(config.provider_timeout())
            .with_permit_timeout(config.permit_timeout()))
    }

    pub fn with_provider_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_permit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.permit_timeout = timeout;
        self
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    pub fn languages(&self) -> &dyn LanguageDirectory {
        self.languages.as_ref()
    }

    /// Translate into a single language without persisting.
    ///
    /// # Returns
    /// The translated, shape-valid fields, or the first error hit.
    pub async fn translate_one(
        &self,
        language_code: &str,
        content_type: ContentType,
        content_id: i64,
        source: &Value,
    ) -> Result<TranslationFields, TranslationError> {
        if !is_valid_code(language_code) {
            return Err(TranslationError::InvalidLanguageCode(
                language_code.to_string(),
            ));
        }

        let language = self
            .languages
            .resolve(language_code)
            .await?
            .ok_or_else(|| TranslationError::LanguageNotFound(language_code.to_string()))?;

        let fields = content_type
            .descriptor()
            .shape
            .conform(source)
            .map_err(TranslationError::InvalidSource)?;

        debug!(
            "Translating {} {} into {} ({})",
            content_type,
            content_id,
            language.name(),
            language.code()
        );

        let _permit = self.limiter.acquire_timeout(self.permit_timeout).await?;
        self.call_provider(content_type, &language, &fields)
            .await
            .map_err(|e| match e {
                ProviderError::Timeout(limit) => TranslationError::Timeout(limit),
                other => TranslationError::Provider(other),
            })
    }

    /// Translate one content item into many languages and persist each result.
    ///
    /// Fails only before fan-out: malformed, duplicate or unknown language
    /// codes, source fields that do not fit the content type, or a language
    /// lookup error. Once jobs start, every failure is per language.
    pub async fn translate_to_languages(
        &self,
        language_codes: &[String],
        content_type: ContentType,
        content_id: i64,
        source: &Value,
    ) -> Result<BatchResult, TranslationError> {
        let batch = self
            .prepare_batch(language_codes, content_type, content_id, source)
            .await?;
        Ok(self.run_batch(batch).await)
    }

    /// Run every pre-flight check of [`Self::translate_to_languages`] without
    /// starting any job.
    ///
    /// Callers that write something before the batch runs prepare first, so a
    /// rejected batch leaves nothing behind.
    pub async fn prepare_batch(
        &self,
        language_codes: &[String],
        content_type: ContentType,
        content_id: i64,
        source: &Value,
    ) -> Result<PreparedBatch, TranslationError> {
        if language_codes.is_empty() {
            return Ok(PreparedBatch {
                content_type,
                content_id,
                requested: Vec::new(),
                languages: Vec::new(),
                source: TranslationFields::default(),
            });
        }

        validate_codes(language_codes)?;

        let source = content_type
            .descriptor()
            .shape
            .conform(source)
            .map_err(TranslationError::InvalidSource)?;

        let languages = self.resolve_all(language_codes).await?;

        Ok(PreparedBatch {
            content_type,
            content_id,
            requested: language_codes.to_vec(),
            languages,
            source,
        })
    }

    /// Fan a prepared batch out and wait for every job.
    pub async fn run_batch(&self, batch: PreparedBatch) -> BatchResult {
        if batch.requested.is_empty() {
            return BatchResult::default();
        }

        let PreparedBatch {
            content_type,
            content_id,
            requested,
            languages,
            source,
        } = batch;

        TranslationMetrics::global().record_batch();
        info!(
            "Translating {} {} into {} language(s): {}",
            content_type,
            content_id,
            languages.len(),
            requested.join(", ")
        );

        let jobs = languages.into_iter().map(|language| TranslationJob {
            content_type,
            content_id,
            language,
            source: &source,
        });
        let outcomes = join_all(jobs.map(|job| self.run_job(job))).await;

        let result = BatchResult::from_outcomes(requested, outcomes);
        info!(
            "Finished {} {}: {} succeeded, {} failed",
            content_type,
            content_id,
            result.succeeded.len(),
            result.failed.len()
        );

        result
    }

    /// Resolve every code, in request order, or fail listing the unknown ones.
    async fn resolve_all(&self, codes: &[String]) -> Result<Vec<Language>, TranslationError> {
        let resolved = self.languages.resolve_many(codes).await?;

        let mut languages = Vec::with_capacity(codes.len());
        let mut missing = Vec::new();
        for code in codes {
            match resolved.iter().find(|lang| lang.code() == code) {
                Some(lang) => languages.push(lang.clone()),
                None => missing.push(code.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(TranslationError::UnknownLanguages(missing));
        }
        Ok(languages)
    }

    async fn run_job(&self, job: TranslationJob<'_>) -> JobOutcome {
        let language_code = job.language.code().to_string();

        match self.execute(&job).await {
            Ok(fields) => {
                info!(
                    "Translated {} {} into {}",
                    job.content_type, job.content_id, language_code
                );
                JobOutcome::Succeeded(TranslatedLanguage {
                    language_code,
                    fields,
                })
            }
            Err(e) => {
                error!(
                    "Failed to translate {} {} into {}: {}",
                    job.content_type, job.content_id, language_code, e
                );
                JobOutcome::Failed(FailedLanguage {
                    language_code,
                    stage: e.stage(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Permit, provider call, persistence. The permit is held until this returns.
    async fn execute(&self, job: &TranslationJob<'_>) -> Result<TranslationFields, JobError> {
        let _permit = self
            .limiter
            .acquire_timeout(self.permit_timeout)
            .await
            .map_err(JobError::Permit)?;

        let fields = self
            .call_provider(job.content_type, &job.language, job.source)
            .await
            .map_err(JobError::Provider)?;

        let metrics = TranslationMetrics::global();
        match self
            .store
            .insert_translation(NewTranslation {
                content_type: job.content_type,
                owner_id: job.content_id,
                language_code: job.language.code(),
                fields: &fields,
                is_default: false,
            })
            .await
        {
            Ok(record) => {
                metrics.record_persisted();
                Ok(record.fields)
            }
            Err(e) => {
                metrics.record_persist_failure();
                Err(JobError::Persist(e))
            }
        }
    }

    async fn call_provider(
        &self,
        content_type: ContentType,
        language: &Language,
        fields: &TranslationFields,
    ) -> Result<TranslationFields, ProviderError> {
        let metrics = TranslationMetrics::global();
        metrics.record_api_call();

        let request = TranslationRequest {
            content_type,
            language,
            fields,
        };
        let result = match self.provider_timeout {
            Some(limit) => tokio::time::timeout(limit, self.translator.translate(request))
                .await
                .unwrap_or(Err(ProviderError::Timeout(limit))),
            None => self.translator.translate(request).await,
        };

        if result.is_err() {
            metrics.record_api_failure();
        }
        result
    }
}

/// Reject malformed and repeated codes.
fn validate_codes(codes: &[String]) -> Result<(), TranslationError> {
    let mut seen = HashSet::new();
    for code in codes {
        if !is_valid_code(code) {
            return Err(TranslationError::InvalidLanguageCode(code.clone()));
        }
        if !seen.insert(code.as_str()) {
            return Err(TranslationError::DuplicateLanguage(code.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LanguageRegistry;
    use crate::store::MemoryTranslationStore;
    use crate::testing::{codes, FakeTranslator};
    use serde_json::json;
    use serial_test::serial;
    use std::sync::atomic::Ordering;

    fn setup(
        translator: Arc<FakeTranslator>,
        capacity: usize,
    ) -> (TranslationOrchestrator, Arc<MemoryTranslationStore>) {
        let store = Arc::new(MemoryTranslationStore::new());
        store.register_content(ContentType::Article, 7);
        store.register_content(ContentType::Project, 7);
        let orchestrator = TranslationOrchestrator::new(
            translator,
            Arc::new(LanguageRegistry::builtin()),
            store.clone(),
            Limiter::new(capacity).unwrap(),
        );
        (orchestrator, store)
    }

    fn source() -> Value {
        json!({ "name": "Hello", "content": "<p>World</p>" })
    }

    // ==================== translate_to_languages Tests ====================

    #[tokio::test]
    #[serial]
    async fn test_batch_translates_and_persists_every_language() {
        let (orchestrator, store) = setup(Arc::new(FakeTranslator::default()), 10);

        let result = orchestrator
            .translate_to_languages(&codes(&["fr", "de"]), ContentType::Article, 7, &source())
            .await
            .expect("batch should start");

        assert!(result.is_complete());
        assert_eq!(result.requested, codes(&["fr", "de"]));
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(store.len(), 2);

        let de = store
            .find_translation(ContentType::Article, 7, "de")
            .await
            .unwrap()
            .expect("de row");
        assert_eq!(de.fields.text("name"), Some("[de] Hello"));
        assert!(!de.is_default);
    }

    #[tokio::test(start_paused = true)]
    #[serial]
    async fn test_concurrency_never_exceeds_capacity() {
        let translator = Arc::new(FakeTranslator::with_delay(Duration::from_millis(100)));
        let (orchestrator, _store) = setup(translator.clone(), 2);

        let start = tokio::time::Instant::now();
        let result = orchestrator
            .translate_to_languages(
                &codes(&["fr", "de", "es", "it", "pt"]),
                ContentType::Article,
                7,
                &source(),
            )
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(result.succeeded.len(), 5);
        assert_eq!(translator.max_in_flight.load(Ordering::SeqCst), 2);
        // ceil(5 / 2) rounds of 100ms
        assert!(elapsed >= Duration::from_millis(300), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "{:?}", elapsed);
        assert_eq!(orchestrator.limiter().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    #[serial]
    async fn test_concurrent_batches_share_the_limiter() {
        let translator = Arc::new(FakeTranslator::with_delay(Duration::from_millis(100)));
        let (orchestrator, store) = setup(translator.clone(), 2);
        store.register_content(ContentType::Article, 8);

        let first = codes(&["fr", "de", "es"]);
        let second = codes(&["it", "pt", "tr"]);
        let (source_a, source_b) = (source(), source());
        let (a, b) = tokio::join!(
            orchestrator.translate_to_languages(&first, ContentType::Article, 7, &source_a),
            orchestrator.translate_to_languages(&second, ContentType::Article, 8, &source_b),
        );

        assert!(a.unwrap().is_complete());
        assert!(b.unwrap().is_complete());
        assert_eq!(translator.max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(store.len(), 6);
        assert_eq!(orchestrator.limiter().available(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_prepare_batch_starts_nothing() {
        let translator = Arc::new(FakeTranslator::default());
        let (orchestrator, store) = setup(translator.clone(), 2);

        let batch = orchestrator
            .prepare_batch(&codes(&["fr", "de"]), ContentType::Article, 7, &source())
            .await
            .unwrap();
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
        assert!(store.is_empty());

        let result = orchestrator.run_batch(batch).await;
        assert_eq!(result.requested, codes(&["fr", "de"]));
        assert_eq!(result.succeeded_codes(), vec!["fr", "de"]);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_provider_failure_is_isolated_and_releases_permit() {
        let translator = Arc::new(FakeTranslator::failing_for(vec!["de"]));
        let (orchestrator, store) = setup(translator, 3);

        let result = orchestrator
            .translate_to_languages(&codes(&["fr", "de", "es"]), ContentType::Article, 7, &source())
            .await
            .unwrap();

        assert_eq!(result.failed_codes(), vec!["de"]);
        assert_eq!(result.failed[0].stage, JobStage::Provider);
        assert!(result.failed[0].reason.contains("provider refused de"));
        let mut ok = result.succeeded_codes();
        ok.sort();
        assert_eq!(ok, vec!["es", "fr"]);
        assert_eq!(store.len(), 2);
        assert_eq!(orchestrator.limiter().available(), 3);
    }

    #[tokio::test]
    #[serial]
    async fn test_existing_translation_fails_only_that_language() {
        let (orchestrator, store) = setup(Arc::new(FakeTranslator::default()), 10);
        let existing = TranslationFields::default();
        store
            .insert_translation(NewTranslation {
                content_type: ContentType::Article,
                owner_id: 7,
                language_code: "fr",
                fields: &existing,
                is_default: false,
            })
            .await
            .unwrap();

        let result = orchestrator
            .translate_to_languages(&codes(&["fr", "de"]), ContentType::Article, 7, &source())
            .await
            .unwrap();

        assert_eq!(result.failed_codes(), vec!["fr"]);
        assert_eq!(result.failed[0].stage, JobStage::Persist);
        assert_eq!(result.succeeded_codes(), vec!["de"]);
        assert!(store
            .find_translation(ContentType::Article, 7, "de")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    #[serial]
    async fn test_unknown_language_fails_before_fan_out() {
        let translator = Arc::new(FakeTranslator::default());
        let (orchestrator, store) = setup(translator.clone(), 2);

        let err = orchestrator
            .translate_to_languages(&codes(&["fr", "xx", "zz"]), ContentType::Article, 7, &source())
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::UnknownLanguages(ref m) if m == &codes(&["xx", "zz"])));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.limiter().available(), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_malformed_and_duplicate_codes_are_rejected() {
        let (orchestrator, _store) = setup(Arc::new(FakeTranslator::default()), 2);

        let err = orchestrator
            .translate_to_languages(&codes(&["FR"]), ContentType::Article, 7, &source())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::InvalidLanguageCode(ref c) if c == "FR"));

        let err = orchestrator
            .translate_to_languages(&codes(&["de", "de"]), ContentType::Article, 7, &source())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::DuplicateLanguage(ref c) if c == "de"));
    }

    #[tokio::test]
    #[serial]
    async fn test_source_must_fit_the_content_shape() {
        let translator = Arc::new(FakeTranslator::default());
        let (orchestrator, _store) = setup(translator.clone(), 2);

        let err = orchestrator
            .translate_to_languages(
                &codes(&["de"]),
                ContentType::Project,
                7,
                &json!({ "challenges": [{ "title": "no description" }] }),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::InvalidSource(_)));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_language_list_is_an_empty_batch() {
        let (orchestrator, _store) = setup(Arc::new(FakeTranslator::default()), 2);

        let result = orchestrator
            .translate_to_languages(&[], ContentType::Article, 7, &source())
            .await
            .unwrap();
        assert_eq!(result, BatchResult::default());
    }

    #[tokio::test(start_paused = true)]
    #[serial]
    async fn test_provider_timeout_is_a_job_failure() {
        let translator = Arc::new(FakeTranslator::with_delay(Duration::from_secs(10)));
        let (orchestrator, store) = setup(translator, 2);
        let orchestrator = orchestrator.with_provider_timeout(Some(Duration::from_secs(1)));

        let result = orchestrator
            .translate_to_languages(&codes(&["de"]), ContentType::Article, 7, &source())
            .await
            .unwrap();

        assert_eq!(result.failed_codes(), vec!["de"]);
        assert!(result.failed[0].reason.contains("did not answer"));
        assert!(store.is_empty());
        assert_eq!(orchestrator.limiter().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    #[serial]
    async fn test_permit_timeout_is_a_job_failure() {
        let translator = Arc::new(FakeTranslator::with_delay(Duration::from_secs(5)));
        let (orchestrator, _store) = setup(translator, 1);
        let orchestrator = orchestrator.with_permit_timeout(Some(Duration::from_secs(2)));

        let result = orchestrator
            .translate_to_languages(&codes(&["fr", "de"]), ContentType::Article, 7, &source())
            .await
            .unwrap();

        assert_eq!(result.succeeded_codes(), vec!["fr"]);
        assert_eq!(result.failed_codes(), vec!["de"]);
        assert_eq!(result.failed[0].stage, JobStage::Permit);
    }

    #[tokio::test]
    #[serial]
    async fn test_batch_updates_metrics() {
        let metrics = TranslationMetrics::global();
        metrics.reset();
        let translator = Arc::new(FakeTranslator::failing_for(vec!["es"]));
        let (orchestrator, _store) = setup(translator, 4);

        orchestrator
            .translate_to_languages(&codes(&["fr", "es"]), ContentType::Article, 7, &source())
            .await
            .unwrap();

        assert_eq!(metrics.batches(), 1);
        assert_eq!(metrics.api_calls(), 2);
        assert_eq!(metrics.api_failures(), 1);
        assert_eq!(metrics.persisted(), 1);
    }

    // ==================== translate_one Tests ====================

    #[tokio::test]
    #[serial]
    async fn test_translate_one_does_not_persist() {
        let (orchestrator, store) = setup(Arc::new(FakeTranslator::default()), 1);

        let fields = orchestrator
            .translate_one("fa", ContentType::Article, 7, &source())
            .await
            .unwrap();

        assert_eq!(fields.text("name"), Some("[fa] Hello"));
        assert!(store.is_empty());
        assert_eq!(orchestrator.limiter().available(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_translate_one_unknown_language() {
        let (orchestrator, _store) = setup(Arc::new(FakeTranslator::default()), 1);

        let err = orchestrator
            .translate_one("xx", ContentType::Article, 7, &source())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::LanguageNotFound(ref c) if c == "xx"));
    }

    #[tokio::test]
    #[serial]
    async fn test_translate_one_propagates_provider_error_and_releases_permit() {
        let translator = Arc::new(FakeTranslator::failing_for(vec!["de"]));
        let (orchestrator, _store) = setup(translator, 1);

        let err = orchestrator
            .translate_one("de", ContentType::Article, 7, &source())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Provider(ProviderError::Other(_))));
        assert_eq!(orchestrator.limiter().available(), 1);
    }

    #[tokio::test(start_paused = true)]
    #[serial]
    async fn test_translate_one_timeout() {
        let translator = Arc::new(FakeTranslator::with_delay(Duration::from_secs(30)));
        let (orchestrator, _store) = setup(translator, 1);
        let orchestrator = orchestrator.with_provider_timeout(Some(Duration::from_secs(5)));

        let err = orchestrator
            .translate_one("de", ContentType::Article, 7, &source())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Timeout(d) if d == Duration::from_secs(5)));
    }

    // ==================== Helper Tests ====================

    #[test]
    fn test_validate_codes() {
        assert!(validate_codes(&codes(&["en", "fa"])).is_ok());
        assert!(validate_codes(&codes(&["eng"])).is_err());
        assert!(validate_codes(&codes(&["en", "en"])).is_err());
    }

    #[test]
    fn test_batch_result_serializes_camel_case() {
        let result = BatchResult::from_outcomes(
            codes(&["fr", "de"]),
            vec![
                JobOutcome::Succeeded(TranslatedLanguage {
                    language_code: "fr".to_string(),
                    fields: TranslationFields::default(),
                }),
                JobOutcome::Failed(FailedLanguage {
                    language_code: "de".to_string(),
                    stage: JobStage::Persist,
                    reason: "Conflict".to_string(),
                }),
            ],
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["succeeded"][0]["languageCode"], "fr");
        assert_eq!(value["failed"][0]["stage"], "persist");
        assert!(!result.is_complete());
    }
}
