use crate::limiter::LimiterError;
use crate::shape::ShapeError;
use std::time::Duration;

/// Failure of a single provider call.
///
/// These never escape a batch: the orchestrator records them per job.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to reach translation provider: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("translation provider response contained no choices")]
    EmptyResponse,

    #[error("translation provider returned malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("translation does not match the expected shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("translation provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("translation provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Whether the failure came from the provider's HTTP status.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned to callers of the orchestrator and the authoring workflows.
///
/// Everything here is a hard failure. Per-job failures inside a batch are
/// reported through [`crate::orchestrator::BatchResult`] instead.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("unknown content type: '{0}'")]
    UnknownContentType(String),

    #[error("invalid language code '{0}': expected two lowercase letters")]
    InvalidLanguageCode(String),

    #[error("language code '{0}' was requested more than once")]
    DuplicateLanguage(String),

    #[error("language with code {0} does not exist")]
    LanguageNotFound(String),

    #[error("the following language codes were not found: {}", .0.join(", "))]
    UnknownLanguages(Vec<String>),

    #[error("source fields do not match the content shape: {0}")]
    InvalidSource(#[source] ShapeError),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("translation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Limiter(LimiterError),

    #[error("{content_type} {id} not found")]
    ContentNotFound { content_type: String, id: i64 },

    #[error("translation not found for {content_type} {id} and language {language_code}")]
    TranslationNotFound {
        content_type: String,
        id: i64,
        language_code: String,
    },

    #[error("default translation not found for {content_type} {id}")]
    DefaultTranslationMissing { content_type: String, id: i64 },

    #[error("default translation cannot be deleted")]
    DefaultTranslationProtected,

    #[error("some translations already exist for the specified languages: {}", .0.join(", "))]
    TranslationsExist(Vec<String>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LimiterError> for TranslationError {
    fn from(err: LimiterError) -> Self {
        match err {
            LimiterError::Timeout(limit) => TranslationError::Timeout(limit),
            other => TranslationError::Limiter(other),
        }
    }
}
