//! Translation persistence.
//!
//! [`TranslationStore`] is the storage contract the orchestrator and the
//! authoring workflows write through. Uniqueness on (owner, language) and the
//! single-default rule are enforced by the store itself; a violation surfaces
//! as [`StoreError::Conflict`].
//!
//! [`MemoryTranslationStore`] keeps everything in process and is used by the
//! preview binary and the tests. The Postgres implementation lives in
//! [`crate::db`].

use crate::content::ContentType;
use crate::error::StoreError;
use crate::shape::TranslationFields;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;

/// A persisted translation of one content item into one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub id: i64,
    pub content_type: ContentType,
    pub owner_id: i64,
    pub language_code: String,
    pub fields: TranslationFields,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert parameters for a translation row.
#[derive(Debug, Clone, Copy)]
pub struct NewTranslation<'a> {
    pub content_type: ContentType,
    pub owner_id: i64,
    pub language_code: &'a str,
    pub fields: &'a TranslationFields,
    pub is_default: bool,
}

pub trait TranslationStore: Send + Sync {
    /// Insert one translation row in its own transaction.
    fn insert_translation<'a>(
        &'a self,
        new: NewTranslation<'a>,
    ) -> BoxFuture<'a, Result<TranslationRecord, StoreError>>;

    fn find_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &'a str,
    ) -> BoxFuture<'a, Result<Option<TranslationRecord>, StoreError>>;

    fn find_default_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<Option<TranslationRecord>, StoreError>>;

    /// Which of `codes` already have a translation for this owner.
    fn existing_languages<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        codes: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<String>, StoreError>>;

    /// Delete one translation. Returns whether a row was removed.
    fn delete_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &'a str,
    ) -> BoxFuture<'a, Result<bool, StoreError>>;

    fn content_exists<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<bool, StoreError>>;

    /// All translations of one content item, ordered by id.
    fn list_translations<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<Vec<TranslationRecord>, StoreError>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    content: HashSet<(ContentType, i64)>,
    rows: Vec<TranslationRecord>,
}

/// In-process translation store.
///
/// Content items must be registered with [`register_content`](Self::register_content)
/// before translations can be attached to them, mirroring the foreign key on
/// the Postgres tables.
#[derive(Debug, Default)]
pub struct MemoryTranslationStore {
    state: Mutex<MemoryState>,
}

impl MemoryTranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a content item known to the store.
    pub fn register_content(&self, content_type: ContentType, owner_id: i64) {
        self.lock().content.insert((content_type, owner_id));
    }

    /// Total number of stored translation rows.
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, new: NewTranslation<'_>) -> Result<TranslationRecord, StoreError> {
        let mut state = self.lock();

        if !state.content.contains(&(new.content_type, new.owner_id)) {
            return Err(StoreError::NotFound(format!(
                "{} {}",
                new.content_type, new.owner_id
            )));
        }

        let owned_by = |r: &&TranslationRecord| {
            r.content_type == new.content_type && r.owner_id == new.owner_id
        };

        if state
            .rows
            .iter()
            .filter(owned_by)
            .any(|r| r.language_code == new.language_code)
        {
            return Err(StoreError::Conflict(format!(
                "translation of {} {} into {} already exists",
                new.content_type, new.owner_id, new.language_code
            )));
        }

        if new.is_default && state.rows.iter().filter(owned_by).any(|r| r.is_default) {
            return Err(StoreError::Conflict(format!(
                "{} {} already has a default translation",
                new.content_type, new.owner_id
            )));
        }

        state.next_id += 1;
        let record = TranslationRecord {
            id: state.next_id,
            content_type: new.content_type,
            owner_id: new.owner_id,
            language_code: new.language_code.to_string(),
            fields: new.fields.clone(),
            is_default: new.is_default,
            created_at: Utc::now(),
        };
        state.rows.push(record.clone());

        Ok(record)
    }

    fn select(
        &self,
        content_type: ContentType,
        owner_id: i64,
        predicate: impl Fn(&TranslationRecord) -> bool,
    ) -> Vec<TranslationRecord> {
        self.lock()
            .rows
            .iter()
            .filter(|r| r.content_type == content_type && r.owner_id == owner_id)
            .filter(|r| predicate(*r))
            .cloned()
            .collect()
    }
}

impl TranslationStore for MemoryTranslationStore {
    fn insert_translation<'a>(
        &'a self,
        new: NewTranslation<'a>,
    ) -> BoxFuture<'a, Result<TranslationRecord, StoreError>> {
        async move { self.insert(new) }.boxed()
    }

    fn find_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &'a str,
    ) -> BoxFuture<'a, Result<Option<TranslationRecord>, StoreError>> {
        async move {
            Ok(self
                .select(content_type, owner_id, |r| r.language_code == language_code)
                .into_iter()
                .next())
        }
        .boxed()
    }

    fn find_default_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<Option<TranslationRecord>, StoreError>> {
        async move {
            Ok(self
                .select(content_type, owner_id, |r| r.is_default)
                .into_iter()
                .next())
        }
        .boxed()
    }

    fn existing_languages<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        codes: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<String>, StoreError>> {
        async move {
            Ok(self
                .select(content_type, owner_id, |r| codes.contains(&r.language_code))
                .into_iter()
                .map(|r| r.language_code)
                .collect())
        }
        .boxed()
    }

    fn delete_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &'a str,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        async move {
            let mut state = self.lock();
            let before = state.rows.len();
            state.rows.retain(|r| {
                !(r.content_type == content_type
                    && r.owner_id == owner_id
                    && r.language_code == language_code)
            });
            Ok(state.rows.len() < before)
        }
        .boxed()
    }

    fn content_exists<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        async move { Ok(self.lock().content.contains(&(content_type, owner_id))) }.boxed()
    }

    fn list_translations<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<Vec<TranslationRecord>, StoreError>> {
        async move { Ok(self.select(content_type, owner_id, |_| true)) }.boxed()
    }
}
