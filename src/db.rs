//! Postgres persistence: the `languages` table and one translation table per
//! content type.
//!
//! Translation tables are laid out from the content type's field shape: text
//! fields become `TEXT` columns, lists and nested objects become `JSONB`.

use crate::content::{ContentType, ContentTypeDescriptor};
use crate::error::StoreError;
use crate::i18n::{Language, LanguageDirectory, LanguageRegistry};
use crate::shape::{FieldKind, TranslationFields};
use crate::store::{NewTranslation, TranslationRecord, TranslationStore};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to Postgres.
    ///
    /// # Arguments
    /// * `database_url` - Postgres connection string
    /// * `max_connections` - pool size
    #[tracing::instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::debug!("database pool created");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the languages table, content tables and translation tables if missing.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS languages (
                code VARCHAR(2) PRIMARY KEY,
                name TEXT NOT NULL,
                native_name TEXT NOT NULL,
                is_default BOOLEAN NOT NULL DEFAULT FALSE,
                enabled BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for content_type in ContentType::ALL {
            let descriptor = content_type.descriptor();
            for statement in schema_statements(descriptor) {
                sqlx::query(&statement).execute(&self.pool).await?;
            }
        }

        tracing::info!("Database schema ready");
        Ok(())
    }

    /// Insert the languages of a registry, leaving existing rows alone.
    #[tracing::instrument(skip(self, registry))]
    pub async fn seed_languages(&self, registry: &LanguageRegistry) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for lang in registry.list_enabled() {
            let result = sqlx::query(
                r#"
                INSERT INTO languages (code, name, native_name, is_default, enabled)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (code) DO NOTHING
                "#,
            )
            .bind(lang.code)
            .bind(lang.name)
            .bind(lang.native_name)
            .bind(lang.is_default)
            .bind(lang.enabled)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as usize;
        }

        tracing::debug!(inserted, "languages seeded");
        Ok(inserted)
    }

    /// Create an empty content item and return its id.
    #[tracing::instrument(skip(self))]
    pub async fn create_content(&self, content_type: ContentType) -> Result<i64, StoreError> {
        let table = content_type.descriptor().table;
        let row = sqlx::query(&format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING id",
            table.content_table
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    #[tracing::instrument(skip(self))]
    async fn lookup_language(&self, code: &str) -> Result<Option<Language>, StoreError> {
        let row = sqlx::query(
            "SELECT code, name, native_name FROM languages WHERE code = $1 AND enabled",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(parse_language_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn lookup_languages(&self, codes: &[String]) -> Result<Vec<Language>, StoreError> {
        let rows = sqlx::query(
            "SELECT code, name, native_name FROM languages WHERE code = ANY($1) AND enabled",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_language_row).collect()
    }

    /// Insert one translation row inside its own transaction.
    ///
    /// # Database Constraints
    /// - (owner, `languageCode`) is unique
    /// - at most one row per owner has `is_default`
    /// - owner and language must exist
    #[tracing::instrument(
        skip(self, new),
        fields(content_type = %new.content_type, owner_id = new.owner_id, language = new.language_code)
    )]
    async fn insert(&self, new: NewTranslation<'_>) -> Result<TranslationRecord, StoreError> {
        let descriptor = new.content_type.descriptor();
        let table = descriptor.table;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} (\"{}\", \"languageCode\", is_default",
            table.name, table.owner_column
        ));
        let present: Vec<_> = descriptor
            .shape
            .fields
            .iter()
            .filter_map(|field| new.fields.get(field.name).map(|value| (field, value)))
            .collect();
        for (field, _) in &present {
            builder.push(format!(", \"{}\"", field.name));
        }

        builder.push(") VALUES (");
        let mut values = builder.separated(", ");
        values.push_bind(new.owner_id);
        values.push_bind(new.language_code.to_string());
        values.push_bind(new.is_default);
        for (field, value) in &present {
            if field.kind.is_text() {
                values.push_bind(value.as_str().map(str::to_string));
            } else {
                values.push_bind((!value.is_null()).then(|| Json((*value).clone())));
            }
        }
        values.push_unseparated(") RETURNING id, created_at");

        let mut tx = self.pool.begin().await?;
        let row = builder
            .build()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &new))?;
        tx.commit().await?;

        let record = TranslationRecord {
            id: row.try_get("id")?,
            content_type: new.content_type,
            owner_id: new.owner_id,
            language_code: new.language_code.to_string(),
            fields: new.fields.clone(),
            is_default: new.is_default,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        };

        tracing::debug!(translation_id = record.id, "translation inserted");
        Ok(record)
    }

    async fn select(
        &self,
        content_type: ContentType,
        owner_id: i64,
        filter: &str,
        language_code: Option<&str>,
    ) -> Result<Vec<TranslationRecord>, StoreError> {
        let descriptor = content_type.descriptor();
        let sql = format!(
            "SELECT {} FROM {} WHERE \"{}\" = $1 {} ORDER BY id",
            select_columns(descriptor),
            descriptor.table.name,
            descriptor.table.owner_column,
            filter
        );

        let mut query = sqlx::query(&sql).bind(owner_id);
        if let Some(code) = language_code {
            query = query.bind(code);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| parse_translation_row(descriptor, row))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn find(
        &self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &str,
    ) -> Result<Option<TranslationRecord>, StoreError> {
        let rows = self
            .select(
                content_type,
                owner_id,
                "AND \"languageCode\" = $2",
                Some(language_code),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    async fn find_default(
        &self,
        content_type: ContentType,
        owner_id: i64,
    ) -> Result<Option<TranslationRecord>, StoreError> {
        let rows = self
            .select(content_type, owner_id, "AND is_default", None)
            .await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    async fn existing(
        &self,
        content_type: ContentType,
        owner_id: i64,
        codes: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let table = content_type.descriptor().table;
        let rows = sqlx::query(&format!(
            "SELECT \"languageCode\" FROM {} WHERE \"{}\" = $1 AND \"languageCode\" = ANY($2)",
            table.name, table.owner_column
        ))
        .bind(owner_id)
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("languageCode").map_err(StoreError::from))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn delete(
        &self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &str,
    ) -> Result<bool, StoreError> {
        let table = content_type.descriptor().table;
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE \"{}\" = $1 AND \"languageCode\" = $2",
            table.name, table.owner_column
        ))
        .bind(owner_id)
        .bind(language_code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn exists(&self, content_type: ContentType, owner_id: i64) -> Result<bool, StoreError> {
        let table = content_type.descriptor().table;
        let row = sqlx::query(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1) AS found",
            table.content_table
        ))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("found")?)
    }
}

impl LanguageDirectory for Database {
    fn resolve<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Option<Language>, StoreError>> {
        self.lookup_language(code).boxed()
    }

    fn resolve_many<'a>(
        &'a self,
        codes: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Language>, StoreError>> {
        self.lookup_languages(codes).boxed()
    }
}

impl TranslationStore for Database {
    fn insert_translation<'a>(
        &'a self,
        new: NewTranslation<'a>,
    ) -> BoxFuture<'a, Result<TranslationRecord, StoreError>> {
        self.insert(new).boxed()
    }

    fn find_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &'a str,
    ) -> BoxFuture<'a, Result<Option<TranslationRecord>, StoreError>> {
        self.find(content_type, owner_id, language_code).boxed()
    }

    fn find_default_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<Option<TranslationRecord>, StoreError>> {
        self.find_default(content_type, owner_id).boxed()
    }

    fn existing_languages<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        codes: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<String>, StoreError>> {
        self.existing(content_type, owner_id, codes).boxed()
    }

    fn delete_translation<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
        language_code: &'a str,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        self.delete(content_type, owner_id, language_code).boxed()
    }

    fn content_exists<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        self.exists(content_type, owner_id).boxed()
    }

    fn list_translations<'a>(
        &'a self,
        content_type: ContentType,
        owner_id: i64,
    ) -> BoxFuture<'a, Result<Vec<TranslationRecord>, StoreError>> {
        async move { self.select(content_type, owner_id, "", None).await }.boxed()
    }
}

/// Unique violations become conflicts; a missing owner or language becomes not-found.
fn map_write_error(err: sqlx::Error, new: &NewTranslation<'_>) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(format!(
                "translation of {} {} into {} already exists ({})",
                new.content_type,
                new.owner_id,
                new.language_code,
                db.message()
            ));
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound(format!(
                "{} {} or language {} ({})",
                new.content_type,
                new.owner_id,
                new.language_code,
                db.message()
            ));
        }
    }
    StoreError::Database(err)
}

fn parse_language_row(row: &PgRow) -> Result<Language, StoreError> {
    Ok(Language::new(
        row.try_get::<String, _>("code")?,
        row.try_get::<String, _>("name")?,
        row.try_get::<String, _>("native_name")?,
    ))
}

fn parse_translation_row(
    descriptor: &ContentTypeDescriptor,
    row: &PgRow,
) -> Result<TranslationRecord, StoreError> {
    let mut fields = Map::new();
    for field in descriptor.shape.fields {
        let value = if field.kind.is_text() {
            row.try_get::<Option<String>, _>(field.name)?
                .map(Value::String)
        } else {
            row.try_get::<Option<Json<Value>>, _>(field.name)?
                .map(|json| json.0)
        };

        match value {
            Some(value) => {
                fields.insert(field.name.to_string(), value);
            }
            None if field.nullable => {
                fields.insert(field.name.to_string(), Value::Null);
            }
            None => {}
        }
    }

    Ok(TranslationRecord {
        id: row.try_get("id")?,
        content_type: descriptor.content_type,
        owner_id: row.try_get(descriptor.table.owner_column)?,
        language_code: row.try_get("languageCode")?,
        fields: TranslationFields::from(fields),
        is_default: row.try_get("is_default")?,
        created_at: row.try_get("created_at")?,
    })
}

fn select_columns(descriptor: &ContentTypeDescriptor) -> String {
    let mut columns = vec![
        "id".to_string(),
        format!("\"{}\"", descriptor.table.owner_column),
        "\"languageCode\"".to_string(),
        "is_default".to_string(),
        "created_at".to_string(),
    ];
    columns.extend(
        descriptor
            .shape
            .fields
            .iter()
            .map(|field| format!("\"{}\"", field.name)),
    );
    columns.join(", ")
}

fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "TEXT",
        FieldKind::TextList | FieldKind::Object(_) | FieldKind::ObjectList(_) => "JSONB",
    }
}

/// DDL for one content type: the content table, its translation table and
/// the single-default index.
fn schema_statements(descriptor: &ContentTypeDescriptor) -> Vec<String> {
    let table = descriptor.table;

    let field_columns: String = descriptor
        .shape
        .fields
        .iter()
        .map(|field| format!("    \"{}\" {},\n", field.name, column_type(field.kind)))
        .collect();

    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    id BIGSERIAL PRIMARY KEY,\n    created_at TIMESTAMPTZ NOT NULL DEFAULT now()\n)",
            table.content_table
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {name} (\n    id BIGSERIAL PRIMARY KEY,\n    \"{owner}\" BIGINT NOT NULL REFERENCES {content}(id) ON DELETE CASCADE,\n    \"languageCode\" VARCHAR(2) NOT NULL REFERENCES languages(code),\n{fields}    is_default BOOLEAN NOT NULL DEFAULT FALSE,\n    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),\n    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),\n    UNIQUE (\"{owner}\", \"languageCode\")\n)",
            name = table.name,
            owner = table.owner_column,
            content = table.content_table,
            fields = field_columns,
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {name}_single_default ON {name} (\"{owner}\") WHERE is_default",
            name = table.name,
            owner = table.owner_column,
        ),
    ]
}
