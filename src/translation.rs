use crate::config::Config;
use crate::content::ContentType;
use crate::error::ProviderError;
use crate::i18n::{Language, MarkupValidator};
use crate::shape::TranslationFields;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One provider call: translate `fields` of a `content_type` into `language`.
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    pub content_type: ContentType,
    pub language: &'a Language,
    /// Source values; must already conform to the content type's shape
    pub fields: &'a TranslationFields,
}

/// A text-completion backend able to translate a content payload.
///
/// Implementations return fields that conform to the content type's shape, or
/// fail. They do not retry and do not swallow errors.
pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        request: TranslationRequest<'a>,
    ) -> BoxFuture<'a, Result<TranslationFields, ProviderError>>;
}

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Structured-output contract: the reply must be JSON matching `schema`
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

/// Languages that are easily mistaken for another one sharing their script
fn confusable_note(code: &str) -> Option<&'static str> {
    match code {
        "fa" => Some("translate to Persian/Farsi, NOT Arabic"),
        "ar" => Some("translate to Arabic, NOT Persian/Farsi or Urdu"),
        "ur" => Some("translate to Urdu, NOT Hindi or Arabic"),
        "pt" => Some("translate to Portuguese, NOT Spanish or Galician"),
        "sr" => Some("translate to Serbian, NOT Croatian or Bosnian"),
        _ => None,
    }
}

/// Build the system prompt for translation
fn build_translation_system_prompt(language: &Language) -> String {
    let confusable = confusable_note(language.code())
        .map(|note| {
            format!(
                "\n- The target language code is \"{}\": {}.",
                language.code(),
                note
            )
        })
        .unwrap_or_default();

    format!(
        r#"You are a professional translator. Your task is to translate JSON objects into {} (language code: {}).

IMPORTANT:
- Always respect the provided JSON schema for structure and keys. The schema defines what properties exist.
- Translate ONLY the values (strings, text, titles, etc.) that need translation; do not change the keys or the schema structure.
- Values whose schema description says "do NOT translate" (URLs, logos, icon names) must be copied verbatim.
- Even if the source and target languages use similar scripts, always translate to the exact language identified by the language code.{}
- Some values may contain HTML tags (e.g., <p>, <strong>, <em>); preserve the tags and their attributes exactly and only translate the visible text inside them.
- Translate every translatable field according to the schema; do not skip any.
- Return only valid JSON that matches the given schema, without extra text or explanation."#,
        language.name(),
        language.code(),
        confusable
    )
}

/// Build the user prompt for translation
fn build_translation_user_prompt(fields: &TranslationFields) -> Result<String, ProviderError> {
    Ok(format!(
        "Here is the JSON to translate:\n{}",
        serde_json::to_string_pretty(fields)?
    ))
}

/// Strip a markdown code fence some models wrap around JSON output
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Translator backed by the OpenAI chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiTranslator {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_key: config.openai_api_key.clone(),
            api_url: config.openai_api_url.clone(),
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
        }
    }

    fn build_request(&self, request: &TranslationRequest<'_>) -> Result<ChatRequest, ProviderError> {
        // Reasoning models need higher token limits and don't support temperature
        let is_reasoning = is_reasoning_model(&self.model);
        let descriptor = request.content_type.descriptor();

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_translation_system_prompt(request.language),
                },
                Message {
                    role: "user".to_string(),
                    content: build_translation_user_prompt(request.fields)?,
                },
            ],
            max_completion_tokens: if is_reasoning { 16000 } else { 4096 },
            temperature: if is_reasoning {
                None
            } else {
                Some(self.temperature)
            },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: format!("{}_translation", request.content_type),
                    schema: descriptor.shape.json_schema(),
                    strict: false,
                },
            },
        })
    }

    async fn call(&self, request: TranslationRequest<'_>) -> Result<TranslationFields, ProviderError> {
        debug!(
            "Requesting {} translation into {} ({})",
            request.content_type,
            request.language.name(),
            request.language.code()
        );

        let body = self.build_request(&request)?;

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ProviderError::Status { status, body });
        }

        let text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&text)?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        let value: Value = serde_json::from_str(strip_code_fence(&content))?;
        let translated = request.content_type.descriptor().shape.conform(&value)?;

        // Validate translation quality
        let validation = MarkupValidator::validate(request.fields, &translated);
        if validation.has_warnings() {
            warn!(
                "Translation validation warnings for {} into {} ({}): {:?}",
                request.content_type,
                request.language.name(),
                request.language.code(),
                validation.warnings
            );
        }

        Ok(translated)
    }
}

impl Translator for OpenAiTranslator {
    fn translate<'a>(
        &'a self,
        request: TranslationRequest<'a>,
    ) -> BoxFuture<'a, Result<TranslationFields, ProviderError>> {
        self.call(request).boxed()
    }
}
