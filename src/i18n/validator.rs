//! Translation quality validation.
//!
//! Shape validation decides whether a translation is accepted. The checks in
//! this module only produce warnings: they compare each translated text value
//! with its source counterpart and flag markup that was added, lost or
//! altered, and source text the provider skipped.

use crate::shape::TranslationFields;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Warnings raised while comparing a translation with its source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validator for markup preservation in translated content.
pub struct MarkupValidator;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

impl MarkupValidator {
    /// Compare a translation with its source, field by field.
    ///
    /// # Arguments
    /// * `source` - The source fields sent to the provider
    /// * `translated` - The shape-valid fields the provider returned
    pub fn validate(source: &TranslationFields, translated: &TranslationFields) -> ValidationReport {
        let mut report = ValidationReport::default();

        let source_texts = Self::text_values(source);
        let translated_texts = Self::text_values(translated);

        for (path, original) in &source_texts {
            let Some(candidate) = translated_texts.get(path) else {
                if !original.trim().is_empty() {
                    report
                        .warnings
                        .push(format!("Field {} was not translated", path));
                }
                continue;
            };

            let orig_tags = Self::extract_tags(original);
            let trans_tags = Self::extract_tags(candidate);
            if orig_tags != trans_tags {
                report.warnings.push(format!(
                    "Markup mismatch in {}: original has {:?}, translation has {:?}",
                    path, orig_tags, trans_tags
                ));
            }
        }

        report
    }

    /// Flatten every string inside a payload, keyed by its path.
    fn text_values(fields: &TranslationFields) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for (name, value) in fields.iter() {
            Self::collect(name, value, &mut out);
        }
        out
    }

    fn collect(path: &str, value: &Value, out: &mut BTreeMap<String, String>) {
        match value {
            Value::String(s) => {
                out.insert(path.to_string(), s.clone());
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    Self::collect(&format!("{}[{}]", path, i), item, out);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    Self::collect(&format!("{}.{}", path, key), item, out);
                }
            }
            _ => {}
        }
    }

    /// Extract HTML tag names (opening tags plain, closing tags with a leading '/'), sorted.
    fn extract_tags(text: &str) -> Vec<String> {
        let regex = TAG_REGEX.get_or_init(|| {
            Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").expect("static regex")
        });

        let mut tags: Vec<String> = regex
            .captures_iter(text)
            .map(|cap| format!("{}{}", &cap[1], cap[2].to_lowercase()))
            .collect();
        tags.sort();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> TranslationFields {
        match value {
            Value::Object(map) => TranslationFields::from(map),
            _ => panic!("test payload must be an object"),
        }
    }

    // ==================== Tag Extraction Tests ====================

    #[test]
    fn test_extract_tags_simple() {
        let tags = MarkupValidator::extract_tags("<p>Hello <strong>world</strong></p>");
        assert_eq!(tags, vec!["/p", "/strong", "p", "strong"]);
    }

    #[test]
    fn test_extract_tags_with_attributes() {
        let tags = MarkupValidator::extract_tags(r#"<a href="https://example.com">link</a>"#);
        assert_eq!(tags, vec!["/a", "a"]);
    }

    #[test]
    fn test_extract_tags_ignores_comparisons() {
        assert!(MarkupValidator::extract_tags("1 < 2 and 3 > 2").is_empty());
    }

    #[test]
    fn test_extract_tags_is_case_insensitive() {
        assert_eq!(
            MarkupValidator::extract_tags("<P>x</P>"),
            MarkupValidator::extract_tags("<p>x</p>")
        );
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_clean_translation() {
        let source = fields(json!({ "content": "<p>Hello <em>there</em></p>", "name": "Hi" }));
        let translated = fields(json!({ "content": "<p>Hallo <em>da</em></p>", "name": "Hallo" }));

        let report = MarkupValidator::validate(&source, &translated);
        assert!(!report.has_warnings(), "{:?}", report);
    }

    #[test]
    fn test_validate_flags_dropped_markup() {
        let source = fields(json!({ "content": "<p>Hello <strong>world</strong></p>" }));
        let translated = fields(json!({ "content": "<p>Bonjour le monde</p>" }));

        let report = MarkupValidator::validate(&source, &translated);
        assert!(report.has_warnings());
        assert!(report.warnings[0].contains("content"));
    }

    #[test]
    fn test_validate_flags_missing_field() {
        let source = fields(json!({ "name": "Hello", "excerpt": "Short" }));
        let translated = fields(json!({ "name": "Hallo" }));

        let report = MarkupValidator::validate(&source, &translated);
        assert_eq!(report.warnings, vec!["Field excerpt was not translated"]);
    }

    #[test]
    fn test_validate_walks_nested_values() {
        let source = fields(json!({ "challenges": [{ "title": "<b>Scale</b>", "description": "d" }] }));
        let translated = fields(json!({ "challenges": [{ "title": "Escala", "description": "d" }] }));

        let report = MarkupValidator::validate(&source, &translated);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("challenges[0].title"));
    }

    #[test]
    fn test_validate_ignores_blank_missing_fields() {
        let source = fields(json!({ "excerpt": "  " }));
        let translated = fields(json!({}));

        assert!(!MarkupValidator::validate(&source, &translated).has_warnings());
    }
}
