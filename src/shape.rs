//! Field shapes: the static description of what a translatable payload looks like.
//!
//! Every content type owns one [`FieldShape`]. The same tree is used for three
//! things, so they can never drift apart:
//!
//! - checking source fields before a batch starts
//! - rendering the JSON schema the provider must answer with
//! - validating (and pruning) the provider's answer before it is persisted

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The value kind a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single string
    Text,
    /// An array of strings (e.g. SEO keywords)
    TextList,
    /// A nested object with its own fields
    Object(&'static [Field]),
    /// An array of nested objects
    ObjectList(&'static [Field]),
}

impl FieldKind {
    /// Whether the field is stored as a plain text column (as opposed to JSON).
    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::Text)
    }
}

/// One named field inside a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present in every conforming payload
    pub required: bool,
    /// `null` is an accepted value
    pub nullable: bool,
    /// `false` for values copied verbatim (logo URLs, icon names)
    pub translatable: bool,
    pub description: &'static str,
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            nullable: false,
            translatable: true,
            description: "",
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn text_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::TextList)
    }

    pub const fn object(name: &'static str, fields: &'static [Field]) -> Self {
        Self::new(name, FieldKind::Object(fields))
    }

    pub const fn object_list(name: &'static str, fields: &'static [Field]) -> Self {
        Self::new(name, FieldKind::ObjectList(fields))
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn verbatim(self) -> Self {
        Self {
            translatable: false,
            ..self
        }
    }

    pub const fn describe(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }
}

/// The top-level shape of one content type's translatable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub fields: &'static [Field],
}

/// A shape violation, located by a dotted path such as `challenges[1].title`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected an object at {path}")]
    NotAnObject { path: String },

    #[error("missing required field {path}")]
    MissingField { path: String },

    #[error("field {path} must not be null")]
    UnexpectedNull { path: String },

    #[error("field {path} must be {expected}")]
    WrongType { path: String, expected: &'static str },
}

/// A payload that has passed [`FieldShape::conform`] (or was read back from storage).
///
/// Keys are the shape's field names; unknown keys never survive conformance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationFields(Map<String, Value>);

impl TranslationFields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Convenience accessor for text fields.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for TranslationFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FieldShape {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    /// Look up a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a JSON value against this shape.
    ///
    /// Unknown keys are dropped. A `null` on an optional, non-nullable field is
    /// treated as if the field were absent.
    ///
    /// # Returns
    /// The pruned payload, or the first violation found (depth first, in field order).
    pub fn conform(&self, value: &Value) -> Result<TranslationFields, ShapeError> {
        let map = value.as_object().ok_or_else(|| ShapeError::NotAnObject {
            path: "<root>".to_string(),
        })?;
        conform_object(self.fields, map, "").map(TranslationFields)
    }

    /// Render the JSON schema handed to the provider as the output contract.
    pub fn json_schema(&self) -> Value {
        object_schema(self.fields)
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn conform_object(
    fields: &'static [Field],
    map: &Map<String, Value>,
    prefix: &str,
) -> Result<Map<String, Value>, ShapeError> {
    let mut out = Map::new();

    for field in fields {
        let path = join_path(prefix, field.name);

        match map.get(field.name) {
            None if field.required => return Err(ShapeError::MissingField { path }),
            None => {}
            Some(Value::Null) if field.nullable => {
                out.insert(field.name.to_string(), Value::Null);
            }
            Some(Value::Null) if field.required => {
                return Err(ShapeError::UnexpectedNull { path })
            }
            Some(Value::Null) => {}
            Some(value) => {
                out.insert(field.name.to_string(), conform_value(field.kind, value, &path)?);
            }
        }
    }

    Ok(out)
}

fn conform_value(kind: FieldKind, value: &Value, path: &str) -> Result<Value, ShapeError> {
    match kind {
        FieldKind::Text => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(ShapeError::WrongType {
                path: path.to_string(),
                expected: "a string",
            }),
        },
        FieldKind::TextList => {
            let items = value.as_array().ok_or_else(|| ShapeError::WrongType {
                path: path.to_string(),
                expected: "an array of strings",
            })?;
            if items.iter().all(Value::is_string) {
                Ok(value.clone())
            } else {
                Err(ShapeError::WrongType {
                    path: path.to_string(),
                    expected: "an array of strings",
                })
            }
        }
        FieldKind::Object(fields) => {
            let map = value.as_object().ok_or_else(|| ShapeError::NotAnObject {
                path: path.to_string(),
            })?;
            conform_object(fields, map, path).map(Value::Object)
        }
        FieldKind::ObjectList(fields) => {
            let items = value.as_array().ok_or_else(|| ShapeError::WrongType {
                path: path.to_string(),
                expected: "an array of objects",
            })?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item_path = format!("{}[{}]", path, i);
                    let map = item.as_object().ok_or_else(|| ShapeError::NotAnObject {
                        path: item_path.clone(),
                    })?;
                    conform_object(fields, map, &item_path).map(Value::Object)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn object_schema(fields: &'static [Field]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| (f.name.to_string(), field_schema(f)))
        .collect();
    let required: Vec<&str> = fields.iter().filter(|f| f.required).map(|f| f.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(field: &Field) -> Value {
    let schema = match field.kind {
        FieldKind::Text => json!({ "type": "string" }),
        FieldKind::TextList => json!({ "type": "array", "items": { "type": "string" } }),
        FieldKind::Object(fields) => object_schema(fields),
        FieldKind::ObjectList(fields) => json!({ "type": "array", "items": object_schema(fields) }),
    };

    let mut schema = if field.nullable {
        json!({ "anyOf": [schema, { "type": "null" }] })
    } else {
        schema
    };

    let description = match (field.description.is_empty(), field.translatable) {
        (true, true) => None,
        (false, true) => Some(field.description.to_string()),
        (true, false) => Some("Copy verbatim, do NOT translate".to_string()),
        (false, false) => Some(format!("{} (copy verbatim, do NOT translate)", field.description)),
    };
    if let (Some(description), Some(obj)) = (description, schema.as_object_mut()) {
        obj.insert("description".to_string(), Value::String(description));
    }

    schema
}
