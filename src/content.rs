//! Content-type registry.
//!
//! The set of translatable content types is closed: each variant of
//! [`ContentType`] maps to exactly one static [`ContentTypeDescriptor`] that
//! carries its field shape and the table its translations live in. All
//! per-type dispatch goes through [`ContentType::descriptor`].

use crate::error::TranslationError;
use crate::shape::{Field, FieldShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A kind of translatable content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Project,
    Service,
    Solution,
    Setting,
    Staff,
}

/// Where a content type's translation rows are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationTable {
    /// Table holding one row per (owner, language)
    pub name: &'static str,
    /// Column linking a translation row to its content item
    pub owner_column: &'static str,
    /// Table holding the content items themselves
    pub content_table: &'static str,
}

/// Static description of one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTypeDescriptor {
    pub content_type: ContentType,
    pub shape: FieldShape,
    pub table: TranslationTable,
}

const META: &[Field] = &[
    Field::text("title").nullable().describe("Translated SEO title"),
    Field::text("description").nullable().describe("Translated SEO description"),
    Field::text_list("keywords").nullable().describe("Translated SEO keywords"),
];

const PLAIN_META: &[Field] = &[
    Field::text("title"),
    Field::text("description"),
    Field::text_list("keywords"),
];

const STRICT_META: &[Field] = &[
    Field::text("title").required().describe("Translated meta title"),
    Field::text("description").required().describe("Translated meta description"),
    Field::text_list("keywords").required().describe("Translated meta keywords"),
];

const TITLED_ITEM: &[Field] = &[
    Field::text("title").required(),
    Field::text("description").required(),
];

const SUB_SERVICE: &[Field] = &[
    Field::text("icon").verbatim(),
    Field::text("title").required(),
    Field::text("description"),
    Field::text_list("features"),
];

static ARTICLE: ContentTypeDescriptor = ContentTypeDescriptor {
    content_type: ContentType::Article,
    shape: FieldShape::new(&[
        Field::text("name").nullable().describe("The translated article name/title"),
        Field::text("content")
            .nullable()
            .describe("The translated article body, may contain HTML tags"),
        Field::text("excerpt").nullable().describe("The translated article summary"),
        Field::object("meta", META).nullable(),
    ]),
    table: TranslationTable {
        name: "articles_translations",
        owner_column: "articleId",
        content_table: "articles",
    },
};

static PROJECT: ContentTypeDescriptor = ContentTypeDescriptor {
    content_type: ContentType::Project,
    shape: FieldShape::new(&[
        Field::text("name"),
        Field::text("description"),
        Field::text("shortDescription"),
        Field::object("meta", PLAIN_META),
        Field::object_list("challenges", TITLED_ITEM),
        Field::object_list("results", TITLED_ITEM),
    ]),
    table: TranslationTable {
        name: "projects_translations",
        owner_column: "projectId",
        content_table: "projects",
    },
};

static SERVICE: ContentTypeDescriptor = ContentTypeDescriptor {
    content_type: ContentType::Service,
    shape: FieldShape::new(&[
        Field::text("name"),
        Field::text("description"),
        Field::text("shortDescription"),
        Field::object("meta", PLAIN_META),
        Field::object_list("subServices", SUB_SERVICE),
    ]),
    table: TranslationTable {
        name: "services_translations",
        owner_column: "serviceId",
        content_table: "services",
    },
};

static SOLUTION: ContentTypeDescriptor = ContentTypeDescriptor {
    content_type: ContentType::Solution,
    shape: FieldShape::new(&[
        Field::text("name"),
        Field::text("description"),
        Field::text("shortDescription"),
        Field::object("meta", PLAIN_META),
    ]),
    table: TranslationTable {
        name: "solutions_translations",
        owner_column: "solutionId",
        content_table: "solutions",
    },
};

static SETTING: ContentTypeDescriptor = ContentTypeDescriptor {
    content_type: ContentType::Setting,
    shape: FieldShape::new(&[
        Field::text("siteName").nullable().describe("Translated site name"),
        Field::text("siteDescription")
            .nullable()
            .describe("Translated site description"),
        Field::object("meta", STRICT_META).nullable(),
        Field::text("siteLogo").nullable().verbatim().describe("Logo URL"),
        Field::text("siteDarkLogo").nullable().verbatim().describe("Dark logo URL"),
    ]),
    table: TranslationTable {
        name: "settings_translations",
        owner_column: "settingId",
        content_table: "settings",
    },
};

static STAFF: ContentTypeDescriptor = ContentTypeDescriptor {
    content_type: ContentType::Staff,
    shape: FieldShape::new(&[
        Field::text("name").nullable().describe("The translated staff name"),
        Field::text("bio")
            .nullable()
            .describe("The translated staff bio, may contain HTML tags"),
    ]),
    table: TranslationTable {
        name: "staff_translations",
        owner_column: "staffId",
        content_table: "staff",
    },
};

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Article,
        ContentType::Project,
        ContentType::Service,
        ContentType::Solution,
        ContentType::Setting,
        ContentType::Staff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Project => "project",
            ContentType::Service => "service",
            ContentType::Solution => "solution",
            ContentType::Setting => "setting",
            ContentType::Staff => "staff",
        }
    }

    /// The single dispatch point from a content type to its static description.
    pub fn descriptor(&self) -> &'static ContentTypeDescriptor {
        match self {
            ContentType::Article => &ARTICLE,
            ContentType::Project => &PROJECT,
            ContentType::Service => &SERVICE,
            ContentType::Solution => &SOLUTION,
            ContentType::Setting => &SETTING,
            ContentType::Staff => &STAFF,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| TranslationError::UnknownContentType(s.to_string()))
    }
}

/// Field shape of a content type's translatable fields.
pub fn shape_for(content_type: ContentType) -> &'static FieldShape {
    &content_type.descriptor().shape
}

/// Translation table of a content type.
pub fn store_for(content_type: ContentType) -> &'static TranslationTable {
    &content_type.descriptor().table
}

/// Column linking a translation row back to its owning content item.
pub fn owning_column_for(content_type: ContentType) -> &'static str {
    content_type.descriptor().table.owner_column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeError;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_every_content_type_has_its_own_descriptor() {
        for ct in ContentType::ALL {
            assert_eq!(ct.descriptor().content_type, ct);
        }
    }

    #[test]
    fn test_tables_and_owner_columns_are_unique() {
        let tables: HashSet<_> = ContentType::ALL.iter().map(|ct| store_for(*ct).name).collect();
        let owners: HashSet<_> = ContentType::ALL.iter().map(|ct| owning_column_for(*ct)).collect();
        assert_eq!(tables.len(), 6);
        assert_eq!(owners.len(), 6);
    }

    #[test]
    fn test_lookup_functions() {
        assert_eq!(store_for(ContentType::Article).name, "articles_translations");
        assert_eq!(owning_column_for(ContentType::Staff), "staffId");
        assert!(shape_for(ContentType::Service).field("subServices").is_some());
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for ct in ContentType::ALL {
            assert_eq!(ct.to_string().parse::<ContentType>().unwrap(), ct);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_type() {
        let err = "tag".parse::<ContentType>().unwrap_err();
        assert!(matches!(err, TranslationError::UnknownContentType(ref s) if s == "tag"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&ContentType::Solution).unwrap(), "\"solution\"");
        let ct: ContentType = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(ct, ContentType::Staff);
    }

    // ==================== Per-Type Shape Tests ====================

    #[test]
    fn test_article_shape_accepts_nullable_meta() {
        let fields = shape_for(ContentType::Article)
            .conform(&json!({ "name": "Hello", "content": "<p>Body</p>", "meta": null }))
            .expect("Should conform");
        assert_eq!(fields.text("name"), Some("Hello"));
    }

    #[test]
    fn test_project_challenges_require_title_and_description() {
        let err = shape_for(ContentType::Project)
            .conform(&json!({ "challenges": [{ "title": "Scale" }] }))
            .unwrap_err();
        assert_eq!(
            err,
            ShapeError::MissingField {
                path: "challenges[0].description".to_string()
            }
        );
    }

    #[test]
    fn test_service_sub_services_require_title() {
        let shape = shape_for(ContentType::Service);
        assert!(shape
            .conform(&json!({ "subServices": [{ "title": "Audit", "features": ["a"] }] }))
            .is_ok());
        assert!(shape
            .conform(&json!({ "subServices": [{ "icon": "shield" }] }))
            .is_err());
    }

    #[test]
    fn test_setting_meta_requires_all_keys_when_present() {
        let shape = shape_for(ContentType::Setting);
        let err = shape
            .conform(&json!({ "meta": { "title": "T", "description": "D" } }))
            .unwrap_err();
        assert_eq!(
            err,
            ShapeError::MissingField {
                path: "meta.keywords".to_string()
            }
        );
    }

    #[test]
    fn test_setting_logos_are_verbatim() {
        let shape = shape_for(ContentType::Setting);
        assert!(!shape.field("siteLogo").unwrap().translatable);
        assert!(!shape.field("siteDarkLogo").unwrap().translatable);
        assert!(shape.field("siteName").unwrap().translatable);
    }

    #[test]
    fn test_staff_shape_has_name_and_bio() {
        let names: Vec<_> = shape_for(ContentType::Staff).fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "bio"]);
    }
}
