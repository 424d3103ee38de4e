//! Declaration-text front-end.
//!
//! Reads the TypeScript declaration files a CMS backend generates for its own
//! schema:
//!
//! ```ts
//! export interface ApiItemItem extends Struct.CollectionTypeSchema {
//!   collectionName: 'items';
//!   attributes: {
//!     title: Schema.Attribute.String & Schema.Attribute.Required;
//!     category: Schema.Attribute.Relation<'manyToOne', 'api::category.category'>;
//!   };
//! }
//! ```
//!
//! Only a closed vocabulary of attribute constructors is understood. Anything
//! else is lowered with its constructor name as the kind and left for the
//! shared classifier to drop.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::SchemaExtractor;
use super::classify::{RawEntity, RawField, SchemaFilter, build_schema};
use super::ir::{EntityKind, ParsedSchema};
use super::naming::uid_from_interface_name;
use crate::error::{CompileError, Result};
use crate::text::{
    block_after, generic_parts, matching_close, member_value, members, split_top_level,
    string_list, unquote,
};

#[allow(clippy::expect_used)]
static INTERFACE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:export\s+)?interface\s+([A-Za-z_$][\w$]*)\s+extends\s+([\w.]+)\s*\{")
        .expect("interface header pattern is valid")
});

#[allow(clippy::expect_used)]
static REGISTRY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:ContentTypeSchemas|ComponentSchemas)\s*\{")
        .expect("registry header pattern is valid")
});

/// Scalar constructors. Each lowers to its own name in lower case.
const SCALAR_CONSTRUCTORS: &[&str] = &[
    "String",
    "Text",
    "RichText",
    "Blocks",
    "Email",
    "Integer",
    "BigInteger",
    "Float",
    "Decimal",
    "Boolean",
    "Date",
    "DateTime",
    "Time",
    "JSON",
];

/// Modifiers that never determine a field's kind.
const MODIFIERS: &[&str] = &[
    "Required",
    "Private",
    "Unique",
    "DefaultTo",
    "SetMinMax",
    "SetMinMaxLength",
    "SetPluginOptions",
    "Configurable",
    "Writable",
    "Visible",
    "NonConfigurable",
    "NonWritable",
    "NonVisible",
    "Localized",
    "Pluggable",
];

/// Declaration text for content types and components. Either may hold both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationSources {
    /// `contentTypes.d.ts` text.
    pub content_types: String,
    /// `components.d.ts` text; may be empty.
    pub components: String,
}

/// Extractor for [`DeclarationSources`].
#[derive(Debug, Clone, Default)]
pub struct DeclarationExtractor {
    filter: SchemaFilter,
}

impl DeclarationExtractor {
    /// Extractor applying `filter`.
    pub fn new(filter: SchemaFilter) -> Self {
        Self { filter }
    }
}

impl SchemaExtractor for DeclarationExtractor {
    type Input = DeclarationSources;

    fn extract(&self, input: &DeclarationSources) -> Result<ParsedSchema> {
        let mut registry = BTreeMap::new();
        let mut interfaces = Vec::new();
        for source in [&input.content_types, &input.components] {
            collect_registry(source, &mut registry);
            interfaces.extend(find_schema_interfaces(source)?);
        }

        if interfaces.is_empty() {
            return Err(CompileError::InvalidDeclarations(
                "no schema interfaces found".into(),
            ));
        }

        let mut components = Vec::new();
        let mut entities = Vec::new();
        for interface in &interfaces {
            let Some(entity) = lower_interface(interface, &registry) else {
                continue;
            };
            if entity.kind == EntityKind::Component {
                components.push(entity);
            } else {
                entities.push(entity);
            }
        }

        let schema = build_schema(components, entities, &self.filter);
        debug!(
            interfaces = interfaces.len(),
            entities = schema.entities.len(),
            components = schema.components.len(),
            "Extracted schema from declarations."
        );
        Ok(schema)
    }
}

#[derive(Debug)]
struct SchemaInterface<'a> {
    name: &'a str,
    kind: EntityKind,
    body: &'a str,
}

fn schema_kind(base: &str) -> Option<EntityKind> {
    match base.rsplit('.').next()? {
        "CollectionTypeSchema" | "CollectionType" => Some(EntityKind::Collection),
        "SingleTypeSchema" | "SingleType" => Some(EntityKind::Single),
        "ComponentSchema" | "Component" => Some(EntityKind::Component),
        _ => None,
    }
}

/// Locate every schema interface. An interface whose body never closes makes
/// the rest of the text unreadable, so that is fatal.
fn find_schema_interfaces(source: &str) -> Result<Vec<SchemaInterface<'_>>> {
    let mut found = Vec::new();
    for caps in INTERFACE_HEADER.captures_iter(source) {
        let (Some(whole), Some(name), Some(base)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(kind) = schema_kind(base.as_str()) else {
            continue;
        };
        let open = whole.end() - 1;
        let Some(close) = matching_close(source, open) else {
            return Err(CompileError::InvalidDeclarations(format!(
                "unbalanced braces in interface {}",
                name.as_str()
            )));
        };
        found.push(SchemaInterface {
            name: name.as_str(),
            kind,
            body: &source[open + 1..close],
        });
    }
    Ok(found)
}

/// Read `'uid': InterfaceName` entries from the schema registry blocks.
fn collect_registry(source: &str, registry: &mut BTreeMap<String, String>) {
    for header in REGISTRY_HEADER.find_iter(source) {
        let Some(block) = block_after(source, header.end() - 1, b'{') else {
            continue;
        };
        for member in members(block.inner) {
            registry.insert(member.value.trim().to_string(), member.name);
        }
    }
}

fn lower_interface(interface: &SchemaInterface<'_>, registry: &BTreeMap<String, String>) -> Option<RawEntity> {
    let uid = registry.get(interface.name).cloned().unwrap_or_else(|| {
        uid_from_interface_name(interface.name, interface.kind == EntityKind::Component)
    });

    let attributes = member_value(interface.body, "attributes")
        .and_then(|value| block_after(value, 0, b'{'));
    let Some(attributes) = attributes else {
        warn!(interface = %interface.name, "Skipping schema interface without an attributes block.");
        return None;
    };

    let fields = members(attributes.inner)
        .into_iter()
        .filter_map(|member| match lower_field(&member.name, member.value) {
            Ok(field) => field,
            Err(reason) => {
                warn!(
                    interface = %interface.name,
                    field = %member.name,
                    reason = %reason,
                    "Skipping malformed attribute declaration."
                );
                None
            }
        })
        .collect();

    Some(RawEntity {
        uid,
        kind: interface.kind,
        fields,
    })
}

/// Lower one attribute type expression.
///
/// `Ok(None)` means the expression names no kind at all; `Err` means a known
/// constructor is missing an argument it needs.
fn lower_field(name: &str, expr: &str) -> std::result::Result<Option<RawField>, String> {
    let mut constructors = Vec::new();
    for part in split_top_level(expr, b"&") {
        let (path, args) =
            generic_parts(part).ok_or_else(|| format!("unterminated generic arguments in `{part}`"))?;
        let constructor = path.rsplit('.').next().unwrap_or(path);
        constructors.push((constructor, args));
    }

    let required = constructors.iter().any(|(c, _)| *c == "Required");
    let private = constructors.iter().any(|(c, _)| *c == "Private");

    let base = constructors
        .iter()
        .find(|(c, _)| is_vocabulary(c))
        .or_else(|| constructors.iter().find(|(c, _)| !MODIFIERS.contains(c)));
    let Some((constructor, args)) = base else {
        return Ok(None);
    };

    let mut field = RawField::new(name, constructor.to_ascii_lowercase());
    field.required = required;
    field.private = private;

    match *constructor {
        "Relation" => {
            // Older declaration files prefix the owning UID: <owner, kind, target>.
            let (kind, target) = match args.as_slice() {
                [kind] => (kind, None),
                [kind, target] | [_, kind, target] => (kind, Some(target)),
                _ => return Err("relation needs a kind".into()),
            };
            field.relation = Some(unquote(kind).to_string());
            field.target = target.map(|t| unquote(t).to_string());
        }
        "Component" => {
            let uid = args.first().ok_or("component needs a UID")?;
            field.component = Some(unquote(uid).to_string());
            field.repeatable = args.get(1).is_some_and(|r| r.trim() == "true");
        }
        "DynamicZone" => {
            let list = args.first().ok_or("dynamic zone needs a component list")?;
            field.components = string_list(list);
        }
        "Media" => {
            field.multiple = args.get(1).is_some_and(|m| m.trim() == "true");
        }
        "Enumeration" => {
            let list = args.first().ok_or("enumeration needs a value list")?;
            field.enum_values = string_list(list);
        }
        _ => {}
    }

    Ok(Some(field))
}

fn is_vocabulary(constructor: &str) -> bool {
    matches!(
        constructor,
        "Relation" | "Component" | "DynamicZone" | "Media" | "Enumeration"
    ) || SCALAR_CONSTRUCTORS.contains(&constructor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const CONTENT_TYPES: &str = r#"
import type { Schema, Struct } from '@strapi/strapi';

export interface ApiCategoryCategory extends Struct.CollectionTypeSchema {
  collectionName: 'categories';
  info: { singularName: 'category'; pluralName: 'categories'; displayName: 'Category' };
  attributes: {
    name: Schema.Attribute.String;
    items: Schema.Attribute.Relation<'oneToMany', 'api::item.item'>;
  };
}

export interface ApiItemItem extends Struct.CollectionTypeSchema {
  collectionName: 'items';
  attributes: {
    /** Display title; may contain {braces} */
    title: Schema.Attribute.String &
      Schema.Attribute.Required &
      Schema.Attribute.SetMinMaxLength<{ maxLength: 120 }>;
    price: Schema.Attribute.Integer;
    category: Schema.Attribute.Relation<'manyToOne', 'api::category.category'>;
    image: Schema.Attribute.Media<'images' | 'files'>;
    gallery: Schema.Attribute.Media<'images', true>;
    status: Schema.Attribute.Enumeration<['draft', 'live']> & Schema.Attribute.DefaultTo<'draft'>;
    slug: Schema.Attribute.UID<'title'>;
    body: Schema.Attribute.DynamicZone<
      ['shared.quote', 'shared.media']
    >;
    seo: Schema.Attribute.Component<'shared.seo', false>;
    createdBy: Schema.Attribute.Relation<'oneToOne', 'admin::user'> & Schema.Attribute.Private;
    secret: Schema.Attribute.String & Schema.Attribute.Private;
    broken: Schema.Attribute.Component;
  };
}

export interface PluginUploadFile extends Struct.CollectionTypeSchema {
  attributes: { name: Schema.Attribute.String };
}

declare module '@strapi/strapi' {
  export module Public {
    export interface ContentTypeSchemas {
      'api::category.category': ApiCategoryCategory;
      'api::item.item': ApiItemItem;
      'plugin::upload.file': PluginUploadFile;
    }
  }
}
"#;

    const COMPONENTS: &str = r#"
export interface SharedQuote extends Struct.ComponentSchema {
  attributes: { text: Schema.Attribute.Text & Schema.Attribute.Required };
}
export interface SharedSeo extends Struct.ComponentSchema {
  attributes: { metaTitle: Schema.Attribute.String };
}
"#;

    fn sources() -> DeclarationSources {
        DeclarationSources {
            content_types: CONTENT_TYPES.into(),
            components: COMPONENTS.into(),
        }
    }

    #[test]
    fn test_extract_declarations() {
        let schema = DeclarationExtractor::default().extract(&sources()).unwrap();

        let names: Vec<_> = schema.entities.iter().map(|e| e.clean_name.as_str()).collect();
        assert_eq!(names, vec!["Category", "Item"]);
        let components: Vec<_> = schema.components.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(components, vec!["shared.quote", "shared.seo"]);

        let item = schema.find_by_uid("api::item.item").unwrap();
        let attrs: Vec<_> = item
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.required))
            .collect();
        assert_eq!(attrs, vec![("price", false), ("status", false), ("title", true)]);

        assert_eq!(item.relations.len(), 1);
        assert_eq!(item.relations[0].target_type, "Category");
        let media: Vec<_> = item.media.iter().map(|m| (m.name.as_str(), m.multiple)).collect();
        assert_eq!(media, vec![("gallery", true), ("image", false)]);
        // "shared.media" is not declared, so only the quote variant remains
        assert_eq!(item.dynamic_zones[0].components.len(), 1);
        assert_eq!(item.components[0].component_type, "SharedSeo");
    }

    #[test]
    fn test_lower_field_markers() {
        let field = lower_field(
            "title",
            "Schema.Attribute.Required & Schema.Attribute.String & Schema.Attribute.Private",
        )
        .unwrap()
        .unwrap();
        assert_eq!(field.kind, "string");
        assert!(field.required);
        assert!(field.private);
    }

    #[test]
    fn test_lower_field_legacy_relation() {
        let field = lower_field(
            "owner",
            "Attribute.Relation<'api::item.item', 'manyToOne', 'plugin::users-permissions.user'>",
        )
        .unwrap()
        .unwrap();
        assert_eq!(field.relation.as_deref(), Some("manyToOne"));
        assert_eq!(field.target.as_deref(), Some("plugin::users-permissions.user"));
    }

    #[test]
    fn test_lower_field_categories() {
        // unknown constructor: lowered, then dropped by the classifier
        let unknown = lower_field("slug", "Schema.Attribute.UID").unwrap().unwrap();
        assert_eq!(unknown.kind, "uid");
        // only modifiers: nothing to lower
        assert_eq!(lower_field("x", "Schema.Attribute.Required").unwrap(), None);
        // known constructor missing its arguments: skipped locally
        assert!(lower_field("seo", "Schema.Attribute.Component").is_err());
        assert!(lower_field("r", "Schema.Attribute.Relation<'manyToOne'").is_err());
    }

    #[test]
    fn test_uid_fallback_without_registry() {
        let text = r#"
export interface ApiGuideTypeGuideType extends Struct.SingleTypeSchema {
  attributes: { title: Schema.Attribute.String };
}
"#;
        let schema = DeclarationExtractor::default()
            .extract(&DeclarationSources {
                content_types: text.into(),
                components: String::new(),
            })
            .unwrap();
        assert_eq!(schema.entities[0].uid, "api::guide-type.guide-type");
        assert_eq!(schema.entities[0].clean_name, "GuideType");
        assert_eq!(schema.entities[0].kind, EntityKind::Single);
    }

    #[test]
    fn test_no_interfaces_is_fatal() {
        let err = DeclarationExtractor::default()
            .extract(&DeclarationSources::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidDeclarations(_)));
    }

    #[test]
    fn test_unbalanced_interface_is_fatal() {
        let text = "export interface ApiItemItem extends Struct.CollectionTypeSchema { attributes: {";
        let err = DeclarationExtractor::default()
            .extract(&DeclarationSources {
                content_types: text.into(),
                components: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidDeclarations(_)));
    }
}
