//! Structured front-end: a JSON map of UID -> entity definition.
//!
//! ```json
//! {
//!   "entities": {
//!     "api::item.item": {
//!       "kind": "collectionType",
//!       "attributes": {
//!         "title": { "type": "string", "required": true },
//!         "category": { "type": "relation", "relation": "manyToOne", "target": "api::category.category" }
//!       }
//!     }
//!   },
//!   "components": { "shared.seo": { "attributes": { ... } } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SchemaExtractor;
use super::classify::{RawEntity, RawField, SchemaFilter, build_schema};
use super::ir::{EntityKind, ParsedSchema};
use crate::error::{CompileError, Result};

/// Raw schema as served by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInput {
    /// Content types keyed by UID.
    pub entities: BTreeMap<String, RawEntityDef>,
    /// Components keyed by `category.name` UID.
    #[serde(default)]
    pub components: BTreeMap<String, RawEntityDef>,
}

impl SchemaInput {
    /// Parse the top-level schema document. Any failure here is fatal.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| CompileError::InvalidSchema(err.to_string()))
    }
}

/// One entity definition. Attributes stay untyped until extraction so that a
/// single malformed attribute cannot fail the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntityDef {
    /// `collectionType` or `singleType`; absent for components.
    #[serde(default)]
    pub kind: Option<String>,
    /// Attribute definitions keyed by field name.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    private: bool,
    relation: Option<String>,
    target: Option<String>,
    component: Option<String>,
    #[serde(default)]
    repeatable: bool,
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    multiple: bool,
    #[serde(default, rename = "enum")]
    enum_values: Vec<String>,
}

impl RawAttribute {
    fn into_field(self, name: &str) -> RawField {
        RawField {
            name: name.to_string(),
            kind: self.kind,
            required: self.required,
            private: self.private,
            relation: self.relation,
            target: self.target,
            component: self.component,
            repeatable: self.repeatable,
            components: self.components,
            multiple: self.multiple,
            enum_values: self.enum_values,
        }
    }
}

/// Extractor for [`SchemaInput`].
#[derive(Debug, Clone, Default)]
pub struct StructuredExtractor {
    filter: SchemaFilter,
}

impl StructuredExtractor {
    /// Extractor applying `filter`.
    pub fn new(filter: SchemaFilter) -> Self {
        Self { filter }
    }
}

impl SchemaExtractor for StructuredExtractor {
    type Input = SchemaInput;

    fn extract(&self, input: &SchemaInput) -> Result<ParsedSchema> {
        let components = input
            .components
            .iter()
            .map(|(uid, def)| lower_entity(uid, EntityKind::Component, def))
            .collect();

        let entities = input
            .entities
            .iter()
            .filter_map(|(uid, def)| {
                let kind = match def.kind.as_deref() {
                    None => EntityKind::Collection,
                    Some(raw) => match EntityKind::parse(raw) {
                        Some(EntityKind::Component) | None => {
                            warn!(uid = %uid, kind = %raw, "Skipping entity with unsupported kind.");
                            return None;
                        }
                        Some(kind) => kind,
                    },
                };
                Some(lower_entity(uid, kind, def))
            })
            .collect();

        let schema = build_schema(components, entities, &self.filter);
        debug!(
            entities = schema.entities.len(),
            components = schema.components.len(),
            "Extracted structured schema."
        );
        Ok(schema)
    }
}

fn lower_entity(uid: &str, kind: EntityKind, def: &RawEntityDef) -> RawEntity {
    let fields = def
        .attributes
        .iter()
        .filter_map(|(name, value)| {
            match serde_json::from_value::<RawAttribute>(value.clone()) {
                Ok(attribute) => Some(attribute.into_field(name)),
                Err(err) => {
                    warn!(uid = %uid, field = %name, error = %err, "Skipping malformed attribute.");
                    None
                }
            }
        })
        .collect();

    RawEntity {
        uid: uid.to_string(),
        kind,
        fields,
    }
}
