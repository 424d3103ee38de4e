//! Content hash over the Schema IR and Route IR.
//!
//! The hash is the contract downstream tooling uses to skip regeneration, so
//! it only depends on IR content: object keys are sorted recursively before
//! hashing and no timestamp enters it.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::routes::RouteSet;
use crate::schema::ParsedSchema;

#[derive(Serialize)]
struct HashInput<'a> {
    schema: &'a ParsedSchema,
    routes: &'a RouteSet,
}

/// Recursively rebuild `value` with every object's keys in sorted order.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Hex SHA-256 of the canonical JSON of `{ schema, routes }`.
pub fn schema_hash(schema: &ParsedSchema, routes: &RouteSet) -> Result<String> {
    let value = serde_json::to_value(HashInput { schema, routes })?;
    let canonical = canonicalize(value).to_string();
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// RFC 3339 UTC timestamp reported alongside generated output.
pub fn generated_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::routes::{CustomEndpointType, RouteDescriptor};
    use crate::schema::ir::{Attribute, AttributeType, Entity, EntityKind};

    fn schema(required: bool) -> ParsedSchema {
        ParsedSchema {
            entities: vec![Entity {
                uid: "api::item.item".into(),
                clean_name: "Item".into(),
                kind: EntityKind::Collection,
                plugin_name: None,
                attributes: vec![Attribute {
                    name: "title".into(),
                    ty: AttributeType::String,
                    required,
                }],
                relations: vec![],
                media: vec![],
                components: vec![],
                dynamic_zones: vec![],
            }],
            components: vec![],
        }
    }

    #[test]
    fn test_canonicalize_sorts_nested_keys() {
        let value: Value = serde_json::from_str(r#"{"b": {"z": 1, "a": [{"y": 2, "x": 3}]}, "a": null}"#).unwrap();
        assert_eq!(
            canonicalize(value).to_string(),
            r#"{"a":null,"b":{"a":[{"x":3,"y":2}],"z":1}}"#
        );
    }

    #[test]
    fn test_hash_is_stable_and_content_sensitive() {
        let routes = RouteSet::default();
        let first = schema_hash(&schema(true), &routes).unwrap();
        assert_eq!(first, schema_hash(&schema(true), &routes).unwrap());
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, schema_hash(&schema(false), &routes).unwrap());
    }

    #[test]
    fn test_hash_covers_route_types() {
        let plain = crate::routes::extract_routes(&[RouteDescriptor {
            method: "GET".into(),
            path: "/items/stats".into(),
            handler: "item.stats".into(),
            ..RouteDescriptor::default()
        }]);
        let mut typed = plain.clone();
        typed.endpoint_types.insert(
            "item.stats".into(),
            CustomEndpointType {
                response: Some("{ total: number }".into()),
                ..CustomEndpointType::default()
            },
        );
        let without = schema_hash(&schema(true), &plain).unwrap();
        let with = schema_hash(&schema(true), &typed).unwrap();
        assert_ne!(without, with);
        assert_ne!(without, schema_hash(&schema(true), &RouteSet::default()).unwrap());
    }

    #[test]
    fn test_generated_at_is_rfc3339_utc() {
        let stamp = generated_at();
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
