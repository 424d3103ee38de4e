//! Field classification and the IR builder shared by both extractors.
//!
//! Front-ends only lower their input into [`RawEntity`] / [`RawField`]; every
//! rule that decides what reaches the IR (bucket classification, system and
//! private field filtering, namespace filtering, target resolution, clean
//! names) lives here so the two paths cannot drift apart.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::ir::{
    Attribute, AttributeType, ComponentField, DynamicZoneField, Entity, EntityKind, MediaField,
    ParsedSchema, Relation, RelationType, ZoneVariant,
};
use super::naming::{clean_name, plugin_name, split_uid};
use crate::config::GeneratorConfig;

/// Fields managed by the backend itself; emitted as identity fields instead.
pub const SYSTEM_FIELDS: &[&str] = &["id", "documentId", "createdAt", "updatedAt", "publishedAt"];

/// Audit, authorship and locale fields that never reach generated types.
pub const PRIVACY_FIELDS: &[&str] = &["createdBy", "updatedBy", "locale", "localizations"];

/// The authentication plugin whose user and role types are always exposed.
pub const AUTH_PLUGIN: &str = "users-permissions";

const AUTH_PLUGIN_TYPES: &[&str] = &["user", "role"];

/// An entity as lowered by a front-end, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntity {
    /// `namespace::name.type` or `category.name`.
    pub uid: String,
    /// Collection, single type or component.
    pub kind: EntityKind,
    /// Fields in declaration order.
    pub fields: Vec<RawField>,
}

/// A field as lowered by a front-end. `kind` is the raw discriminant
/// (`relation`, `media`, `string`, ...); the remaining members are only
/// meaningful for the kinds that use them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawField {
    /// Field name as declared.
    pub name: String,
    /// Raw discriminant.
    pub kind: String,
    /// Declared required.
    pub required: bool,
    /// Hidden from API responses.
    pub private: bool,
    /// Relation type, e.g. `manyToOne`.
    pub relation: Option<String>,
    /// Relation target UID.
    pub target: Option<String>,
    /// Component UID of a component field.
    pub component: Option<String>,
    /// Component field holding a list.
    pub repeatable: bool,
    /// Allowed component UIDs of a dynamic zone.
    pub components: Vec<String>,
    /// Media field holding several files.
    pub multiple: bool,
    /// Allowed values of an enumeration.
    pub enum_values: Vec<String>,
}

impl RawField {
    /// Field with every optional member unset.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }
}

/// The bucket a raw field belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldClass {
    /// Link to another entity
    Relation,
    /// Uploaded file
    Media,
    /// Embedded component
    Component,
    /// Ordered list of mixed components
    DynamicZone,
    /// Plain value
    Scalar(AttributeType),
    /// Unrecognized kind; the field is dropped
    Unknown,
}

/// Classify a raw field by its declared kind. Total and mutually exclusive.
pub fn classify(field: &RawField) -> FieldClass {
    match field.kind.as_str() {
        "relation" => FieldClass::Relation,
        "media" => FieldClass::Media,
        "component" => FieldClass::Component,
        "dynamiczone" => FieldClass::DynamicZone,
        kind => AttributeType::from_kind(kind, &field.enum_values)
            .map_or(FieldClass::Unknown, FieldClass::Scalar),
    }
}

/// Namespace and field filtering options derived from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaFilter {
    extra_plugins: Vec<String>,
    extra_excluded_fields: Vec<String>,
}

impl SchemaFilter {
    /// Filter adding the configured plugins and excluded fields to the defaults.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            extra_plugins: config.include_plugins.clone(),
            extra_excluded_fields: config.exclude_fields.clone(),
        }
    }

    /// Whether entities in this UID's namespace are materialized, either as
    /// top-level entities or as relation targets.
    pub fn allows_uid(&self, uid: &str) -> bool {
        match split_uid(uid) {
            (None, _) | (Some("api"), _) => true,
            (Some("plugin"), rest) => {
                let Some(plugin) = plugin_name(uid) else {
                    return false;
                };
                if plugin == AUTH_PLUGIN {
                    let ty = rest.rsplit('.').next().unwrap_or_default();
                    return AUTH_PLUGIN_TYPES.contains(&ty);
                }
                self.extra_plugins.iter().any(|p| p == plugin)
            }
            _ => false,
        }
    }

    /// Whether a field is filtered out before classification.
    pub fn excludes_field(&self, field: &RawField) -> bool {
        field.private
            || SYSTEM_FIELDS.contains(&field.name.as_str())
            || PRIVACY_FIELDS.contains(&field.name.as_str())
            || self.extra_excluded_fields.iter().any(|f| *f == field.name)
    }
}

/// Build the Schema IR from lowered front-end output.
///
/// Components are registered before entities so that relation, component and
/// dynamic-zone targets resolve against names that are already known.
/// Entities are ordered by UID and fields by name, so the IR does not depend
/// on the ordering a front-end happened to produce.
pub fn build_schema(
    mut raw_components: Vec<RawEntity>,
    raw_entities: Vec<RawEntity>,
    filter: &SchemaFilter,
) -> ParsedSchema {
    let mut raw_entities: Vec<RawEntity> = raw_entities
        .into_iter()
        .filter(|entity| {
            let allowed = filter.allows_uid(&entity.uid);
            if !allowed {
                debug!(uid = %entity.uid, "Dropping entity outside allowed namespaces.");
            }
            allowed
        })
        .collect();
    raw_components.sort_by(|a, b| a.uid.cmp(&b.uid));
    raw_entities.sort_by(|a, b| a.uid.cmp(&b.uid));

    let mut known = KnownEntities::default();
    for component in &raw_components {
        known.register(&component.uid, true);
    }
    for entity in &raw_entities {
        known.register(&entity.uid, false);
    }

    let components = raw_components
        .iter()
        .map(|raw| build_entity(raw, EntityKind::Component, &known, filter))
        .collect();
    let entities = raw_entities
        .iter()
        .map(|raw| build_entity(raw, raw.kind, &known, filter))
        .collect();

    ParsedSchema {
        entities,
        components,
    }
}

#[derive(Debug, Default)]
struct KnownEntities {
    by_uid: BTreeMap<String, (String, bool)>,
    by_clean_name: BTreeMap<String, String>,
}

impl KnownEntities {
    fn register(&mut self, uid: &str, is_component: bool) {
        let name = clean_name(uid);
        if let Some(existing) = self.by_clean_name.get(&name) {
            warn!(
                uid = %uid,
                existing = %existing,
                clean_name = %name,
                "Two UIDs share a clean name; generated declarations will collide."
            );
        } else {
            self.by_clean_name.insert(name.clone(), uid.to_string());
        }
        self.by_uid.insert(uid.to_string(), (name, is_component));
    }

    fn entity(&self, uid: &str) -> Option<&str> {
        self.by_uid
            .get(uid)
            .filter(|(_, is_component)| !is_component)
            .map(|(name, _)| name.as_str())
    }

    fn component(&self, uid: &str) -> Option<&str> {
        self.by_uid
            .get(uid)
            .filter(|(_, is_component)| *is_component)
            .map(|(name, _)| name.as_str())
    }
}

fn build_entity(
    raw: &RawEntity,
    kind: EntityKind,
    known: &KnownEntities,
    filter: &SchemaFilter,
) -> Entity {
    let mut entity = Entity {
        uid: raw.uid.clone(),
        clean_name: clean_name(&raw.uid),
        kind,
        plugin_name: plugin_name(&raw.uid).map(str::to_string),
        attributes: Vec::new(),
        relations: Vec::new(),
        media: Vec::new(),
        components: Vec::new(),
        dynamic_zones: Vec::new(),
    };

    let mut fields: Vec<&RawField> = raw.fields.iter().collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));

    for field in fields {
        if filter.excludes_field(field) {
            continue;
        }
        match classify(field) {
            FieldClass::Scalar(ty) => entity.attributes.push(Attribute {
                name: field.name.clone(),
                ty,
                required: field.required,
            }),
            FieldClass::Relation => {
                if let Some(relation) = build_relation(&raw.uid, field, known, filter) {
                    entity.relations.push(relation);
                }
            }
            FieldClass::Media => entity.media.push(MediaField {
                name: field.name.clone(),
                multiple: field.multiple,
                required: field.required,
            }),
            FieldClass::Component => {
                let resolved = field
                    .component
                    .as_deref()
                    .and_then(|uid| known.component(uid).map(|name| (uid, name)));
                match resolved {
                    Some((uid, name)) => entity.components.push(ComponentField {
                        name: field.name.clone(),
                        component: uid.to_string(),
                        component_type: name.to_string(),
                        repeatable: field.repeatable,
                        required: field.required,
                    }),
                    None => debug!(
                        entity = %raw.uid,
                        field = %field.name,
                        "Dropping component field with unknown component."
                    ),
                }
            }
            FieldClass::DynamicZone => {
                let components: Vec<ZoneVariant> = field
                    .components
                    .iter()
                    .filter_map(|uid| {
                        known.component(uid).map(|name| ZoneVariant {
                            uid: uid.clone(),
                            component_type: name.to_string(),
                        })
                    })
                    .collect();
                if components.is_empty() {
                    debug!(
                        entity = %raw.uid,
                        field = %field.name,
                        "Dropping dynamic zone without known components."
                    );
                } else {
                    entity.dynamic_zones.push(DynamicZoneField {
                        name: field.name.clone(),
                        components,
                        required: field.required,
                    });
                }
            }
            FieldClass::Unknown => debug!(
                entity = %raw.uid,
                field = %field.name,
                kind = %field.kind,
                "Dropping field of unsupported kind."
            ),
        }
    }

    entity
}

fn build_relation(
    owner: &str,
    field: &RawField,
    known: &KnownEntities,
    filter: &SchemaFilter,
) -> Option<Relation> {
    let relation_type = field.relation.as_deref().and_then(RelationType::parse);
    let target = field.target.as_deref();

    let (Some(relation_type), Some(target)) = (relation_type, target) else {
        debug!(entity = %owner, field = %field.name, "Dropping relation without a usable kind or target.");
        return None;
    };
    if !filter.allows_uid(target) {
        debug!(entity = %owner, field = %field.name, target = %target, "Dropping relation to a filtered namespace.");
        return None;
    }
    let Some(target_type) = known.entity(target) else {
        debug!(entity = %owner, field = %field.name, target = %target, "Dropping relation to an unknown entity.");
        return None;
    };

    Some(Relation {
        name: field.name.clone(),
        relation_type,
        target: target.to_string(),
        target_type: target_type.to_string(),
        required: field.required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(name: &str, kind: &str, target: &str) -> RawField {
        RawField {
            relation: Some(kind.into()),
            target: Some(target.into()),
            ..RawField::new(name, "relation")
        }
    }

    fn entity(uid: &str, fields: Vec<RawField>) -> RawEntity {
        RawEntity {
            uid: uid.into(),
            kind: EntityKind::Collection,
            fields,
        }
    }

    #[test]
    fn test_classification_is_total() {
        assert_eq!(classify(&RawField::new("a", "relation")), FieldClass::Relation);
        assert_eq!(classify(&RawField::new("a", "media")), FieldClass::Media);
        assert_eq!(classify(&RawField::new("a", "component")), FieldClass::Component);
        assert_eq!(classify(&RawField::new("a", "dynamiczone")), FieldClass::DynamicZone);
        assert_eq!(
            classify(&RawField::new("a", "datetime")),
            FieldClass::Scalar(AttributeType::DateTime)
        );
        assert_eq!(classify(&RawField::new("a", "uid")), FieldClass::Unknown);
    }

    #[test]
    fn test_namespace_filter() {
        let filter = SchemaFilter::default();
        assert!(filter.allows_uid("api::item.item"));
        assert!(filter.allows_uid("shared.seo"));
        assert!(filter.allows_uid("plugin::users-permissions.user"));
        assert!(filter.allows_uid("plugin::users-permissions.role"));
        assert!(!filter.allows_uid("plugin::users-permissions.permission"));
        assert!(!filter.allows_uid("plugin::upload.file"));
        assert!(!filter.allows_uid("admin::user"));
        assert!(!filter.allows_uid("strapi::core-store"));
    }

    #[test]
    fn test_namespace_filter_extra_plugins() {
        let config = GeneratorConfig {
            include_plugins: vec!["blog".into()],
            ..GeneratorConfig::default()
        };
        let filter = SchemaFilter::from_config(&config);
        assert!(filter.allows_uid("plugin::blog.post"));
        assert!(!filter.allows_uid("plugin::i18n.locale"));
    }

    #[test]
    fn test_relation_target_filtering() {
        let schema = build_schema(
            vec![],
            vec![
                entity(
                    "api::item.item",
                    vec![
                        relation("owner", "manyToOne", "plugin::users-permissions.user"),
                        relation("author", "oneToOne", "admin::user"),
                        relation("file", "oneToOne", "plugin::upload.file"),
                        relation("ghost", "oneToOne", "api::ghost.ghost"),
                        relation("tags", "manyToMany", "api::tag.tag"),
                    ],
                ),
                entity("api::tag.tag", vec![]),
                entity("plugin::users-permissions.user", vec![]),
                entity("admin::user", vec![]),
                entity("plugin::upload.file", vec![]),
            ],
            &SchemaFilter::default(),
        );

        let uids: Vec<_> = schema.entities.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(
            uids,
            vec!["api::item.item", "api::tag.tag", "plugin::users-permissions.user"]
        );

        let item = &schema.entities[0];
        let names: Vec<_> = item.relations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["owner", "tags"]);
        assert_eq!(item.relations[0].target_type, "User");
        assert_eq!(
            schema.entities[2].plugin_name.as_deref(),
            Some("users-permissions")
        );
    }

    #[test]
    fn test_system_and_private_fields_are_excluded() {
        let mut secret = RawField::new("secret", "string");
        secret.private = true;
        let schema = build_schema(
            vec![],
            vec![entity(
                "api::item.item",
                vec![
                    RawField::new("id", "integer"),
                    RawField::new("createdAt", "datetime"),
                    RawField::new("locale", "string"),
                    secret,
                    RawField::new("title", "string"),
                ],
            )],
            &SchemaFilter::default(),
        );
        let names: Vec<_> = schema.entities[0]
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["title"]);
    }

    #[test]
    fn test_component_and_zone_resolution() {
        let seo = RawEntity {
            uid: "shared.seo".into(),
            kind: EntityKind::Component,
            fields: vec![RawField::new("metaTitle", "string")],
        };
        let mut seo_field = RawField::new("seo", "component");
        seo_field.component = Some("shared.seo".into());
        seo_field.repeatable = true;
        let mut zone = RawField::new("body", "dynamiczone");
        zone.components = vec!["shared.seo".into(), "shared.missing".into()];
        let mut empty_zone = RawField::new("sidebar", "dynamiczone");
        empty_zone.components = vec!["shared.missing".into()];

        let schema = build_schema(
            vec![seo],
            vec![entity("api::page.page", vec![seo_field, zone, empty_zone])],
            &SchemaFilter::default(),
        );

        let page = &schema.entities[0];
        assert_eq!(page.components.len(), 1);
        assert_eq!(page.components[0].component_type, "SharedSeo");
        assert!(page.components[0].repeatable);
        assert_eq!(page.dynamic_zones.len(), 1);
        assert_eq!(page.dynamic_zones[0].components.len(), 1);
        assert_eq!(schema.components[0].kind, EntityKind::Component);
    }

    #[test]
    fn test_unknown_kind_dropped_silently() {
        let schema = build_schema(
            vec![],
            vec![entity(
                "api::item.item",
                vec![RawField::new("slug", "uid"), RawField::new("title", "string")],
            )],
            &SchemaFilter::default(),
        );
        let item = &schema.entities[0];
        assert_eq!(item.attributes.len(), 1);
        assert!(item.relations.is_empty());
        assert!(item.media.is_empty());
    }

    #[test]
    fn test_clean_name_collision_keeps_both() {
        let schema = build_schema(
            vec![],
            vec![
                entity("api::item.item", vec![]),
                entity("api::store.item", vec![]),
            ],
            &SchemaFilter::default(),
        );
        assert_eq!(schema.entities.len(), 2);
        assert!(schema.entities.iter().all(|e| e.clean_name == "Item"));
    }
}
