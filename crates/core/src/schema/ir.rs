//! Schema IR: the normalized entity graph shared by both extractors.
//!
//! Everything here is built once by [`super::classify::build_schema`] and only
//! read afterwards.

use serde::Serialize;

/// Whether a top-level entity has many instances or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// Collection type: reads return arrays
    Collection,
    /// Single type: exactly one instance
    Single,
    /// Reusable component embedded in other entities
    Component,
}

impl EntityKind {
    /// Parse the raw kind discriminant used by the backend.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "collectionType" | "collection" => Some(Self::Collection),
            "singleType" | "single" => Some(Self::Single),
            "component" => Some(Self::Component),
            _ => None,
        }
    }
}

/// Closed set of scalar attribute types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeType {
    /// Short text
    String,
    /// Long text
    Text,
    /// Markdown
    RichText,
    /// Structured rich-text blocks
    Blocks,
    /// Email address
    Email,
    /// 32-bit integer
    Integer,
    /// Integer beyond `Number` precision, serialized as a string
    BigInteger,
    /// Floating point
    Float,
    /// Decimal
    Decimal,
    /// Boolean
    Boolean,
    /// ISO date
    Date,
    /// ISO date and time
    DateTime,
    /// ISO time of day
    Time,
    /// Arbitrary JSON
    Json,
    /// One of a fixed set of strings
    Enumeration {
        /// Allowed values, in declaration order
        values: Vec<String>,
    },
}

impl AttributeType {
    /// Map a raw kind to a scalar type. Enumerations take their value set
    /// from the caller.
    pub fn from_kind(kind: &str, enum_values: &[String]) -> Option<Self> {
        let ty = match kind {
            "string" => Self::String,
            "text" => Self::Text,
            "richtext" => Self::RichText,
            "blocks" => Self::Blocks,
            "email" => Self::Email,
            "integer" => Self::Integer,
            "biginteger" => Self::BigInteger,
            "float" => Self::Float,
            "decimal" => Self::Decimal,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "time" => Self::Time,
            "json" => Self::Json,
            "enumeration" => Self::Enumeration {
                values: enum_values.to_vec(),
            },
            _ => return None,
        };
        Some(ty)
    }
}

/// A scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Field name
    pub name: String,
    /// Scalar type
    #[serde(flatten)]
    pub ty: AttributeType,
    /// Non-nullable in the base interface
    pub required: bool,
}

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationType {
    /// `oneToOne`
    OneToOne,
    /// `oneToMany`
    OneToMany,
    /// `manyToOne`
    ManyToOne,
    /// `manyToMany`
    ManyToMany,
}

impl RelationType {
    /// Parse a relation kind. Legacy one-way kinds fold into their
    /// bidirectional equivalent; polymorphic kinds are not supported.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "oneToOne" | "oneWay" => Some(Self::OneToOne),
            "oneToMany" | "manyWay" => Some(Self::OneToMany),
            "manyToOne" => Some(Self::ManyToOne),
            "manyToMany" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// Whether the populated value is an array.
    pub fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

/// A relation to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Field name
    pub name: String,
    /// Cardinality
    pub relation_type: RelationType,
    /// Target UID
    pub target: String,
    /// Clean name of the target
    pub target_type: String,
    /// Declared required
    pub required: bool,
}

/// A media reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaField {
    /// Field name
    pub name: String,
    /// Array of files rather than one
    pub multiple: bool,
    /// Declared required
    pub required: bool,
}

/// An embedded component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentField {
    /// Field name
    pub name: String,
    /// Component UID
    pub component: String,
    /// Clean name of the component
    pub component_type: String,
    /// Array of components rather than one
    pub repeatable: bool,
    /// Declared required
    pub required: bool,
}

/// One allowed variant of a dynamic zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneVariant {
    /// Component UID, also the `__component` tag
    pub uid: String,
    /// Clean name of the component
    pub component_type: String,
}

/// A polymorphic list of components drawn from a closed, ordered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicZoneField {
    /// Field name
    pub name: String,
    /// Allowed variants, in declaration order
    pub components: Vec<ZoneVariant>,
    /// Declared required
    pub required: bool,
}

/// A content type or a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Namespaced identity, e.g. `api::item.item`
    pub uid: String,
    /// PascalCase type name derived from the UID
    pub clean_name: String,
    /// Collection, single or component
    pub kind: EntityKind,
    /// Owning plugin for `plugin::<name>.<type>` UIDs.
    pub plugin_name: Option<String>,
    /// Scalar fields, sorted by name
    pub attributes: Vec<Attribute>,
    /// Relation fields, sorted by name
    pub relations: Vec<Relation>,
    /// Media fields, sorted by name
    pub media: Vec<MediaField>,
    /// Component fields, sorted by name
    pub components: Vec<ComponentField>,
    /// Dynamic zone fields, sorted by name
    pub dynamic_zones: Vec<DynamicZoneField>,
}

impl Entity {
    /// Whether the entity has any field a populate spec can expand.
    pub fn is_populatable(&self) -> bool {
        !self.relations.is_empty()
            || !self.media.is_empty()
            || !self.components.is_empty()
            || !self.dynamic_zones.is_empty()
    }

    /// Whether this is a component rather than a content type.
    pub fn is_component(&self) -> bool {
        self.kind == EntityKind::Component
    }
}

/// The aggregate root of one compilation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSchema {
    /// Content types, sorted by UID
    pub entities: Vec<Entity>,
    /// Components, sorted by UID
    pub components: Vec<Entity>,
}

impl ParsedSchema {
    /// Look up an entity or component by clean name.
    pub fn find_by_clean_name(&self, clean_name: &str) -> Option<&Entity> {
        self.all().find(|e| e.clean_name == clean_name)
    }

    /// Look up an entity or component by UID.
    pub fn find_by_uid(&self, uid: &str) -> Option<&Entity> {
        self.all().find(|e| e.uid == uid)
    }

    /// Components first, then top-level entities.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.components.iter().chain(self.entities.iter())
    }

    /// Whether the entity with this clean name is populatable.
    pub fn is_populatable(&self, clean_name: &str) -> bool {
        self.find_by_clean_name(clean_name)
            .is_some_and(Entity::is_populatable)
    }
}
