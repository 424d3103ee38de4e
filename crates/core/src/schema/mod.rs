//! Schema extraction: two front-ends lowering into one IR.

pub mod classify;
pub mod declaration;
pub mod ir;
pub mod naming;
pub mod structured;

pub use classify::SchemaFilter;
pub use declaration::{DeclarationExtractor, DeclarationSources};
pub use ir::{Entity, EntityKind, ParsedSchema};
pub use structured::{SchemaInput, StructuredExtractor};

use crate::error::Result;

/// A schema front-end. Implementations only lower their input; classification
/// and target resolution happen in [`classify::build_schema`].
pub trait SchemaExtractor {
    /// Source document type.
    type Input;

    /// Lower `input` and build the Schema IR.
    fn extract(&self, input: &Self::Input) -> Result<ParsedSchema>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
  "entities": {
    "api::item.item": {
      "kind": "collectionType",
      "attributes": {
        "title": { "type": "string", "required": true },
        "price": { "type": "decimal" },
        "status": { "type": "enumeration", "enum": ["draft", "live"] },
        "category": { "type": "relation", "relation": "manyToOne", "target": "api::category.category" },
        "cover": { "type": "media", "multiple": false },
        "seo": { "type": "component", "component": "shared.seo", "repeatable": false },
        "body": { "type": "dynamiczone", "components": ["shared.seo"] }
      }
    },
    "api::category.category": {
      "kind": "collectionType",
      "attributes": {
        "name": { "type": "string" },
        "items": { "type": "relation", "relation": "oneToMany", "target": "api::item.item" }
      }
    }
  },
  "components": {
    "shared.seo": { "attributes": { "metaTitle": { "type": "string" } } }
  }
}"#;

    const CONTENT_TYPES: &str = r#"
export interface ApiItemItem extends Struct.CollectionTypeSchema {
  attributes: {
    body: Schema.Attribute.DynamicZone<['shared.seo']>;
    category: Schema.Attribute.Relation<'manyToOne', 'api::category.category'>;
    cover: Schema.Attribute.Media<'images'>;
    price: Schema.Attribute.Decimal;
    seo: Schema.Attribute.Component<'shared.seo', false>;
    status: Schema.Attribute.Enumeration<['draft', 'live']>;
    title: Schema.Attribute.String & Schema.Attribute.Required;
  };
}
export interface ApiCategoryCategory extends Struct.CollectionTypeSchema {
  attributes: {
    items: Schema.Attribute.Relation<'oneToMany', 'api::item.item'>;
    name: Schema.Attribute.String;
  };
}
"#;

    const COMPONENTS: &str = r#"
export interface SharedSeo extends Struct.ComponentSchema {
  attributes: { metaTitle: Schema.Attribute.String };
}
"#;

    #[test]
    fn test_front_ends_produce_identical_ir() {
        let from_json = StructuredExtractor::default()
            .extract(&SchemaInput::from_json(JSON).unwrap())
            .unwrap();
        let from_text = DeclarationExtractor::default()
            .extract(&DeclarationSources {
                content_types: CONTENT_TYPES.into(),
                components: COMPONENTS.into(),
            })
            .unwrap();
        assert_eq!(from_json, from_text);
    }
}
