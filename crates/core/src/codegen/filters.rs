//! Per-entity filter interfaces.

use super::TypeNames;
use crate::schema::ir::{AttributeType, Entity};
use crate::ts::{TsProp, TsType, TsTypeDef};

/// Operator interface used to filter a scalar attribute, if it is filterable.
fn operator_filter(ty: &AttributeType) -> Option<&'static str> {
    match ty {
        AttributeType::String
        | AttributeType::Text
        | AttributeType::RichText
        | AttributeType::Email
        | AttributeType::BigInteger
        | AttributeType::Enumeration { .. } => Some("StringFilter"),
        AttributeType::Integer | AttributeType::Float | AttributeType::Decimal => {
            Some("NumberFilter")
        }
        AttributeType::Boolean => Some("BooleanFilter"),
        AttributeType::Date | AttributeType::DateTime | AttributeType::Time => Some("DateFilter"),
        AttributeType::Json | AttributeType::Blocks => None,
    }
}

/// `interface XFilters`: identity fields, filterable scalars, relations and
/// media by id, plus the `$and` / `$or` / `$not` combinators.
pub fn filters_interface(entity: &Entity) -> TsTypeDef {
    let name = TypeNames::of(&entity.clean_name).filters;
    let filter = |ty: &str| TsType::reference(ty);

    let mut properties = vec![TsProp::optional("id", filter("NumberFilter"))];
    if !entity.is_component() {
        properties.push(TsProp::optional("documentId", filter("StringFilter")));
        for stamp in ["createdAt", "updatedAt", "publishedAt"] {
            properties.push(TsProp::optional(stamp, filter("DateFilter")));
        }
    }

    properties.extend(entity.attributes.iter().filter_map(|attr| {
        operator_filter(&attr.ty).map(|op| TsProp::optional(&attr.name, filter(op)))
    }));
    properties.extend(
        entity
            .relations
            .iter()
            .map(|r| &r.name)
            .chain(entity.media.iter().map(|m| &m.name))
            .map(|field| TsProp::optional(field, filter("IdFilter"))),
    );

    properties.push(TsProp::optional("$and", TsType::array(filter(&name))));
    properties.push(TsProp::optional("$or", TsType::array(filter(&name))));
    properties.push(TsProp::optional("$not", filter(&name)));

    TsTypeDef::interface(name, properties)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::ir::{Attribute, EntityKind, MediaField, Relation, RelationType};
    use crate::ts::Emit;

    fn attr(name: &str, ty: AttributeType) -> Attribute {
        Attribute {
            name: name.into(),
            ty,
            required: false,
        }
    }

    fn item() -> Entity {
        Entity {
            uid: "api::item.item".into(),
            clean_name: "Item".into(),
            kind: EntityKind::Collection,
            plugin_name: None,
            attributes: vec![
                attr("data", AttributeType::Json),
                attr("published", AttributeType::Boolean),
                attr("price", AttributeType::Decimal),
                attr("title", AttributeType::String),
            ],
            relations: vec![Relation {
                name: "category".into(),
                relation_type: RelationType::ManyToOne,
                target: "api::category.category".into(),
                target_type: "Category".into(),
                required: false,
            }],
            media: vec![MediaField {
                name: "image".into(),
                multiple: true,
                required: false,
            }],
            components: vec![],
            dynamic_zones: vec![],
        }
    }

    #[test]
    fn test_filters_interface() {
        let ts_code = filters_interface(&item()).emit();
        assert!(ts_code.starts_with("export interface ItemFilters {\n  id?: NumberFilter;\n"));
        assert!(ts_code.contains("  documentId?: StringFilter;\n"));
        assert!(ts_code.contains("  publishedAt?: DateFilter;\n"));
        assert!(ts_code.contains("  title?: StringFilter;\n"));
        assert!(ts_code.contains("  price?: NumberFilter;\n"));
        assert!(ts_code.contains("  published?: BooleanFilter;\n"));
        assert!(ts_code.contains("  category?: IdFilter;\n"));
        assert!(ts_code.contains("  image?: IdFilter;\n"));
        assert!(ts_code.contains("  $and?: ItemFilters[];\n"));
        assert!(ts_code.contains("  $or?: ItemFilters[];\n"));
        assert!(ts_code.ends_with("  $not?: ItemFilters;\n}\n"));
        // json is not filterable
        assert!(!ts_code.contains("data?"));
    }

    #[test]
    fn test_component_filters_skip_document_fields() {
        let mut seo = item();
        seo.kind = EntityKind::Component;
        seo.clean_name = "SharedSeo".into();
        let def = filters_interface(&seo);
        assert_eq!(def.name, "SharedSeoFilters");
        assert!(def.properties().iter().all(|p| p.name != "documentId"));
    }
}
