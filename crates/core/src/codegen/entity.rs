//! Base and input interfaces.

use super::TypeNames;
use crate::schema::ir::{AttributeType, Entity};
use crate::ts::{TsProp, TsType, TsTypeDef};

/// TypeScript type of a scalar attribute value.
pub fn scalar_type(ty: &AttributeType) -> TsType {
    match ty {
        AttributeType::String
        | AttributeType::Text
        | AttributeType::RichText
        | AttributeType::Email
        | AttributeType::BigInteger
        | AttributeType::Date
        | AttributeType::DateTime
        | AttributeType::Time => TsType::string(),
        AttributeType::Integer | AttributeType::Float | AttributeType::Decimal => TsType::number(),
        AttributeType::Boolean => TsType::boolean(),
        AttributeType::Blocks => TsType::reference("BlocksContent"),
        AttributeType::Json => TsType::reference("JsonValue"),
        AttributeType::Enumeration { values } if values.is_empty() => TsType::string(),
        AttributeType::Enumeration { values } => {
            TsType::Union(values.iter().map(TsType::string_literal).collect())
        }
    }
}

fn identity_fields(entity: &Entity) -> Vec<TsProp> {
    let mut props = vec![TsProp::required("id", TsType::number())];
    if !entity.is_component() {
        props.extend([
            TsProp::required("documentId", TsType::string()),
            TsProp::required("createdAt", TsType::string()),
            TsProp::required("updatedAt", TsType::string()),
            TsProp::required("publishedAt", TsType::nullable(TsType::string())),
        ]);
    }
    props
}

/// `interface X`: identity fields plus every scalar attribute. Optional
/// attributes are present but nullable.
pub fn base_interface(entity: &Entity) -> TsTypeDef {
    let mut properties = identity_fields(entity);
    properties.extend(entity.attributes.iter().map(|attr| {
        let ty = scalar_type(&attr.ty);
        let ty = if attr.required { ty } else { TsType::nullable(ty) };
        TsProp::required(&attr.name, ty)
    }));

    TsTypeDef::interface(TypeNames::of(&entity.clean_name).base, properties).with_doc(&entity.uid)
}

/// `T[]` when `many`, otherwise `T | null`.
pub fn one_or_many(item: TsType, many: bool) -> TsType {
    if many {
        TsType::array(item)
    } else {
        TsType::nullable(item)
    }
}

/// `interface XInput`: the write shape. Every field is optional; relations
/// and media take ids, components take their own input shape.
pub fn input_interface(entity: &Entity) -> TsTypeDef {
    let mut properties = Vec::new();
    if entity.is_component() {
        properties.push(TsProp::optional("id", TsType::number()));
    }

    for attr in &entity.attributes {
        let ty = scalar_type(&attr.ty);
        let ty = if attr.required { ty } else { TsType::nullable(ty) };
        properties.push(TsProp::optional(&attr.name, ty));
    }
    for relation in &entity.relations {
        let ty = one_or_many(TsType::number(), relation.relation_type.is_to_many());
        properties.push(TsProp::optional(&relation.name, ty));
    }
    for media in &entity.media {
        properties.push(TsProp::optional(
            &media.name,
            one_or_many(TsType::number(), media.multiple),
        ));
    }
    for component in &entity.components {
        let input = TsType::reference(TypeNames::of(&component.component_type).input);
        properties.push(TsProp::optional(
            &component.name,
            one_or_many(input, component.repeatable),
        ));
    }
    for zone in &entity.dynamic_zones {
        let variants = zone
            .components
            .iter()
            .map(|variant| {
                tagged_variant(
                    TsType::reference(TypeNames::of(&variant.component_type).input),
                    &variant.uid,
                )
            })
            .collect();
        properties.push(TsProp::optional(&zone.name, TsType::array(TsType::Union(variants))));
    }

    TsTypeDef::interface(TypeNames::of(&entity.clean_name).input, properties)
}

/// `T & { __component: "uid" }`
pub fn tagged_variant(ty: TsType, uid: &str) -> TsType {
    TsType::Intersection(vec![
        ty,
        TsType::Object(vec![TsProp::required("__component", TsType::string_literal(uid))]),
    ])
}
