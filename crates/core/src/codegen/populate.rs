//! Populate parameter types and the populate-aware payload type.
//!
//! For a populatable entity `X` this emits:
//!
//! - `XPopulateParam`: per populatable field, `true` or an options object
//! - `XPopulate`: every populate form a query accepts
//! - `XWithPopulate<P>`: the payload shape for populate spec `P`, a chain of
//!   exactly three conditionals (wildcard, key array, per-field object) with
//!   the base type as fallback
//!
//! Nested population is never unrolled. A populated relation refers to its
//! target's payload by name (`CategoryWithPopulate<Q>`), so self-referential
//! and mutually referential entities stay finite.

use super::TypeNames;
use super::entity::{one_or_many, tagged_variant};
use crate::schema::ir::{DynamicZoneField, Entity, ParsedSchema};
use crate::ts::{TsLiteral, TsPrimitive, TsProp, TsType, TsTypeDef, TsTypeParam};

/// Type parameter of the payload type.
pub const SPEC_PARAM: &str = "P";

/// One populatable field, reduced to what the payload type needs.
#[derive(Debug, Clone, Copy)]
enum Populated<'a> {
    /// Relation or component: a named target that may itself be populatable.
    Target {
        name: &'a str,
        target: &'a str,
        many: bool,
        /// Relations accept filters, sort and pagination; components do not.
        is_relation: bool,
    },
    /// Media reference.
    Media { name: &'a str, many: bool },
    /// Dynamic zone.
    Zone(&'a DynamicZoneField),
}

impl Populated<'_> {
    fn name(&self) -> &str {
        match self {
            Populated::Target { name, .. } | Populated::Media { name, .. } => *name,
            Populated::Zone(zone) => zone.name.as_str(),
        }
    }
}

/// Populatable fields in emission order: relations, media, components,
/// dynamic zones.
fn populated_fields(entity: &Entity) -> Vec<Populated<'_>> {
    let relations = entity.relations.iter().map(|r| Populated::Target {
        name: &r.name,
        target: &r.target_type,
        many: r.relation_type.is_to_many(),
        is_relation: true,
    });
    let media = entity.media.iter().map(|m| Populated::Media {
        name: &m.name,
        many: m.multiple,
    });
    let components = entity.components.iter().map(|c| Populated::Target {
        name: &c.name,
        target: &c.component_type,
        many: c.repeatable,
        is_relation: false,
    });
    let zones = entity.dynamic_zones.iter().map(Populated::Zone);
    relations.chain(media).chain(components).chain(zones).collect()
}

fn keys_of(type_name: &str) -> TsType {
    TsType::array(TsType::Keyof(Box::new(TsType::reference(type_name))))
}

fn true_or(options: Vec<TsProp>) -> TsType {
    TsType::Union(vec![
        TsType::Literal(TsLiteral::Bool(true)),
        TsType::Object(options),
    ])
}

/// Options object for populating a target: field selection, nested populate
/// when the target is populatable, and query options for relations.
fn target_options(target: &str, is_relation: bool, schema: &ParsedSchema) -> Vec<TsProp> {
    let names = TypeNames::of(target);
    let mut options = vec![TsProp::optional("fields", keys_of(&names.base))];
    if schema.is_populatable(target) {
        options.push(TsProp::optional("populate", TsType::reference(&names.populate)));
    }
    if is_relation {
        options.push(TsProp::optional("filters", TsType::reference(&names.filters)));
        options.push(TsProp::optional(
            "sort",
            TsType::generic("SortParam", vec![TsType::reference(&names.base)]),
        ));
        options.push(TsProp::optional("pagination", TsType::reference("PaginationParams")));
    }
    options
}

/// `interface XPopulateParam`
pub fn populate_param(entity: &Entity, schema: &ParsedSchema) -> TsTypeDef {
    let properties = populated_fields(entity)
        .iter()
        .map(|field| {
            let ty = match field {
                Populated::Target {
                    target,
                    is_relation,
                    ..
                } => true_or(target_options(target, *is_relation, schema)),
                Populated::Media { .. } => {
                    true_or(vec![TsProp::optional("fields", keys_of("MediaFile"))])
                }
                Populated::Zone(zone) => {
                    let variants = zone
                        .components
                        .iter()
                        .map(|variant| {
                            TsProp::optional(
                                &variant.uid,
                                true_or(target_options(&variant.component_type, false, schema)),
                            )
                        })
                        .collect();
                    true_or(vec![TsProp::optional("on", TsType::Object(variants))])
                }
            };
            TsProp::optional(field.name(), ty)
        })
        .collect();

    TsTypeDef::interface(TypeNames::of(&entity.clean_name).populate_param, properties)
}

/// `type XPopulate = "*" | true | readonly (keyof XPopulateParam)[] | XPopulateParam`
pub fn populate_alias(entity: &Entity) -> TsTypeDef {
    let names = TypeNames::of(&entity.clean_name);
    TsTypeDef::alias(
        &names.populate,
        TsType::Union(vec![
            wildcard(),
            TsType::ReadonlyArray(Box::new(TsType::Keyof(Box::new(TsType::reference(
                &names.populate_param,
            ))))),
            TsType::reference(&names.populate_param),
        ]),
    )
}

/// `"*" | true`
pub fn wildcard() -> TsType {
    TsType::Union(vec![
        TsType::string_literal("*"),
        TsType::Literal(TsLiteral::Bool(true)),
    ])
}

fn zone_union(zone: &DynamicZoneField) -> TsType {
    TsType::array(TsType::Union(
        zone.components
            .iter()
            .map(|variant| tagged_variant(TsType::reference(&variant.component_type), &variant.uid))
            .collect(),
    ))
}

/// Field value after one level of population.
fn one_level(field: &Populated<'_>) -> TsType {
    match field {
        Populated::Target { target, many, .. } => one_or_many(TsType::reference(*target), *many),
        Populated::Media { many, .. } => one_or_many(TsType::reference("MediaFile"), *many),
        Populated::Zone(zone) => zone_union(zone),
    }
}

fn select_fields(target: &str, spec: &str) -> TsType {
    TsType::generic(
        "SelectFields",
        vec![TsType::reference(target), TsType::reference(spec)],
    )
}

/// `SelectFields<T, S>`, extended for populatable targets with the target's
/// own payload under `S["populate"]`.
fn selected(target: &str, spec: &str, schema: &ParsedSchema) -> TsType {
    let shape = select_fields(target, spec);
    if !schema.is_populatable(target) {
        return shape;
    }
    let names = TypeNames::of(target);
    let extension = TsType::conditional(
        TsType::reference(spec),
        TsType::Object(vec![TsProp::required("populate", TsType::Infer("Q".into()))]),
        TsType::generic(
            "Omit",
            vec![
                TsType::generic(&names.with_populate, vec![TsType::reference("Q")]),
                TsType::Keyof(Box::new(TsType::reference(&names.base))),
            ],
        ),
        TsType::empty_object(),
    );
    TsType::Intersection(vec![shape, extension])
}

/// Dynamic zone value under spec `S`: each variant read from `S["on"][uid]`
/// when present, otherwise one level deep.
fn zone_selected(zone: &DynamicZoneField, schema: &ParsedSchema) -> TsType {
    TsType::array(TsType::Union(
        zone.components
            .iter()
            .map(|variant| {
                let ty = TsType::conditional(
                    TsType::reference("S"),
                    single_prop(
                        "on",
                        single_prop(&variant.uid, TsType::Infer("V".into())),
                    ),
                    selected(&variant.component_type, "V", schema),
                    TsType::reference(&variant.component_type),
                );
                tagged_variant(ty, &variant.uid)
            })
            .collect(),
    ))
}

/// Field value when populated with nested spec `S`.
fn nested(field: &Populated<'_>, schema: &ParsedSchema) -> TsType {
    match field {
        Populated::Target { target, many, .. } => one_or_many(selected(target, "S", schema), *many),
        Populated::Media { many, .. } => one_or_many(select_fields("MediaFile", "S"), *many),
        Populated::Zone(zone) => zone_selected(zone, schema),
    }
}

fn single_prop(name: &str, ty: TsType) -> TsType {
    TsType::Object(vec![TsProp::required(name, ty)])
}

fn with_base(base: &str, parts: Vec<TsType>) -> TsType {
    let mut members = vec![TsType::reference(base)];
    members.extend(parts);
    TsType::Intersection(members)
}

/// `type XWithPopulate<P>`
pub fn with_populate(entity: &Entity, schema: &ParsedSchema) -> TsTypeDef {
    let names = TypeNames::of(&entity.clean_name);
    let fields = populated_fields(entity);
    let spec = || TsType::reference(SPEC_PARAM);

    // Wildcard: every populatable field, one level deep.
    let all = with_base(
        &names.base,
        vec![TsType::Object(
            fields
                .iter()
                .map(|f| TsProp::required(f.name(), one_level(f)))
                .collect(),
        )],
    );

    // Key array: fields whose name is listed.
    let listed = with_base(
        &names.base,
        fields
            .iter()
            .map(|f| {
                TsType::conditional(
                    TsType::string_literal(f.name()),
                    TsType::reference("K"),
                    single_prop(f.name(), one_level(f)),
                    TsType::empty_object(),
                )
            })
            .collect(),
    );

    // Per-field object: fields keyed in the object, nested spec threaded through.
    let keyed = with_base(
        &names.base,
        fields
            .iter()
            .map(|f| {
                TsType::conditional(
                    spec(),
                    single_prop(f.name(), TsType::Infer("S".into())),
                    single_prop(f.name(), nested(f, schema)),
                    TsType::empty_object(),
                )
            })
            .collect(),
    );

    let payload = TsType::conditional(
        spec(),
        wildcard(),
        all,
        TsType::conditional(
            spec(),
            TsType::ReadonlyArray(Box::new(TsType::Infer("K".into()))),
            listed,
            TsType::conditional(
                spec(),
                TsType::Primitive(TsPrimitive::Object),
                keyed,
                TsType::reference(&names.base),
            ),
        ),
    );

    TsTypeDef::alias(&names.with_populate, payload)
        .with_type_params(vec![TsTypeParam::new(SPEC_PARAM)])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::schema::ir::{
        Attribute, AttributeType, EntityKind, MediaField, Relation, RelationType, ZoneVariant,
    };
    use crate::ts::Emit;

    fn entity(uid: &str, name: &str) -> Entity {
        Entity {
            uid: uid.into(),
            clean_name: name.into(),
            kind: EntityKind::Collection,
            plugin_name: None,
            attributes: vec![Attribute {
                name: "title".into(),
                ty: AttributeType::String,
                required: true,
            }],
            relations: vec![],
            media: vec![],
            components: vec![],
            dynamic_zones: vec![],
        }
    }

    fn relation(name: &str, kind: RelationType, target: &str) -> Relation {
        Relation {
            name: name.into(),
            relation_type: kind,
            target: format!("api::{0}.{0}", target.to_lowercase()),
            target_type: target.into(),
            required: false,
        }
    }

    /// Item -> Category (manyToOne), Category -> Item (oneToMany), Item has
    /// a single image; Tag has no populatable fields.
    fn schema() -> ParsedSchema {
        let mut item = entity("api::item.item", "Item");
        item.relations = vec![
            relation("category", RelationType::ManyToOne, "Category"),
            relation("tags", RelationType::ManyToMany, "Tag"),
        ];
        item.media = vec![MediaField {
            name: "image".into(),
            multiple: false,
            required: false,
        }];
        let mut category = entity("api::category.category", "Category");
        category.relations = vec![relation("items", RelationType::OneToMany, "Item")];
        ParsedSchema {
            entities: vec![category, item, entity("api::tag.tag", "Tag")],
            components: vec![],
        }
    }

    #[test]
    fn test_payload_has_three_conditionals_and_fallback() {
        let schema = schema();
        let item = schema.find_by_clean_name("Item").unwrap();
        let def = with_populate(item, &schema);
        let payload = def.aliased().unwrap();
        assert_eq!(payload.conditional_depth(), 3);

        let TsType::Conditional { extends, otherwise, .. } = payload else {
            panic!("payload is not a conditional");
        };
        assert_eq!(**extends, wildcard());
        let TsType::Conditional { extends, otherwise, .. } = &**otherwise else {
            panic!("second branch missing");
        };
        assert_eq!(**extends, TsType::ReadonlyArray(Box::new(TsType::Infer("K".into()))));
        let TsType::Conditional { extends, otherwise, .. } = &**otherwise else {
            panic!("third branch missing");
        };
        assert_eq!(**extends, TsType::Primitive(TsPrimitive::Object));
        assert_eq!(**otherwise, TsType::reference("Item"));
    }

    #[test]
    fn test_mutual_recursion_is_by_reference() {
        let schema = schema();
        let item = with_populate(schema.find_by_clean_name("Item").unwrap(), &schema);
        let category = with_populate(schema.find_by_clean_name("Category").unwrap(), &schema);

        let item_refs = item.aliased().unwrap().referenced_names();
        assert!(item_refs.contains(&"CategoryWithPopulate"));
        assert!(!item_refs.contains(&"ItemWithPopulate"));
        let category_refs = category.aliased().unwrap().referenced_names();
        assert!(category_refs.contains(&"ItemWithPopulate"));

        let ts_code = item.emit();
        assert!(ts_code.contains("Omit<CategoryWithPopulate<Q>, keyof Category>"));
        // Tag is not populatable, so no nested payload reference
        assert!(!ts_code.contains("TagWithPopulate"));
        assert!(ts_code.contains("{ tags: SelectFields<Tag, S>[] }"));
    }

    #[test]
    fn test_payload_branches_text() {
        let schema = schema();
        let ts_code = with_populate(schema.find_by_clean_name("Item").unwrap(), &schema).emit();
        assert!(ts_code.starts_with("export type ItemWithPopulate<P> = P extends \"*\" | true\n"));
        assert!(ts_code.contains(
            "  ? Item & { category: Category | null; tags: Tag[]; image: MediaFile | null }\n"
        ));
        assert!(ts_code.contains("  : P extends readonly (infer K)[]\n"));
        assert!(ts_code.contains("(\"category\" extends K ? { category: Category | null } : {})"));
        assert!(ts_code.contains("  : P extends object\n"));
        assert!(ts_code.contains("(P extends { category: infer S } ? { category: SelectFields<Category, S> & (S extends { populate: infer Q } ? Omit<CategoryWithPopulate<Q>, keyof Category> : {}) | null } : {})"));
        assert!(ts_code.contains("(P extends { image: infer S } ? { image: SelectFields<MediaFile, S> | null } : {})"));
        assert!(ts_code.ends_with("  : Item;\n"));
    }

    /// Page with a `body` zone whose `shared.hero` variant carries an image.
    fn zone_schema() -> ParsedSchema {
        let mut hero = entity("shared.hero", "SharedHero");
        hero.kind = EntityKind::Component;
        hero.media = vec![MediaField {
            name: "image".into(),
            multiple: false,
            required: false,
        }];
        let mut quote = entity("shared.quote", "SharedQuote");
        quote.kind = EntityKind::Component;
        let mut page = entity("api::page.page", "Page");
        page.dynamic_zones = vec![DynamicZoneField {
            name: "body".into(),
            components: vec![
                ZoneVariant {
                    uid: "shared.hero".into(),
                    component_type: "SharedHero".into(),
                },
                ZoneVariant {
                    uid: "shared.quote".into(),
                    component_type: "SharedQuote".into(),
                },
            ],
            required: false,
        }];
        ParsedSchema {
            entities: vec![page],
            components: vec![hero, quote],
        }
    }

    #[test]
    fn test_zone_payload_follows_per_variant_spec() {
        let schema = zone_schema();
        let page = schema.find_by_clean_name("Page").unwrap();

        let param = populate_param(page, &schema).emit();
        assert!(param.contains("body?: true | { on?: { \"shared.hero\"?: true | { fields?: (keyof SharedHero)[]; populate?: SharedHeroPopulate };"));

        let payload = with_populate(page, &schema).emit();
        // one level deep under the wildcard
        assert!(payload.contains("{ body: (SharedHero & { __component: \"shared.hero\" } | SharedQuote & { __component: \"shared.quote\" })[] }"));
        // per-field object: each variant reads its own options from `on`
        assert!(payload.contains("(S extends { on: { \"shared.hero\": infer V } } ? SelectFields<SharedHero, V> & (V extends { populate: infer Q } ? Omit<SharedHeroWithPopulate<Q>, keyof SharedHero> : {}) : SharedHero) & { __component: \"shared.hero\" }"));
        // non-populatable variants only narrow by field selection
        assert!(payload.contains("(S extends { on: { \"shared.quote\": infer V } } ? SelectFields<SharedQuote, V> : SharedQuote) & { __component: \"shared.quote\" }"));
        assert!(!payload.contains("SharedQuoteWithPopulate"));
    }

    #[test]
    fn test_populate_param() {
        let schema = schema();
        let ts_code = populate_param(schema.find_by_clean_name("Item").unwrap(), &schema).emit();
        assert!(ts_code.contains("export interface ItemPopulateParam {"));
        assert!(ts_code.contains("  category?: true | { fields?: (keyof Category)[]; populate?: CategoryPopulate; filters?: CategoryFilters; sort?: SortParam<Category>; pagination?: PaginationParams };\n"));
        assert!(ts_code.contains("  tags?: true | { fields?: (keyof Tag)[]; filters?: TagFilters;"));
        assert!(ts_code.contains("  image?: true | { fields?: (keyof MediaFile)[] };\n"));
    }

    #[test]
    fn test_populate_alias() {
        let schema = schema();
        let ts_code = populate_alias(schema.find_by_clean_name("Item").unwrap()).emit();
        assert_eq!(
            ts_code,
            "export type ItemPopulate = \"*\" | true | readonly (keyof ItemPopulateParam)[] | ItemPopulateParam;\n"
        );
    }
}
