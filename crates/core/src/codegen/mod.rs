//! Synthesis: Schema IR + Route IR -> TypeScript document model.
//!
//! - `entity`: base and input interfaces
//! - `populate`: populate parameter types and the populate-aware payload
//! - `filters`: per-entity filter interfaces
//! - `routes`: per-controller namespaces for custom route types
//! - `client`: CRUD wrappers, custom route extensions and the aggregate client
//! - `prelude`: hand-written shared declarations and the client runtime

pub mod client;
pub mod entity;
pub mod filters;
pub mod populate;
pub mod prelude;
pub mod routes;

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::routes::RouteSet;
use crate::schema::ParsedSchema;
use crate::ts::{TsItem, TsModule};

/// Names of every declaration generated for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    /// Base interface: `X`
    pub base: String,
    /// Write shape: `XInput`
    pub input: String,
    /// Per-field populate options: `XPopulateParam`
    pub populate_param: String,
    /// Accepted populate forms: `XPopulate`
    pub populate: String,
    /// Populate-aware payload: `XWithPopulate`
    pub with_populate: String,
    /// Filter interface: `XFilters`
    pub filters: String,
    /// CRUD client class: `XAPI`
    pub api: String,
    /// CRUD class extended with custom routes: `XExtendedAPI`
    pub extended_api: String,
}

impl TypeNames {
    /// Names for the entity with this clean name.
    pub fn of(clean_name: &str) -> Self {
        Self {
            base: clean_name.to_string(),
            input: format!("{clean_name}Input"),
            populate_param: format!("{clean_name}PopulateParam"),
            populate: format!("{clean_name}Populate"),
            with_populate: format!("{clean_name}WithPopulate"),
            filters: format!("{clean_name}Filters"),
            api: format!("{clean_name}API"),
            extended_api: format!("{clean_name}ExtendedAPI"),
        }
    }
}

/// Header lines shared by both generated files. Never includes the
/// generation timestamp.
pub fn header(schema_hash: &str) -> Vec<String> {
    vec![
        "Generated by cms-typegen. Do not edit.".to_string(),
        format!("Schema hash: {schema_hash}"),
    ]
}

/// Build the types module: prelude, then per entity (components first) the
/// base, input, populate, payload and filter declarations, then custom route
/// namespaces.
pub fn synthesize_types(schema: &ParsedSchema, routes: &RouteSet, schema_hash: &str) -> TsModule {
    let mut items = vec![TsItem::Raw(prelude::TYPES_PRELUDE.to_string())];

    for entity in schema.all() {
        items.push(TsItem::Type(entity::base_interface(entity)));
        items.push(TsItem::Type(entity::input_interface(entity)));
        if entity.is_populatable() {
            items.push(TsItem::Type(populate::populate_param(entity, schema)));
            items.push(TsItem::Type(populate::populate_alias(entity)));
            items.push(TsItem::Type(populate::with_populate(entity, schema)));
        }
        items.push(TsItem::Type(filters::filters_interface(entity)));
    }

    let namespaces = routes::route_namespaces(routes);
    debug!(
        entities = schema.entities.len(),
        components = schema.components.len(),
        namespaces = namespaces.len(),
        "Synthesized types module."
    );
    items.extend(namespaces.into_iter().map(TsItem::Type));

    TsModule {
        header: header(schema_hash),
        imports: Vec::new(),
        items,
    }
}

/// Build the client module against an already synthesized types module.
pub fn synthesize_client(
    schema: &ParsedSchema,
    routes: &RouteSet,
    types: &TsModule,
    config: &GeneratorConfig,
    schema_hash: &str,
) -> TsModule {
    client::client_module(schema, routes, types, config, schema_hash)
}
