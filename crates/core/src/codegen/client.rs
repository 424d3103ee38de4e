//! Client synthesis: typed CRUD wrappers, custom route extensions and the
//! aggregate `ApiClient`.
//!
//! Every class extends the runtime `BaseAPI` from the client prelude. Read
//! methods of populatable entities carry three populate overloads ahead of a
//! general fallback, in the same order as the branches of `XWithPopulate<P>`,
//! so the overload TypeScript picks always lands on the matching branch.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::populate::{SPEC_PARAM, wildcard};
use super::prelude::{PRELUDE_TYPE_NAMES, client_runtime};
use super::routes::{ActionTypeNames, qualified_controller};
use super::{TypeNames, header};
use crate::config::GeneratorConfig;
use crate::routes::{ParsedRoute, PathPiece, RouteSet, path_pieces};
use crate::schema::ir::{Entity, EntityKind, ParsedSchema};
use crate::schema::naming::{endpoint_name, namespace_name, split_uid, to_camel_case};
use crate::ts::utils::sanitize_ts_identifier;
use crate::ts::{
    ClassMember, TemplatePart, TsClass, TsExpr, TsFunction, TsImport, TsItem, TsMethod, TsModule,
    TsParam, TsPrimitive, TsProp, TsSignature, TsStmt, TsType, TsTypeParam,
};

/// Actions served by the generated CRUD surface.
pub const CORE_ACTIONS: &[&str] = &["find", "findOne", "create", "update", "delete"];

const ROOT_CLASS: &str = "ApiClient";

// =============================================================================
// Naming and paths
// =============================================================================

/// Controller name an entity's routes are declared under: the final UID
/// segment (`api::item.item` -> `item`).
pub fn controller_of(entity: &Entity) -> &str {
    let (_, rest) = split_uid(&entity.uid);
    rest.rsplit('.').next().unwrap_or(rest)
}

/// Base path of an entity's CRUD endpoint. Plugin-owned entities keep their
/// plugin segment unless a route of the same plugin's controller opted out
/// with an empty prefix.
pub fn entity_endpoint(entity: &Entity, routes: &RouteSet) -> String {
    let endpoint = endpoint_name(&entity.clean_name, entity.kind == EntityKind::Single);
    match &entity.plugin_name {
        Some(plugin) if !routes.has_empty_prefix(controller_of(entity), Some(plugin)) => {
            format!("/{plugin}/{endpoint}")
        }
        _ => format!("/{endpoint}"),
    }
}

/// Full path of a custom route, before parameter substitution.
pub fn route_path(route: &ParsedRoute) -> String {
    match (&route.prefix, &route.plugin_name) {
        (Some(prefix), _) => format!("{prefix}{}", route.path),
        (None, Some(plugin)) => format!("/{plugin}{}", route.path),
        (None, None) => route.path.clone(),
    }
}

/// `encodeURIComponent(String(<expr>))`
fn encoded(expr: TsExpr) -> TsExpr {
    TsExpr::call(
        TsExpr::ident("encodeURIComponent"),
        vec![TsExpr::call(TsExpr::ident("String"), vec![expr])],
    )
}

/// Path template with every `:param` read from `params`.
fn path_template(path: &str) -> TsExpr {
    let pieces = path_pieces(path);
    if !pieces.iter().any(|piece| matches!(piece, PathPiece::Param(_))) {
        return TsExpr::string(path);
    }
    TsExpr::Template(
        pieces
            .into_iter()
            .map(|piece| match piece {
                PathPiece::Literal(text) => TemplatePart::Static(text.to_string()),
                PathPiece::Param(name) => {
                    TemplatePart::Dynamic(encoded(TsExpr::member(TsExpr::ident("params"), name)))
                }
            })
            .collect(),
    )
}

// =============================================================================
// Method building blocks
// =============================================================================

fn promise(inner: TsType) -> TsType {
    TsType::generic("Promise", vec![inner])
}

fn any() -> TsType {
    TsType::Primitive(TsPrimitive::Any)
}

fn id_type() -> TsType {
    TsType::Union(vec![TsType::number(), TsType::string()])
}

/// `await this.request<T>(method, path, options)`
fn request(method: &str, response: TsType, path: TsExpr, options: Vec<(String, TsExpr)>) -> TsExpr {
    let mut args = vec![TsExpr::string(method), path];
    if !options.is_empty() {
        args.push(TsExpr::Object(options));
    }
    TsExpr::Call {
        callee: Box::new(TsExpr::this("request")),
        type_args: vec![response],
        args,
    }
    .awaited()
}

fn endpoint_path() -> TsExpr {
    TsExpr::this("endpoint")
}

/// `${this.endpoint}/${encodeURIComponent(String(id))}`
fn item_path() -> TsExpr {
    TsExpr::Template(vec![
        TemplatePart::Dynamic(endpoint_path()),
        TemplatePart::Static("/".into()),
        TemplatePart::Dynamic(encoded(TsExpr::ident("id"))),
    ])
}

fn query_option() -> (String, TsExpr) {
    ("query".into(), TsExpr::ident("params"))
}

/// `{ data: data }` wrapped as the request body.
fn data_body() -> (String, TsExpr) {
    (
        "body".into(),
        TsExpr::Object(vec![("data".into(), TsExpr::ident("data"))]),
    )
}

fn method(name: &str, overloads: Vec<TsSignature>, implementation: TsSignature, body: Vec<TsStmt>) -> ClassMember {
    ClassMember::Method(TsMethod {
        name: name.to_string(),
        overloads,
        implementation,
        body,
        is_async: true,
        doc: None,
    })
}

/// Signatures of a read method.
///
/// Populatable entities get, in order: the wildcard overload, the key array
/// overload, the per-field object overload and a general fallback, with an
/// untyped implementation signature. Other entities get one typed signature.
fn read_signatures(
    entity: &Entity,
    leading: &[TsParam],
    wrap: impl Fn(TsType) -> TsType,
) -> (Vec<TsSignature>, TsSignature) {
    let names = TypeNames::of(&entity.clean_name);
    let query = TsType::generic(
        "QueryParams",
        vec![TsType::reference(&names.base), TsType::reference(&names.filters)],
    );

    if !entity.is_populatable() {
        let mut params = leading.to_vec();
        params.push(TsParam::optional("params", query));
        let signature = TsSignature {
            type_params: Vec::new(),
            params,
            return_type: Some(promise(wrap(TsType::reference(&names.base)))),
        };
        return (Vec::new(), signature);
    }

    let spec_constraints = [
        (wildcard(), false),
        (
            TsType::ReadonlyArray(Box::new(TsType::Keyof(Box::new(TsType::reference(
                &names.populate_param,
            ))))),
            true,
        ),
        (TsType::reference(&names.populate_param), true),
    ];
    let mut overloads: Vec<TsSignature> = spec_constraints
        .into_iter()
        .map(|(constraint, is_const)| {
            let mut params = leading.to_vec();
            params.push(TsParam::new(
                "params",
                TsType::Intersection(vec![
                    query.clone(),
                    TsType::Object(vec![TsProp::required("populate", TsType::reference(SPEC_PARAM))]),
                ]),
            ));
            TsSignature {
                type_params: vec![TsTypeParam {
                    is_const,
                    ..TsTypeParam::extends(SPEC_PARAM, constraint)
                }],
                params,
                return_type: Some(promise(wrap(TsType::generic(
                    &names.with_populate,
                    vec![TsType::reference(SPEC_PARAM)],
                )))),
            }
        })
        .collect();

    let mut fallback_params = leading.to_vec();
    fallback_params.push(TsParam::optional(
        "params",
        TsType::Intersection(vec![
            query,
            TsType::Object(vec![TsProp::optional("populate", TsType::reference(&names.populate))]),
        ]),
    ));
    overloads.push(TsSignature {
        type_params: Vec::new(),
        params: fallback_params,
        return_type: Some(promise(wrap(TsType::reference(&names.base)))),
    });

    let mut impl_params = leading.to_vec();
    impl_params.push(TsParam::optional("params", any()));
    let implementation = TsSignature {
        type_params: Vec::new(),
        params: impl_params,
        return_type: Some(promise(any())),
    };
    (overloads, implementation)
}

fn return_data(call: TsExpr) -> Vec<TsStmt> {
    vec![
        TsStmt::Const {
            name: "response".into(),
            init: call,
        },
        TsStmt::Return(Some(TsExpr::member(TsExpr::ident("response"), "data"))),
    ]
}

// =============================================================================
// CRUD classes
// =============================================================================

fn constructor(endpoint: TsExpr) -> ClassMember {
    ClassMember::Constructor {
        params: vec![TsParam::new("config", TsType::reference("ClientConfig"))],
        body: vec![TsStmt::Expr(TsExpr::call(
            TsExpr::ident("super"),
            vec![TsExpr::ident("config"), endpoint],
        ))],
    }
}

fn collection_methods(entity: &Entity, names: &TypeNames) -> Vec<ClassMember> {
    let base = || TsType::reference(&names.base);
    let id_param = TsParam::new("id", id_type());
    let mut members = Vec::new();

    let (overloads, implementation) = read_signatures(entity, &[], TsType::array);
    members.push(method(
        "find",
        overloads,
        implementation,
        return_data(request(
            "GET",
            TsType::generic("ListResponse", vec![base()]),
            endpoint_path(),
            vec![query_option()],
        )),
    ));

    let (overloads, implementation) = read_signatures(entity, &[], |t| {
        TsType::generic("ListResponse", vec![t])
    });
    members.push(method(
        "findWithMeta",
        overloads,
        implementation,
        vec![TsStmt::Return(Some(request(
            "GET",
            TsType::generic("ListResponse", vec![base()]),
            endpoint_path(),
            vec![query_option()],
        )))],
    ));

    let (overloads, implementation) =
        read_signatures(entity, std::slice::from_ref(&id_param), TsType::nullable);
    members.push(method(
        "findOne",
        overloads,
        implementation,
        vec![TsStmt::Try {
            body: return_data(request(
                "GET",
                TsType::generic("SingleResponse", vec![base()]),
                item_path(),
                vec![query_option()],
            )),
            binding: "error".into(),
            handler: vec![TsStmt::Raw(
                "if (error instanceof ApiError && error.status === 404) {\n  return null;\n}\nthrow error;"
                    .into(),
            )],
        }],
    ));

    members.push(method(
        "create",
        Vec::new(),
        TsSignature {
            type_params: Vec::new(),
            params: vec![TsParam::new("data", TsType::reference(&names.input))],
            return_type: Some(promise(base())),
        },
        return_data(request(
            "POST",
            TsType::generic("SingleResponse", vec![base()]),
            endpoint_path(),
            vec![data_body()],
        )),
    ));

    members.push(method(
        "update",
        Vec::new(),
        TsSignature {
            type_params: Vec::new(),
            params: vec![
                id_param.clone(),
                TsParam::new("data", TsType::generic("Partial", vec![TsType::reference(&names.input)])),
            ],
            return_type: Some(promise(base())),
        },
        return_data(request(
            "PUT",
            TsType::generic("SingleResponse", vec![base()]),
            item_path(),
            vec![data_body()],
        )),
    ));

    members.push(method(
        "delete",
        Vec::new(),
        TsSignature {
            type_params: Vec::new(),
            params: vec![id_param],
            return_type: Some(promise(TsType::Primitive(TsPrimitive::Void))),
        },
        vec![TsStmt::Expr(request(
            "DELETE",
            TsType::Primitive(TsPrimitive::Unknown),
            item_path(),
            Vec::new(),
        ))],
    ));

    members
}

fn single_methods(entity: &Entity, names: &TypeNames) -> Vec<ClassMember> {
    let base = || TsType::reference(&names.base);
    let (overloads, implementation) = read_signatures(entity, &[], |t| t);
    vec![
        method(
            "find",
            overloads,
            implementation,
            return_data(request(
                "GET",
                TsType::generic("SingleResponse", vec![base()]),
                endpoint_path(),
                vec![query_option()],
            )),
        ),
        method(
            "update",
            Vec::new(),
            TsSignature {
                type_params: Vec::new(),
                params: vec![TsParam::new(
                    "data",
                    TsType::generic("Partial", vec![TsType::reference(&names.input)]),
                )],
                return_type: Some(promise(base())),
            },
            return_data(request(
                "PUT",
                TsType::generic("SingleResponse", vec![base()]),
                endpoint_path(),
                vec![data_body()],
            )),
        ),
    ]
}

/// `class XAPI extends BaseAPI` with the CRUD surface of the entity's kind.
pub fn crud_class(entity: &Entity, routes: &RouteSet) -> TsClass {
    let names = TypeNames::of(&entity.clean_name);
    let mut members = vec![constructor(TsExpr::string(entity_endpoint(entity, routes)))];
    members.extend(match entity.kind {
        EntityKind::Single => single_methods(entity, &names),
        EntityKind::Collection | EntityKind::Component => collection_methods(entity, &names),
    });

    TsClass {
        name: names.api,
        extends: Some(TsType::reference("BaseAPI")),
        members,
        doc: Some(entity.uid.clone()),
    }
}

// =============================================================================
// Custom routes
// =============================================================================

/// One method calling a custom route. Type texts come from the controller's
/// namespace when declared; missing slots fall back to loose types.
fn custom_method(route: &ParsedRoute, routes: &RouteSet) -> ClassMember {
    let namespace = namespace_name(&qualified_controller(
        routes,
        &route.controller,
        route.plugin_name.as_deref(),
    ));
    let names = ActionTypeNames::of(&route.action);
    let types = routes.types_for(&route.handler);
    let declared = |slot: Option<&String>, name: &str| {
        slot.map(|_| TsType::reference(format!("{namespace}.{name}")))
    };

    let mut params = Vec::new();
    let mut options = Vec::new();
    if !route.params.is_empty() {
        let ty = declared(types.and_then(|t| t.params.as_ref()), &names.params).unwrap_or_else(|| {
            TsType::Object(
                route
                    .params
                    .iter()
                    .map(|p| TsProp::required(p, id_type()))
                    .collect(),
            )
        });
        params.push(TsParam::new("params", ty));
    }
    if matches!(route.method.as_str(), "POST" | "PUT" | "PATCH") {
        let ty = declared(types.and_then(|t| t.body.as_ref()), &names.request)
            .unwrap_or(TsType::Primitive(TsPrimitive::Unknown));
        params.push(TsParam::new("body", ty));
        options.push(("body".to_string(), TsExpr::ident("body")));
    }
    let query = declared(types.and_then(|t| t.query.as_ref()), &names.query).unwrap_or_else(|| {
        TsType::Record {
            key: Box::new(TsType::string()),
            value: Box::new(TsType::Primitive(TsPrimitive::Unknown)),
        }
    });
    params.push(TsParam::optional("query", query));
    options.push(("query".to_string(), TsExpr::ident("query")));

    let response = declared(types.and_then(|t| t.response.as_ref()), &names.response)
        .unwrap_or(TsType::Primitive(TsPrimitive::Unknown));

    let mut member = method(
        &sanitize_ts_identifier(&route.action),
        Vec::new(),
        TsSignature {
            type_params: Vec::new(),
            params,
            return_type: Some(promise(response.clone())),
        },
        vec![TsStmt::Return(Some(request(
            &route.method,
            response,
            path_template(&route_path(route)),
            options,
        )))],
    );
    if let ClassMember::Method(m) = &mut member {
        m.doc = Some(format!("{} {}", route.method, route_path(route)));
    }
    member
}

/// Methods for `routes`, one per distinct method name. Routes of core
/// actions are left out when `skip_core` is set.
fn custom_methods(routes: &[&ParsedRoute], all: &RouteSet, skip_core: bool) -> Vec<ClassMember> {
    let mut seen = BTreeSet::new();
    routes
        .iter()
        .filter(|route| !(skip_core && CORE_ACTIONS.contains(&route.action.as_str())))
        .filter(|route| {
            let fresh = seen.insert(sanitize_ts_identifier(&route.action));
            if !fresh {
                warn!(handler = %route.handler, method = %route.method, "Skipping route whose action already has a client method.");
            }
            fresh
        })
        .map(|route| custom_method(route, all))
        .collect()
}

// =============================================================================
// Module
// =============================================================================

/// `class ApiClient` holding one API instance per property, plus the
/// `createClient` helper.
fn root_client(properties: &[(String, String)]) -> (TsClass, TsFunction) {
    let mut members: Vec<ClassMember> = properties
        .iter()
        .map(|(name, class)| ClassMember::Property {
            name: name.clone(),
            ty: TsType::reference(class),
            readonly: true,
        })
        .collect();
    members.push(ClassMember::Constructor {
        params: vec![TsParam::new("config", TsType::reference("ClientConfig"))],
        body: properties
            .iter()
            .map(|(name, class)| TsStmt::Raw(format!("this.{name} = new {class}(config);")))
            .collect(),
    });

    let class = TsClass {
        name: ROOT_CLASS.to_string(),
        extends: None,
        members,
        doc: None,
    };
    let create = TsFunction {
        name: "createClient".to_string(),
        signature: TsSignature {
            type_params: Vec::new(),
            params: vec![TsParam::new("config", TsType::reference("ClientConfig"))],
            return_type: Some(TsType::reference(ROOT_CLASS)),
        },
        body: vec![TsStmt::Return(Some(TsExpr::New {
            callee: Box::new(TsExpr::ident(ROOT_CLASS)),
            args: vec![TsExpr::ident("config")],
        }))],
    };
    (class, create)
}

/// Type names the client has to import from the types module: every
/// referenced name declared there, namespaces by their first segment.
fn type_imports(items: &[TsItem], types: &TsModule) -> Vec<String> {
    let declared: BTreeSet<&str> = types
        .type_defs()
        .map(|def| def.name.as_str())
        .chain(PRELUDE_TYPE_NAMES.iter().copied())
        .collect();

    items
        .iter()
        .flat_map(|item| match item {
            TsItem::Class(class) => class.referenced_names(),
            TsItem::Function(function) => function.referenced_names(),
            TsItem::Raw(_) | TsItem::Type(_) => Vec::new(),
        })
        .map(|name| name.split('.').next().unwrap_or(name))
        .filter(|name| declared.contains(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn push_property(properties: &mut Vec<(String, String)>, name: String, class: String) {
    if properties.iter().any(|(existing, _)| *existing == name) {
        warn!(property = %name, class = %class, "Skipping client property with a duplicate name.");
    } else {
        properties.push((name, class));
    }
}

/// Build the client module against an already synthesized types module.
pub fn client_module(
    schema: &ParsedSchema,
    routes: &RouteSet,
    types: &TsModule,
    config: &GeneratorConfig,
    schema_hash: &str,
) -> TsModule {
    let mut classes: Vec<TsClass> = Vec::new();
    let mut properties: Vec<(String, String)> = Vec::new();
    let mut claimed: BTreeSet<(&str, Option<&str>)> = BTreeSet::new();

    for entity in &schema.entities {
        let controller = controller_of(entity);
        let plugin = entity.plugin_name.as_deref();
        claimed.insert((controller, plugin));

        let crud = crud_class(entity, routes);
        let mut exposed = crud.name.clone();
        let own_routes: Vec<&ParsedRoute> = routes
            .routes
            .iter()
            .filter(|r| r.controller == controller && r.plugin_name.as_deref() == plugin)
            .collect();
        let custom = custom_methods(&own_routes, routes, true);
        classes.push(crud);

        if !custom.is_empty() {
            let names = TypeNames::of(&entity.clean_name);
            exposed = names.extended_api.clone();
            classes.push(TsClass {
                name: names.extended_api,
                extends: Some(TsType::reference(&names.api)),
                members: custom,
                doc: None,
            });
        }

        let property = to_camel_case(&endpoint_name(
            &entity.clean_name,
            entity.kind == EntityKind::Single,
        ));
        push_property(&mut properties, property, exposed);
    }

    for ((controller, plugin), owned) in routes.by_owner() {
        if claimed.contains(&(controller, plugin)) {
            continue;
        }
        let qualified = qualified_controller(routes, controller, plugin);
        let name = format!("{}API", namespace_name(&qualified));
        if classes.iter().any(|c| c.name == name) {
            warn!(controller = %controller, class = %name, "Skipping standalone routes whose class name is taken.");
            continue;
        }
        let custom = custom_methods(&owned, routes, false);
        if custom.is_empty() {
            continue;
        }
        let mut members = vec![constructor(TsExpr::string(""))];
        members.extend(custom);
        classes.push(TsClass {
            name: name.clone(),
            extends: Some(TsType::reference("BaseAPI")),
            members,
            doc: None,
        });
        push_property(&mut properties, to_camel_case(&qualified), name);
    }

    let (root, create) = root_client(&properties);
    let mut items: Vec<TsItem> = classes.into_iter().map(TsItem::Class).collect();
    items.push(TsItem::Class(root));
    items.push(TsItem::Function(create));

    let imports = type_imports(&items, types);
    debug!(
        classes = items.len() - 1,
        properties = properties.len(),
        imports = imports.len(),
        "Synthesized client module."
    );

    items.insert(0, TsItem::Raw(client_runtime(&config.api_prefix)));
    TsModule {
        header: header(schema_hash),
        imports: vec![TsImport {
            items: imports,
            from: config.types_import_path.clone(),
            type_only: true,
        }],
        items,
    }
}
