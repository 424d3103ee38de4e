//! Route extraction from descriptors and from route declaration modules.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::ir::{CustomEndpointType, ParsedRoute, RouteDescriptor, RouteSet};
use crate::error::{CompileError, Result};
use crate::text::{block_after, member_value, members, split_top_level, squash, unquote};

#[allow(clippy::expect_used)]
static HANDLER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w-]+::[\w-]+\.").expect("handler prefix pattern is valid")
});

#[allow(clippy::expect_used)]
static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_]\w*)").expect("path parameter pattern is valid"));

#[allow(clippy::expect_used)]
static MODULE_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:export\s+default|module\.exports\s*=)").expect("module export pattern is valid")
});

/// Strip a `namespace::name.` prefix: `api::order.order.pay` -> `order.pay`.
pub fn normalize_handler(handler: &str) -> String {
    HANDLER_PREFIX.replace(handler.trim(), "").into_owned()
}

/// Piece of a route path: literal text or a `:identifier` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPiece<'a> {
    /// Text sent as written
    Literal(&'a str),
    /// Parameter name, without the colon
    Param(&'a str),
}

/// Split a route path at every `:identifier`, wherever it sits in a segment.
pub fn path_pieces(path: &str) -> Vec<PathPiece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in PATH_PARAM.captures_iter(path) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            pieces.push(PathPiece::Literal(&path[last..whole.start()]));
        }
        pieces.push(PathPiece::Param(name.as_str()));
        last = whole.end();
    }
    if last < path.len() {
        pieces.push(PathPiece::Literal(&path[last..]));
    }
    pieces
}

/// Every `:identifier` of a route path, in order.
pub fn path_params(path: &str) -> Vec<String> {
    path_pieces(path)
        .into_iter()
        .filter_map(|piece| match piece {
            PathPiece::Param(name) => Some(name.to_string()),
            PathPiece::Literal(_) => None,
        })
        .collect()
}

/// Normalize one descriptor. Returns `None` when no controller/action pair
/// can be derived.
pub fn parse_route(descriptor: &RouteDescriptor) -> Option<ParsedRoute> {
    let handler = normalize_handler(&descriptor.handler);
    let (from_handler_controller, from_handler_action) = match handler.rsplit_once('.') {
        Some((controller, action)) => (Some(controller), Some(action)),
        None => (None, None),
    };

    let controller = descriptor
        .controller
        .as_deref()
        .or(from_handler_controller)
        .filter(|c| !c.is_empty())?;
    let action = descriptor
        .action
        .as_deref()
        .or(from_handler_action)
        .filter(|a| !a.is_empty())?;

    Some(ParsedRoute {
        method: descriptor.method.trim().to_ascii_uppercase(),
        path: descriptor.path.trim().to_string(),
        handler: format!("{controller}.{action}"),
        controller: controller.to_string(),
        action: action.to_string(),
        params: path_params(&descriptor.path),
        plugin_name: descriptor.plugin_name.clone(),
        prefix: descriptor.prefix.clone(),
    })
}

/// Build the route IR. Descriptors without a usable handler are skipped.
pub fn extract_routes(descriptors: &[RouteDescriptor]) -> RouteSet {
    let mut routes = Vec::with_capacity(descriptors.len());
    let mut endpoint_types: BTreeMap<String, CustomEndpointType> = BTreeMap::new();

    for descriptor in descriptors {
        let Some(route) = parse_route(descriptor) else {
            warn!(handler = %descriptor.handler, path = %descriptor.path, "Skipping route without a controller.action handler.");
            continue;
        };
        if let Some(types) = &descriptor.types {
            let types = normalize_types(types);
            if !types.is_empty() {
                endpoint_types
                    .entry(route.handler.clone())
                    .or_default()
                    .merge_missing(types);
            }
        }
        routes.push(route);
    }

    debug!(
        routes = routes.len(),
        typed = endpoint_types.len(),
        "Extracted routes."
    );
    RouteSet {
        routes,
        endpoint_types,
    }
}

fn normalize_types(types: &CustomEndpointType) -> CustomEndpointType {
    let slot = |text: Option<&str>| text.map(squash).filter(|t| !t.is_empty());
    CustomEndpointType {
        body: slot(types.body.as_deref()),
        response: slot(types.response.as_deref()),
        params: slot(types.params.as_deref()),
        query: slot(types.query.as_deref()),
    }
}

/// Read route descriptors from a routes module:
///
/// ```ts
/// export default {
///   type: 'content-api',
///   routes: [
///     { method: 'POST', path: '/orders/:id/pay', handler: 'order.pay', config: { prefix: '' } },
///   ],
/// };
/// ```
///
/// A module without a `routes` array is fatal. Individual route objects
/// missing `method`, `path` or `handler` are skipped.
pub fn parse_route_declarations(text: &str, plugin_name: Option<&str>) -> Result<Vec<RouteDescriptor>> {
    let search_from = MODULE_OBJECT.find(text).map_or(0, |m| m.end());
    let module = block_after(text, search_from, b'{').ok_or_else(|| {
        CompileError::InvalidRoutes("no exported route module object".into())
    })?;

    let routes = member_value(module.inner, "routes")
        .filter(|value| value.starts_with('['))
        .and_then(|value| block_after(value, 0, b'['))
        .ok_or_else(|| CompileError::InvalidRoutes("route module has no routes array".into()))?;
    let module_prefix = member_value(module.inner, "prefix").map(|p| unquote(p).to_string());

    let mut descriptors = Vec::new();
    for (index, entry) in split_top_level(routes.inner, b",").into_iter().enumerate() {
        let Some(object) = block_after(entry, 0, b'{') else {
            warn!(index, "Skipping route entry that is not an object literal.");
            continue;
        };
        match route_from_object(object.inner) {
            Some(mut descriptor) => {
                descriptor.prefix = descriptor.prefix.or_else(|| module_prefix.clone());
                descriptor.plugin_name = plugin_name.map(str::to_string);
                descriptors.push(descriptor);
            }
            None => warn!(index, "Skipping route missing method, path or handler."),
        }
    }

    debug!(routes = descriptors.len(), "Parsed route declarations.");
    Ok(descriptors)
}

fn route_from_object(body: &str) -> Option<RouteDescriptor> {
    let mut method = None;
    let mut path = None;
    let mut handler = None;
    let mut prefix = None;

    for member in members(body) {
        let value = member.value;
        let literal = is_string_literal(value).then(|| unquote(value).to_string());
        match member.name.as_str() {
            "method" => method = literal,
            "path" => path = literal,
            "handler" => handler = literal,
            "config" => {
                prefix = block_after(value, 0, b'{')
                    .and_then(|config| member_value(config.inner, "prefix"))
                    .filter(|p| is_string_literal(p))
                    .map(|p| unquote(p).to_string());
            }
            _ => {}
        }
    }

    Some(RouteDescriptor {
        method: method?,
        path: path?,
        handler: handler?,
        prefix,
        ..RouteDescriptor::default()
    })
}

fn is_string_literal(value: &str) -> bool {
    let v = value.trim();
    v.len() >= 2 && ['\'', '"', '`'].iter().any(|&q| v.starts_with(q) && v.ends_with(q))
}
