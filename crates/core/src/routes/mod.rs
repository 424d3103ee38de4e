//! Custom route extraction, independent of the schema extractor.

pub mod extract;
pub mod ir;
pub mod types;

pub use extract::{
    PathPiece, extract_routes, normalize_handler, parse_route_declarations, path_params,
    path_pieces,
};
pub use ir::{CustomEndpointType, ParsedRoute, RouteDescriptor, RouteSet};
pub use types::{attach_endpoint_types, parse_endpoint_types};

use crate::error::{CompileError, Result};

/// Parse a JSON array of route descriptors.
pub fn descriptors_from_json(source: &str) -> Result<Vec<RouteDescriptor>> {
    serde_json::from_str(source).map_err(|err| CompileError::InvalidRoutes(err.to_string()))
}

/// Read a routes module and, when given, its companion type declarations.
pub fn load_declared_routes(
    routes_text: &str,
    types_text: Option<&str>,
    plugin_name: Option<&str>,
) -> Result<Vec<RouteDescriptor>> {
    let mut descriptors = parse_route_declarations(routes_text, plugin_name)?;
    if let Some(types_text) = types_text {
        attach_endpoint_types(&mut descriptors, &parse_endpoint_types(types_text));
    }
    Ok(descriptors)
}
