//! Route IR: custom HTTP routes and the type texts attached to their actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Type texts for one action. Each slot holds a TypeScript type expression
/// copied verbatim (after whitespace normalization) into the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomEndpointType {
    /// Request body.
    pub body: Option<String>,
    /// Response payload.
    pub response: Option<String>,
    /// Path parameters.
    #[serde(alias = "pathParams")]
    pub params: Option<String>,
    /// Query string.
    pub query: Option<String>,
}

impl CustomEndpointType {
    /// No slot holds a type.
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.response.is_none() && self.params.is_none() && self.query.is_none()
    }

    /// Fill every slot that is still empty from `other`.
    pub fn merge_missing(&mut self, other: Self) {
        self.body = self.body.take().or(other.body);
        self.response = self.response.take().or(other.response);
        self.params = self.params.take().or(other.params);
        self.query = self.query.take().or(other.query);
    }
}

/// A route as described by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// HTTP method, any case.
    pub method: String,
    /// Path relative to the API prefix, `:identifier` parameters included.
    pub path: String,
    /// `controller.action`, optionally behind a `namespace::name.` prefix.
    pub handler: String,
    /// Controller override; derived from `handler` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Action override; derived from `handler` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Type texts declared for the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<CustomEndpointType>,
    /// Plugin that registers the route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
    /// Route prefix override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// A normalized route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRoute {
    /// Upper-case HTTP method.
    pub method: String,
    /// Path as declared.
    pub path: String,
    /// `controller.action`, namespace prefix stripped.
    pub handler: String,
    /// Controller name.
    pub controller: String,
    /// Action name.
    pub action: String,
    /// `:identifier` parameters of `path`, in order.
    pub params: Vec<String>,
    /// Plugin that registers the route.
    pub plugin_name: Option<String>,
    /// Route prefix override. `Some("")` disables the plugin path segment.
    pub prefix: Option<String>,
}

/// Routes of one compilation run plus their endpoint types keyed by handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSet {
    /// Routes in declaration order.
    pub routes: Vec<ParsedRoute>,
    /// Merged type texts per handler.
    pub endpoint_types: BTreeMap<String, CustomEndpointType>,
}

impl RouteSet {
    /// No routes were extracted.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes grouped by owner, `(controller, plugin)` in order with app
    /// routes first, routes in declaration order.
    pub fn by_owner(&self) -> BTreeMap<(&str, Option<&str>), Vec<&ParsedRoute>> {
        let mut grouped: BTreeMap<(&str, Option<&str>), Vec<&ParsedRoute>> = BTreeMap::new();
        for route in &self.routes {
            grouped
                .entry((route.controller.as_str(), route.plugin_name.as_deref()))
                .or_default()
                .push(route);
        }
        grouped
    }

    /// Whether routes named `controller` come from more than one owner.
    pub fn controller_is_shared(&self, controller: &str) -> bool {
        let mut owners = self
            .routes
            .iter()
            .filter(|r| r.controller == controller)
            .map(|r| r.plugin_name.as_deref());
        owners
            .next()
            .is_some_and(|first| owners.any(|other| other != first))
    }

    /// Endpoint types of a `controller.action` handler.
    pub fn types_for(&self, handler: &str) -> Option<&CustomEndpointType> {
        self.endpoint_types.get(handler)
    }

    /// Whether a route of `controller` owned by `plugin` declared an empty
    /// prefix.
    pub fn has_empty_prefix(&self, controller: &str, plugin: Option<&str>) -> bool {
        self.routes.iter().any(|r| {
            r.controller == controller
                && r.plugin_name.as_deref() == plugin
                && r.prefix.as_deref() == Some("")
        })
    }
}
