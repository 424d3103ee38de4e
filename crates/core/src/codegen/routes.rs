//! Per-controller namespaces holding the type texts of custom routes.
//!
//! ```ts
//! export namespace AIChat {
//!   export type SendRequest = { message: string };
//!   export type SendResponse = { reply: string };
//! }
//! ```

use std::collections::BTreeSet;

use crate::routes::{CustomEndpointType, RouteSet};
use crate::schema::naming::{namespace_name, to_pascal_case};
use crate::ts::{TsType, TsTypeDef};

/// Alias names generated for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTypeNames {
    /// `XRequest`, the body type.
    pub request: String,
    /// `XResponse`
    pub response: String,
    /// `XParams`
    pub params: String,
    /// `XQuery`
    pub query: String,
}

impl ActionTypeNames {
    /// Names for the action `action`.
    pub fn of(action: &str) -> Self {
        let stem = to_pascal_case(action);
        Self {
            request: format!("{stem}Request"),
            response: format!("{stem}Response"),
            params: format!("{stem}Params"),
            query: format!("{stem}Query"),
        }
    }
}

fn action_members(action: &str, types: &CustomEndpointType) -> Vec<TsTypeDef> {
    let names = ActionTypeNames::of(action);
    [
        (names.request, &types.body),
        (names.response, &types.response),
        (names.params, &types.params),
        (names.query, &types.query),
    ]
    .into_iter()
    .filter_map(|(name, text)| {
        text.as_ref()
            .map(|text| TsTypeDef::alias(name, TsType::Raw(text.clone())))
    })
    .collect()
}

/// Controller name, qualified with its plugin when routes of another owner
/// use the same controller name: `user` under `users-permissions` becomes
/// `users-permissions-user`.
pub fn qualified_controller(routes: &RouteSet, controller: &str, plugin: Option<&str>) -> String {
    match plugin {
        Some(plugin) if routes.controller_is_shared(controller) => format!("{plugin}-{controller}"),
        _ => controller.to_string(),
    }
}

/// One namespace per controller that has at least one typed action.
pub fn route_namespaces(routes: &RouteSet) -> Vec<TsTypeDef> {
    routes
        .by_owner()
        .into_iter()
        .filter_map(|((controller, plugin), owned)| {
            let mut seen = BTreeSet::new();
            let members: Vec<TsTypeDef> = owned
                .into_iter()
                .filter(|route| seen.insert(route.handler.as_str()))
                .filter_map(|route| {
                    routes
                        .types_for(&route.handler)
                        .map(|types| action_members(&route.action, types))
                })
                .flatten()
                .collect();
            (!members.is_empty()).then(|| {
                let name = namespace_name(&qualified_controller(routes, controller, plugin));
                TsTypeDef::namespace(name, members)
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::routes::{RouteDescriptor, extract_routes};
    use crate::ts::Emit;

    fn descriptor(method: &str, path: &str, handler: &str) -> RouteDescriptor {
        RouteDescriptor {
            method: method.into(),
            path: path.into(),
            handler: handler.into(),
            ..RouteDescriptor::default()
        }
    }

    #[test]
    fn test_namespace_per_controller() {
        let mut send = descriptor("POST", "/ai-chat/send", "api::ai-chat.ai-chat.send");
        send.types = Some(CustomEndpointType {
            body: Some("{ message: string }".into()),
            response: Some("{ reply: string }".into()),
            ..CustomEndpointType::default()
        });
        let mut history = descriptor("GET", "/ai-chat/:id/history", "ai-chat.history");
        history.types = Some(CustomEndpointType {
            params: Some("{ id: string }".into()),
            ..CustomEndpointType::default()
        });
        let untyped = descriptor("GET", "/orders/export", "order.export");

        let namespaces = route_namespaces(&extract_routes(&[send, history, untyped]));
        assert_eq!(namespaces.len(), 1);
        let ts_code = namespaces[0].emit();
        assert_eq!(
            ts_code,
            "export namespace AIChat {\n  export type SendRequest = { message: string };\n  export type SendResponse = { reply: string };\n  export type HistoryParams = { id: string };\n}\n"
        );
    }

    #[test]
    fn test_handler_listed_twice_emits_once() {
        let types = CustomEndpointType {
            query: Some("{ q?: string }".into()),
            ..CustomEndpointType::default()
        };
        let mut get = descriptor("GET", "/search", "search.run");
        get.types = Some(types.clone());
        let mut post = descriptor("POST", "/search", "search.run");
        post.types = Some(types);

        let namespaces = route_namespaces(&extract_routes(&[get, post]));
        assert_eq!(namespaces[0].name, "Search");
        assert_eq!(
            namespaces[0].emit(),
            "export namespace Search {\n  export type RunQuery = { q?: string };\n}\n"
        );
    }

    #[test]
    fn test_plugin_controller_sharing_a_name_gets_own_namespace() {
        let mut app = descriptor("GET", "/users/me", "api::user.user.me");
        app.types = Some(CustomEndpointType {
            response: Some("{ id: number }".into()),
            ..CustomEndpointType::default()
        });
        let mut plugin = descriptor("GET", "/users/count", "plugin::users-permissions.user.count");
        plugin.plugin_name = Some("users-permissions".into());
        plugin.types = Some(CustomEndpointType {
            response: Some("number".into()),
            ..CustomEndpointType::default()
        });

        let namespaces = route_namespaces(&extract_routes(&[app, plugin]));
        let names: Vec<&str> = namespaces.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["User", "UsersPermissionsUser"]);
        assert_eq!(
            namespaces[1].emit(),
            "export namespace UsersPermissionsUser {\n  export type CountResponse = number;\n}\n"
        );
    }

    #[test]
    fn test_action_type_names() {
        let names = ActionTypeNames::of("sendMessage");
        assert_eq!(names.request, "SendMessageRequest");
        assert_eq!(names.query, "SendMessageQuery");
    }
}
