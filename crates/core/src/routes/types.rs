//! Per-action request/response types from route type declaration files.
//!
//! Two conventions are recognized, and both may appear in one file:
//!
//! ```ts
//! // slot blocks, keyed by action name
//! export interface OrderEndpoints {
//!   pay: { body: { amount: number }; response: { ok: boolean }; params: { id: string } };
//! }
//!
//! // named declarations, folded by suffix
//! export interface RefundRequest { reason: string }
//! export type RefundResponse = { refunded: boolean };
//! ```
//!
//! Slot blocks win over suffix-folded declarations for the same action.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::extract::parse_route;
use super::ir::{CustomEndpointType, RouteDescriptor};
use crate::schema::naming::lowercase_first;
use crate::text::{block_after, members, squash, statement_end};

#[allow(clippy::expect_used)]
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(interface|type)\s+([A-Za-z_$][\w$]*)").expect("declaration pattern is valid")
});

/// Suffixes folded into the request side.
const REQUEST_SUFFIXES: &[&str] = &["Request", "FormData", "Input"];
/// Suffixes folded into the response side.
const RESPONSE_SUFFIXES: &[&str] = &["Response", "Event", "Output"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Request,
    Response,
}

/// Split a declaration name into its action and side:
/// `CreateOrderRequest` -> (`createOrder`, request).
fn fold_suffix(name: &str) -> Option<(String, Side)> {
    let sides = REQUEST_SUFFIXES
        .iter()
        .map(|s| (*s, Side::Request))
        .chain(RESPONSE_SUFFIXES.iter().map(|s| (*s, Side::Response)));
    for (suffix, side) in sides {
        if let Some(stem) = name.strip_suffix(suffix).filter(|stem| !stem.is_empty()) {
            return Some((lowercase_first(stem), side));
        }
    }
    None
}

fn slot_block(value: &str) -> Option<CustomEndpointType> {
    if !value.starts_with('{') {
        return None;
    }
    let block = block_after(value, 0, b'{')?;
    let mut types = CustomEndpointType::default();
    for member in members(block.inner) {
        let text = Some(squash(member.value));
        match member.name.as_str() {
            "body" => types.body = text,
            "response" => types.response = text,
            "params" | "pathParams" => types.params = text,
            "query" => types.query = text,
            _ => {}
        }
    }
    (!types.is_empty()).then_some(types)
}

/// Every named declaration in `text` with its type text: the body of an
/// interface (braces included) or the right-hand side of a type alias.
fn declarations(text: &str) -> Vec<(&str, &str)> {
    let mut found = Vec::new();
    for caps in DECLARATION.captures_iter(text) {
        let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = if keyword.as_str() == "interface" {
            block_after(text, name.end(), b'{').map(|block| &text[block.start..block.end])
        } else {
            text[name.end()..].find('=').map(|offset| {
                let start = name.end() + offset + 1;
                text[start..statement_end(text, start)].trim()
            })
        };
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            found.push((name.as_str(), value));
        }
    }
    found
}

/// Endpoint types keyed by action name.
pub fn parse_endpoint_types(text: &str) -> BTreeMap<String, CustomEndpointType> {
    let mut slots: BTreeMap<String, CustomEndpointType> = BTreeMap::new();
    let mut folded: BTreeMap<String, CustomEndpointType> = BTreeMap::new();

    for (name, value) in declarations(text) {
        if let Some(container) = value
            .starts_with('{')
            .then(|| block_after(value, 0, b'{'))
            .flatten()
        {
            for member in members(container.inner) {
                if let Some(types) = slot_block(member.value) {
                    slots.entry(member.name).or_default().merge_missing(types);
                }
            }
        }

        if let Some((action, side)) = fold_suffix(name) {
            let entry = folded.entry(action).or_default();
            let text = Some(squash(value));
            match side {
                Side::Request if entry.body.is_none() => entry.body = text,
                Side::Response if entry.response.is_none() => entry.response = text,
                _ => {}
            }
        }
    }

    for (action, types) in folded {
        slots.entry(action).or_default().merge_missing(types);
    }
    debug!(actions = slots.len(), "Parsed endpoint type declarations.");
    slots
}

/// Attach action types to the descriptors of one routes module. Types
/// already present on a descriptor are kept.
pub fn attach_endpoint_types(
    descriptors: &mut [RouteDescriptor],
    types: &BTreeMap<String, CustomEndpointType>,
) {
    for descriptor in descriptors {
        let Some(action) = parse_route(descriptor).map(|route| route.action) else {
            continue;
        };
        if let Some(found) = types.get(&action) {
            descriptor
                .types
                .get_or_insert_with(CustomEndpointType::default)
                .merge_missing(found.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const TYPES: &str = r#"
export interface OrderEndpoints {
  pay: {
    body: { amount: number; currency: 'eur' | 'usd' };
    response: { ok: boolean };
    pathParams: { id: string };
  };
  summary: { query: { from?: string } };
  /** not an action */
  version: string;
}

export interface RefundRequest {
  reason: string;
}
export type RefundResponse = { refunded: boolean; meta: { at: string } };
export type ChatEvent = { delta: string }
export type PayResponse = { ignored: true };
"#;

    #[test]
    fn test_slot_blocks() {
        let types = parse_endpoint_types(TYPES);
        let pay = &types["pay"];
        assert_eq!(pay.body.as_deref(), Some("{ amount: number; currency: 'eur' | 'usd' }"));
        assert_eq!(pay.params.as_deref(), Some("{ id: string }"));
        assert_eq!(types["summary"].query.as_deref(), Some("{ from?: string }"));
        assert!(!types.contains_key("version"));
    }

    #[test]
    fn test_suffix_folding() {
        let types = parse_endpoint_types(TYPES);
        let refund = &types["refund"];
        assert_eq!(refund.body.as_deref(), Some("{ reason: string; }"));
        assert_eq!(
            refund.response.as_deref(),
            Some("{ refunded: boolean; meta: { at: string } }")
        );
        assert_eq!(types["chat"].response.as_deref(), Some("{ delta: string }"));
        // slot block wins over the folded declaration
        assert_eq!(types["pay"].response.as_deref(), Some("{ ok: boolean }"));
    }

    #[test]
    fn test_fold_suffix() {
        assert_eq!(
            fold_suffix("CreateOrderRequest"),
            Some(("createOrder".to_string(), Side::Request))
        );
        assert_eq!(fold_suffix("UploadFormData"), Some(("upload".to_string(), Side::Request)));
        assert_eq!(fold_suffix("ExportOutput"), Some(("export".to_string(), Side::Response)));
        assert_eq!(fold_suffix("Response"), None);
        assert_eq!(fold_suffix("OrderEndpoints"), None);
    }

    #[test]
    fn test_attach_endpoint_types() {
        let mut descriptors = vec![
            RouteDescriptor {
                method: "POST".into(),
                path: "/orders/:id/refund".into(),
                handler: "order.refund".into(),
                ..RouteDescriptor::default()
            },
            RouteDescriptor {
                method: "GET".into(),
                path: "/orders/x".into(),
                handler: "order.other".into(),
                ..RouteDescriptor::default()
            },
        ];
        attach_endpoint_types(&mut descriptors, &parse_endpoint_types(TYPES));
        assert!(descriptors[0].types.as_ref().unwrap().body.is_some());
        assert!(descriptors[1].types.is_none());
    }
}
