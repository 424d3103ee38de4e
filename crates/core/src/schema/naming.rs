//! Deterministic naming rules.
//!
//! These functions define the public surface names of generated code (type
//! names, endpoint paths, client properties), so both extractors and both
//! synthesizers go through them. Changing any of them changes the output of
//! every downstream consumer.

/// Abbreviations kept upper-case when building namespace names.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ai", "AI"),
    ("api", "API"),
    ("cms", "CMS"),
    ("csv", "CSV"),
    ("faq", "FAQ"),
    ("html", "HTML"),
    ("http", "HTTP"),
    ("id", "ID"),
    ("json", "JSON"),
    ("jwt", "JWT"),
    ("otp", "OTP"),
    ("pdf", "PDF"),
    ("seo", "SEO"),
    ("sms", "SMS"),
    ("sso", "SSO"),
    ("ui", "UI"),
    ("url", "URL"),
];

/// Plugin names recognized when reconstructing UIDs from interface names.
const KNOWN_PLUGINS: &[&str] = &[
    "users-permissions",
    "content-releases",
    "review-workflows",
    "upload",
    "i18n",
];

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '.' | ' ' | '/')
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lower-case the first letter of a string.
pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// `guide-type` / `guide_type` / `guide type` -> `GuideType`.
pub fn to_pascal_case(s: &str) -> String {
    s.split(is_separator)
        .filter(|part| !part.is_empty())
        .map(capitalize_first)
        .collect()
}

/// `save-games` -> `saveGames`.
pub fn to_camel_case(s: &str) -> String {
    lowercase_first(&to_pascal_case(s))
}

/// `SaveGame` -> `save-game`, `SEOBlock` -> `seo-block`.
///
/// Idempotent: applying it to its own output returns the same string.
pub fn to_kebab_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// English pluralization used for collection endpoints.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| c.is_ascii_alphabetic() && !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// REST endpoint segment for an entity: `Item` -> `items`,
/// `SaveGame` -> `save-games`; singletons stay singular.
pub fn endpoint_name(clean_name: &str, single: bool) -> String {
    let kebab = to_kebab_case(clean_name);
    if single { kebab } else { pluralize(&kebab) }
}

/// Split a UID into its namespace and remainder: `api::item.item` ->
/// (`Some("api")`, `item.item`); `shared.seo` -> (`None`, `shared.seo`).
pub fn split_uid(uid: &str) -> (Option<&str>, &str) {
    match uid.split_once("::") {
        Some((namespace, rest)) => (Some(namespace), rest),
        None => (None, uid),
    }
}

/// Owning plugin of a `plugin::<name>.<type>` UID.
pub fn plugin_name(uid: &str) -> Option<&str> {
    match split_uid(uid) {
        (Some("plugin"), rest) => rest.split('.').next().filter(|p| !p.is_empty()),
        _ => None,
    }
}

/// UID -> PascalCase clean name.
///
/// Namespaced UIDs keep only their final dot-segment; component UIDs keep
/// every segment.
pub fn clean_name(uid: &str) -> String {
    match split_uid(uid) {
        (Some(_), rest) => to_pascal_case(rest.rsplit('.').next().unwrap_or(rest)),
        (None, rest) => to_pascal_case(rest),
    }
}

/// Collapse the repeated-segment pattern: `ItemItem` -> `Item`,
/// `GuideTypeGuideType` -> `GuideType`. Returns the input unchanged when no
/// prefix repeats.
pub fn collapse_repeated_segment(name: &str) -> &str {
    let boundaries: Vec<usize> = name
        .char_indices()
        .map(|(i, _)| i)
        .filter(|&i| i > 0)
        .collect();
    for &split in boundaries.iter().rev() {
        let (prefix, rest) = name.split_at(split);
        if rest.eq_ignore_ascii_case(prefix) {
            return prefix;
        }
    }
    name
}

/// Reconstruct a UID from a declaration interface name when no registry
/// mapping is available.
///
/// `ApiItemItem` -> `api::item.item`, `PluginUsersPermissionsUser` ->
/// `plugin::users-permissions.user`, `SharedSeo` -> `shared.seo`.
pub fn uid_from_interface_name(interface: &str, is_component: bool) -> String {
    if is_component {
        let kebab = to_kebab_case(interface);
        return match kebab.split_once('-') {
            Some((category, name)) => format!("{category}.{name}"),
            None => kebab,
        };
    }

    if let Some(rest) = interface.strip_prefix("Api") {
        let name = to_kebab_case(collapse_repeated_segment(rest));
        return format!("api::{name}.{name}");
    }

    if let Some(rest) = interface.strip_prefix("Plugin") {
        let kebab = to_kebab_case(rest);
        for plugin in KNOWN_PLUGINS {
            if let Some(name) = kebab
                .strip_prefix(plugin)
                .and_then(|r| r.strip_prefix('-'))
            {
                return format!("plugin::{plugin}.{name}");
            }
        }
        return match kebab.split_once('-') {
            Some((plugin, name)) => format!("plugin::{plugin}.{name}"),
            None => format!("plugin::{kebab}.{kebab}"),
        };
    }

    if let Some(rest) = interface.strip_prefix("Admin") {
        return format!("admin::{}", to_kebab_case(rest));
    }

    let name = to_kebab_case(collapse_repeated_segment(interface));
    format!("api::{name}.{name}")
}

/// Controller name -> namespace name: `ai-chat` -> `AIChat`,
/// `order-item` -> `OrderItem`.
pub fn namespace_name(controller: &str) -> String {
    to_kebab_case(controller)
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            ABBREVIATIONS
                .iter()
                .find(|(lower, _)| *lower == part)
                .map_or_else(|| capitalize_first(part), |(_, upper)| (*upper).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_repeated_segment() {
        assert_eq!(clean_name("api::item.item"), "Item");
        assert_eq!(clean_name("api::guide-type.guide-type"), "GuideType");
        assert_eq!(clean_name("plugin::users-permissions.user"), "User");
    }

    #[test]
    fn test_clean_name_component() {
        assert_eq!(clean_name("shared.seo"), "SharedSeo");
        assert_eq!(clean_name("blocks.hero-section"), "BlocksHeroSection");
    }

    #[test]
    fn test_collapse_repeated_segment() {
        assert_eq!(collapse_repeated_segment("ItemItem"), "Item");
        assert_eq!(collapse_repeated_segment("GuideTypeGuideType"), "GuideType");
        assert_eq!(collapse_repeated_segment("Itemitem"), "Item");
        assert_eq!(collapse_repeated_segment("BlogPost"), "BlogPost");
        assert_eq!(collapse_repeated_segment("A"), "A");
        assert_eq!(collapse_repeated_segment(""), "");
    }

    #[test]
    fn test_endpoint_name() {
        assert_eq!(endpoint_name("Item", false), "items");
        assert_eq!(endpoint_name("Category", false), "categories");
        assert_eq!(endpoint_name("SaveGame", false), "save-games");
        assert_eq!(endpoint_name("Box", false), "boxes");
        assert_eq!(endpoint_name("Match", false), "matches");
        assert_eq!(endpoint_name("Day", false), "days");
        assert_eq!(endpoint_name("Status", false), "statuses");
        assert_eq!(endpoint_name("HomePage", true), "home-page");
        assert_eq!(endpoint_name("Quiz", false), "quizes");
        assert_eq!(endpoint_name("Dish", false), "dishes");
    }

    #[test]
    fn test_endpoint_name_stable_under_kebab_input() {
        for name in ["Item", "Quiz", "Dish", "SaveGame", "SEOBlock", "Category"] {
            assert_eq!(
                endpoint_name(&to_kebab_case(name), false),
                endpoint_name(name, false),
                "endpoint differs for kebab form of {name}"
            );
        }
    }

    #[test]
    fn test_kebab_case_is_idempotent() {
        for name in ["Item", "Category", "SaveGame", "SEOBlock", "guide-type", "a_b c"] {
            let once = to_kebab_case(name);
            assert_eq!(to_kebab_case(&once), once, "not idempotent for {name}");
        }
        assert_eq!(to_kebab_case("SEOBlock"), "seo-block");
        assert_eq!(to_kebab_case("item2Go"), "item2-go");
    }

    #[test]
    fn test_camel_and_pascal() {
        assert_eq!(to_camel_case("save-games"), "saveGames");
        assert_eq!(to_pascal_case("guide_type"), "GuideType");
        assert_eq!(to_camel_case("items"), "items");
    }

    #[test]
    fn test_namespace_name_abbreviations() {
        assert_eq!(namespace_name("ai-chat"), "AIChat");
        assert_eq!(namespace_name("seo-tools"), "SEOTools");
        assert_eq!(namespace_name("order-item"), "OrderItem");
        assert_eq!(namespace_name("paid"), "Paid");
    }

    #[test]
    fn test_uid_from_interface_name() {
        assert_eq!(uid_from_interface_name("ApiItemItem", false), "api::item.item");
        assert_eq!(
            uid_from_interface_name("ApiGuideTypeGuideType", false),
            "api::guide-type.guide-type"
        );
        assert_eq!(
            uid_from_interface_name("PluginUsersPermissionsUser", false),
            "plugin::users-permissions.user"
        );
        assert_eq!(uid_from_interface_name("SharedSeo", true), "shared.seo");
        assert_eq!(
            uid_from_interface_name("BlocksHeroSection", true),
            "blocks.hero-section"
        );
    }

    #[test]
    fn test_plugin_name() {
        assert_eq!(plugin_name("plugin::users-permissions.user"), Some("users-permissions"));
        assert_eq!(plugin_name("api::item.item"), None);
        assert_eq!(plugin_name("shared.seo"), None);
    }
}
