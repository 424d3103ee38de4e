//! Bracket-matching sub-parser for declaration text.
//!
//! This is not a TypeScript parser. It understands exactly enough to pull
//! balanced `{}`/`[]`/`()` regions, top-level members and generic argument
//! lists out of declaration files: string literals and comments are skipped so
//! braces or separators inside them never count.
//!
//! All delimiters are ASCII, so scanning bytes of a UTF-8 `&str` and slicing at
//! the returned offsets always lands on character boundaries.

/// A balanced region located by [`block_after`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Text between the opener and its matching closer.
    pub inner: &'a str,
    /// Byte offset of the opener.
    pub start: usize,
    /// Byte offset one past the closer.
    pub end: usize,
}

/// A `name: value` member of an object literal or object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<'a> {
    /// Key with quotes removed.
    pub name: String,
    /// Declared with `?:`.
    pub optional: bool,
    /// Value text, trimmed.
    pub value: &'a str,
}

fn closer_for(opener: u8) -> Option<u8> {
    match opener {
        b'{' => Some(b'}'),
        b'[' => Some(b']'),
        b'(' => Some(b')'),
        _ => None,
    }
}

fn is_closer(b: u8) -> bool {
    matches!(b, b'}' | b']' | b')')
}

/// If a string literal or comment starts at `pos`, return the offset just
/// past it.
fn skip_trivia(bytes: &[u8], pos: usize) -> Option<usize> {
    let len = bytes.len();
    match bytes[pos] {
        quote @ (b'\'' | b'"' | b'`') => {
            let mut i = pos + 1;
            while i < len {
                match bytes[i] {
                    b'\\' => i += 2,
                    b if b == quote => return Some(i + 1),
                    _ => i += 1,
                }
            }
            Some(len)
        }
        b'/' if bytes.get(pos + 1) == Some(&b'/') => {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(len, |offset| pos + offset + 1);
            Some(end)
        }
        b'/' if bytes.get(pos + 1) == Some(&b'*') => {
            let mut i = pos + 2;
            while i + 1 < len {
                if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                    return Some(i + 2);
                }
                i += 1;
            }
            Some(len)
        }
        _ => None,
    }
}

/// Offset of the closer matching the opener at `open`.
///
/// Returns `None` when `open` is not an opener, when a different closer
/// appears first at the same depth, or when the text ends unbalanced.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack = vec![closer_for(*bytes.get(open)?)?];
    let mut i = open + 1;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }
        let b = bytes[i];
        if let Some(closer) = closer_for(b) {
            stack.push(closer);
        } else if is_closer(b) {
            if stack.last() != Some(&b) {
                return None;
            }
            stack.pop();
            if stack.is_empty() {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Find the first `open` byte at or after `from` (outside strings and
/// comments) and return the balanced block it starts.
pub fn block_after(text: &str, from: usize, open: u8) -> Option<Block<'_>> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }
        if bytes[i] == open {
            let close = matching_close(text, i)?;
            return Some(Block {
                inner: &text[i + 1..close],
                start: i,
                end: close + 1,
            });
        }
        i += 1;
    }
    None
}

/// Split on any of `separators` at nesting depth zero. Angle brackets count
/// as nesting (generic arguments) except in `=>`. Parts are trimmed and
/// empty parts dropped.
pub fn split_top_level<'a>(text: &'a str, separators: &[u8]) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' | b'[' | b'(' | b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'}' | b']' | b')' | b'>' => depth = depth.saturating_sub(1),
            b if depth == 0 && separators.contains(&b) => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Offset where the statement starting at `from` ends: the first `;` at
/// depth zero, a depth-zero line break followed by another declaration, or
/// the end of the text.
pub fn statement_end(text: &str, from: usize) -> usize {
    const DECLARATION_STARTS: &[&str] = &["export ", "interface ", "type ", "declare ", "const "];
    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    let mut i = from;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' | b'[' | b'(' | b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'}' | b']' | b')' | b'>' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return i,
            b'\n' if depth == 0 => {
                let rest = text[i + 1..].trim_start();
                if DECLARATION_STARTS.iter().any(|start| rest.starts_with(start)) {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Strip comments and collapse whitespace runs to one space, leaving string
/// literals untouched. Used to normalize type texts copied into output.
pub fn squash(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut space = false;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            if matches!(bytes[i], b'\'' | b'"' | b'`') {
                if space && !out.is_empty() {
                    out.push(' ');
                }
                space = false;
                out.push_str(&text[i..next]);
            } else {
                space = true;
            }
            i = next;
            continue;
        }
        let Some(c) = text[i..].chars().next() else {
            break;
        };
        if c.is_whitespace() {
            space = true;
        } else {
            if space && !out.is_empty() {
                out.push(' ');
            }
            space = false;
            out.push(c);
        }
        i += c.len_utf8();
    }
    out
}

/// Drop leading comments and whitespace.
pub fn strip_leading_comments(text: &str) -> &str {
    let mut rest = text.trim_start();
    while rest.starts_with("//") || rest.starts_with("/*") {
        let end = skip_trivia(rest.as_bytes(), 0).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

/// Remove one pair of matching surrounding quotes.
pub fn unquote(text: &str) -> &str {
    let t = text.trim();
    for quote in ['\'', '"', '`'] {
        if t.len() >= 2 && t.starts_with(quote) && t.ends_with(quote) {
            return &t[1..t.len() - 1];
        }
    }
    t
}

/// Members of an object body (`{ ... }` contents), separated by `,` or `;`.
///
/// Entries that are not `name: value` pairs (methods, spreads, index
/// signatures) are ignored.
pub fn members(body: &str) -> Vec<Member<'_>> {
    split_top_level(body, b",;")
        .into_iter()
        .filter_map(parse_member)
        .collect()
}

fn parse_member(entry: &str) -> Option<Member<'_>> {
    let entry = strip_leading_comments(entry);
    let entry = entry.strip_prefix("readonly ").unwrap_or(entry).trim_start();

    let (raw_name, rest) = if entry.starts_with(['\'', '"']) {
        let end = skip_trivia(entry.as_bytes(), 0)?;
        (&entry[..end], &entry[end..])
    } else {
        let colon = entry.find(':')?;
        (&entry[..colon], &entry[colon..])
    };

    let raw_name = raw_name.trim();
    let rest = rest.trim_start();
    let (name, optional, rest) = match rest.strip_prefix('?') {
        Some(after) => (raw_name, true, after.trim_start()),
        None => match raw_name.strip_suffix('?') {
            Some(stripped) => (stripped.trim(), true, rest),
            None => (raw_name, false, rest),
        },
    };
    let value = rest.strip_prefix(':')?.trim();

    let name = unquote(name);
    let is_identifier = raw_name.starts_with(['\'', '"'])
        || (!name.is_empty() && !name.contains(['(', '[', ' ', '.']));
    if !is_identifier || value.is_empty() {
        return None;
    }

    Some(Member {
        name: name.to_string(),
        optional,
        value,
    })
}

/// Value of the member named `key`, if present.
pub fn member_value<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    members(body)
        .into_iter()
        .find(|m| m.name == key)
        .map(|m| m.value)
}

/// `['a', 'b']`, `'a' | 'b'` or `"a"` -> `["a", "b"]`.
pub fn string_list(text: &str) -> Vec<String> {
    let t = text.trim();
    let t = t
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(t);
    split_top_level(t, b",|")
        .into_iter()
        .map(unquote)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `Name<args>` into the name and its top-level generic arguments.
/// A bare `Name` yields no arguments; a malformed argument list yields
/// `None`.
pub fn generic_parts(expr: &str) -> Option<(&str, Vec<&str>)> {
    let expr = expr.trim();
    match expr.find('<') {
        None => Some((expr, Vec::new())),
        Some(lt) => {
            let args = expr[lt + 1..].strip_suffix('>')?;
            Some((expr[..lt].trim(), split_top_level(args, b",")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_close_nested() {
        let text = "{ a: { b: [1, 2] }, c: '}' }";
        assert_eq!(matching_close(text, 0), Some(text.len() - 1));
        assert_eq!(matching_close(text, 5), Some(17));
    }

    #[test]
    fn test_matching_close_unbalanced() {
        assert_eq!(matching_close("{ a: { b }", 0), None);
        assert_eq!(matching_close("{ a ]", 0), None);
        assert_eq!(matching_close("abc", 0), None);
    }

    #[test]
    fn test_block_after_skips_comments() {
        let text = "// {not this}\n/* { nor } */ interface X { y: { z: 1 } }";
        let block = block_after(text, 0, b'{').unwrap();
        assert_eq!(block.inner.trim(), "y: { z: 1 }");
        assert_eq!(&text[block.end - 1..block.end], "}");
    }

    #[test]
    fn test_split_top_level_respects_generics() {
        let parts = split_top_level(
            "a: Relation<'manyToOne', 'api::x.x'>; b: { c: 1; d: 2 }; e: 'x;y'",
            b";",
        );
        assert_eq!(
            parts,
            vec![
                "a: Relation<'manyToOne', 'api::x.x'>",
                "b: { c: 1; d: 2 }",
                "e: 'x;y'"
            ]
        );
    }

    #[test]
    fn test_split_top_level_arrow() {
        let parts = split_top_level("a: () => void, b: string", b",");
        assert_eq!(parts, vec!["a: () => void", "b: string"]);
    }

    #[test]
    fn test_members() {
        let body = r#"
            /** Title */
            title: string;
            price?: number | null;
            'api::item.item': ApiItemItem;
            readonly nested: { a: 1, b: 2 },
            method(): void;
        "#;
        let parsed = members(body);
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].name, "title");
        assert!(!parsed[0].optional);
        assert_eq!(parsed[1].name, "price");
        assert!(parsed[1].optional);
        assert_eq!(parsed[1].value, "number | null");
        assert_eq!(parsed[2].name, "api::item.item");
        assert_eq!(parsed[2].value, "ApiItemItem");
        assert_eq!(parsed[3].value, "{ a: 1, b: 2 }");
    }

    #[test]
    fn test_string_list() {
        assert_eq!(string_list("['a', \"b\"]"), vec!["a", "b"]);
        assert_eq!(string_list("'images' | 'files'"), vec!["images", "files"]);
        assert!(string_list("[]").is_empty());
    }

    #[test]
    fn test_statement_end() {
        let text = "type A = { a: 1; b: 2 }; type B = string;";
        assert_eq!(&text[..statement_end(text, 0)], "type A = { a: 1; b: 2 }");

        let text = "type A = {\n  a: 1\n}\nexport type B = string";
        assert_eq!(&text[..statement_end(text, 0)], "type A = {\n  a: 1\n}");
        assert_eq!(statement_end("x", 0), 1);
    }

    #[test]
    fn test_squash() {
        let text = "{\n  // note\n  message:   string; /* x */ tag: 'a  b'\n}";
        assert_eq!(squash(text), "{ message: string; tag: 'a  b' }");
        assert_eq!(squash("  Array<Item>  "), "Array<Item>");
    }

    #[test]
    fn test_generic_parts() {
        let (name, args) = generic_parts("Schema.Attribute.Relation<'oneToMany', 'api::a.a'>")
            .unwrap();
        assert_eq!(name, "Schema.Attribute.Relation");
        assert_eq!(args, vec!["'oneToMany'", "'api::a.a'"]);

        let (name, args) = generic_parts("Schema.Attribute.String").unwrap();
        assert_eq!(name, "Schema.Attribute.String");
        assert!(args.is_empty());

        assert!(generic_parts("Relation<'a'").is_none());
    }
}
