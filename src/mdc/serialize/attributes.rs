//! Inline attribute rendering.
//!
//! The write-side inverse of `mdc::attributes`. Entry order is id, class
//! shorthands, unsafe class, then the remaining attributes sorted by key
//! (insertion order under `preserve_order`). Every rendered value parses
//! back to the identical string.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::mdc::ast::{AttrValue, AttributeMap};

/// Values matching this render as `#id` / `.class` shorthands.
pub static SHORTCUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^\t\n\r "'.<=>`}]+$"#).expect("valid shortcut pattern"));

/// Rendered inline attributes that match this force promotion to the YAML
/// block: a quoted value opening JSON structure, or an embedded newline.
pub static UNSAFE_INLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(=['"][{\[]|\n)"#).expect("valid unsafe pattern"));

static SINGLE_QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^/])'").expect("valid quote pattern"));

/// Render an attribute map as `{...}`, or an empty string when the map is
/// empty.
pub fn render_attributes(attrs: &AttributeMap, preserve_order: bool) -> String {
    if attrs.is_empty() {
        return String::new();
    }

    let entries: Vec<(&str, &AttrValue)> = if preserve_order {
        attrs.iter().collect()
    } else {
        attrs.sorted()
    };

    let mut head: Vec<String> = Vec::new();
    let mut unsafe_class: Option<String> = None;
    let mut rest: Vec<String> = Vec::new();

    for (key, value) in entries {
        match key {
            "id" => {
                let v = value.display_string();
                if SHORTCUT_RE.is_match(&v) {
                    head.insert(0, format!("#{}", v));
                } else {
                    rest.push(render_pair("id", &v));
                }
            }
            "class" | "className" => {
                let v = value.display_string();
                let (safe, raw): (Vec<&str>, Vec<&str>) = v
                    .split_whitespace()
                    .partition(|part| SHORTCUT_RE.is_match(part));
                if !safe.is_empty() {
                    head.push(format!(".{}", safe.join(".")));
                }
                if !raw.is_empty() {
                    unsafe_class = Some(render_pair(key, &raw.join(" ")));
                }
            }
            bound if bound.starts_with(':') => rest.push(render_bound(bound, value)),
            plain => rest.push(render_pair(plain, &value.display_string())),
        }
    }

    let mut parts = head;
    parts.extend(unsafe_class);
    parts.extend(rest);
    format!("{{{}}}", parts.join(" "))
}

/// A `:`-prefixed attribute. `"true"` collapses to the bare flag; a value
/// that parses as JSON renders single-quoted so the reader side can inline
/// it into YAML.
fn render_bound(key: &str, value: &AttrValue) -> String {
    let literal = value.display_string();
    if literal == "true" {
        return key[1..].to_string();
    }
    if serde_json::from_str::<serde_json::Value>(&literal).is_ok() {
        let escaped = SINGLE_QUOTE_RE.replace_all(&literal, "$1\\'");
        return format!("{}='{}'", key, escaped);
    }
    render_pair(key, &literal)
}

fn render_pair(key: &str, value: &str) -> String {
    format!("{}={}", key, quote_value(value))
}

/// Quote with whichever quote character occurs less often in the value (ties
/// prefer `"`); occurrences of the chosen quote and backslashes are escaped.
fn quote_value(value: &str) -> String {
    let double = value.matches('"').count();
    let single = value.matches('\'').count();
    let quote = if single < double { '\'' } else { '"' };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        if ch == quote || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push(quote);
    out
}
