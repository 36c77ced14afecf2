//! YAML / frontmatter codec
//!
//! Two call sites share this boundary: the document-leading `---` block and
//! the YAML attribute block at the top of a container body. The codec folds
//! dotted keys (`parent.child: v`) into nested mappings on read and unfolds
//! nested mappings back to dotted keys on write; sequences, scalars, and
//! empty mappings are leaves. `serde_yaml::Mapping` preserves document order,
//! so no sentinel key is needed to thread ordering through.

use serde_yaml::{Mapping, Value};

use crate::mdc::ast::{AttrValue, AttributeMap};

const FRONTMATTER_DELIMITER: &str = "---";
const CODE_BLOCK_PROPS_INFO: &str = "yaml [props]";

/// Split leading frontmatter off a document.
///
/// Returns the remaining content and the (dotted-key-folded) mapping. The
/// block is recognized only at byte 0; a missing terminator, an empty
/// payload, or invalid YAML leaves the text untouched. A whitespace-only
/// payload consumes the block and yields an empty mapping.
pub fn parse_front_matter(content: &str) -> (String, Mapping) {
    let untouched = || (content.to_string(), Mapping::new());

    let body_start = if content.starts_with("---\r\n") {
        5
    } else if content.starts_with("---\n") {
        4
    } else {
        return untouched();
    };

    let rel = match content[body_start..].find("\n---") {
        Some(rel) => rel,
        None => return untouched(),
    };
    let idx = body_start + rel;

    let mut payload = &content[body_start..idx];
    if let Some(stripped) = payload.strip_suffix('\r') {
        payload = stripped;
    }
    if payload.is_empty() {
        return untouched();
    }

    let rest = content[idx + 4..].to_string();
    match serde_yaml::from_str::<Value>(payload) {
        Ok(Value::Mapping(mapping)) => (rest, fold_dotted(mapping)),
        Ok(Value::Null) => (rest, Mapping::new()),
        _ => untouched(),
    }
}

/// Parse a container-level YAML payload into ordered fm-attributes.
///
/// `None` on invalid or non-mapping YAML; the caller then treats the block's
/// lines as ordinary content.
pub fn parse_yaml_block(payload: &str) -> Option<AttributeMap> {
    match serde_yaml::from_str::<Value>(payload) {
        Ok(Value::Mapping(mapping)) => Some(mapping_to_fm_attributes(fold_dotted(mapping))),
        Ok(Value::Null) => Some(AttributeMap::new()),
        _ => None,
    }
}

/// Stringify a mapping, unfolding nested mappings to dotted keys. Empty
/// mappings produce the empty string. No delimiters, no trailing newline.
pub fn stringify_yaml(data: &Mapping) -> String {
    if data.is_empty() {
        return String::new();
    }
    let unfolded = unfold_dotted(data);
    serde_yaml::to_string(&Value::Mapping(unfolded))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Wrap content in a `---` frontmatter block. With no data the content is
/// passed through with its edges trimmed.
///
/// Only blank edges are trimmed: trailing whitespace and leading newlines.
/// Leading spaces on the first content line are indentation and survive.
pub fn stringify_front_matter(data: &Mapping, content: &str) -> String {
    let content = trim_content(content);
    if data.is_empty() {
        return format!("{}\n", content);
    }
    let block = format!(
        "{}\n{}\n{}\n\n{}",
        FRONTMATTER_DELIMITER,
        stringify_yaml(data),
        FRONTMATTER_DELIMITER,
        content
    );
    format!("{}\n", block.trim_end())
}

/// Wrap content in the fenced `yaml [props]` code-block form.
pub fn stringify_code_block_props(data: &Mapping, content: &str) -> String {
    let content = trim_content(content);
    if data.is_empty() {
        return format!("{}\n", content);
    }
    let block = format!(
        "```{}\n{}\n```\n{}",
        CODE_BLOCK_PROPS_INFO,
        stringify_yaml(data),
        content
    );
    format!("{}\n", block.trim_end())
}

fn trim_content(content: &str) -> &str {
    content.trim_start_matches('\n').trim_end()
}

/// Returns `true` when a code fence info string marks a props block.
pub fn is_props_info(info: &str) -> bool {
    info == CODE_BLOCK_PROPS_INFO
}

/// Fold top-level dotted keys into nested mappings.
pub fn fold_dotted(mapping: Mapping) -> Mapping {
    let mut out = Mapping::new();
    for (key, value) in mapping {
        match &key {
            Value::String(s) if s.contains('.') => {
                let parts: Vec<&str> = s.split('.').collect();
                insert_path(&mut out, &parts, value);
            }
            _ => {
                out.insert(key, value);
            }
        }
    }
    out
}

fn insert_path(map: &mut Mapping, path: &[&str], value: Value) {
    let key = Value::String(path[0].to_string());
    if path.len() == 1 {
        map.insert(key, value);
        return;
    }
    if !matches!(map.get(&key), Some(Value::Mapping(_))) {
        map.insert(key.clone(), Value::Mapping(Mapping::new()));
    }
    if let Some(Value::Mapping(child)) = map.get_mut(&key) {
        insert_path(child, &path[1..], value);
    }
}

/// Unfold nested mappings back to dotted keys (the codec's write direction).
pub fn unfold_dotted(mapping: &Mapping) -> Mapping {
    let mut out = Mapping::new();
    for (key, value) in mapping {
        let key_str = key_to_string(key);
        match value {
            Value::Mapping(child) if !child.is_empty() => {
                for (child_key, child_value) in unfold_dotted(child) {
                    let child_str = key_to_string(&child_key);
                    out.insert(
                        Value::String(format!("{}.{}", key_str, child_str)),
                        child_value,
                    );
                }
            }
            _ => {
                out.insert(Value::String(key_str), value.clone());
            }
        }
    }
    out
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Convert a YAML value into an attribute value: strings and booleans stay
/// themselves, everything else is carried as structured JSON.
pub fn yaml_to_attr(value: &Value) -> AttrValue {
    match value {
        Value::Bool(b) => AttrValue::Bool(*b),
        Value::String(s) => AttrValue::String(s.clone()),
        other => AttrValue::Json(yaml_to_json(other)),
    }
}

pub fn attr_to_yaml(value: &AttrValue) -> Value {
    match value {
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::String(s) => Value::String(s.clone()),
        AttrValue::Json(json) => json_to_yaml(json),
    }
}

fn yaml_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            } else {
                serde_json::Value::Null
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(seq) => {
            serde_json::Value::Array(seq.iter().map(yaml_to_json).collect())
        }
        Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(key_to_string(k), yaml_to_json(v));
            }
            serde_json::Value::Object(out)
        }
        Value::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn json_to_yaml(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                Value::Number(serde_yaml::Number::from(n.as_f64().unwrap_or(0.0)))
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.iter().map(json_to_yaml).collect())
        }
        serde_json::Value::Object(map) => {
            let mut out = Mapping::new();
            for (k, v) in map {
                out.insert(Value::String(k.clone()), json_to_yaml(v));
            }
            Value::Mapping(out)
        }
    }
}

/// Top-level mapping entries as ordered container fm-attributes.
pub fn mapping_to_fm_attributes(mapping: Mapping) -> AttributeMap {
    let mut out = AttributeMap::new();
    for (key, value) in &mapping {
        out.insert(key_to_string(key), yaml_to_attr(value));
    }
    out
}

/// Container fm-attributes rendered as a YAML mapping, key-sorted. Keys with
/// a `:` prefix and a JSON-parseable string value are unwrapped so bound data
/// lands in the frontmatter as structure, not as an escaped string.
pub fn fm_attributes_to_mapping(attrs: &AttributeMap) -> Mapping {
    let mut out = Mapping::new();
    for (key, value) in attrs.sorted() {
        let unwrapped = key.strip_prefix(':').and_then(|bare| {
            let literal = value.as_str()?;
            serde_json::from_str::<serde_json::Value>(literal)
                .ok()
                .map(|json| (bare.to_string(), json_to_yaml(&json)))
        });
        match unwrapped {
            Some((bare, yaml)) => {
                out.insert(Value::String(bare), yaml);
            }
            None => {
                out.insert(Value::String(key.to_string()), attr_to_yaml(value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, Value)]) -> Mapping {
        let mut out = Mapping::new();
        for (k, v) in pairs {
            out.insert(Value::String(k.to_string()), v.clone());
        }
        out
    }

    #[test]
    fn parses_simple_front_matter() {
        let (rest, data) = parse_front_matter("---\ntitle: Hello\n---\n\nBody");
        assert_eq!(rest, "\n\nBody");
        assert_eq!(data.get(Value::String("title".into())), Some(&Value::String("Hello".into())));
    }

    #[test]
    fn missing_terminator_leaves_content_untouched() {
        let input = "---\ntitle: Hello\nno closing fence";
        let (rest, data) = parse_front_matter(input);
        assert_eq!(rest, input);
        assert!(data.is_empty());
    }

    #[test]
    fn empty_payload_is_untouched() {
        let input = "---\n---\n\nContent";
        let (rest, data) = parse_front_matter(input);
        assert_eq!(rest, input);
        assert!(data.is_empty());
    }

    #[test]
    fn whitespace_payload_is_consumed() {
        let (rest, data) = parse_front_matter("---\n   \n---\n\nContent");
        assert_eq!(rest, "\n\nContent");
        assert!(data.is_empty());
    }

    #[test]
    fn folds_dotted_keys() {
        let (_, data) = parse_front_matter("---\nparent.child: value\nparent.another: v2\n---\nx");
        let parent = data.get(Value::String("parent".into())).unwrap();
        match parent {
            Value::Mapping(map) => {
                assert_eq!(
                    map.get(Value::String("child".into())),
                    Some(&Value::String("value".into()))
                );
                assert_eq!(
                    map.get(Value::String("another".into())),
                    Some(&Value::String("v2".into()))
                );
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn unfolds_on_write() {
        let nested = mapping(&[(
            "parent",
            Value::Mapping(mapping(&[
                ("child", Value::String("value".into())),
                ("another", Value::String("v2".into())),
            ])),
        )]);
        let yaml = stringify_yaml(&nested);
        assert_eq!(yaml, "parent.child: value\nparent.another: v2");
    }

    #[test]
    fn dotted_round_trip() {
        let source = "---\nparent.child: value\nparent.another: v2\n---\n\nBody";
        let (rest, data) = parse_front_matter(source);
        let out = stringify_front_matter(&data, &rest);
        assert_eq!(out, source.to_string() + "\n");
    }

    #[test]
    fn front_matter_without_data_passes_content_through() {
        assert_eq!(
            stringify_front_matter(&Mapping::new(), "\n# Hello\n\ncontent  \n"),
            "# Hello\n\ncontent\n"
        );
    }

    #[test]
    fn leading_indentation_of_content_survives() {
        assert_eq!(
            stringify_front_matter(&Mapping::new(), "  :::inner\n  deep\n  :::"),
            "  :::inner\n  deep\n  :::\n"
        );
        let data = mapping(&[("kind", Value::String("note".into()))]);
        assert_eq!(
            stringify_front_matter(&data, "  :::inner\n  deep\n  :::"),
            "---\nkind: note\n---\n\n  :::inner\n  deep\n  :::\n"
        );
    }

    #[test]
    fn code_block_props_shape() {
        let data = mapping(&[("title", Value::String("Hello".into()))]);
        assert_eq!(
            stringify_code_block_props(&data, ""),
            "```yaml [props]\ntitle: Hello\n```\n"
        );
    }

    #[test]
    fn fm_attributes_unwrap_bound_json() {
        let mut attrs = AttributeMap::new();
        attrs.insert(":items", AttrValue::String("[1,2]".into()));
        attrs.insert("plain", "text");
        let mapping = fm_attributes_to_mapping(&attrs);
        assert_eq!(
            mapping.get(Value::String("items".into())),
            Some(&Value::Sequence(vec![
                Value::Number(1.into()),
                Value::Number(2.into())
            ]))
        );
        assert_eq!(
            mapping.get(Value::String("plain".into())),
            Some(&Value::String("text".into()))
        );
    }

    #[test]
    fn invalid_bound_json_stays_opaque() {
        let mut attrs = AttributeMap::new();
        attrs.insert(":broken", AttrValue::String("{not json".into()));
        let mapping = fm_attributes_to_mapping(&attrs);
        assert_eq!(
            mapping.get(Value::String(":broken".into())),
            Some(&Value::String("{not json".into()))
        );
    }
}
