//! Attribute block scanner
//!
//! Parses the `{...}` payload that follows a component head: `#id` and
//! `.class` shorthands, `key=value` pairs with bare or quoted values, and
//! bare-word boolean flags. The scanner is an attempt function: any malformed
//! payload (unbalanced braces, unterminated quote, raw newline outside a
//! quoted value) returns `None` and the caller degrades to literal text.

use crate::mdc::ast::{AttrValue, AttributeMap};

/// Parse an attribute block from a char slice starting at `{`.
///
/// Returns the parsed map and the number of chars consumed, including both
/// braces. Newlines are rejected everywhere except inside quoted values.
pub fn parse_attribute_block_chars(chars: &[char]) -> Option<(AttributeMap, usize)> {
    if chars.first() != Some(&'{') {
        return None;
    }

    let mut map = AttributeMap::new();
    let mut i = 1;

    loop {
        while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
            i += 1;
        }
        let ch = *chars.get(i)?;
        if ch == '}' {
            return Some((map, i + 1));
        }
        if ch == '\n' || ch == '\r' {
            return None;
        }

        match ch {
            '#' => {
                let (word, next) = read_shorthand(chars, i + 1)?;
                if word.is_empty() {
                    return None;
                }
                map.insert("id", word);
                i = next;
            }
            '.' => {
                let (word, next) = read_shorthand(chars, i + 1)?;
                if word.is_empty() {
                    return None;
                }
                push_class(&mut map, &word);
                i = next;
            }
            _ => {
                let (key, next) = read_key(chars, i)?;
                if key.is_empty() {
                    return None;
                }
                i = next;
                if chars.get(i) == Some(&'=') {
                    i += 1;
                    let (value, next) = read_value(chars, i)?;
                    i = next;
                    if key == "class" || key == "className" {
                        push_class(&mut map, &value);
                    } else {
                        map.insert(key, value);
                    }
                } else {
                    // Bare word: shorthand boolean, stored under the bound
                    // form so `{flag}` and `:flag=true` round-trip the same.
                    map.insert(format!(":{}", key), AttrValue::Bool(true));
                }
            }
        }
    }
}

/// Parse an attribute block from a string slice starting at `{`.
///
/// Returns the map and the number of *bytes* consumed.
pub fn parse_attribute_block(input: &str) -> Option<(AttributeMap, usize)> {
    let chars: Vec<char> = input.chars().collect();
    let (map, consumed) = parse_attribute_block_chars(&chars)?;
    let bytes = chars[..consumed].iter().map(|c| c.len_utf8()).sum();
    Some((map, bytes))
}

/// Shorthand token (`#id` / `.class` payload): stops at whitespace, `}`, or
/// the start of the next shorthand, so `.foo.bar` yields two class tokens.
fn read_shorthand(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' | '}' | '.' | '#' => break,
            '\n' | '\r' => return None,
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    if i >= chars.len() {
        return None;
    }
    Some((out, i))
}

/// Bare token: anything up to whitespace or `}`. Newlines are malformed here.
fn read_bare(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' | '}' => break,
            '\n' | '\r' => return None,
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    if i >= chars.len() {
        return None;
    }
    Some((out, i))
}

/// Attribute key: stops at `=`, whitespace, or `}`.
fn read_key(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() {
        match chars[i] {
            '=' | ' ' | '\t' | '}' => break,
            '\n' | '\r' => return None,
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    if i >= chars.len() {
        return None;
    }
    Some((out, i))
}

/// Attribute value: quoted (either quote character, backslash escapes,
/// newlines permitted) or bare.
fn read_value(chars: &[char], start: usize) -> Option<(String, usize)> {
    match chars.get(start) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            let mut i = start + 1;
            let mut out = String::new();
            while i < chars.len() {
                let c = chars[i];
                if c == '\\' {
                    match chars.get(i + 1) {
                        Some(&next) if next == quote || next == '\\' => {
                            out.push(next);
                            i += 2;
                        }
                        Some(&next) => {
                            // Unknown escape: keep the backslash so e.g. JSON
                            // string escapes survive untouched.
                            out.push('\\');
                            out.push(next);
                            i += 2;
                        }
                        None => return None,
                    }
                } else if c == quote {
                    return Some((out, i + 1));
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            None
        }
        Some(_) => read_bare(chars, start),
        None => None,
    }
}

/// Append a class token, space-joining with any classes seen earlier.
fn push_class(map: &mut AttributeMap, token: &str) {
    let merged = match map.get("class").and_then(AttrValue::as_str) {
        Some(existing) if !existing.is_empty() => format!("{} {}", existing, token),
        _ => token.to_string(),
    };
    map.insert("class", merged);
}
