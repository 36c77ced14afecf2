//! Line classification
//!
//! Determines what each source line can start: container fences, section
//! markers, list items, YAML fences, code fences, headings, or plain text.
//! Classification runs once per line on the text after its indentation;
//! regions (list items, container bodies) only shift the indentation column,
//! so the classification stays valid when the parser recurses.

use once_cell::sync::Lazy;
use regex::Regex;

use super::line_tokens::{tokenize_line, RawToken};

/// Component name shape: `[A-Za-z][A-Za-z0-9_-]*`.
pub static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*").expect("valid name pattern"));

/// Structural classification of a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Blank,
    /// `::name...` — fence run plus component name; `rest` is the raw
    /// label/attribute payload after the name.
    FenceOpen { len: usize, name: String, rest: String },
    /// A colon run (length >= 2) and nothing else.
    FenceClose { len: usize },
    /// `#name` with no space: a container section slot. `rest` holds the raw
    /// attribute payload after the name.
    Section { name: String, rest: String },
    /// `#{1,6} ` heading.
    Heading { depth: u8 },
    /// `- ` or `13. ` list marker; `content_offset` is the byte offset of the
    /// item's own content within the line.
    ListItem { ordered: bool, number: u64, content_offset: usize },
    /// A line of three or more dashes and nothing else. YAML delimiter when a
    /// block expects one, thematic break otherwise.
    YamlFence,
    /// Three or more backticks; `info` is the trimmed info string.
    CodeFence { len: usize, info: String },
    Text,
}

/// Classify one line (indentation already stripped, no line ending).
pub fn classify_line(text: &str) -> LineKind {
    if text.trim().is_empty() {
        return LineKind::Blank;
    }
    // A leading backslash is the serializer's block-level escape hatch: the
    // line is always plain text.
    if text.starts_with('\\') {
        return LineKind::Text;
    }

    let tokens = tokenize_line(text);
    let (first, span) = match tokens.first() {
        Some((token, span)) => (token, span.clone()),
        None => return LineKind::Text,
    };
    if span.start != 0 {
        return LineKind::Text;
    }

    match first {
        RawToken::ColonRun if span.len() >= 2 => {
            let len = span.len();
            let rest = &text[len..];
            if rest.trim().is_empty() {
                return LineKind::FenceClose { len };
            }
            if let Some(m) = NAME_RE.find(rest) {
                return LineKind::FenceOpen {
                    len,
                    name: m.as_str().to_string(),
                    rest: rest[m.end()..].to_string(),
                };
            }
            LineKind::Text
        }
        RawToken::DashRun => {
            let len = span.len();
            if len == 1 && text[1..].starts_with(' ') {
                return LineKind::ListItem { ordered: false, number: 0, content_offset: 2 };
            }
            if len >= 3 && text[len..].trim().is_empty() {
                return LineKind::YamlFence;
            }
            LineKind::Text
        }
        RawToken::HashRun => {
            let depth = span.len();
            if depth <= 6 && text[depth..].starts_with(' ') {
                return LineKind::Heading { depth: depth as u8 };
            }
            if depth == 1 {
                if let Some(m) = NAME_RE.find(&text[1..]) {
                    return LineKind::Section {
                        name: m.as_str().to_string(),
                        rest: text[1 + m.end()..].to_string(),
                    };
                }
            }
            LineKind::Text
        }
        RawToken::BacktickRun if span.len() >= 3 => LineKind::CodeFence {
            len: span.len(),
            info: text[span.len()..].trim().to_string(),
        },
        RawToken::Number => {
            let digits = &text[span.clone()];
            let after = &text[span.end..];
            let is_marker = (after.starts_with(". ") || after.starts_with(") "))
                || (after == "." || after == ")");
            if is_marker {
                if let Ok(number) = digits.parse::<u64>() {
                    return LineKind::ListItem {
                        ordered: true,
                        number,
                        content_offset: (span.end + 2).min(text.len()),
                    };
                }
            }
            LineKind::Text
        }
        _ => LineKind::Text,
    }
}

/// One source line: indentation column, text after the indentation, and its
/// classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub indent: usize,
    pub text: String,
    pub kind: LineKind,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        matches!(self.kind, LineKind::Blank)
    }

    /// Reconstructs the line's raw text relative to a base indentation
    /// column, for verbatim regions like code blocks.
    pub fn raw_from(&self, base: usize) -> String {
        let pad = self.indent.saturating_sub(base);
        format!("{}{}", " ".repeat(pad), self.text)
    }

    /// The same line seen from inside a region indented at `base` columns.
    pub fn shifted(&self, base: usize) -> Line {
        Line {
            indent: self.indent.saturating_sub(base),
            text: self.text.clone(),
            kind: self.kind.clone(),
        }
    }
}

/// Split source text into classified lines. Line endings (`\n`, `\r\n`) are
/// stripped, and a trailing line ending does not produce an extra blank
/// line; a tab counts as one indentation column.
pub fn build_lines(source: &str) -> Vec<Line> {
    let mut lines: Vec<Line> = source
        .split('\n')
        .map(|raw| {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let indent = raw.chars().take_while(|c| *c == ' ' || *c == '\t').count();
            let text: String = raw.chars().skip(indent).collect();
            let kind = classify_line(&text);
            Line { indent, text, kind }
        })
        .collect();
    if source.ends_with('\n') {
        lines.pop();
    }
    lines
}
