//! Inline parser.
//!
//! A character machine over a frame stack. Strong and emphasis open frames;
//! code spans, inline components, bracket spans, links, and bindings are
//! scanned atomically by attempt functions that either consume a complete
//! construct or consume nothing, in which case the trigger character falls
//! through as literal text. Unmatched frames unwind to literal text at the
//! end of input.

use crate::mdc::ast::{AttributeMap, Node};
use crate::mdc::attributes::parse_attribute_block_chars;

/// Parse inline nodes from a raw string.
pub fn parse_inlines(text: &str) -> Vec<Node> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut stack = vec![InlineFrame::new(FrameKind::Root)];
    let mut blocked = BlockedClosings::default();

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let prev = if i == 0 { None } else { Some(chars[i - 1]) };

        // Escapes first so escaped delimiters never trigger parser state.
        if ch == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                top(&mut stack).push_char(next);
                i += 2;
            } else {
                top(&mut stack).push_char('\\');
                i += 1;
            }
            continue;
        }

        match ch {
            '`' => {
                if let Some((value, consumed)) = scan_code_span(&chars, i) {
                    top(&mut stack).push_node(Node::InlineCode {
                        value,
                        attributes: AttributeMap::new(),
                    });
                    i += consumed;
                } else {
                    // Unterminated run stays literal.
                    while i < chars.len() && chars[i] == '`' {
                        top(&mut stack).push_char('`');
                        i += 1;
                    }
                }
                continue;
            }
            '{' => {
                if chars.get(i + 1) == Some(&'{') {
                    if let Some((value, default_value, consumed)) = scan_binding(&chars, i) {
                        top(&mut stack).push_node(Node::Binding {
                            value,
                            default_value,
                        });
                        i += consumed;
                        continue;
                    }
                }
                // An attribute block binds to the node it immediately follows.
                let frame = top(&mut stack);
                if frame.buffer.is_empty() && frame.last_is_attachable() {
                    if let Some((attrs, consumed)) = parse_attribute_block_chars(&chars[i..]) {
                        frame.attach_to_last(attrs);
                        i += consumed;
                        continue;
                    }
                }
                frame.push_char('{');
                i += 1;
                continue;
            }
            ':' => {
                let blocked_prefix = matches!(prev, Some(p) if is_word(Some(p)) || p == ':');
                if !blocked_prefix {
                    if let Some((node, consumed)) = scan_inline_component(&chars, i) {
                        top(&mut stack).push_node(node);
                        i += consumed;
                        continue;
                    }
                }
                top(&mut stack).push_char(':');
                i += 1;
                continue;
            }
            '[' => {
                if let Some((node, consumed)) = scan_bracket_construct(&chars, i) {
                    top(&mut stack).push_node(node);
                    i += consumed;
                    continue;
                }
                top(&mut stack).push_char('[');
                i += 1;
                continue;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                let next = chars.get(i + 2).copied();
                if toggle_frame(&mut stack, &mut blocked, FrameKind::Strong, prev, next) {
                    i += 2;
                } else {
                    top(&mut stack).push_char('*');
                    top(&mut stack).push_char('*');
                    i += 2;
                }
                continue;
            }
            '_' => {
                let next = chars.get(i + 1).copied();
                if toggle_frame(&mut stack, &mut blocked, FrameKind::Emphasis, prev, next) {
                    i += 1;
                } else {
                    top(&mut stack).push_char('_');
                    i += 1;
                }
                continue;
            }
            _ => {
                top(&mut stack).push_char(ch);
                i += 1;
            }
        }
    }

    // Unwind unmatched frames into literal delimiters plus their children.
    top(&mut stack).flush_buffer();
    while stack.len() > 1 {
        let mut frame = stack.pop().unwrap();
        frame.flush_buffer();
        let token = frame.kind.token_str();
        let parent = top(&mut stack);
        for ch in token.chars() {
            parent.push_char(ch);
        }
        for child in frame.children {
            parent.push_node(child);
        }
    }

    let mut root = stack.pop().unwrap();
    root.flush_buffer();
    root.children
}

/// Open or close a strong/emphasis frame. Returns `false` when the delimiter
/// is literal in this position.
fn toggle_frame(
    stack: &mut Vec<InlineFrame>,
    blocked: &mut BlockedClosings,
    kind: FrameKind,
    prev: Option<char>,
    next: Option<char>,
) -> bool {
    let top_kind = stack.last().map(|f| f.kind).unwrap_or(FrameKind::Root);

    if top_kind == kind {
        if blocked.consume(kind) {
            // Closing half of a disallowed nested start; both stay literal.
            return false;
        }
        if is_valid_end(prev, next) {
            let mut frame = stack.pop().unwrap();
            let had_content = frame.has_content();
            frame.flush_buffer();
            let parent = stack.last_mut().unwrap();
            if !had_content {
                for ch in kind.token_str().chars() {
                    parent.push_char(ch);
                }
                for ch in kind.token_str().chars() {
                    parent.push_char(ch);
                }
            } else {
                let node = frame.into_node();
                parent.push_node(node);
            }
            return true;
        }
        // Invalid close position falls through to the start attempt so the
        // blocked-closings ledger keeps inner same-kind pairs literal.
    }

    if is_valid_start(prev, next) {
        if stack.iter().any(|frame| frame.kind == kind) {
            blocked.increment(kind);
            return false;
        }
        stack.last_mut().unwrap().flush_buffer();
        stack.push(InlineFrame::new(kind));
        return true;
    }

    false
}

fn top(stack: &mut [InlineFrame]) -> &mut InlineFrame {
    stack.last_mut().unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Strong,
    Emphasis,
}

impl FrameKind {
    fn token_str(self) -> &'static str {
        match self {
            FrameKind::Strong => "**",
            FrameKind::Emphasis => "_",
            FrameKind::Root => "",
        }
    }
}

struct InlineFrame {
    kind: FrameKind,
    buffer: String,
    children: Vec<Node>,
}

impl InlineFrame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            buffer: String::new(),
            children: Vec::new(),
        }
    }

    fn has_content(&self) -> bool {
        !self.buffer.is_empty() || !self.children.is_empty()
    }

    fn push_char(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        if let Some(Node::Text { value }) = self.children.last_mut() {
            value.push_str(&text);
        } else {
            self.children.push(Node::Text { value: text });
        }
    }

    fn push_node(&mut self, node: Node) {
        self.flush_buffer();
        match node {
            Node::Text { value } => {
                if value.is_empty() {
                    return;
                }
                if let Some(Node::Text { value: existing }) = self.children.last_mut() {
                    existing.push_str(&value);
                } else {
                    self.children.push(Node::Text { value });
                }
            }
            other => self.children.push(other),
        }
    }

    fn last_is_attachable(&self) -> bool {
        matches!(
            self.children.last(),
            Some(
                Node::Strong { .. }
                    | Node::Emphasis { .. }
                    | Node::InlineCode { .. }
                    | Node::Link { .. }
                    | Node::Span { .. }
            )
        )
    }

    fn attach_to_last(&mut self, attrs: AttributeMap) {
        match self.children.last_mut() {
            Some(
                Node::Strong { attributes, .. }
                | Node::Emphasis { attributes, .. }
                | Node::InlineCode { attributes, .. }
                | Node::Link { attributes, .. }
                | Node::Span { attributes, .. },
            ) => attributes.extend_from(attrs),
            _ => {}
        }
    }

    fn into_node(self) -> Node {
        match self.kind {
            FrameKind::Root => panic!("cannot convert root frame into a node"),
            FrameKind::Strong => Node::Strong {
                children: self.children,
                attributes: AttributeMap::new(),
            },
            FrameKind::Emphasis => Node::Emphasis {
                children: self.children,
                attributes: AttributeMap::new(),
            },
        }
    }
}

#[derive(Default)]
struct BlockedClosings {
    strong: usize,
    emphasis: usize,
}

impl BlockedClosings {
    fn increment(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::Strong => self.strong += 1,
            FrameKind::Emphasis => self.emphasis += 1,
            FrameKind::Root => {}
        }
    }

    fn consume(&mut self, kind: FrameKind) -> bool {
        let counter = match kind {
            FrameKind::Strong => &mut self.strong,
            FrameKind::Emphasis => &mut self.emphasis,
            FrameKind::Root => return false,
        };
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

fn is_valid_start(prev: Option<char>, next: Option<char>) -> bool {
    !is_word(prev) && !matches!(next, None | Some(' ') | Some('\t'))
}

fn is_valid_end(prev: Option<char>, next: Option<char>) -> bool {
    matches!(prev, Some(ch) if !ch.is_whitespace()) && !is_word(next)
}

fn is_word(ch: Option<char>) -> bool {
    ch.map(|c| c.is_alphanumeric()).unwrap_or(false)
}

/// Code span with backtick-run matching: an opening run of `n` backticks
/// closes at the next run of exactly `n`. Shorter and longer runs inside are
/// literal content.
fn scan_code_span(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut open = 0;
    while chars.get(start + open) == Some(&'`') {
        open += 1;
    }

    let mut i = start + open;
    let mut value = String::new();
    while i < chars.len() {
        if chars[i] == '`' {
            let mut run = 0;
            while chars.get(i + run) == Some(&'`') {
                run += 1;
            }
            if run == open {
                return Some((unpad_code_value(value), i + run - start));
            }
            for _ in 0..run {
                value.push('`');
            }
            i += run;
        } else {
            value.push(chars[i]);
            i += 1;
        }
    }
    None
}

/// One space of padding is stripped from both ends when present, mirroring
/// the serializer's padding for values with edge backticks.
fn unpad_code_value(value: String) -> String {
    if value.starts_with(' ') && value.ends_with(' ') && !value.trim().is_empty() {
        value[1..value.len() - 1].to_string()
    } else {
        value
    }
}

/// `{{ expr }}` or `{{ expr || 'fallback' }}`. No raw newline inside; the
/// expression itself is opaque.
fn scan_binding(chars: &[char], start: usize) -> Option<(String, Option<String>, usize)> {
    let mut i = start + 2;
    let mut body = String::new();
    while i < chars.len() {
        if chars[i] == '\n' {
            return None;
        }
        if chars[i] == '}' && chars.get(i + 1) == Some(&'}') {
            let raw = body.trim();
            let (value, default_value) = match raw.split_once("||") {
                Some((head, tail)) => (
                    head.trim().to_string(),
                    Some(strip_quotes(tail.trim()).to_string()),
                ),
                None => (raw.to_string(), None),
            };
            if value.is_empty() {
                return None;
            }
            return Some((value, default_value, i + 2 - start));
        }
        body.push(chars[i]);
        i += 1;
    }
    None
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// `:name`, `:name[label]`, `:name{attrs}`, `:name[label]{attrs}`. A present
/// but malformed label or attribute block fails the whole attempt.
fn scan_inline_component(chars: &[char], start: usize) -> Option<(Node, usize)> {
    let name_end = scan_name(chars, start + 1)?;
    let name: String = chars[start + 1..name_end].iter().collect();

    let mut i = name_end;
    let mut label = Vec::new();
    if chars.get(i) == Some(&'[') {
        let (raw, consumed) = scan_bracket_label(chars, i)?;
        label = parse_inlines(&raw);
        i += consumed;
    }

    let mut attributes = AttributeMap::new();
    if chars.get(i) == Some(&'{') {
        let (attrs, consumed) = parse_attribute_block_chars(&chars[i..])?;
        attributes = attrs;
        i += consumed;
    }

    Some((
        Node::Span {
            name,
            label,
            attributes,
        },
        i - start,
    ))
}

fn scan_name(chars: &[char], start: usize) -> Option<usize> {
    if !matches!(chars.get(start), Some(ch) if ch.is_ascii_alphabetic()) {
        return None;
    }
    let mut i = start + 1;
    while matches!(chars.get(i), Some(ch) if ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
    {
        i += 1;
    }
    Some(i)
}

/// `[label]{attrs}` bracket span or `[label](url)` link. A bare `[label]`
/// with neither suffix is literal text.
fn scan_bracket_construct(chars: &[char], start: usize) -> Option<(Node, usize)> {
    let (raw_label, consumed) = scan_bracket_label(chars, start)?;
    let mut i = start + consumed;

    match chars.get(i) {
        Some('{') => {
            let (attributes, attrs_consumed) = parse_attribute_block_chars(&chars[i..])?;
            i += attrs_consumed;
            Some((
                Node::Span {
                    name: "span".to_string(),
                    label: parse_inlines(&raw_label),
                    attributes,
                },
                i - start,
            ))
        }
        Some('(') => {
            let (url, url_consumed) = scan_link_target(chars, i)?;
            i += url_consumed;
            Some((
                Node::Link {
                    url,
                    children: parse_inlines(&raw_label),
                    attributes: AttributeMap::new(),
                },
                i - start,
            ))
        }
        _ => None,
    }
}

/// Balanced `[...]` scan. Escape pairs stay verbatim so nested constructs in
/// the label re-parse with their escapes intact. Also used by the block
/// parser for container head payloads.
pub(crate) fn scan_bracket_label(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut depth = 0usize;
    let mut label = String::new();
    let mut i = start;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' && i + 1 < chars.len() {
            label.push('\\');
            label.push(chars[i + 1]);
            i += 2;
            continue;
        }
        match ch {
            '\n' => return None,
            '[' => {
                depth += 1;
                if depth > 1 {
                    label.push('[');
                }
            }
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((label, i + 1 - start));
                }
                label.push(']');
            }
            _ => label.push(ch),
        }
        i += 1;
    }
    None
}

fn scan_link_target(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut url = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' && i + 1 < chars.len() {
            url.push(chars[i + 1]);
            i += 2;
            continue;
        }
        match ch {
            '\n' => return None,
            ')' => return Some((url, i + 1 - start)),
            _ => url.push(ch),
        }
        i += 1;
    }
    None
}
