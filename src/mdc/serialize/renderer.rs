//! Tree-to-text rendering.
//!
//! A single bottom-up pass. All rendering state travels in `RenderContext`;
//! nothing is shared or mutated across siblings, so a container can always be
//! rendered in isolation. Fences are canonical on the way out: a container at
//! depth `d` emits a fence of `2 + d` colons regardless of what the author
//! wrote, and every line of a depth >= 1 container is indented one 2-space
//! step relative to its parent.

use crate::mdc::ast::error::{SerializeError, SerializeResult};
use crate::mdc::ast::{AttrValue, AttributeMap, Document, Node};
use crate::mdc::frontmatter::{
    fm_attributes_to_mapping, stringify_code_block_props, stringify_front_matter,
};
use crate::mdc::lexing::{classify_line, LineKind};
use crate::mdc::options::MdcOptions;

use super::attributes::{render_attributes, UNSAFE_INLINE_RE};

/// Serialize a document, frontmatter included. The only failure mode is an
/// attribute key living in both `attributes` and `fm_attributes` of the same
/// container.
pub fn serialize_document(document: &Document, options: &MdcOptions) -> SerializeResult<String> {
    let ctx = RenderContext { depth: 0, options };
    let content = render_blocks(&document.children, &ctx)?;
    Ok(stringify_front_matter(&document.frontmatter, &content))
}

/// Per-node rendering state.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Container nesting depth of the region being rendered.
    pub depth: usize,
    pub options: &'a MdcOptions,
}

impl<'a> RenderContext<'a> {
    fn nested(&self) -> Self {
        Self {
            depth: self.depth + 1,
            options: self.options,
        }
    }

    fn preserve_order(&self) -> bool {
        self.options.attributes.preserve_order
    }
}

fn render_blocks(nodes: &[Node], ctx: &RenderContext) -> SerializeResult<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut pending_inlines: Vec<&Node> = Vec::new();

    for node in nodes {
        if node.is_block() {
            flush_inline_run(&mut pending_inlines, &mut parts, ctx);
            parts.push(render_block(node, ctx)?);
        } else {
            // Inline nodes at block position render as an implicit paragraph.
            pending_inlines.push(node);
        }
    }
    flush_inline_run(&mut pending_inlines, &mut parts, ctx);

    Ok(parts.join("\n\n"))
}

fn flush_inline_run(pending: &mut Vec<&Node>, parts: &mut Vec<String>, ctx: &RenderContext) {
    if pending.is_empty() {
        return;
    }
    let nodes: Vec<Node> = pending.drain(..).cloned().collect();
    parts.push(render_paragraph(&nodes, ctx));
}

fn render_block(node: &Node, ctx: &RenderContext) -> SerializeResult<String> {
    match node {
        Node::Paragraph { children } => Ok(render_paragraph(children, ctx)),
        Node::Heading { depth, children } => {
            let text = render_inlines(children, ctx, false).replace(['\n', '\r'], " ");
            Ok(format!("{} {}", "#".repeat(*depth as usize), text))
        }
        Node::List {
            ordered,
            start,
            items,
        } => render_list(*ordered, *start, items, ctx),
        Node::CodeBlock { info, value } => Ok(render_code_block(info, value)),
        Node::ThematicBreak => Ok("---".to_string()),
        Node::Container {
            name,
            label,
            attributes,
            fm_attributes,
            children,
        } => render_container(name, label.as_deref(), attributes, fm_attributes, children, ctx),
        Node::Section {
            name,
            attributes,
            children,
        } => render_section(name, attributes, children, ctx),
        Node::ListItem { children } => render_blocks(children, ctx),
        inline => Ok(render_paragraph(std::slice::from_ref(inline), ctx)),
    }
}

/// Paragraph text with the block-level escape guard: any rendered line that
/// would re-classify as structure gets a leading backslash, which the line
/// classifier treats as an always-text marker.
fn render_paragraph(children: &[Node], ctx: &RenderContext) -> String {
    let text = render_inlines(children, ctx, false);
    text.split('\n')
        .map(|line| match classify_line(line) {
            LineKind::Text | LineKind::Blank => line.to_string(),
            _ => format!("\\{}", line),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_list(
    ordered: bool,
    start: u64,
    items: &[Node],
    ctx: &RenderContext,
) -> SerializeResult<String> {
    let mut out: Vec<String> = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", start + idx as u64)
        } else {
            "- ".to_string()
        };
        let pad = " ".repeat(marker.len());
        let children = match item {
            Node::ListItem { children } => children.as_slice(),
            other => std::slice::from_ref(other),
        };
        let body = render_blocks(children, ctx)?;
        for (line_idx, line) in body.split('\n').enumerate() {
            if line_idx == 0 {
                out.push(format!("{}{}", marker, line));
            } else if line.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{}{}", pad, line));
            }
        }
    }
    Ok(out.join("\n"))
}

fn render_code_block(info: &str, value: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in value.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat((longest + 1).max(3));
    if value.is_empty() {
        format!("{}{}\n{}", fence, info, fence)
    } else {
        format!("{}{}\n{}\n{}", fence, info, value, fence)
    }
}

fn render_section(
    name: &str,
    attributes: &AttributeMap,
    children: &[Node],
    ctx: &RenderContext,
) -> SerializeResult<String> {
    let marker = format!("#{}{}", name, render_attributes(attributes, ctx.preserve_order()));
    let body = render_blocks(children, ctx)?;
    if body.is_empty() {
        Ok(marker)
    } else {
        Ok(format!("{}\n{}", marker, body))
    }
}

fn render_container(
    name: &str,
    label: Option<&[Node]>,
    attributes: &AttributeMap,
    fm_attributes: &AttributeMap,
    children: &[Node],
    ctx: &RenderContext,
) -> SerializeResult<String> {
    for (key, _) in attributes.iter() {
        if fm_attributes.contains_key(key) {
            return Err(SerializeError::AttributeConflict {
                key: key.to_string(),
            });
        }
    }

    let fence = ":".repeat(2 + ctx.depth);
    let label_part = match label {
        Some(nodes) if !nodes.is_empty() => {
            format!("[{}]", render_inlines(nodes, ctx, true))
        }
        _ => String::new(),
    };
    let inline_attrs = render_attributes(attributes, ctx.preserve_order());
    let head = format!("{}{}{}{}", fence, name, label_part, inline_attrs);

    let has_sections = children.iter().any(|c| c.is_section());
    let promote = head.chars().count() > ctx.options.attributes.max_length
        || attributes.iter().any(|(_, v)| matches!(v, AttrValue::Json(_)))
        || attributes.len() > 3
        || !fm_attributes.is_empty()
        || UNSAFE_INLINE_RE.is_match(&inline_attrs)
        || has_sections;

    let (head, fm) = if promote {
        let mut merged = fm_attributes.clone();
        for (key, value) in attributes.iter() {
            merged.insert(key.to_string(), value.clone());
        }
        (format!("{}{}{}", fence, name, label_part), merged)
    } else {
        (head, fm_attributes.clone())
    };

    // Default slot first, sections after, regardless of authored order.
    let child_ctx = ctx.nested();
    let ordered_children = reorder_children(children, ctx.options);
    let content = render_blocks(&ordered_children, &child_ctx)?;

    let mapping = fm_attributes_to_mapping(&fm);
    let wrapped = if ctx.options.attributes.yaml_code_block {
        stringify_code_block_props(&mapping, &content)
    } else {
        stringify_front_matter(&mapping, &content)
    };
    let body = wrapped.trim_end();

    let mut out = head;
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
    }
    out.push('\n');
    out.push_str(&fence);

    if ctx.depth >= 1 {
        let indented: Vec<String> = out
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("  {}", line)
                }
            })
            .collect();
        out = indented.join("\n");
    }
    Ok(out)
}

/// Default-slot children before sections; with `auto_unwrap`, loose inline
/// children collapse into one inserted leading paragraph.
fn reorder_children(children: &[Node], options: &MdcOptions) -> Vec<Node> {
    let mut default_slot: Vec<Node> = Vec::new();
    let mut sections: Vec<Node> = Vec::new();
    let mut loose: Vec<Node> = Vec::new();

    for child in children {
        if child.is_section() {
            sections.push(child.clone());
        } else if options.auto_unwrap && !child.is_block() {
            loose.push(child.clone());
        } else {
            default_slot.push(child.clone());
        }
    }

    let mut out = Vec::with_capacity(children.len() + 1);
    if !loose.is_empty() {
        out.push(Node::paragraph(loose));
    }
    out.extend(default_slot);
    out.extend(sections);
    out
}

fn render_inlines(nodes: &[Node], ctx: &RenderContext, in_label: bool) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text { value } => out.push_str(&escape_text(value, in_label)),
            Node::Strong {
                children,
                attributes,
            } => {
                out.push_str("**");
                out.push_str(&render_inlines(children, ctx, in_label));
                out.push_str("**");
                out.push_str(&render_attributes(attributes, ctx.preserve_order()));
            }
            Node::Emphasis {
                children,
                attributes,
            } => {
                out.push('_');
                out.push_str(&render_inlines(children, ctx, in_label));
                out.push('_');
                out.push_str(&render_attributes(attributes, ctx.preserve_order()));
            }
            Node::InlineCode { value, attributes } => {
                out.push_str(&render_inline_code(value));
                out.push_str(&render_attributes(attributes, ctx.preserve_order()));
            }
            Node::Link {
                url,
                children,
                attributes,
            } => {
                out.push('[');
                out.push_str(&render_inlines(children, ctx, true));
                out.push_str("](");
                out.push_str(&escape_url(url));
                out.push(')');
                out.push_str(&render_attributes(attributes, ctx.preserve_order()));
            }
            Node::Span {
                name,
                label,
                attributes,
            } => out.push_str(&render_span(name, label, attributes, ctx)),
            Node::Binding {
                value,
                default_value,
            } => out.push_str(&render_binding(value, default_value.as_deref())),
            block => {
                // A block node in inline position degrades to its plain text.
                out.push_str(&escape_text(&block.plain_text(), in_label));
            }
        }
    }
    out
}

fn render_span(name: &str, label: &[Node], attributes: &AttributeMap, ctx: &RenderContext) -> String {
    let attrs = render_attributes(attributes, ctx.preserve_order());
    let label_str = render_inlines(label, ctx, true);
    if name == "span" && !attrs.is_empty() {
        return format!("[{}]{}", label_str, attrs);
    }
    let label_part = if label.is_empty() {
        String::new()
    } else {
        format!("[{}]", label_str)
    };
    format!(":{}{}{}", name, label_part, attrs)
}

fn render_binding(value: &str, default_value: Option<&str>) -> String {
    match default_value {
        Some(default) => {
            let quote = if default.contains('\'') { '"' } else { '\'' };
            format!("{{{{ {} || {}{}{} }}}}", value, quote, default, quote)
        }
        None => format!("{{{{ {} }}}}", value),
    }
}

fn render_inline_code(value: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in value.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    let pad = value.starts_with('`')
        || value.ends_with('`')
        || (value.starts_with(' ') && value.ends_with(' ') && !value.trim().is_empty());
    if pad {
        format!("{} {} {}", fence, value, fence)
    } else {
        format!("{}{}{}", fence, value, fence)
    }
}

fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for ch in url.chars() {
        if ch == ')' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape running text so it parses back to the identical string: construct
/// triggers are escaped exactly where the inline parser would fire on them.
fn escape_text(text: &str, in_label: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &ch) in chars.iter().enumerate() {
        let prev = if i == 0 { None } else { Some(chars[i - 1]) };
        let next = chars.get(i + 1).copied();
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' | '[' | '{' => {
                out.push('\\');
                out.push(ch);
            }
            ']' if in_label => out.push_str("\\]"),
            '\n' | '\r' if in_label => out.push(' '),
            '*' if next == Some('*') => out.push_str("\\*"),
            '_' if !(is_word(prev) && is_word(next)) => out.push_str("\\_"),
            ':' if starts_span(prev, next) => out.push_str("\\:"),
            _ => out.push(ch),
        }
    }
    out
}

fn starts_span(prev: Option<char>, next: Option<char>) -> bool {
    let blocked = matches!(prev, Some(p) if p.is_alphanumeric() || p == ':');
    !blocked && matches!(next, Some(n) if n.is_ascii_alphabetic())
}

fn is_word(ch: Option<char>) -> bool {
    ch.map(|c| c.is_alphanumeric()).unwrap_or(false)
}
