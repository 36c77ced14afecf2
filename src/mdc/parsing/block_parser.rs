//! Block parser.
//!
//! Recursive descent over classified lines. Containers are consumed
//! atomically (open fence to matching close), so section markers and fences
//! inside a nested container never leak into the enclosing region. All
//! recognition failures degrade to plain text; this parser never errors.

use crate::mdc::ast::{AttributeMap, Node};
use crate::mdc::attributes::{parse_attribute_block, parse_attribute_block_chars};
use crate::mdc::frontmatter::{is_props_info, parse_yaml_block};
use crate::mdc::inlines::parse_inlines;
use crate::mdc::inlines::parser::scan_bracket_label;
use crate::mdc::lexing::{Line, LineKind};
use crate::mdc::options::MdcOptions;

/// Parse a region of classified lines into block nodes.
pub fn parse_blocks(lines: &[Line], options: &MdcOptions) -> Vec<Node> {
    parse_region(lines, options, false)
}

/// Region parser. With `allow_sections` set (container bodies), `#name`
/// marker lines split the region: blocks before the first marker form the
/// default slot, blocks after each marker attach to that section.
fn parse_region(lines: &[Line], options: &MdcOptions, allow_sections: bool) -> Vec<Node> {
    let mut default_slot: Vec<Node> = Vec::new();
    let mut sections: Vec<Node> = Vec::new();

    let mut push = |node: Node, sections: &mut Vec<Node>, default_slot: &mut Vec<Node>| {
        if let Some(Node::Section { children, .. }) = sections.last_mut() {
            children.push(node);
        } else {
            default_slot.push(node);
        }
    };

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        match &line.kind {
            LineKind::Blank => {
                i += 1;
            }
            LineKind::FenceOpen { .. } => {
                if let Some((node, next)) = parse_container(lines, i, options) {
                    push(node, &mut sections, &mut default_slot);
                    i = next;
                } else {
                    let (node, next) = parse_paragraph(lines, i);
                    push(node, &mut sections, &mut default_slot);
                    i = next;
                }
            }
            LineKind::Section { name, rest } if allow_sections => {
                match parse_section_marker(name, rest) {
                    Some(node) => {
                        sections.push(node);
                        i += 1;
                    }
                    None => {
                        let (node, next) = parse_paragraph(lines, i);
                        push(node, &mut sections, &mut default_slot);
                        i = next;
                    }
                }
            }
            LineKind::ListItem { ordered, .. } => {
                let ordered = *ordered;
                let (node, next) = parse_list(lines, i, ordered, options);
                push(node, &mut sections, &mut default_slot);
                i = next;
            }
            LineKind::Heading { depth } => {
                let content = line.text[*depth as usize..].trim();
                push(
                    Node::Heading {
                        depth: *depth,
                        children: parse_inlines(content),
                    },
                    &mut sections,
                    &mut default_slot,
                );
                i += 1;
            }
            LineKind::CodeFence { len, info } => {
                let (node, next) = parse_code_block(lines, i, *len, info);
                push(node, &mut sections, &mut default_slot);
                i = next;
            }
            LineKind::YamlFence => {
                push(Node::ThematicBreak, &mut sections, &mut default_slot);
                i += 1;
            }
            LineKind::FenceClose { .. } => {
                // A stray close fence with no open container is plain text.
                let (node, next) = parse_paragraph(lines, i);
                push(node, &mut sections, &mut default_slot);
                i = next;
            }
            LineKind::Section { .. } | LineKind::Text => {
                let (node, next) = parse_paragraph(lines, i);
                push(node, &mut sections, &mut default_slot);
                i = next;
            }
        }
    }

    default_slot.extend(sections);
    default_slot
}

/// `#name{attrs}` marker. Malformed or trailing payload degrades the line to
/// paragraph text.
fn parse_section_marker(name: &str, rest: &str) -> Option<Node> {
    let rest = rest.trim_end();
    let attributes = if rest.is_empty() {
        AttributeMap::new()
    } else {
        let (attrs, consumed) = parse_attribute_block(rest)?;
        if !rest[consumed..].trim().is_empty() {
            return None;
        }
        attrs
    };
    Some(Node::Section {
        name: name.to_string(),
        attributes,
        children: Vec::new(),
    })
}

fn parse_container(lines: &[Line], start: usize, options: &MdcOptions) -> Option<(Node, usize)> {
    let open = &lines[start];
    let (open_len, name, rest) = match &open.kind {
        LineKind::FenceOpen { len, name, rest } => (*len, name.clone(), rest.clone()),
        _ => return None,
    };
    let (label, attributes) = parse_fence_head(&rest)?;

    let (body_end, next) = match find_container_close(lines, start, open_len) {
        Some(close_idx) => (close_idx, close_idx + 1),
        None if open_len == 2 && start + 1 < lines.len() => {
            // A minimal-length fence with no close anywhere ahead is the
            // single-line sugar form. At end of input it is equivalent to a
            // force-closed empty container either way.
            (start + 1, start + 1)
        }
        None => (lines.len(), lines.len()),
    };

    let body: Vec<Line> = lines[start + 1..body_end]
        .iter()
        .map(|l| l.shifted(open.indent))
        .collect();
    let (mut fm_attributes, children) = parse_container_body(&body, options);

    // A key written both inline and in the YAML block resolves to the inline
    // value; the two maps stay disjoint.
    for (key, _) in attributes.iter() {
        fm_attributes.remove(key);
    }

    Some((
        Node::Container {
            name,
            label,
            attributes,
            fm_attributes,
            children,
        },
        next,
    ))
}

/// Locate the close fence matching the open at `start`. Inner opens push
/// their lengths; a close line pops the innermost open it can satisfy. Code
/// fences shield their contents.
fn find_container_close(lines: &[Line], start: usize, open_len: usize) -> Option<usize> {
    let mut inner: Vec<usize> = Vec::new();
    let mut code_fence: Option<usize> = None;

    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        match &line.kind {
            LineKind::CodeFence { len, info } => match code_fence {
                Some(open) if *len >= open && info.is_empty() => code_fence = None,
                Some(_) => {}
                None => code_fence = Some(*len),
            },
            _ if code_fence.is_some() => {}
            LineKind::FenceOpen { len, .. } => inner.push(*len),
            LineKind::FenceClose { len } => match inner.last() {
                Some(&top) if *len >= top => {
                    inner.pop();
                }
                Some(_) => {}
                None if *len >= open_len => return Some(j),
                None => {}
            },
            _ => {}
        }
    }
    None
}

/// Head payload after `::name`: optional `[label]`, optional `{attrs}`,
/// nothing else. Any other trailing content fails the whole head and the
/// caller falls back to paragraph text.
fn parse_fence_head(rest: &str) -> Option<(Option<Vec<Node>>, AttributeMap)> {
    let chars: Vec<char> = rest.chars().collect();
    let mut i = 0;

    let mut label = None;
    if chars.first() == Some(&'[') {
        let (raw, consumed) = scan_bracket_label(&chars, 0)?;
        label = Some(parse_inlines(&raw));
        i += consumed;
    }

    let mut attributes = AttributeMap::new();
    if chars.get(i) == Some(&'{') {
        let (attrs, consumed) = parse_attribute_block_chars(&chars[i..])?;
        attributes = attrs;
        i += consumed;
    }

    let trailing: String = chars[i..].iter().collect();
    if !trailing.trim().is_empty() {
        return None;
    }
    Some((label, attributes))
}

/// Container body: optional leading YAML attribute block, then the region
/// with section markers enabled.
fn parse_container_body(body: &[Line], options: &MdcOptions) -> (AttributeMap, Vec<Node>) {
    let mut start = 0;
    while start < body.len() && body[start].is_blank() {
        start += 1;
    }

    if let Some((fm, consumed)) = parse_body_yaml(body, start) {
        let children = parse_region(&body[consumed..], options, true);
        return (fm, children);
    }

    (AttributeMap::new(), parse_region(&body[start..], options, true))
}

/// Leading `---` … `---` or ```` ```yaml [props] ```` … ``` ``` ```` block.
/// `None` when absent or when the payload is not valid YAML; the lines then
/// parse as ordinary content.
fn parse_body_yaml(body: &[Line], start: usize) -> Option<(AttributeMap, usize)> {
    let first = body.get(start)?;
    let end = match &first.kind {
        LineKind::YamlFence => body
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, l)| matches!(l.kind, LineKind::YamlFence))
            .map(|(j, _)| j)?,
        LineKind::CodeFence { len, info } if is_props_info(info) => {
            let open_len = *len;
            body.iter()
                .enumerate()
                .skip(start + 1)
                .find(|(_, l)| {
                    matches!(&l.kind, LineKind::CodeFence { len, info } if *len >= open_len && info.is_empty())
                })
                .map(|(j, _)| j)?
        }
        _ => return None,
    };

    let payload: Vec<String> = body[start + 1..end]
        .iter()
        .map(|l| l.raw_from(first.indent))
        .collect();
    let fm = parse_yaml_block(&payload.join("\n"))?;
    Some((fm, end + 1))
}

fn parse_code_block(lines: &[Line], start: usize, open_len: usize, info: &str) -> (Node, usize) {
    let base = lines[start].indent;
    let mut end = lines.len();
    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        if let LineKind::CodeFence { len, info } = &line.kind {
            if *len >= open_len && info.is_empty() {
                end = j;
                break;
            }
        }
    }
    let value: Vec<String> = lines[start + 1..end.min(lines.len())]
        .iter()
        .map(|l| l.raw_from(base))
        .collect();
    let next = if end < lines.len() { end + 1 } else { end };
    (
        Node::CodeBlock {
            info: info.to_string(),
            value: value.join("\n"),
        },
        next,
    )
}

fn parse_list(lines: &[Line], start: usize, ordered: bool, options: &MdcOptions) -> (Node, usize) {
    let marker_indent = lines[start].indent;
    let mut items: Vec<Node> = Vec::new();
    let mut list_start: u64 = 1;

    let mut i = start;
    while i < lines.len() {
        let line = &lines[i];
        let content_offset = match &line.kind {
            LineKind::ListItem {
                ordered: o,
                number,
                content_offset,
            } if *o == ordered && line.indent == marker_indent => {
                if items.is_empty() && ordered {
                    list_start = *number;
                }
                *content_offset
            }
            _ => break,
        };

        let content_col = marker_indent + content_offset;
        let mut item_lines: Vec<Line> = vec![Line {
            indent: 0,
            text: line.text[content_offset.min(line.text.len())..].to_string(),
            kind: crate::mdc::lexing::classify_line(
                &line.text[content_offset.min(line.text.len())..],
            ),
        }];

        // Continuation scan. Blank lines and dedented lines stay in the item
        // while a container opened inside the item is still open (force
        // continuation); otherwise a line continues the item only when it is
        // indented to the item's content column.
        let mut fences: Vec<usize> = Vec::new();
        track_fences(&mut fences, &item_lines[0].kind);
        let mut j = i + 1;
        while j < lines.len() {
            let cont = &lines[j];
            let include = if fences.is_empty() {
                if cont.is_blank() {
                    // Look ahead past the blank run.
                    lines[j..]
                        .iter()
                        .find(|l| !l.is_blank())
                        .map(|l| l.indent >= content_col)
                        .unwrap_or(false)
                } else {
                    cont.indent >= content_col
                }
            } else {
                true
            };
            if !include {
                break;
            }
            let shifted = cont.shifted(content_col);
            track_fences(&mut fences, &shifted.kind);
            item_lines.push(shifted);
            j += 1;
        }

        while item_lines.last().map(|l| l.is_blank()).unwrap_or(false) {
            item_lines.pop();
        }
        items.push(Node::ListItem {
            children: parse_region(&item_lines, options, false),
        });

        // Skip blank gap between items.
        i = j;
        while i < lines.len() && lines[i].is_blank() {
            i += 1;
        }
        if !matches!(
            lines.get(i).map(|l| &l.kind),
            Some(LineKind::ListItem { ordered: o, .. }) if *o == ordered
        ) {
            break;
        }
        if lines[i].indent != marker_indent {
            break;
        }
    }

    (
        Node::List {
            ordered,
            start: list_start,
            items,
        },
        i,
    )
}

fn track_fences(fences: &mut Vec<usize>, kind: &LineKind) {
    match kind {
        LineKind::FenceOpen { len, .. } => fences.push(*len),
        LineKind::FenceClose { len } => {
            if matches!(fences.last(), Some(&top) if *len >= top) {
                fences.pop();
            }
        }
        _ => {}
    }
}

/// Paragraph: the current line plus following plain-text lines (lazy
/// continuation), joined with newlines and inline-parsed.
fn parse_paragraph(lines: &[Line], start: usize) -> (Node, usize) {
    let mut text = vec![lines[start].text.clone()];
    let mut i = start + 1;
    while i < lines.len() {
        match &lines[i].kind {
            LineKind::Text => {
                text.push(lines[i].text.clone());
                i += 1;
            }
            _ => break,
        }
    }
    (Node::paragraph(parse_inlines(&text.join("\n"))), i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdc::ast::AttrValue;
    use crate::mdc::lexing::build_lines;

    fn parse(source: &str) -> Vec<Node> {
        parse_blocks(&build_lines(source), &MdcOptions::default())
    }

    fn only_container(nodes: &[Node]) -> (&str, &AttributeMap, &AttributeMap, &[Node]) {
        match &nodes[0] {
            Node::Container {
                name,
                attributes,
                fm_attributes,
                children,
                ..
            } => (name, attributes, fm_attributes, children),
            other => panic!("expected container, got {:?}", other),
        }
    }

    #[test]
    fn parses_basic_container() {
        let nodes = parse("::alert{type=\"warning\"}\nBe careful!\n::");
        let (name, attrs, _, children) = only_container(&nodes);
        assert_eq!(name, "alert");
        assert_eq!(attrs.get("type"), Some(&AttrValue::String("warning".into())));
        assert_eq!(children.len(), 1);
        assert!(matches!(&children[0], Node::Paragraph { .. }));
    }

    #[test]
    fn nested_containers_resolve_by_fence_length() {
        let nodes = parse("::outer\n  :::inner\n  content\n  :::\n::");
        let (_, _, _, outer_children) = only_container(&nodes);
        match &outer_children[0] {
            Node::Container { name, children, .. } => {
                assert_eq!(name, "inner");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected inner container, got {:?}", other),
        }
    }

    #[test]
    fn sugar_container_is_single_line() {
        let nodes = parse("::br\n\nAfter.");
        assert_eq!(nodes.len(), 2);
        let (name, _, _, children) = only_container(&nodes);
        assert_eq!(name, "br");
        assert!(children.is_empty());
        assert!(matches!(&nodes[1], Node::Paragraph { .. }));
    }

    #[test]
    fn unclosed_long_fence_force_closes_at_end() {
        let nodes = parse(":::alert\nstill inside\n\nalso inside");
        assert_eq!(nodes.len(), 1);
        let (_, _, _, children) = only_container(&nodes);
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn malformed_head_degrades_to_paragraph() {
        let nodes = parse("::alert{unterminated\nbody\n::");
        assert!(matches!(&nodes[0], Node::Paragraph { .. }));
    }

    #[test]
    fn container_yaml_block_becomes_fm_attributes() {
        let nodes = parse("::card\n---\ntitle: Hello\ncount: 2\n---\nBody.\n::");
        let (_, _, fm, children) = only_container(&nodes);
        assert_eq!(fm.get("title"), Some(&AttrValue::String("Hello".into())));
        assert_eq!(
            fm.get("count"),
            Some(&AttrValue::Json(serde_json::json!(2)))
        );
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn inline_attribute_wins_over_yaml_duplicate() {
        let nodes = parse("::card{title=\"a\"}\n---\ntitle: b\nkind: note\n---\nBody\n::");
        let (_, attrs, fm, _) = only_container(&nodes);
        assert_eq!(attrs.get("title"), Some(&AttrValue::String("a".into())));
        assert!(!fm.contains_key("title"));
        assert_eq!(fm.get("kind"), Some(&AttrValue::String("note".into())));
    }

    #[test]
    fn props_code_block_becomes_fm_attributes() {
        let nodes = parse("::card\n```yaml [props]\ntitle: Hello\n```\nBody.\n::");
        let (_, _, fm, children) = only_container(&nodes);
        assert_eq!(fm.get("title"), Some(&AttrValue::String("Hello".into())));
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn sections_split_container_body() {
        let nodes = parse("::hero\nDefault slot.\n#title\nThe title\n#footer\nFine print\n::");
        let (_, _, _, children) = only_container(&nodes);
        assert_eq!(children.len(), 3);
        assert!(matches!(&children[0], Node::Paragraph { .. }));
        assert!(matches!(&children[1], Node::Section { name, .. } if name == "title"));
        assert!(matches!(&children[2], Node::Section { name, .. } if name == "footer"));
    }

    #[test]
    fn section_markers_outside_containers_are_text() {
        let nodes = parse("#not-a-section here");
        assert!(matches!(&nodes[0], Node::Paragraph { .. }));
    }

    #[test]
    fn container_at_item_content_column_stays_in_list() {
        let nodes = parse("- item\n  ::box\n  inner\n  ::\n- second");
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::List { items, .. } => {
                assert_eq!(items.len(), 2);
                match &items[0] {
                    Node::ListItem { children } => {
                        assert_eq!(children.len(), 2);
                        assert!(matches!(&children[1], Node::Container { name, .. } if name == "box"));
                    }
                    other => panic!("expected list item, got {:?}", other),
                }
            }
            other => panic!("expected a single list, got {:?}", other),
        }
    }

    #[test]
    fn blank_line_inside_open_container_keeps_item_alive() {
        let nodes = parse("- item\n  :::box\n\n  inner\n  :::\n- second");
        match &nodes[0] {
            Node::List { items, .. } => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn ordered_list_keeps_start() {
        let nodes = parse("3. three\n4. four");
        match &nodes[0] {
            Node::List { ordered, start, items } => {
                assert!(*ordered);
                assert_eq!(*start, 3);
                assert_eq!(items.len(), 2);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn code_fences_shield_fence_lines() {
        let nodes = parse("::demo\n```\n::\nnot a close\n```\n::");
        let (_, _, _, children) = only_container(&nodes);
        match &children[0] {
            Node::CodeBlock { value, .. } => {
                assert_eq!(value, "::\nnot a close");
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn heading_and_thematic_break() {
        let nodes = parse("# Title\n\n---\n\ntail");
        assert!(matches!(&nodes[0], Node::Heading { depth: 1, .. }));
        assert!(matches!(&nodes[1], Node::ThematicBreak));
        assert!(matches!(&nodes[2], Node::Paragraph { .. }));
    }

    #[test]
    fn container_with_label() {
        let nodes = parse("::alert[Heads up]{type=\"info\"}\nBody\n::");
        match &nodes[0] {
            Node::Container { label, .. } => {
                assert_eq!(label.as_deref(), Some(&[Node::text("Heads up")][..]));
            }
            other => panic!("expected container, got {:?}", other),
        }
    }
}
