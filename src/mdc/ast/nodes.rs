//! Tree node types produced by parsing and consumed by the serializer.
//!
//! One enum covers block and inline variants. Parsing only ever produces
//! well-formed trees (inline nodes under paragraphs/headings/labels), but the
//! tree contract allows callers to hand the serializer mixed children; the
//! `autoUnwrap` option exists to repair exactly that.

use serde::{Deserialize, Serialize};

use super::attributes::AttributeMap;

/// A parsed MDC document: optional leading frontmatter plus block children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document-level frontmatter, order-preserving. Dotted keys are already
    /// folded into nested mappings.
    pub frontmatter: serde_yaml::Mapping,
    pub children: Vec<Node>,
}

/// A node in the MDC tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Node {
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        depth: u8,
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        start: u64,
        items: Vec<Node>,
    },
    ListItem {
        children: Vec<Node>,
    },
    CodeBlock {
        info: String,
        value: String,
    },
    ThematicBreak,

    /// Fenced block component: `::name` ... `::`.
    Container {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<Vec<Node>>,
        attributes: AttributeMap,
        fm_attributes: AttributeMap,
        children: Vec<Node>,
    },
    /// Named slot inside a container: `#name` line. Never nested in another
    /// section.
    Section {
        name: String,
        attributes: AttributeMap,
        children: Vec<Node>,
    },

    /// Inline component: `:name[label]{attrs}`. The `span` name is the
    /// bracket shorthand `[label]{attrs}`.
    Span {
        name: String,
        label: Vec<Node>,
        attributes: AttributeMap,
    },
    /// Inline variable binding: `{{ expr }}` with optional `|| 'fallback'`.
    Binding {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<String>,
    },

    Text {
        value: String,
    },
    Strong {
        children: Vec<Node>,
        attributes: AttributeMap,
    },
    Emphasis {
        children: Vec<Node>,
        attributes: AttributeMap,
    },
    InlineCode {
        value: String,
        attributes: AttributeMap,
    },
    Link {
        url: String,
        children: Vec<Node>,
        attributes: AttributeMap,
    },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text { value: value.into() }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { children }
    }

    /// A container with no label or attributes.
    pub fn container(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Container {
            name: name.into(),
            label: None,
            attributes: AttributeMap::new(),
            fm_attributes: AttributeMap::new(),
            children,
        }
    }

    /// Returns `true` for block-level variants.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Node::Paragraph { .. }
                | Node::Heading { .. }
                | Node::List { .. }
                | Node::ListItem { .. }
                | Node::CodeBlock { .. }
                | Node::ThematicBreak
                | Node::Container { .. }
                | Node::Section { .. }
        )
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Node::Section { .. })
    }

    /// Concatenated plain text of this node and its descendants. Used by the
    /// serializer when a block node appears in inline position.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Text { value } | Node::InlineCode { value, .. } => value.clone(),
            Node::CodeBlock { value, .. } => value.clone(),
            Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::ListItem { children }
            | Node::Strong { children, .. }
            | Node::Emphasis { children, .. }
            | Node::Link { children, .. }
            | Node::Section { children, .. }
            | Node::Container { children, .. } => {
                children.iter().map(Node::plain_text).collect()
            }
            Node::Span { label, .. } => label.iter().map(Node::plain_text).collect(),
            Node::List { items, .. } => items.iter().map(Node::plain_text).collect(),
            Node::Binding { value, .. } => value.clone(),
            Node::ThematicBreak => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_tags_variants_by_type() {
        let node = Node::text("hello");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["value"], "hello");
    }

    #[test]
    fn plain_text_recurses() {
        let node = Node::paragraph(vec![
            Node::text("a "),
            Node::Strong {
                children: vec![Node::text("b")],
                attributes: AttributeMap::new(),
            },
        ]);
        assert_eq!(node.plain_text(), "a b");
    }
}
