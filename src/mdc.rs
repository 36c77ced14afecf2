//! MDC syntax: parsing and serialization.
//!
//! MDC layers component syntax over markdown: fenced block containers
//! (`::name` … `::`), inline spans (`:name[label]{attrs}`), variable
//! bindings (`{{ expr }}`), and YAML attribute blocks. Parsing is total;
//! every malformed construct degrades to plain text. Serialization is
//! canonical, so one parse/serialize cycle normalizes a document and further
//! cycles are identity.

pub mod ast;
pub mod attributes;
pub mod frontmatter;
pub mod inlines;
pub mod lexing;
pub mod options;
pub mod parsing;
pub mod serialize;

use ast::Document;
use options::MdcOptions;

/// Parse a full document: leading frontmatter, then the block structure.
/// Never fails; unrecognizable input comes back as paragraph text.
pub fn parse_document(source: &str, options: &MdcOptions) -> Document {
    let (rest, front) = frontmatter::parse_front_matter(source);
    let lines = lexing::build_lines(&rest);
    Document {
        frontmatter: front,
        children: parsing::parse_blocks(&lines, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::Node;

    #[test]
    fn parses_frontmatter_and_body() {
        let doc = parse_document("---\ntitle: Hi\n---\n\nHello.", &MdcOptions::default());
        assert_eq!(doc.frontmatter.len(), 1);
        assert_eq!(doc.children.len(), 1);
        assert!(matches!(&doc.children[0], Node::Paragraph { .. }));
    }

    #[test]
    fn empty_input_is_empty_document() {
        let doc = parse_document("", &MdcOptions::default());
        assert!(doc.frontmatter.is_empty());
        assert!(doc.children.is_empty());
    }
}
