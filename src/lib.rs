//! # mdc-parser
//!
//! Parser and serializer for the MDC component syntax: markdown extended
//! with fenced block containers, inline component spans, variable bindings,
//! and YAML attribute blocks.
//!
//! Parsing is total: malformed syntax degrades to plain text instead of
//! erroring. Serialization produces a canonical form; re-parsing and
//! re-serializing canonical output is the identity.

pub mod mdc;

pub use mdc::ast::{AttrValue, AttributeMap, Document, Node, SerializeError};
pub use mdc::frontmatter::{parse_front_matter, stringify_front_matter, stringify_yaml};
pub use mdc::options::{AttributeOptions, MdcOptions};
pub use mdc::parse_document;
pub use mdc::serialize::serialize_document;
