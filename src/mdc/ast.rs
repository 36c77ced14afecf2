//! AST types for MDC documents

pub mod attributes;
pub mod error;
pub mod nodes;

pub use attributes::{AttrValue, AttributeMap};
pub use error::{SerializeError, SerializeResult};
pub use nodes::{Document, Node};
