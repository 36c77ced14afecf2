//! Error types for serialization
//!
//! Parsing is total and never surfaces an error; the only fatal condition in
//! this crate is a caller-supplied tree that violates the serializer's input
//! contract.

use std::fmt;

/// Errors raised while serializing a tree back to text.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// The same key is present in both `attributes` and `fm_attributes` of a
    /// container. The two maps must be disjoint; overlapping keys mean the
    /// caller built an inconsistent tree.
    AttributeConflict { key: String },
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeError::AttributeConflict { key } => {
                write!(
                    f,
                    "attribute key {:?} is present in both attributes and fm_attributes",
                    key
                )
            }
        }
    }
}

impl std::error::Error for SerializeError {}

/// Result alias for serializer entry points.
pub type SerializeResult<T> = Result<T, SerializeError>;
