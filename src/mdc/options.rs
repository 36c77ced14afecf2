//! Parser and serializer configuration.

use serde::{Deserialize, Serialize};

/// Top-level options shared by parsing and serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MdcOptions {
    pub attributes: AttributeOptions,
    /// Wrap non-block container children into an inserted leading paragraph.
    pub auto_unwrap: bool,
}

impl Default for MdcOptions {
    fn default() -> Self {
        Self {
            attributes: AttributeOptions::default(),
            auto_unwrap: false,
        }
    }
}

/// Attribute rendering behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeOptions {
    /// Container head lines longer than this promote their attributes into
    /// the YAML block.
    pub max_length: usize,
    /// Emit attributes in insertion order instead of sorted by key.
    pub preserve_order: bool,
    /// Emit container YAML blocks as ```` ```yaml [props] ```` fences instead
    /// of `---` delimiters.
    pub yaml_code_block: bool,
}

impl Default for AttributeOptions {
    fn default() -> Self {
        Self {
            max_length: 80,
            preserve_order: false,
            yaml_code_block: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = MdcOptions::default();
        assert_eq!(options.attributes.max_length, 80);
        assert!(!options.attributes.preserve_order);
        assert!(!options.attributes.yaml_code_block);
        assert!(!options.auto_unwrap);
    }

    #[test]
    fn deserializes_partial_json() {
        let options: MdcOptions =
            serde_json::from_str(r#"{"attributes":{"maxLength":40},"autoUnwrap":true}"#)
                .expect("valid options");
        assert_eq!(options.attributes.max_length, 40);
        assert!(options.auto_unwrap);
        assert!(!options.attributes.preserve_order);
    }
}
