//! Lexer
//!
//! The block direction is line-oriented: the source is split into lines, each
//! line is tokenized with a small logos alphabet, and the token prefix
//! determines the line's structural classification. The parser then works on
//! classified lines and re-uses the classification when it recurses into
//! indented regions (only the indentation column shifts, never the text).

pub mod line_classification;
pub mod line_tokens;

pub use line_classification::{build_lines, classify_line, Line, LineKind, NAME_RE};
pub use line_tokens::{tokenize_line, RawToken};
