//! Raw token alphabet for line classification
//!
//! The tokens are defined using the logos derive macro. Classification only
//! ever inspects the leading tokens of a line; everything past the structural
//! prefix is treated as raw payload text.

use logos::Logos;

/// Tokens recognized inside a single line (line endings are stripped before
/// tokenization).
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum RawToken {
    /// Run of one or more colons. A run of length >= 2 is a fence candidate.
    #[regex(r":+")]
    ColonRun,

    /// Run of dashes: list marker (length 1) or YAML fence / thematic break.
    #[regex(r"-+")]
    DashRun,

    /// Run of hashes: heading marker or section slot marker.
    #[regex(r"#+")]
    HashRun,

    /// Run of backticks: code fence candidate at length >= 3.
    #[regex(r"`+")]
    BacktickRun,

    /// Digit run, for ordered list markers.
    #[regex(r"[0-9]+")]
    Number,

    /// Spaces and tabs.
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Catch-all for everything else.
    #[regex(r"[^ \t:\-#`0-9]+")]
    Text,
}

/// Tokenize a single line with byte spans.
pub fn tokenize_line(line: &str) -> Vec<(RawToken, logos::Span)> {
    let mut lexer = RawToken::lexer(line);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        if let Ok(token) = result {
            tokens.push((token, lexer.span()));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_fence_line() {
        let tokens = tokenize_line("::alert{type=\"warning\"}");
        assert_eq!(tokens[0].0, RawToken::ColonRun);
        assert_eq!(tokens[0].1, 0..2);
        assert_eq!(tokens[1].0, RawToken::Text);
    }

    #[test]
    fn tokenizes_list_marker() {
        let tokens = tokenize_line("- item 1");
        assert_eq!(tokens[0].0, RawToken::DashRun);
        assert_eq!(tokens[1].0, RawToken::Whitespace);
        assert_eq!(tokens[2].0, RawToken::Text);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(tokenize_line("").is_empty());
    }
}
