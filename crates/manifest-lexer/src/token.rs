//! Token types for the manifest lexer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Header name at the start of a line: `Bundle-SymbolicName`
    HeaderName,
    /// `:`
    Colon,
    /// The single space after a header colon, or the leading whitespace
    /// of a continuation line.
    SignificantSpace,
    /// A run of value text: `com.acme`, `1.0.0`
    HeaderValuePart,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `=`
    Equals,
    /// `"`
    Quote,
    /// Newline ending a non-empty line: `\n` or `\r\n`
    Newline,
    /// Newline of a blank line, ending a manifest section
    SectionEnd,
    /// A character the lexer could not place in its current state
    BadCharacter,
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }
}
