//! Syntax node and token kinds for the manifest CST.

use manifest_lexer::TokenKind;

/// The kind of a syntax element (node or token).
///
/// Tokens are terminal elements (leaves), while nodes are non-terminal
/// (contain children). The distinction is made by value: tokens have
/// lower values than `__LAST_TOKEN`.
///
/// The SCREAMING_CASE naming convention is used to match rowan/rust-analyzer
/// conventions for syntax kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
#[allow(clippy::manual_non_exhaustive)] // __LAST_TOKEN is used for token/node distinction
pub enum SyntaxKind {
    // ========== TOKENS (terminals) ==========
    /// Header name token: `Bundle-Version`
    HEADER_NAME = 0,
    /// `:`
    COLON,
    /// Space after the header colon, or the indent of a continuation line
    SIGNIFICANT_SPACE,
    /// Value text
    HEADER_VALUE_PART,
    /// `;`
    SEMICOLON,
    /// `,`
    COMMA,
    /// `=`
    EQUALS,
    /// `"`
    QUOTE,
    /// Newline (`\n` or `\r\n`)
    NEWLINE,
    /// Blank line ending a section
    SECTION_END,
    /// Character the lexer could not place
    BAD_CHARACTER,

    // Marker for end of tokens
    #[doc(hidden)]
    __LAST_TOKEN,

    // ========== NODES (non-terminals) ==========
    /// Root node
    FILE,
    /// `Name: clause, clause`
    HEADER,
    /// The name of a header
    NAME,
    /// One comma-separated part of a header value
    CLAUSE,
    /// A value, possibly folded over continuation lines and quoted
    HEADER_VALUE,
    /// `name=value`
    ATTRIBUTE,
    /// `name:=value`
    DIRECTIVE,
    /// Tokens that could not be parsed, or a missing element
    ERROR,
}

impl SyntaxKind {
    /// Whether this is a token (terminal) kind.
    pub fn is_token(self) -> bool {
        (self as u16) < (Self::__LAST_TOKEN as u16)
    }

    /// Whether this is a node (non-terminal) kind.
    pub fn is_node(self) -> bool {
        (self as u16) > (Self::__LAST_TOKEN as u16)
    }

    /// Whether this token only folds a line and carries no value text.
    pub fn is_fold(self) -> bool {
        matches!(self, Self::NEWLINE | Self::SIGNIFICANT_SPACE)
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::HeaderName => Self::HEADER_NAME,
            TokenKind::Colon => Self::COLON,
            TokenKind::SignificantSpace => Self::SIGNIFICANT_SPACE,
            TokenKind::HeaderValuePart => Self::HEADER_VALUE_PART,
            TokenKind::Semicolon => Self::SEMICOLON,
            TokenKind::Comma => Self::COMMA,
            TokenKind::Equals => Self::EQUALS,
            TokenKind::Quote => Self::QUOTE,
            TokenKind::Newline => Self::NEWLINE,
            TokenKind::SectionEnd => Self::SECTION_END,
            TokenKind::BadCharacter => Self::BAD_CHARACTER,
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

/// Language definition for manifests, used by rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManifestLanguage {}

impl rowan::Language for ManifestLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        Self::Kind::from_raw(raw.0).expect("invalid SyntaxKind value from rowan")
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

impl SyntaxKind {
    /// Convert from a raw u16 value to SyntaxKind.
    /// Returns None if the value is out of range or corresponds to __LAST_TOKEN.
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::HEADER_NAME),
            1 => Some(Self::COLON),
            2 => Some(Self::SIGNIFICANT_SPACE),
            3 => Some(Self::HEADER_VALUE_PART),
            4 => Some(Self::SEMICOLON),
            5 => Some(Self::COMMA),
            6 => Some(Self::EQUALS),
            7 => Some(Self::QUOTE),
            8 => Some(Self::NEWLINE),
            9 => Some(Self::SECTION_END),
            10 => Some(Self::BAD_CHARACTER),
            // 11 is __LAST_TOKEN - skip it
            12 => Some(Self::FILE),
            13 => Some(Self::HEADER),
            14 => Some(Self::NAME),
            15 => Some(Self::CLAUSE),
            16 => Some(Self::HEADER_VALUE),
            17 => Some(Self::ATTRIBUTE),
            18 => Some(Self::DIRECTIVE),
            19 => Some(Self::ERROR),
            _ => None,
        }
    }
}

/// A syntax node in the manifest CST.
pub type SyntaxNode = rowan::SyntaxNode<ManifestLanguage>;

/// A syntax token in the manifest CST.
pub type SyntaxToken = rowan::SyntaxToken<ManifestLanguage>;

/// A syntax element (either node or token) in the manifest CST.
pub type SyntaxElement = rowan::SyntaxElement<ManifestLanguage>;

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::Language;

    #[test]
    fn token_vs_node() {
        assert!(SyntaxKind::HEADER_NAME.is_token());
        assert!(SyntaxKind::BAD_CHARACTER.is_token());

        assert!(SyntaxKind::FILE.is_node());
        assert!(SyntaxKind::DIRECTIVE.is_node());
        assert!(SyntaxKind::ERROR.is_node());
    }

    #[test]
    fn raw_values_are_dense() {
        for raw in 0..=19u16 {
            match SyntaxKind::from_raw(raw) {
                Some(kind) => assert_eq!(kind as u16, raw),
                None => assert_eq!(raw, SyntaxKind::__LAST_TOKEN as u16),
            }
        }
        assert_eq!(SyntaxKind::from_raw(20), None);
    }

    #[test]
    fn token_kind_conversion() {
        assert_eq!(
            SyntaxKind::from(TokenKind::HeaderName),
            SyntaxKind::HEADER_NAME
        );
        assert_eq!(
            SyntaxKind::from(TokenKind::SectionEnd),
            SyntaxKind::SECTION_END
        );
        assert_eq!(
            SyntaxKind::from(TokenKind::BadCharacter),
            SyntaxKind::BAD_CHARACTER
        );
    }

    #[test]
    fn rowan_roundtrip() {
        let kind = SyntaxKind::CLAUSE;
        let raw = ManifestLanguage::kind_to_raw(kind);
        let back = ManifestLanguage::kind_from_raw(raw);
        assert_eq!(kind, back);
    }
}
