//! Typed AST wrappers over CST nodes.
//!
//! These provide a more ergonomic API for navigating the syntax tree
//! while still preserving access to the underlying CST for source locations.

use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Trait for AST nodes that wrap CST nodes.
pub trait AstNode: Sized {
    /// Try to cast a syntax node to this AST type.
    fn cast(node: SyntaxNode) -> Option<Self>;

    /// Get the underlying syntax node.
    fn syntax(&self) -> &SyntaxNode;

    /// Get the source text of this node.
    fn text(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Owned(self.syntax().to_string())
    }
}

/// Macro for defining simple AST node wrappers.
macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                if node.kind() == $kind {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(
    /// The root node of a manifest.
    ManifestFile,
    SyntaxKind::FILE
);

ast_node!(
    /// A header: `Name: clause, clause`.
    Header,
    SyntaxKind::HEADER
);

ast_node!(
    /// One comma-separated part of a header value.
    Clause,
    SyntaxKind::CLAUSE
);

ast_node!(
    /// A value, possibly quoted and folded over continuation lines.
    HeaderValue,
    SyntaxKind::HEADER_VALUE
);

ast_node!(
    /// `name=value`.
    Attribute,
    SyntaxKind::ATTRIBUTE
);

ast_node!(
    /// `name:=value`, or the legacy `name:value`.
    Directive,
    SyntaxKind::DIRECTIVE
);

ast_node!(
    /// Tokens the parser could not place, or a missing element.
    ErrorNode,
    SyntaxKind::ERROR
);

/// Text of the tokens under `node`, with continuation lines joined.
fn unfolded_tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|t| !t.kind().is_fold())
}

// === ManifestFile ===

impl ManifestFile {
    /// Iterate over the headers of every section.
    pub fn headers(&self) -> impl Iterator<Item = Header> {
        self.0.children().filter_map(Header::cast)
    }

    /// Headers grouped into sections. The first section holds the main
    /// attributes; blank lines start new ones.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current = Vec::new();
        for child in self.0.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Token(token) if token.kind() == SyntaxKind::SECTION_END => {
                    if !current.is_empty() {
                        sections.push(Section {
                            headers: std::mem::take(&mut current),
                        });
                    }
                }
                rowan::NodeOrToken::Node(node) => {
                    if let Some(header) = Header::cast(node) {
                        current.push(header);
                    }
                }
                rowan::NodeOrToken::Token(_) => {}
            }
        }
        if !current.is_empty() {
            sections.push(Section { headers: current });
        }
        sections
    }

    /// Find a main-section header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<Header> {
        let mut in_section = false;
        for child in self.0.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Token(token) if token.kind() == SyntaxKind::SECTION_END => {
                    if in_section {
                        return None;
                    }
                }
                rowan::NodeOrToken::Node(node) => {
                    if let Some(header) = Header::cast(node) {
                        if header.is_named(name) {
                            return Some(header);
                        }
                        in_section = true;
                    }
                }
                rowan::NodeOrToken::Token(_) => {}
            }
        }
        None
    }

    /// Iterate over every error node in the tree.
    pub fn error_nodes(&self) -> impl Iterator<Item = ErrorNode> {
        self.0.descendants().filter_map(ErrorNode::cast)
    }
}

// === Section ===

/// Headers between two blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    headers: Vec<Header>,
}

impl Section {
    /// The headers of this section, in order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Find a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<Header> {
        self.headers.iter().find(|h| h.is_named(name)).cloned()
    }

    /// Value of the `Name` header that names a per-entry section.
    pub fn name(&self) -> Option<String> {
        self.header("Name").map(|h| h.value_text().trim().to_string())
    }
}

// === Header ===

impl Header {
    /// The header name token, also when the name is missing its `:`.
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.0
            .first_child()?
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .find(|t| t.kind() == SyntaxKind::HEADER_NAME)
    }

    /// Get the header name.
    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().to_string())
    }

    fn is_named(&self, name: &str) -> bool {
        self.name_token()
            .is_some_and(|t| t.text().eq_ignore_ascii_case(name))
    }

    /// Iterate over the comma-separated clauses.
    pub fn clauses(&self) -> impl Iterator<Item = Clause> {
        self.0.children().filter_map(Clause::cast)
    }

    /// Everything after `Name: `, with continuation lines joined.
    pub fn value_text(&self) -> String {
        self.0
            .descendants_with_tokens()
            .filter_map(|el| el.into_token())
            .skip_while(|t| {
                !(t.kind() == SyntaxKind::COLON && t.parent().as_ref() == Some(&self.0))
            })
            .skip(1)
            .filter(|t| !t.kind().is_fold())
            .map(|t| t.text().to_string())
            .collect()
    }
}

// === Clause ===

impl Clause {
    /// Bare values of this clause, such as package names.
    pub fn values(&self) -> impl Iterator<Item = HeaderValue> {
        self.0.children().filter_map(HeaderValue::cast)
    }

    /// Iterate over `name=value` parameters.
    pub fn attributes(&self) -> impl Iterator<Item = Attribute> {
        self.0.children().filter_map(Attribute::cast)
    }

    /// Iterate over `name:=value` parameters.
    pub fn directives(&self) -> impl Iterator<Item = Directive> {
        self.0.children().filter_map(Directive::cast)
    }

    /// Find an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        self.attributes().find(|a| a.name() == name)
    }

    /// Find a directive by name.
    pub fn directive(&self, name: &str) -> Option<Directive> {
        self.directives().find(|d| d.name() == name)
    }
}

// === HeaderValue ===

impl HeaderValue {
    /// The value with continuation lines joined, outer whitespace trimmed
    /// and quotes removed.
    pub fn text(&self) -> String {
        let mut bare = String::new();
        let mut quoted = String::new();
        let mut in_quotes = false;
        let mut has_quotes = false;

        for token in unfolded_tokens(&self.0) {
            match token.kind() {
                SyntaxKind::QUOTE => {
                    in_quotes = !in_quotes;
                    has_quotes = true;
                }
                _ if in_quotes => quoted.push_str(token.text()),
                _ => bare.push_str(token.text()),
            }
        }

        if has_quotes {
            quoted
        } else {
            bare.trim().to_string()
        }
    }

    /// The value with continuation lines joined, exactly as written
    /// otherwise.
    pub fn unwrapped_text(&self) -> String {
        unfolded_tokens(&self.0)
            .map(|t| t.text().to_string())
            .collect()
    }

    /// Whether the value has any quoted part.
    pub fn is_quoted(&self) -> bool {
        self.0
            .children_with_tokens()
            .any(|el| el.kind() == SyntaxKind::QUOTE)
    }
}

/// The value after the assignment operator of an attribute or directive.
fn assigned_value(node: &SyntaxNode) -> Option<HeaderValue> {
    node.children_with_tokens()
        .skip_while(|el| !matches!(el.kind(), SyntaxKind::EQUALS | SyntaxKind::COLON))
        .filter_map(|el| el.into_node())
        .find_map(HeaderValue::cast)
}

// === Attribute ===

impl Attribute {
    /// The attribute name.
    pub fn name(&self) -> String {
        self.0
            .children()
            .find_map(HeaderValue::cast)
            .map(|v| v.text())
            .unwrap_or_default()
    }

    /// The value node, empty for `name=`.
    pub fn value(&self) -> Option<HeaderValue> {
        assigned_value(&self.0)
    }

    /// The value text, unquoted.
    pub fn value_text(&self) -> String {
        self.value().map(|v| v.text()).unwrap_or_default()
    }
}

// === Directive ===

impl Directive {
    /// The directive name.
    pub fn name(&self) -> String {
        self.0
            .children()
            .find_map(HeaderValue::cast)
            .map(|v| v.text())
            .unwrap_or_default()
    }

    /// The value node, empty for `name:=`.
    pub fn value(&self) -> Option<HeaderValue> {
        assigned_value(&self.0)
    }

    /// The value text, unquoted.
    pub fn value_text(&self) -> String {
        self.value().map(|v| v.text()).unwrap_or_default()
    }

    /// Whether this directive uses the pre-OSGi-R4 `name:value` form.
    pub fn is_legacy(&self) -> bool {
        !self
            .0
            .children_with_tokens()
            .any(|el| el.kind() == SyntaxKind::EQUALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParseOptions, parse, parse_with_options};

    fn parse_file(source: &str) -> ManifestFile {
        ManifestFile::cast(parse(source).syntax()).unwrap()
    }

    #[test]
    fn test_headers() {
        let file = parse_file("Manifest-Version: 1.0\nBundle-Name: Demo\n");
        let names: Vec<_> = file.headers().filter_map(|h| h.name()).collect();
        assert_eq!(names, vec!["Manifest-Version", "Bundle-Name"]);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let file = parse_file("Bundle-Name: Demo\n");
        let header = file.header("bundle-name").unwrap();
        assert_eq!(header.value_text(), "Demo");
        assert!(file.header("Bundle-Vendor").is_none());
    }

    #[test]
    fn test_sections() {
        let file = parse_file(
            "Manifest-Version: 1.0\n\nName: com/acme/A.class\nDigest: abc\n\n\nName: b\n",
        );
        let sections = file.sections();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].name(), None);
        assert_eq!(sections[1].name().as_deref(), Some("com/acme/A.class"));
        assert_eq!(sections[1].headers().len(), 2);
        assert_eq!(sections[2].name().as_deref(), Some("b"));

        assert!(file.header("Digest").is_none());
        assert!(file.header("Name").is_none());
    }

    #[test]
    fn test_header_lookup_skips_leading_blank_lines() {
        let file = parse_file("\n\nBundle-Name: Demo\nBundle-Version: 1.0\n\nName: x\n");
        assert_eq!(file.header("Bundle-Version").unwrap().value_text(), "1.0");
        assert!(file.header("Name").is_none());
        assert_eq!(file.sections()[1].header("name").unwrap().value_text(), "x");
    }

    #[test]
    fn test_clause_parts() {
        let file = parse_file(
            "Import-Package: com.acme;com.acme.util;version=\"[1.0,2.0)\";resolution:=optional\n",
        );
        let header = file.header("Import-Package").unwrap();
        let clauses: Vec<_> = header.clauses().collect();
        assert_eq!(clauses.len(), 1);

        let clause = &clauses[0];
        let values: Vec<_> = clause.values().map(|v| v.text()).collect();
        assert_eq!(values, vec!["com.acme", "com.acme.util"]);

        let version = clause.attribute("version").unwrap();
        assert_eq!(version.value_text(), "[1.0,2.0)");
        assert!(version.value().unwrap().is_quoted());

        let resolution = clause.directive("resolution").unwrap();
        assert_eq!(resolution.value_text(), "optional");
        assert!(!resolution.is_legacy());
        assert!(clause.directive("uses").is_none());
    }

    #[test]
    fn test_legacy_directive() {
        let file = parse_file("Import-Package: a;resolution:optional\n");
        let clause = file.headers().next().unwrap().clauses().next().unwrap();
        let directive = clause.directive("resolution").unwrap();
        assert!(directive.is_legacy());
        assert_eq!(directive.value_text(), "optional");
    }

    #[test]
    fn test_legacy_directive_with_equals_in_value() {
        let file = parse_file("Import-Package: a;resolution: =optional\n");
        let clause = file.headers().next().unwrap().clauses().next().unwrap();
        let directive = clause.directive("resolution").unwrap();
        assert!(directive.is_legacy());
        assert_eq!(directive.value_text(), "=optional");
    }

    #[test]
    fn test_folded_values() {
        let file = parse_file("Export-Package: com.ac\n me.api;uses:=\"a,\n b\",c\n");
        let header = file.headers().next().unwrap();
        assert_eq!(header.value_text(), "com.acme.api;uses:=\"a,b\",c");

        let clauses: Vec<_> = header.clauses().collect();
        assert_eq!(clauses.len(), 2);
        let api = clauses[0].values().next().unwrap();
        assert_eq!(api.text(), "com.acme.api");
        assert_eq!(api.unwrapped_text(), "com.acme.api");
        assert_eq!(clauses[0].directive("uses").unwrap().value_text(), "a,b");
    }

    #[test]
    fn test_value_text_keeps_inner_spaces() {
        let options = ParseOptions::osgi();
        let parse = parse_with_options("Bundle-Vendor: Acme,  Inc.\n", &options);
        let file = ManifestFile::cast(parse.syntax()).unwrap();
        let header = file.header("Bundle-Vendor").unwrap();
        let value = header.clauses().next().unwrap().values().next().unwrap();
        assert_eq!(value.text(), "Acme,  Inc.");
    }

    #[test]
    fn test_empty_attribute_value() {
        let file = parse_file("Bundle-SymbolicName: x=\n");
        let clause = file.headers().next().unwrap().clauses().next().unwrap();
        let attribute = clause.attribute("x").unwrap();
        assert_eq!(attribute.value_text(), "");
        assert!(attribute.value().unwrap().syntax().text_range().is_empty());
    }

    #[test]
    fn test_name_with_missing_colon() {
        let file = parse_file("Bundle-Name\n");
        let header = file.headers().next().unwrap();
        assert_eq!(header.name().as_deref(), Some("Bundle-Name"));
        assert_eq!(file.error_nodes().count(), 1);
    }

    #[test]
    fn test_value_text_includes_misplaced_first_char() {
        let file = parse_file("Bundle-Name:Demo\n");
        let header = file.headers().next().unwrap();
        assert_eq!(header.value_text(), "Demo");
    }

    #[test]
    fn test_quoted_value_keeps_spaces() {
        let file = parse_file("A: \" x \"\n");
        let value = file
            .headers()
            .next()
            .unwrap()
            .clauses()
            .next()
            .unwrap()
            .values()
            .next()
            .unwrap();
        assert_eq!(value.text(), " x ");
        assert_eq!(value.unwrapped_text(), "\" x \"");
    }
}
