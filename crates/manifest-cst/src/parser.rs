//! CST parser for manifests.
//!
//! The parser pulls tokens from the lexer and drives a [`TreeBuilder`].
//! Malformed input never stops it: every problem becomes an error node or
//! an error attached to a node, and every token ends up in the tree.

use std::collections::VecDeque;
use std::fmt;

use manifest_lexer::{Lexer, Span, Token};
use rowan::GreenNode;
use tracing::{debug, trace};

use crate::builder::{CompletedMarker, Marker, TreeBuilder};
use crate::options::ParseOptions;
use crate::syntax_kind::{SyntaxKind, SyntaxNode};

/// A parsed manifest.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Get the root syntax node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Get parse errors, in source order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Check if parsing succeeded without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert to Result, returning errors if any.
    pub fn ok(self) -> Result<SyntaxNode, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.syntax())
        } else {
            Err(self.errors)
        }
    }

    /// Get the green node (for testing/debugging).
    pub fn green(&self) -> &GreenNode {
        &self.green
    }
}

/// What went wrong at a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A header name not followed by `:`.
    ColonExpected,
    /// A header line that does not start with a name.
    HeaderNameExpected,
    /// The header `:` not followed by a space.
    WhitespaceExpected,
    /// `=` or `:=` with no value before it.
    MissingLeftSideValue,
    /// A second `=` or `:=` inside an attribute or directive.
    CascadedAssignment,
    /// A lone `:` inside an attribute or directive.
    HeaderAssignmentNotAllowed,
    /// A quoted and an unquoted value part glued together.
    MissingSeparator,
    /// A quoted value not closed before the end of its header.
    ClosingQuoteExpected,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ParseErrorKind::ColonExpected => "':' expected",
            ParseErrorKind::HeaderNameExpected => "Header name expected",
            ParseErrorKind::WhitespaceExpected => "Whitespace expected",
            ParseErrorKind::MissingLeftSideValue => "Missing left side value",
            ParseErrorKind::CascadedAssignment => {
                "Cannot concatenate or cascade directives or attribute assignments"
            }
            ParseErrorKind::HeaderAssignmentNotAllowed => "Header assignment not allowed here",
            ParseErrorKind::MissingSeparator => "Separator between header value parts missing",
            ParseErrorKind::ClosingQuoteExpected => "Closing quote expected",
        };
        f.write_str(message)
    }
}

/// A parse error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Source range of the node the error is attached to. Empty for
    /// missing elements.
    pub span: Span,
    /// Kind of the node the error is attached to.
    pub node: SyntaxKind,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, span: Span, node: SyntaxKind) -> Self {
        Self { kind, span, node }
    }

    /// Byte offset where the error occurred.
    pub fn offset(&self) -> u32 {
        self.span.start
    }

    /// Human-readable error message.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Parse manifest source into a CST.
pub fn parse(source: &str) -> Parse {
    parse_with_options(source, &ParseOptions::default())
}

/// Parse manifest source into a CST with the given options.
pub fn parse_with_options(source: &str, options: &ParseOptions) -> Parse {
    trace!("Parsing {} bytes", source.len());
    CstParser::new(source, options).parse()
}

/// The last non-blank segment of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Bare,
    Quoted,
}

/// The operator of an attribute or directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    /// `=`
    Equals,
    /// `:=`
    ColonEquals,
    /// Legacy `:`
    Colon,
}

impl Operator {
    fn node_kind(self) -> SyntaxKind {
        match self {
            Operator::Equals => SyntaxKind::ATTRIBUTE,
            Operator::ColonEquals | Operator::Colon => SyntaxKind::DIRECTIVE,
        }
    }
}

/// An attribute or directive waiting for its value.
struct OpenAssignment {
    marker: Marker,
    operator: Operator,
    has_value: bool,
}

/// CST parser that drives the marker tree builder.
struct CstParser<'src, 'opt> {
    source: &'src str,
    options: &'opt ParseOptions,
    lexer: Lexer<'src>,
    lookahead: VecDeque<Token<'src>>,
    builder: TreeBuilder,
}

impl<'src, 'opt> CstParser<'src, 'opt> {
    fn new(source: &'src str, options: &'opt ParseOptions) -> Self {
        Self {
            source,
            options,
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
            builder: TreeBuilder::new(),
        }
    }

    fn parse(mut self) -> Parse {
        let file = self.builder.mark();
        loop {
            match self.peek() {
                None => break,
                Some(SyntaxKind::SECTION_END) => self.bump(),
                Some(_) => self.parse_header(),
            }
        }
        let root = file.done(&mut self.builder, SyntaxKind::FILE);

        let (green, errors) = self.builder.finish(root, self.source);
        Parse { green, errors }
    }

    /// Peek at the kind of the token `n` positions ahead.
    fn nth(&mut self, n: usize) -> Option<SyntaxKind> {
        while self.lookahead.len() <= n {
            let token = self.lexer.next()?;
            self.lookahead.push_back(token);
        }
        self.lookahead.get(n).map(|t| SyntaxKind::from(t.kind))
    }

    /// Peek at the current token kind.
    fn peek(&mut self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    /// Text of the current token, empty at the end of input.
    fn peek_text(&mut self) -> &'src str {
        self.nth(0);
        self.lookahead.front().map(|t| t.text).unwrap_or("")
    }

    /// Consume and add the current token to the tree.
    fn bump(&mut self) {
        self.nth(0);
        if let Some(token) = self.lookahead.pop_front() {
            self.builder.token(token.kind.into(), token.span);
        }
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.peek() == Some(kind)
    }

    /// Newline followed by the indent of a continuation line.
    fn at_continuation(&mut self) -> bool {
        self.at(SyntaxKind::NEWLINE) && self.nth(1) == Some(SyntaxKind::SIGNIFICANT_SPACE)
    }

    /// Whether the current token ends the header being parsed.
    fn at_header_end(&mut self) -> bool {
        match self.peek() {
            None => true,
            Some(SyntaxKind::NEWLINE) => !self.at_continuation(),
            Some(kind) => matches!(
                kind,
                SyntaxKind::SECTION_END | SyntaxKind::HEADER_NAME | SyntaxKind::BAD_CHARACTER
            ),
        }
    }

    /// Fold continuation lines into the innermost open node.
    fn skip_continuations(&mut self) {
        while self.at_continuation() {
            self.bump();
            self.bump();
        }
    }

    fn error(&mut self, marker: Marker, kind: ParseErrorKind) -> CompletedMarker {
        debug!("{} at offset {}", kind, self.builder.pos());
        marker.error(&mut self.builder, kind)
    }

    /// `Name: clause, clause` up to and including its newline.
    fn parse_header(&mut self) {
        let header = self.builder.mark();

        let name = if self.at(SyntaxKind::HEADER_NAME) {
            let text = self.peek_text();
            let m = self.builder.mark();
            self.bump();
            if self.at(SyntaxKind::COLON) {
                m.done(&mut self.builder, SyntaxKind::NAME);
            } else {
                while self.at(SyntaxKind::BAD_CHARACTER) {
                    self.bump();
                }
                self.error(m, ParseErrorKind::ColonExpected);
            }
            Some(text)
        } else {
            let m = self.builder.mark();
            self.bump();
            while !matches!(
                self.peek(),
                None | Some(SyntaxKind::COLON | SyntaxKind::NEWLINE | SyntaxKind::SECTION_END)
            ) {
                self.bump();
            }
            self.error(m, ParseErrorKind::HeaderNameExpected);
            None
        };

        if self.at(SyntaxKind::COLON) {
            self.bump();
            match self.peek() {
                Some(SyntaxKind::SIGNIFICANT_SPACE) => self.bump(),
                Some(SyntaxKind::BAD_CHARACTER) => {
                    let m = self.builder.mark();
                    self.bump();
                    self.error(m, ParseErrorKind::WhitespaceExpected);
                }
                _ => {
                    let m = self.builder.mark();
                    self.error(m, ParseErrorKind::WhitespaceExpected);
                }
            }
        }

        let free_form = name.is_some_and(|n| self.options.is_free_form(n));
        loop {
            self.skip_continuations();
            match self.peek() {
                None
                | Some(
                    SyntaxKind::NEWLINE
                    | SyntaxKind::SECTION_END
                    | SyntaxKind::HEADER_NAME
                    | SyntaxKind::BAD_CHARACTER,
                ) => break,
                Some(SyntaxKind::SIGNIFICANT_SPACE) => self.bump(),
                Some(_) if free_form => self.parse_free_form_clause(),
                Some(_) => {
                    self.parse_clause();
                    if self.at(SyntaxKind::COMMA) {
                        self.bump();
                    }
                }
            }
        }

        if self.at(SyntaxKind::NEWLINE) {
            self.bump();
        }
        header.done(&mut self.builder, SyntaxKind::HEADER);
    }

    /// The whole value of a free-form header as one clause with one value.
    fn parse_free_form_clause(&mut self) {
        let clause = self.builder.mark();
        let value = self.builder.mark();
        while !self.at_header_end() {
            self.bump();
        }
        value.done(&mut self.builder, SyntaxKind::HEADER_VALUE);
        clause.done(&mut self.builder, SyntaxKind::CLAUSE);
    }

    /// Parameters separated by `;`.
    fn parse_clause(&mut self) {
        let clause = self.builder.mark();
        loop {
            self.parse_parameter();
            if self.at(SyntaxKind::SEMICOLON) {
                self.bump();
            } else {
                break;
            }
        }
        clause.done(&mut self.builder, SyntaxKind::CLAUSE);
    }

    /// A value, an attribute or a directive, up to the next separator.
    fn parse_parameter(&mut self) {
        let mut last_value: Option<CompletedMarker> = None;
        let mut assignment: Option<OpenAssignment> = None;
        let mut parsed_any = false;

        loop {
            self.skip_continuations();
            match self.peek() {
                Some(SyntaxKind::HEADER_VALUE_PART | SyntaxKind::QUOTE) => {
                    // `name: =value` reads as a legacy directive whose value starts with `=`.
                    let leading_equals = assignment
                        .as_ref()
                        .is_some_and(|open| open.operator == Operator::Colon && !open.has_value);
                    let value = self.parse_value(leading_equals);
                    if let Some(open) = assignment.as_mut() {
                        open.has_value = true;
                    }
                    last_value = Some(value);
                }
                Some(SyntaxKind::EQUALS | SyntaxKind::COLON) => {
                    if assignment.is_some() {
                        self.parse_misplaced_assignment();
                    } else if let Some(lhs) = last_value.take() {
                        let marker = lhs.precede(&mut self.builder);
                        let operator = self.bump_assignment();
                        assignment = Some(OpenAssignment {
                            marker,
                            operator,
                            has_value: false,
                        });
                    } else {
                        let m = self.builder.mark();
                        self.bump_assignment();
                        self.error(m, ParseErrorKind::MissingLeftSideValue);
                    }
                }
                _ => break,
            }
            parsed_any = true;
        }

        match assignment {
            Some(open) => {
                if !open.has_value {
                    self.empty_value();
                }
                open.marker.done(&mut self.builder, open.operator.node_kind());
            }
            None if !parsed_any => self.empty_value(),
            None => {}
        }
    }

    /// Bump `=`, `:=` or a legacy `:`.
    fn bump_assignment(&mut self) -> Operator {
        if self.at(SyntaxKind::EQUALS) {
            self.bump();
            return Operator::Equals;
        }

        self.bump();
        if self.at_continuation() && self.nth(2) == Some(SyntaxKind::EQUALS) {
            self.bump();
            self.bump();
        }
        if self.at(SyntaxKind::EQUALS) {
            self.bump();
            Operator::ColonEquals
        } else {
            Operator::Colon
        }
    }

    /// An assignment token inside an attribute or directive.
    fn parse_misplaced_assignment(&mut self) {
        let lone_colon = self.at(SyntaxKind::COLON) && self.nth(1) != Some(SyntaxKind::EQUALS);
        let m = self.builder.mark();
        if lone_colon {
            self.bump();
            self.error(m, ParseErrorKind::HeaderAssignmentNotAllowed);
        } else {
            self.bump_assignment();
            self.error(m, ParseErrorKind::CascadedAssignment);
        }
    }

    fn empty_value(&mut self) {
        let m = self.builder.mark();
        m.done(&mut self.builder, SyntaxKind::HEADER_VALUE);
    }

    /// Bare and quoted parts, folded over continuation lines.
    ///
    /// With `leading_equals`, `=` is value text until the first non-blank
    /// part.
    fn parse_value(&mut self, leading_equals: bool) -> CompletedMarker {
        let m = self.builder.mark();
        let mut last: Option<Segment> = None;
        // Whether the text bumped last ends without whitespace.
        let mut adjacent = false;
        let mut glued = false;

        loop {
            match self.peek() {
                Some(SyntaxKind::HEADER_VALUE_PART) => {
                    let text = self.peek_text();
                    let blank = text.trim().is_empty();
                    if last == Some(Segment::Quoted)
                        && adjacent
                        && !text.starts_with(char::is_whitespace)
                    {
                        glued = true;
                        break;
                    }
                    self.bump();
                    adjacent = !text.ends_with(char::is_whitespace);
                    if !blank {
                        last = Some(Segment::Bare);
                    }
                }
                Some(SyntaxKind::QUOTE) => {
                    if last.is_some() && adjacent {
                        glued = true;
                        break;
                    }
                    self.parse_quoted();
                    adjacent = true;
                    last = Some(Segment::Quoted);
                }
                Some(SyntaxKind::EQUALS) if leading_equals && last.is_none() => {
                    self.bump();
                    adjacent = true;
                }
                Some(SyntaxKind::NEWLINE)
                    if self.at_continuation()
                        && matches!(
                            self.nth(2),
                            Some(SyntaxKind::HEADER_VALUE_PART | SyntaxKind::QUOTE)
                        ) =>
                {
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }

        let value = m.done(&mut self.builder, SyntaxKind::HEADER_VALUE);
        if glued {
            debug!(
                "{} at offset {}",
                ParseErrorKind::MissingSeparator,
                self.builder.pos()
            );
            value.set_error(&mut self.builder, ParseErrorKind::MissingSeparator);
        }
        value
    }

    /// `"..."`, where separators and assignment tokens are plain text.
    fn parse_quoted(&mut self) {
        self.bump();
        loop {
            match self.peek() {
                Some(SyntaxKind::QUOTE) => {
                    self.bump();
                    return;
                }
                Some(SyntaxKind::NEWLINE) if self.at_continuation() => {
                    self.bump();
                    self.bump();
                }
                None
                | Some(SyntaxKind::NEWLINE | SyntaxKind::SECTION_END | SyntaxKind::HEADER_NAME) => {
                    let m = self.builder.mark();
                    self.error(m, ParseErrorKind::ClosingQuoteExpected);
                    return;
                }
                Some(_) => self.bump(),
            }
        }
    }
}
