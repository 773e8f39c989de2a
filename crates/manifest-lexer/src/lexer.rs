//! Lexer for manifest headers.
//!
//! Whether a character opens a header name, continues a folded line or is
//! plain value text depends on where it sits on its line and on what came
//! before it on that line. That context lives in [`LexerState`], and the
//! whole transition is the pure function [`lex_step`].

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// Lexer state carried from one token to the next.
///
/// Every newline resets the state to [`LexerState::Initial`], so any line
/// start is a valid restart point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexerState {
    /// Scanning values, or at a line start.
    #[default]
    Initial,
    /// A header name was read; the `:` is expected next.
    WaitingForHeaderAssignment,
    /// Like [`LexerState::WaitingForHeaderAssignment`], after at least one
    /// bad character was reported while looking for the `:`.
    WaitingForHeaderAssignmentAfterBadCharacter,
    /// The header `:` was read; exactly one space is expected next.
    WaitingForSpaceAfterHeaderName,
}

/// One transition of the lexer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Kind of the token that was recognized.
    pub kind: TokenKind,
    /// Byte offset just past the token.
    pub end: usize,
    /// State to lex the following token in.
    pub next_state: LexerState,
}

impl Step {
    fn new(kind: TokenKind, end: usize, next_state: LexerState) -> Self {
        Self {
            kind,
            end,
            next_state,
        }
    }
}

/// Recognize the token starting at `pos` in `buffer[..end]`.
///
/// Returns `None` at the end of the range (or if `pos` is not a character
/// boundary inside it). Line starts are detected from the byte before
/// `pos` in the full buffer, so restarting in the middle of a buffer sees
/// the same line structure as a full lex.
pub fn lex_step(buffer: &str, pos: usize, end: usize, state: LexerState) -> Option<Step> {
    let end = end.min(buffer.len());
    let rest = buffer.get(..end)?.get(pos..)?;
    let c = rest.chars().next()?;
    let line_start = pos == 0 || buffer.as_bytes()[pos - 1] == b'\n';

    if let Some(len) = newline_len(rest) {
        let kind = if line_start {
            TokenKind::SectionEnd
        } else {
            TokenKind::Newline
        };
        return Some(Step::new(kind, pos + len, LexerState::Initial));
    }

    match state {
        LexerState::WaitingForHeaderAssignment
        | LexerState::WaitingForHeaderAssignmentAfterBadCharacter => {
            return Some(if c == ':' {
                Step::new(
                    TokenKind::Colon,
                    pos + 1,
                    LexerState::WaitingForSpaceAfterHeaderName,
                )
            } else {
                Step::new(
                    TokenKind::BadCharacter,
                    pos + c.len_utf8(),
                    LexerState::WaitingForHeaderAssignmentAfterBadCharacter,
                )
            });
        }
        LexerState::WaitingForSpaceAfterHeaderName => {
            let kind = if c == ' ' {
                TokenKind::SignificantSpace
            } else {
                TokenKind::BadCharacter
            };
            return Some(Step::new(kind, pos + c.len_utf8(), LexerState::Initial));
        }
        LexerState::Initial => {}
    }

    if line_start {
        // Continuation line: one whitespace character folds it into the previous header.
        if c.is_whitespace() {
            return Some(Step::new(
                TokenKind::SignificantSpace,
                pos + c.len_utf8(),
                LexerState::Initial,
            ));
        }

        let name_len = rest
            .bytes()
            .take_while(|b| is_header_name_byte(*b))
            .count();
        return Some(if name_len == 0 {
            Step::new(
                TokenKind::BadCharacter,
                pos + c.len_utf8(),
                LexerState::WaitingForHeaderAssignmentAfterBadCharacter,
            )
        } else {
            Step::new(
                TokenKind::HeaderName,
                pos + name_len,
                LexerState::WaitingForHeaderAssignment,
            )
        });
    }

    if let Some(kind) = special_token(c) {
        return Some(Step::new(kind, pos + 1, LexerState::Initial));
    }

    let mut len = 0;
    for (i, ch) in rest.char_indices() {
        if special_token(ch).is_some() || newline_len(&rest[i..]).is_some() {
            break;
        }
        len = i + ch.len_utf8();
    }
    Some(Step::new(
        TokenKind::HeaderValuePart,
        pos + len,
        LexerState::Initial,
    ))
}

/// A restartable lexer over a range of a manifest buffer.
///
/// After [`Lexer::start`] the first token is already available through
/// [`Lexer::token_kind`], [`Lexer::token_start`] and [`Lexer::token_end`];
/// [`Lexer::advance`] moves to the next one. `token_kind` returns `None`
/// once the range is exhausted.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    /// The full buffer; only `buffer[..end]` is lexed.
    buffer: &'src str,
    end: usize,
    token_start: usize,
    token_end: usize,
    token_kind: Option<TokenKind>,
    /// State the current token was recognized in.
    state: LexerState,
    /// State for the token after the current one.
    next_state: LexerState,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the whole source text.
    pub fn new(source: &'src str) -> Self {
        Self::start(source, 0, source.len())
    }

    /// Start lexing `buffer[start_offset..end_offset]` in the initial state.
    pub fn start(buffer: &'src str, start_offset: usize, end_offset: usize) -> Self {
        Self::start_with_state(buffer, start_offset, end_offset, LexerState::Initial)
    }

    /// Start lexing at `start_offset` in a known state.
    ///
    /// Restarting at the start of a token with the state reported for that
    /// token produces the same tokens as an uninterrupted run.
    pub fn start_with_state(
        buffer: &'src str,
        start_offset: usize,
        end_offset: usize,
        state: LexerState,
    ) -> Self {
        let end = end_offset.min(buffer.len());
        let start = start_offset.min(end);
        let mut lexer = Self {
            buffer,
            end,
            token_start: start,
            token_end: start,
            token_kind: None,
            state,
            next_state: state,
        };
        lexer.advance();
        lexer
    }

    /// Move to the next token.
    pub fn advance(&mut self) {
        self.token_start = self.token_end;
        self.state = self.next_state;

        match lex_step(self.buffer, self.token_start, self.end, self.state) {
            Some(step) => {
                trace!(
                    "Token {:?} at {}..{}: {:?}",
                    step.kind,
                    self.token_start,
                    step.end,
                    &self.buffer[self.token_start..step.end]
                );
                self.token_kind = Some(step.kind);
                self.token_end = step.end;
                self.next_state = step.next_state;
            }
            None => {
                self.token_kind = None;
            }
        }
    }

    /// Kind of the current token, `None` at the end of input.
    #[inline]
    pub fn token_kind(&self) -> Option<TokenKind> {
        self.token_kind
    }

    /// Byte offset where the current token starts.
    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Byte offset just past the current token.
    #[inline]
    pub fn token_end(&self) -> usize {
        self.token_end
    }

    /// State the current token was lexed in.
    #[inline]
    pub fn state(&self) -> LexerState {
        self.state
    }

    /// The current token, if any.
    pub fn token(&self) -> Option<Token<'src>> {
        let kind = self.token_kind?;
        let span = Span::new(self.token_start as u32, self.token_end as u32);
        Some(Token::new(kind, span, span.slice(self.buffer)))
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.token()?;
        self.advance();
        Some(token)
    }
}

/// Length of the newline at the start of `text`, if there is one.
fn newline_len(text: &str) -> Option<usize> {
    if text.starts_with('\n') {
        Some(1)
    } else if text.starts_with("\r\n") {
        Some(2)
    } else {
        None
    }
}

fn special_token(c: char) -> Option<TokenKind> {
    match c {
        ':' => Some(TokenKind::Colon),
        ';' => Some(TokenKind::Semicolon),
        ',' => Some(TokenKind::Comma),
        '=' => Some(TokenKind::Equals),
        '"' => Some(TokenKind::Quote),
        _ => None,
    }
}

fn is_header_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
