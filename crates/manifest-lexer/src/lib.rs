//! A lexer for JAR and OSGi bundle manifests.
//!
//! The lexer is a small state machine that splits manifest text into
//! header names, assignment colons, value parts, separators and newlines.
//! It never fails: characters it cannot place become [`TokenKind::BadCharacter`]
//! tokens and lexing continues.

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod lexer;
pub use lexer::{Lexer, LexerState, Step, lex_step};
