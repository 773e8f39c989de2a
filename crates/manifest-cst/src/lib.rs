//! Lossless Concrete Syntax Tree for JAR and OSGi bundle manifests.
//!
//! This crate turns manifest text into a CST using the
//! [rowan](https://docs.rs/rowan) library. Every byte of the input, including
//! continuation lines, blank section separators and malformed text, ends up
//! in the tree, so the source can be reconstructed exactly. Parsing never
//! fails: problems are reported as [`ParseError`]s alongside the tree.
//!
//! # Example
//!
//! ```
//! use manifest_cst::{parse, ast::{AstNode, ManifestFile}};
//!
//! let source = "Import-Package: com.acme;version=\"[1.0,2.0)\",\n org.slf4j\n";
//!
//! let parsed = parse(source);
//! assert!(parsed.is_ok());
//!
//! let file = ManifestFile::cast(parsed.syntax()).unwrap();
//! let header = file.header("Import-Package").unwrap();
//! for clause in header.clauses() {
//!     for value in clause.values() {
//!         println!("package {}", value.text());
//!     }
//!     if let Some(version) = clause.attribute("version") {
//!         println!("  version {}", version.value_text());
//!     }
//! }
//!
//! // Roundtrip: source can be exactly reconstructed
//! assert_eq!(parsed.syntax().to_string(), source);
//! ```
//!
//! # Free-form headers
//!
//! Some headers hold plain text rather than clauses. Listing them in
//! [`ParseOptions`] keeps their value whole:
//!
//! ```
//! use manifest_cst::{ParseOptions, parse_with_options};
//!
//! let parsed = parse_with_options("Bundle-Vendor: Acme, Inc.\n", &ParseOptions::osgi());
//! assert!(parsed.is_ok());
//! ```

pub mod ast;
pub mod builder;
mod diagnostic;
pub mod options;
pub mod parser;
pub mod syntax_kind;

pub use options::ParseOptions;
pub use parser::{Parse, ParseError, ParseErrorKind, parse, parse_with_options};
pub use syntax_kind::{ManifestLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

// Re-export rowan types for convenience
pub use rowan::{TextRange, TextSize};
