//! `manifest`: inspect JAR and OSGi bundle manifests.

mod logging;

use std::io::{self, Read, Write};

use clap::{Parser, Subcommand};
use manifest_cst::ast::{AstNode, Clause, Header, ManifestFile};
use manifest_cst::{ParseOptions, parse_with_options};
use manifest_lexer::Lexer;
use serde::Serialize;
use tracing::debug;

const EXIT_SUCCESS: i32 = 0;
const EXIT_SYNTAX_ERROR: i32 = 1;
const EXIT_IO_ERROR: i32 = 3;

// ============================================================================
// CLI argument structures
// ============================================================================

/// Inspect JAR and OSGi bundle manifests
#[derive(Parser, Debug)]
#[command(name = "manifest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Keep the values of OSGi free-text headers (Bundle-Vendor, Bundle-DocURL, ...) whole
    #[arg(long, global = true)]
    osgi: bool,

    /// Keep the value of this header whole (repeatable)
    #[arg(long = "free-form", value_name = "HEADER", global = true)]
    free_form: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the lexer tokens
    Tokens {
        /// Manifest file, or '-' for stdin
        file: String,
    },

    /// Print the concrete syntax tree and any parse errors
    Tree {
        /// Manifest file, or '-' for stdin
        file: String,
    },

    /// Report parse errors; exits with 1 if there are any
    Check {
        /// Manifest file, or '-' for stdin
        file: String,
    },

    /// Print headers grouped by section
    Headers {
        /// Manifest file, or '-' for stdin
        file: String,

        /// Output clauses, attributes and directives as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn parse_options(&self) -> ParseOptions {
        let options = if self.osgi {
            ParseOptions::osgi()
        } else {
            ParseOptions::new()
        };
        options.free_form_headers(self.free_form.iter().cloned())
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let options = cli.parse_options();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Tokens { file } => {
            let source = read_input(file)?;
            write_tokens(&source, &mut out).map_err(CliError::Io)
        }
        Command::Tree { file } => {
            let source = read_input(file)?;
            write_tree(&source, &options, &mut out).map_err(CliError::Io)
        }
        Command::Check { file } => {
            let source = read_input(file)?;
            check(display_name(file), &source, &options)
        }
        Command::Headers { file, json } => {
            let source = read_input(file)?;
            if *json {
                let report = headers_report(&source, &options);
                serde_json::to_writer_pretty(&mut out, &report).map_err(CliError::Json)?;
                writeln!(out).map_err(CliError::Io)
            } else {
                write_headers(&source, &options, &mut out).map_err(CliError::Io)
            }
        }
    }
}

// ============================================================================

#[derive(Debug)]
enum CliError {
    Read { path: String, error: io::Error },
    Io(io::Error),
    Json(serde_json::Error),
    Syntax { path: String, count: usize },
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Read { .. } | CliError::Io(_) | CliError::Json(_) => EXIT_IO_ERROR,
            CliError::Syntax { .. } => EXIT_SYNTAX_ERROR,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Read { path, error } => write!(f, "{path}: {error}"),
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Json(e) => write!(f, "{e}"),
            CliError::Syntax { path, count: 1 } => write!(f, "{path}: 1 syntax error"),
            CliError::Syntax { path, count } => write!(f, "{path}: {count} syntax errors"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Read { error, .. } => Some(error),
            CliError::Io(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Syntax { .. } => None,
        }
    }
}

// ============================================================================
// Subcommand implementations
// ============================================================================

fn read_input(file: &str) -> Result<String, CliError> {
    let read = if file == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        std::fs::read_to_string(file)
    };
    read.map_err(|error| CliError::Read {
        path: display_name(file).to_string(),
        error,
    })
}

fn display_name(file: &str) -> &str {
    if file == "-" { "<stdin>" } else { file }
}

fn write_tokens(source: &str, out: &mut impl Write) -> io::Result<()> {
    for token in Lexer::new(source) {
        writeln!(
            out,
            "{:?}@{}..{} {:?}",
            token.kind, token.span.start, token.span.end, token.text
        )?;
    }
    Ok(())
}

fn write_tree(source: &str, options: &ParseOptions, out: &mut impl Write) -> io::Result<()> {
    let parsed = parse_with_options(source, options);
    write!(out, "{:#?}", parsed.syntax())?;

    if !parsed.errors().is_empty() {
        writeln!(out, "\nParse errors:")?;
        for err in parsed.errors() {
            writeln!(out, "  {err}")?;
        }
    }
    Ok(())
}

fn check(filename: &str, source: &str, options: &ParseOptions) -> Result<(), CliError> {
    let parsed = parse_with_options(source, options);
    debug!("{}: {} parse errors", filename, parsed.errors().len());

    for error in parsed.errors() {
        error.write_report(filename, source, io::stderr());
    }
    if parsed.is_ok() {
        Ok(())
    } else {
        Err(CliError::Syntax {
            path: filename.to_string(),
            count: parsed.errors().len(),
        })
    }
}

fn manifest_file(source: &str, options: &ParseOptions) -> Option<ManifestFile> {
    ManifestFile::cast(parse_with_options(source, options).syntax())
}

fn write_headers(source: &str, options: &ParseOptions, out: &mut impl Write) -> io::Result<()> {
    let Some(file) = manifest_file(source, options) else {
        return Ok(());
    };
    for (i, section) in file.sections().iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        for header in section.headers() {
            let name = header.name().unwrap_or_default();
            writeln!(out, "{}: {}", name, header.value_text())?;
        }
    }
    Ok(())
}

// ============================================================================
// JSON output
// ============================================================================

#[derive(Debug, Serialize)]
struct HeaderReport {
    name: Option<String>,
    value: String,
    clauses: Vec<ClauseReport>,
}

#[derive(Debug, Serialize)]
struct ClauseReport {
    values: Vec<String>,
    attributes: Vec<ParameterReport>,
    directives: Vec<ParameterReport>,
}

#[derive(Debug, Serialize)]
struct ParameterReport {
    name: String,
    value: String,
}

/// Headers of each section.
fn headers_report(source: &str, options: &ParseOptions) -> Vec<Vec<HeaderReport>> {
    let Some(file) = manifest_file(source, options) else {
        return Vec::new();
    };
    file.sections()
        .iter()
        .map(|section| section.headers().iter().map(header_report).collect())
        .collect()
}

fn header_report(header: &Header) -> HeaderReport {
    HeaderReport {
        name: header.name(),
        value: header.value_text(),
        clauses: header.clauses().map(|c| clause_report(&c)).collect(),
    }
}

fn clause_report(clause: &Clause) -> ClauseReport {
    ClauseReport {
        values: clause.values().map(|v| v.text()).collect(),
        attributes: clause
            .attributes()
            .map(|a| ParameterReport {
                name: a.name(),
                value: a.value_text(),
            })
            .collect(),
        directives: clause
            .directives()
            .map(|d| ParameterReport {
                name: d.name(),
                value: d.value_text(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["manifest", "headers", "--json", "--osgi", "MANIFEST.MF"])
            .unwrap();
        assert!(cli.osgi);
        assert!(matches!(
            cli.command,
            Command::Headers { ref file, json: true } if file == "MANIFEST.MF"
        ));
        assert!(cli.parse_options().is_free_form("Bundle-Vendor"));
    }

    #[test]
    fn free_form_flag() {
        let cli = Cli::try_parse_from(["manifest", "--free-form", "X-Note", "tree", "-"]).unwrap();
        assert!(cli.parse_options().is_free_form("x-note"));
        assert!(!cli.parse_options().is_free_form("Bundle-Vendor"));
    }

    #[test]
    fn tokens_output() {
        let text = output(|out| write_tokens("A: b\n", out));
        insta::assert_snapshot!(text, @r#"
        HeaderName@0..1 "A"
        Colon@1..2 ":"
        SignificantSpace@2..3 " "
        HeaderValuePart@3..4 "b"
        Newline@4..5 "\n"
        "#);
    }

    #[test]
    fn tree_output_lists_errors() {
        let text = output(|out| write_tree("A:b\n", &ParseOptions::new(), out));
        assert!(text.starts_with("FILE@0..4\n"));
        assert!(text.ends_with("Parse errors:\n  Whitespace expected at offset 2\n"));
    }

    #[test]
    fn headers_output() {
        let source = "Manifest-Version: 1.0\nImport-Package: a,\n b\n\nName: x\n";
        let text = output(|out| write_headers(source, &ParseOptions::new(), out));
        assert_eq!(text, "Manifest-Version: 1.0\nImport-Package: a,b\n\nName: x\n");
    }

    #[test]
    fn headers_json() {
        let source = "Import-Package: a;version=1;resolution:=optional\n";
        let report = headers_report(source, &ParseOptions::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!([[{
                "name": "Import-Package",
                "value": "a;version=1;resolution:=optional",
                "clauses": [{
                    "values": ["a"],
                    "attributes": [{"name": "version", "value": "1"}],
                    "directives": [{"name": "resolution", "value": "optional"}],
                }],
            }]])
        );
    }

    #[test]
    fn check_reports_syntax_errors() {
        let err = check("MANIFEST.MF", "A: a==b\n", &ParseOptions::new()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_SYNTAX_ERROR);
        assert_eq!(err.to_string(), "MANIFEST.MF: 1 syntax error");

        assert!(check("MANIFEST.MF", "A: b\n", &ParseOptions::new()).is_ok());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_input("/nonexistent/MANIFEST.MF").unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
        assert!(err.to_string().starts_with("/nonexistent/MANIFEST.MF: "));
    }
}
