//! Diagnostic rendering for parse errors.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::parser::{ParseError, ParseErrorKind};

impl ParseError {
    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range: std::ops::Range<usize> = self.span.into();
        let (label, help) = match self.kind {
            ParseErrorKind::ColonExpected => (
                "header name not followed by ':'",
                Some("write headers as `Name: value`"),
            ),
            ParseErrorKind::HeaderNameExpected => (
                "not a header name",
                Some(
                    "header names are letters, digits, '-' and '_'; continuation lines must follow a header",
                ),
            ),
            ParseErrorKind::WhitespaceExpected => (
                "expected a space here",
                Some("a header colon must be followed by exactly one space"),
            ),
            ParseErrorKind::MissingLeftSideValue => (
                "nothing to assign to",
                Some("attributes are written `name=value`, directives `name:=value`"),
            ),
            ParseErrorKind::CascadedAssignment => (
                "second assignment",
                Some("separate parameters with ';'"),
            ),
            ParseErrorKind::HeaderAssignmentNotAllowed => (
                "unexpected ':'",
                Some("quote values that contain ':'"),
            ),
            ParseErrorKind::MissingSeparator => (
                "value parts glued together",
                Some("separate values with ';' or ','"),
            ),
            ParseErrorKind::ClosingQuoteExpected => ("quote not closed", None),
        };

        let report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_message(label)
                    .with_color(Color::Red),
            );
        match help {
            Some(help) => report.with_help(help),
            None => report,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use crate::parse;

    fn strip(rendered: String) -> String {
        String::from_utf8(strip_ansi_escapes::strip(rendered.as_bytes())).unwrap()
    }

    #[test]
    fn test_display() {
        let parse = parse("Bundle-Name:x\n");
        assert_eq!(parse.errors()[0].to_string(), "Whitespace expected at offset 12");
    }

    #[test]
    fn test_render_contains_message_and_help() {
        let source = "Import-Package: a==b\n";
        let parse = parse(source);
        let rendered = strip(parse.errors()[0].render("MANIFEST.MF", source));
        assert!(rendered.contains(
            "Cannot concatenate or cascade directives or attribute assignments"
        ));
        assert!(rendered.contains("second assignment"));
        assert!(rendered.contains("MANIFEST.MF"));
        assert!(rendered.contains("separate parameters with ';'"));
    }

    #[test]
    fn test_render_empty_span() {
        let source = "A: \"abc\nB: c\n";
        let parse = parse(source);
        let rendered = strip(parse.errors()[0].render("MANIFEST.MF", source));
        assert!(rendered.contains("Closing quote expected"));
    }

    #[test]
    fn test_write_report() {
        let source = "=x: y\n";
        let parse = parse(source);
        let mut out = Vec::new();
        parse.errors()[0].write_report("MANIFEST.MF", source, &mut out);
        let rendered = strip(String::from_utf8(out).unwrap());
        assert!(rendered.contains("Header name expected"));
    }
}
