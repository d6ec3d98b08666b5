//! Diagnostic rendering for configuration errors.

use ariadne::{Color, Label, Report, ReportKind, Source};
use hocon_tokenizer::Span;

use crate::ConfigError;

impl ConfigError {
    /// Byte range in the source the error points at, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            ConfigError::Parse { span, .. } => *span,
            _ => None,
        }
    }

    /// Attach a source span to a parse error.
    pub fn with_span(self, new_span: Span) -> Self {
        match self {
            ConfigError::Parse {
                origin, message, ..
            } => ConfigError::Parse {
                origin,
                message,
                span: Some(new_span),
            },
            other => other,
        }
    }

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
        let report = self.build_report(filename, source.len());
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        source_len: usize,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        match self {
            ConfigError::Parse {
                message,
                span: Some(span),
                ..
            } => {
                let range = clamp(*span, source_len);
                let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(message)
                    .with_label(
                        Label::new((filename, range))
                            .with_message(label_for(message))
                            .with_color(Color::Red),
                    );
                if message.contains("try enclosing") {
                    report = report.with_help("quote the text with double quotes");
                }
                report
            }
            ConfigError::UnresolvedSubstitution { detail, .. } => {
                Report::build(ReportKind::Error, (filename, 0..0))
                    .with_message(format!("could not resolve substitution: {}", detail))
                    .with_note("substitutions are looked up from the root of the document, then in the environment")
            }
            other => Report::build(ReportKind::Error, (filename, 0..0)).with_message(other),
        }
    }
}

fn clamp(span: Span, source_len: usize) -> std::ops::Range<usize> {
    let start = (span.start as usize).min(source_len);
    let end = (span.end as usize).clamp(start, source_len);
    start..end
}

fn label_for(message: &str) -> &'static str {
    if message.starts_with("Expecting") {
        "unexpected token"
    } else if message.contains("not allowed") {
        "not allowed here"
    } else {
        "here"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Origin;
    use facet_testhelpers::test;

    fn stripped(rendered: String) -> String {
        String::from_utf8(strip_ansi_escapes::strip(rendered.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_error_points_at_span() {
        let source = "a = [1, 2\nb = 3";
        let err = ConfigError::parse(
            Origin::new("test.conf").with_line(2),
            "List should have ended with ] or had a comma, instead had token: 'b'",
        )
        .with_span(Span::new(10, 11));
        assert_eq!(err.span(), Some(Span::new(10, 11)));

        let rendered = stripped(err.render("test.conf", source));
        assert!(rendered.contains("List should have ended with ]"), "{}", rendered);
        assert!(rendered.contains("test.conf"), "{}", rendered);
        assert!(rendered.contains("b = 3"), "{}", rendered);
    }

    #[test]
    fn test_out_of_range_span_is_clamped() {
        let err = ConfigError::parse(Origin::new("x"), "Expecting a value").with_span(Span::new(40, 50));
        let rendered = stripped(err.render("x", "a ="));
        assert!(rendered.contains("Expecting a value"), "{}", rendered);
    }

    #[test]
    fn test_non_parse_error_renders_message() {
        let err = ConfigError::UnresolvedSubstitution {
            origin: Origin::new("x"),
            detail: "${nope}".to_string(),
        };
        let rendered = stripped(err.render("x", "a = ${nope}"));
        assert!(rendered.contains("could not resolve substitution: ${nope}"), "{}", rendered);
    }
}
