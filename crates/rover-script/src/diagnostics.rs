use std::fmt;
use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::error::{ScriptError, SyntaxError};
use crate::lexer::Location;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The script cannot run.
    Error,
    /// The script runs but is probably not what was meant.
    Warning,
}

/// A message tied to a byte range of a script.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// How serious it is.
    pub severity: Severity,
    /// Byte range in the source.
    pub span: Range<usize>,
    /// Headline message.
    pub message: String,
    /// Text attached to the underlined span; defaults to the message.
    pub label: Option<String>,
}

impl Diagnostic {
    /// An error diagnostic.
    pub fn error(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// A warning diagnostic.
    pub fn warning(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Attach a label to the span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build a diagnostic for a script failure, spanning the offending
    /// token in `source`.
    pub fn from_script_error(source: &str, error: &ScriptError) -> Self {
        let span = error
            .location()
            .map_or(0..0, |location| token_span(source, location));
        let message = match error {
            ScriptError::Syntax(e) => e.message.clone(),
            ScriptError::Runtime(e) => e.message.clone(),
            other => other.to_string(),
        };
        Self::error(span, message).with_label(error.class())
    }

    /// Shorthand for [`Diagnostic::from_script_error`] on a syntax error.
    pub fn from_syntax_error(source: &str, error: &SyntaxError) -> Self {
        Self::from_script_error(source, &ScriptError::Syntax(error.clone()))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

/// Byte range of the token starting at `location`: a run of word
/// characters, or a single character otherwise.
fn token_span(source: &str, location: Location) -> Range<usize> {
    let start = location.index.min(source.len());
    let rest = &source[start..];
    let Some(first) = rest.chars().next() else {
        return start..start;
    };
    if !is_word(first) {
        return start..start + first.len_utf8();
    }
    let end = rest
        .char_indices()
        .find(|(_, c)| !is_word(*c))
        .map_or(rest.len(), |(i, _)| i);
    start..start + end
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '#' | '.' | '-')
}

/// Render diagnostics using ariadne for terminal output.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let (kind, color) = match diag.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        let report = Report::build(kind, (filename, diag.span.clone()))
            .with_message(&diag.message)
            .with_label(
                Label::new((filename, diag.span.clone()))
                    .with_message(label_text)
                    .with_color(color),
            );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RuntimeError, RuntimeErrorKind};

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::warning(0..0, "script has no statements");
        assert_eq!(d.to_string(), "warning: script has no statements");
    }

    #[test]
    fn spans_cover_identifier_and_numbers() {
        let source = "motor.forward(-12.5)";
        assert_eq!(token_span(source, Location::new(14, 1, 15)), 14..19);
        assert_eq!(token_span(source, Location::new(13, 1, 14)), 13..14);
        assert_eq!(token_span(source, Location::new(20, 1, 21)), 20..20);
    }

    #[test]
    fn runtime_error_diagnostic_points_at_argument() {
        let source = "debug.pen(12)";
        let error = ScriptError::Runtime(
            RuntimeError::new(RuntimeErrorKind::WrongArgumentType, "Expected boolean")
                .at(Location::new(10, 1, 11)),
        );
        let diag = Diagnostic::from_script_error(source, &error);
        assert_eq!(diag.span, 10..12);
        assert_eq!(diag.message, "Expected boolean");
        assert_eq!(diag.label.as_deref(), Some("runtime error"));
    }

    #[test]
    fn render_produces_output() {
        let source = "motor.forward(10)\ndebug.color(red)";
        let error = SyntaxError::new("Unexpected 'red'", Location::new(30, 2, 13));
        let diags = vec![Diagnostic::from_syntax_error(source, &error)];
        let output = render_diagnostics(source, "patrol.rbs", &diags);
        assert!(output.contains("Unexpected 'red'"));
        assert!(output.contains("patrol.rbs"));
    }
}
