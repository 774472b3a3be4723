//! Conversion of semantic errors and warnings into rich diagnostics.
//!
//! The scope graph reports byte spans only. The caller names the source
//! the spans point into so the renderer can find the excerpt.

use vsl_ast::Span;
use vsl_diagnostics::span::SourceSpan;
use vsl_diagnostics::suggestion::{Suggestion, SuggestionEdit};
use vsl_diagnostics::Diagnostic;

use crate::error::{ErrorKind, FixIt, FixItEdit, TransformError, Warning};

impl TransformError {
    /// Converts the error into a diagnostic anchored in `source_name`.
    pub fn to_diagnostic(&self, source_name: &str) -> Diagnostic {
        let diagnostic = match self.kind {
            Some(kind) => Diagnostic::error(kind.code(), &self.message),
            None => Diagnostic::bare_error(&self.message),
        };
        if self.span.is_dummy() {
            return diagnostic;
        }

        let label = self.kind.map(primary_label).unwrap_or_default();
        diagnostic
            .with_primary_span(source_span(source_name, self.span), label)
            .with_suggestions(self.fixits.iter().map(|fixit| suggestion(source_name, fixit)))
    }
}

impl Warning {
    pub fn to_diagnostic(&self, source_name: &str) -> Diagnostic {
        let diagnostic = Diagnostic::warning(self.kind.code(), &self.message);
        if self.span.is_dummy() {
            return diagnostic;
        }
        diagnostic.with_primary_span(source_span(source_name, self.span), "")
    }
}

fn primary_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::DuplicateDeclaration => "redeclared here",
        ErrorKind::UndeclaredIdentifier => "not found in this scope",
        ErrorKind::AmbiguousExpression | ErrorKind::AmbiguousCall => "ambiguous",
        ErrorKind::NoValidOverload => "no matching overload",
        ErrorKind::InvalidAccess => "not accessible here",
        _ => "",
    }
}

fn source_span(source_name: &str, span: Span) -> SourceSpan {
    SourceSpan::new(source_name, span.start, span.end)
}

fn suggestion(source_name: &str, fixit: &FixIt) -> Suggestion {
    let span = source_span(source_name, fixit.span);
    let edit = match &fixit.edit {
        FixItEdit::Remove => SuggestionEdit::remove(span),
        FixItEdit::Replace(text) => SuggestionEdit::replace(span, text.as_str()),
        FixItEdit::InsertAfter(text) => SuggestionEdit::insert_after(&span, text.as_str()),
    };
    match &fixit.argument {
        Some(argument) => Suggestion::maybe_incorrect(&fixit.description)
            .with_argument(argument.as_str())
            .with_edit(edit),
        None => Suggestion::machine_applicable(&fixit.description).with_edit(edit),
    }
}
