//! VSL Diagnostics
//!
//! Structured diagnostics produced by the VSL semantic core:
//!
//! - `Diagnostic`: severity, optional error code, message, labelled spans,
//!   fix-it suggestions and attached notes
//! - `Diagnostics`: an ordered collection with error/warning accounting
//! - `span`: source spans and labels
//! - `suggestion`: fix-its built from remove / replace / insert-after edits
//! - `render`: plain source-excerpt rendering to any `termcolor` sink
//!
//! # Example
//!
//! ```rust
//! use vsl_diagnostics::{Diagnostic, Severity};
//! use vsl_diagnostics::span::SourceSpan;
//!
//! let span = SourceSpan::new("main.vsl", 6, 9);
//! let diagnostic = Diagnostic::error("E0001", "duplicate declaration of `Foo`")
//!     .with_primary_span(span, "redeclared here");
//!
//! assert_eq!(diagnostic.severity, Severity::Error);
//! assert_eq!(diagnostic.category(), Some(vsl_diagnostics::ErrorCategory::Declaration));
//! ```

pub mod render;
pub mod span;
pub mod suggestion;

use span::{MultiSpan, SourceSpan};
use suggestion::Suggestion;

/// Diagnostic severity. Only errors abort a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Severity {
    Help,
    Note,
    Warning,
    #[default]
    Error,
}

impl Severity {
    pub fn prefix(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        }
    }

    pub fn underline_char(&self) -> char {
        match self {
            Severity::Error => '^',
            Severity::Warning => '~',
            Severity::Note => '-',
            Severity::Help => '+',
        }
    }

    pub fn blocks_compilation(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

/// A compiler message anchored to source locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable error code (e.g. "E0001").
    pub code: Option<String>,
    pub severity: Severity,
    pub message: String,
    pub spans: MultiSpan,
    pub suggestions: Vec<Suggestion>,
    /// Notes and help messages attached to this diagnostic.
    pub children: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            spans: MultiSpan::new(),
            suggestions: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Some(code.into()), message)
    }

    /// An error without a machine-readable code.
    pub fn bare_error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, None, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, Some(code.into()), message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, None, message)
    }

    pub fn help(message: impl Into<String>) -> Self {
        Self::new(Severity::Help, None, message)
    }

    pub fn with_primary_span(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.spans.push_primary(span, message);
        self
    }

    pub fn with_secondary_span(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.spans.push_secondary(span, message);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = Suggestion>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }

    pub fn with_child(mut self, child: Diagnostic) -> Self {
        self.children.push(child);
        self
    }

    /// Re-labels a warning as an error, keeping code, spans and fix-its.
    pub fn promoted(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.code.as_deref().and_then(ErrorCategory::from_code)
    }

    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }
}

/// Error code families. The first digit of an `EXXXX` code selects the
/// family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// E0XXX: declarations and redeclarations
    Declaration,
    /// E1XXX: type deduction and overload resolution
    TypeResolution,
    /// E2XXX: structural misuse (`self`, initializers, lvalues, casts)
    Structural,
    /// E3XXX: annotations
    Annotation,
    /// E4XXX: generics and tuples
    Generics,
    /// E5XXX: access control and inheritance
    Inheritance,
    /// E6XXX: modules and imports
    Modules,
    /// W0XXX: warnings
    Warning,
    /// E9XXX: internal compiler errors
    Internal,
}

impl ErrorCategory {
    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let letter = chars.next()?;
        let digit = chars.next()?;
        match (letter, digit) {
            ('W', _) => Some(ErrorCategory::Warning),
            ('E', '0') => Some(ErrorCategory::Declaration),
            ('E', '1') => Some(ErrorCategory::TypeResolution),
            ('E', '2') => Some(ErrorCategory::Structural),
            ('E', '3') => Some(ErrorCategory::Annotation),
            ('E', '4') => Some(ErrorCategory::Generics),
            ('E', '5') => Some(ErrorCategory::Inheritance),
            ('E', '6') => Some(ErrorCategory::Modules),
            ('E', '9') => Some(ErrorCategory::Internal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Declaration => "Declaration",
            ErrorCategory::TypeResolution => "Type Resolution",
            ErrorCategory::Structural => "Structural",
            ErrorCategory::Annotation => "Annotation",
            ErrorCategory::Generics => "Generics/Tuples",
            ErrorCategory::Inheritance => "Access/Inheritance",
            ErrorCategory::Modules => "Modules",
            ErrorCategory::Warning => "Warning",
            ErrorCategory::Internal => "Internal",
        }
    }
}

/// Ordered collection of diagnostics produced while analysing one unit.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert_eq!(Severity::Error.prefix(), "error");
        assert_eq!(Severity::Warning.prefix(), "warning");
        assert!(Severity::Error.blocks_compilation());
        assert!(!Severity::Warning.blocks_compilation());
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error("E1002", "no valid overload")
            .with_primary_span(SourceSpan::new("main.vsl", 4, 9), "called here")
            .with_secondary_span(SourceSpan::new("main.vsl", 20, 24), "candidate")
            .with_child(Diagnostic::note("operators are looked up on operand types"));

        assert_eq!(diag.code.as_deref(), Some("E1002"));
        assert_eq!(diag.spans.labels().len(), 2);
        assert_eq!(diag.children.len(), 1);
        assert!(!diag.has_suggestions());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(ErrorCategory::from_code("E0001"), Some(ErrorCategory::Declaration));
        assert_eq!(ErrorCategory::from_code("E1003"), Some(ErrorCategory::TypeResolution));
        assert_eq!(ErrorCategory::from_code("W0001"), Some(ErrorCategory::Warning));
        assert_eq!(ErrorCategory::from_code("E7"), None);
        assert_eq!(ErrorCategory::from_code(""), None);
    }

    #[test]
    fn test_diagnostics_counts() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("W0001", "deprecated"));
        diagnostics.push(Diagnostic::warning("W0002", "protected"));
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.warning_count(), 2);

        diagnostics.push(Diagnostic::warning("W0001", "deprecated").promoted());
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.len(), 3);
    }
}
