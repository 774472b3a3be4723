//! Fix-it suggestions.
//!
//! A suggestion is a described set of mechanical edits. Some suggestions need
//! input from the user (a new name, a type); those list their parameters in
//! `arguments` and keep `<name>` placeholders in the edit text until
//! [`Suggestion::fill`] substitutes them.

use crate::span::SourceSpan;

/// How safely a suggestion can be applied without review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Applicability {
    /// Always correct, can be applied by tooling.
    MachineApplicable,
    /// Correct once the user fills in the listed arguments.
    HasPlaceholders,
    /// Plausible, but the user should check it.
    #[default]
    MaybeIncorrect,
}

impl Applicability {
    pub fn is_machine_applicable(&self) -> bool {
        matches!(self, Applicability::MachineApplicable)
    }
}

/// The shape of a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Delete the covered text.
    Remove,
    /// Replace the covered text.
    Replace,
    /// Insert text right after the covered text.
    InsertAfter,
}

/// One concrete text edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionEdit {
    pub kind: EditKind,
    pub span: SourceSpan,
    pub new_text: String,
}

impl SuggestionEdit {
    pub fn remove(span: SourceSpan) -> Self {
        Self {
            kind: EditKind::Remove,
            span,
            new_text: String::new(),
        }
    }

    pub fn replace(span: SourceSpan, new_text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Replace,
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert_after(span: &SourceSpan, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::InsertAfter,
            span: span.after(),
            new_text: text.into(),
        }
    }

    /// Applies the edit to `source`, returning the rewritten text.
    ///
    /// Returns `None` if the span is not a valid range of `source`.
    pub fn apply(&self, source: &str) -> Option<String> {
        let prefix = source.get(..self.span.start)?;
        let suffix = source.get(self.span.end..)?;
        Some(format!("{prefix}{}{suffix}", self.new_text))
    }
}

/// A described fix for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub message: String,
    pub applicability: Applicability,
    /// Names of the values the user has to supply, in order.
    pub arguments: Vec<String>,
    pub edits: Vec<SuggestionEdit>,
}

impl Suggestion {
    pub fn new(message: impl Into<String>, applicability: Applicability) -> Self {
        Self {
            message: message.into(),
            applicability,
            arguments: Vec::new(),
            edits: Vec::new(),
        }
    }

    pub fn machine_applicable(message: impl Into<String>) -> Self {
        Self::new(message, Applicability::MachineApplicable)
    }

    pub fn maybe_incorrect(message: impl Into<String>) -> Self {
        Self::new(message, Applicability::MaybeIncorrect)
    }

    /// Declares a user-supplied argument. The suggestion becomes
    /// [`Applicability::HasPlaceholders`].
    pub fn with_argument(mut self, name: impl Into<String>) -> Self {
        self.arguments.push(name.into());
        self.applicability = Applicability::HasPlaceholders;
        self
    }

    pub fn with_edit(mut self, edit: SuggestionEdit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn can_auto_apply(&self) -> bool {
        self.applicability.is_machine_applicable() && !self.edits.is_empty()
    }

    /// Substitutes `<argument>` placeholders with the given values.
    ///
    /// Returns `None` if the number of values does not match the declared
    /// arguments.
    pub fn fill(&self, values: &[&str]) -> Option<Suggestion> {
        if values.len() != self.arguments.len() {
            return None;
        }

        let edits = self
            .edits
            .iter()
            .map(|edit| {
                let mut text = edit.new_text.clone();
                for (name, value) in self.arguments.iter().zip(values) {
                    text = text.replace(&format!("<{name}>"), value);
                }
                SuggestionEdit {
                    new_text: text,
                    ..edit.clone()
                }
            })
            .collect();

        Some(Suggestion {
            message: self.message.clone(),
            applicability: Applicability::MachineApplicable,
            arguments: Vec::new(),
            edits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(start: usize, end: usize) -> SourceSpan {
        SourceSpan::new("main.vsl", start, end)
    }

    #[test]
    fn test_remove_edit() {
        let edit = SuggestionEdit::remove(span(0, 9));
        assert_eq!(edit.apply("@unknown class A {}").as_deref(), Some(" class A {}"));
    }

    #[test]
    fn test_insert_after_edit() {
        let source = "func f(a) {}";
        let edit = SuggestionEdit::insert_after(&span(7, 8), ": Int");
        assert_eq!(edit.apply(source).as_deref(), Some("func f(a: Int) {}"));
    }

    #[test]
    fn test_out_of_bounds_edit() {
        let edit = SuggestionEdit::replace(span(5, 50), "x");
        assert_eq!(edit.apply("short"), None);
    }

    #[test]
    fn test_placeholder_fill() {
        let suggestion = Suggestion::maybe_incorrect("rename annotation")
            .with_argument("new name")
            .with_edit(SuggestionEdit::replace(span(1, 8), "<new name>"));

        assert_eq!(suggestion.applicability, Applicability::HasPlaceholders);
        assert!(!suggestion.can_auto_apply());

        let filled = suggestion.fill(&["primitive"]).unwrap();
        assert!(filled.can_auto_apply());
        assert_eq!(filled.edits[0].new_text, "primitive");
        assert!(suggestion.fill(&[]).is_none());
    }
}
