//! Source spans and labels attached to diagnostics.
//!
//! Spans are byte offsets into a single source stream. Line and column
//! information is only computed when a diagnostic is rendered.

use std::sync::Arc;

/// A byte range inside a named source stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    /// Name of the source stream (usually a file path).
    pub source: Arc<str>,
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl SourceSpan {
    pub fn new(source: impl Into<Arc<str>>, start: usize, end: usize) -> Self {
        Self {
            source: source.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// A zero-width span located right after this one.
    pub fn after(&self) -> SourceSpan {
        SourceSpan {
            source: self.source.clone(),
            start: self.end,
            end: self.end,
        }
    }

    /// Smallest span covering both spans.
    ///
    /// Panics if the spans belong to different sources.
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        assert_eq!(
            self.source, other.source,
            "cannot merge spans from different sources"
        );
        SourceSpan {
            source: self.source.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Whether a label marks the error site or a related location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LabelStyle {
    #[default]
    Primary,
    Secondary,
}

/// A span annotated with a short message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: SourceSpan,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// All labelled locations of one diagnostic.
///
/// The first primary label pushed becomes the anchor of the diagnostic, which
/// is where the rendered source excerpt is taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSpan {
    primary: Option<SourceSpan>,
    labels: Vec<Label>,
}

impl MultiSpan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_span(&self) -> Option<&SourceSpan> {
        self.primary.as_ref()
    }

    pub fn push_primary(&mut self, span: SourceSpan, message: impl Into<String>) {
        if self.primary.is_none() {
            self.primary = Some(span.clone());
        }
        self.labels.push(Label::primary(span, message));
    }

    pub fn push_secondary(&mut self, span: SourceSpan, message: impl Into<String>) {
        self.labels.push(Label::secondary(span, message));
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.labels.is_empty()
    }
}

/// 1-indexed line and display column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basics() {
        let span = SourceSpan::new("main.vsl", 10, 20);
        assert_eq!(&*span.source, "main.vsl");
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(span.contains(10));
        assert!(!span.contains(20));
    }

    #[test]
    fn test_span_after_is_empty() {
        let span = SourceSpan::new("main.vsl", 4, 9).after();
        assert_eq!((span.start, span.end), (9, 9));
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_merge() {
        let merged = SourceSpan::new("main.vsl", 10, 20).merge(&SourceSpan::new("main.vsl", 15, 30));
        assert_eq!((merged.start, merged.end), (10, 30));
    }

    #[test]
    fn test_multi_span_first_primary_wins() {
        let mut multi = MultiSpan::new();
        multi.push_secondary(SourceSpan::new("main.vsl", 0, 3), "declared here");
        multi.push_primary(SourceSpan::new("main.vsl", 10, 20), "first");
        multi.push_primary(SourceSpan::new("main.vsl", 30, 40), "second");

        assert_eq!(multi.labels().len(), 3);
        assert_eq!(multi.primary_span().map(|s| s.start), Some(10));
    }
}
