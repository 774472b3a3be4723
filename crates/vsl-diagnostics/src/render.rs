//! Source-excerpt rendering.
//!
//! Diagnostics are written to any [`termcolor::WriteColor`] sink, so the same
//! code path drives colored terminal output and plain text captured in tests
//! (through [`termcolor::NoColor`]).

use std::collections::{BTreeSet, HashMap};
use std::io;

use termcolor::{Color, ColorSpec, NoColor, WriteColor};
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::span::{Label, LabelStyle, LineColumn, SourceSpan};
use crate::{Diagnostic, Severity};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write diagnostic: {0}")]
    Io(#[from] io::Error),

    #[error("rendered diagnostic is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Print a closing `aborting due to` line in `render_all`.
    pub show_summary: bool,
    /// Lines longer than this many display columns are cut.
    pub max_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_summary: true,
            max_width: 120,
        }
    }
}

/// Source text by stream name.
#[derive(Debug, Default)]
pub struct SourceCache {
    files: HashMap<String, String>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert(name.into(), source.into());
    }

    pub fn get_source(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn line_column(&self, span: &SourceSpan) -> Option<LineColumn> {
        let source = self.get_source(&span.source)?;
        Some(offset_to_line_col(source, span.start))
    }
}

/// Converts a byte offset into a 1-indexed line and display column.
///
/// Columns count terminal cells, so wide characters advance by two.
pub fn offset_to_line_col(source: &str, offset: usize) -> LineColumn {
    let offset = clamp_to_char_boundary(source, offset);
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    LineColumn::new(line, before[line_start..].width() + 1)
}

fn clamp_to_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Byte range of the 1-indexed `line`, without its terminator.
fn line_range(source: &str, line: usize) -> Option<(usize, usize)> {
    let mut start = 0;
    for (index, text) in source.split('\n').enumerate() {
        if index + 1 == line {
            let text = text.strip_suffix('\r').unwrap_or(text);
            return Some((start, start + text.len()));
        }
        start += text.len() + 1;
    }
    None
}

pub struct Renderer {
    config: RenderConfig,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn severity_color(severity: Severity) -> Color {
        match severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Note => Color::Cyan,
            Severity::Help => Color::Green,
        }
    }

    fn colored<W: WriteColor>(out: &mut W, text: &str, color: Color, bold: bool) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        out.set_color(&spec)?;
        write!(out, "{text}")?;
        out.reset()
    }

    pub fn render<W: WriteColor>(
        &self,
        out: &mut W,
        diagnostic: &Diagnostic,
        sources: &SourceCache,
    ) -> Result<(), RenderError> {
        self.write_header(out, diagnostic)?;

        let source = diagnostic
            .spans
            .primary_span()
            .and_then(|span| Some((span, sources.get_source(&span.source)?)));

        let gutter = match source {
            Some((primary, text)) => self.write_excerpt(out, diagnostic, primary, text)?,
            None => 1,
        };

        for suggestion in &diagnostic.suggestions {
            write!(out, "{:gutter$} = ", "")?;
            Self::colored(out, "help", Self::severity_color(Severity::Help), true)?;
            writeln!(out, ": {}", suggestion.message)?;

            if let Some((_, text)) = source {
                for edit in &suggestion.edits {
                    let Some(fixed) = edit.apply(text) else { continue };
                    let line = offset_to_line_col(&fixed, edit.span.start).line;
                    if let Some((start, end)) = line_range(&fixed, line) {
                        writeln!(out, "{:gutter$} | {}", "", &fixed[start..end])?;
                    }
                }
            }
        }

        for child in &diagnostic.children {
            write!(out, "{:gutter$} = ", "")?;
            Self::colored(out, child.severity.prefix(), Self::severity_color(child.severity), true)?;
            writeln!(out, ": {}", child.message)?;
        }

        Ok(())
    }

    fn write_header<W: WriteColor>(&self, out: &mut W, diagnostic: &Diagnostic) -> io::Result<()> {
        let color = Self::severity_color(diagnostic.severity);
        let header = match &diagnostic.code {
            Some(code) => format!("{}[{code}]", diagnostic.severity.prefix()),
            None => diagnostic.severity.prefix().to_string(),
        };
        Self::colored(out, &header, color, true)?;
        writeln!(out, ": {}", diagnostic.message)
    }

    /// Writes the location line and every source line touched by a label.
    /// Returns the gutter width used.
    fn write_excerpt<W: WriteColor>(
        &self,
        out: &mut W,
        diagnostic: &Diagnostic,
        primary: &SourceSpan,
        source: &str,
    ) -> io::Result<usize> {
        let labels: Vec<&Label> = diagnostic
            .spans
            .labels()
            .iter()
            .filter(|label| label.span.source == primary.source)
            .collect();

        let start = offset_to_line_col(source, primary.start);
        let mut lines = BTreeSet::new();
        lines.insert(start.line);
        lines.insert(offset_to_line_col(source, primary.end).line);
        for label in &labels {
            lines.insert(offset_to_line_col(source, label.span.start).line);
        }

        let gutter = lines.last().map_or(1, |line| line.to_string().len());

        write!(out, "{:gutter$}", "")?;
        Self::colored(out, "-->", Color::Blue, true)?;
        writeln!(out, " {}:{}:{}", primary.source, start.line, start.column)?;
        writeln!(out, "{:gutter$} |", "")?;

        let mut previous: Option<usize> = None;
        for &line in &lines {
            let Some((line_start, line_end)) = line_range(source, line) else { continue };
            if previous.is_some_and(|p| line > p + 1) {
                writeln!(out, "...")?;
            }
            previous = Some(line);

            let text = self.truncate(&source[line_start..line_end]);
            Self::colored(out, &format!("{line:>gutter$}"), Color::Blue, true)?;
            writeln!(out, " | {text}")?;

            for label in labels
                .iter()
                .filter(|l| offset_to_line_col(source, l.span.start).line == line)
            {
                self.write_underline(out, label, diagnostic.severity, source, line_start, line_end, gutter)?;
            }
        }

        Ok(gutter)
    }

    #[allow(clippy::too_many_arguments)]
    fn write_underline<W: WriteColor>(
        &self,
        out: &mut W,
        label: &Label,
        severity: Severity,
        source: &str,
        line_start: usize,
        line_end: usize,
        gutter: usize,
    ) -> io::Result<()> {
        let start = clamp_to_char_boundary(source, label.span.start.max(line_start));
        let end = clamp_to_char_boundary(source, label.span.end.min(line_end)).max(start);
        let indent = source[line_start..start].width();
        let width = source[start..end].width().max(1);

        let (marker, color) = match label.style {
            LabelStyle::Primary => (severity.underline_char(), Self::severity_color(severity)),
            LabelStyle::Secondary => ('-', Color::Blue),
        };
        let underline: String = std::iter::repeat(marker).take(width).collect();

        write!(out, "{:gutter$} | {:indent$}", "", "")?;
        Self::colored(out, &underline, color, true)?;
        if label.message.is_empty() {
            writeln!(out)
        } else {
            write!(out, " ")?;
            Self::colored(out, &label.message, color, true)?;
            writeln!(out)
        }
    }

    fn truncate<'s>(&self, line: &'s str) -> std::borrow::Cow<'s, str> {
        if line.width() <= self.config.max_width {
            return line.into();
        }
        let mut width = 0;
        let mut cut = 0;
        for (index, ch) in line.char_indices() {
            width += unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if width > self.config.max_width.saturating_sub(3) {
                break;
            }
            cut = index + ch.len_utf8();
        }
        format!("{}...", &line[..cut]).into()
    }

    /// Renders every diagnostic, separated by blank lines, followed by an
    /// optional summary.
    pub fn render_all<'d, W: WriteColor>(
        &self,
        out: &mut W,
        diagnostics: impl IntoIterator<Item = &'d Diagnostic>,
        sources: &SourceCache,
    ) -> Result<(), RenderError> {
        let mut errors = 0;
        let mut warnings = 0;
        for (index, diagnostic) in diagnostics.into_iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            self.render(out, diagnostic, sources)?;
            match diagnostic.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
                _ => {}
            }
        }

        if !self.config.show_summary {
            return Ok(());
        }
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        if errors > 0 {
            writeln!(out)?;
            Self::colored(out, "error", Self::severity_color(Severity::Error), true)?;
            writeln!(out, ": aborting due to {errors} error{}", plural(errors))?;
        } else if warnings > 0 {
            writeln!(out)?;
            Self::colored(out, "warning", Self::severity_color(Severity::Warning), true)?;
            writeln!(out, ": {warnings} warning{} emitted", plural(warnings))?;
        }
        Ok(())
    }

    /// Renders without color into a string.
    pub fn render_to_string(&self, diagnostic: &Diagnostic, sources: &SourceCache) -> Result<String, RenderError> {
        let mut out = NoColor::new(Vec::new());
        self.render(&mut out, diagnostic, sources)?;
        Ok(String::from_utf8(out.into_inner())?)
    }
}
