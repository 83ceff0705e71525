use serde::Serialize;

use crate::span::Span;

/// Number of characters shown on each side of the offending token.
const EXCERPT_WINDOW: usize = 20;

/// A compiler diagnostic (syntax error, semantic error, or ambiguity note).
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Malformed token stream.
    Syntax,
    /// Well-formed but meaningless program: undefined names, type faults, ...
    Semantic,
    /// Parser ambiguity notes. Never fatal.
    Ambiguity,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax error",
            DiagnosticKind::Semantic => "semantic error",
            DiagnosticKind::Ambiguity => "ambiguity",
        }
    }
}

impl Diagnostic {
    pub fn syntax(message: String, span: Span) -> Self {
        Self::with_kind(DiagnosticKind::Syntax, Severity::Error, message, span)
    }

    pub fn semantic(message: String, span: Span) -> Self {
        Self::with_kind(DiagnosticKind::Semantic, Severity::Error, message, span)
    }

    pub fn ambiguity(message: String, span: Span) -> Self {
        Self::with_kind(DiagnosticKind::Ambiguity, Severity::Warning, message, span)
    }

    fn with_kind(kind: DiagnosticKind, severity: Severity, message: String, span: Span) -> Self {
        Self {
            kind,
            severity,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Whether this diagnostic stops compilation.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error && self.kind != DiagnosticKind::Ambiguity
    }

    /// Locate the diagnostic in its source and cut the excerpt window.
    pub fn excerpt(&self, source: &str) -> Excerpt {
        Excerpt::locate(source, self.span)
    }

    /// Plain one-block rendering: position, message, source window, carets.
    pub fn render_plain(&self, sources: &SourceMap) -> String {
        let (name, text) = match sources.get(self.span.file_id) {
            Some(file) => (file.name.as_str(), file.text.as_str()),
            None => ("<unknown>", ""),
        };
        let ex = self.excerpt(text);
        let mut out = format!(
            "{}:{}:{}: {}: {}\n{}\n{}",
            name,
            ex.line,
            ex.column,
            self.kind.label(),
            self.message,
            ex.text,
            ex.marker
        );
        for note in &self.notes {
            out.push_str(&format!("\n  note: {}", note));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  help: {}", help));
        }
        out
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, sources: &SourceMap) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let (name, text) = match sources.get(self.span.file_id) {
            Some(file) => (file.name.as_str(), file.text.as_str()),
            None => ("<unknown>", ""),
        };

        let (kind, color) = match self.kind {
            DiagnosticKind::Ambiguity => (ReportKind::Advice, Color::Cyan),
            _ if self.severity == Severity::Warning => (ReportKind::Warning, Color::Yellow),
            _ => (ReportKind::Error, Color::Red),
        };

        let range = clamp_range(text, self.span);
        let mut report = Report::build(kind, name, range.start)
            .with_message(format!("{}: {}", self.kind.label(), self.message))
            .with_label(
                Label::new((name, range))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        let _ = report.finish().eprint((name, Source::from(text)));
    }

    pub fn to_report<'a>(&'a self, sources: &'a SourceMap) -> DiagnosticReport<'a> {
        let (name, text) = match sources.get(self.span.file_id) {
            Some(file) => (file.name.as_str(), file.text.as_str()),
            None => ("<unknown>", ""),
        };
        let ex = self.excerpt(text);
        DiagnosticReport {
            file: name,
            line: ex.line,
            column: ex.column,
            kind: self.kind,
            severity: self.severity,
            message: &self.message,
            notes: &self.notes,
            help: self.help.as_deref(),
            excerpt: ex.text,
        }
    }
}

/// Machine-readable view of a diagnostic, for `--format json`.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport<'a> {
    pub file: &'a str,
    pub line: usize,
    pub column: usize,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: &'a str,
    pub notes: &'a [String],
    pub help: Option<&'a str>,
    pub excerpt: String,
}

/// A positioned slice of source around a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Excerpt {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (in characters).
    pub column: usize,
    /// Source text within the window, confined to the offending line.
    pub text: String,
    /// Caret underline aligned under `text`.
    pub marker: String,
}

impl Excerpt {
    fn locate(source: &str, span: Span) -> Excerpt {
        let range = clamp_range(source, span);
        let start = range.start;

        let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = source[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(source.len());
        let line = source[..start].matches('\n').count() + 1;
        let column = source[line_start..start].chars().count() + 1;

        let token_end = range.end.min(line_end).max(start);
        let window_start = floor_char_boundary(source, start.saturating_sub(EXCERPT_WINDOW).max(line_start));
        let window_end = ceil_char_boundary(source, (token_end + EXCERPT_WINDOW).min(line_end));

        let text = source[window_start..window_end].to_string();
        let pad = source[window_start..start].chars().count();
        let width = source[start..token_end].chars().count().max(1);
        let marker = format!("{}{}", " ".repeat(pad), "^".repeat(width));

        Excerpt {
            line,
            column,
            text,
            marker,
        }
    }
}

fn clamp_range(source: &str, span: Span) -> std::ops::Range<usize> {
    let start = floor_char_boundary(source, (span.start as usize).min(source.len()));
    let end = ceil_char_boundary(source, (span.end as usize).clamp(start, source.len()));
    start..end
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// A source file known to one compilation.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

/// All sources of one compilation, addressed by `Span::file_id`.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> u16 {
        let id = self.files.len() as u16;
        self.files.push(SourceFile {
            name: name.into(),
            text: text.into(),
        });
        id
    }

    pub fn get(&self, file_id: u16) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], sources: &SourceMap) {
    for diag in diagnostics {
        diag.render(sources);
    }
}

/// Serialize a list of diagnostics as a JSON array.
pub fn diagnostics_to_json(
    diagnostics: &[Diagnostic],
    sources: &SourceMap,
) -> serde_json::Result<String> {
    let reports: Vec<DiagnosticReport<'_>> =
        diagnostics.iter().map(|d| d.to_report(sources)).collect();
    serde_json::to_string_pretty(&reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_construction() {
        let span = Span::new(0, 10, 15);
        let d = Diagnostic::semantic("types mismatch".to_string(), span);
        assert_eq!(d.kind, DiagnosticKind::Semantic);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.span.start, 10);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
        assert!(d.is_fatal());
    }

    #[test]
    fn test_ambiguity_is_not_fatal() {
        let d = Diagnostic::ambiguity("chained comparison".to_string(), Span::dummy());
        assert_eq!(d.severity, Severity::Warning);
        assert!(!d.is_fatal());
    }

    #[test]
    fn test_chained_builders() {
        let d = Diagnostic::syntax("unexpected token".to_string(), Span::new(0, 0, 5))
            .with_note("note 1".to_string())
            .with_help("help text".to_string())
            .with_note("note 2".to_string());
        assert_eq!(d.notes.len(), 2);
        assert_eq!(d.help.as_deref(), Some("help text"));
    }

    #[test]
    fn test_excerpt_marks_token() {
        let source = "let c = 1;\nlet d = 1 + \"a\";\n";
        // `1 + "a"` on line 2
        let start = source.find("1 + ").unwrap() as u32;
        let d = Diagnostic::semantic("mismatch".to_string(), Span::new(0, start, start + 7));
        let ex = d.excerpt(source);
        assert_eq!(ex.line, 2);
        assert_eq!(ex.column, 9);
        assert_eq!(ex.text, "let d = 1 + \"a\";");
        assert_eq!(ex.marker, "        ^^^^^^^");
    }

    #[test]
    fn test_excerpt_window_is_bounded() {
        let source = format!("{}BAD{}", "x".repeat(50), "y".repeat(50));
        let d = Diagnostic::syntax("bad".to_string(), Span::new(0, 50, 53));
        let ex = d.excerpt(&source);
        assert_eq!(ex.text.len(), 20 + 3 + 20);
        assert!(ex.text.contains("BAD"));
        assert_eq!(ex.marker.trim_start().len(), 3);
        assert_eq!(ex.marker.find('^'), Some(20));
    }

    #[test]
    fn test_excerpt_empty_span_gets_one_caret() {
        let d = Diagnostic::syntax("eof".to_string(), Span::new(0, 3, 3));
        let ex = d.excerpt("abc");
        assert_eq!(ex.marker, "   ^");
    }

    #[test]
    fn test_render_plain_includes_position() {
        let mut sources = SourceMap::new();
        let id = sources.add("main.tl", "let x = y;");
        let d = Diagnostic::semantic("identifier 'y' not defined".to_string(), Span::new(id, 8, 9));
        let text = d.render_plain(&sources);
        assert!(text.starts_with("main.tl:1:9: semantic error: identifier 'y' not defined"));
        assert!(text.ends_with("        ^"));
    }

    #[test]
    fn test_json_report() {
        let mut sources = SourceMap::new();
        let id = sources.add("main.tl", "let x = y;");
        let diags = vec![Diagnostic::semantic("undefined".to_string(), Span::new(id, 8, 9))];
        let json = diagnostics_to_json(&diags, &sources).unwrap();
        assert!(json.contains("\"kind\": \"semantic\""));
        assert!(json.contains("\"line\": 1"));
        assert!(json.contains("\"column\": 9"));
    }

    #[test]
    fn test_render_does_not_panic() {
        let mut sources = SourceMap::new();
        let id = sources.add("test.tl", "let x = 1 + \"a\";\n");
        let d = Diagnostic::semantic("types mismatch".to_string(), Span::new(id, 8, 15))
            .with_note("integer vs byte[]".to_string());
        d.render(&sources);
    }
}
