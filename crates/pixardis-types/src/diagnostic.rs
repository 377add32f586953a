use std::fmt;

/// A position in the original source text. Columns and lines are 1-based,
/// matching what the host editor shows a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }
}

/// The five diagnostic classes named in the facade's error format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Syntax,
    Semantic,
    Type,
    NameResolution,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::Lexical => "Lexical",
            DiagnosticKind::Syntax => "Syntax",
            DiagnosticKind::Semantic => "Semantic",
            DiagnosticKind::Type => "Type",
            DiagnosticKind::NameResolution => "Name Resolution",
        };
        f.write_str(s)
    }
}

/// One compile-time error, ready to be rendered in the editor-facing format:
///
/// ```text
/// In Line <N>: <original source line>
/// <Kind> Error: <message>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
    pub source_line: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>, source_line: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            span,
            message: message.into(),
            source_line: source_line.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "In Line {}: {}", self.span.line, self.source_line)?;
        write!(f, "{} Error: {}", self.kind, self.message)
    }
}

/// Accumulates diagnostics across a compiler pass instead of bailing on the
/// first error, so that `compile()` can report every problem it finds in one
/// attempt. Each pass (lexer, parser, semantic analyzer) is handed a `&mut
/// DiagnosticSink` rather than returning `Result` on the first failure.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Renders a full diagnostic list the way the facade hands errors back to the
/// host: one block per diagnostic, separated by a blank line, in source order.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.to_string()).collect()
}
