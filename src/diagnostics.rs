use std::fmt;

use thiserror::Error;

/// Represents a byte span within a source file, plus the line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl SourceSpan {
    pub const fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    /// Span covering `self` through `other`.
    pub fn to(self, other: SourceSpan) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
        }
    }
}

/// Classification of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax,
    UndefinedVariable,
    Arity,
    Type,
    DivisionByZero,
    Io,
    Runtime,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "SyntaxError",
            DiagnosticKind::UndefinedVariable => "UndefinedVariableError",
            DiagnosticKind::Arity => "ArityError",
            DiagnosticKind::Type => "TypeError",
            DiagnosticKind::DivisionByZero => "DivisionByZeroError",
            DiagnosticKind::Io => "IOError",
            DiagnosticKind::Runtime => "RuntimeError",
        }
    }
}

/// Rich diagnostic information surfaced to end users.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
            notes: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Type, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Runtime, message)
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Attaches `span` unless the diagnostic already points somewhere.
    pub fn or_span(mut self, span: SourceSpan) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)?;
        if let Some(span) = self.span {
            write!(f, " (line {})", span.line)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the ScriptIt toolchain.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// The diagnostic kind, with host I/O failures reported as `Io`.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ScriptError::Diagnostic(diag) => diag.kind,
            ScriptError::Io(_) => DiagnosticKind::Io,
        }
    }

    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            ScriptError::Diagnostic(diag) => diag.span,
            ScriptError::Io(_) => None,
        }
    }

    pub(crate) fn or_span(self, span: SourceSpan) -> Self {
        match self {
            ScriptError::Diagnostic(diag) => ScriptError::Diagnostic(diag.or_span(span)),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;
