//! Error handling for Stride
//!
//! Every front-end failure is one of four kinds. Each carries a message,
//! the source ranges it points at and an optional "did you mean" hint.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::utils::{SourceFile, Span};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Syntax,
    Type,
    Semantic,
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Type => "Type",
            ErrorKind::Semantic => "Semantic",
            ErrorKind::Runtime => "Runtime",
        };
        f.write_str(name)
    }
}

/// A range in a source file that a diagnostic points at
#[derive(Debug, Clone)]
pub struct SourceReference {
    pub file: Arc<SourceFile>,
    pub span: Span,
}

/// Payload shared by all taxonomy variants
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    pub references: Vec<SourceReference>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            references: Vec::new(),
            suggestion: None,
        }
    }
}

/// Compiler error
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ==================== Parser Errors ====================

    #[error("Syntax error: {}", .0.message)]
    Syntax(Diagnostic),

    // ==================== Semantic Errors ====================

    #[error("Type error: {}", .0.message)]
    Type(Diagnostic),

    #[error("Semantic error: {}", .0.message)]
    Semantic(Diagnostic),

    // ==================== Codegen Errors ====================

    #[error("Runtime error: {}", .0.message)]
    Runtime(Diagnostic),

    // ==================== Driver Errors ====================

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let diagnostic = Diagnostic::new(message);
        match kind {
            ErrorKind::Syntax => Error::Syntax(diagnostic),
            ErrorKind::Type => Error::Type(diagnostic),
            ErrorKind::Semantic => Error::Semantic(diagnostic),
            ErrorKind::Runtime => Error::Runtime(diagnostic),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    /// Attach another source range
    pub fn with_reference(mut self, file: &Arc<SourceFile>, span: Span) -> Self {
        if let Some(diagnostic) = self.diagnostic_mut() {
            diagnostic.references.push(SourceReference {
                file: Arc::clone(file),
                span,
            });
        }
        self
    }

    /// Attach a range only if the error does not point anywhere yet
    pub fn or_reference(self, file: &Arc<SourceFile>, span: Span) -> Self {
        if self.references().is_empty() {
            self.with_reference(file, span)
        } else {
            self
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        if let Some(diagnostic) = self.diagnostic_mut() {
            diagnostic.suggestion = Some(suggestion.into());
        }
        self
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Syntax(_) => Some(ErrorKind::Syntax),
            Error::Type(_) => Some(ErrorKind::Type),
            Error::Semantic(_) => Some(ErrorKind::Semantic),
            Error::Runtime(_) => Some(ErrorKind::Runtime),
            Error::Io(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Syntax(d) | Error::Type(d) | Error::Semantic(d) | Error::Runtime(d) => {
                &d.message
            }
            Error::Io(message) => message,
        }
    }

    pub fn references(&self) -> &[SourceReference] {
        match self.diagnostic() {
            Some(d) => &d.references,
            None => &[],
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.diagnostic().and_then(|d| d.suggestion.as_deref())
    }

    /// Get the primary span associated with this error
    pub fn span(&self) -> Option<Span> {
        self.references().first().map(|r| r.span)
    }

    fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Syntax(d) | Error::Type(d) | Error::Semantic(d) | Error::Runtime(d) => Some(d),
            Error::Io(_) => None,
        }
    }

    fn diagnostic_mut(&mut self) -> Option<&mut Diagnostic> {
        match self {
            Error::Syntax(d) | Error::Type(d) | Error::Semantic(d) | Error::Runtime(d) => Some(d),
            Error::Io(_) => None,
        }
    }

    // ==================== Rendering ====================

    /// Render the error with a caret-annotated excerpt per reference
    pub fn render(&self) -> String {
        let mut out = self.to_string();
        out.push('\n');

        for reference in self.references() {
            let file = &reference.file;
            let (line, column) = file.line_col(reference.span.start);
            let text = file.line_text(line);
            let gutter = line.to_string().len();

            let _ = writeln!(out, "{:gutter$}--> {}:{}:{}", "", file.path, line, column);
            let _ = writeln!(out, "{:gutter$} ┃", "");
            let _ = writeln!(out, "{} ┃ {}", line, text);

            let line_chars = text.chars().count();
            let available = line_chars.saturating_sub(column - 1).max(1);
            let width = file
                .snippet(reference.span.start, reference.span.end)
                .chars()
                .count()
                .clamp(1, available);
            let _ = writeln!(
                out,
                "{:gutter$} ┃ {}{}",
                "",
                " ".repeat(column - 1),
                "^".repeat(width)
            );
        }

        if let Some(suggestion) = self.suggestion() {
            let _ = writeln!(out, "help: {}", suggestion);
        }
        out
    }

    /// Machine-readable form of the error
    pub fn report(&self) -> Report {
        let primary = self.references().first();
        let location = primary.map(|r| {
            let (line, column) = r.file.line_col(r.span.start);
            (r.file.path.clone(), line, column, r.span.len())
        });

        Report {
            kind: self.kind(),
            message: self.message().to_string(),
            file: location.as_ref().map(|l| l.0.clone()),
            line: location.as_ref().map(|l| l.1),
            column: location.as_ref().map(|l| l.2),
            length: location.as_ref().map(|l| l.3),
            suggestion: self.suggestion().map(str::to_string),
        }
    }
}

/// Serializable diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub kind: Option<ErrorKind>,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub length: Option<usize>,
    pub suggestion: Option<String>,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_and_message() {
        let err = Error::type_error("Cannot dereference non-pointer type");
        assert_eq!(err.kind(), Some(ErrorKind::Type));
        assert_eq!(err.message(), "Cannot dereference non-pointer type");
        assert_eq!(err.to_string(), "Type error: Cannot dereference non-pointer type");
    }

    #[test]
    fn test_render_points_at_span() {
        let file = SourceFile::new(0, "test.sr", "let a: i32 = 10L;");
        let err = Error::type_error("bad initializer")
            .with_reference(&file, Span::new(13, 16, 0))
            .with_suggestion("Did you mean 'b'?");

        let rendered = err.render();
        assert_eq!(
            rendered,
            "Type error: bad initializer\n \
             --> test.sr:1:14\n  \
             ┃\n\
             1 ┃ let a: i32 = 10L;\n  \
             ┃              ^^^\n\
             help: Did you mean 'b'?\n"
        );
    }

    #[test]
    fn test_or_reference_keeps_first() {
        let file = SourceFile::new(0, "test.sr", "abc def");
        let err = Error::semantic("dup")
            .with_reference(&file, Span::new(4, 7, 0))
            .or_reference(&file, Span::new(0, 3, 0));
        assert_eq!(err.references().len(), 1);
        assert_eq!(err.span(), Some(Span::new(4, 7, 0)));
    }

    #[test]
    fn test_report_location() {
        let file = SourceFile::new(0, "x.sr", "a\nbb cc");
        let report = Error::syntax("oops").with_reference(&file, Span::new(5, 7, 0)).report();
        assert_eq!(report.line, Some(2));
        assert_eq!(report.column, Some(4));
        assert_eq!(report.length, Some(2));
        assert_eq!(report.kind, Some(ErrorKind::Syntax));
    }
}
