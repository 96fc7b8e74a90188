//! The shared diagnostic model (spec.md §6 "Diagnostic format", §7 "Error
//! handling design").
//!
//! Diagnostics are values, never exceptions: every analysis pass collects
//! them into a [`Handler`] and keeps going. A diagnostic carries a stable
//! `[FAMILY-NNNN]` code embedded in its message, an optional module/filename,
//! and an optional primary (and end) source location.

use crate::span::Span;
use std::fmt;

/// Severity of a diagnostic. Only `Error` causes code generation to be
/// suppressed and the process to exit non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A stable diagnostic code such as `LEX-0060` or `TYP-0104`.
///
/// Families are `LEX`, `PAR`, `RES`, `SIG`, `TYP`, `DRV`, `ICE`, matching
/// spec.md §6's error code families exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    pub family: &'static str,
    pub number: u32,
}

impl DiagnosticCode {
    pub const fn new(family: &'static str, number: u32) -> Self {
        Self { family, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.family, self.number)
    }
}

/// A single recoverable, user-visible diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub module_name: Option<String>,
    pub filename: Option<String>,
    pub span: Option<Span>,
}

impl Diagnostic {
    /// One-line header in the shape the driver/CLI renders before any
    /// source snippet: `file:line:col(module): kind: message`.
    pub fn format_header(&self) -> String {
        let mut loc = String::new();
        if let Some(filename) = &self.filename {
            loc.push_str(filename);
        }
        if let Some(span) = &self.span {
            loc.push_str(&format!(":{}:{}", span.start_line, span.start_column));
            if let Some(module) = &self.module_name {
                loc.push_str(&format!("({module})"));
            }
        }
        if !loc.is_empty() {
            loc.push_str(": ");
        }
        format!("{loc}{}: {}", self.level, self.message)
    }
}

/// Fluent constructor for a [`Diagnostic`], mirroring the original
/// implementation's `diag_from_node`/`diag_from_token` helpers.
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    module_name: Option<String>,
    filename: Option<String>,
    span: Option<Span>,
}

impl DiagnosticBuilder {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Level::Error, code, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Level::Warning, code, message)
    }

    fn new(level: Level, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            level,
            message: format!("[{code}] {}", message.into()),
            module_name: None,
            filename: None,
            span: None,
        }
    }

    pub fn module(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn maybe_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic {
            level: self.level,
            message: self.message,
            module_name: self.module_name,
            filename: self.filename,
            span: self.span,
        }
    }

    /// Build the diagnostic and push it straight onto a [`Handler`].
    pub fn emit(self, handler: &mut Handler) {
        handler.push(self.build());
    }
}

/// Collects diagnostics for a single pass or an entire compilation.
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
