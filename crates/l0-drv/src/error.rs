//! Driver-level load failures (spec.md §4.3, §7 "Error handling design"),
//! grounded on the original implementation's `FileNotFoundError` /
//! `ValueError` / `ImportCycleError` split (`l0_driver.py`).
//!
//! These are distinct from both [`l0_util::Diagnostic`] (a recoverable,
//! user-visible compile error inside an accepted source file) and
//! [`l0_util::IceError`] (an internal invariant violated after the
//! compiler already accepted the program): a `DriverError` means the
//! compiler never got as far as lexing/parsing at all for some module.
//! [`crate::compile::compile`] converts each variant into a `[DRV-NNNN]`
//! diagnostic at the boundary, so callers that only want diagnostics never
//! need to match on this enum directly.

use std::path::PathBuf;

use l0_util::{DiagnosticBuilder, DiagnosticCode};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("module '{module}' not found (expected {relpath:?} under a search root)")]
    ModuleNotFound { module: String, relpath: PathBuf },

    #[error("file '{path}' declares module '{declared}', but was loaded as '{expected}'")]
    ModuleNameMismatch { path: PathBuf, declared: String, expected: String },

    #[error("import cycle detected: {}", cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },

    #[error("could not read '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("'{path}' is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },

    /// The parser gave up on the whole file (`Parser::parse_module`
    /// returned `None`) — the syntax errors that caused it are already in
    /// the [`l0_util::Handler`] this module was loaded against, so this
    /// variant exists only to stop the import walk, not to explain itself.
    #[error("'{path}' could not be parsed")]
    ParseFailed { path: PathBuf },
}

impl DriverError {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            DriverError::ModuleNotFound { .. } => DiagnosticCode::new("DRV", 10),
            DriverError::ModuleNameMismatch { .. } => DiagnosticCode::new("DRV", 20),
            DriverError::ImportCycle { .. } => DiagnosticCode::new("DRV", 30),
            DriverError::Io { .. } | DriverError::InvalidUtf8 { .. } => DiagnosticCode::new("DRV", 40),
            DriverError::ParseFailed { .. } => DiagnosticCode::new("DRV", 50),
        }
    }

    /// Renders this failure as a single error-level diagnostic, matching
    /// the original's convention of surfacing `DRV-NNNN` codes through the
    /// same diagnostic channel as every other pass.
    pub fn to_diagnostic(&self) -> l0_util::Diagnostic {
        DiagnosticBuilder::error(self.code(), self.to_string()).build()
    }
}
