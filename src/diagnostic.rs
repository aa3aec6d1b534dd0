//! The append-only diagnostic surface (errors and warnings), formatted the
//! way the driver writes them to stderr: `error:FILE:LINE: MSG`,
//! `warning:FILE:LINE: MSG`, or `error: MSG` when no file is known.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            file: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            file: None,
            line: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn at(mut self, file: impl AsRef<Path>, line: u32) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match (&self.file, self.line) {
            (Some(file), Some(line)) => {
                write!(f, "{tag}:{}:{line}: {}", file.display(), self.message)
            }
            _ => write!(f, "{tag}: {}", self.message),
        }
    }
}

/// Collects warnings during a compile. Errors are fatal and propagate as
/// `Err` immediately, so only warnings accumulate here (spec: "warnings
/// accumulate and do not affect exit status").
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    warnings: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        debug_assert_eq!(diagnostic.severity, Severity::Warning);
        self.warnings.push(diagnostic);
    }

    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
