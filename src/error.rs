//! Fatal, run-aborting errors. Non-fatal warnings live in [`crate::diagnostic`]
//! instead; a `CompileError` always means the compile stops with exit code 1.

use std::path::PathBuf;

use crate::diagnostic::Diagnostic;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("can not find protocol file `{}`", path.display())]
    ProtocolNotFound { path: PathBuf },

    #[error("can not read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can not write `{}`: {source}", path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: malformed xml: {message}", file.display())]
    Xml {
        file: PathBuf,
        line: u32,
        message: String,
    },

    #[error("{}:{line}: {message}", file.display())]
    Semantic {
        file: PathBuf,
        line: u32,
        message: String,
    },

    #[error("{message}")]
    Usage { message: String },
}

impl CompileError {
    #[must_use]
    pub fn semantic(file: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        CompileError::Semantic {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn xml(file: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        CompileError::Xml {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Renders this error into the wire diagnostic format used on stderr.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::ProtocolNotFound { .. }
            | CompileError::Io { .. }
            | CompileError::IoWrite { .. }
            | CompileError::Usage { .. } => Diagnostic::error(self.to_string()),
            CompileError::Xml { file, line, message }
            | CompileError::Semantic { file, line, message } => {
                Diagnostic::error(message.clone()).at(file, *line)
            }
        }
    }
}
