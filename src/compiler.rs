//! Library-level orchestration: binds the parser/linker to a chosen target
//! generator via a non-consuming builder.

use std::path::{Path, PathBuf};

use crate::csharp::CSharpGenerator;
use crate::diagnostic::DiagnosticSink;
use crate::error::CompileError;
use crate::generator::{Generator, NewLineStyle};
use crate::ir::Descriptor;
use crate::parser::compile_descriptor;
use crate::php::PhpGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
    Php,
    CSharp,
}

impl Language {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cpp" => Some(Language::Cpp),
            "php" => Some(Language::Php),
            "csharp" => Some(Language::CSharp),
            _ => None,
        }
    }
}

/// Non-consuming builder binding an entry protocol file, import search
/// path, target language, output directory, and line-ending style.
#[derive(Debug, Default)]
pub struct Compiler {
    entry: PathBuf,
    import_dirs: Vec<PathBuf>,
    output_dir: PathBuf,
    language: Option<Language>,
    newline: NewLine,
}

#[derive(Debug, Clone, Copy, Default)]
enum NewLine {
    #[default]
    Unix,
    Dos,
}

impl Compiler {
    #[must_use]
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Compiler { entry: entry.into(), output_dir: PathBuf::from("."), ..Compiler::default() }
    }

    #[must_use]
    pub fn import_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.import_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn output_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn language(&mut self, language: Language) -> &mut Self {
        self.language = Some(language);
        self
    }

    #[must_use]
    pub fn newline_unix(&mut self) -> &mut Self {
        self.newline = NewLine::Unix;
        self
    }

    #[must_use]
    pub fn newline_dos(&mut self) -> &mut Self {
        self.newline = NewLine::Dos;
        self
    }

    fn newline_style(&self) -> NewLineStyle {
        match self.newline {
            NewLine::Unix => NewLineStyle::Unix,
            NewLine::Dos => NewLineStyle::Dos,
        }
    }

    /// Parses and links the protocol graph, then invokes the selected
    /// generator on the root protocol. Returns any non-fatal warnings
    /// collected along the way.
    pub fn run(&self) -> Result<DiagnosticSink, CompileError> {
        let (descriptor, sink) = compile_descriptor(&self.entry, &self.import_dirs)?;
        let language = self.language.ok_or_else(|| CompileError::Usage {
            message: "no target language selected".to_string(),
        })?;
        generate(&descriptor, language, &self.output_dir, self.newline_style())?;
        Ok(sink)
    }
}

fn generate(
    descriptor: &Descriptor,
    language: Language,
    output_dir: &Path,
    newline: NewLineStyle,
) -> Result<(), CompileError> {
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    match language {
        Language::Cpp => crate::cpp::CppGenerator.generate(&protocol, descriptor, output_dir, newline),
        Language::Php => PhpGenerator.generate(&protocol, descriptor, output_dir, newline),
        Language::CSharp => CSharpGenerator.generate(&protocol, descriptor, output_dir, newline),
    }
}
