//! The uniform code-generation contract: given a resolved protocol, an
//! output directory, and a line-ending style, emit source files.

use std::path::Path;

use crate::error::CompileError;
use crate::ir::{Descriptor, Protocol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewLineStyle {
    Unix,
    Dos,
}

impl NewLineStyle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NewLineStyle::Unix => "\n",
            NewLineStyle::Dos => "\r\n",
        }
    }
}

pub trait Generator {
    fn generate(
        &self,
        protocol: &Protocol,
        descriptor: &Descriptor,
        output_dir: &Path,
        newline: NewLineStyle,
    ) -> Result<(), CompileError>;
}
