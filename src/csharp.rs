//! Placeholder C# generator: returns success without writing any output.
//! The C# backend has no defined wire format yet.

use std::path::Path;

use crate::error::CompileError;
use crate::generator::{Generator, NewLineStyle};
use crate::ir::{Descriptor, Protocol};

pub struct CSharpGenerator;

impl Generator for CSharpGenerator {
    fn generate(
        &self,
        _protocol: &Protocol,
        _descriptor: &Descriptor,
        _output_dir: &Path,
        _newline: NewLineStyle,
    ) -> Result<(), CompileError> {
        Ok(())
    }
}
