//! Placeholder PHP generator: returns success without writing any output.
//! The PHP backend has no defined wire format yet.

use std::path::Path;

use crate::error::CompileError;
use crate::generator::{Generator, NewLineStyle};
use crate::ir::{Descriptor, Protocol};

pub struct PhpGenerator;

impl Generator for PhpGenerator {
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
