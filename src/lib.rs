//! `exchangec`: a schema compiler. Consumes an XML protocol definition
//! (enums, structs, tagged struct maps) and emits C++ source implementing
//! serialization, deserialization, cloning, and debug-dumping for the
//! declared types, against the external `brickred::exchange::BaseStruct`
//! contract. PHP and C# back ends exist as placeholders only.
//!
//! ```no_run
//! use exchangec::compiler::{Compiler, Language};
//!
//! let mut compiler = Compiler::new("protocol.xml");
//! compiler.language(Language::Cpp).output_dir("out");
//! compiler.run().expect("compiles");
//! ```

pub mod compiler;
pub mod cpp;
pub mod csharp;
pub mod diagnostic;
pub mod error;
pub mod fs_util;
pub mod generator;
pub mod ident;
pub mod ir;
pub mod parser;
pub mod php;
pub mod xml;

pub use compiler::{Compiler, Language};
pub use diagnostic::{Diagnostic, DiagnosticSink, Severity};
pub use error::CompileError;
pub use generator::NewLineStyle;
