//! C++ emitter: the only fully-specified code-generation target. Produces a
//! header (`<proto>.h`) and an implementation file (`<proto>.cc`) per
//! protocol.

pub mod header;
pub mod source;

use std::path::Path;

use crate::error::CompileError;
use crate::generator::{Generator, NewLineStyle};
use crate::ident::sanitize_for_guard;
use crate::ir::{Descriptor, FieldType, PrimitiveType, Protocol, TypeRef};

pub struct CppGenerator;

impl Generator for CppGenerator {
    fn generate(
        &self,
        protocol: &Protocol,
        descriptor: &Descriptor,
        output_dir: &Path,
        newline: NewLineStyle,
    ) -> Result<(), CompileError> {
        let header_lines = header::render(protocol, descriptor);
        let source_lines = source::render(protocol, descriptor);

        let header_path = output_dir.join(format!("{}.h", protocol.base_name));
        let source_path = output_dir.join(format!("{}.cc", protocol.base_name));
        crate::fs_util::write_all(&header_path, &join_lines(&header_lines, newline))?;
        crate::fs_util::write_all(&source_path, &join_lines(&source_lines, newline))?;
        Ok(())
    }
}

fn join_lines(lines: &[String], newline: NewLineStyle) -> String {
    let mut s = lines.join(newline.as_str());
    s.push_str(newline.as_str());
    s
}

/// Include guard macro: `BRICKRED_EXCHANGE_GENERATED_<NS_PARTS>_<NAME>_H`.
#[must_use]
pub(crate) fn include_guard(protocol: &Protocol) -> String {
    let mut pieces: Vec<String> = Vec::new();
    if let Some(ns) = protocol.cpp_namespace() {
        pieces.extend(ns.parts.iter().cloned());
    }
    pieces.push(sanitize_for_guard(&protocol.base_name));
    format!("BRICKRED_EXCHANGE_GENERATED_{}_H", pieces.join("_")).to_uppercase()
}

#[must_use]
pub(crate) fn namespace_parts(protocol: &Protocol) -> Vec<String> {
    protocol.cpp_namespace().map(|ns| ns.parts.clone()).unwrap_or_default()
}

#[must_use]
pub(crate) fn namespace_open(protocol: &Protocol) -> Option<String> {
    let parts = namespace_parts(protocol);
    if parts.is_empty() {
        None
    } else {
        Some(format!("namespace {} {{", parts.join("::")))
    }
}

#[must_use]
pub(crate) fn namespace_close(protocol: &Protocol) -> Option<&'static str> {
    if namespace_parts(protocol).is_empty() { None } else { Some("}") }
}

/// Fully-qualified C++ name of a (possibly cross-protocol) type reference.
#[must_use]
pub(crate) fn qualified_name(descriptor: &Descriptor, tref: &TypeRef) -> String {
    match &tref.protocol {
        None => tref.name.clone(),
        Some(base) => {
            let parts = descriptor
                .get(base)
                .map(|handle| namespace_parts(&handle.borrow()))
                .unwrap_or_default();
            if parts.is_empty() {
                tref.name.clone()
            } else {
                format!("{}::{}", parts.join("::"), tref.name)
            }
        }
    }
}

/// Fully qualified enumerator path, e.g. `a::b::Kind::Red`.
#[must_use]
pub(crate) fn enum_value_path(descriptor: &Descriptor, enum_ref: &TypeRef, item_name: &str) -> String {
    format!("{}::{item_name}", qualified_name(descriptor, enum_ref))
}

#[must_use]
pub(crate) fn field_cpp_type(descriptor: &Descriptor, ty: &FieldType) -> String {
    match ty {
        FieldType::Primitive(p) => p.cpp_type().to_string(),
        FieldType::List(inner) => format!("std::vector<{}>", field_cpp_type(descriptor, inner)),
        FieldType::Enum(tref) => format!("{}::type", qualified_name(descriptor, tref)),
        FieldType::Struct(tref) => qualified_name(descriptor, tref),
    }
}

#[must_use]
pub(crate) fn field_is_by_value(ty: &FieldType) -> bool {
    match ty {
        FieldType::Primitive(PrimitiveType::String | PrimitiveType::Bytes) => false,
        FieldType::Primitive(_) | FieldType::Enum(_) => true,
        FieldType::List(_) | FieldType::Struct(_) => false,
    }
}

#[must_use]
pub(crate) fn any_struct(protocol: &Protocol) -> bool {
    !protocol.structs.is_empty()
}

#[must_use]
pub(crate) fn any_enum_map(protocol: &Protocol) -> bool {
    !protocol.enum_maps.is_empty()
}

fn field_type_needs_cstdint(ty: &FieldType) -> bool {
    match ty {
        FieldType::Primitive(p) => p.is_integer(),
        FieldType::List(inner) => field_type_needs_cstdint(inner),
        FieldType::Enum(_) | FieldType::Struct(_) => false,
    }
}

#[must_use]
pub(crate) fn any_integer_field(protocol: &Protocol) -> bool {
    protocol.structs.iter().any(|s| s.optional_byte_count > 0 || s.fields.iter().any(|f| field_type_needs_cstdint(&f.ty)))
}

fn field_type_is(ty: &FieldType, want: PrimitiveType) -> bool {
    match ty {
        FieldType::Primitive(p) => *p == want,
        FieldType::List(inner) => field_type_is(inner, want),
        FieldType::Enum(_) | FieldType::Struct(_) => false,
    }
}

#[must_use]
pub(crate) fn any_string_or_bytes_field(protocol: &Protocol) -> bool {
    protocol
        .structs
        .iter()
        .any(|s| s.fields.iter().any(|f| field_type_is(&f.ty, PrimitiveType::String) || field_type_is(&f.ty, PrimitiveType::Bytes)))
}

#[must_use]
pub(crate) fn any_list_field(protocol: &Protocol) -> bool {
    protocol.structs.iter().any(|s| s.fields.iter().any(|f| matches!(f.ty, FieldType::List(_))))
}

#[must_use]
pub(crate) fn any_non_list_non_struct_field(protocol: &Protocol) -> bool {
    protocol
        .structs
        .iter()
        .any(|s| s.fields.iter().any(|f| !matches!(f.ty, FieldType::List(_) | FieldType::Struct(_))))
}

/// Distinct (namespace-qualified) structs bound by any enum-map item whose
/// owning protocol differs from `protocol`.
#[must_use]
pub(crate) fn foreign_enum_map_structs(protocol: &Protocol) -> Vec<TypeRef> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for em in &protocol.enum_maps {
        for item in &em.items {
            if let Some(tref) = &item.struct_ref {
                if tref.protocol.is_some() {
                    let key = format!("{}.{}", tref.protocol.as_deref().unwrap_or_default(), tref.name);
                    if seen.insert(key) {
                        out.push(tref.clone());
                    }
                }
            }
        }
    }
    out
}
