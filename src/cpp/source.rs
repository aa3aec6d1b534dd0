//! Implementation-file (`.cc`) rendering. Bodies delegate field-by-field to
//! `brickred::exchange::BaseStruct`'s macro-based encode/decode/dump helpers
//! (`macro_internal.h`); the on-wire byte layout and textual rendering of
//! each field are owned by that external contract, not by this emitter.

use crate::ir::{Descriptor, Protocol};

use super::{any_non_list_non_struct_field, any_struct, namespace_close, namespace_open, qualified_name};

#[must_use]
pub fn render(protocol: &Protocol, descriptor: &Descriptor) -> Vec<String> {
    let mut out = Vec::new();
    out.push("// Generated by exchangec. DO NOT EDIT.".to_string());
    out.push(format!("#include \"{}.h\"", protocol.base_name));
    out.push(String::new());

    render_includes(protocol, &mut out);

    if let Some(open) = namespace_open(protocol) {
        out.push(open);
        out.push(String::new());
    }

    for s in &protocol.structs {
        render_struct_body(descriptor, &mut out, s);
    }

    for em in &protocol.enum_maps {
        render_enum_map_body(descriptor, &mut out, em);
    }

    if let Some(close) = namespace_close(protocol) {
        out.push(close.to_string());
    }
    out
}

fn any_struct_has_optional(protocol: &Protocol) -> bool {
    protocol.structs.iter().any(|s| s.optional_field_count > 0)
}

/// Whether any struct has at least one field — `encode`/`decode`/`dump`
/// route every field through a `BRICKRED_EXCHANGE_*_FIELD` macro regardless
/// of its type, so this is the condition for needing `macro_internal.h`.
fn any_struct_has_field(protocol: &Protocol) -> bool {
    protocol.structs.iter().any(|s| !s.fields.is_empty())
}

fn render_includes(protocol: &Protocol, out: &mut Vec<String>) {
    let mut system = Vec::new();
    if any_struct_has_optional(protocol) {
        system.push("<cstring>");
    }
    if any_struct_has_optional(protocol) || any_non_list_non_struct_field(protocol) || !protocol.enum_maps.is_empty() {
        system.push("<algorithm>");
    }
    if any_struct(protocol) {
        system.push("<sstream>");
    }
    for inc in &system {
        out.push(format!("#include {inc}"));
    }
    if !system.is_empty() {
        out.push(String::new());
    }

    let mut project = Vec::new();
    if any_struct_has_field(protocol) || !protocol.enum_maps.is_empty() {
        project.push("<brickred/exchange/macro_internal.h>".to_string());
    }
    for import in &protocol.imports {
        if import.is_ref_by_struct {
            project.push(format!("\"{}.h\"", import.base_name));
        }
    }
    for inc in &project {
        out.push(format!("#include {inc}"));
    }
    if !project.is_empty() {
        out.push(String::new());
    }
}

fn render_struct_body(_descriptor: &Descriptor, out: &mut Vec<String>, s: &crate::ir::Struct) {
    out.push(format!("{}::{}() {{", s.name, s.name));
    if s.optional_byte_count > 0 {
        out.push("  std::memset(_has_bits_, 0, sizeof(_has_bits_));".to_string());
    }
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("{}::~{}() {{}}", s.name, s.name));
    out.push(String::new());

    out.push(format!("void {}::swap({} &other) {{", s.name, s.name));
    if s.optional_byte_count > 0 {
        out.push("  std::swap(_has_bits_, other._has_bits_);".to_string());
    }
    for field in &s.fields {
        out.push(format!("  std::swap({}, other.{});", field.name, field.name));
    }
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("BaseStruct *{}::create() {{", s.name));
    out.push(format!("  return new {}();", s.name));
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("{} *{}::clone() const {{", s.name, s.name));
    out.push(format!("  return new {}(*this);", s.name));
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("int {}::encode(char *buf, size_t len) const {{", s.name));
    out.push("  size_t pos = 0;".to_string());
    if s.optional_byte_count > 0 {
        out.push("  BRICKRED_EXCHANGE_ENCODE_BYTES(buf, len, pos, _has_bits_, sizeof(_has_bits_));".to_string());
    }
    for field in &s.fields {
        out.push(format!("  BRICKRED_EXCHANGE_ENCODE_FIELD(buf, len, pos, {});", field.name));
    }
    out.push("  return static_cast<int>(pos);".to_string());
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("int {}::decode(const char *buf, size_t len) {{", s.name));
    out.push("  size_t pos = 0;".to_string());
    if s.optional_byte_count > 0 {
        out.push("  BRICKRED_EXCHANGE_DECODE_BYTES(buf, len, pos, _has_bits_, sizeof(_has_bits_));".to_string());
    }
    for field in &s.fields {
        out.push(format!("  BRICKRED_EXCHANGE_DECODE_FIELD(buf, len, pos, {});", field.name));
    }
    out.push("  return static_cast<int>(pos);".to_string());
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("std::string {}::dump() const {{", s.name));
    out.push("  std::ostringstream oss;".to_string());
    out.push(format!("  oss << \"{} {{\";", s.name));
    for field in &s.fields {
        // Struct and List fields can't stream through operator<<, so route
        // every field through the same macro encode/decode use above: the
        // external contract knows how to render each field kind.
        out.push(format!("  oss << \" {}=\";", field.name));
        out.push(format!("  BRICKRED_EXCHANGE_DUMP_FIELD(oss, {});", field.name));
    }
    out.push("  oss << \" }\";".to_string());
    out.push("  return oss.str();".to_string());
    out.push("}".to_string());
    out.push(String::new());
}

fn render_enum_map_body(descriptor: &Descriptor, out: &mut Vec<String>, em: &crate::ir::EnumMap) {
    out.push(format!("BaseStruct *{}::create(int id) {{", em.name));
    out.push("  switch (id) {".to_string());
    for item in &em.items {
        if let Some(tref) = &item.struct_ref {
            let qualified_struct = qualified_name(descriptor, tref);
            out.push(format!("    case {}: return {}::create();", item.name, qualified_struct));
        }
    }
    out.push("    default: return nullptr;".to_string());
    out.push("  }".to_string());
    out.push("}".to_string());
    out.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile_descriptor;
    use std::io::Write;

    fn write_fixture(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).expect("create fixture");
        f.write_all(contents.as_bytes()).expect("write fixture");
        path
    }

    #[test]
    fn dump_routes_struct_and_list_fields_through_a_macro() {
        let dir = tempfile::tempdir().expect("tempdir");
        let xml = r#"<protocol>
  <struct name="Inner"><required name="x" type="i32"/></struct>
  <struct name="Outer">
    <required name="scalar" type="i32"/>
    <required name="nested" type="Inner"/>
    <required name="items" type="list{i32}"/>
  </struct>
</protocol>"#;
        let path = write_fixture(dir.path(), "outer.xml", xml);
        let (descriptor, _sink) = compile_descriptor(&path, &[]).expect("compiles");
        let root = descriptor.root_protocol();
        let protocol = root.borrow();
        let lines = render(&protocol, &descriptor);
        let text = lines.join("\n");
        assert!(text.contains("#include <brickred/exchange/macro_internal.h>"));
        assert!(text.contains("BRICKRED_EXCHANGE_DUMP_FIELD(oss, scalar);"));
        assert!(text.contains("BRICKRED_EXCHANGE_DUMP_FIELD(oss, nested);"));
        assert!(text.contains("BRICKRED_EXCHANGE_DUMP_FIELD(oss, items);"));
        assert!(!text.contains("oss << \" nested=\" << nested;"));
        assert!(!text.contains("oss << \" items=\" << items;"));
    }
}
