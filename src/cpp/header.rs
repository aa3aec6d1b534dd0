//! Header-file (`.h`) rendering: include guard, conditional includes,
//! forward declarations, namespace-wrapped enums/structs/enum-maps.

use crate::ir::{Descriptor, EnumItemValue, EnumMapItemValue, FieldType, Protocol};

use super::{
    any_enum_map, any_integer_field, any_list_field, any_string_or_bytes_field, any_struct,
    enum_value_path, field_cpp_type, field_is_by_value, foreign_enum_map_structs, include_guard,
    namespace_close, namespace_open, namespace_parts, qualified_name,
};

#[must_use]
pub fn render(protocol: &Protocol, descriptor: &Descriptor) -> Vec<String> {
    let mut out = Vec::new();
    let guard = include_guard(protocol);

    out.push("// Generated by exchangec. DO NOT EDIT.".to_string());
    out.push(format!("#ifndef {guard}"));
    out.push(format!("#define {guard}"));
    out.push(String::new());

    render_includes(protocol, &mut out);

    let forward = foreign_enum_map_structs(protocol);
    if !forward.is_empty() {
        for tref in &forward {
            let owner = tref.protocol.as_deref().and_then(|base| descriptor.get(base));
            let parts = owner.map(|p| namespace_parts(&p.borrow())).unwrap_or_default();
            if parts.is_empty() {
                out.push(format!("class {};", tref.name));
            } else {
                out.push(format!("namespace {} {{ class {}; }}", parts.join("::"), tref.name));
            }
        }
        out.push(String::new());
    }

    if let Some(open) = namespace_open(protocol) {
        out.push(open);
    }

    for e in &protocol.enums {
        render_enum(protocol, descriptor, &mut out, e);
    }

    for s in &protocol.structs {
        render_struct(protocol, descriptor, &mut out, s);
    }

    for em in &protocol.enum_maps {
        render_enum_map(protocol, descriptor, &mut out, em);
    }

    if let Some(close) = namespace_close(protocol) {
        out.push(close.to_string());
    }
    out.push(format!("#endif  // {guard}"));
    out
}

fn render_includes(protocol: &Protocol, out: &mut Vec<String>) {
    let mut system = Vec::new();
    if any_struct(protocol) {
        system.push("<cstddef>");
    }
    if any_integer_field(protocol) {
        system.push("<cstdint>");
    }
    if any_string_or_bytes_field(protocol) {
        system.push("<string>");
    }
    if any_list_field(protocol) {
        system.push("<vector>");
    }
    for inc in &system {
        out.push(format!("#include {inc}"));
    }
    if !system.is_empty() {
        out.push(String::new());
    }

    let mut project = Vec::new();
    if any_struct(protocol) || any_enum_map(protocol) {
        project.push("<brickred/exchange/base_struct.h>".to_string());
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

fn render_enum(protocol: &Protocol, descriptor: &Descriptor, out: &mut Vec<String>, e: &crate::ir::Enum) {
    let _ = protocol;
    out.push(format!("struct {} {{", e.name));
    out.push("  enum type {".to_string());
    for item in &e.items {
        let line = match &item.value {
            EnumItemValue::Default => format!("{},", item.name),
            EnumItemValue::Int(v) => format!("{} = {v},", item.name),
            EnumItemValue::CurrentEnumRef(target) => format!("{} = {target},", item.name),
            EnumItemValue::OtherEnumRef(enum_ref, target_item) => {
                format!("{} = {},", item.name, enum_value_path(descriptor, enum_ref, target_item))
            }
        };
        out.push(format!("    {line}"));
    }
    out.push("  };".to_string());
    out.push("};".to_string());
    out.push(String::new());
}

fn render_struct(protocol: &Protocol, descriptor: &Descriptor, out: &mut Vec<String>, s: &crate::ir::Struct) {
    let _ = protocol;
    out.push(format!("class {} : public brickred::exchange::BaseStruct {{", s.name));
    out.push(" public:".to_string());
    out.push(format!("  {}();", s.name));
    out.push(format!("  ~{}() override;", s.name));
    out.push(String::new());
    out.push(format!("  void swap({} &other);", s.name));
    out.push("  static BaseStruct *create();".to_string());
    out.push(format!("  {} *clone() const override;", s.name));
    out.push(String::new());
    out.push("  int encode(char *buf, size_t len) const override;".to_string());
    out.push("  int decode(const char *buf, size_t len) override;".to_string());
    out.push("  std::string dump() const override;".to_string());

    if s.optional_field_count > 0 {
        out.push(String::new());
        for field in s.fields.iter().filter(|f| f.optional) {
            let idx = field.optional_index.expect("optional field has an index");
            let byte = idx / 8;
            let mask = 1u32 << (idx % 8);
            let cpp_ty = field_cpp_type(descriptor, &field.ty);
            let by_value = field_is_by_value(&field.ty);
            out.push(format!("  bool has_{}() const {{ return (_has_bits_[{byte}] & 0x{mask:02x}) != 0; }}", field.name));
            out.push(format!("  void set_has_{}() {{ _has_bits_[{byte}] |= 0x{mask:02x}; }}", field.name));
            out.push(format!("  void clear_has_{}() {{ _has_bits_[{byte}] &= ~0x{mask:02x}; }}", field.name));
            if by_value {
                out.push(format!("  void set_{}({cpp_ty} value) {{ {} = value; set_has_{}(); }}", field.name, field.name, field.name));
            } else {
                out.push(format!("  void set_{}(const {cpp_ty} &value) {{ {} = value; set_has_{}(); }}", field.name, field.name, field.name));
            }
        }
        out.push(String::new());
        out.push(" private:".to_string());
        out.push(format!("  uint8_t _has_bits_[{}];", s.optional_byte_count));
    }

    out.push(String::new());
    out.push(" public:".to_string());
    for field in &s.fields {
        out.push(format!("  {} {};", field_cpp_type(descriptor, &field.ty), field.name));
    }
    out.push("};".to_string());
    out.push(String::new());
}

fn render_enum_map(protocol: &Protocol, descriptor: &Descriptor, out: &mut Vec<String>, em: &crate::ir::EnumMap) {
    let _ = protocol;
    out.push(format!("struct {} {{", em.name));
    out.push("  enum type {".to_string());
    for item in &em.items {
        let line = match &item.value {
            EnumMapItemValue::Default => format!("{},", item.name),
            EnumMapItemValue::Int(v) => format!("{} = {v},", item.name),
            EnumMapItemValue::CurrentEnumRef(target) => format!("{} = {target},", item.name),
        };
        out.push(format!("    {line}"));
    }
    out.push("  };".to_string());
    out.push(String::new());
    out.push("  template <class T> struct id;".to_string());
    out.push("  static BaseStruct *create(int id);".to_string());
    out.push("};".to_string());
    out.push(String::new());

    for item in &em.items {
        if let Some(tref) = &item.struct_ref {
            let qualified_struct = qualified_name(descriptor, tref);
            out.push(format!(
                "template <> struct {}::id<{qualified_struct}> {{ static constexpr int value = {}; }};",
                em.name, item.name
            ));
        }
    }
    if em.items.iter().any(|i| i.struct_ref.is_some()) {
        out.push(String::new());
    }
}
