//! The typed IR tree: protocol / import / namespace / enum / enum-item /
//! struct / struct-field / enum-map / enum-map-item, with back-pointers
//! expressed as name-keyed, non-owning references rather than raw pointers.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

/// A reference to a named type, possibly qualified by the protocol that
/// defines it. `None` protocol means "this protocol".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub protocol: Option<String>,
    pub name: String,
}

impl TypeRef {
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        TypeRef { protocol: None, name: name.into() }
    }

    #[must_use]
    pub fn qualified(protocol: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef { protocol: Some(protocol.into()), name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    I16V,
    U16V,
    I32V,
    U32V,
    I64V,
    U64V,
    String,
    Bytes,
    Bool,
}

impl PrimitiveType {
    #[must_use]
    pub fn from_spelling(s: &str) -> Option<Self> {
        Some(match s {
            "i8" => PrimitiveType::I8,
            "u8" => PrimitiveType::U8,
            "i16" => PrimitiveType::I16,
            "u16" => PrimitiveType::U16,
            "i32" => PrimitiveType::I32,
            "u32" => PrimitiveType::U32,
            "i64" => PrimitiveType::I64,
            "u64" => PrimitiveType::U64,
            "i16v" => PrimitiveType::I16V,
            "u16v" => PrimitiveType::U16V,
            "i32v" => PrimitiveType::I32V,
            "u32v" => PrimitiveType::U32V,
            "i64v" => PrimitiveType::I64V,
            "u64v" => PrimitiveType::U64V,
            "string" => PrimitiveType::String,
            "bytes" => PrimitiveType::Bytes,
            "bool" => PrimitiveType::Bool,
            _ => return None,
        })
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        !matches!(self, PrimitiveType::String | PrimitiveType::Bytes | PrimitiveType::Bool)
    }

    /// The C++ type this primitive maps to.
    #[must_use]
    pub fn cpp_type(self) -> &'static str {
        match self {
            PrimitiveType::I8 => "int8_t",
            PrimitiveType::U8 => "uint8_t",
            PrimitiveType::I16 | PrimitiveType::I16V => "int16_t",
            PrimitiveType::U16 | PrimitiveType::U16V => "uint16_t",
            PrimitiveType::I32 | PrimitiveType::I32V => "int32_t",
            PrimitiveType::U32 | PrimitiveType::U32V => "uint32_t",
            PrimitiveType::I64 | PrimitiveType::I64V => "int64_t",
            PrimitiveType::U64 | PrimitiveType::U64V => "uint64_t",
            PrimitiveType::String => "std::string",
            PrimitiveType::Bytes => "std::string",
            PrimitiveType::Bool => "bool",
        }
    }
}

/// The resolved kind of a struct field's type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Primitive(PrimitiveType),
    List(Box<FieldType>),
    Enum(TypeRef),
    Struct(TypeRef),
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub line: u32,
    pub name: String,
    pub ty: FieldType,
    pub optional: bool,
    /// Zero-based index into the struct's optional-field bitmap; only
    /// meaningful when `optional` is true.
    pub optional_index: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct Struct {
    pub line: u32,
    pub name: String,
    pub fields: Vec<StructField>,
    pub optional_field_count: u32,
    pub optional_byte_count: u32,
}

impl Struct {
    pub fn finalize_optional_layout(&mut self) {
        self.optional_field_count = self.fields.iter().filter(|f| f.optional).count() as u32;
        self.optional_byte_count = if self.optional_field_count == 0 {
            0
        } else {
            (self.optional_field_count - 1) / 8 + 1
        };
    }
}

#[derive(Debug, Clone)]
pub enum EnumItemValue {
    Default,
    Int(i64),
    CurrentEnumRef(String),
    OtherEnumRef(TypeRef, String),
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub line: u32,
    pub name: String,
    pub value: EnumItemValue,
    pub int_value: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Enum {
    pub line: u32,
    pub name: String,
    pub items: Vec<EnumItem>,
}

#[derive(Debug, Clone)]
pub enum EnumMapItemValue {
    Default,
    Int(i64),
    CurrentEnumRef(String),
}

#[derive(Debug, Clone)]
pub struct EnumMapItem {
    pub line: u32,
    pub name: String,
    pub value: EnumMapItemValue,
    pub int_value: i64,
    pub struct_ref: Option<TypeRef>,
}

#[derive(Debug, Clone, Default)]
pub struct EnumMap {
    pub line: u32,
    pub name: String,
    pub items: Vec<EnumMapItem>,
    /// ID -> struct name (qualified as written in source), source order.
    pub id_to_struct: IndexMap<i64, TypeRef>,
    /// struct name -> ID, the inverse index.
    pub struct_to_id: IndexMap<String, i64>,
}

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub line: u32,
    pub lang: String,
    pub dotted: String,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Import {
    pub line: u32,
    pub sub_path: String,
    pub base_name: String,
    pub is_ref_by_enum: bool,
    pub is_ref_by_struct: bool,
    pub is_ref_by_enum_map: bool,
}

#[derive(Debug, Default)]
pub struct Protocol {
    pub base_name: String,
    pub file_path: PathBuf,
    pub imports: Vec<Import>,
    pub namespaces: IndexMap<String, Namespace>,
    pub enums: Vec<Enum>,
    pub enum_index: IndexMap<String, usize>,
    pub structs: Vec<Struct>,
    pub struct_index: IndexMap<String, usize>,
    pub enum_maps: Vec<EnumMap>,
    pub enum_map_index: IndexMap<String, usize>,
}

impl Protocol {
    #[must_use]
    pub fn cpp_namespace(&self) -> Option<&Namespace> {
        self.namespaces.get("cpp")
    }

    #[must_use]
    pub fn type_name_taken(&self, name: &str) -> bool {
        self.enum_index.contains_key(name)
            || self.struct_index.contains_key(name)
            || self.enum_map_index.contains_key(name)
    }

    #[must_use]
    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.struct_index.get(name).map(|&i| &self.structs[i])
    }

    #[must_use]
    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enum_index.get(name).map(|&i| &self.enums[i])
    }

    #[must_use]
    pub fn find_import(&self, base_name: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.base_name == base_name)
    }
}

/// The root of a compile: the entry protocol plus every transitively
/// imported protocol, keyed by base name so duplicate base names alias to
/// one node (breaking import cycles).
#[derive(Debug, Default)]
pub struct Descriptor {
    pub root: String,
    pub protocols: IndexMap<String, Rc<RefCell<Protocol>>>,
}

impl Descriptor {
    #[must_use]
    pub fn new() -> Self {
        Descriptor::default()
    }

    #[must_use]
    pub fn root_protocol(&self) -> Rc<RefCell<Protocol>> {
        self.protocols
            .get(&self.root)
            .expect("root protocol registered before descriptor is returned")
            .clone()
    }

    #[must_use]
    pub fn get(&self, base_name: &str) -> Option<Rc<RefCell<Protocol>>> {
        self.protocols.get(base_name).cloned()
    }
}

/// A non-owning handle to a protocol already registered in a [`Descriptor`].
pub type ProtocolHandle = Weak<RefCell<Protocol>>;
