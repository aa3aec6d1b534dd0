//! Parser/linker: walks the import graph, builds the IR, resolves
//! references, and fills the derived fields (optional byte counts, enum-map
//! indexes, import-usage flags).

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::error::CompileError;
use crate::ident::{is_int_literal, is_valid_var_name, parse_list_type};
use crate::ir::{
    Descriptor, Enum, EnumItem, EnumItemValue, EnumMap, EnumMapItem, EnumMapItemValue, FieldType,
    Import, Namespace, PrimitiveType, Protocol, Struct, StructField, TypeRef,
};
use crate::xml::{self, XmlElement};

/// Parses `entry` and every protocol it transitively imports, searching
/// `import_dirs` for import sub-paths that aren't found relative to the
/// importing file. Returns the resolved descriptor plus any accumulated
/// non-fatal warnings.
pub fn compile_descriptor(
    entry: &Path,
    import_dirs: &[PathBuf],
) -> Result<(Descriptor, DiagnosticSink), CompileError> {
    let mut descriptor = Descriptor::new();
    let mut sink = DiagnosticSink::new();
    let root = parse_protocol(entry, import_dirs, &mut descriptor, &mut sink)?;
    descriptor.root = root.borrow().base_name.clone();
    process_imported_protocols(&descriptor, &mut sink);
    Ok((descriptor, sink))
}

fn base_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn resolve_protocol_path(requested: &Path, import_dirs: &[PathBuf]) -> Option<PathBuf> {
    if requested.is_file() {
        return Some(requested.to_path_buf());
    }
    for dir in import_dirs {
        let candidate = dir.join(requested);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn parse_protocol(
    requested: &Path,
    import_dirs: &[PathBuf],
    descriptor: &mut Descriptor,
    sink: &mut DiagnosticSink,
) -> Result<Rc<RefCell<Protocol>>, CompileError> {
    let base_name = base_name_of(requested);
    if let Some(existing) = descriptor.get(&base_name) {
        return Ok(existing);
    }

    let resolved_path = resolve_protocol_path(requested, import_dirs)
        .ok_or_else(|| CompileError::ProtocolNotFound { path: requested.to_path_buf() })?;
    let canonical = crate::fs_util::absolute(&resolved_path);
    let file_path = if canonical.as_os_str().is_empty() { resolved_path.clone() } else { canonical };

    let source = crate::fs_util::read_all(&resolved_path)?;
    let root = xml::parse_document(&resolved_path, &source)?;
    if root.name != "protocol" {
        return Err(CompileError::xml(
            resolved_path.clone(),
            root.line,
            format!("root element must be <protocol>, found <{}>", root.name),
        ));
    }

    let handle = Rc::new(RefCell::new(Protocol {
        base_name: base_name.clone(),
        file_path,
        ..Protocol::default()
    }));
    // Register before recursing into imports: breaks cycles by returning the
    // in-progress (possibly still-empty) node on re-entry.
    descriptor.protocols.insert(base_name.clone(), handle.clone());

    parse_imports(&root, &resolved_path, &base_name, import_dirs, descriptor, &handle, sink)?;
    parse_namespaces(&root, &resolved_path, &handle)?;
    parse_enums(&root, &resolved_path, &handle, descriptor)?;
    parse_structs(&root, &resolved_path, &handle, descriptor)?;
    parse_enum_maps(&root, &resolved_path, &handle, descriptor)?;

    {
        let mut protocol = handle.borrow_mut();
        for s in &mut protocol.structs {
            s.finalize_optional_layout();
        }
    }

    Ok(handle)
}

fn parse_imports(
    root: &XmlElement,
    file: &Path,
    self_base_name: &str,
    import_dirs: &[PathBuf],
    descriptor: &mut Descriptor,
    handle: &Rc<RefCell<Protocol>>,
    sink: &mut DiagnosticSink,
) -> Result<(), CompileError> {
    for elem in root.children_named("import") {
        let sub_path = elem.text.trim().to_string();
        let import_base = base_name_of(Path::new(&sub_path));
        if import_base == self_base_name {
            return Err(CompileError::semantic(file, elem.line, "can not import self"));
        }
        if handle.borrow().imports.iter().any(|i| i.base_name == import_base) {
            return Err(CompileError::semantic(
                file,
                elem.line,
                format!("duplicate import `{import_base}`"),
            ));
        }
        parse_protocol(Path::new(&sub_path), import_dirs, descriptor, sink)?;
        handle.borrow_mut().imports.push(Import {
            line: elem.line,
            sub_path,
            base_name: import_base,
            is_ref_by_enum: false,
            is_ref_by_struct: false,
            is_ref_by_enum_map: false,
        });
    }
    Ok(())
}

fn parse_namespaces(root: &XmlElement, file: &Path, handle: &Rc<RefCell<Protocol>>) -> Result<(), CompileError> {
    for elem in root.children_named("namespace") {
        let lang = elem
            .attr("lang")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CompileError::semantic(file, elem.line, "namespace requires a non-empty `lang` attribute"))?
            .to_string();
        let mut protocol = handle.borrow_mut();
        if protocol.namespaces.contains_key(&lang) {
            return Err(CompileError::semantic(file, elem.line, format!("duplicate namespace for lang `{lang}`")));
        }
        let dotted = elem.text.trim().to_string();
        let parts: Vec<String> = dotted.split('.').map(str::to_string).collect();
        for part in &parts {
            if !is_valid_var_name(part) {
                return Err(CompileError::semantic(
                    file,
                    elem.line,
                    format!("invalid namespace component `{part}`"),
                ));
            }
        }
        protocol.namespaces.insert(lang.clone(), Namespace { line: elem.line, lang, dotted, parts });
    }
    Ok(())
}

fn check_type_name_available(protocol: &Protocol, file: &Path, line: u32, name: &str) -> Result<(), CompileError> {
    if !is_valid_var_name(name) {
        return Err(CompileError::semantic(file, line, format!("invalid identifier `{name}`")));
    }
    if protocol.type_name_taken(name) {
        return Err(CompileError::semantic(file, line, format!("duplicate type name `{name}`")));
    }
    Ok(())
}

/// One `<item>` before its value has been resolved: just the name, line, and
/// raw `value` attribute text.
struct RawEnumItem {
    name: String,
    line: u32,
    raw_value: Option<String>,
}

fn parse_enums(
    root: &XmlElement,
    file: &Path,
    handle: &Rc<RefCell<Protocol>>,
    descriptor: &Descriptor,
) -> Result<(), CompileError> {
    for elem in root.children_named("enum") {
        let name = elem
            .attr("name")
            .ok_or_else(|| CompileError::semantic(file, elem.line, "enum requires a `name` attribute"))?
            .to_string();
        {
            let protocol = handle.borrow();
            check_type_name_available(&protocol, file, elem.line, &name)?;
        }

        // First pass: collect every item's name and raw value text without
        // resolving any of them, so a single-identifier reference (§4.3's
        // one-part rule) can name an item declared later in the same enum.
        let mut raw_items = Vec::new();
        for item_elem in elem.children_named("item") {
            let item_name = item_elem
                .attr("name")
                .ok_or_else(|| CompileError::semantic(file, item_elem.line, "enum item requires a `name` attribute"))?
                .to_string();
            if !is_valid_var_name(&item_name) {
                return Err(CompileError::semantic(file, item_elem.line, format!("invalid identifier `{item_name}`")));
            }
            if raw_items.iter().any(|i: &RawEnumItem| i.name == item_name) {
                return Err(CompileError::semantic(file, item_elem.line, format!("duplicate enum item `{item_name}`")));
            }
            raw_items.push(RawEnumItem {
                name: item_name,
                line: item_elem.line,
                raw_value: item_elem.attr("value").map(str::to_string),
            });
        }

        // Second pass: resolve each item's value, recursing into whichever
        // same-enum item a `CurrentEnumRef` names (forward or backward) and
        // memoizing as we go; `resolving` catches reference cycles.
        let mut resolved: Vec<Option<(EnumItemValue, i64)>> = vec![None; raw_items.len()];
        let mut resolving = vec![false; raw_items.len()];
        let mut items = Vec::with_capacity(raw_items.len());
        {
            let protocol = handle.borrow();
            for idx in 0..raw_items.len() {
                let int_value =
                    resolve_enum_item_at(idx, &raw_items, &mut resolved, &mut resolving, &protocol, descriptor, file)?;
                let (value, _) = resolved[idx].clone().expect("just resolved");
                items.push(EnumItem { line: raw_items[idx].line, name: raw_items[idx].name.clone(), value, int_value });
            }
        }

        let mut protocol = handle.borrow_mut();
        let idx = protocol.enums.len();
        protocol.enum_index.insert(name.clone(), idx);
        protocol.enums.push(Enum { line: elem.line, name, items });
    }
    Ok(())
}

/// Resolves item `idx` of `raw_items`, recursing through `CurrentEnumRef`
/// chains (in either direction) via `resolved`/`resolving` memoization.
fn resolve_enum_item_at(
    idx: usize,
    raw_items: &[RawEnumItem],
    resolved: &mut [Option<(EnumItemValue, i64)>],
    resolving: &mut [bool],
    protocol: &Protocol,
    descriptor: &Descriptor,
    file: &Path,
) -> Result<i64, CompileError> {
    if let Some((_, v)) = &resolved[idx] {
        return Ok(*v);
    }
    if resolving[idx] {
        return Err(CompileError::semantic(
            file,
            raw_items[idx].line,
            format!("cyclic enum item reference involving `{}`", raw_items[idx].name),
        ));
    }
    resolving[idx] = true;

    let line = raw_items[idx].line;
    let result = (|| -> Result<(EnumItemValue, i64), CompileError> {
        let Some(raw) = raw_items[idx].raw_value.clone() else {
            let v = if idx == 0 {
                0
            } else {
                resolve_enum_item_at(idx - 1, raw_items, resolved, resolving, protocol, descriptor, file)? + 1
            };
            return Ok((EnumItemValue::Default, v));
        };
        if is_int_literal(&raw) {
            let v: i64 = raw
                .parse()
                .map_err(|_| CompileError::semantic(file, line, format!("integer literal out of range `{raw}`")))?;
            return Ok((EnumItemValue::Int(v), v));
        }
        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            [item] => {
                let target_idx = raw_items
                    .iter()
                    .position(|i| i.name == *item)
                    .ok_or_else(|| CompileError::semantic(file, line, format!("unresolved enum item reference `{raw}`")))?;
                let target_value =
                    resolve_enum_item_at(target_idx, raw_items, resolved, resolving, protocol, descriptor, file)?;
                Ok((EnumItemValue::CurrentEnumRef((*item).to_string()), target_value))
            }
            _ => resolve_other_enum_ref(protocol, descriptor, &raw, file, line),
        }
    })();

    resolving[idx] = false;
    let (value, int_value) = result?;
    resolved[idx] = Some((value, int_value));
    Ok(int_value)
}

/// Resolves a two- or three-part enum item reference (`E.I` or `P.E.I`)
/// against the protocol and descriptor. Split out from
/// [`resolve_enum_item_at`] because those targets live in an already-fully-
/// parsed enum or protocol, unlike a one-part same-enum reference.
fn resolve_other_enum_ref(
    protocol: &Protocol,
    descriptor: &Descriptor,
    raw: &str,
    file: &Path,
    line: u32,
) -> Result<(EnumItemValue, i64), CompileError> {
    let parts: Vec<&str> = raw.split('.').collect();
    match parts.as_slice() {
        [enum_name, item_name] => {
            let e = protocol
                .find_enum(enum_name)
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown enum `{enum_name}`")))?;
            let target = e
                .items
                .iter()
                .find(|i| i.name == *item_name)
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown enum item `{raw}`")))?;
            Ok((
                EnumItemValue::OtherEnumRef(TypeRef::local(*enum_name), (*item_name).to_string()),
                target.int_value,
            ))
        }
        [proto_name, enum_name, item_name] => {
            let imported = descriptor
                .get(proto_name)
                .filter(|_| protocol.find_import(proto_name).is_some())
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown imported protocol `{proto_name}`")))?;
            let imported = imported.borrow();
            let e = imported
                .find_enum(enum_name)
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown enum `{proto_name}.{enum_name}`")))?;
            let target = e
                .items
                .iter()
                .find(|i| i.name == *item_name)
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown enum item `{raw}`")))?;
            Ok((
                EnumItemValue::OtherEnumRef(TypeRef::qualified(*proto_name, *enum_name), (*item_name).to_string()),
                target.int_value,
            ))
        }
        _ => Err(CompileError::semantic(file, line, format!("malformed enum item value `{raw}`"))),
    }
}

fn parse_structs(
    root: &XmlElement,
    file: &Path,
    handle: &Rc<RefCell<Protocol>>,
    descriptor: &Descriptor,
) -> Result<(), CompileError> {
    for elem in root.children_named("struct") {
        let name = elem
            .attr("name")
            .ok_or_else(|| CompileError::semantic(file, elem.line, "struct requires a `name` attribute"))?
            .to_string();
        {
            let protocol = handle.borrow();
            check_type_name_available(&protocol, file, elem.line, &name)?;
        }

        let mut s = Struct { line: elem.line, name: name.clone(), ..Struct::default() };
        let mut optional_index = 0u32;
        for child in &elem.children {
            let optional = match child.name.as_str() {
                "required" => false,
                "optional" => true,
                other => {
                    return Err(CompileError::semantic(file, child.line, format!("unexpected child `<{other}>` in struct")));
                }
            };
            let field_name = child
                .attr("name")
                .ok_or_else(|| CompileError::semantic(file, child.line, "field requires a `name` attribute"))?
                .to_string();
            if !is_valid_var_name(&field_name) {
                return Err(CompileError::semantic(file, child.line, format!("invalid identifier `{field_name}`")));
            }
            if s.fields.iter().any(|f| f.name == field_name) {
                return Err(CompileError::semantic(file, child.line, format!("duplicate field `{field_name}`")));
            }
            let type_spelling = child
                .attr("type")
                .ok_or_else(|| CompileError::semantic(file, child.line, "field requires a `type` attribute"))?;
            let ty = {
                let protocol = handle.borrow();
                resolve_field_type(&protocol, descriptor, type_spelling, file, child.line)?
            };
            let index = if optional {
                let i = optional_index;
                optional_index += 1;
                Some(i)
            } else {
                None
            };
            s.fields.push(StructField { line: child.line, name: field_name, ty, optional, optional_index: index });
        }

        let mut protocol = handle.borrow_mut();
        let idx = protocol.structs.len();
        protocol.struct_index.insert(name, idx);
        protocol.structs.push(s);
    }
    Ok(())
}

fn resolve_field_type(
    protocol: &Protocol,
    descriptor: &Descriptor,
    spelling: &str,
    file: &Path,
    line: u32,
) -> Result<FieldType, CompileError> {
    if let Some(inner) = parse_list_type(spelling) {
        if parse_list_type(inner).is_some() {
            return Err(CompileError::semantic(file, line, "list element type must not itself be a list"));
        }
        let element = resolve_field_type(protocol, descriptor, inner, file, line)?;
        return Ok(FieldType::List(Box::new(element)));
    }
    if let Some(prim) = PrimitiveType::from_spelling(spelling) {
        return Ok(FieldType::Primitive(prim));
    }
    let parts: Vec<&str> = spelling.split('.').collect();
    match parts.as_slice() {
        [name] => {
            if protocol.enum_index.contains_key(*name) {
                Ok(FieldType::Enum(TypeRef::local(*name)))
            } else if protocol.struct_index.contains_key(*name) {
                Ok(FieldType::Struct(TypeRef::local(*name)))
            } else {
                Err(CompileError::semantic(file, line, format!("unresolved type `{spelling}`")))
            }
        }
        [proto_name, name] => {
            let imported = descriptor
                .get(proto_name)
                .filter(|_| protocol.find_import(proto_name).is_some())
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown imported protocol `{proto_name}`")))?;
            let imported = imported.borrow();
            if imported.enum_index.contains_key(*name) {
                Ok(FieldType::Enum(TypeRef::qualified(*proto_name, *name)))
            } else if imported.struct_index.contains_key(*name) {
                Ok(FieldType::Struct(TypeRef::qualified(*proto_name, *name)))
            } else {
                Err(CompileError::semantic(file, line, format!("unresolved type `{spelling}`")))
            }
        }
        _ => Err(CompileError::semantic(file, line, format!("malformed type spelling `{spelling}`"))),
    }
}

fn parse_enum_maps(
    root: &XmlElement,
    file: &Path,
    handle: &Rc<RefCell<Protocol>>,
    descriptor: &Descriptor,
) -> Result<(), CompileError> {
    for elem in root.children_named("enum_map") {
        let name = elem
            .attr("name")
            .ok_or_else(|| CompileError::semantic(file, elem.line, "enum_map requires a `name` attribute"))?
            .to_string();
        {
            let protocol = handle.borrow();
            check_type_name_available(&protocol, file, elem.line, &name)?;
        }

        let mut em = EnumMap { line: elem.line, name: name.clone(), ..EnumMap::default() };
        let mut prev_int: Option<i64> = None;
        for item_elem in elem.children_named("item") {
            let item_name = item_elem
                .attr("name")
                .ok_or_else(|| CompileError::semantic(file, item_elem.line, "enum_map item requires a `name` attribute"))?
                .to_string();
            if !is_valid_var_name(&item_name) {
                return Err(CompileError::semantic(file, item_elem.line, format!("invalid identifier `{item_name}`")));
            }
            if em.items.iter().any(|i| i.name == item_name) {
                return Err(CompileError::semantic(file, item_elem.line, format!("duplicate enum_map item `{item_name}`")));
            }
            let (value, int_value) =
                resolve_enum_map_item_value(item_elem.attr("value"), &em, prev_int, file, item_elem.line)?;
            if let Some(prev) = prev_int {
                if int_value < prev {
                    return Err(CompileError::semantic(
                        file,
                        item_elem.line,
                        format!("enum_map item `{item_name}` value must be monotonically non-decreasing"),
                    ));
                }
            }
            prev_int = Some(int_value);

            let struct_ref = match item_elem.attr("struct") {
                Some(spelling) => {
                    let protocol = handle.borrow();
                    let tref = resolve_struct_ref(&protocol, descriptor, spelling, file, item_elem.line)?;
                    if em.id_to_struct.contains_key(&int_value) {
                        return Err(CompileError::semantic(
                            file,
                            item_elem.line,
                            format!("enum_map id {int_value} already bound to a struct"),
                        ));
                    }
                    let struct_key = qualified_name(&tref);
                    if em.struct_to_id.contains_key(&struct_key) {
                        return Err(CompileError::semantic(
                            file,
                            item_elem.line,
                            format!("struct `{struct_key}` already bound to an enum_map id"),
                        ));
                    }
                    em.id_to_struct.insert(int_value, tref.clone());
                    em.struct_to_id.insert(struct_key, int_value);
                    Some(tref)
                }
                None => None,
            };

            em.items.push(EnumMapItem { line: item_elem.line, name: item_name, value, int_value, struct_ref });
        }

        let mut protocol = handle.borrow_mut();
        let idx = protocol.enum_maps.len();
        protocol.enum_map_index.insert(name, idx);
        protocol.enum_maps.push(em);
    }
    Ok(())
}

fn qualified_name(tref: &TypeRef) -> String {
    match &tref.protocol {
        Some(p) => format!("{p}.{}", tref.name),
        None => tref.name.clone(),
    }
}

fn resolve_enum_map_item_value(
    raw: Option<&str>,
    current: &EnumMap,
    prev_int: Option<i64>,
    file: &Path,
    line: u32,
) -> Result<(EnumMapItemValue, i64), CompileError> {
    let Some(raw) = raw else {
        let v = prev_int.map_or(0, |p| p + 1);
        return Ok((EnumMapItemValue::Default, v));
    };
    if is_int_literal(raw) {
        let v: i64 = raw.parse().map_err(|_| CompileError::semantic(file, line, format!("integer literal out of range `{raw}`")))?;
        return Ok((EnumMapItemValue::Int(v), v));
    }
    if raw.contains('.') {
        return Err(CompileError::semantic(file, line, "enum_map item values may not reference other protocols or enums"));
    }
    let target = current
        .items
        .iter()
        .find(|i| i.name == raw)
        .ok_or_else(|| CompileError::semantic(file, line, format!("unresolved enum_map item reference `{raw}`")))?;
    Ok((EnumMapItemValue::CurrentEnumRef(raw.to_string()), target.int_value))
}

fn resolve_struct_ref(
    protocol: &Protocol,
    descriptor: &Descriptor,
    spelling: &str,
    file: &Path,
    line: u32,
) -> Result<TypeRef, CompileError> {
    let parts: Vec<&str> = spelling.split('.').collect();
    match parts.as_slice() {
        [name] => {
            if protocol.struct_index.contains_key(*name) {
                Ok(TypeRef::local(*name))
            } else {
                Err(CompileError::semantic(file, line, format!("unresolved struct `{spelling}`")))
            }
        }
        [proto_name, name] => {
            let imported = descriptor
                .get(proto_name)
                .filter(|_| protocol.find_import(proto_name).is_some())
                .ok_or_else(|| CompileError::semantic(file, line, format!("unknown imported protocol `{proto_name}`")))?;
            let imported = imported.borrow();
            if imported.struct_index.contains_key(*name) {
                Ok(TypeRef::qualified(*proto_name, *name))
            } else {
                Err(CompileError::semantic(file, line, format!("unresolved struct `{spelling}`")))
            }
        }
        _ => Err(CompileError::semantic(file, line, format!("malformed struct reference `{spelling}`"))),
    }
}

fn process_imported_protocols(descriptor: &Descriptor, sink: &mut DiagnosticSink) {
    for handle in descriptor.protocols.values() {
        let mut protocol = handle.borrow_mut();

        let mut ref_by_enum = HashSet::new();
        let mut ref_by_struct = HashSet::new();
        let mut ref_by_enum_map = HashSet::new();

        for e in &protocol.enums {
            for item in &e.items {
                if let EnumItemValue::OtherEnumRef(tref, _) = &item.value {
                    if let Some(proto) = &tref.protocol {
                        ref_by_enum.insert(proto.clone());
                    }
                }
            }
        }
        for s in &protocol.structs {
            for f in &s.fields {
                collect_field_proto_refs(&f.ty, &mut ref_by_struct);
            }
        }
        for em in &protocol.enum_maps {
            for item in &em.items {
                if let Some(tref) = &item.struct_ref {
                    if let Some(proto) = &tref.protocol {
                        ref_by_enum_map.insert(proto.clone());
                    }
                }
            }
        }

        let file = protocol.file_path.clone();
        for import in &mut protocol.imports {
            import.is_ref_by_enum = ref_by_enum.contains(&import.base_name);
            import.is_ref_by_struct = ref_by_struct.contains(&import.base_name);
            import.is_ref_by_enum_map = ref_by_enum_map.contains(&import.base_name);
            if !import.is_ref_by_enum && !import.is_ref_by_struct && !import.is_ref_by_enum_map {
                sink.warn(Diagnostic::warning(format!("unused import `{}`", import.base_name)).at(&file, import.line));
            }
        }
    }
}

fn collect_field_proto_refs(ty: &FieldType, ref_by_struct: &mut HashSet<String>) {
    match ty {
        FieldType::Enum(tref) | FieldType::Struct(tref) => {
            if let Some(proto) = &tref.protocol {
                ref_by_struct.insert(proto.clone());
            }
        }
        FieldType::List(inner) => collect_field_proto_refs(inner, ref_by_struct),
        FieldType::Primitive(_) => {}
    }
}
