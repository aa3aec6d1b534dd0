// Library-level integration tests translating the end-to-end scenarios
// against the parser/linker and the C++ emitter.

mod common;

use common::write_fixture;
use exchangec::compiler::{Compiler, Language};
use exchangec::ir::{EnumItemValue, EnumMapItemValue, FieldType};
use exchangec::parser::compile_descriptor;
use pretty_assertions::assert_eq;

#[test]
fn required_int_field_emits_plain_struct_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        dir.path(),
        "foo.xml",
        r#"<protocol><namespace lang="cpp">x.y</namespace><struct name="Foo"><required name="a" type="i32"/></struct></protocol>"#,
    );
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).expect("mkdir");

    let mut compiler = Compiler::new(&path);
    compiler.output_dir(&out_dir).language(Language::Cpp);
    compiler.run().expect("compiles");

    let header = std::fs::read_to_string(out_dir.join("foo.h")).expect("read header");
    assert!(header.contains("namespace x::y {"));
    assert!(header.contains("class Foo : public brickred::exchange::BaseStruct {"));
    assert!(header.contains("int32_t a;"));
    assert!(!header.contains("_has_bits_"));
    assert!(header.contains("#include <cstdint>"));
    assert!(header.contains("#include <brickred/exchange/base_struct.h>"));
}

#[test]
fn nine_optional_fields_need_a_two_byte_bitmap() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fields: String = ('a'..='i').map(|c| format!(r#"<optional name="{c}" type="bool"/>"#)).collect();
    let path = write_fixture(dir.path(), "bar.xml", &format!(r#"<protocol><struct name="Bar">{fields}</struct></protocol>"#));
    let (descriptor, _sink) = compile_descriptor(&path, &[]).expect("compiles");
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    assert_eq!(protocol.structs[0].optional_field_count, 9);
    assert_eq!(protocol.structs[0].optional_byte_count, 2);
    let indices: Vec<u32> = protocol.structs[0].fields.iter().map(|f| f.optional_index.unwrap()).collect();
    assert_eq!(indices, (0..9).collect::<Vec<_>>());
}

#[test]
fn enum_reference_chain_inherits_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        dir.path(),
        "e.xml",
        r#"<protocol><enum name="E"><item name="A" value="5"/><item name="B" value="A"/><item name="C"/></enum></protocol>"#,
    );
    let (descriptor, _sink) = compile_descriptor(&path, &[]).expect("compiles");
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    let e = &protocol.enums[0];
    assert!(matches!(e.items[1].value, EnumItemValue::CurrentEnumRef(_)));
    assert_eq!(e.items[1].int_value, 5);
    assert!(matches!(e.items[2].value, EnumItemValue::Default));
    assert_eq!(e.items[2].int_value, 6);
}

#[test]
fn enum_item_can_reference_an_item_declared_later_in_the_same_enum() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        dir.path(),
        "e.xml",
        r#"<protocol><enum name="E"><item name="A" value="B"/><item name="B" value="7"/></enum></protocol>"#,
    );
    let (descriptor, _sink) = compile_descriptor(&path, &[]).expect("compiles");
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    let e = &protocol.enums[0];
    assert!(matches!(&e.items[0].value, EnumItemValue::CurrentEnumRef(name) if name == "B"));
    assert_eq!(e.items[0].int_value, 7);
    assert!(matches!(e.items[1].value, EnumItemValue::Int(7)));
}

#[test]
fn enum_item_cyclic_reference_is_a_semantic_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        dir.path(),
        "e.xml",
        r#"<protocol><enum name="E"><item name="A" value="B"/><item name="B" value="A"/></enum></protocol>"#,
    );
    let err = compile_descriptor(&path, &[]).expect_err("cyclic reference must fail");
    assert!(err.to_string().contains("cyclic"));
}

#[test]
fn cross_file_struct_reference_marks_import_ref_by_struct() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), "q.xml", r#"<protocol><struct name="T"><required name="x" type="i32"/></struct></protocol>"#);
    let p_path = write_fixture(
        dir.path(),
        "p.xml",
        r#"<protocol><import>q.xml</import><struct name="S"><required name="t" type="q.T"/></struct></protocol>"#,
    );

    let (descriptor, _sink) = compile_descriptor(&p_path, &[dir.path().to_path_buf()]).expect("compiles");
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    let field = &protocol.structs[0].fields[0];
    match &field.ty {
        FieldType::Struct(tref) => {
            assert_eq!(tref.protocol.as_deref(), Some("q"));
            assert_eq!(tref.name, "T");
        }
        other => panic!("expected a struct reference, got {other:?}"),
    }
    let import = protocol.find_import("q").expect("import present");
    assert!(import.is_ref_by_struct);
    assert!(!import.is_ref_by_enum);

    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).expect("mkdir");
    let mut compiler = Compiler::new(&p_path);
    compiler.output_dir(&out_dir).language(Language::Cpp).import_dir(dir.path());
    compiler.run().expect("compiles");
    let header = std::fs::read_to_string(out_dir.join("p.h")).expect("read header");
    assert!(header.contains("#include \"q.h\""));
}

#[test]
fn enum_map_with_tagged_structs_builds_bijective_indexes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        dir.path(),
        "m.xml",
        r#"<protocol>
  <struct name="S1"><required name="a" type="i32"/></struct>
  <struct name="S2"><required name="b" type="i32"/></struct>
  <enum_map name="M">
    <item name="X" value="1" struct="S1"/>
    <item name="Y" value="2" struct="S2"/>
  </enum_map>
</protocol>"#,
    );
    let (descriptor, _sink) = compile_descriptor(&path, &[]).expect("compiles");
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    let em = &protocol.enum_maps[0];
    assert_eq!(em.id_to_struct.get(&1).unwrap().name, "S1");
    assert_eq!(em.id_to_struct.get(&2).unwrap().name, "S2");
    assert_eq!(*em.struct_to_id.get("S1").unwrap(), 1);
    assert_eq!(*em.struct_to_id.get("S2").unwrap(), 2);
    assert!(matches!(em.items[0].value, EnumMapItemValue::Int(1)));

    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).expect("mkdir");
    let mut compiler = Compiler::new(&path);
    compiler.output_dir(&out_dir).language(Language::Cpp);
    compiler.run().expect("compiles");
    let header = std::fs::read_to_string(out_dir.join("m.h")).expect("read header");
    assert!(header.contains("M::id<S1>::value = X"));
    assert!(header.contains("M::id<S2>::value = Y"));
    let source = std::fs::read_to_string(out_dir.join("m.cc")).expect("read source");
    assert!(source.contains("#include <algorithm>"));
}

#[test]
fn import_cycle_resolves_both_protocols_without_duplication() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), "a.xml", r#"<protocol><import>b.xml</import></protocol>"#);
    write_fixture(dir.path(), "b.xml", r#"<protocol><import>a.xml</import></protocol>"#);
    let a_path = dir.path().join("a.xml");

    let (descriptor, _sink) =
        compile_descriptor(&a_path, &[dir.path().to_path_buf()]).expect("cycle terminates cleanly");
    assert_eq!(descriptor.protocols.len(), 2);
    assert!(descriptor.get("a").is_some());
    assert!(descriptor.get("b").is_some());
}

#[test]
fn self_import_is_a_fatal_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "a.xml", r#"<protocol><import>a.xml</import></protocol>"#);
    let err = compile_descriptor(&path, &[]).unwrap_err();
    assert!(err.to_string().contains("can not import self"));
}

#[test]
fn unreferenced_import_produces_a_warning_not_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), "q.xml", r#"<protocol></protocol>"#);
    let p_path = write_fixture(dir.path(), "p.xml", r#"<protocol><import>q.xml</import></protocol>"#);

    let (descriptor, sink) = compile_descriptor(&p_path, &[dir.path().to_path_buf()]).expect("compiles");
    assert!(!sink.is_empty());
    let root = descriptor.root_protocol();
    let protocol = root.borrow();
    let import = protocol.find_import("q").unwrap();
    assert!(!import.is_ref_by_enum && !import.is_ref_by_struct && !import.is_ref_by_enum_map);
}

#[test]
fn byte_identical_output_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(
        dir.path(),
        "r.xml",
        r#"<protocol><struct name="R"><required name="a" type="i32"/><optional name="b" type="string"/></struct></protocol>"#,
    );
    let out1 = dir.path().join("out1");
    let out2 = dir.path().join("out2");
    std::fs::create_dir(&out1).expect("mkdir");
    std::fs::create_dir(&out2).expect("mkdir");

    for out in [&out1, &out2] {
        let mut compiler = Compiler::new(&path);
        compiler.output_dir(out).language(Language::Cpp);
        compiler.run().expect("compiles");
    }

    let h1 = std::fs::read(out1.join("r.h")).expect("read header 1");
    let h2 = std::fs::read(out2.join("r.h")).expect("read header 2");
    assert_eq!(h1, h2);
    let c1 = std::fs::read(out1.join("r.cc")).expect("read source 1");
    let c2 = std::fs::read(out2.join("r.cc")).expect("read source 2");
    assert_eq!(c1, c2);
}

#[test]
fn unknown_child_in_struct_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "s.xml", r#"<protocol><struct name="S"><bogus name="a" type="i32"/></struct></protocol>"#);
    let err = compile_descriptor(&path, &[]).unwrap_err();
    assert!(err.to_string().contains("unexpected child"));
}
