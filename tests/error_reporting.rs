// Verifies that semantic and structural errors are reported in the exact
// `error:FILE:LINE: MSG` / `error: MSG` wire format, through the library's
// `CompileError::to_diagnostic` rendering.

mod common;

use common::write_fixture;
use exchangec::parser::compile_descriptor;

fn compile_error(xml: &str) -> String {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "p.xml", xml);
    let err = compile_descriptor(&path, &[]).expect_err("expected a compile error");
    err.to_diagnostic().to_string()
}

#[test]
fn duplicate_type_name_across_enum_and_struct_reports_line() {
    let msg = compile_error(
        r#"<protocol>
  <enum name="Dup"><item name="A"/></enum>
  <struct name="Dup"><required name="a" type="i32"/></struct>
</protocol>"#,
    );
    assert!(msg.starts_with("error:"), "got: {msg}");
    assert!(msg.contains(":3:"), "got: {msg}");
    assert!(msg.contains("duplicate type name `Dup`"), "got: {msg}");
}

#[test]
fn invalid_identifier_is_rejected() {
    let msg = compile_error(r#"<protocol><struct name="9Bad"></struct></protocol>"#);
    assert!(msg.contains("invalid identifier `9Bad`"), "got: {msg}");
}

#[test]
fn unresolved_type_reference_is_rejected() {
    let msg = compile_error(r#"<protocol><struct name="S"><required name="a" type="Nope"/></struct></protocol>"#);
    assert!(msg.contains("unresolved type `Nope`"), "got: {msg}");
}

#[test]
fn unknown_struct_child_tag_is_rejected() {
    let msg = compile_error(r#"<protocol><struct name="S"><weird name="a" type="i32"/></struct></protocol>"#);
    assert!(msg.contains("unexpected child `<weird>`"), "got: {msg}");
}

#[test]
fn non_monotonic_enum_map_value_is_rejected() {
    let msg = compile_error(
        r#"<protocol><enum_map name="M"><item name="A" value="5"/><item name="B" value="1"/></enum_map></protocol>"#,
    );
    assert!(msg.contains("monotonically non-decreasing"), "got: {msg}");
}

#[test]
fn protocol_not_found_has_no_line_number() {
    let err = compile_descriptor(std::path::Path::new("does-not-exist.xml"), &[]).unwrap_err();
    let msg = err.to_diagnostic().to_string();
    assert!(msg.starts_with("error: can not find protocol file"), "got: {msg}");
}
