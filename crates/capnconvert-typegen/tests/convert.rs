//! End-to-end conversion of Go files laid out as real modules.

use capnconvert_typegen::{
    ConvertError, EmitOptions, GoEnv, GoResolver, convert_with_resolver, extract_document,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn isolated_env() -> GoEnv {
    GoEnv {
        goroot: None,
        gopath: None,
        gomodcache: None,
        vendor: true,
    }
}

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

fn convert(path: &Path) -> Result<String, ConvertError> {
    let resolver = GoResolver::for_file(path, isolated_env());
    convert_with_resolver(path, &resolver, &EmitOptions::default())
}

/// Replace the random file ID so output can be compared.
fn normalize_id(schema: &str) -> String {
    schema
        .lines()
        .map(|line| {
            if line.starts_with("@0x") {
                "@0x<id>"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_module(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn converts_fixture_module() {
    let schema = convert(&testdata("test_file.go")).unwrap();
    insta::assert_snapshot!(normalize_id(&schema), @r#"
    using Go = import "/go.capnp";
    @0x<id>
    $Go.package("contract_impl");
    $Go.import("github.com/RedUndercover/capnconvert-go/testdata/contract");

    struct SimpleStruct {
      id @0 :Int32;
      name @1 :Text;
    }
    struct NestedStruct {
      simple @0 :SimpleStruct;
      value @1 :Float64;
    }
    struct ComplexStruct {
      embeddedImport @0 :ImportedStruct;
      anotherField @1 :Text;
      nested @2 :AnotherImportedStruct;
    }
    struct ImportedStruct {
      field1 @0 :Text;
      field2 @1 :Int32;
    }
    struct AnotherImportedStruct {
      fieldA @0 :Bool;
      fieldB @1 :Bool;
      detail @2 :Detail;
    }
    struct Detail {
      notes @0 :List(Text);
    }
    interface MyInterface {
      foo @0 (x :Int32) -> (result0 :SimpleStruct);
      bar @1 (y :Text) -> (result0 :Text);
      baz @2 (arr :List(Int32)) -> (result0 :List(Text));
      multipleReturns @3 () -> (result0 :Int32, result1 :Text);
      nestedReturn @4 () -> (result0 :NestedStruct);
      importTest @5 () -> (result0 :ImportedStruct);
    }
    interface AnotherInterface {
      complexMethod @0 (x :ImportedStruct) -> (result0 :AnotherImportedStruct, result1 :Text);
    }
    "#);
}

#[test]
fn each_conversion_gets_fresh_id() {
    let path = testdata("test_file.go");
    let resolver = GoResolver::for_file(&path, isolated_env());
    let first = extract_document(&path, &resolver).unwrap();
    let second = extract_document(&path, &resolver).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.declarations, second.declarations);
    for id in [&first.id, &second.id] {
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

#[test]
fn primitive_struct_ordinals_follow_declaration_order() {
    let dir = write_module(&[
        ("go.mod", "module example.com/app\n"),
        (
            "p.go",
            "package app\n\ntype P struct {\n\tA int8\n\tB uint16\n\tC float32\n\tD bool\n\tE byte\n}\n\ntype Q struct {\n\tP\n}\n",
        ),
    ]);
    let schema = convert(&dir.path().join("p.go")).unwrap();
    assert!(schema.contains(
        "struct P {\n  a @0 :Int8;\n  b @1 :UInt16;\n  c @2 :Float32;\n  d @3 :Bool;\n  e @4 :UInt8;\n}\n"
    ));
    assert!(schema.contains("struct Q {\n  p @0 :P;\n}\n"));
}

#[test]
fn nested_slices_and_pointers() {
    let dir = write_module(&[
        ("go.mod", "module example.com/app\n"),
        (
            "grid.go",
            "package app\n\ntype Grid struct {\n\tCells [][]int\n\tOwner *string\n\tRows []*Row\n}\n\ntype Row struct{ N int64 }\n",
        ),
    ]);
    let schema = convert(&dir.path().join("grid.go")).unwrap();
    assert!(schema.contains("  cells @0 :List(List(Int32));\n"));
    assert!(schema.contains("  owner @1 :Text;\n"));
    assert!(schema.contains("  rows @2 :List(Row);\n"));
}

#[test]
fn replace_directive_and_transitive_packages() {
    let dir = write_module(&[
        (
            "app/go.mod",
            "module example.com/app\n\nrequire example.com/shared v0.1.0\n\nreplace example.com/shared => ../shared\n",
        ),
        (
            "app/api.go",
            "package api\n\nimport wire \"example.com/shared/wire\"\n\ntype Request struct {\n\tEnvelope wire.Envelope\n}\n",
        ),
        ("shared/go.mod", "module example.com/shared\n"),
        (
            "shared/wire/wire.go",
            "package wire\n\nimport \"example.com/shared/meta\"\n\ntype Envelope struct {\n\tHeader meta.Header\n\tBody   []byte\n}\n",
        ),
        (
            "shared/meta/meta.go",
            "package meta\n\ntype Header struct {\n\tTrace string\n}\n",
        ),
    ]);
    let schema = convert(&dir.path().join("app/api.go")).unwrap();
    assert!(schema.contains("struct Request {\n  envelope @0 :Envelope;\n}\n"));
    assert!(schema.contains("struct Envelope {\n  header @0 :Header;\n  body @1 :List(UInt8);\n}\n"));
    assert!(schema.contains("struct Header {\n  trace @0 :Text;\n}\n"));
}

#[test]
fn syntax_error_reports_location() {
    let dir = write_module(&[("bad.go", "package p\n\ntype Broken struct {\n\tA int\n")]);
    let err = convert(&dir.path().join("bad.go")).unwrap_err();
    assert!(matches!(err, ConvertError::Parse { .. }), "{err:?}");
    assert!(err.to_string().contains("bad.go:"));
}

#[test]
fn missing_import_is_type_error() {
    let dir = write_module(&[
        ("go.mod", "module example.com/app\n"),
        (
            "main.go",
            "package main\n\nimport \"example.com/app/nowhere\"\n\ntype A struct{ X nowhere.Thing }\n",
        ),
    ]);
    let err = convert(&dir.path().join("main.go")).unwrap_err();
    assert!(
        err.to_string()
            .contains("could not import example.com/app/nowhere"),
        "{err}"
    );
}

#[test]
fn missing_input_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = convert(&dir.path().join("absent.go")).unwrap_err();
    assert!(matches!(err, ConvertError::Io { .. }));
}

#[test]
fn unsupported_field_type_is_rejected() {
    let dir = write_module(&[(
        "m.go",
        "package p\n\ntype Handlers struct {\n\tOnEvent func(int) error\n}\n",
    )]);
    let err = convert(&dir.path().join("m.go")).unwrap_err();
    match err {
        ConvertError::UnsupportedType { kind, context, .. } => {
            assert_eq!(kind, "function");
            assert_eq!(context, "field of struct Handlers");
        }
        other => panic!("expected unsupported type, got {other:?}"),
    }
}

#[test]
fn alias_to_imported_struct_emits_target() {
    let dir = write_module(&[
        ("go.mod", "module example.com/app\n"),
        (
            "dep/dep.go",
            "package dep\n\ntype Item struct {\n\tSKU string\n\tQty int32\n}\n",
        ),
        (
            "main.go",
            "package main\n\nimport \"example.com/app/dep\"\n\ntype Item = dep.Item\n\ntype C struct {\n\tI Item\n}\n",
        ),
    ]);
    let schema = convert(&dir.path().join("main.go")).unwrap();
    assert!(schema.contains("struct C {\n  i @0 :Item;\n}\n"), "{schema}");
    assert!(
        schema.contains("struct Item {\n  sku @0 :Text;\n  qty @1 :Int32;\n}\n"),
        "{schema}"
    );
}

#[test]
fn transitive_struct_with_function_field_still_converts() {
    let dir = write_module(&[
        ("go.mod", "module example.com/app\n"),
        (
            "outer/outer.go",
            "package outer\n\nimport \"example.com/app/inner\"\n\ntype Wrapper struct {\n\tB inner.Box\n}\n",
        ),
        (
            "inner/inner.go",
            "package inner\n\ntype Box struct {\n\tN      int\n\tOnDone func()\n}\n",
        ),
        (
            "main.go",
            "package main\n\nimport \"example.com/app/outer\"\n\ntype C struct {\n\tW outer.Wrapper\n}\n",
        ),
    ]);
    let schema = convert(&dir.path().join("main.go")).unwrap();
    assert!(schema.contains("struct Wrapper {\n  b @0 :Box;\n}\n"), "{schema}");
    assert!(schema.contains("struct Box {\n  n @0 :Int32;\n}\n"), "{schema}");
}

#[test]
fn generic_struct_converts_alongside_others() {
    let dir = write_module(&[
        ("go.mod", "module example.com/app\n"),
        (
            "main.go",
            "package main\n\ntype P struct {\n\tID   int\n\tName string\n}\n\ntype Set[T comparable] struct {\n\tItems []T\n}\n",
        ),
    ]);
    let schema = convert(&dir.path().join("main.go")).unwrap();
    assert!(
        schema.contains("struct P {\n  id @0 :Int32;\n  name @1 :Text;\n}\n"),
        "{schema}"
    );
    assert!(schema.contains("struct Set {\n  items @0 :List(T);\n}\n"), "{schema}");
}
