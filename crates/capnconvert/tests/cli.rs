//! Command-line behavior of the `capnconvert` binary.

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn capnconvert(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("capnconvert").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("RUST_LOG");
    cmd
}

fn module() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("go.mod"), "module example.com/app\n");
    write(
        &dir.path().join("models/models.go"),
        "package models\n\ntype Account struct {\n\tOwner string\n\tBalance int64\n}\n",
    );
    write(
        &dir.path().join("api.go"),
        r#"package api

import "example.com/app/models"

type Transfer struct {
	ID     int
	From   models.Account
	Amount float64
}

type Bank interface {
	Send(t Transfer) (bool, error)
}
"#,
    );
    dir
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn convert_prints_schema() {
    let dir = module();
    let stdout = stdout_of(capnconvert(dir.path()).arg("convert").arg(dir.path().join("api.go")));

    assert!(stdout.starts_with("using Go = import \"/go.capnp\";\n@0x"));
    assert!(stdout.contains("$Go.package(\"contract_impl\");\n"));
    assert!(stdout.contains(
        "struct Transfer {\n  id @0 :Int32;\n  from @1 :Account;\n  amount @2 :Float64;\n}\n"
    ));
    assert!(stdout.contains("struct Account {\n  owner @0 :Text;\n  balance @1 :Int64;\n}\n"));
    assert!(stdout.contains(
        "interface Bank {\n  send @0 (t :Transfer) -> (result0 :Bool, result1 :Text);\n}\n"
    ));
    assert!(stdout.ends_with("}\n\n"), "{stdout:?}");
}

#[test]
fn annotation_flags_override_config() {
    let dir = module();
    write(
        &dir.path().join(".capnconvert/config.toml"),
        "[schema]\ngo_package = \"from_config\"\ngo_import = \"example.com/config\"\n",
    );

    let stdout = stdout_of(
        capnconvert(dir.path())
            .arg("convert")
            .arg(dir.path().join("api.go"))
            .args(["--go-package", "from_flag"]),
    );
    assert!(stdout.contains("$Go.package(\"from_flag\");\n"));
    assert!(stdout.contains("$Go.import(\"example.com/config\");\n"));
}

#[test]
fn output_file_and_json_format() {
    let dir = module();
    let out = dir.path().join("out/schema.json");
    fs::create_dir_all(out.parent().unwrap()).unwrap();

    capnconvert(dir.path())
        .arg("convert")
        .arg(dir.path().join("api.go"))
        .args(["--format", "json", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout("");

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["id"].as_str().unwrap().len(), 16);
    assert_eq!(json["structs"][0]["name"], "Transfer");
    assert_eq!(json["imported_structs"][0]["origin"]["name"], "Account");
    assert_eq!(json["interfaces"][0]["methods"][0]["name"], "send");
}

#[test]
fn conversion_failure_reported_on_stdout() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("bad.go"), "package p\n\ntype Broken struct {\n");

    let output = capnconvert(dir.path())
        .arg("convert")
        .arg(dir.path().join("bad.go"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(
        stdout.starts_with("Error converting Go to Cap'n Proto: "),
        "{stdout}"
    );
    assert!(stdout.contains("syntax error"));
}

#[test]
fn missing_subcommand_is_usage_error() {
    let dir = TempDir::new().unwrap();
    capnconvert(dir.path()).assert().failure();
}
