//! Integration tests for the `propmangle` binary.

use std::path::Path;
use std::process::{Command, Output};

fn propmangle(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_propmangle"))
        .arg("--cwd")
        .arg(cwd)
        .args(args)
        .output()
        .expect("Failed to run propmangle")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.trim().starts_with('{'),
        "stdout should begin with '{{': {stdout}"
    );
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

#[test]
fn test_mangle_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.js"), "foo.bar = 1; log(foo);").unwrap();

    let output = propmangle(dir.path(), &["mangle", "app.js"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "B.A = 1;\nC(B);\n");
}

#[test]
fn test_shared_cache_across_out_dir_files() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(src.join("lib")).unwrap();
    std::fs::write(src.join("a.js"), "api.fetchUser = 1;").unwrap();
    std::fs::write(src.join("lib/b.js"), "api.fetchUser();").unwrap();
    std::fs::write(src.join("readme.md"), "# not a script").unwrap();

    let output = propmangle(dir.path(), &["--json", "mangle", "src", "--out-dir", "dist"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    assert_eq!(json["names"], 2);
    assert_eq!(json["seed"], 2);

    let a = std::fs::read_to_string(dir.path().join("dist/a.js")).unwrap();
    let b = std::fs::read_to_string(dir.path().join("dist/lib/b.js")).unwrap();
    assert_eq!(a, "B.A = 1;\n");
    assert_eq!(b, "B.A();\n");
    assert!(!dir.path().join("dist/readme.md").exists());
}

#[test]
fn test_name_map_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("one.js"), "o.alpha;").unwrap();
    std::fs::write(dir.path().join("two.js"), "o.beta; o.alpha;").unwrap();

    let first = propmangle(dir.path(), &["mangle", "one.js", "--name-map", "names.json"]);
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    let map: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("names.json")).unwrap()).unwrap();
    assert_eq!(map["names"]["alpha"], "A");
    assert_eq!(map["names"]["o"], "B");
    assert_eq!(map["seed"], 2);

    let second = propmangle(dir.path(), &["mangle", "two.js", "--load-name-map", "names.json"]);
    assert!(second.status.success(), "stderr: {}", String::from_utf8_lossy(&second.stderr));
    assert_eq!(String::from_utf8_lossy(&second.stdout), "B.C;\nB.A;\n");
}

#[test]
fn test_config_file_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("propmangle.json"), r#"{"reservedNames": ["keep"]}"#).unwrap();
    std::fs::write(dir.path().join("app.js"), "o.keep = o.drop;").unwrap();

    let output = propmangle(dir.path(), &["mangle", "app.js", "--reserved", "o", "--minify"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "o.keep=o.A");
}

#[test]
fn test_debug_flag() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.js"), "foo.bar;").unwrap();

    let output = propmangle(dir.path(), &["mangle", "app.js", "--debug", "--debug-suffix", "xyz"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "_$foo$xyz_._$bar$xyz_;\n");
}

#[test]
fn test_parse_error_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.js"), "var = 1;").unwrap();

    let output = propmangle(dir.path(), &["--json", "mangle", "bad.js"]);
    assert!(!output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "PARSE_ERROR");
    assert!(json["error"]["message"].as_str().unwrap().contains("bad.js:1:"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = propmangle(dir.path(), &["mangle", "missing.js"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_version_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = propmangle(dir.path(), &["--json", "version"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["name"], "propmangle");
    assert!(json.get("version").is_some());
    assert_eq!(json["schema_version"], 1);
}
