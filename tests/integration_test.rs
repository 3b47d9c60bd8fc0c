use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_package(dir: &Path, name: &str, deps: &[&str], files: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    let deps: serde_json::Map<String, serde_json::Value> =
        deps.iter().map(|d| (d.to_string(), json!("*"))).collect();
    fs::write(
        dir.join("package.json"),
        json!({ "name": name, "version": "1.2.3", "dependencies": deps }).to_string(),
    )
    .unwrap();
    for file in files {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("// {}", file)).unwrap();
    }
}

/// A project with a builtin SDK under node_modules/@builtin, a local package
/// and a registry package.
fn project(root: &Path) {
    let nm = root.join("node_modules");
    write_package(&nm.join("@builtin/widgets"), "@builtin/widgets", &[], &["index.js", "button.js"]);
    write_package(&root.join("local/helpers"), "helpers", &["left-pad"], &["index.js"]);
    write_package(&nm.join("left-pad"), "left-pad", &[], &["index.js", "pad.js"]);
}

fn fjspm(root: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("fjspm"));
    cmd.arg("--root").arg(root).env_remove("FJSPM_TOLERANT").env_remove("FJSPM_OUT");
    cmd
}

#[test]
fn test_resolve_prints_report() {
    let tmp = tempdir().unwrap();
    project(tmp.path());

    fjspm(tmp.path())
        .args(["resolve", "@builtin/widgets", "./local/helpers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved 3 package(s)"))
        .stdout(predicate::str::contains("@builtin/widgets [builtin] 1.2.3"))
        .stdout(predicate::str::contains("left-pad [registry] 1.2.3 - 3 file(s)"));
}

#[test]
fn test_resolve_json_map() {
    let tmp = tempdir().unwrap();
    project(tmp.path());

    let output = fjspm(tmp.path())
        .args(["resolve", "--json", "left-pad"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let map: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(map["left-pad"]["tier"], "registry");
    assert_eq!(map["left-pad"]["exports"]["Pad"], "pad.js");
    assert_eq!(map["left-pad"]["exports"]["default"], "index.js");
}

#[test]
fn test_missing_builtin_strict_fails() {
    let tmp = tempdir().unwrap();
    write_package(&tmp.path().join("node_modules/left-pad"), "left-pad", &[], &["index.js"]);

    fjspm(tmp.path())
        .args(["resolve", "@builtin/widgets", "left-pad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("@builtin/widgets"))
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_missing_builtin_tolerant_warns() {
    let tmp = tempdir().unwrap();
    write_package(&tmp.path().join("node_modules/left-pad"), "left-pad", &[], &["index.js"]);

    fjspm(tmp.path())
        .args(["--tolerant", "resolve", "@builtin/widgets", "left-pad"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Missing packages:"))
        .stdout(predicate::str::contains("hint: check that the SDK"))
        .stdout(predicate::str::contains("2 file(s) total"));
}

#[test]
fn test_cycle_fails_with_path() {
    let tmp = tempdir().unwrap();
    let nm = tmp.path().join("node_modules");
    write_package(&nm.join("a"), "a", &["b"], &["index.js"]);
    write_package(&nm.join("b"), "b", &["a"], &["index.js"]);

    fjspm(tmp.path())
        .args(["resolve", "a"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[circular-dependency]"))
        .stderr(predicate::str::contains("a -> b -> a"));
}

#[test]
fn test_install_from_imports_file() {
    let tmp = tempdir().unwrap();
    project(tmp.path());
    let nm = tmp.path().join("node_modules");
    write_package(&nm.join("left-pad/node_modules/shared"), "shared", &[], &["index.js"]);
    write_package(&nm.join("right-pad"), "right-pad", &[], &["index.js"]);
    write_package(&nm.join("right-pad/node_modules/shared"), "shared", &[], &["index.js"]);

    let imports = tmp.path().join("imports.json");
    fs::write(
        &imports,
        json!([
            { "specifier": "@builtin/widgets" },
            { "source": "./local/helpers" },
            "right-pad"
        ])
        .to_string(),
    )
    .unwrap();
    let out = tmp.path().join("out");

    fjspm(tmp.path())
        .arg("install")
        .arg("--imports")
        .arg(&imports)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 attempted, 4 succeeded, 0 failed"))
        .stdout(predicate::str::contains("duplicate shared not copied"));

    assert!(out.join("packages/widgets/button.js").is_file());
    assert!(out.join("packages/left-pad/pad.js").is_file());
    assert!(out.join("local/helpers/index.js").is_file());

    let copies = [
        out.join("packages/left-pad/node_modules/shared"),
        out.join("packages/right-pad/node_modules/shared"),
    ]
    .iter()
    .filter(|p| p.is_dir())
    .count();
    assert_eq!(copies, 1);
}

#[test]
fn test_malformed_descriptor_strict_fails_tolerant_installs_rest() {
    let tmp = tempdir().unwrap();
    let nm = tmp.path().join("node_modules");
    write_package(&nm.join("left-pad"), "left-pad", &[], &["index.js"]);
    fs::create_dir_all(nm.join("broken")).unwrap();
    fs::write(nm.join("broken/package.json"), "{ not json").unwrap();
    let out = tmp.path().join("out");

    fjspm(tmp.path())
        .args(["install", "broken", "left-pad", "--out"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid descriptor for 'broken'"));
    assert!(!out.join("packages/left-pad").exists());

    fjspm(tmp.path())
        .args(["--tolerant", "install", "broken", "left-pad", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("broken: failed: Invalid descriptor"))
        .stdout(predicate::str::contains("2 attempted, 1 succeeded, 1 failed"));
    assert!(out.join("packages/left-pad/index.js").is_file());
    assert!(!out.join("packages/broken").exists());
}

#[test]
fn test_check_export() {
    let tmp = tempdir().unwrap();
    project(tmp.path());

    fjspm(tmp.path())
        .args(["check-export", "@builtin/widgets", "Button"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@builtin/widgets exports Button"));

    fjspm(tmp.path())
        .args(["check-export", "left-pad", "Trim"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not export Trim"))
        .stderr(predicate::str::contains("Pad"));
}
