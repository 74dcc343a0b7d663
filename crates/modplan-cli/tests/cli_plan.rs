use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn modplan_cmd() -> Command {
    Command::cargo_bin("modplan").unwrap()
}

fn write_plan(tmp: &TempDir, content: &str) -> PathBuf {
    let path = tmp.path().join("plan.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_plan_orders_dependencies_first() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        &tmp,
        r#"
[[item]]
name = "addon"
version = "1.0"
action = "install"
depends = [{ name = "base", version = ">=1.0" }]

[[item]]
name = "base"
version = "1.0"
"#,
    );

    let output = modplan_cmd().arg("plan").arg(&plan).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let base = stdout.find("install base 1.0").unwrap();
    let addon = stdout.find("install addon 1.0").unwrap();
    assert!(base < addon);
}

#[test]
fn test_plan_shows_upgrade_transition() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        &tmp,
        r#"
[[item]]
name = "blog"
version = "2.0"
installed = "1.4"
action = "upgrade"
"#,
    );

    modplan_cmd()
        .arg("plan")
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("upgrade blog 1.4 -> 2.0"));

    modplan_cmd()
        .arg("plan")
        .arg(&plan)
        .arg("--no-upgrades")
        .assert()
        .success()
        .stdout(predicate::str::contains("blog").not())
        .stderr(predicate::str::contains("nothing to do"));
}

#[test]
fn test_plan_json_output() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        &tmp,
        r#"
[[item]]
name = "core"
installed = "1.0"
action = "remove"

[[item]]
name = "fresh"
version = "0.3"
action = "install"
"#,
    );

    let output = modplan_cmd()
        .args(["plan", "--json"])
        .arg(&plan)
        .output()
        .unwrap();
    assert!(output.status.success());
    let chain: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        chain,
        serde_json::json!([
            { "name": "core", "action": "remove", "from": "1.0", "to": null },
            { "name": "fresh", "action": "install", "from": null, "to": "0.3" },
        ])
    );
}

#[test]
fn test_plan_rejects_removal_of_needed_item() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        &tmp,
        r#"
[[item]]
name = "core"
version = "1.0"
installed = "1.0"
action = "remove"

[[item]]
name = "plugin"
version = "1.0"
installed = "1.0"
depends = [{ name = "core", version = ">=1.0" }]
"#,
    );

    modplan_cmd()
        .arg("plan")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("`core` cannot be removed"));
}

#[test]
fn test_plan_cascade_from_resolver_table() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        &tmp,
        r#"
[resolver]
cascade-removals = true

[[item]]
name = "core"
installed = "1.0"
action = "remove"

[[item]]
name = "plugin"
installed = "1.0"
depends = ["core"]
"#,
    );

    let output = modplan_cmd().arg("plan").arg(&plan).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let plugin = stdout.find("remove plugin").unwrap();
    let core = stdout.find("remove core").unwrap();
    assert!(plugin < core);
}

#[test]
fn test_plan_missing_file_fails() {
    let tmp = TempDir::new().unwrap();

    modplan_cmd()
        .arg("plan")
        .arg(tmp.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_plan_malformed_file_fails() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(&tmp, "[[item]]\nname = \n");

    modplan_cmd()
        .arg("plan")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse plan file"));
}
