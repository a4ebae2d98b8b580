//! Integration tests for the formsmith binary
//!
//! Every test runs in its own temporary directory so the default
//! `.formsmith/forms` store never leaks between tests.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const SIGNUP_SCHEMA: &str = r#"
id: form_signup
name: Signup
fields:
  - id: first
    type: { kind: text }
    label: First name
    validation_rules:
      - type: required
  - id: last
    type: { kind: text }
    label: Last name
    order: 1
  - id: email
    type: { kind: text }
    label: Email
    order: 2
    validation_rules:
      - type: required
      - type: email
  - id: full
    type: { kind: text }
    label: Full name
    order: 3
    is_derived: true
    derived_config:
      parent_fields: [first, last]
      computation: concat
"#;

const LOOP_SCHEMA: &str = r#"
id: form_loop
name: Loop
fields:
  - id: x
    type: { kind: number }
    label: X
    is_derived: true
    derived_config: { parent_fields: [y], computation: sum }
  - id: y
    type: { kind: number }
    label: Y
    order: 1
    is_derived: true
    derived_config: { parent_fields: [x], computation: sum }
"#;

/// Build a command running in `dir` with no configuration from the host.
fn formsmith(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("formsmith").expect("binary built");
    cmd.current_dir(dir)
        .env_remove("FORMSMITH_STORE_DIR")
        .env_remove("FORMSMITH_MAX_REFRESH_PASSES")
        .env_remove("FORMSMITH_ERROR_DISPLAY");
    cmd
}

/// Temp directory with the signup schema already imported.
fn workspace_with_signup() -> Result<TempDir> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("signup.yaml"), SIGNUP_SCHEMA)?;
    formsmith(dir.path())
        .args(["import", "signup.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported form_signup (Signup)"));
    Ok(dir)
}

#[test]
fn list_without_store_is_empty() -> Result<()> {
    let dir = TempDir::new()?;
    formsmith(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No form schemas"));
    Ok(())
}

#[test]
fn import_then_list_and_show() -> Result<()> {
    let dir = workspace_with_signup()?;
    assert!(dir.path().join(".formsmith/forms/form_signup.yaml").exists());

    formsmith(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("form_signup"))
        .stdout(predicate::str::contains("Signup"));

    formsmith(dir.path())
        .args(["show", "form_signup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("concat(first, last)"))
        .stdout(predicate::str::contains("required, email"));

    formsmith(dir.path())
        .args(["--format", "json", "show", "form_signup"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "form_signup""#));
    Ok(())
}

#[test]
fn reimport_updates_existing_schema() -> Result<()> {
    let dir = workspace_with_signup()?;
    formsmith(dir.path())
        .args(["import", "signup.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated form_signup"));
    Ok(())
}

#[test]
fn validate_reports_errors_with_warning_exit() -> Result<()> {
    let dir = workspace_with_signup()?;
    std::fs::write(
        dir.path().join("bad.json"),
        r#"{"first": "   ", "email": "ada@example"}"#,
    )?;

    formsmith(dir.path())
        .args(["validate", "form_signup", "bad.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("First name is required"))
        .stdout(predicate::str::contains("Please enter a valid email address"));

    formsmith(dir.path())
        .args(["--format", "json", "validate", "form_signup", "bad.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""is_valid": false"#));
    Ok(())
}

#[test]
fn validate_accepts_good_data() -> Result<()> {
    let dir = workspace_with_signup()?;
    std::fs::write(
        dir.path().join("good.json"),
        r#"{"first": "Ada", "last": "Lovelace", "email": "ada@example.com"}"#,
    )?;

    formsmith(dir.path())
        .args(["validate", "form_signup", "good.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid"));
    Ok(())
}

#[test]
fn derive_prints_refreshed_bag() -> Result<()> {
    let dir = workspace_with_signup()?;
    std::fs::write(
        dir.path().join("data.json"),
        r#"{"first": "Ada", "last": "Lovelace", "full": "stale"}"#,
    )?;

    formsmith(dir.path())
        .args(["derive", "form_signup", "data.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""full": "Ada Lovelace""#));

    formsmith(dir.path())
        .args(["--format", "yaml", "derive", "form_signup", "data.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("full: Ada Lovelace"));
    Ok(())
}

#[test]
fn check_flags_dependency_cycles() -> Result<()> {
    let dir = workspace_with_signup()?;
    formsmith(dir.path())
        .args(["check", "form_signup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No problems found"));

    std::fs::write(dir.path().join("loop.yaml"), LOOP_SCHEMA)?;
    formsmith(dir.path())
        .args(["import", "loop.yaml"])
        .assert()
        .code(1);

    formsmith(dir.path())
        .args(["check", "form_loop"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("part of a dependency cycle"));
    Ok(())
}

#[test]
fn delete_then_show_fails() -> Result<()> {
    let dir = workspace_with_signup()?;
    formsmith(dir.path())
        .args(["delete", "form_signup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted form_signup"));

    formsmith(dir.path())
        .args(["show", "form_signup"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("form schema not found: form_signup"));
    Ok(())
}

#[test]
fn import_rejects_id_outside_store() -> Result<()> {
    let dir = workspace_with_signup()?;
    // From .formsmith/forms this id would name the input file itself
    let sneaky = "id: ../../sneaky\nname: Sneaky\nfields: []\n";
    std::fs::write(dir.path().join("sneaky.yaml"), sneaky)?;

    formsmith(dir.path())
        .args(["import", "sneaky.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid form schema id"));
    assert_eq!(std::fs::read_to_string(dir.path().join("sneaky.yaml"))?, sneaky);

    formsmith(dir.path())
        .args(["delete", "../../sneaky"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid form schema id"));
    assert!(dir.path().join("sneaky.yaml").exists());
    Ok(())
}

#[test]
fn store_flag_and_config_file_pick_directory() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("signup.yaml"), SIGNUP_SCHEMA)?;
    std::fs::write(dir.path().join("formsmith.toml"), "store_dir = \"schemas\"\n")?;

    formsmith(dir.path())
        .args(["import", "signup.yaml"])
        .assert()
        .success();
    assert!(dir.path().join("schemas/form_signup.yaml").exists());

    formsmith(dir.path())
        .args(["--store", "elsewhere", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No form schemas"));
    Ok(())
}
