//! CLI integration tests for msaccess-pg-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes, and the ddl/order subcommands against a catalog captured
//! through the library API.

use assert_cmd::Command;
use msaccess_pg_migrate::source::memory::{MemoryReader, MemoryTable};
use msaccess_pg_migrate::{RunLog, SchemaCatalog};
use predicates::prelude::*;
use std::path::Path;

/// Get a command for the msaccess-pg-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("msaccess-pg-migrate").unwrap()
}

/// Write a config file plus an empty source file into `dir`.
fn write_config(dir: &Path) -> std::path::PathBuf {
    let source = dir.join("sample.mdb");
    std::fs::write(&source, b"").unwrap();
    let config = dir.join("config.yaml");
    std::fs::write(
        &config,
        format!(
            "source_db: {}\noutput_dir: {}\ntarget:\n  host: localhost\n  \
             database: t\n  user: u\nactions:\n  write_sql: true\n",
            source.display(),
            dir.display()
        ),
    )
    .unwrap();
    config
}

/// Capture a two-table schema into the catalog beside the source file.
fn capture_catalog(dir: &Path) {
    let mut reader = MemoryReader::new();
    reader.push_table(
        MemoryTable::new("parent")
            .with_column("id", "LONG", 0)
            .with_column("name", "TEXT", 50)
            .with_primary_key(&["id"]),
    );
    reader.push_table(
        MemoryTable::new("child")
            .with_column("id", "LONG", 0)
            .with_column("parent_id", "LONG", 0)
            .with_primary_key(&["id"]),
    );
    reader.push_foreign_key("childparent", "child", "parent_id", "parent", "id");

    let mut catalog = SchemaCatalog::create(dir.join("sample_struct.db")).unwrap();
    let mut log = RunLog::new();
    catalog.populate(&mut reader, &mut log).unwrap();
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("ddl"))
        .stdout(predicate::str::contains("order"));
}

#[test]
fn test_ddl_subcommand_help() {
    cmd()
        .args(["ddl", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stdout"))
        .stdout(predicate::str::contains("--target-schema"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("msaccess-pg-migrate"));
}

// =============================================================================
// Validate Tests
// =============================================================================

#[test]
fn test_validate_missing_config_fails() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_validate_bad_output_dir_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(
        &config,
        "source_db: /nonexistent/db.mdb\noutput_dir: /nonexistent/out\n\
         target:\n  host: h\n  database: d\n  user: u\n",
    )
    .unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Output directory"));
}

#[test]
fn test_validate_success() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

// =============================================================================
// Ddl and Order Tests
// =============================================================================

#[test]
fn test_ddl_without_catalog_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "ddl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Catalog not populated"));
}

#[test]
fn test_ddl_stdout_emits_script() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    capture_catalog(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "ddl", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create table parent"))
        .stdout(predicate::str::contains("child_parent_id_fkeys"))
        .stdout(predicate::str::starts_with("BEGIN;"));
}

#[test]
fn test_ddl_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    capture_catalog(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "ddl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_CREATE_TABLES.sql"));

    let sql = std::fs::read_to_string(dir.path().join("_CREATE_TABLES.sql")).unwrap();
    assert!(sql.contains("create table child"));
}

#[test]
fn test_ddl_target_schema_override() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    capture_catalog(dir.path());

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "ddl",
            "--stdout",
            "--target-schema",
            "archive",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("create schema if not exists archive"));
}

#[test]
fn test_order_prints_parent_first() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    capture_catalog(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "order"])
        .assert()
        .success()
        .stdout(predicate::str::diff("parent\nchild\n"));

    let artifact = std::fs::read_to_string(dir.path().join("_TABLES_NAMES.txt")).unwrap();
    assert_eq!(artifact, "parent\nchild\n");
}

#[test]
fn test_order_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    capture_catalog(dir.path());

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "--output-json",
            "order",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"load_order\":[\"parent\",\"child\"]"));
}
