//! Sequential pipeline coordinator.
//!
//! Runs the selected stages in their fixed order: capture structure,
//! resolve load order, emit DDL, export CSV, run the upsert. Each stage
//! consumes the catalog left by the previous one, so a run can also pick
//! up from an existing catalog store when capture is switched off.
//!
//! The run-scoped diagnostic log is flushed to `app.log` in the output
//! directory on every exit path.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::SchemaCatalog;
use crate::config::{artifacts, Config};
use crate::ddl;
use crate::diag::RunLog;
use crate::error::{MigrateError, Result};
use crate::export;
use crate::resolver;
use crate::source::SourceReader;
use crate::target::TargetExecutor;
use crate::upsert;

/// Summary of one pipeline run, suitable for JSON output.
#[derive(Debug, Default, Serialize)]
pub struct RunResult {
    pub tables_captured: usize,
    pub columns_captured: usize,
    pub relationships_captured: usize,
    /// Resolved load order (source table names).
    pub load_order: Vec<String>,
    /// Path of the emitted DDL file, when `write_sql` ran.
    pub ddl_file: Option<PathBuf>,
    pub tables_exported: usize,
    pub rows_exported: u64,
    pub tables_loaded: usize,
    pub rows_written: u64,
    /// Tables whose upsert failed, with the target error text.
    pub upsert_failures: Vec<String>,
    /// Count of recoverable diagnostics accumulated during the run.
    pub diagnostics: usize,
}

/// Run the configured stages against the given collaborators.
///
/// `target` is only consulted when `run_upsert` is selected; passing
/// `None` with that switch on is a configuration error.
pub fn run(
    config: &Config,
    source: &mut dyn SourceReader,
    target: Option<&mut dyn TargetExecutor>,
) -> Result<RunResult> {
    let mut log = RunLog::new();
    let outcome = run_stages(config, source, target, &mut log);
    if let Err(e) = log.flush(config.artifact_path(artifacts::APP_LOG)) {
        warn!("Could not flush diagnostic log: {}", e);
    }
    match outcome {
        Ok(mut result) => {
            result.diagnostics = log.entries().len();
            Ok(result)
        }
        Err(e) => Err(e),
    }
}

fn run_stages(
    config: &Config,
    source: &mut dyn SourceReader,
    target: Option<&mut dyn TargetExecutor>,
    log: &mut RunLog,
) -> Result<RunResult> {
    config.validate()?;
    if !config.actions.any() {
        return Err(MigrateError::config("no pipeline stage selected"));
    }

    let mut result = RunResult::default();
    let catalog_path = config.catalog_path();

    let catalog = if config.actions.capture_structure {
        info!("Capturing structure into {}", catalog_path.display());
        let mut catalog = SchemaCatalog::create(&catalog_path)?;
        let stats = catalog.populate(source.as_schema_source(), log)?;
        result.tables_captured = stats.tables;
        result.columns_captured = stats.columns;
        result.relationships_captured = stats.relationships;
        catalog
    } else {
        info!("Reusing catalog {}", catalog_path.display());
        SchemaCatalog::open(&catalog_path)?
    };

    let order = resolver::load_order(&catalog)?;
    info!(
        "Resolved load order for {} tables in {} rounds",
        order.tables.len(),
        order.rounds
    );
    export::write_table_names(&order.tables, &config.artifact_path(artifacts::TABLES_NAMES))?;
    result.load_order = order.tables.clone();

    if config.actions.write_sql {
        let sql = ddl::emit_schema(&catalog, &config.schema_name, log)?;
        let path = config.artifact_path(artifacts::CREATE_TABLES);
        std::fs::write(&path, sql)?;
        info!("Wrote DDL to {}", path.display());
        result.ddl_file = Some(path);
    }

    if config.actions.export_csv {
        let report = export::export_tables(
            &catalog,
            source.as_row_source(),
            &config.output_dir,
            &config.artifact_path(artifacts::COPYFROM),
        )?;
        result.tables_exported = report.tables;
        result.rows_exported = report.rows;
    }

    if config.actions.run_upsert {
        let target = target
            .ok_or_else(|| MigrateError::config("run_upsert selected but no target executor"))?;
        let report = upsert::upsert_all(
            &catalog,
            &order.tables,
            source.as_row_source(),
            target,
            &config.schema_name,
            log,
        )?;
        result.tables_loaded = report.tables_loaded;
        result.rows_written = report.rows_written;
        result.upsert_failures = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.table, f.error))
            .collect();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::{MemoryReader, MemoryTable};
    use crate::target::testing::RecordingExecutor;
    use crate::value::SqlValue;

    fn sample_reader() -> MemoryReader {
        let mut reader = MemoryReader::new();
        reader.push_table(
            MemoryTable::new("parent")
                .with_column("id", "LONG", 0)
                .with_column("name", "TEXT", 50)
                .with_primary_key(&["id"])
                .with_row(vec![SqlValue::I32(1), "One".into()]),
        );
        reader.push_table(
            MemoryTable::new("child")
                .with_column("id", "LONG", 0)
                .with_column("parent_id", "LONG", 0)
                .with_primary_key(&["id"])
                .with_row(vec![SqlValue::I32(10), SqlValue::I32(1)]),
        );
        reader.push_foreign_key("childparent", "child", "parent_id", "parent", "id");
        reader
    }

    fn sample_config(dir: &std::path::Path, actions: &str) -> Config {
        let source = dir.join("sample.mdb");
        std::fs::write(&source, b"").unwrap();
        Config::from_yaml(&format!(
            "source_db: {}\noutput_dir: {}\ntarget:\n  host: localhost\n  \
             database: t\n  user: u\nactions:\n{}",
            source.display(),
            dir.display(),
            actions
        ))
        .unwrap()
    }

    #[test]
    fn test_full_run_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(
            dir.path(),
            "  capture_structure: true\n  write_sql: true\n  export_csv: true\n  run_upsert: true\n",
        );
        let mut target = RecordingExecutor::new();

        let result = run(&config, &mut sample_reader(), Some(&mut target)).unwrap();
        assert_eq!(result.tables_captured, 2);
        assert_eq!(result.load_order, vec!["parent", "child"]);
        assert_eq!(result.tables_exported, 2);
        assert_eq!(result.tables_loaded, 2);
        assert_eq!(result.rows_written, 2);
        assert!(result.upsert_failures.is_empty());

        assert!(dir.path().join("sample_struct.db").is_file());
        assert!(dir.path().join("_TABLES_NAMES.txt").is_file());
        assert!(dir.path().join("_CREATE_TABLES.sql").is_file());
        assert!(dir.path().join("_COPYFROM.txt").is_file());
        assert!(dir.path().join("parent.csv").is_file());

        let names = std::fs::read_to_string(dir.path().join("_TABLES_NAMES.txt")).unwrap();
        assert_eq!(names, "parent\nchild\n");
    }

    #[test]
    fn test_no_stage_selected_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path(), "  capture_structure: false\n");
        let err = run(&config, &mut sample_reader(), None).unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }

    #[test]
    fn test_upsert_without_target_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(
            dir.path(),
            "  capture_structure: true\n  run_upsert: true\n",
        );
        let err = run(&config, &mut sample_reader(), None).unwrap_err();
        assert!(err.to_string().contains("no target executor"));
    }

    #[test]
    fn test_ddl_stage_reuses_existing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let capture = sample_config(dir.path(), "  capture_structure: true\n");
        run(&capture, &mut sample_reader(), None).unwrap();

        let ddl_only = sample_config(dir.path(), "  write_sql: true\n");
        let result = run(&ddl_only, &mut sample_reader(), None).unwrap();
        assert!(result.ddl_file.is_some());
        let sql = std::fs::read_to_string(result.ddl_file.unwrap()).unwrap();
        assert!(sql.contains("create table parent"));
    }

    #[test]
    fn test_missing_catalog_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path(), "  write_sql: true\n");
        let err = run(&config, &mut sample_reader(), None).unwrap_err();
        assert!(matches!(err, MigrateError::CatalogNotPopulated(_)));
    }

    #[test]
    fn test_diagnostics_flushed_to_app_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path(), "  capture_structure: true\n");
        let mut reader = sample_reader();
        reader.push_table(MemoryTable::new("blobs").with_column("data", "LONGBINARY", 0));

        let result = run(&config, &mut reader, None).unwrap();
        assert!(result.diagnostics > 0);
        let log = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(log.contains("LONGBINARY"));
    }
}
