//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the Access database file (.mdb / .accdb) to migrate.
    pub source_db: PathBuf,

    /// Directory where generated artifacts are written (must exist).
    pub output_dir: PathBuf,

    /// Target schema name; empty means the default schema (public).
    #[serde(default)]
    pub schema_name: String,

    /// Target database (PostgreSQL) connection parameters.
    pub target: TargetConfig,

    /// Which pipeline stages to run in this invocation.
    #[serde(default)]
    pub actions: Actions,
}

impl Config {
    /// Path of the catalog store: `{stem}_struct.db` beside the source file.
    pub fn catalog_path(&self) -> PathBuf {
        let stem = self
            .source_db
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "db".to_string());
        let file = format!("{}_struct.db", stem);
        match self.source_db.parent() {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }

    /// Path of a generated artifact inside the output directory.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// Target database (PostgreSQL) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// SSL mode (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,
}

/// Boolean switches selecting the stages of one invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Actions {
    /// Capture the source structure into the catalog store.
    #[serde(default)]
    pub capture_structure: bool,

    /// Emit the DDL file and the ordered table list.
    #[serde(default)]
    pub write_sql: bool,

    /// Export each table's rows to a CSV file plus the \copy artifact.
    #[serde(default)]
    pub export_csv: bool,

    /// Run the upsert pass against the live target.
    #[serde(default)]
    pub run_upsert: bool,
}

impl Actions {
    /// Whether any stage needs the live source database.
    pub fn needs_source(&self) -> bool {
        self.capture_structure || self.export_csv || self.run_upsert
    }

    /// Whether any stage was selected at all.
    pub fn any(&self) -> bool {
        self.capture_structure || self.write_sql || self.export_csv || self.run_upsert
    }
}

/// Generated artifact file names.
pub mod artifacts {
    /// Ordered table list, one normalized name per line.
    pub const TABLES_NAMES: &str = "_TABLES_NAMES.txt";
    /// Schema-creation DDL, one transaction.
    pub const CREATE_TABLES: &str = "_CREATE_TABLES.sql";
    /// psql \copy metacommands, one per table.
    pub const COPYFROM: &str = "_COPYFROM.txt";
    /// Run-scoped diagnostic log.
    pub const APP_LOG: &str = "app.log";
}

fn default_pg_port() -> u16 {
    5432
}

fn default_prefer() -> String {
    "prefer".to_string()
}
