//! # msaccess-pg-migrate
//!
//! MS Access to PostgreSQL schema-capture and migration library.
//!
//! This library reads the structure of an Access database through a
//! pluggable introspection driver, records it in a SQLite catalog, and
//! generates everything needed to rebuild and load it in PostgreSQL:
//!
//! - **Schema capture** into a reusable catalog store
//! - **DDL generation** with normalized identifiers and mapped types
//! - **Dependency-ordered loading** so parents land before children
//! - **Upsert execution** against a live target, one commit per table
//! - **CSV export** with matching psql `\copy` commands
//!
//! ## Example
//!
//! ```rust,no_run
//! use msaccess_pg_migrate::{orchestrator, Config};
//! # use msaccess_pg_migrate::source::memory::MemoryReader;
//!
//! fn main() -> msaccess_pg_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut reader = MemoryReader::new();
//!     let result = orchestrator::run(&config, &mut reader, None)?;
//!     println!("Captured {} tables", result.tables_captured);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod ddl;
pub mod diag;
pub mod error;
pub mod export;
pub mod ident;
pub mod orchestrator;
pub mod resolver;
pub mod source;
pub mod target;
pub mod typemap;
pub mod upsert;
pub mod value;

// Re-exports for convenient access
pub use catalog::{ColumnEntry, Relationship, SchemaCatalog, TableEntry};
pub use config::{Actions, Config, TargetConfig};
pub use diag::RunLog;
pub use error::{MigrateError, Result};
pub use orchestrator::RunResult;
pub use resolver::LoadOrder;
pub use source::{SchemaSource, SourceReader};
pub use target::{PgExecutor, TargetError, TargetExecutor};
pub use value::{Row, SqlValue};
