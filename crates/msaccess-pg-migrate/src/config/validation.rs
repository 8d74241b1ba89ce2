//! Configuration validation.
//!
//! Configuration errors are fatal and must be caught before any I/O is
//! attempted against the source, catalog or target.

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::ident;

pub(crate) fn validate(config: &Config) -> Result<()> {
    if config.actions.needs_source() && !config.source_db.is_file() {
        return Err(MigrateError::Config(format!(
            "Source database does not exist: {}",
            config.source_db.display()
        )));
    }

    if !config.output_dir.is_dir() {
        return Err(MigrateError::Config(format!(
            "Output directory does not exist: {}",
            config.output_dir.display()
        )));
    }

    if !config.schema_name.is_empty() && ident::normalize(&config.schema_name) != config.schema_name
    {
        return Err(MigrateError::Config(format!(
            "Target schema name {:?} is not a normalized identifier (expected {:?})",
            config.schema_name,
            ident::normalize(&config.schema_name)
        )));
    }

    if config.actions.run_upsert {
        if config.target.host.is_empty() {
            return Err(MigrateError::Config(
                "Target host is required for the upsert stage".to_string(),
            ));
        }
        if config.target.database.is_empty() {
            return Err(MigrateError::Config(
                "Target database name is required for the upsert stage".to_string(),
            ));
        }
    }

    Ok(())
}
