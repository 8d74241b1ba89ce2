//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing source file, missing
    /// output directory). Fatal before any I/O is attempted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog store (SQLite) error.
    #[error("Catalog store error: {0}")]
    Catalog(#[from] rusqlite::Error),

    /// A read was attempted against a catalog that has not been captured.
    #[error("Catalog not populated: {0}")]
    CatalogNotPopulated(String),

    /// Source metadata reader error.
    #[error("Source database error: {0}")]
    Source(String),

    /// Target database connection or statement error.
    #[error("Target database error: {0}")]
    Target(#[from] postgres::Error),

    /// The dependency resolver hit its iteration cap without ordering
    /// every table: the schema contains a cycle or a dangling reference.
    #[error(
        "Load order unresolved after {rounds} rounds (iteration cap); \
         cyclic or dangling foreign keys on: {}",
        .unresolved.join(", ")
    )]
    UnresolvedOrder {
        rounds: usize,
        unresolved: Vec<String>,
    },

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        MigrateError::Config(message.into())
    }

    /// Create a Source error.
    pub fn source(message: impl Into<String>) -> Self {
        MigrateError::Source(message.into())
    }

    /// Process exit code for this error (configuration problems get
    /// their own code so callers can distinguish operator mistakes).
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => 2,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
