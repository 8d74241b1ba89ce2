//! Run-scoped diagnostic log.
//!
//! Recoverable conditions (unmapped types, skipped catalog rows, per-table
//! target failures) are accumulated here during a run and flushed to
//! `app.log` in the output directory at process end. The run never silently
//! discards an error: each record is also emitted as a `tracing` event as
//! it happens.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Accumulator for recoverable errors over one run.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<Diagnostic>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
            at: Utc::now(),
        });
    }

    /// Record a recoverable error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            message,
            at: Utc::now(),
        });
    }

    /// All entries recorded so far.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flush the accumulated entries to a log file.
    ///
    /// Writes nothing and creates no file when the log is empty.
    pub fn flush<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let mut file = std::fs::File::create(path)?;
        for entry in &self.entries {
            writeln!(
                file,
                "{} {} {}",
                entry.at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                entry.severity,
                entry.message
            )?;
        }
        Ok(())
    }
}
