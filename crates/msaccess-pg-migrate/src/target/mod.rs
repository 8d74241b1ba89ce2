//! Target database boundary.
//!
//! The upsert pass talks to the target through [`TargetExecutor`], which
//! accepts parameterized statement text plus positional values and
//! reports structured errors. Write failures stay values ([`TargetError`])
//! rather than bubbling through the library error type, so the caller can
//! record them per table and keep going.

pub mod postgres;

use std::fmt;

use crate::value::SqlValue;

pub use self::postgres::PgExecutor;

/// Coarse classification of a target-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetErrorKind {
    /// Integrity constraint violation (SQLSTATE class 23).
    ConstraintViolation,
    /// Connection lost or never established.
    Connectivity,
    Other,
}

/// A structured target-side error.
#[derive(Debug, Clone)]
pub struct TargetError {
    pub kind: TargetErrorKind,
    /// Server error code (SQLSTATE) when one was reported.
    pub code: Option<String>,
    pub message: String,
}

impl TargetError {
    pub fn other(message: impl Into<String>) -> Self {
        TargetError {
            kind: TargetErrorKind::Other,
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({:?})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TargetError {}

/// Executes statements against the migration target.
///
/// Transaction boundaries are explicit so the caller controls commit
/// granularity (one commit per table during upsert).
pub trait TargetExecutor {
    fn begin(&mut self) -> Result<(), TargetError>;

    /// Run one parameterized statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, TargetError>;

    fn commit(&mut self) -> Result<(), TargetError>;

    fn rollback(&mut self) -> Result<(), TargetError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every call; statements can be failed by substring match.
    pub struct RecordingExecutor {
        pub statements: Vec<(String, Vec<SqlValue>)>,
        pub events: Vec<String>,
        pub fail_on: Option<String>,
    }

    impl RecordingExecutor {
        pub fn new() -> Self {
            RecordingExecutor {
                statements: Vec::new(),
                events: Vec::new(),
                fail_on: None,
            }
        }

        pub fn failing_on(needle: &str) -> Self {
            let mut e = Self::new();
            e.fail_on = Some(needle.to_string());
            e
        }
    }

    impl TargetExecutor for RecordingExecutor {
        fn begin(&mut self) -> Result<(), TargetError> {
            self.events.push("begin".into());
            Ok(())
        }

        fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, TargetError> {
            if let Some(needle) = &self.fail_on {
                if sql.contains(needle.as_str())
                    || params.iter().any(|p| matches!(p, SqlValue::Text(t) if t.contains(needle.as_str())))
                {
                    return Err(TargetError {
                        kind: TargetErrorKind::ConstraintViolation,
                        code: Some("23505".to_string()),
                        message: "duplicate key value violates unique constraint".to_string(),
                    });
                }
            }
            self.statements.push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        fn commit(&mut self) -> Result<(), TargetError> {
            self.events.push("commit".into());
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), TargetError> {
            self.events.push("rollback".into());
            Ok(())
        }
    }
}
