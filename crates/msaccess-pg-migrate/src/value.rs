//! SQL value types for database-agnostic row transfer.
//!
//! Rows streamed from the source are vectors of [`SqlValue`]. The variants
//! cover the types an Access ODBC driver reports; everything else arrives
//! as text.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// An owned SQL value as read from the source row stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL.
    Null,

    /// Boolean value (Access YES/NO).
    Bool(bool),

    /// 16-bit signed integer (smallint, byte).
    I16(i16),

    /// 32-bit signed integer (integer, counter).
    I32(i32),

    /// 64-bit signed integer (long).
    I64(i64),

    /// 32-bit floating point (single).
    F32(f32),

    /// 64-bit floating point (double).
    F64(f64),

    /// Exact decimal (currency, numeric).
    Decimal(Decimal),

    /// Text data.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// Timestamp without timezone (Access DATETIME).
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Lowercase a text value in place; other variants are unchanged.
    ///
    /// This is the key-value case normalization applied to primary-key and
    /// referencing columns before writing to the target.
    pub fn lowercase(&mut self) {
        if let SqlValue::Text(s) = self {
            *s = s.to_lowercase();
        }
    }

}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::I16(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::F32(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// A single row as streamed from the source.
pub type Row = Vec<SqlValue>;
