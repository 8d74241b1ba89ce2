//! Source database boundary.
//!
//! The live introspection driver is an external collaborator; this module
//! defines the traits it must satisfy and the raw metadata row shapes it
//! reports. [`SchemaSource`] covers the one-shot structure capture and
//! [`RowSource`] the per-table row stream consumed by the CSV export and
//! the upsert pass.
//!
//! Reading foreign-key metadata from an Access file requires the normally
//! hidden `MSysRelationships` system table; granting read access to it is
//! the operator's responsibility.

pub mod memory;

use crate::error::Result;
use crate::value::Row;

/// Kind of a source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Ordinary user table.
    Table,
    /// System table (captured, excluded from planning).
    SystemTable,
}

impl TableKind {
    /// Driver keyword for this kind, as stored in the catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Table => "TABLE",
            TableKind::SystemTable => "SYSTEM TABLE",
        }
    }

    /// Parse a driver keyword; unknown kinds are treated as system tables.
    pub fn from_keyword(kw: &str) -> Self {
        if kw.eq_ignore_ascii_case("TABLE") {
            TableKind::Table
        } else {
            TableKind::SystemTable
        }
    }
}

/// One table as enumerated by the driver.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub kind: TableKind,
}

/// One column as enumerated by the driver, in ordinal order.
#[derive(Debug, Clone)]
pub struct SourceColumn {
    /// Ordinal position within the table (1-based).
    pub ordinal: i32,
    pub name: String,
    /// Driver type code.
    pub type_code: i32,
    /// Driver type keyword (e.g. "LONG", "TEXT").
    pub type_name: String,
    /// Declared size; 0 when not applicable.
    pub size: i32,
}

/// One row of the driver's index/statistics metadata.
#[derive(Debug, Clone)]
pub struct IndexColumn {
    /// Index name; `None` for table-level statistics rows.
    pub index_name: Option<String>,
    /// Position of the column within the index (1-based).
    pub ordinal: i32,
    pub column: String,
}

/// One column of one foreign-key constraint.
#[derive(Debug, Clone)]
pub struct ForeignKeyColumn {
    /// Constraint name; all columns of one constraint share it.
    pub constraint: String,
    /// Table holding the key.
    pub referencing_table: String,
    pub referencing_column: String,
    /// Table whose key is pointed to.
    pub referenced_table: String,
    pub referenced_column: String,
    /// Position of the column within the constraint (0-based).
    pub ordinal: i32,
}

/// Name of the primary-key index in Access statistics metadata.
const PRIMARY_KEY_INDEX: &str = "PRIMARYKEY";

/// Source schema introspection boundary.
pub trait SchemaSource {
    /// Enumerate tables of kind ordinary-or-system.
    fn tables(&mut self) -> Result<Vec<SourceTable>>;

    /// Enumerate a table's columns in source-reported ordinal order.
    fn columns(&mut self, table: &str) -> Result<Vec<SourceColumn>>;

    /// Enumerate a table's index/statistics metadata.
    fn index_statistics(&mut self, table: &str) -> Result<Vec<IndexColumn>>;

    /// Enumerate the source's foreign-key metadata, one row per
    /// constraint column.
    fn foreign_keys(&mut self) -> Result<Vec<ForeignKeyColumn>>;

    /// Derive a table's primary-key columns by filtering the statistics
    /// metadata to the primary-key index, in index order.
    fn primary_key(&mut self, table: &str) -> Result<Vec<String>> {
        let mut pk: Vec<IndexColumn> = self
            .index_statistics(table)?
            .into_iter()
            .filter(|row| {
                row.index_name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(PRIMARY_KEY_INDEX))
            })
            .collect();
        pk.sort_by_key(|row| row.ordinal);
        Ok(pk.into_iter().map(|row| row.column).collect())
    }
}

/// Lazy row stream for one table: finite, single-pass, non-restartable.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// Live row access boundary.
pub trait RowSource {
    /// Stream all rows of a table, with values in the given column order.
    fn read_rows(&mut self, table: &str, columns: &[String]) -> Result<RowIter<'_>>;
}

/// Full source reader: schema introspection plus row streaming.
pub trait SourceReader: SchemaSource + RowSource {
    /// Narrow to the introspection half.
    fn as_schema_source(&mut self) -> &mut dyn SchemaSource;

    /// Narrow to the row-streaming half.
    fn as_row_source(&mut self) -> &mut dyn RowSource;
}

impl<T: SchemaSource + RowSource> SourceReader for T {
    fn as_schema_source(&mut self) -> &mut dyn SchemaSource {
        self
    }

    fn as_row_source(&mut self) -> &mut dyn RowSource {
        self
    }
}
