//! In-memory source reader.
//!
//! The programmatic way to feed [`populate`](crate::catalog::SchemaCatalog::populate)
//! and the row stream without a live ODBC driver, and the fixture vehicle
//! for tests.

use crate::error::{MigrateError, Result};
use crate::source::{
    ForeignKeyColumn, IndexColumn, RowIter, RowSource, SchemaSource, SourceColumn, SourceTable,
    TableKind,
};
use crate::value::Row;

/// One table held by a [`MemoryReader`].
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    kind: TableKind,
    columns: Vec<SourceColumn>,
    primary_key: Vec<String>,
    rows: Vec<Row>,
}

impl MemoryTable {
    /// Create an ordinary table with no columns.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TableKind::Table,
            columns: Vec::new(),
            primary_key: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Mark this table as a system table.
    pub fn system(mut self) -> Self {
        self.kind = TableKind::SystemTable;
        self
    }

    /// Append a column; ordinal positions follow insertion order.
    pub fn with_column(mut self, name: &str, type_name: &str, size: i32) -> Self {
        let ordinal = self.columns.len() as i32 + 1;
        self.columns.push(SourceColumn {
            ordinal,
            name: name.to_string(),
            type_code: 0,
            type_name: type_name.to_string(),
            size,
        });
        self
    }

    /// Declare the primary-key columns, in index order.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Append a data row (values in column order).
    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }
}

/// In-memory implementation of the source boundary traits.
#[derive(Debug, Default)]
pub struct MemoryReader {
    tables: Vec<MemoryTable>,
    foreign_keys: Vec<ForeignKeyColumn>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table.
    pub fn push_table(&mut self, table: MemoryTable) -> &mut Self {
        self.tables.push(table);
        self
    }

    /// Add one single-column foreign-key constraint.
    pub fn push_foreign_key(
        &mut self,
        constraint: &str,
        referencing_table: &str,
        referencing_column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) -> &mut Self {
        self.push_foreign_key_column(
            constraint,
            referencing_table,
            referencing_column,
            referenced_table,
            referenced_column,
            0,
        )
    }

    /// Add one column of a (possibly multi-column) foreign-key constraint.
    pub fn push_foreign_key_column(
        &mut self,
        constraint: &str,
        referencing_table: &str,
        referencing_column: &str,
        referenced_table: &str,
        referenced_column: &str,
        ordinal: i32,
    ) -> &mut Self {
        self.foreign_keys.push(ForeignKeyColumn {
            constraint: constraint.to_string(),
            referencing_table: referencing_table.to_string(),
            referencing_column: referencing_column.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
            ordinal,
        });
        self
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| MigrateError::source(format!("Unknown table: {}", name)))
    }
}

impl SchemaSource for MemoryReader {
    fn tables(&mut self) -> Result<Vec<SourceTable>> {
        Ok(self
            .tables
            .iter()
            .map(|t| SourceTable {
                name: t.name.clone(),
                kind: t.kind,
            })
            .collect())
    }

    fn columns(&mut self, table: &str) -> Result<Vec<SourceColumn>> {
        Ok(self.table(table)?.columns.clone())
    }

    fn index_statistics(&mut self, table: &str) -> Result<Vec<IndexColumn>> {
        let table = self.table(table)?;
        Ok(table
            .primary_key
            .iter()
            .enumerate()
            .map(|(i, col)| IndexColumn {
                index_name: Some("PrimaryKey".to_string()),
                ordinal: i as i32 + 1,
                column: col.clone(),
            })
            .collect())
    }

    fn foreign_keys(&mut self) -> Result<Vec<ForeignKeyColumn>> {
        Ok(self.foreign_keys.clone())
    }
}

impl RowSource for MemoryReader {
    fn read_rows(&mut self, table: &str, _columns: &[String]) -> Result<RowIter<'_>> {
        let rows = self.table(table)?.rows.clone();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
