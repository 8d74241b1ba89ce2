//! Schema catalog: the intermediate representation of a captured schema.
//!
//! Three entity sets (tables, columns, relationships) persisted in an
//! embedded SQLite store. The catalog is populated once per capture run
//! from the source introspection driver and read repeatedly by the
//! resolver, the DDL generator and the upsert planner.
//!
//! Tables is the root: columns and relationships both foreign-key into it
//! by name. The store is rebuilt wholesale on each capture (prior state is
//! discarded), and every row write uses native insert-or-update so a
//! partially captured store can be re-run safely.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::diag::RunLog;
use crate::error::{MigrateError, Result};
use crate::ident;
use crate::source::{SchemaSource, TableKind};
use crate::typemap;

/// One catalog table row.
#[derive(Debug, Clone)]
pub struct TableEntry {
    /// Source table name (unique).
    pub name: String,
    /// Driver kind keyword ("TABLE" or "SYSTEM TABLE").
    pub kind: String,
    /// Comma-joined primary-key column list, in index order; may be empty.
    pub primary_key: String,
}

impl TableEntry {
    /// Whether this is an ordinary (non-system) table.
    pub fn is_ordinary(&self) -> bool {
        self.kind == TableKind::Table.as_str()
    }

    /// Whether the table declares a primary key.
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Primary-key columns as individual source names.
    pub fn pk_columns(&self) -> Vec<String> {
        ident::split_cols(&self.primary_key)
    }
}

/// One catalog column row.
#[derive(Debug, Clone)]
pub struct ColumnEntry {
    pub table: String,
    /// Source column name.
    pub name: String,
    /// Ordinal position within the table (1-based).
    pub ordinal: i32,
    /// Driver type code.
    pub type_code: i32,
    /// Driver type keyword.
    pub type_name: String,
    /// Declared size.
    pub size: i32,
    /// Mapped PostgreSQL type; empty when no mapping exists.
    pub pg_type: String,
}

impl ColumnEntry {
    /// Whether the source type resolved to a target type.
    pub fn is_mapped(&self) -> bool {
        !self.pg_type.is_empty()
    }
}

/// One catalog relationship row.
///
/// A relationship aggregates all columns of one named constraint into
/// comma-joined lists, one row per constraint. This is the documented
/// single-column-FK limitation: multi-column constraints are captured but
/// the upsert case normalization assumes single-column keys.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Table holding the key.
    pub references_table: String,
    /// Comma-joined referencing columns, in constraint order.
    pub references_cols: String,
    /// Table whose key is pointed to.
    pub referenced_table: String,
    /// Comma-joined referenced columns, in constraint order.
    pub referenced_cols: String,
}

/// Counters reported by [`SchemaCatalog::populate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulateStats {
    pub tables: usize,
    pub columns: usize,
    pub relationships: usize,
    /// Rows skipped after a write failure or a dangling endpoint.
    pub skipped: usize,
}

/// The embedded catalog store.
#[derive(Debug)]
pub struct SchemaCatalog {
    conn: Connection,
}

impl SchemaCatalog {
    /// Open (or create) a catalog store at the given path, creating the
    /// storage schema if missing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let catalog = Self { conn };
        catalog.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        catalog.ensure_schema()?;
        Ok(catalog)
    }

    /// Open an existing, populated catalog store.
    ///
    /// Fails fast when the file is missing or the storage schema has not
    /// been created; reads against an unpopulated catalog are undefined.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MigrateError::CatalogNotPopulated(format!(
                "no catalog store at {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let catalog = Self { conn };
        if !catalog.has_storage_schema()? {
            return Err(MigrateError::CatalogNotPopulated(format!(
                "catalog store at {} has no captured structure",
                path.display()
            )));
        }
        Ok(catalog)
    }

    /// Open a throwaway in-memory catalog (tests and dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        catalog.ensure_schema()?;
        Ok(catalog)
    }

    fn has_storage_schema(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('tables', 'columns', 'relationships')",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 3)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tables (
                 name        TEXT NOT NULL,
                 kind        TEXT NOT NULL,
                 primary_key TEXT NOT NULL DEFAULT '',
                 PRIMARY KEY (name)
             );
             CREATE TABLE IF NOT EXISTS columns (
                 table_name   TEXT NOT NULL REFERENCES tables(name),
                 col_name     TEXT NOT NULL,
                 ordinal      INTEGER NOT NULL,
                 type_code    INTEGER NOT NULL,
                 type_name    TEXT NOT NULL,
                 column_size  INTEGER NOT NULL,
                 pg_type_name TEXT NOT NULL DEFAULT '',
                 PRIMARY KEY (table_name, col_name)
             );
             CREATE TABLE IF NOT EXISTS relationships (
                 references_table TEXT NOT NULL REFERENCES tables(name),
                 references_cols  TEXT NOT NULL,
                 referenced_table TEXT NOT NULL REFERENCES tables(name),
                 referenced_cols  TEXT NOT NULL,
                 PRIMARY KEY (references_table, references_cols)
             );",
        )?;
        Ok(())
    }

    /// Capture the source structure into the catalog.
    ///
    /// Discards prior state, then writes tables, columns and relationships
    /// with one commit per unit, so an interruption loses at most the
    /// current unit. Recoverable write failures are logged and skipped.
    pub fn populate(
        &mut self,
        source: &mut dyn SchemaSource,
        log: &mut RunLog,
    ) -> Result<PopulateStats> {
        // Wholesale rebuild: drop in reverse dependency order.
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS relationships;
             DROP TABLE IF EXISTS columns;
             DROP TABLE IF EXISTS tables;",
        )?;
        self.ensure_schema()?;

        let mut stats = PopulateStats::default();

        // Tables, with primary keys derived from index statistics.
        let source_tables = source.tables()?;
        let mut captured: Vec<(String, TableKind, String)> = Vec::new();
        for table in &source_tables {
            let pk = match table.kind {
                TableKind::Table => source.primary_key(&table.name)?.join(", "),
                TableKind::SystemTable => String::new(),
            };
            captured.push((table.name.clone(), table.kind, pk));
        }

        let tx = self.conn.transaction()?;
        for (name, kind, pk) in &captured {
            let written = tx.execute(
                "INSERT INTO tables (name, kind, primary_key) VALUES (?1, ?2, ?3)
                 ON CONFLICT (name) DO UPDATE SET
                     kind = excluded.kind,
                     primary_key = excluded.primary_key",
                params![name, kind.as_str(), pk],
            );
            match written {
                Ok(_) => stats.tables += 1,
                Err(e) => {
                    log.error(format!("Catalog write failed for table {}: {}", name, e));
                    stats.skipped += 1;
                }
            }
        }
        tx.commit()?;
        info!("Captured {} tables", stats.tables);

        // Columns, in source-reported ordinal order, with mapped types.
        let tx = self.conn.transaction()?;
        for (name, _, _) in &captured {
            for col in source.columns(name)? {
                let pg_type = match typemap::map_type(&col.type_name, col.size) {
                    Some(t) => t,
                    None => {
                        log.warn(format!(
                            "Unmapped source type {} (size {}) on {}.{}; target type left empty",
                            col.type_name, col.size, name, col.name
                        ));
                        String::new()
                    }
                };
                let written = tx.execute(
                    "INSERT INTO columns
                         (table_name, col_name, ordinal, type_code, type_name,
                          column_size, pg_type_name)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (table_name, col_name) DO UPDATE SET
                         ordinal = excluded.ordinal,
                         type_code = excluded.type_code,
                         type_name = excluded.type_name,
                         column_size = excluded.column_size,
                         pg_type_name = excluded.pg_type_name",
                    params![
                        name,
                        col.name,
                        col.ordinal,
                        col.type_code,
                        col.type_name,
                        col.size,
                        pg_type
                    ],
                );
                match written {
                    Ok(_) => stats.columns += 1,
                    Err(e) => {
                        log.error(format!(
                            "Catalog write failed for column {}.{}: {}",
                            name, col.name, e
                        ));
                        stats.skipped += 1;
                    }
                }
            }
        }
        tx.commit()?;
        info!("Captured {} columns", stats.columns);

        // Relationships: group the per-column constraint rows by constraint
        // name and concatenate the columns in per-column index order.
        let mut constraints: BTreeMap<String, Vec<crate::source::ForeignKeyColumn>> =
            BTreeMap::new();
        for fk in source.foreign_keys()? {
            constraints.entry(fk.constraint.clone()).or_default().push(fk);
        }

        let known: Vec<&str> = captured.iter().map(|(n, _, _)| n.as_str()).collect();
        let tx = self.conn.transaction()?;
        for (constraint, mut cols) in constraints {
            cols.sort_by_key(|c| c.ordinal);
            let referencing_table = cols[0].referencing_table.clone();
            let referenced_table = cols[0].referenced_table.clone();

            // Both endpoints must reference captured tables; anything else
            // would dangle and is skipped with a diagnostic.
            if !known.contains(&referencing_table.as_str())
                || !known.contains(&referenced_table.as_str())
            {
                log.warn(format!(
                    "Constraint {} references unknown table ({} -> {}); skipped",
                    constraint, referencing_table, referenced_table
                ));
                stats.skipped += 1;
                continue;
            }

            let references_cols = cols
                .iter()
                .map(|c| c.referencing_column.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let referenced_cols = cols
                .iter()
                .map(|c| c.referenced_column.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            debug!(
                "Constraint {}: {} ({}) -> {} ({})",
                constraint, referencing_table, references_cols, referenced_table, referenced_cols
            );

            let written = tx.execute(
                "INSERT INTO relationships
                     (references_table, references_cols, referenced_table, referenced_cols)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (references_table, references_cols) DO UPDATE SET
                     referenced_table = excluded.referenced_table,
                     referenced_cols = excluded.referenced_cols",
                params![
                    referencing_table,
                    references_cols,
                    referenced_table,
                    referenced_cols
                ],
            );
            match written {
                Ok(_) => stats.relationships += 1,
                Err(e) => {
                    log.error(format!("Catalog write failed for constraint {}: {}", constraint, e));
                    stats.skipped += 1;
                }
            }
        }
        tx.commit()?;
        info!("Captured {} relationships", stats.relationships);

        Ok(stats)
    }

    /// All captured tables, in name order.
    pub fn tables(&self) -> Result<Vec<TableEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, kind, primary_key FROM tables ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(TableEntry {
                name: row.get(0)?,
                kind: row.get(1)?,
                primary_key: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Ordinary tables only, in name order.
    pub fn ordinary_tables(&self) -> Result<Vec<TableEntry>> {
        Ok(self
            .tables()?
            .into_iter()
            .filter(TableEntry::is_ordinary)
            .collect())
    }

    /// One table by source name.
    pub fn table(&self, name: &str) -> Result<Option<TableEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, kind, primary_key FROM tables WHERE name = ?1")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(TableEntry {
                name: row.get(0)?,
                kind: row.get(1)?,
                primary_key: row.get(2)?,
            })
        })?;
        rows.next().transpose().map_err(Into::into)
    }

    /// A table's columns, in ordinal order.
    pub fn columns(&self, table: &str) -> Result<Vec<ColumnEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name, col_name, ordinal, type_code, type_name,
                    column_size, pg_type_name
             FROM columns WHERE table_name = ?1 ORDER BY ordinal",
        )?;
        let rows = stmt.query_map(params![table], |row| {
            Ok(ColumnEntry {
                table: row.get(0)?,
                name: row.get(1)?,
                ordinal: row.get(2)?,
                type_code: row.get(3)?,
                type_name: row.get(4)?,
                size: row.get(5)?,
                pg_type: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// All relationships between ordinary tables.
    ///
    /// Constraints touching a system table on either side are captured in
    /// the store but never planned: a key into a table the DDL does not
    /// create cannot be ordered or constrained.
    pub fn relationships(&self) -> Result<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.references_table, r.references_cols,
                    r.referenced_table, r.referenced_cols
             FROM relationships r
             JOIN tables src ON src.name = r.references_table
             JOIN tables dst ON dst.name = r.referenced_table
             WHERE src.kind = 'TABLE' AND dst.kind = 'TABLE'
             ORDER BY r.references_table, r.references_cols",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Relationship {
                references_table: row.get(0)?,
                references_cols: row.get(1)?,
                referenced_table: row.get(2)?,
                referenced_cols: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }
}
