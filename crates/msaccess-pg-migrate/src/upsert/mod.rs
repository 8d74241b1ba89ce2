//! Upsert planning and execution.
//!
//! For each table in load order, one statement is planned up front and
//! then executed row by row against the target, with one commit per
//! table. Tables with a primary key get insert-or-update (or
//! insert-or-ignore when every column is part of the key); tables
//! without one get a plain insert.
//!
//! Key values are case-normalized on the way through: a table that is
//! the referenced side of any relationship gets its primary-key values
//! lowercased, and referencing columns are lowercased to match. This
//! contract assumes single-column keys; multi-column relationships are a
//! documented limitation and will produce incorrect casing.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::catalog::{SchemaCatalog, TableEntry};
use crate::error::Result;
use crate::ident;
use crate::source::RowSource;
use crate::target::{TargetError, TargetExecutor};

/// One planned statement for one table.
#[derive(Debug, Clone)]
pub struct TablePlan {
    /// Source table name.
    pub table: String,
    /// Parameterized statement text.
    pub sql: String,
    /// Source column names, in bind order.
    pub columns: Vec<String>,
    /// Bind positions whose text value is lowercased before writing.
    pub lower_idx: Vec<usize>,
}

/// One failed table in a run.
#[derive(Debug)]
pub struct TableFailure {
    pub table: String,
    pub error: TargetError,
}

/// Outcome of [`upsert_all`].
#[derive(Debug, Default)]
pub struct UpsertReport {
    pub tables_loaded: usize,
    pub rows_written: u64,
    pub failures: Vec<TableFailure>,
}

fn qualified(schema: &str, table: &str) -> String {
    let name = ident::normalize(table);
    if schema.is_empty() {
        name
    } else {
        format!("{}.{}", schema, name)
    }
}

/// Plan the statement for one table.
///
/// `referenced` holds the names of tables that are the referenced side of
/// at least one relationship; membership decides whether primary-key
/// values are lowercased.
pub fn plan_table(
    catalog: &SchemaCatalog,
    entry: &TableEntry,
    schema: &str,
    referenced: &BTreeSet<String>,
) -> Result<TablePlan> {
    let columns = catalog.columns(&entry.name)?;
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let norm: Vec<String> = names.iter().map(|n| ident::normalize(n)).collect();

    // money binds as numeric so the server applies the assignment cast.
    let placeholders: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if c.pg_type == "money" {
                format!("${}::numeric", i + 1)
            } else {
                format!("${}", i + 1)
            }
        })
        .collect();

    let mut sql = format!(
        "insert into {} ({}) values ({})",
        qualified(schema, &entry.name),
        norm.join(", "),
        placeholders.join(", ")
    );

    if entry.has_primary_key() {
        let pk: Vec<String> = entry.pk_columns();
        let pk_norm: Vec<String> = pk.iter().map(|c| ident::normalize(c)).collect();
        let updates: Vec<String> = names
            .iter()
            .zip(&norm)
            .filter(|(name, _)| !pk.contains(name))
            .map(|(_, n)| format!("{} = excluded.{}", n, n))
            .collect();
        if updates.is_empty() {
            sql.push_str(&format!(" on conflict ({}) do nothing", pk_norm.join(", ")));
        } else {
            sql.push_str(&format!(
                " on conflict ({}) do update set {}",
                pk_norm.join(", "),
                updates.join(", ")
            ));
        }
    }

    // Columns whose values must be lowercased: this table's key when it
    // is referenced, plus any columns referencing another table's key.
    let mut lower: BTreeSet<String> = BTreeSet::new();
    if referenced.contains(&entry.name) {
        lower.extend(entry.pk_columns());
    }
    for rel in catalog.relationships()? {
        if rel.references_table == entry.name {
            lower.extend(ident::split_cols(&rel.references_cols));
        }
    }
    let lower_idx: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| lower.contains(n.as_str()))
        .map(|(i, _)| i)
        .collect();

    Ok(TablePlan {
        table: entry.name.clone(),
        sql,
        columns: names,
        lower_idx,
    })
}

/// Load every table in the given order, row by row, one commit per table.
///
/// A failed table is rolled back, recorded with its target error code,
/// and the run continues with the next table; this maximizes diagnostic
/// yield in one pass.
pub fn upsert_all(
    catalog: &SchemaCatalog,
    order: &[String],
    rows: &mut dyn RowSource,
    target: &mut dyn TargetExecutor,
    schema: &str,
    log: &mut crate::diag::RunLog,
) -> Result<UpsertReport> {
    let referenced: BTreeSet<String> = catalog
        .relationships()?
        .into_iter()
        .map(|r| r.referenced_table)
        .collect();

    let mut report = UpsertReport::default();

    'tables: for name in order {
        let entry = match catalog.table(name)? {
            Some(e) => e,
            None => {
                log.error(format!("Table {} in load order but not in catalog", name));
                continue;
            }
        };
        let plan = plan_table(catalog, &entry, schema, &referenced)?;

        if let Err(e) = target.begin() {
            log.error(format!("Upsert failed for {}: {}", name, e));
            report.failures.push(TableFailure {
                table: name.clone(),
                error: e,
            });
            continue;
        }

        let mut table_rows: u64 = 0;
        for row in rows.read_rows(name, &plan.columns)? {
            let mut row = match row {
                Ok(r) => r,
                Err(e) => {
                    log.error(format!("Source read failed for {}: {}", name, e));
                    let _ = target.rollback();
                    report.failures.push(TableFailure {
                        table: name.clone(),
                        error: TargetError::other(format!("source read failed: {}", e)),
                    });
                    continue 'tables;
                }
            };
            for &i in &plan.lower_idx {
                row[i].lowercase();
            }
            if let Err(e) = target.execute(&plan.sql, &row) {
                warn!("Upsert row failed on {}: {}", name, e);
                log.error(format!(
                    "Upsert failed for {} (code {}): {}",
                    name,
                    e.code.as_deref().unwrap_or("none"),
                    e.message
                ));
                let _ = target.rollback();
                report.failures.push(TableFailure {
                    table: name.clone(),
                    error: e,
                });
                continue 'tables;
            }
            table_rows += 1;
        }

        if let Err(e) = target.commit() {
            log.error(format!("Commit failed for {}: {}", name, e));
            report.failures.push(TableFailure {
                table: name.clone(),
                error: e,
            });
            continue;
        }
        info!("Loaded {} rows into {}", table_rows, name);
        report.tables_loaded += 1;
        report.rows_written += table_rows;
    }

    Ok(report)
}
