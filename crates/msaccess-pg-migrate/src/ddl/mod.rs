//! DDL text generation from the captured catalog.
//!
//! Emits one reviewable SQL script: drop-and-create for every ordinary
//! table in name order, then the foreign-key constraints, then an
//! optional schema move. Creation order does not need the load order
//! because constraints are added only after every table exists. The
//! whole script is wrapped in one transaction so a partial run leaves no
//! effect on a transactional target.

use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::diag::RunLog;
use crate::error::Result;
use crate::ident;

/// Section separator in the emitted script.
const SEPARATOR: &str = "----------------------------------------------------------------------";

/// Generate the full DDL script for the captured schema.
///
/// Columns whose source type has no mapping are emitted with an inline
/// comment in place of a type, for manual correction before the script
/// is run; each such column is also recorded in the run log.
pub fn emit_schema(
    catalog: &SchemaCatalog,
    schema_name: &str,
    log: &mut RunLog,
) -> Result<String> {
    let tables = catalog.ordinary_tables()?;
    let mut out = String::new();

    out.push_str("BEGIN;\n");
    out.push_str("SET CLIENT_ENCODING TO UTF8;\n");
    out.push_str("SET STANDARD_CONFORMING_STRINGS TO ON;\n");

    for table in &tables {
        let name = ident::normalize(&table.name);
        debug!("Emitting create table for {} as {}", table.name, name);
        out.push_str(&format!("\n{}\n", SEPARATOR));
        out.push_str(&format!("drop table if exists {} cascade;\n", name));
        out.push_str(&format!("create table {} (\n", name));

        let mut lines: Vec<String> = Vec::new();
        for col in catalog.columns(&table.name)? {
            let col_name = ident::normalize(&col.name);
            if col.is_mapped() {
                lines.push(format!("\t{} {}", col_name, col.pg_type));
            } else {
                log.warn(format!(
                    "Column {}.{} has no target type; DDL needs manual correction",
                    table.name, col.name
                ));
                lines.push(format!(
                    "\t{} /* unmapped source type: {} */",
                    col_name, col.type_name
                ));
            }
        }
        if table.has_primary_key() {
            lines.push(format!(
                "\tconstraint {} primary key ({})",
                name,
                ident::normalize_cols(&table.primary_key)
            ));
        }
        out.push_str(&lines.join(",\n"));
        out.push_str("\n);\n");
    }

    let relationships = catalog.relationships()?;
    if !relationships.is_empty() {
        out.push_str(&format!("\n{}\n", SEPARATOR));
        for rel in &relationships {
            let table = ident::normalize(&rel.references_table);
            let constraint = ident::fk_constraint_name(&rel.references_table, &rel.references_cols);
            out.push_str(&format!(
                "alter table {} drop constraint if exists {};\n",
                table, constraint
            ));
            out.push_str(&format!(
                "alter table {} add constraint {} foreign key ({}) references {} ({});\n",
                table,
                constraint,
                ident::normalize_cols(&rel.references_cols),
                ident::normalize(&rel.referenced_table),
                ident::normalize_cols(&rel.referenced_cols)
            ));
        }
    }

    if !schema_name.is_empty() && schema_name != "public" {
        out.push_str(&format!("\n{}\n", SEPARATOR));
        out.push_str(&format!("create schema if not exists {};\n", schema_name));
        for table in &tables {
            out.push_str(&format!(
                "alter table {} set schema {};\n",
                ident::normalize(&table.name),
                schema_name
            ));
        }
    }

    out.push_str("\nCOMMIT;\n");
    Ok(out)
}
