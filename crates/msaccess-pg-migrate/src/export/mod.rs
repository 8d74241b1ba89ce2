//! File artifact emission: per-table CSV exports, the psql `\copy`
//! script and the ordered-table-list artifact.
//!
//! CSV quoting mirrors QUOTE_NONNUMERIC: every non-numeric field is
//! quoted, numeric fields are not. Nulls become quoted empty strings,
//! which the `force_null` clause in the emitted `\copy` command turns
//! back into NULL on load.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::catalog::SchemaCatalog;
use crate::error::Result;
use crate::ident;
use crate::source::RowSource;
use crate::value::SqlValue;

/// Counters reported by [`export_tables`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportReport {
    pub tables: usize,
    pub rows: u64,
}

fn csv_field(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "\"\"".to_string(),
        SqlValue::Bool(v) => if *v { "true" } else { "false" }.to_string(),
        SqlValue::I16(v) => v.to_string(),
        SqlValue::I32(v) => v.to_string(),
        SqlValue::I64(v) => v.to_string(),
        SqlValue::F32(v) => v.to_string(),
        SqlValue::F64(v) => v.to_string(),
        SqlValue::Decimal(v) => v.to_string(),
        SqlValue::Text(v) => format!("\"{}\"", v.replace('"', "\"\"")),
        SqlValue::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
            format!("\"\\x{}\"", hex)
        }
        SqlValue::Timestamp(v) => format!("\"{}\"", v.format("%Y-%m-%d %H:%M:%S")),
    }
}

fn csv_line(row: &[SqlValue]) -> String {
    let fields: Vec<String> = row.iter().map(csv_field).collect();
    fields.join(",")
}

/// Export every ordinary table to `{table}.csv` in the output directory
/// and write the matching `\copy` metacommand into `copy_script`.
pub fn export_tables(
    catalog: &SchemaCatalog,
    rows: &mut dyn RowSource,
    out_dir: &Path,
    copy_script: &Path,
) -> Result<ExportReport> {
    let mut report = ExportReport::default();
    let mut script = BufWriter::new(File::create(copy_script)?);

    for table in catalog.ordinary_tables()? {
        let columns = catalog.columns(&table.name)?;
        let source_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let norm_names: Vec<String> =
            source_names.iter().map(|n| ident::normalize(n)).collect();
        let table_norm = ident::normalize(&table.name);

        let csv_path = out_dir.join(format!("{}.csv", table_norm));
        let mut csv = BufWriter::new(File::create(&csv_path)?);
        let header: Vec<String> = norm_names.iter().map(|n| format!("\"{}\"", n)).collect();
        writeln!(csv, "{}", header.join(","))?;

        let mut table_rows: u64 = 0;
        for row in rows.read_rows(&table.name, &source_names)? {
            writeln!(csv, "{}", csv_line(&row?))?;
            table_rows += 1;
        }
        csv.flush()?;
        info!("Exported {} rows from {} to {}", table_rows, table.name, csv_path.display());

        let cols = norm_names.join(", ");
        writeln!(
            script,
            "\\copy {} ({}) from '{}' with (format csv, header, delimiter ',', \
             encoding 'UTF8', force_null ({}))\n",
            table_norm,
            cols,
            csv_path.display(),
            cols
        )?;

        report.tables += 1;
        report.rows += table_rows;
    }
    script.flush()?;
    Ok(report)
}

/// Write the resolved load order, one normalized table name per line.
///
/// The file doubles as a diagnostic and as the iteration plan for a later
/// upsert pass. Names here are target-side (normalized); [`upsert_all`]
/// itself iterates the source names held by the in-memory order, so the
/// artifact records the plan rather than keying it.
///
/// [`upsert_all`]: crate::upsert::upsert_all
pub fn write_table_names(order: &[String], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for table in order {
        writeln!(out, "{}", ident::normalize(table))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::RunLog;
    use crate::source::memory::{MemoryReader, MemoryTable};

    fn fixture() -> (SchemaCatalog, MemoryReader) {
        let mut reader = MemoryReader::new();
        reader.push_table(
            MemoryTable::new("Ciudades")
                .with_column("Id", "LONG", 0)
                .with_column("Nombre", "TEXT", 50)
                .with_primary_key(&["Id"])
                .with_row(vec![SqlValue::I32(1), "Alcalá".into()])
                .with_row(vec![SqlValue::I32(2), SqlValue::Null]),
        );
        let mut catalog = SchemaCatalog::open_in_memory().unwrap();
        let mut log = RunLog::new();
        catalog.populate(&mut reader, &mut log).unwrap();
        (catalog, reader)
    }

    #[test]
    fn test_csv_quoting_nonnumeric_only() {
        let (catalog, mut reader) = fixture();
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("_COPYFROM.txt");

        let report = export_tables(&catalog, &mut reader, dir.path(), &script).unwrap();
        assert_eq!(report.tables, 1);
        assert_eq!(report.rows, 2);

        let csv = std::fs::read_to_string(dir.path().join("ciudades.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "\"id\",\"nombre\"");
        assert_eq!(lines[1], "1,\"Alcalá\"");
        // Null exports as a quoted empty string; force_null restores it.
        assert_eq!(lines[2], "2,\"\"");
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        assert_eq!(
            csv_field(&SqlValue::Text("say \"hi\"".to_string())),
            "\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn test_copy_script_contents() {
        let (catalog, mut reader) = fixture();
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("_COPYFROM.txt");
        export_tables(&catalog, &mut reader, dir.path(), &script).unwrap();

        let text = std::fs::read_to_string(&script).unwrap();
        assert!(text.starts_with("\\copy ciudades (id, nombre) from '"));
        assert!(text.contains("format csv, header, delimiter ','"));
        assert!(text.contains("encoding 'UTF8'"));
        assert!(text.contains("force_null (id, nombre)"));
    }

    #[test]
    fn test_table_names_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_TABLES_NAMES.txt");
        let order = vec!["Parent Table".to_string(), "child".to_string()];
        write_table_names(&order, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "parent_table\nchild\n");
    }
}
