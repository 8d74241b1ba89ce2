//! Type mapping between MS Access and PostgreSQL.
//!
//! The Access ODBC driver reports type keywords like `LONG`, `MEMO` or
//! `COUNTER`; this module resolves them to PostgreSQL column declarations.
//! Unknown keywords are a recoverable condition: `map_type` returns `None`
//! and the caller records the gap for manual correction instead of failing
//! the run.

/// Map an Access type keyword to its PostgreSQL base type.
pub fn pg_base_type(type_name: &str) -> Option<&'static str> {
    match type_name.trim().to_uppercase().as_str() {
        // Character types
        "TEXT" | "VARCHAR" | "MEMO" | "LONGCHAR" => Some("varchar"),

        // Integer types
        "BYTE" => Some("smallint"),
        "SMALLINT" => Some("smallint"),
        "INTEGER" => Some("integer"),
        "LONG" => Some("bigint"),

        // Floating point
        "SINGLE" => Some("real"),
        "DOUBLE" | "REAL" => Some("double precision"),

        // Exact numeric
        "CURRENCY" => Some("money"),

        // Auto-increment
        "AUTONUMBER" | "COUNTER" => Some("serial"),

        // Temporal
        "DATETIME" => Some("timestamp"),

        // Boolean
        "YES/NO" => Some("smallint"),

        _ => None,
    }
}

/// Whether a keyword is a character type that takes a `(size)` qualifier.
fn is_character_type(type_name: &str) -> bool {
    matches!(
        type_name.trim().to_uppercase().as_str(),
        "TEXT" | "VARCHAR" | "MEMO" | "LONGCHAR"
    )
}

/// Map an Access type keyword plus declared size to a full PostgreSQL
/// column declaration.
///
/// Character types with a positive declared size get a `(size)` qualifier;
/// everything else uses the bare base type. Unmapped keywords yield `None`.
pub fn map_type(type_name: &str, size: i32) -> Option<String> {
    let base = pg_base_type(type_name)?;
    if is_character_type(type_name) && size > 0 {
        Some(format!("{}({})", base, size))
    } else {
        Some(base.to_string())
    }
}
