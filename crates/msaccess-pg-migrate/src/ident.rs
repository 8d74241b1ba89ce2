//! Identifier normalization for target-side names.
//!
//! Access schemas routinely carry table and column names with spaces,
//! hyphens, mixed case and Spanish diacritics; none of those survive as
//! convenient PostgreSQL identifiers. [`normalize`] maps any source name
//! onto the alphabet `[a-z0-9_]` and is used identically for table names,
//! column names and synthesized constraint names.

/// Fold a character to its closest ASCII representation.
///
/// Covers the Latin-1 and Latin Extended-A letters an Access database is
/// likely to contain; anything else non-ASCII folds to nothing.
fn fold_ascii(ch: char) -> &'static str {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' | 'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => "a",
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => "e",
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => "i",
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' | 'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => "o",
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => "u",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        _ => "",
    }
}

/// Normalize a source identifier into a safe lowercase target identifier.
///
/// Rules: trim whitespace, replace spaces and hyphens with underscores,
/// transliterate diacritics to ASCII (dropping characters with no ASCII
/// fold), lowercase, and prefix `n` if the result starts with a digit.
/// A non-blank name whose characters all get dropped falls back to
/// `unnamed` so the result is always a legal identifier.
///
/// The function is pure, deterministic and idempotent: its output contains
/// only `[a-z0-9_]`, and `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for ch in name.trim().chars() {
        if ch == ' ' || ch == '-' {
            out.push('_');
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push_str(fold_ascii(ch));
        }
    }

    // Leading digits are illegal PostgreSQL identifiers. Checked after the
    // character passes so the result stays stable under re-normalization.
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, 'n');
    }

    // A name whose every character was dropped still needs a legal
    // identifier rather than an empty splice into generated SQL.
    if out.is_empty() && !name.trim().is_empty() {
        out.push_str("unnamed");
    }

    out
}

/// Normalize each name of a comma-joined column list, preserving order.
pub fn normalize_cols(list: &str) -> String {
    split_cols(list)
        .iter()
        .map(|c| normalize(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split a comma-joined column list into trimmed source names.
pub fn split_cols(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Synthesize the foreign-key constraint name for a referencing table and
/// its comma-joined referencing column list.
pub fn fk_constraint_name(table: &str, cols: &str) -> String {
    let cols = split_cols(cols)
        .iter()
        .map(|c| normalize(c))
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}_fkeys", normalize(table), cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Piezometros"), "piezometros");
        assert_eq!(normalize("  Nivel Medio  "), "nivel_medio");
        assert_eq!(normalize("COD-PUNTO"), "cod_punto");
    }

    #[test]
    fn test_normalize_diacritics() {
        assert_eq!(normalize("Año"), "ano");
        assert_eq!(normalize("Situación"), "situacion");
        assert_eq!(normalize("Précipitation-Éte"), "precipitation_ete");
    }

    #[test]
    fn test_normalize_leading_digit() {
        assert_eq!(normalize("9meses"), "n9meses");
        // The prefix check runs after cleanup, so a dropped leading
        // character still yields a legal identifier.
        assert_eq!(normalize("€9meses"), "n9meses");
    }

    #[test]
    fn test_normalize_charset() {
        for input in [
            "Table Name",
            "año-2021",
            "9 Lives",
            "a.b.c",
            "x(y)z",
            "UPPER_CASE",
            "tab\tstop",
        ] {
            let out = normalize(input);
            assert!(
                out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "normalize({:?}) produced {:?}",
                input,
                out
            );
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in [
            "Piezómetros",
            "9meses",
            "  A - B  ",
            "€9x",
            "already_normal_3",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_fully_dropped_name_gets_fallback() {
        assert_eq!(normalize("€€"), "unnamed");
        assert_eq!(normalize(normalize("€€").as_str()), "unnamed");
        // Empty input stays empty; the fallback is for dropped characters.
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_cols_list() {
        assert_eq!(normalize_cols("COD PUNTO, Año"), "cod_punto, ano");
        assert_eq!(normalize_cols("id"), "id");
    }

    #[test]
    fn test_fk_constraint_name() {
        assert_eq!(
            fk_constraint_name("Piezometria", "COD PUNTO, Año"),
            "piezometria_cod_punto_ano_fkeys"
        );
        assert_eq!(fk_constraint_name("child", "parent_id"), "child_parent_id_fkeys");
    }
}
