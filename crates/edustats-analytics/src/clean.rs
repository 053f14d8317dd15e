//! Numeric normalizer for free-text survey fields.
//!
//! Government exports format the same column three ways across years:
//! `"92.5%"`, `"3,400"`, `"N.A."`. The normalizer coerces any cell to
//! a finite number or an explicit missing marker. It is pure and
//! total: no input fails, and missing in means missing out.

use edustats_domain::{CellValue, Row};

/// Placeholder tokens that mean "no data" in the source files.
const PLACEHOLDER_TOKENS: [&str; 4] = ["n.a.", "na", "-", ""];

/// Coerce a raw cell to a finite number.
///
/// Rules, in order: strip a trailing `%`, strip thousands commas, map
/// placeholder tokens (case-insensitive) to missing, then parse.
/// Anything unparseable is missing, never an error.
#[must_use]
pub fn to_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(v) if v.is_finite() => Some(*v),
        CellValue::Number(_) | CellValue::Missing => None,
        CellValue::Text(raw) => {
            let trimmed = raw.trim();
            let stripped = trimmed.strip_suffix('%').unwrap_or(trimmed);
            let stripped = stripped.replace(',', "");
            if PLACEHOLDER_TOKENS.contains(&stripped.to_lowercase().as_str()) {
                return None;
            }
            stripped.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

/// Rewrite one column of every row to `Number` or `Missing`.
pub fn normalize_column(rows: &mut [Row], column: &str) {
    for row in rows.iter_mut() {
        let normalized = row.get(column).and_then(to_number);
        row.insert(column.to_string(), CellValue::from(normalized));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edustats_domain::{num, row};

    #[test]
    fn strips_percent_sign() {
        assert_eq!(to_number(&CellValue::from("12.5%")), Some(12.5));
    }

    #[test]
    fn strips_thousands_commas() {
        assert_eq!(to_number(&CellValue::from("1,234")), Some(1234.0));
        assert_eq!(to_number(&CellValue::from("3,400.50")), Some(3400.5));
    }

    #[test]
    fn placeholder_tokens_are_missing() {
        for token in ["", "N.A.", "na", "NA", "-", "n.a."] {
            assert_eq!(to_number(&CellValue::from(token)), None, "token {token:?}");
        }
    }

    #[test]
    fn garbage_is_missing_not_an_error() {
        assert_eq!(to_number(&CellValue::from("not a number")), None);
        assert_eq!(to_number(&CellValue::from("12.5.3")), None);
    }

    #[test]
    fn missing_in_missing_out() {
        assert_eq!(to_number(&CellValue::Missing), None);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(to_number(&CellValue::Number(88.0)), Some(88.0));
        assert_eq!(to_number(&CellValue::Number(f64::NAN)), None);
    }

    #[test]
    fn normalize_column_rewrites_in_place() {
        let mut rows = vec![
            row([("rate", CellValue::from("92.5%"))]),
            row([("rate", CellValue::from("N.A."))]),
            row([("rate", CellValue::Number(88.0))]),
        ];
        normalize_column(&mut rows, "rate");

        assert_eq!(num(&rows[0], "rate"), Some(92.5));
        assert_eq!(num(&rows[1], "rate"), None);
        assert!(rows[1]["rate"].is_missing());
        assert_eq!(num(&rows[2], "rate"), Some(88.0));
    }
}
