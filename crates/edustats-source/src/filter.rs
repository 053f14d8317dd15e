//! Row filters pushed down to data sources.

use edustats_domain::{CellValue, Row};

/// A single column predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column equals the given cell exactly.
    Eq {
        /// Column name.
        column: String,
        /// Expected cell value.
        value: CellValue,
    },
    /// Numeric column lies in the inclusive range.
    Between {
        /// Column name.
        column: String,
        /// Inclusive lower bound.
        lo: f64,
        /// Inclusive upper bound.
        hi: f64,
    },
}

/// Conjunction of column predicates applied to one relation.
///
/// Backends honor as much of the filter as they can; the analytics
/// engine always re-applies it with [`RowFilter::matches`], so a
/// partial or absent pushdown never changes results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    predicates: Vec<Predicate>,
}

impl RowFilter {
    /// Empty filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column == value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.predicates.push(Predicate::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Require `lo <= column <= hi` on a numeric column.
    #[must_use]
    pub fn between(mut self, column: &str, lo: f64, hi: f64) -> Self {
        self.predicates.push(Predicate::Between {
            column: column.to_string(),
            lo,
            hi,
        });
        self
    }

    /// Whether the filter has no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether a row satisfies every predicate. Missing cells never
    /// match, so filtering silently drops rows without the column.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| match p {
            Predicate::Eq { column, value } => row.get(column) == Some(value),
            Predicate::Between { column, lo, hi } => row
                .get(column)
                .and_then(CellValue::as_f64)
                .is_some_and(|v| v >= *lo && v <= *hi),
        })
    }

    /// Retain only matching rows.
    pub fn apply(&self, rows: &mut Vec<Row>) {
        if !self.is_empty() {
            rows.retain(|r| self.matches(r));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edustats_domain::{columns, row};

    #[test]
    fn eq_matches_numbers_and_text() {
        let f = RowFilter::new()
            .eq(columns::YEAR, 2023)
            .eq(columns::SEX, "MF");

        let hit = row([
            (columns::YEAR, CellValue::from(2023)),
            (columns::SEX, CellValue::from("MF")),
        ]);
        let wrong_sex = row([
            (columns::YEAR, CellValue::from(2023)),
            (columns::SEX, CellValue::from("F")),
        ]);

        assert!(f.matches(&hit));
        assert!(!f.matches(&wrong_sex));
    }

    #[test]
    fn between_is_inclusive() {
        let f = RowFilter::new().between(columns::YEAR, 2015.0, 2020.0);
        for (year, expect) in [(2014, false), (2015, true), (2020, true), (2021, false)] {
            let r = row([(columns::YEAR, CellValue::from(year))]);
            assert_eq!(f.matches(&r), expect, "year {year}");
        }
    }

    #[test]
    fn missing_column_never_matches() {
        let f = RowFilter::new().eq(columns::SCHOOL_ID, 4);
        assert!(!f.matches(&row([(columns::YEAR, CellValue::from(2023))])));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let f = RowFilter::new();
        let mut rows = vec![row([(columns::YEAR, CellValue::from(2023))])];
        f.apply(&mut rows);
        assert_eq!(rows.len(), 1);
    }
}
