//! # Education Statistics - Domain Model
//!
//! Core types shared across all layers of the education statistics
//! service: relation names, raw cell values, row helpers, and the
//! named interpretation thresholds used by the analytics engine.
//!
//! The relations themselves (graduate employment survey, school
//! mapping, enrolment and graduate counts) arrive from heterogeneous
//! government exports, so a "cell" is deliberately loose: free text,
//! a number, or explicitly missing. Everything stricter than that is
//! the analytics crate's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// A raw cell as delivered by the data source.
///
/// `Missing` is the explicit absence of a value, distinct from zero or
/// an empty string, and serializes as JSON `null`. Arithmetic over
/// missing values stays missing; it is never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// A finite numeric value.
    Number(f64),
    /// Free text (school names, degree titles, sex codes, raw tokens).
    Text(String),
    /// Explicitly absent.
    Missing,
}

impl CellValue {
    /// Numeric view of the cell, `None` unless it is a `Number`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the cell, `None` unless it is `Text`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether the cell is explicitly missing.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Missing, Into::into)
    }
}

/// One row of a relation: column name to raw cell.
pub type Row = BTreeMap<String, CellValue>;

/// Build a row from `(column, cell)` pairs. Test and fixture helper
/// used anywhere relations are assembled in memory.
pub fn row<I, V>(cells: I) -> Row
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<CellValue>,
{
    cells
        .into_iter()
        .map(|(col, v)| (col.to_string(), v.into()))
        .collect()
}

/// Numeric value of a column, `None` for missing/non-numeric cells.
#[must_use]
pub fn num(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(CellValue::as_f64)
}

/// Integer value of a column (truncating), `None` when not numeric.
#[must_use]
pub fn int(row: &Row, column: &str) -> Option<i64> {
    num(row, column).map(|v| v as i64)
}

/// Text value of a column, `None` for missing/non-text cells.
#[must_use]
pub fn text<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(CellValue::as_str)
}

// =============================================================================
// RELATIONS
// =============================================================================

/// The four logical relations the analytics engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// One row per (year, school, degree) survey observation.
    GraduateEmploymentSurvey,
    /// One row per institution: school_id to full name.
    SchoolMapping,
    /// One row per (year, sex, school) enrolment count.
    Enrolment,
    /// One row per (year, sex, school) graduate count.
    Graduates,
}

impl Relation {
    /// Stable relation name as used by storage backends.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GraduateEmploymentSurvey => "graduate_employment_survey",
            Self::SchoolMapping => "school_mapping",
            Self::Enrolment => "enrolment",
            Self::Graduates => "graduates",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names shared between the data source and the engine.
pub mod columns {
    /// Survey/count year.
    pub const YEAR: &str = "year";
    /// Synthetic institution identifier (foreign key into the mapping).
    pub const SCHOOL_ID: &str = "school_id";
    /// Degree title as published in the survey.
    pub const DEGREE: &str = "degree";
    /// Overall employment rate, percentage.
    pub const EMPLOYMENT_RATE_OVERALL: &str = "employment_rate_overall";
    /// Full-time permanent employment rate, percentage.
    pub const EMPLOYMENT_RATE_FT_PERM: &str = "employment_rate_ft_perm";
    /// Gross monthly median salary.
    pub const GROSS_MONTHLY_MEDIAN: &str = "gross_monthly_median";
    /// Basic monthly median salary.
    pub const BASIC_MONTHLY_MEDIAN: &str = "basic_monthly_median";
    /// Resolved institution name (attached by the joiner).
    pub const FULL_NAME: &str = "full_name";
    /// Sex dimension code on the count relations.
    pub const SEX: &str = "sex";
    /// Enrolment count.
    pub const ENROLMENT: &str = "enrolment";
    /// Graduate count.
    pub const GRADUATES: &str = "graduates";
}

/// Combined male+female total code on the sex dimension. Count queries
/// must select this before aggregating, otherwise per-sex rows double
/// count.
pub const SEX_TOTAL: &str = "MF";

// =============================================================================
// QUERY ENUMS
// =============================================================================

/// Which employment-rate column a breakdown query ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Overall employment rate.
    Overall,
    /// Full-time permanent employment rate.
    FtPerm,
}

impl MetricType {
    /// Wire name of the metric, as accepted from query parameters.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::FtPerm => "ft_perm",
        }
    }

    /// Survey column this metric reads.
    #[must_use]
    pub fn rate_column(&self) -> &'static str {
        match self {
            Self::Overall => columns::EMPLOYMENT_RATE_OVERALL,
            Self::FtPerm => columns::EMPLOYMENT_RATE_FT_PERM,
        }
    }
}

/// Error for an unrecognized metric-type parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric type '{0}', expected 'overall' or 'ft_perm'")]
pub struct ParseMetricTypeError(pub String);

impl FromStr for MetricType {
    type Err = ParseMetricTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overall" => Ok(Self::Overall),
            "ft_perm" => Ok(Self::FtPerm),
            other => Err(ParseMetricTypeError(other.to_string())),
        }
    }
}

// =============================================================================
// INTERPRETATION THRESHOLDS
// =============================================================================

/// Threshold separating "stable" from "increasing"/"decreasing" when
/// interpreting a count trend slope, in absolute count units per year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// |slope| below this reads as stable.
    pub stability_band: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            stability_band: 100.0,
        }
    }
}

/// Absolute-value bands for qualitative correlation strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationBands {
    /// |r| at or above this is "strong".
    pub strong: f64,
    /// |r| at or above this is "moderate".
    pub moderate: f64,
    /// |r| at or above this is "weak"; below is "very weak or none".
    pub weak: f64,
}

impl Default for CorrelationBands {
    fn default() -> Self {
        Self {
            strong: 0.7,
            moderate: 0.4,
            weak: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_serializes_as_null() {
        let json = serde_json::to_string(&CellValue::Missing).unwrap();
        assert_eq!(json, "null");

        let back: CellValue = serde_json::from_str("null").unwrap();
        assert_eq!(back, CellValue::Missing);
    }

    #[test]
    fn number_and_text_round_trip() {
        let n: CellValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(n, CellValue::Number(12.5));

        let t: CellValue = serde_json::from_str("\"N.A.\"").unwrap();
        assert_eq!(t.as_str(), Some("N.A."));
    }

    #[test]
    fn row_accessors() {
        let r = row([
            (columns::YEAR, CellValue::from(2023)),
            (columns::DEGREE, CellValue::from("Computer Science")),
            (columns::GROSS_MONTHLY_MEDIAN, CellValue::Missing),
        ]);
        assert_eq!(int(&r, columns::YEAR), Some(2023));
        assert_eq!(text(&r, columns::DEGREE), Some("Computer Science"));
        assert_eq!(num(&r, columns::GROSS_MONTHLY_MEDIAN), None);
        assert_eq!(num(&r, "absent_column"), None);
    }

    #[test]
    fn metric_type_parses_wire_names() {
        assert_eq!("overall".parse::<MetricType>().unwrap(), MetricType::Overall);
        assert_eq!("ft_perm".parse::<MetricType>().unwrap(), MetricType::FtPerm);
        assert!("median".parse::<MetricType>().is_err());
    }

    #[test]
    fn metric_type_maps_to_columns() {
        assert_eq!(
            MetricType::Overall.rate_column(),
            columns::EMPLOYMENT_RATE_OVERALL
        );
        assert_eq!(
            MetricType::FtPerm.rate_column(),
            columns::EMPLOYMENT_RATE_FT_PERM
        );
    }
}
