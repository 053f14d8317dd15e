//! Enrollment-versus-graduates queries: completion trends over a year
//! range and the per-school breakdown for a single year.
//!
//! Both count relations carry a per-sex dimension; only the combined
//! "MF" rows are read, otherwise male and female rows would double
//! count every total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use edustats_domain::{
    columns, int, num, Relation, Row, TrendThresholds, SEX_TOTAL,
};
use edustats_source::{RowFilter, TabularSource};

use crate::aggregate::{aggregate, mean_ignoring_missing, round_dp, Reducer};
use crate::clean::normalize_column;
use crate::error::Result;
use crate::join::school_name_index;
use crate::queries::{distinct_years, fetch_rows};
use crate::stats::{interpret_trend, pct_change, trend_slope};

/// A school available for filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolRef {
    /// Institution identifier.
    pub school_id: i64,
    /// Resolved name, `None` when the mapping has no entry.
    pub school_name: Option<String>,
}

/// One year of the completion series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCompletion {
    /// Count year.
    pub year: i32,
    /// Label of the selected scope ("All Schools", a school name, or
    /// "Unknown" for an unmapped id).
    pub school_name: String,
    /// Total enrolment, `None` when the year has no enrolment data.
    pub enrolment: Option<i64>,
    /// Total graduates, `None` when the year has no graduate data.
    pub graduates: Option<i64>,
    /// graduates / enrolment × 100, 1 dp. Zero graduates is a defined
    /// 0.0; zero or missing enrolment is undefined.
    pub completion_rate: Option<f64>,
    /// Year-over-year enrolment growth, percent, 1 dp.
    pub enrolment_growth: Option<f64>,
    /// Year-over-year graduates growth, percent, 1 dp.
    pub graduates_growth: Option<f64>,
}

/// Period totals and trend statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentStatistics {
    /// Sum of enrolment over the period, `None` when no data.
    pub total_enrolment: Option<i64>,
    /// Sum of graduates over the period, `None` when no data.
    pub total_graduates: Option<i64>,
    /// Least-squares slope of yearly enrolment, 3 dp.
    pub enrolment_trend: Option<f64>,
    /// Least-squares slope of yearly graduates, 3 dp.
    pub graduates_trend: Option<f64>,
    /// Qualitative reading of the enrolment slope.
    pub enrolment_trend_interpretation: String,
    /// Qualitative reading of the graduates slope.
    pub graduates_trend_interpretation: String,
}

/// One school's totals over the analyzed period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolBreakdownEntry {
    /// Institution identifier.
    pub school_id: i64,
    /// Resolved name, `None` when the mapping has no entry.
    pub school_name: Option<String>,
    /// Total enrolment over the period; 0 when the school only
    /// appears on the graduates side.
    pub total_enrolment: i64,
    /// Total graduates over the period; 0 when the school only
    /// appears on the enrolment side.
    pub total_graduates: i64,
    /// graduates / enrolment × 100, 1 dp, undefined when either total
    /// is genuinely missing or enrolment is zero.
    pub completion_rate: Option<f64>,
}

/// Response of [`enrollment_graduate_analysis`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentGraduateAnalysis {
    /// First analyzed year; `None` when neither parameter nor data
    /// supplies one.
    pub start_year: Option<i32>,
    /// Last analyzed year.
    pub end_year: Option<i32>,
    /// Label of the selected scope.
    pub school_name: String,
    /// Years present in both relations, ascending.
    pub available_years: Vec<i32>,
    /// Schools present in the filtered enrolment data.
    pub available_schools: Vec<SchoolRef>,
    /// Yearly series, ascending by year.
    pub data: Vec<YearCompletion>,
    /// Mean of the defined completion rates, 1 dp.
    pub average_completion_rate: Option<f64>,
    /// Totals and trends.
    pub statistics: EnrollmentStatistics,
    /// Per-school totals, present only when no school filter is set.
    pub school_breakdown: Option<Vec<SchoolBreakdownEntry>>,
}

/// Sum one count column by year. Returns year → total, `None` total
/// when every value in the year was missing.
fn sums_by_year(rows: &[Row], metric: &str) -> BTreeMap<i64, Option<f64>> {
    aggregate(rows, &[columns::YEAR], &[metric], Reducer::Sum)
        .iter()
        .filter_map(|r| int(r, columns::YEAR).map(|y| (y, num(r, metric))))
        .collect()
}

/// Sum one count column by school id over the whole period.
fn sums_by_school(rows: &[Row], metric: &str) -> BTreeMap<i64, Option<f64>> {
    aggregate(rows, &[columns::SCHOOL_ID], &[metric], Reducer::Sum)
        .iter()
        .filter_map(|r| int(r, columns::SCHOOL_ID).map(|id| (id, num(r, metric))))
        .collect()
}

fn completion_rate(enrolment: Option<f64>, graduates: Option<f64>) -> Option<f64> {
    match (enrolment, graduates) {
        (Some(e), Some(g)) if e != 0.0 => Some(g / e * 100.0),
        _ => None,
    }
}

fn total(values: impl Iterator<Item = Option<f64>>) -> Option<i64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() as i64)
    }
}

/// Enrollment-versus-graduates completion analysis over an optional
/// year range and optional school.
#[tracing::instrument(skip(source, thresholds))]
pub async fn enrollment_graduate_analysis(
    source: &dyn TabularSource,
    start_year: Option<i32>,
    end_year: Option<i32>,
    school_id: Option<i64>,
    thresholds: &TrendThresholds,
) -> Result<EnrollmentGraduateAnalysis> {
    let mf = RowFilter::new().eq(columns::SEX, SEX_TOTAL);
    let mut enrol = fetch_rows(source, Relation::Enrolment, Some(&mf)).await?;
    let mut grads = fetch_rows(source, Relation::Graduates, Some(&mf)).await?;
    normalize_column(&mut enrol, columns::ENROLMENT);
    normalize_column(&mut grads, columns::GRADUATES);

    let mapping = fetch_rows(source, Relation::SchoolMapping, None).await?;
    let names = school_name_index(&mapping);

    // Years both series cover, before any range filter.
    let grad_years = distinct_years(&grads);
    let available_years: Vec<i32> = distinct_years(&enrol)
        .into_iter()
        .filter(|y| grad_years.contains(y))
        .collect();

    let start = start_year.or_else(|| available_years.first().copied());
    let end = end_year.or_else(|| available_years.last().copied());
    let in_range = |row: &Row| {
        int(row, columns::YEAR).is_some_and(|y| {
            start.is_none_or(|s| y >= i64::from(s)) && end.is_none_or(|e| y <= i64::from(e))
        })
    };
    enrol.retain(in_range);
    grads.retain(in_range);

    let available_schools: Vec<SchoolRef> = {
        let mut ids: Vec<i64> = enrol
            .iter()
            .filter_map(|r| int(r, columns::SCHOOL_ID))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .map(|school_id| SchoolRef {
                school_id,
                school_name: names.get(&school_id).cloned(),
            })
            .collect()
    };

    let school_name = match school_id {
        Some(id) => {
            enrol.retain(|r| int(r, columns::SCHOOL_ID) == Some(id));
            grads.retain(|r| int(r, columns::SCHOOL_ID) == Some(id));
            names.get(&id).cloned().unwrap_or_else(|| "Unknown".to_string())
        }
        None => "All Schools".to_string(),
    };

    // Outer join the two yearly series: a year present in only one
    // source still appears with the other metric missing.
    let enrol_by_year = sums_by_year(&enrol, columns::ENROLMENT);
    let grads_by_year = sums_by_year(&grads, columns::GRADUATES);
    let mut merged: BTreeMap<i64, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (year, v) in &enrol_by_year {
        merged.entry(*year).or_default().0 = *v;
    }
    for (year, v) in &grads_by_year {
        merged.entry(*year).or_default().1 = *v;
    }

    let mut data = Vec::with_capacity(merged.len());
    let mut completions = Vec::with_capacity(merged.len());
    let mut prev: (Option<f64>, Option<f64>) = (None, None);
    for (year, (enrolment, graduates)) in &merged {
        let completion = completion_rate(*enrolment, *graduates);
        completions.push(completion);
        data.push(YearCompletion {
            year: *year as i32,
            school_name: school_name.clone(),
            enrolment: enrolment.map(|v| v as i64),
            graduates: graduates.map(|v| v as i64),
            completion_rate: completion.map(|v| round_dp(v, 1)),
            enrolment_growth: pct_change(prev.0, *enrolment).map(|v| round_dp(v, 1)),
            graduates_growth: pct_change(prev.1, *graduates).map(|v| round_dp(v, 1)),
        });
        prev = (*enrolment, *graduates);
    }

    let enrol_pairs: Vec<(f64, Option<f64>)> =
        merged.iter().map(|(y, (e, _))| (*y as f64, *e)).collect();
    let grad_pairs: Vec<(f64, Option<f64>)> =
        merged.iter().map(|(y, (_, g))| (*y as f64, *g)).collect();
    let enrolment_trend = trend_slope(&enrol_pairs).map(|s| round_dp(s, 3));
    let graduates_trend = trend_slope(&grad_pairs).map(|s| round_dp(s, 3));

    let school_breakdown = if school_id.is_none() {
        Some(school_breakdown(&enrol, &grads, &names))
    } else {
        None
    };

    tracing::debug!(
        years = merged.len(),
        ?enrolment_trend,
        ?graduates_trend,
        "enrollment analysis computed"
    );

    Ok(EnrollmentGraduateAnalysis {
        start_year: start,
        end_year: end,
        school_name,
        available_years,
        available_schools,
        average_completion_rate: mean_ignoring_missing(completions).map(|v| round_dp(v, 1)),
        statistics: EnrollmentStatistics {
            total_enrolment: total(merged.values().map(|(e, _)| *e)),
            total_graduates: total(merged.values().map(|(_, g)| *g)),
            enrolment_trend,
            graduates_trend,
            enrolment_trend_interpretation: interpret_trend(
                enrolment_trend,
                "Enrolment",
                thresholds,
            ),
            graduates_trend_interpretation: interpret_trend(
                graduates_trend,
                "Graduates",
                thresholds,
            ),
        },
        data,
        school_breakdown,
    })
}

/// Per-school totals over the analyzed period, ranked by enrolment.
fn school_breakdown(
    enrol: &[Row],
    grads: &[Row],
    names: &std::collections::HashMap<i64, String>,
) -> Vec<SchoolBreakdownEntry> {
    let enrol_by_school = sums_by_school(enrol, columns::ENROLMENT);
    let grads_by_school = sums_by_school(grads, columns::GRADUATES);

    let mut merged: BTreeMap<i64, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (id, v) in &enrol_by_school {
        merged.entry(*id).or_default().0 = *v;
    }
    for (id, v) in &grads_by_school {
        merged.entry(*id).or_default().1 = *v;
    }

    let mut breakdown: Vec<SchoolBreakdownEntry> = merged
        .into_iter()
        .map(|(school_id, (enrolment, graduates))| SchoolBreakdownEntry {
            school_id,
            school_name: names.get(&school_id).cloned(),
            total_enrolment: enrolment.unwrap_or_default() as i64,
            total_graduates: graduates.unwrap_or_default() as i64,
            completion_rate: completion_rate(enrolment, graduates).map(|v| round_dp(v, 1)),
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.total_enrolment
            .cmp(&a.total_enrolment)
            .then_with(|| a.school_id.cmp(&b.school_id))
    });
    breakdown
}

/// One school's counts in a single-year breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolYearCounts {
    /// Institution identifier.
    pub school_id: i64,
    /// Resolved name, `None` when the mapping has no entry.
    pub school_name: Option<String>,
    /// Enrolment in the year; 0 when only graduates were reported.
    pub enrolment: i64,
    /// Graduates in the year; 0 when only enrolment was reported.
    pub graduates: i64,
    /// graduates / enrolment × 100, 1 dp.
    pub completion_rate: Option<f64>,
}

/// Response of [`enrollment_by_school_for_year`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentBySchool {
    /// Requested year.
    pub year: i32,
    /// Schools ranked by enrolment, descending.
    pub schools: Vec<SchoolYearCounts>,
    /// Number of schools in the breakdown.
    pub total_schools: usize,
}

/// Per-school enrolment, graduates and completion rate for one year.
#[tracing::instrument(skip(source))]
pub async fn enrollment_by_school_for_year(
    source: &dyn TabularSource,
    year: i32,
) -> Result<EnrollmentBySchool> {
    let filter = RowFilter::new()
        .eq(columns::SEX, SEX_TOTAL)
        .eq(columns::YEAR, year);
    let mut enrol = fetch_rows(source, Relation::Enrolment, Some(&filter)).await?;
    let mut grads = fetch_rows(source, Relation::Graduates, Some(&filter)).await?;
    normalize_column(&mut enrol, columns::ENROLMENT);
    normalize_column(&mut grads, columns::GRADUATES);
    // Rows whose count failed to parse carry nothing for a yearly
    // breakdown.
    enrol.retain(|r| num(r, columns::ENROLMENT).is_some());
    grads.retain(|r| num(r, columns::GRADUATES).is_some());

    let mapping = fetch_rows(source, Relation::SchoolMapping, None).await?;
    let names = school_name_index(&mapping);

    let enrol_by_school = sums_by_school(&enrol, columns::ENROLMENT);
    let grads_by_school = sums_by_school(&grads, columns::GRADUATES);
    let mut merged: BTreeMap<i64, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (id, v) in &enrol_by_school {
        merged.entry(*id).or_default().0 = *v;
    }
    for (id, v) in &grads_by_school {
        merged.entry(*id).or_default().1 = *v;
    }

    let mut schools: Vec<SchoolYearCounts> = merged
        .into_iter()
        .map(|(school_id, (enrolment, graduates))| SchoolYearCounts {
            school_id,
            school_name: names.get(&school_id).cloned(),
            enrolment: enrolment.unwrap_or_default() as i64,
            graduates: graduates.unwrap_or_default() as i64,
            completion_rate: completion_rate(enrolment, graduates).map(|v| round_dp(v, 1)),
        })
        .collect();
    schools.sort_by(|a, b| {
        b.enrolment
            .cmp(&a.enrolment)
            .then_with(|| a.school_id.cmp(&b.school_id))
    });

    Ok(EnrollmentBySchool {
        year,
        total_schools: schools.len(),
        schools,
    })
}
