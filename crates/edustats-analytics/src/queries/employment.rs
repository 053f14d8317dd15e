//! Employment-rate queries: overall trend and ranked breakdowns by
//! school and by degree.

use serde::{Deserialize, Serialize};

use edustats_domain::{columns, int, num, text, MetricType, Relation, Row};
use edustats_source::{RowFilter, TabularSource};

use crate::aggregate::{aggregate, mean_ignoring_missing, round_dp, sort_desc_by, Reducer};
use crate::clean::normalize_column;
use crate::error::{AnalyticsError, Result};
use crate::queries::{fetch_rows, fetch_survey_joined};
use crate::stats::trend_slope;

/// One year of the employment trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Survey year.
    pub year: i32,
    /// Mean overall employment rate for the year, 1 dp.
    pub employment_rate_overall: Option<f64>,
    /// Mean full-time-permanent employment rate for the year, 1 dp.
    pub employment_rate_ft_perm: Option<f64>,
}

/// Headline KPIs for the trend panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendKpis {
    /// Mean of the yearly overall rates, 1 dp.
    pub avg_overall: Option<f64>,
    /// Mean of the yearly full-time-permanent rates, 1 dp.
    pub avg_ft_perm: Option<f64>,
    /// Latest year's ft-perm rate over its overall rate, 3 dp.
    /// Undefined when either operand is missing or overall is zero.
    pub stability_ratio: Option<f64>,
    /// Least-squares slope of the overall rate against year, 3 dp.
    pub trend_strength: Option<f64>,
}

/// Response of [`employment_trend`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentTrend {
    /// Yearly mean rates, ascending by year.
    pub trend: Vec<TrendPoint>,
    /// Headline KPIs.
    pub kpis: TrendKpis,
}

/// Employment-rate trend across all survey years.
#[tracing::instrument(skip(source))]
pub async fn employment_trend(source: &dyn TabularSource) -> Result<EmploymentTrend> {
    let mut rows = fetch_rows(source, Relation::GraduateEmploymentSurvey, None).await?;
    normalize_column(&mut rows, columns::EMPLOYMENT_RATE_OVERALL);
    normalize_column(&mut rows, columns::EMPLOYMENT_RATE_FT_PERM);

    let yearly: Vec<Row> = aggregate(
        &rows,
        &[columns::YEAR],
        &[
            columns::EMPLOYMENT_RATE_OVERALL,
            columns::EMPLOYMENT_RATE_FT_PERM,
        ],
        Reducer::Mean,
    )
    .into_iter()
    .filter(|r| int(r, columns::YEAR).is_some())
    .collect();

    // Slope and KPIs work on the unrounded yearly means.
    let slope_pairs: Vec<(f64, Option<f64>)> = yearly
        .iter()
        .map(|r| {
            (
                num(r, columns::YEAR).unwrap_or_default(),
                num(r, columns::EMPLOYMENT_RATE_OVERALL),
            )
        })
        .collect();
    let trend_strength = trend_slope(&slope_pairs).map(|s| round_dp(s, 3));

    let avg_overall =
        mean_ignoring_missing(yearly.iter().map(|r| num(r, columns::EMPLOYMENT_RATE_OVERALL)))
            .map(|v| round_dp(v, 1));
    let avg_ft_perm =
        mean_ignoring_missing(yearly.iter().map(|r| num(r, columns::EMPLOYMENT_RATE_FT_PERM)))
            .map(|v| round_dp(v, 1));

    let stability_ratio = yearly.last().and_then(|latest| {
        let overall = num(latest, columns::EMPLOYMENT_RATE_OVERALL)?;
        let ft_perm = num(latest, columns::EMPLOYMENT_RATE_FT_PERM)?;
        if overall == 0.0 {
            None
        } else {
            Some(round_dp(ft_perm / overall, 3))
        }
    });

    let trend = yearly
        .iter()
        .map(|r| TrendPoint {
            year: int(r, columns::YEAR).unwrap_or_default() as i32,
            employment_rate_overall: num(r, columns::EMPLOYMENT_RATE_OVERALL)
                .map(|v| round_dp(v, 1)),
            employment_rate_ft_perm: num(r, columns::EMPLOYMENT_RATE_FT_PERM)
                .map(|v| round_dp(v, 1)),
        })
        .collect();

    tracing::debug!(years = yearly.len(), ?trend_strength, "employment trend computed");

    Ok(EmploymentTrend {
        trend,
        kpis: TrendKpis {
            avg_overall,
            avg_ft_perm,
            stability_ratio,
            trend_strength,
        },
    })
}

/// One school's mean rates in a breakdown year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolRates {
    /// Resolved school name.
    pub school: String,
    /// Mean overall employment rate, 1 dp.
    pub employment_rate_overall: Option<f64>,
    /// Mean full-time-permanent employment rate, 1 dp.
    pub employment_rate_ft_perm: Option<f64>,
}

/// Response of [`employment_by_school`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentBySchool {
    /// Requested year.
    pub year: i32,
    /// Schools ranked by overall rate, descending.
    pub schools: Vec<SchoolRates>,
    /// Number of schools in the breakdown.
    pub total_schools: usize,
}

/// Ranked employment rates per school for one survey year.
#[tracing::instrument(skip(source))]
pub async fn employment_by_school(
    source: &dyn TabularSource,
    year: i32,
) -> Result<EmploymentBySchool> {
    let filter = RowFilter::new().eq(columns::YEAR, year);
    let rows = fetch_survey_joined(
        source,
        Some(&filter),
        &[
            columns::EMPLOYMENT_RATE_OVERALL,
            columns::EMPLOYMENT_RATE_FT_PERM,
        ],
    )
    .await?;

    let mut groups: Vec<Row> = aggregate(
        &rows,
        &[columns::FULL_NAME],
        &[
            columns::EMPLOYMENT_RATE_OVERALL,
            columns::EMPLOYMENT_RATE_FT_PERM,
        ],
        Reducer::Mean,
    )
    .into_iter()
    .filter(|r| text(r, columns::FULL_NAME).is_some())
    .collect();
    sort_desc_by(
        &mut groups,
        columns::EMPLOYMENT_RATE_OVERALL,
        &[columns::FULL_NAME],
    );

    let schools: Vec<SchoolRates> = groups
        .iter()
        .map(|r| SchoolRates {
            school: text(r, columns::FULL_NAME).unwrap_or_default().to_string(),
            employment_rate_overall: num(r, columns::EMPLOYMENT_RATE_OVERALL)
                .map(|v| round_dp(v, 1)),
            employment_rate_ft_perm: num(r, columns::EMPLOYMENT_RATE_FT_PERM)
                .map(|v| round_dp(v, 1)),
        })
        .collect();

    Ok(EmploymentBySchool {
        year,
        total_schools: schools.len(),
        schools,
    })
}

/// One degree's mean rate in a by-degree breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeRate {
    /// Degree title.
    pub degree: String,
    /// Mean of the selected rate metric, 1 dp.
    pub employment_rate: Option<f64>,
}

/// Response of [`employment_by_degree`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentByDegree {
    /// Requested year.
    pub year: i32,
    /// Requested school name.
    pub school: String,
    /// Which rate column was ranked.
    pub metric_type: MetricType,
    /// Degrees ranked by the selected rate, descending.
    pub degrees: Vec<DegreeRate>,
    /// Number of degrees in the breakdown.
    pub total_degrees: usize,
}

/// Ranked employment rates per degree within one school and year.
///
/// `metric_type` accepts `"overall"` (default) or `"ft_perm"`; any
/// other value is rejected before computation.
#[tracing::instrument(skip(source))]
pub async fn employment_by_degree(
    source: &dyn TabularSource,
    year: i32,
    school: &str,
    metric_type: Option<&str>,
) -> Result<EmploymentByDegree> {
    let metric = match metric_type {
        Some(raw) => raw
            .parse::<MetricType>()
            .map_err(|e| AnalyticsError::InvalidParameter(e.to_string()))?,
        None => MetricType::Overall,
    };
    if school.is_empty() {
        return Err(AnalyticsError::InvalidParameter(
            "school must not be empty".to_string(),
        ));
    }

    let filter = RowFilter::new().eq(columns::YEAR, year);
    let mut rows = fetch_survey_joined(
        source,
        Some(&filter),
        &[
            columns::EMPLOYMENT_RATE_OVERALL,
            columns::EMPLOYMENT_RATE_FT_PERM,
        ],
    )
    .await?;
    // Filter on the joined frame: the school parameter is a resolved
    // name, not an id.
    rows.retain(|r| text(r, columns::FULL_NAME) == Some(school));

    let mut groups: Vec<Row> = aggregate(
        &rows,
        &[columns::DEGREE],
        &[metric.rate_column()],
        Reducer::Mean,
    )
    .into_iter()
    .filter(|r| text(r, columns::DEGREE).is_some())
    .collect();
    sort_desc_by(&mut groups, metric.rate_column(), &[columns::DEGREE]);

    let degrees: Vec<DegreeRate> = groups
        .iter()
        .map(|r| DegreeRate {
            degree: text(r, columns::DEGREE).unwrap_or_default().to_string(),
            employment_rate: num(r, metric.rate_column()).map(|v| round_dp(v, 1)),
        })
        .collect();

    Ok(EmploymentByDegree {
        year,
        school: school.to_string(),
        metric_type: metric,
        total_degrees: degrees.len(),
        degrees,
    })
}
