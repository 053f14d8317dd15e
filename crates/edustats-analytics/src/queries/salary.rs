//! Salary-versus-employment queries: cross-sectional correlation and
//! the historical trend of a single degree.

use serde::{Deserialize, Serialize};

use edustats_domain::{columns, int, num, text, CorrelationBands, Row};
use edustats_source::{RowFilter, TabularSource};

use crate::aggregate::{aggregate, round_dp, sort_desc_by, Reducer};
use crate::error::{AnalyticsError, Result};
use crate::queries::{distinct_years, fetch_survey_joined};
use crate::stats::{interpret_correlation, pearson};

/// One aggregated (degree, school) point on the scatter plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationPoint {
    /// Degree title.
    pub degree: String,
    /// School the point belongs to (the selected school when one was
    /// requested, otherwise the group's own school).
    pub school: String,
    /// Mean overall employment rate, 1 dp.
    pub employment_rate: f64,
    /// Mean gross monthly median salary, whole units.
    pub median_salary: f64,
}

/// Extremes and sample size accompanying the coefficient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationStatistics {
    /// Highest-salary group, when any data exists.
    pub highest_salary: Option<CorrelationPoint>,
    /// Lowest-salary group, when any data exists.
    pub lowest_salary: Option<CorrelationPoint>,
    /// Number of aggregated groups the coefficient was computed over.
    pub sample_size: usize,
}

/// Response of [`salary_employment_correlation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryEmploymentCorrelation {
    /// Year the cross-section was taken from, `None` when the survey
    /// holds no usable years.
    pub year: Option<i32>,
    /// All years present in the survey, ascending.
    pub available_years: Vec<i32>,
    /// All resolved school names present in the survey, ascending.
    pub available_schools: Vec<String>,
    /// Echo of the school filter.
    pub selected_school: Option<String>,
    /// Aggregated points sorted by salary, descending.
    pub data: Vec<CorrelationPoint>,
    /// Pearson coefficient between mean salary and mean employment
    /// rate across the groups, 3 dp. Undefined under 2 groups or at
    /// zero variance.
    pub correlation_coefficient: Option<f64>,
    /// Extremes and sample size.
    pub statistics: CorrelationStatistics,
    /// Qualitative reading of the coefficient.
    pub interpretation: String,
}

/// Correlation between median salary and employment rate across
/// degrees, for one year (latest by default) and optionally one
/// school.
#[tracing::instrument(skip(source, bands))]
pub async fn salary_employment_correlation(
    source: &dyn TabularSource,
    year: Option<i32>,
    school: Option<&str>,
    bands: &CorrelationBands,
) -> Result<SalaryEmploymentCorrelation> {
    // Full fetch: the available-years/schools lists span the whole
    // survey regardless of the filters.
    let mut rows = fetch_survey_joined(
        source,
        None,
        &[columns::EMPLOYMENT_RATE_OVERALL, columns::GROSS_MONTHLY_MEDIAN],
    )
    .await?;

    let available_years = distinct_years(&rows);
    let mut available_schools: Vec<String> = rows
        .iter()
        .filter_map(|r| text(r, columns::FULL_NAME).map(str::to_string))
        .collect();
    available_schools.sort_unstable();
    available_schools.dedup();

    let Some(year) = year.or_else(|| available_years.last().copied()) else {
        return Ok(SalaryEmploymentCorrelation {
            year: None,
            available_years,
            available_schools,
            selected_school: school.map(str::to_string),
            data: Vec::new(),
            correlation_coefficient: None,
            statistics: CorrelationStatistics {
                highest_salary: None,
                lowest_salary: None,
                sample_size: 0,
            },
            interpretation: interpret_correlation(None, bands),
        });
    };

    rows.retain(|r| int(r, columns::YEAR) == Some(i64::from(year)));
    if let Some(name) = school {
        rows.retain(|r| text(r, columns::FULL_NAME) == Some(name));
    }
    // Analysis rows need every operand defined, and the survey's
    // literal "na" degree rows carry no information.
    rows.retain(|r| {
        num(r, columns::EMPLOYMENT_RATE_OVERALL).is_some()
            && num(r, columns::GROSS_MONTHLY_MEDIAN).is_some()
            && text(r, columns::FULL_NAME).is_some()
            && text(r, columns::DEGREE).is_some_and(|d| !d.eq_ignore_ascii_case("na"))
    });

    // One school selected: group by degree. All schools: group by
    // degree and school, so the same degree at two schools stays two
    // points.
    let group_keys: &[&str] = if school.is_some() {
        &[columns::DEGREE]
    } else {
        &[columns::DEGREE, columns::FULL_NAME]
    };
    let mut groups: Vec<Row> = aggregate(
        &rows,
        group_keys,
        &[columns::EMPLOYMENT_RATE_OVERALL, columns::GROSS_MONTHLY_MEDIAN],
        Reducer::Mean,
    );
    sort_desc_by(
        &mut groups,
        columns::GROSS_MONTHLY_MEDIAN,
        &[columns::DEGREE, columns::FULL_NAME],
    );

    // Coefficient over the unrounded group means.
    let salaries: Vec<Option<f64>> = groups
        .iter()
        .map(|r| num(r, columns::GROSS_MONTHLY_MEDIAN))
        .collect();
    let rates: Vec<Option<f64>> = groups
        .iter()
        .map(|r| num(r, columns::EMPLOYMENT_RATE_OVERALL))
        .collect();
    let coefficient = pearson(&salaries, &rates).map(|r| round_dp(r, 3));

    let data: Vec<CorrelationPoint> = groups
        .iter()
        .filter_map(|r| {
            Some(CorrelationPoint {
                degree: text(r, columns::DEGREE)?.to_string(),
                school: school
                    .or_else(|| text(r, columns::FULL_NAME))
                    .unwrap_or_default()
                    .to_string(),
                employment_rate: round_dp(num(r, columns::EMPLOYMENT_RATE_OVERALL)?, 1),
                median_salary: round_dp(num(r, columns::GROSS_MONTHLY_MEDIAN)?, 0),
            })
        })
        .collect();

    tracing::debug!(year, groups = data.len(), ?coefficient, "salary correlation computed");

    Ok(SalaryEmploymentCorrelation {
        year: Some(year),
        available_years,
        available_schools,
        selected_school: school.map(str::to_string),
        statistics: CorrelationStatistics {
            highest_salary: data.first().cloned(),
            lowest_salary: data.last().cloned(),
            sample_size: data.len(),
        },
        correlation_coefficient: coefficient,
        interpretation: interpret_correlation(coefficient, bands),
        data,
    })
}

/// One year of a degree's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeYear {
    /// Survey year.
    pub year: i32,
    /// Mean overall employment rate, 1 dp.
    pub employment_rate: Option<f64>,
    /// Mean gross monthly median salary, whole units.
    pub median_salary: Option<f64>,
}

/// Response of [`degree_historical_trends`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeHistoricalTrends {
    /// Requested degree title.
    pub degree: String,
    /// Echo of the school filter.
    pub school: Option<String>,
    /// Schools offering this degree in the filtered set, ascending.
    pub schools_offering: Vec<String>,
    /// Year-by-year means, ascending by year.
    pub trends: Vec<DegreeYear>,
    /// Number of years with data.
    pub total_years: usize,
}

/// Historical salary and employment trend for one degree, optionally
/// within one school.
#[tracing::instrument(skip(source))]
pub async fn degree_historical_trends(
    source: &dyn TabularSource,
    degree: &str,
    school: Option<&str>,
) -> Result<DegreeHistoricalTrends> {
    if degree.is_empty() {
        return Err(AnalyticsError::InvalidParameter(
            "degree must not be empty".to_string(),
        ));
    }

    let filter = RowFilter::new().eq(columns::DEGREE, degree);
    let mut rows = fetch_survey_joined(
        source,
        Some(&filter),
        &[columns::EMPLOYMENT_RATE_OVERALL, columns::GROSS_MONTHLY_MEDIAN],
    )
    .await?;
    if let Some(name) = school {
        rows.retain(|r| text(r, columns::FULL_NAME) == Some(name));
    }
    // Years with either metric missing contribute nothing to the
    // chart; drop them row-wise before grouping.
    rows.retain(|r| {
        int(r, columns::YEAR).is_some()
            && num(r, columns::EMPLOYMENT_RATE_OVERALL).is_some()
            && num(r, columns::GROSS_MONTHLY_MEDIAN).is_some()
    });

    let mut schools_offering: Vec<String> = rows
        .iter()
        .filter_map(|r| text(r, columns::FULL_NAME).map(str::to_string))
        .collect();
    schools_offering.sort_unstable();
    schools_offering.dedup();

    let trends: Vec<DegreeYear> = aggregate(
        &rows,
        &[columns::YEAR],
        &[columns::EMPLOYMENT_RATE_OVERALL, columns::GROSS_MONTHLY_MEDIAN],
        Reducer::Mean,
    )
    .iter()
    .filter_map(|r| {
        Some(DegreeYear {
            year: int(r, columns::YEAR)? as i32,
            employment_rate: num(r, columns::EMPLOYMENT_RATE_OVERALL).map(|v| round_dp(v, 1)),
            median_salary: num(r, columns::GROSS_MONTHLY_MEDIAN).map(|v| round_dp(v, 0)),
        })
    })
    .collect();

    Ok(DegreeHistoricalTrends {
        degree: degree.to_string(),
        school: school.map(str::to_string),
        schools_offering,
        total_years: trends.len(),
        trends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use edustats_domain::{row, CellValue, Relation};
    use edustats_source::MemorySource;

    fn survey_row(
        year: i32,
        school_id: i64,
        degree: &str,
        rate: f64,
        salary: impl Into<CellValue>,
    ) -> Row {
        row([
            (columns::YEAR, CellValue::from(year)),
            (columns::SCHOOL_ID, CellValue::from(school_id)),
            (columns::DEGREE, CellValue::from(degree)),
            (columns::EMPLOYMENT_RATE_OVERALL, CellValue::from(rate)),
            (columns::GROSS_MONTHLY_MEDIAN, salary.into()),
        ])
    }

    fn fixture() -> MemorySource {
        let survey = vec![
            survey_row(2023, 1, "Computer Science", 95.0, "5,000"),
            survey_row(2023, 1, "Business", 90.0, 4200.0),
            survey_row(2023, 1, "Arts", 85.0, 3400.0),
            survey_row(2023, 2, "Computer Science", 93.0, 4800.0),
            survey_row(2022, 1, "Computer Science", 92.0, 4700.0),
            // Placeholder degree rows carry no information.
            survey_row(2023, 1, "na", 50.0, 1000.0),
        ];
        let mapping = vec![
            row([
                (columns::SCHOOL_ID, CellValue::from(1)),
                (columns::FULL_NAME, CellValue::from("National University")),
            ]),
            row([
                (columns::SCHOOL_ID, CellValue::from(2)),
                (columns::FULL_NAME, CellValue::from("Polytechnic A")),
            ]),
        ];
        MemorySource::new()
            .with_relation(Relation::GraduateEmploymentSurvey, survey)
            .with_relation(Relation::SchoolMapping, mapping)
    }

    #[tokio::test]
    async fn defaults_to_latest_year_and_sorts_by_salary() {
        let source = fixture();
        let bands = CorrelationBands::default();
        let out = salary_employment_correlation(&source, None, None, &bands)
            .await
            .unwrap();

        assert_eq!(out.year, Some(2023));
        assert_eq!(out.available_years, vec![2022, 2023]);
        assert_eq!(
            out.available_schools,
            vec!["National University", "Polytechnic A"]
        );
        // "na" degree excluded; four groups remain.
        assert_eq!(out.statistics.sample_size, 4);
        assert_eq!(out.data[0].median_salary, 5000.0);
        assert_eq!(out.data[0].degree, "Computer Science");
        assert_eq!(
            out.statistics.highest_salary.as_ref().unwrap().median_salary,
            5000.0
        );
        assert_eq!(
            out.statistics.lowest_salary.as_ref().unwrap().median_salary,
            3400.0
        );
        // Salary and rate rise together in this fixture.
        assert!(out.correlation_coefficient.unwrap() > 0.9);
        assert_eq!(out.interpretation, "Strong positive correlation");
    }

    #[tokio::test]
    async fn school_filter_groups_by_degree_only() {
        let source = fixture();
        let bands = CorrelationBands::default();
        let out =
            salary_employment_correlation(&source, Some(2023), Some("National University"), &bands)
                .await
                .unwrap();

        assert_eq!(out.selected_school.as_deref(), Some("National University"));
        assert_eq!(out.statistics.sample_size, 3);
        assert!(out.data.iter().all(|p| p.school == "National University"));
    }

    #[tokio::test]
    async fn empty_survey_is_well_formed() {
        let source = MemorySource::new()
            .with_relation(Relation::GraduateEmploymentSurvey, vec![])
            .with_relation(Relation::SchoolMapping, vec![]);
        let bands = CorrelationBands::default();
        let out = salary_employment_correlation(&source, None, None, &bands)
            .await
            .unwrap();

        assert_eq!(out.year, None);
        assert!(out.data.is_empty());
        assert_eq!(out.correlation_coefficient, None);
        assert_eq!(out.interpretation, "Insufficient data to compute correlation");
    }

    #[tokio::test]
    async fn degree_history_aggregates_by_year() {
        let source = fixture();
        let out = degree_historical_trends(&source, "Computer Science", None)
            .await
            .unwrap();

        assert_eq!(out.total_years, 2);
        assert_eq!(out.trends[0].year, 2022);
        assert_eq!(out.trends[0].employment_rate, Some(92.0));
        // 2023 averages the two schools: (95 + 93) / 2.
        assert_eq!(out.trends[1].employment_rate, Some(94.0));
        assert_eq!(out.trends[1].median_salary, Some(4900.0));
        assert_eq!(
            out.schools_offering,
            vec!["National University", "Polytechnic A"]
        );
    }

    #[tokio::test]
    async fn degree_history_unknown_degree_is_empty() {
        let source = fixture();
        let out = degree_historical_trends(&source, "Astrology", None)
            .await
            .unwrap();
        assert!(out.trends.is_empty());
        assert!(out.schools_offering.is_empty());
        assert_eq!(out.total_years, 0);
    }

    #[tokio::test]
    async fn degree_history_rejects_empty_degree() {
        let source = fixture();
        let err = degree_historical_trends(&source, "", None).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
    }
}
