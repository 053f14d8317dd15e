//! Top-level query functions consumed by the presentation layer.
//!
//! Each function composes the normalizer, joiner, aggregation engine
//! and statistics module against specific relations, taking an
//! injected data source and already-parsed parameters and returning a
//! plain serializable response struct. A filter that matches zero rows
//! is never an error; callers get a well-formed empty result to render
//! as an empty state.

pub mod employment;
pub mod enrollment;
pub mod salary;

pub use employment::{employment_by_degree, employment_by_school, employment_trend};
pub use enrollment::{enrollment_by_school_for_year, enrollment_graduate_analysis};
pub use salary::{degree_historical_trends, salary_employment_correlation};

use edustats_domain::{columns, Relation, Row};
use edustats_source::{RowFilter, TabularSource};

use crate::clean::normalize_column;
use crate::error::Result;
use crate::join::attach_school_names;

/// Fetch a relation and re-apply the filter locally, so sources that
/// ignore pushdown still yield correct results.
pub(crate) async fn fetch_rows(
    source: &dyn TabularSource,
    relation: Relation,
    filter: Option<&RowFilter>,
) -> Result<Vec<Row>> {
    let mut rows = source.fetch(relation, filter).await?;
    if let Some(f) = filter {
        f.apply(&mut rows);
    }
    tracing::debug!(relation = %relation, rows = rows.len(), "fetched relation");
    Ok(rows)
}

/// Fetch the survey, normalize the given numeric columns, and attach
/// resolved school names from the mapping relation.
pub(crate) async fn fetch_survey_joined(
    source: &dyn TabularSource,
    filter: Option<&RowFilter>,
    numeric_columns: &[&str],
) -> Result<Vec<Row>> {
    let mut rows = fetch_rows(source, Relation::GraduateEmploymentSurvey, filter).await?;
    for column in numeric_columns {
        normalize_column(&mut rows, column);
    }

    let mapping = fetch_rows(source, Relation::SchoolMapping, None).await?;
    attach_school_names(&mut rows, &mapping);
    Ok(rows)
}

/// Distinct defined integer years, ascending.
pub(crate) fn distinct_years(rows: &[Row]) -> Vec<i32> {
    let mut years: Vec<i32> = rows
        .iter()
        .filter_map(|r| edustats_domain::int(r, columns::YEAR).map(|y| y as i32))
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}
