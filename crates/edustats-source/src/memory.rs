//! In-memory data source, the mock/fixture backend.

use async_trait::async_trait;
use edustats_domain::{Relation, Row};
use std::collections::HashMap;

use crate::error::{Result, SourceError};
use crate::filter::RowFilter;
use crate::traits::TabularSource;

/// A [`TabularSource`] over preloaded rows. Honors filter pushdown.
///
/// Used by tests and demos; a relation that was never loaded reads as
/// a backend failure, matching how a missing table behaves in a real
/// store.
#[derive(Debug, Default)]
pub struct MemorySource {
    relations: HashMap<Relation, Vec<Row>>,
}

impl MemorySource {
    /// Empty source with no relations loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or replace) a relation's rows.
    #[must_use]
    pub fn with_relation(mut self, relation: Relation, rows: Vec<Row>) -> Self {
        self.relations.insert(relation, rows);
        self
    }
}

#[async_trait]
impl TabularSource for MemorySource {
    async fn fetch(&self, relation: Relation, filter: Option<&RowFilter>) -> Result<Vec<Row>> {
        let rows = self
            .relations
            .get(&relation)
            .ok_or(SourceError::RelationNotFound(relation))?;

        match filter {
            Some(f) if !f.is_empty() => Ok(rows.iter().filter(|r| f.matches(r)).cloned().collect()),
            _ => Ok(rows.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edustats_domain::{columns, row, CellValue};

    fn survey_rows() -> Vec<Row> {
        vec![
            row([
                (columns::YEAR, CellValue::from(2022)),
                (columns::SCHOOL_ID, CellValue::from(1)),
            ]),
            row([
                (columns::YEAR, CellValue::from(2023)),
                (columns::SCHOOL_ID, CellValue::from(1)),
            ]),
        ]
    }

    #[tokio::test]
    async fn fetch_returns_loaded_rows() {
        let source = MemorySource::new()
            .with_relation(Relation::GraduateEmploymentSurvey, survey_rows());

        let rows = source
            .fetch(Relation::GraduateEmploymentSurvey, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn fetch_honors_pushdown_filter() {
        let source = MemorySource::new()
            .with_relation(Relation::GraduateEmploymentSurvey, survey_rows());

        let filter = RowFilter::new().eq(columns::YEAR, 2023);
        let rows = source
            .fetch(Relation::GraduateEmploymentSurvey, Some(&filter))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(edustats_domain::int(&rows[0], columns::YEAR), Some(2023));
    }

    #[tokio::test]
    async fn missing_relation_is_an_error() {
        let source = MemorySource::new();
        let err = source.fetch(Relation::SchoolMapping, None).await;
        assert!(matches!(err, Err(SourceError::RelationNotFound(_))));
    }
}
