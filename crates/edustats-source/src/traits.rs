//! # Data Source Trait
//!
//! Abstract read interface over the four relations. Implementations
//! can be swapped for different backends (flat files, MySQL, mock).

use async_trait::async_trait;
use edustats_domain::{Relation, Row};

use crate::error::Result;
use crate::filter::RowFilter;

/// Read-only access to named relations.
///
/// One call fetches one relation in full, or narrowed by `filter` when
/// the backend supports pushdown. The engine treats a fetch as a
/// single synchronous unit of work; all concurrency discipline lives
/// behind this trait.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Fetch all rows of `relation`, optionally narrowed by `filter`.
    ///
    /// Backends that cannot push the filter down return the full
    /// relation; callers re-apply predicates locally either way.
    async fn fetch(&self, relation: Relation, filter: Option<&RowFilter>) -> Result<Vec<Row>>;
}
