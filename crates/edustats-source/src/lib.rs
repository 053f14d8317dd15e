//! # Tabular Data Source
//!
//! Abstract boundary between the analytics engine and whatever holds
//! the relations (flat files, a relational database, fixtures).
//! Implementations can be swapped for different backends; the engine
//! only ever asks for all rows of a named relation, optionally with a
//! filter pushed down.
//!
//! Filter pushdown is an optimization, not a contract: a backend may
//! ignore the filter and return the full relation, because the
//! analytics engine re-applies the same predicates locally.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod error;
pub mod filter;
pub mod memory;
pub mod traits;

pub use error::{Result, SourceError};
pub use filter::RowFilter;
pub use memory::MemorySource;
pub use traits::TabularSource;
