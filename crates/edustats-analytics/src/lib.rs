//! # Education Statistics Analytics
//!
//! Tabular analytics engine behind the education statistics dashboard.
//! Turns raw heterogeneous rows from the data source into the derived
//! metrics the frontend renders: trend slopes, correlation
//! coefficients, completion and stability ratios, ranked breakdowns.
//!
//! ## Pipeline
//!
//! raw relation → numeric normalizer → (optional) school-name join →
//! parameter filters → aggregation → statistics → response shaping.
//!
//! Every query function is a pure composition of those stages against
//! an injected [`edustats_source::TabularSource`]; nothing here keeps
//! state between calls or mutates shared data, so concurrent calls
//! need no coordination.
//!
//! Data-quality conditions (missing values, unresolvable school ids,
//! zero divisions, too-small samples) are never errors: they surface
//! as `None` in the response structs and serialize as JSON `null`.
//! Only data-source failures and invalid parameters cross the boundary
//! as errors.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod aggregate;
pub mod clean;
pub mod error;
pub mod join;
pub mod queries;
pub mod stats;

pub use error::{AnalyticsError, Result};
