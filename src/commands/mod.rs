//! Rendering of command and query results.

mod query;

pub use query::{format_result_set, format_timing};
