//! # quarry-exec: Plan Execution
//!
//! Interprets a physical plan tree against a catalog and materializes a
//! result set. Execution is single-threaded and pull-model: each operator
//! produces its complete result before its parent continues.
//!
//! - **`executor`**: The operator interpreters for scan, filter, project,
//!   and the three join algorithms.
//! - **`result`**: The materialized result set returned to the caller.

pub mod executor;
pub mod result;
