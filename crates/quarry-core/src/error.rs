//! Errors shared across the optimizer and executor.
//!
//! Fatal errors abort the current optimize or execute call and surface to
//! the caller. Per-row soft failures (a filter or join key that cannot be
//! read from a particular row) are absorbed by the operators themselves and
//! never reach this type.

/// Error type for catalog access, plan validation, optimization, and
/// execution.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A catalog lookup failed because no table has the given name.
    #[error("table not found: {0}")]
    TableNotFound(String),
    /// A column name could not be resolved, or an index fell outside the
    /// schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// A plan node is structurally unusable (e.g. a join missing a child).
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// The SQL front end rejected the input text.
    #[error("parse error: {0}")]
    Parse(String),
    /// The optimizer could not generate any candidate plan.
    #[error("optimization failed: no candidate plans were generated")]
    OptimizationFailed,
}
