//! # Table Statistics
//!
//! Statistics drive cost-based optimization: the cost model needs tuple and
//! page counts to compare alternative plans, and selectivity estimates to
//! predict how many rows survive each operator.
//!
//! Statistics are set once per table when the catalog is populated and are
//! read-only afterwards. When a table has no recorded statistics, the
//! catalog hands out [`TableStatistics::default`] so that the optimizer can
//! still make relative comparisons.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selectivity assumed for predicates with no recorded estimate.
pub const DEFAULT_SELECTIVITY: f64 = 0.1;

/// Per-table statistics used for cardinality and cost estimation.
///
/// Predicate selectivities are stored under the literal condition text
/// (e.g. `"age > 25"`). Distinct-value counts are keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    /// Number of rows in the table.
    pub tuple_count: u64,
    /// Number of storage pages the table occupies.
    pub page_count: u64,
    /// Average row width in bytes.
    pub tuple_width: u64,
    /// Selectivity estimates keyed by rendered condition text.
    pub column_selectivity: HashMap<String, f64>,
    /// Number of distinct values per column.
    pub distinct_values: HashMap<String, u64>,
}

impl Default for TableStatistics {
    fn default() -> Self {
        Self::new(1000, 10, 100)
    }
}

impl TableStatistics {
    pub fn new(tuple_count: u64, page_count: u64, tuple_width: u64) -> Self {
        Self {
            tuple_count,
            page_count,
            tuple_width,
            column_selectivity: HashMap::new(),
            distinct_values: HashMap::new(),
        }
    }

    /// Record a selectivity estimate for a condition.
    pub fn with_selectivity(mut self, condition: impl Into<String>, selectivity: f64) -> Self {
        self.column_selectivity.insert(condition.into(), selectivity);
        self
    }

    /// Record the distinct-value count of a column.
    pub fn with_distinct(mut self, column: impl Into<String>, count: u64) -> Self {
        self.distinct_values.insert(column.into(), count);
        self
    }

    /// Selectivity recorded for a condition, or [`DEFAULT_SELECTIVITY`].
    pub fn selectivity(&self, condition: &str) -> f64 {
        self.column_selectivity
            .get(condition)
            .copied()
            .unwrap_or(DEFAULT_SELECTIVITY)
    }

    /// Distinct-value count recorded for a column, if any.
    pub fn distinct(&self, column: &str) -> Option<u64> {
        self.distinct_values.get(column).copied()
    }
}
