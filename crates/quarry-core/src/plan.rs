//! # Physical Plan Tree
//!
//! A plan is a tree of physical operators: `TableScan` at the leaves,
//! `Filter` and `Project` with one child each, and the three join
//! operators with exactly two children. Each node owns its children
//! exclusively; there are no back-references.
//!
//! Every node carries its operator data (the [`PlanKind`] tag), an output
//! schema, the statistics the builder derived for it, and the cost the
//! optimizer assigned. `total` cost is always `io + cpu`.
//!
//! Nodes can price themselves with [`PlanNode::estimate_cost`] for quick
//! comparisons of hand-built plans; the optimizer itself uses the richer
//! [`crate::cost::CostModel`], which reads catalog statistics instead of
//! the per-node ones.

use crate::catalog::Schema;
use crate::cost::log2_or_zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Join semantics as declared in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::LeftOuter => "LEFT",
            JoinType::RightOuter => "RIGHT",
            JoinType::FullOuter => "FULL",
        };
        f.write_str(name)
    }
}

/// Physical join algorithm, the enumeration axis of the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinAlgorithm {
    NestedLoop,
    Hash,
    SortMerge,
}

/// Operator tag plus operator-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanKind {
    TableScan {
        table: String,
        alias: Option<String>,
    },
    Filter {
        condition: String,
    },
    Project {
        projections: Vec<String>,
    },
    NestedLoopJoin {
        join_type: JoinType,
        condition: String,
    },
    HashJoin {
        join_type: JoinType,
        condition: String,
    },
    SortMergeJoin {
        join_type: JoinType,
        condition: String,
    },
}

impl PlanKind {
    /// Operator name as printed in plan text.
    pub fn label(&self) -> &'static str {
        match self {
            PlanKind::TableScan { .. } => "TableScan",
            PlanKind::Filter { .. } => "Filter",
            PlanKind::Project { .. } => "Project",
            PlanKind::NestedLoopJoin { .. } => "NestedLoopJoin",
            PlanKind::HashJoin { .. } => "HashJoin",
            PlanKind::SortMergeJoin { .. } => "SortMergeJoin",
        }
    }

    /// Declared join type and condition, for join operators.
    pub fn join_parts(&self) -> Option<(JoinType, &str)> {
        match self {
            PlanKind::NestedLoopJoin {
                join_type,
                condition,
            }
            | PlanKind::HashJoin {
                join_type,
                condition,
            }
            | PlanKind::SortMergeJoin {
                join_type,
                condition,
            } => Some((*join_type, condition)),
            _ => None,
        }
    }
}

/// Statistics the builder attaches to each node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    pub row_count: u64,
    pub page_count: u64,
    pub selectivity: f64,
}

impl Default for PlanStats {
    fn default() -> Self {
        Self {
            row_count: 0,
            page_count: 0,
            selectivity: 1.0,
        }
    }
}

impl PlanStats {
    pub fn new(row_count: u64, page_count: u64, selectivity: f64) -> Self {
        Self {
            row_count,
            page_count,
            selectivity,
        }
    }
}

/// An (io, cpu) cost pair; `total` is always their sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostEstimate {
    pub io: f64,
    pub cpu: f64,
    pub total: f64,
}

impl CostEstimate {
    pub fn new(io: f64, cpu: f64) -> Self {
        Self {
            io,
            cpu,
            total: io + cpu,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Default for CostEstimate {
    fn default() -> Self {
        Self::zero()
    }
}

/// Epsilon comparison on totals, so plans with the same cost compare equal
/// regardless of how the io/cpu split rounded.
impl PartialEq for CostEstimate {
    fn eq(&self, other: &Self) -> bool {
        (self.total - other.total).abs() < f64::EPSILON
    }
}

impl PartialOrd for CostEstimate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.total.partial_cmp(&other.total)
    }
}

/// One node of a physical plan tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNode {
    pub kind: PlanKind,
    pub output_schema: Schema,
    pub stats: PlanStats,
    pub cost: CostEstimate,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn new(kind: PlanKind) -> Self {
        Self {
            kind,
            output_schema: Schema::default(),
            stats: PlanStats::default(),
            cost: CostEstimate::zero(),
            children: Vec::new(),
        }
    }

    /// Indented plan text, two spaces per level.
    ///
    /// Scans print as a single line without a trailing newline; unary
    /// operators print their own line followed by the child; joins print
    /// both children separated by a newline.
    pub fn display(&self, indent: usize) -> String {
        let pad = "  ".repeat(indent);
        match &self.kind {
            PlanKind::TableScan { table, alias } => match alias {
                Some(alias) => format!("{pad}TableScan({table} as {alias})"),
                None => format!("{pad}TableScan({table})"),
            },
            PlanKind::Filter { condition } => {
                let mut out = format!("{pad}Filter({condition})\n");
                if let Some(child) = self.children.first() {
                    out.push_str(&child.display(indent + 1));
                }
                out
            }
            PlanKind::Project { projections } => {
                let mut out = format!("{pad}Project({})\n", projections.join(", "));
                if let Some(child) = self.children.first() {
                    out.push_str(&child.display(indent + 1));
                }
                out
            }
            PlanKind::NestedLoopJoin {
                join_type,
                condition,
            }
            | PlanKind::HashJoin {
                join_type,
                condition,
            }
            | PlanKind::SortMergeJoin {
                join_type,
                condition,
            } => {
                let mut out =
                    format!("{pad}{}({join_type}, {condition})\n", self.kind.label());
                if let [left, right] = self.children.as_slice() {
                    out.push_str(&left.display(indent + 1));
                    out.push('\n');
                    out.push_str(&right.display(indent + 1));
                }
                out
            }
        }
    }

    /// Self-contained cost estimate from the node's own statistics.
    ///
    /// Useful for comparing hand-built plans without a catalog. Nodes with
    /// missing children price as zero.
    pub fn estimate_cost(&self) -> CostEstimate {
        match &self.kind {
            PlanKind::TableScan { .. } => CostEstimate::new(
                self.stats.page_count as f64,
                self.stats.row_count as f64 * 0.01,
            ),
            PlanKind::Filter { .. } => {
                let Some(child) = self.children.first() else {
                    return CostEstimate::zero();
                };
                let child_cost = child.estimate_cost();
                CostEstimate::new(
                    child_cost.io,
                    child_cost.cpu + self.stats.row_count as f64 * 0.02,
                )
            }
            PlanKind::Project { .. } => {
                let Some(child) = self.children.first() else {
                    return CostEstimate::zero();
                };
                let child_cost = child.estimate_cost();
                CostEstimate::new(
                    child_cost.io,
                    child_cost.cpu + self.stats.row_count as f64 * 0.01,
                )
            }
            PlanKind::NestedLoopJoin { .. } => {
                let [left, right] = self.children.as_slice() else {
                    return CostEstimate::zero();
                };
                let (left_cost, right_cost) = (left.estimate_cost(), right.estimate_cost());
                let left_rows = left.stats.row_count as f64;
                let right_rows = right.stats.row_count as f64;
                CostEstimate::new(
                    left_cost.io + left_rows * right_cost.io,
                    left_cost.cpu + right_cost.cpu + left_rows * right_rows * 0.01,
                )
            }
            PlanKind::HashJoin { .. } => {
                let [left, right] = self.children.as_slice() else {
                    return CostEstimate::zero();
                };
                let (left_cost, right_cost) = (left.estimate_cost(), right.estimate_cost());
                let rows = (left.stats.row_count + right.stats.row_count) as f64;
                CostEstimate::new(
                    left_cost.io + right_cost.io,
                    left_cost.cpu + right_cost.cpu + rows * 0.02,
                )
            }
            PlanKind::SortMergeJoin { .. } => {
                let [left, right] = self.children.as_slice() else {
                    return CostEstimate::zero();
                };
                let (left_cost, right_cost) = (left.estimate_cost(), right.estimate_cost());
                let sort = |rows: u64| {
                    let n = rows as f64;
                    n * log2_or_zero(n) * 0.01
                };
                CostEstimate::new(
                    left_cost.io + right_cost.io,
                    left_cost.cpu
                        + right_cost.cpu
                        + sort(left.stats.row_count)
                        + sort(right.stats.row_count),
                )
            }
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_display_with_alias() {
        let plain = PlanNode::new(PlanKind::TableScan {
            table: "users".into(),
            alias: None,
        });
        assert_eq!(plain.display(0), "TableScan(users)");

        let aliased = PlanNode::new(PlanKind::TableScan {
            table: "users".into(),
            alias: Some("u".into()),
        });
        assert_eq!(aliased.display(1), "  TableScan(users as u)");
    }

    #[test]
    fn cost_total_is_io_plus_cpu() {
        let cost = CostEstimate::new(12.5, 7.5);
        assert_eq!(cost.total, 20.0);
        assert_eq!(CostEstimate::zero().total, 0.0);
    }

    #[test]
    fn childless_unary_node_costs_zero() {
        let filter = PlanNode::new(PlanKind::Filter {
            condition: "age > 25".into(),
        });
        assert_eq!(filter.estimate_cost(), CostEstimate::zero());
    }
}
