//! # Plan Builder
//!
//! Translates AST fragments into physical plan nodes and attaches the
//! statistics the cost model and optimizer work with.
//!
//! Conditions and projections are carried in the plan as rendered text.
//! [`render_expr`] is the canonical renderer: infix, fully parenthesized
//! binary operations, `table.column` for qualified columns, raw text for
//! literals. The cost model's text-keyed selectivity lookups and the
//! executor's predicate recognizer both depend on this rendering staying
//! fixed.

use crate::ast::{Expression, JoinClause, JoinKind, SelectItem, SelectStatement, TableReference};
use crate::catalog::{Catalog, Column, ColumnType, Schema};
use crate::plan::{JoinAlgorithm, JoinType, PlanKind, PlanNode, PlanStats};
use crate::stats::DEFAULT_SELECTIVITY;

/// Render an expression to its canonical text form.
pub fn render_expr(expr: &Expression) -> String {
    match expr {
        Expression::Column { table, column } => match table {
            Some(table) => format!("{table}.{column}"),
            None => column.clone(),
        },
        Expression::Literal(text) => text.clone(),
        Expression::BinaryOp { op, left, right } => {
            format!("({} {} {})", render_expr(left), op, render_expr(right))
        }
    }
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::Inner,
            JoinKind::Left => JoinType::LeftOuter,
            JoinKind::Right => JoinType::RightOuter,
        }
    }
}

/// Builds plan nodes from AST fragments, reading statistics from the
/// injected catalog.
pub struct PlanBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Scan of a base table. The scan's schema records the qualified table
    /// name with a wildcard column; the executor substitutes the real
    /// table schema at runtime.
    pub fn build_scan(&self, table: &TableReference) -> PlanNode {
        let stats = self.catalog.statistics(&table.table_name);
        let mut node = PlanNode::new(PlanKind::TableScan {
            table: table.table_name.clone(),
            alias: table.alias.clone(),
        });
        node.stats = PlanStats::new(stats.tuple_count, stats.page_count, 1.0);
        node.output_schema = Schema::new(vec![Column::qualified(
            table.table_name.clone(),
            "*",
            ColumnType::Int,
        )]);
        node
    }

    /// Filter above `child`. Page counts and schema pass through; the row
    /// count is scaled by the default selectivity.
    pub fn build_filter(&self, child: PlanNode, condition: &Expression) -> PlanNode {
        let mut node = PlanNode::new(PlanKind::Filter {
            condition: render_expr(condition),
        });
        node.stats = PlanStats::new(
            (child.stats.row_count as f64 * DEFAULT_SELECTIVITY) as u64,
            child.stats.page_count,
            DEFAULT_SELECTIVITY,
        );
        node.output_schema = child.output_schema.clone();
        node.children.push(child);
        node
    }

    /// Projection above `child`, one rendered entry per select item.
    pub fn build_project(&self, child: PlanNode, items: &[SelectItem]) -> PlanNode {
        let projections = items.iter().map(|item| render_expr(&item.expression)).collect();
        let mut node = PlanNode::new(PlanKind::Project { projections });
        node.stats = child.stats;
        node.output_schema = child.output_schema.clone();
        node.children.push(child);
        node
    }

    /// Join of `left` and `right` using the given physical algorithm.
    pub fn build_join(
        &self,
        left: PlanNode,
        right: PlanNode,
        join: &JoinClause,
        algorithm: JoinAlgorithm,
    ) -> PlanNode {
        let join_type = JoinType::from(join.join_type);
        let condition = render_expr(&join.condition);
        let kind = match algorithm {
            JoinAlgorithm::NestedLoop => PlanKind::NestedLoopJoin {
                join_type,
                condition,
            },
            JoinAlgorithm::Hash => PlanKind::HashJoin {
                join_type,
                condition,
            },
            JoinAlgorithm::SortMerge => PlanKind::SortMergeJoin {
                join_type,
                condition,
            },
        };

        let row_count = left.stats.row_count * right.stats.row_count / 10;
        let mut node = PlanNode::new(kind);
        node.stats = PlanStats::new(row_count, row_count / 100, DEFAULT_SELECTIVITY);
        node.output_schema = left.output_schema.concat(&right.output_schema);
        node.children.push(left);
        node.children.push(right);
        node
    }

    /// Default plan for a statement: scan the FROM table, fold each join
    /// clause as a left-deep nested-loop join, apply the WHERE filter if
    /// present, and finish with a projection.
    pub fn build_plan(&self, stmt: &SelectStatement) -> PlanNode {
        let mut plan = self.build_scan(&stmt.from_table);
        for join in &stmt.joins {
            let right = self.build_scan(&join.table);
            plan = self.build_join(plan, right, join, JoinAlgorithm::NestedLoop);
        }
        if let Some(where_clause) = &stmt.where_clause {
            plan = self.build_filter(plan, where_clause);
        }
        self.build_project(plan, &stmt.select_list)
    }
}
