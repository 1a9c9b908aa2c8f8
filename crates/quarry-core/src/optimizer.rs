//! # Plan Enumeration and Selection
//!
//! The optimizer turns a parsed statement into the cheapest physical plan
//! it can find:
//!
//! 1. Statements without joins take the direct path: build the default
//!    plan and annotate its cost.
//! 2. Statements with joins enumerate candidates across the three join
//!    algorithms. For a single join the two-table order is also varied,
//!    giving six candidates; deeper join chains keep the left-deep order
//!    written in the query and vary only the algorithm.
//!
//! Every candidate is costed by the [`CostModel`] and the minimum total
//! wins, ties resolved in favor of the earliest candidate generated.
//!
//! Two rewrite transforms, [`Optimizer::apply_filter_pushdown`] and
//! [`Optimizer::choose_join_algorithm`], are named here as extension
//! points; both currently return their input unchanged.

use crate::ast::SelectStatement;
use crate::builder::PlanBuilder;
use crate::catalog::Catalog;
use crate::cost::CostModel;
use crate::error::QueryError;
use crate::plan::{CostEstimate, JoinAlgorithm, PlanNode};
use std::fmt::Write as _;
use tracing::{debug, trace};

const JOIN_ALGORITHMS: [JoinAlgorithm; 3] = [
    JoinAlgorithm::NestedLoop,
    JoinAlgorithm::Hash,
    JoinAlgorithm::SortMerge,
];

/// A costed candidate plan.
#[derive(Debug, Clone)]
pub struct PlanCandidate {
    pub plan: PlanNode,
    pub cost: CostEstimate,
}

/// Cost-based optimizer over an injected catalog.
pub struct Optimizer<'a> {
    builder: PlanBuilder<'a>,
    cost_model: CostModel<'a>,
}

impl<'a> Optimizer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            builder: PlanBuilder::new(catalog),
            cost_model: CostModel::new(catalog),
        }
    }

    /// Produce the cheapest plan for a statement.
    pub fn optimize(&self, stmt: &SelectStatement) -> Result<PlanNode, QueryError> {
        if stmt.joins.is_empty() {
            self.optimize_single_table(stmt)
        } else {
            let candidates = self.generate_all_plans(stmt);
            self.select_best(candidates)
        }
    }

    fn optimize_single_table(&self, stmt: &SelectStatement) -> Result<PlanNode, QueryError> {
        let plan = self.builder.build_plan(stmt);
        let mut plan = self.apply_filter_pushdown(plan);
        plan.cost = self.cost_model.estimate(&plan);
        debug!(
            table = %stmt.from_table.table_name,
            total = plan.cost.total,
            "single-table plan costed"
        );
        Ok(plan)
    }

    /// Enumerate every candidate plan for a statement.
    ///
    /// Candidates are generated left-deep first (one per algorithm, joins
    /// folded in query order), then, when the statement has exactly one
    /// join, with the two scan operands swapped (again one per algorithm).
    pub fn generate_all_plans(&self, stmt: &SelectStatement) -> Vec<PlanCandidate> {
        if stmt.joins.is_empty() {
            let mut plan = self.builder.build_plan(stmt);
            plan.cost = self.cost_model.estimate(&plan);
            let cost = plan.cost;
            return vec![PlanCandidate { plan, cost }];
        }

        let mut candidates = Vec::new();

        for algorithm in JOIN_ALGORITHMS {
            let mut plan = self.builder.build_scan(&stmt.from_table);
            for join in &stmt.joins {
                let right = self.builder.build_scan(&join.table);
                plan = self.builder.build_join(plan, right, join, algorithm);
            }
            candidates.push(self.finish_candidate(plan, stmt));
        }

        if let [join] = stmt.joins.as_slice() {
            for algorithm in JOIN_ALGORITHMS {
                let left = self.builder.build_scan(&join.table);
                let right = self.builder.build_scan(&stmt.from_table);
                let plan = self.builder.build_join(left, right, join, algorithm);
                candidates.push(self.finish_candidate(plan, stmt));
            }
        }

        debug!(count = candidates.len(), "candidate plans generated");
        candidates
    }

    /// Complete a join subtree into a full candidate: WHERE filter if
    /// present, projection, cost annotation.
    fn finish_candidate(&self, mut plan: PlanNode, stmt: &SelectStatement) -> PlanCandidate {
        if let Some(where_clause) = &stmt.where_clause {
            plan = self.builder.build_filter(plan, where_clause);
        }
        plan = self.builder.build_project(plan, &stmt.select_list);
        plan.cost = self.cost_model.estimate(&plan);
        trace!(
            root = plan.kind.label(),
            total = plan.cost.total,
            "candidate costed"
        );
        PlanCandidate {
            cost: plan.cost,
            plan,
        }
    }

    /// Pick the candidate with the lowest total cost.
    pub fn select_best(&self, candidates: Vec<PlanCandidate>) -> Result<PlanNode, QueryError> {
        candidates
            .into_iter()
            .min_by(|a, b| a.cost.total.total_cmp(&b.cost.total))
            .map(|candidate| {
                debug!(total = candidate.cost.total, "selected plan");
                candidate.plan
            })
            .ok_or(QueryError::OptimizationFailed)
    }

    /// Render a report of all candidates and the selected one.
    pub fn report(&self, candidates: &[PlanCandidate]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Query Optimization Report ===");
        let _ = writeln!(out, "Generated {} plan alternatives:", candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            let _ = writeln!(out, "\nPlan {}:", i + 1);
            let _ = writeln!(out, "{}", candidate.plan.display(0));
            let _ = writeln!(
                out,
                "Cost: I/O={}, CPU={}, Total={}",
                candidate.cost.io, candidate.cost.cpu, candidate.cost.total
            );
        }
        if let Some((best, candidate)) = candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cost.total.total_cmp(&b.cost.total))
        {
            let _ = writeln!(
                out,
                "\n*** SELECTED PLAN {} (Lowest Cost: {}) ***",
                best + 1,
                candidate.cost.total
            );
        }
        out
    }

    /// Print the optimization report to stdout.
    pub fn print_report(&self, candidates: &[PlanCandidate]) {
        println!("{}", self.report(candidates));
    }

    /// Push filters below joins. Not implemented yet; returns the plan
    /// unchanged.
    pub fn apply_filter_pushdown(&self, plan: PlanNode) -> PlanNode {
        plan
    }

    /// Rewrite join algorithms in an existing plan. Not implemented yet;
    /// returns the plan unchanged.
    pub fn choose_join_algorithm(&self, plan: PlanNode) -> PlanNode {
        plan
    }
}
