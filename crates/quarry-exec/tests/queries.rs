//! End-to-end query execution over the sample workload, plus operator
//! behavior on small hand-built fixtures.

use quarry_core::catalog::{Catalog, Column, ColumnType, Row, Schema, Value};
use quarry_core::error::QueryError;
use quarry_core::optimizer::Optimizer;
use quarry_core::plan::{JoinAlgorithm, PlanKind, PlanNode};
use quarry_exec::executor::Executor;
use quarry_exec::result::ResultSet;
use quarry_sql::parse_select;

fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.populate_sample_data();
    catalog
}

/// Run a SQL statement through optimize and execute.
fn run(catalog: &Catalog, sql: &str) -> ResultSet {
    let stmt = parse_select(sql).unwrap();
    let plan = Optimizer::new(catalog).optimize(&stmt).unwrap();
    Executor::new(catalog).execute(&plan).unwrap()
}

/// Two tiny tables for join-operator fixtures. Column 0 of `lhs` and
/// column 1 of `rhs` are the join keys.
fn fixture_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    catalog.create_table(
        "lhs",
        Schema::new(vec![
            Column::qualified("lhs", "id", ColumnType::Int),
            Column::qualified("lhs", "tag", ColumnType::Text),
        ]),
    );
    catalog
        .populate(
            "lhs",
            vec![
                Row::new(vec![Value::Int(1), Value::Str("a".into())]),
                Row::new(vec![Value::Int(2), Value::Str("b".into())]),
                Row::new(vec![Value::Int(3), Value::Str("c".into())]),
            ],
        )
        .unwrap();

    catalog.create_table(
        "rhs",
        Schema::new(vec![
            Column::qualified("rhs", "rid", ColumnType::Int),
            Column::qualified("rhs", "lhs_id", ColumnType::Int),
        ]),
    );
    catalog
        .populate(
            "rhs",
            vec![
                Row::new(vec![Value::Int(10), Value::Int(2)]),
                Row::new(vec![Value::Int(11), Value::Int(1)]),
                Row::new(vec![Value::Int(12), Value::Int(2)]),
                Row::new(vec![Value::Int(13), Value::Int(3)]),
            ],
        )
        .unwrap();

    catalog
}

fn scan_node(table: &str) -> PlanNode {
    PlanNode::new(PlanKind::TableScan {
        table: table.into(),
        alias: None,
    })
}

fn join_plan(catalog: &Catalog, algorithm: JoinAlgorithm, sql: &str) -> PlanNode {
    let stmt = parse_select(sql).unwrap();
    let builder = quarry_core::builder::PlanBuilder::new(catalog);
    let left = builder.build_scan(&stmt.from_table);
    let right = builder.build_scan(&stmt.joins[0].table);
    builder.build_join(left, right, &stmt.joins[0], algorithm)
}

// ---------------------------------------------------------------------------
// Full-pipeline scenarios on the sample workload
// ---------------------------------------------------------------------------

#[test]
fn filtered_projection_over_users() {
    let catalog = sample_catalog();
    let result = run(&catalog, "SELECT name, age FROM users WHERE age > 25");

    // ages are 20 + (i % 50), so the filter keeps rows with i % 50 > 5
    let expected = (1..=1000).filter(|i| 20 + (i % 50) > 25).count();
    assert_eq!(result.len(), expected);

    assert_eq!(result.schema.column_count(), 2);
    assert_eq!(result.schema.columns[0].name, "name");
    assert_eq!(result.schema.columns[0].ty, ColumnType::Text);
    assert_eq!(result.schema.columns[1].name, "age");
    assert_eq!(result.schema.columns[1].ty, ColumnType::Int);

    for row in &result.rows {
        assert!(row.int(1).unwrap() > 25);
    }
}

#[test]
fn id_equality_filter_finds_one_user() {
    let catalog = sample_catalog();
    let result = run(&catalog, "SELECT * FROM users WHERE id = 42");
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0].values[1], Value::Str("User42".into()));
}

#[test]
fn users_orders_join_end_to_end() {
    let catalog = sample_catalog();
    let result = run(
        &catalog,
        "SELECT * FROM users JOIN orders ON users.id = orders.user_id",
    );

    // every order matches exactly one user
    assert_eq!(result.len(), 5000);
    assert_eq!(result.schema.column_count(), 8);

    for row in &result.rows {
        assert_eq!(row.int(0), row.int(5));
    }
}

#[test]
fn hash_and_sort_merge_agree_on_the_join() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);
    let sql = "SELECT * FROM users JOIN orders ON users.id = orders.user_id";

    let hash = executor
        .execute(&join_plan(&catalog, JoinAlgorithm::Hash, sql))
        .unwrap();
    let sort_merge = executor
        .execute(&join_plan(&catalog, JoinAlgorithm::SortMerge, sql))
        .unwrap();

    assert_eq!(hash.len(), 5000);
    assert_eq!(sort_merge.len(), 5000);
    assert_eq!(hash.schema, sort_merge.schema);

    // same multiset of rows; (user id, order id) identifies a row uniquely
    let key = |row: &Row| (row.int(0), row.int(4));
    let mut hash_rows = hash.rows;
    let mut merge_rows = sort_merge.rows;
    hash_rows.sort_by_key(key);
    merge_rows.sort_by_key(key);
    assert_eq!(hash_rows, merge_rows);
}

#[test]
fn execution_is_deterministic() {
    let catalog = sample_catalog();
    let sql = "SELECT * FROM users JOIN orders ON users.id = orders.user_id";
    let first = run(&catalog, sql);
    let second = run(&catalog, sql);
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Operator behavior on small fixtures
// ---------------------------------------------------------------------------

#[test]
fn nested_loop_emits_the_cartesian_product() {
    let catalog = fixture_catalog();
    let plan = join_plan(
        &catalog,
        JoinAlgorithm::NestedLoop,
        "SELECT * FROM lhs JOIN rhs ON lhs.id = rhs.lhs_id",
    );
    let result = Executor::new(&catalog).execute(&plan).unwrap();

    // the join condition is recorded for costing only
    assert_eq!(result.len(), 3 * 4);
    assert_eq!(result.schema.column_count(), 4);

    // (outer, inner) order: the first four rows carry the first left row
    for row in &result.rows[..4] {
        assert_eq!(row.int(0), Some(1));
    }
    let right_ids: Vec<_> = result.rows[..4].iter().map(|r| r.int(2).unwrap()).collect();
    assert_eq!(right_ids, vec![10, 11, 12, 13]);
}

#[test]
fn hash_join_emits_in_probe_order() {
    let catalog = fixture_catalog();
    let plan = join_plan(
        &catalog,
        JoinAlgorithm::Hash,
        "SELECT * FROM lhs JOIN rhs ON lhs.id = rhs.lhs_id",
    );
    let result = Executor::new(&catalog).execute(&plan).unwrap();

    assert_eq!(result.len(), 4);
    let pairs: Vec<_> = result
        .rows
        .iter()
        .map(|r| (r.int(0).unwrap(), r.int(2).unwrap()))
        .collect();
    assert_eq!(pairs, vec![(2, 10), (1, 11), (2, 12), (3, 13)]);
}

#[test]
fn sort_merge_emits_in_sorted_left_key_order() {
    let catalog = fixture_catalog();
    let plan = join_plan(
        &catalog,
        JoinAlgorithm::SortMerge,
        "SELECT * FROM lhs JOIN rhs ON lhs.id = rhs.lhs_id",
    );
    let result = Executor::new(&catalog).execute(&plan).unwrap();

    assert_eq!(result.len(), 4);
    let left_keys: Vec<_> = result.rows.iter().map(|r| r.int(0).unwrap()).collect();
    assert_eq!(left_keys, vec![1, 2, 2, 3]);
}

#[test]
fn filter_is_idempotent() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);

    let mut once = PlanNode::new(PlanKind::Filter {
        condition: "(age > 25)".into(),
    });
    once.children.push(scan_node("users"));

    let mut twice = PlanNode::new(PlanKind::Filter {
        condition: "(age > 25)".into(),
    });
    twice.children.push(once.clone());

    assert_eq!(
        executor.execute(&once).unwrap(),
        executor.execute(&twice).unwrap()
    );
}

#[test]
fn star_projection_passes_through() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);

    let mut project = PlanNode::new(PlanKind::Project {
        projections: vec!["*".into()],
    });
    project.children.push(scan_node("users"));

    assert_eq!(
        executor.execute(&project).unwrap(),
        executor.execute(&scan_node("users")).unwrap()
    );
}

#[test]
fn unresolved_projections_are_dropped() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);

    let mut project = PlanNode::new(PlanKind::Project {
        projections: vec!["name".into(), "ghost".into()],
    });
    project.children.push(scan_node("users"));

    let result = executor.execute(&project).unwrap();
    assert_eq!(result.schema.column_count(), 1);
    assert_eq!(result.schema.columns[0].name, "name");
    assert_eq!(result.len(), 1000);
}

#[test]
fn projection_with_no_surviving_columns_fails() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);

    let mut project = PlanNode::new(PlanKind::Project {
        projections: vec!["ghost".into()],
    });
    project.children.push(scan_node("users"));

    assert!(matches!(
        executor.execute(&project),
        Err(QueryError::SchemaMismatch(_))
    ));
}

// ---------------------------------------------------------------------------
// Error policy
// ---------------------------------------------------------------------------

#[test]
fn missing_table_is_fatal() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);
    assert!(matches!(
        executor.execute(&scan_node("missing")),
        Err(QueryError::TableNotFound(_))
    ));
}

#[test]
fn structurally_broken_plans_are_fatal() {
    let catalog = sample_catalog();
    let executor = Executor::new(&catalog);

    let filter = PlanNode::new(PlanKind::Filter {
        condition: "(age > 25)".into(),
    });
    assert!(matches!(
        executor.execute(&filter),
        Err(QueryError::InvalidPlan(_))
    ));

    let mut join = PlanNode::new(PlanKind::HashJoin {
        join_type: quarry_core::plan::JoinType::Inner,
        condition: "(a = b)".into(),
    });
    join.children.push(scan_node("users"));
    assert!(matches!(
        executor.execute(&join),
        Err(QueryError::InvalidPlan(_))
    ));
}

#[test]
fn rows_with_bad_filter_columns_are_dropped_not_fatal() {
    let mut catalog = Catalog::new();
    catalog.create_table(
        "people",
        Schema::new(vec![
            Column::qualified("people", "id", ColumnType::Int),
            Column::qualified("people", "age", ColumnType::Int),
        ]),
    );
    catalog
        .populate(
            "people",
            vec![
                Row::new(vec![Value::Int(1), Value::Int(40)]),
                // age is text in this row
                Row::new(vec![Value::Int(2), Value::Str("forty".into())]),
                // age is missing entirely in this row
                Row::new(vec![Value::Int(3)]),
                Row::new(vec![Value::Int(4), Value::Int(20)]),
            ],
        )
        .unwrap();

    let executor = Executor::new(&catalog);
    let mut filter = PlanNode::new(PlanKind::Filter {
        condition: "(age > 25)".into(),
    });
    filter.children.push(scan_node("people"));

    let result = executor.execute(&filter).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0].int(0), Some(1));
}

#[test]
fn rows_with_bad_join_keys_are_skipped() {
    let mut catalog = Catalog::new();
    catalog.create_table(
        "l",
        Schema::new(vec![Column::qualified("l", "id", ColumnType::Int)]),
    );
    catalog
        .populate(
            "l",
            vec![
                Row::new(vec![Value::Int(1)]),
                Row::new(vec![Value::Str("oops".into())]),
            ],
        )
        .unwrap();
    catalog.create_table(
        "r",
        Schema::new(vec![
            Column::qualified("r", "rid", ColumnType::Int),
            Column::qualified("r", "l_id", ColumnType::Int),
        ]),
    );
    catalog
        .populate(
            "r",
            vec![
                Row::new(vec![Value::Int(10), Value::Int(1)]),
                Row::new(vec![Value::Int(11), Value::Str("oops".into())]),
            ],
        )
        .unwrap();

    let executor = Executor::new(&catalog);
    let plan = join_plan(
        &catalog,
        JoinAlgorithm::Hash,
        "SELECT * FROM l JOIN r ON l.id = r.l_id",
    );
    let result = executor.execute(&plan).unwrap();
    assert_eq!(result.len(), 1);

    let plan = join_plan(
        &catalog,
        JoinAlgorithm::SortMerge,
        "SELECT * FROM l JOIN r ON l.id = r.l_id",
    );
    let result = executor.execute(&plan).unwrap();
    assert_eq!(result.len(), 1);
}
