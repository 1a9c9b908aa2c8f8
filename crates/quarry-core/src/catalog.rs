//! # Tables, Schemas, and the Catalog
//!
//! The catalog is the in-memory store the engine runs against: a mapping
//! from table name to table, plus the per-table statistics the optimizer
//! reads. Tables are created and populated up front; during optimization
//! and execution the catalog is read-only.
//!
//! Rows are schema-aligned by position only -- a row carries no schema of
//! its own, and values are copied into result sets rather than shared.

use crate::error::QueryError;
use crate::stats::TableStatistics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Column value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Text,
}

/// A named, typed column, optionally qualified with its table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub table: Option<String>,
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    /// Unqualified column.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            table: None,
            name: name.into(),
            ty,
        }
    }

    /// Column qualified with a table name.
    pub fn qualified(table: impl Into<String>, name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// An ordered sequence of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column whose unqualified name matches.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Schema of a join output: this schema followed by `other`.
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Schema { columns }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// An ordered sequence of values, positionally aligned with some schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer value at the given position, if present and of integer type.
    pub fn int(&self, index: usize) -> Option<i64> {
        self.values.get(index).and_then(Value::as_int)
    }

    /// This row followed by all values of `other`.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = self.values.clone();
        values.extend(other.values.iter().cloned());
        Row { values }
    }
}

/// A named table: schema plus row data in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// In-memory catalog: tables and their statistics, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, Table>,
    stats: HashMap<String, TableStatistics>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty table under the given name.
    pub fn create_table(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        self.tables.insert(name.clone(), Table::new(name, schema));
    }

    /// Append rows to an existing table.
    pub fn populate(&mut self, name: &str, rows: Vec<Row>) -> Result<(), QueryError> {
        let table = self
            .tables
            .get_mut(name)
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))?;
        table.rows.extend(rows);
        Ok(())
    }

    /// Look up a table by name.
    pub fn lookup(&self, name: &str) -> Result<&Table, QueryError> {
        self.tables
            .get(name)
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))
    }

    /// Record statistics for a table.
    pub fn set_statistics(&mut self, name: impl Into<String>, stats: TableStatistics) {
        self.stats.insert(name.into(), stats);
    }

    /// Statistics for a table, or the defaults when none were recorded.
    pub fn statistics(&self, name: &str) -> TableStatistics {
        self.stats.get(name).cloned().unwrap_or_default()
    }

    /// Seed the demo workload: 1000 `users` and 5000 `orders`, with the
    /// statistics the optimizer tests expect.
    pub fn populate_sample_data(&mut self) {
        let users_schema = Schema::new(vec![
            Column::qualified("users", "id", ColumnType::Int),
            Column::qualified("users", "name", ColumnType::Text),
            Column::qualified("users", "age", ColumnType::Int),
            Column::qualified("users", "city", ColumnType::Text),
        ]);
        let mut users = Table::new("users", users_schema);
        users.rows = (1..=1000)
            .map(|i| {
                Row::new(vec![
                    Value::Int(i),
                    Value::Str(format!("User{i}")),
                    Value::Int(20 + (i % 50)),
                    Value::Str(format!("City{}", (i % 10) + 1)),
                ])
            })
            .collect();
        self.tables.insert(users.name.clone(), users);

        let orders_schema = Schema::new(vec![
            Column::qualified("orders", "id", ColumnType::Int),
            Column::qualified("orders", "user_id", ColumnType::Int),
            Column::qualified("orders", "product", ColumnType::Text),
            Column::qualified("orders", "amount", ColumnType::Int),
        ]);
        let mut orders = Table::new("orders", orders_schema);
        orders.rows = (1..=5000)
            .map(|i| {
                Row::new(vec![
                    Value::Int(i),
                    Value::Int((i % 1000) + 1),
                    Value::Str(format!("Product{}", (i % 100) + 1)),
                    Value::Int(10 + (i % 500)),
                ])
            })
            .collect();
        self.tables.insert(orders.name.clone(), orders);

        self.set_statistics(
            "users",
            TableStatistics::new(1000, 10, 120)
                .with_selectivity("age > 25", 0.88)
                .with_selectivity("age < 30", 0.20)
                .with_distinct("id", 1000)
                .with_distinct("age", 50)
                .with_distinct("city", 10),
        );
        self.set_statistics(
            "orders",
            TableStatistics::new(5000, 50, 80)
                .with_selectivity("amount > 100", 0.30)
                .with_distinct("id", 5000)
                .with_distinct("user_id", 1000)
                .with_distinct("product", 100),
        );
    }
}
