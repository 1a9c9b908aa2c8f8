//! Materialized query results.

use quarry_core::catalog::{Row, Schema};
use serde::Serialize;
use std::fmt::Write as _;

/// An ordered set of rows with the schema they align to.
///
/// Rows are copied by value on entry; dropping the result set releases
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render up to `limit` rows as a tab-separated table with a header.
    pub fn display(&self, limit: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Result ({} rows):", self.rows.len());

        let header: Vec<&str> = self
            .schema
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        let _ = writeln!(out, "{}", header.join("\t"));

        for row in self.rows.iter().take(limit) {
            let cells: Vec<String> = self
                .schema
                .columns
                .iter()
                .enumerate()
                .map(|(i, _)| match row.values.get(i) {
                    Some(value) => value.to_string(),
                    None => "NULL".to_string(),
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("\t"));
        }

        if self.rows.len() > limit {
            let _ = writeln!(out, "... ({} more rows)", self.rows.len() - limit);
        }
        out
    }
}
