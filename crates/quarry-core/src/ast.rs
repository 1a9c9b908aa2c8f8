//! # Parsed Query Representation
//!
//! The types in this module describe a parsed SELECT statement. They are
//! produced by the SQL front end (or constructed directly by tests) and
//! consumed by the plan builder; the optimizer never mutates them.
//!
//! Expressions form a finite tree of column references, literals, and
//! binary operations. Literals carry their raw source text -- the engine
//! works with rendered condition strings rather than typed constants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators appearing in comparisons and boolean combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        f.write_str(symbol)
    }
}

/// A scalar expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Reference to a column, optionally qualified with a table name.
    Column {
        table: Option<String>,
        column: String,
    },
    /// Constant literal, kept as its raw source text.
    Literal(String),
    /// Binary operation over two sub-expressions.
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Unqualified column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column {
            table: None,
            column: name.into(),
        }
    }

    /// Column reference qualified with a table name.
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::Column {
            table: Some(table.into()),
            column: name.into(),
        }
    }

    /// Literal with the given source text.
    pub fn literal(text: impl Into<String>) -> Self {
        Expression::Literal(text.into())
    }

    /// Binary operation node.
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// One entry of a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            alias: None,
        }
    }
}

/// A table named in FROM or JOIN, with an optional alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    pub table_name: String,
    pub alias: Option<String>,
}

impl TableReference {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            alias: None,
        }
    }

    pub fn aliased(table_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            alias: Some(alias.into()),
        }
    }
}

/// Join variant as written in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

/// A single JOIN clause: the joined table and its ON condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub join_type: JoinKind,
    pub table: TableReference,
    pub condition: Expression,
}

/// A parsed SELECT statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub select_list: Vec<SelectItem>,
    pub from_table: TableReference,
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Expression>,
}
