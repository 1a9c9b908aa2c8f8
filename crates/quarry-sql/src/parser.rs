//! Recursive-descent parser for the SELECT subset.
//!
//! Operator precedence, loosest first: OR, AND, comparisons, primaries.
//! Comparisons associate left; parentheses group freely.

use crate::token::{Token, TokenKind, Tokenizer};
use quarry_core::ast::{
    BinaryOperator, Expression, JoinClause, JoinKind, SelectItem, SelectStatement, TableReference,
};
use quarry_core::error::QueryError;

/// Errors reported while parsing SQL text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The parser found a token it cannot use here.
    #[error("expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },
    /// Input ended while a clause was still incomplete.
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        QueryError::Parse(err.to_string())
    }
}

/// Parse one SELECT statement from SQL text.
pub fn parse_select(sql: &str) -> Result<SelectStatement, ParseError> {
    Parser::new(Tokenizer::new(sql).tokenize()).parse_select_statement()
}

/// Token-stream parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The tokenizer terminates its output with Eof; enforce that for
        // token streams built by hand.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let position = tokens.last().map(|t| t.position + t.text.len()).unwrap_or(0);
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                position,
            });
        }
        Self { tokens, pos: 0 }
    }

    pub fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect(TokenKind::Select, "SELECT")?;

        let mut select_list = vec![self.select_item()?];
        while self.eat(TokenKind::Comma) {
            select_list.push(self.select_item()?);
        }

        self.expect(TokenKind::From, "FROM")?;
        let from_table = self.table_reference()?;

        let mut joins = Vec::new();
        while matches!(
            self.peek().kind,
            TokenKind::Join | TokenKind::Inner | TokenKind::Left | TokenKind::Right
        ) {
            joins.push(self.join_clause()?);
        }

        let where_clause = if self.eat(TokenKind::Where) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(SelectStatement {
            select_list,
            from_table,
            joins,
            where_clause,
        })
    }

    fn select_item(&mut self) -> Result<SelectItem, ParseError> {
        if self.eat(TokenKind::Asterisk) {
            return Ok(SelectItem::new(Expression::column("*")));
        }
        Ok(SelectItem::new(self.expression()?))
    }

    fn table_reference(&mut self) -> Result<TableReference, ParseError> {
        let name = self.expect(TokenKind::Identifier, "a table name")?.text;
        // A bare identifier after the table name is an alias.
        if self.peek().kind == TokenKind::Identifier {
            let alias = self.advance().text;
            return Ok(TableReference::aliased(name, alias));
        }
        Ok(TableReference::new(name))
    }

    fn join_clause(&mut self) -> Result<JoinClause, ParseError> {
        let join_type = if self.eat(TokenKind::Left) {
            JoinKind::Left
        } else if self.eat(TokenKind::Right) {
            JoinKind::Right
        } else {
            self.eat(TokenKind::Inner);
            JoinKind::Inner
        };
        self.expect(TokenKind::Join, "JOIN")?;
        let table = self.table_reference()?;
        self.expect(TokenKind::On, "ON")?;
        let condition = self.expression()?;
        Ok(JoinClause {
            join_type,
            table,
            condition,
        })
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        self.or_expression()
    }

    fn or_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.and_expression()?;
        while self.eat(TokenKind::Or) {
            let right = self.and_expression()?;
            expr = Expression::binary(BinaryOperator::Or, expr, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.comparison()?;
        while self.eat(TokenKind::And) {
            let right = self.comparison()?;
            expr = Expression::binary(BinaryOperator::And, expr, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.primary()?;
        while let Some(op) = comparison_operator(self.peek().kind) {
            self.advance();
            let right = self.primary()?;
            expr = Expression::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        if self.eat(TokenKind::LeftParen) {
            let expr = self.expression()?;
            self.expect(TokenKind::RightParen, "')'")?;
            return Ok(expr);
        }
        self.column_or_literal()
    }

    fn column_or_literal(&mut self) -> Result<Expression, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier => {
                let first = self.advance().text;
                if self.eat(TokenKind::Dot) {
                    let column = self
                        .expect(TokenKind::Identifier, "a column name after '.'")?
                        .text;
                    Ok(Expression::qualified(first, column))
                } else {
                    Ok(Expression::column(first))
                }
            }
            TokenKind::Number | TokenKind::StringLiteral => {
                Ok(Expression::literal(self.advance().text))
            }
            _ => Err(self.unexpected("an identifier, number, or string", &token)),
        }
    }

    fn peek(&self) -> &Token {
        // The token stream always ends with Eof, so the clamp only matters
        // if the parser over-advances.
        let index = self.pos.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.peek().clone();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected, &token))
        }
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        if found.kind == TokenKind::Eof {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
                position: found.position,
            }
        }
    }
}

fn comparison_operator(kind: TokenKind) -> Option<BinaryOperator> {
    let op = match kind {
        TokenKind::Equals => BinaryOperator::Eq,
        TokenKind::NotEqual => BinaryOperator::NotEq,
        TokenKind::Greater => BinaryOperator::Gt,
        TokenKind::GreaterEqual => BinaryOperator::GtEq,
        TokenKind::Less => BinaryOperator::Lt,
        TokenKind::LessEqual => BinaryOperator::LtEq,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::builder::render_expr;

    #[test]
    fn parses_simple_select() {
        let stmt = parse_select("SELECT name, age FROM users").unwrap();
        assert_eq!(stmt.select_list.len(), 2);
        assert_eq!(stmt.from_table.table_name, "users");
        assert!(stmt.joins.is_empty());
        assert!(stmt.where_clause.is_none());
    }

    #[test]
    fn parses_where_clause_to_canonical_text() {
        let stmt = parse_select("SELECT name FROM users WHERE age > 25").unwrap();
        let rendered = render_expr(stmt.where_clause.as_ref().unwrap());
        assert_eq!(rendered, "(age > 25)");
    }

    #[test]
    fn parses_join_with_qualified_condition() {
        let stmt =
            parse_select("SELECT * FROM users JOIN orders ON users.id = orders.user_id").unwrap();
        assert_eq!(stmt.joins.len(), 1);
        let join = &stmt.joins[0];
        assert_eq!(join.join_type, JoinKind::Inner);
        assert_eq!(join.table.table_name, "orders");
        assert_eq!(render_expr(&join.condition), "(users.id = orders.user_id)");
    }

    #[test]
    fn parses_outer_join_kinds() {
        let stmt =
            parse_select("SELECT * FROM users LEFT JOIN orders ON users.id = orders.user_id")
                .unwrap();
        assert_eq!(stmt.joins[0].join_type, JoinKind::Left);

        let stmt =
            parse_select("SELECT * FROM users RIGHT JOIN orders ON users.id = orders.user_id")
                .unwrap();
        assert_eq!(stmt.joins[0].join_type, JoinKind::Right);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let stmt =
            parse_select("SELECT * FROM users WHERE age > 25 AND age < 30 OR id = 1").unwrap();
        let rendered = render_expr(stmt.where_clause.as_ref().unwrap());
        assert_eq!(rendered, "(((age > 25) AND (age < 30)) OR (id = 1))");
    }

    #[test]
    fn parses_table_alias() {
        let stmt = parse_select("SELECT u.name FROM users u").unwrap();
        assert_eq!(stmt.from_table.alias.as_deref(), Some("u"));
    }

    #[test]
    fn rejects_missing_from() {
        let err = parse_select("SELECT name users").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn rejects_truncated_join() {
        let err = parse_select("SELECT * FROM users JOIN orders ON").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                expected: "an identifier, number, or string".into()
            }
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_select("").is_err());
    }
}
