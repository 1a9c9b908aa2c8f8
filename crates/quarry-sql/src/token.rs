//! SQL tokenizer.
//!
//! Splits query text into positioned tokens. Keywords are matched
//! case-insensitively; identifiers keep their original spelling. The
//! tokenizer itself never fails -- unrecognized characters become
//! [`TokenKind::Unknown`] tokens for the parser to report.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Select,
    From,
    Where,
    Join,
    Inner,
    Left,
    Right,
    On,
    And,
    Or,
    Equals,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Identifier,
    Number,
    StringLiteral,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    Dot,
    Asterisk,
    Unknown,
    Eof,
}

/// A token with its source text and byte position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::Eof {
            f.write_str("end of input")
        } else {
            write!(f, "'{}'", self.text)
        }
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word.to_ascii_uppercase().as_str() {
        "SELECT" => TokenKind::Select,
        "FROM" => TokenKind::From,
        "WHERE" => TokenKind::Where,
        "JOIN" => TokenKind::Join,
        "INNER" => TokenKind::Inner,
        "LEFT" => TokenKind::Left,
        "RIGHT" => TokenKind::Right,
        "ON" => TokenKind::On,
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        _ => return None,
    };
    Some(kind)
}

/// Streaming tokenizer over query text.
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    pub fn new(sql: &str) -> Self {
        Self {
            chars: sql.chars().collect(),
            pos: 0,
        }
    }

    /// Consume the whole input, ending with an [`TokenKind::Eof`] token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, "", self.pos);
        };

        if c == '\'' {
            return self.string_literal();
        }
        if c.is_ascii_digit() {
            return self.number();
        }
        if c.is_alphabetic() || c == '_' {
            return self.identifier_or_keyword();
        }
        self.operator()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn string_literal(&mut self) -> Token {
        let start = self.pos;
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\'' {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        // Consume the closing quote when present; an unterminated literal
        // simply runs to end of input.
        self.advance();
        Token::new(TokenKind::StringLiteral, text, start)
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() && c != '.' {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        Token::new(TokenKind::Number, text, start)
    }

    fn identifier_or_keyword(&mut self) -> Token {
        let start = self.pos;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, start)
    }

    fn operator(&mut self) -> Token {
        let start = self.pos;
        let Some(c) = self.advance() else {
            return Token::new(TokenKind::Eof, "", start);
        };
        match c {
            '=' => Token::new(TokenKind::Equals, "=", start),
            '>' => {
                if self.peek() == Some('=') {
                    self.pos += 1;
                    Token::new(TokenKind::GreaterEqual, ">=", start)
                } else {
                    Token::new(TokenKind::Greater, ">", start)
                }
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.pos += 1;
                    Token::new(TokenKind::LessEqual, "<=", start)
                }
                Some('>') => {
                    self.pos += 1;
                    Token::new(TokenKind::NotEqual, "<>", start)
                }
                _ => Token::new(TokenKind::Less, "<", start),
            },
            ',' => Token::new(TokenKind::Comma, ",", start),
            ';' => Token::new(TokenKind::Semicolon, ";", start),
            '(' => Token::new(TokenKind::LeftParen, "(", start),
            ')' => Token::new(TokenKind::RightParen, ")", start),
            '.' => Token::new(TokenKind::Dot, ".", start),
            '*' => Token::new(TokenKind::Asterisk, "*", start),
            other => Token::new(TokenKind::Unknown, other.to_string(), start),
        }
    }
}
