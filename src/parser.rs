use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::types::Value;
use std::iter::Peekable;
use std::vec::IntoIter;
use thiserror::Error;

/// Maximum list nesting accepted by the reader.
pub const MAX_PARSE_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse Error [at {span}]: unexpected ')'")]
    UnexpectedCloseParen { span: Span },
    #[error("Parse Error [at {span}]: unexpected end of input, expected ')'")]
    UnexpectedEof { span: Span },
    #[error("Parse Error [at {span}]: unexpected input after a complete expression")]
    TrailingInput { span: Span },
    #[error("Parse Error [at {span}]: lists nested deeper than {limit}")]
    TooDeeplyNested { span: Span, limit: usize },
    #[error("Lexer Error during parse: {0}")]
    Lexer(#[from] LexerError),
}

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    // End offset of the last consumed token, reported on premature end of input.
    last_end: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
            last_end: 0,
            depth: 0,
            max_depth: MAX_PARSE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.next();
        if let Some(token) = &token {
            self.last_end = token.span.end;
        }
        token
    }

    /// Parses a single expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Value> {
        let token = self.next_token();
        self.parse_expr_with_token(token)
    }

    fn parse_expr_with_token(&mut self, token: Option<Token>) -> ParseResult<Value> {
        match token {
            Some(Token {
                kind: TokenKind::LParen,
                span,
            }) => self.parse_list(span),
            Some(Token {
                kind: TokenKind::RParen,
                span,
            }) => Err(ParseError::UnexpectedCloseParen { span }),
            Some(Token {
                kind: TokenKind::Text(text),
                ..
            }) => Ok(Value::Atom(text)),
            None => Err(ParseError::UnexpectedEof {
                span: Span::at(self.last_end),
            }),
        }
    }

    /// Parses the elements of a list whose `(` has already been consumed.
    fn parse_list(&mut self, open_span: Span) -> ParseResult<Value> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeeplyNested {
                span: open_span,
                limit: self.max_depth,
            });
        }
        self.depth += 1;

        let mut items = Vec::new();
        loop {
            match self.next_token() {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => break,
                Some(token) => items.push(self.parse_expr_with_token(Some(token))?),
                None => {
                    return Err(ParseError::UnexpectedEof {
                        span: Span::at(self.last_end),
                    });
                }
            }
        }

        self.depth -= 1;
        Ok(Value::List(items))
    }

    /// Parses exactly one top-level expression. An empty token stream reads
    /// as the empty list.
    pub fn parse(mut self) -> ParseResult<Value> {
        if self.tokens.peek().is_none() {
            return Ok(Value::nil());
        }
        let expr = self.parse_expr()?;

        if let Some(found) = self.next_token() {
            Err(ParseError::TrailingInput { span: found.span })
        } else {
            Ok(expr)
        }
    }

    /// Parses every top-level expression until the tokens run out.
    pub fn parse_all(mut self) -> ParseResult<Vec<Value>> {
        let mut expressions = Vec::new();
        while self.tokens.peek().is_some() {
            expressions.push(self.parse_expr()?);
        }
        Ok(expressions)
    }
}

/// Reads one expression from source text.
pub fn read(input: &str) -> ParseResult<Value> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Reads a whole program: any number of top-level expressions.
pub fn read_all(input: &str) -> ParseResult<Vec<Value>> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse_all()
}
