use logos::Logos;
use thiserror::Error;

use crate::Span;

/// Token kinds of the source notation. Only the space character separates
/// tokens; tabs, newlines and quotation marks are ordinary text characters.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r" +")]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[^ ()]+", |lex| lex.slice().to_string())]
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid token at {span}")]
pub struct LexerError {
    pub span: Span,
}

type LexerResult<T> = Result<T, LexerError>;

pub fn tokenize(input: &str) -> LexerResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| {
            let span = Span::new(range.start, range.end);
            match result {
                Ok(kind) => Ok(Token { kind, span }),
                Err(()) => Err(LexerError { span }),
            }
        })
        .collect()
}
