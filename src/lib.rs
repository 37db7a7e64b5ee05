// Declare modules publicly so they are part of the library interface
pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod primitives;
pub mod source;
pub mod types;

pub use config::{Config, LambdaLifetime};
pub use environment::{Closure, Environment, Procedure};
pub use evaluator::{EvalError, EvalResult, Locals, evaluate};
pub use interpreter::{Error, Interpreter};
pub use lexer::{LexerError, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, read, read_all};
pub use source::Span;
pub use types::Value;
