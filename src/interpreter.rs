use crate::config::Config;
use crate::environment::Environment;
use crate::evaluator::{EvalError, Locals, evaluate};
use crate::parser::{ParseError, read, read_all};
use crate::types::Value;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// An independent interpreter instance owning its own user-definition table.
#[derive(Debug, Default)]
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::default()
    }

    pub fn with_config(config: Config) -> Self {
        Interpreter {
            env: Environment::with_config(config),
        }
    }

    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.env = self.env.with_output(output);
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn eval(&mut self, value: &Value) -> Result<Value> {
        Ok(evaluate(value, &mut self.env, None)?)
    }

    /// Evaluates `value` with `names[i]` bound to `values[i]`.
    pub fn eval_with_locals(
        &mut self,
        value: &Value,
        names: &[Value],
        values: &[Value],
    ) -> Result<Value> {
        Ok(evaluate(value, &mut self.env, Some(Locals::new(names, values)))?)
    }

    /// Reads and evaluates a single expression.
    pub fn eval_str(&mut self, input: &str) -> Result<Value> {
        let value = read(input)?;
        self.eval(&value)
    }

    /// Reads a whole program and evaluates its expressions in order,
    /// returning every result. Stops at the first error.
    pub fn eval_all_str(&mut self, input: &str) -> Result<Vec<Value>> {
        read_all(input)?
            .iter()
            .map(|value| self.eval(value))
            .collect()
    }
}
