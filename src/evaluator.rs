use crate::environment::{Environment, Procedure};
use crate::types::Value;
use log::trace;
use std::borrow::Cow;
use std::io;
use thiserror::Error;

/// Operators that receive their arguments unevaluated.
pub const SPECIAL_FORMS: [&str; 4] = ["quote", "cond", "define", "lambda"];

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Evaluation Error: more than {limit} nested function calls")]
    DepthExceeded { limit: usize },
    #[error("Evaluation Error: could not write output: {0}")]
    Output(#[from] io::Error),
}

pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Positional variable bindings: an atom equal to `names[i]` evaluates to
/// `values[i]`. Only the bindings passed by the immediate caller are visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locals<'a> {
    names: &'a [Value],
    values: &'a [Value],
}

impl<'a> Locals<'a> {
    pub fn new(names: &'a [Value], values: &'a [Value]) -> Self {
        Locals { names, values }
    }

    /// The value bound to the first name equal to `atom`, if a value sits at
    /// that position.
    pub fn resolve(&self, atom: &Value) -> Option<&'a Value> {
        let position = self.names.iter().position(|name| name == atom)?;
        self.values.get(position)
    }
}

/// Per-call evaluation state threaded through every recursive call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame<'a> {
    pub locals: Option<Locals<'a>>,
    /// User-defined functions currently being applied.
    pub depth: usize,
}

impl<'a> Frame<'a> {
    pub fn new(locals: Option<Locals<'a>>) -> Self {
        Frame { locals, depth: 0 }
    }
}

/// Evaluates `value` against `env`, substituting `locals` for matching atoms.
pub fn evaluate(value: &Value, env: &mut Environment, locals: Option<Locals<'_>>) -> EvalResult {
    eval_in(value, env, Frame::new(locals))
}

pub fn eval_in(value: &Value, env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    match value {
        // Atoms are self-quoting unless bound by the current locals.
        Value::Atom(_) => Ok(frame
            .locals
            .and_then(|locals| locals.resolve(value))
            .unwrap_or(value)
            .clone()),

        Value::List(items) => {
            let form: Cow<'_, [Value]> = if is_suspended(items) {
                Cow::Borrowed(items.as_slice())
            } else {
                Cow::Owned(
                    items
                        .iter()
                        .map(|item| eval_in(item, env, frame))
                        .collect::<EvalResult<Vec<_>>>()?,
                )
            };

            let procedure = form
                .first()
                .and_then(Value::as_atom)
                .and_then(|name| env.lookup(name));
            match procedure {
                Some(procedure) => apply(&procedure, &form, env, frame),
                // Unknown operators leave the list as data.
                None => Ok(Value::List(form.into_owned())),
            }
        }
    }
}

fn is_suspended(items: &[Value]) -> bool {
    items.len() > 1
        && items[0]
            .as_atom()
            .is_some_and(|name| SPECIAL_FORMS.contains(&name))
}

/// Invokes `procedure` with the whole invocation list `form`, operator
/// name included.
pub fn apply(
    procedure: &Procedure,
    form: &[Value],
    env: &mut Environment,
    frame: Frame<'_>,
) -> EvalResult {
    match procedure {
        Procedure::Primitive(func, name) => {
            trace!("apply {} to {}", name, Value::List(form.get(1..).unwrap_or(&[]).to_vec()));
            func(form, env, frame)
        }
        Procedure::UserDefined(closure) => {
            let limit = env.config().max_eval_depth;
            if frame.depth >= limit {
                return Err(EvalError::DepthExceeded { limit });
            }
            let args = form.get(1..).unwrap_or(&[]);
            trace!("apply {} to {} argument(s)", closure.name, args.len());
            if closure.one_shot {
                env.retire(&closure.name);
            }
            let locals = Locals::new(&closure.params, args);
            eval_in(
                &closure.body,
                env,
                Frame {
                    locals: Some(locals),
                    depth: frame.depth + 1,
                },
            )
        }
    }
}
