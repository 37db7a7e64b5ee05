use crate::config::{Config, LambdaLifetime};
use crate::evaluator::{EvalResult, Frame};
use crate::primitives;
use crate::types::Value;
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

pub type PrimitiveFunc = fn(&[Value], &mut Environment, Frame<'_>) -> EvalResult;

/// A function registered at runtime by `define` or `lambda`.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub name: String,
    pub params: Vec<Value>,
    pub body: Value,
    /// Retired from the user table on first invocation.
    pub one_shot: bool,
}

#[derive(Clone)]
pub enum Procedure {
    Primitive(PrimitiveFunc, &'static str), // The function pointer and its name (for display/debug)
    UserDefined(Rc<Closure>),
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Primitive(_, name) => write!(f, "Primitive({})", name),
            Procedure::UserDefined(closure) => write!(f, "UserDefined({})", closure.name),
        }
    }
}

/// The two named-function tables an evaluation runs against.
///
/// The builtin table is filled once at construction and never changes. The
/// user table is written by `define` and `lambda` and is consulted first, so
/// user definitions shadow builtins of the same name.
pub struct Environment {
    builtins: IndexMap<String, Procedure>,
    user: IndexMap<String, Procedure>,
    config: Config,
    output: Box<dyn Write>,
    next_lambda_id: u64,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("builtins", &self.builtins.keys().collect::<Vec<_>>())
            .field("user", &self.user.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// Creates an environment holding every builtin operator and an empty
    /// user table, writing `println` output to stdout.
    pub fn new() -> Self {
        Environment::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut env = Environment {
            builtins: IndexMap::new(),
            user: IndexMap::new(),
            config,
            output: Box::new(io::stdout()),
            next_lambda_id: 0,
        };
        env.add_primitive("quote", primitives::prim_quote);
        env.add_primitive("car", primitives::prim_car);
        env.add_primitive("cdr", primitives::prim_cdr);
        env.add_primitive("cons", primitives::prim_cons);
        env.add_primitive("equal", primitives::prim_equal);
        env.add_primitive("atom", primitives::prim_atom);
        env.add_primitive("cond", primitives::prim_cond);
        env.add_primitive("lambda", primitives::prim_lambda);
        env.add_primitive("define", primitives::prim_define);
        env.add_primitive("list", primitives::prim_list);
        env.add_primitive("println", primitives::prim_println);
        env.add_primitive("eval", primitives::prim_eval);
        env
    }

    /// Redirects `println` output, e.g. into a buffer when embedding.
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    fn add_primitive(&mut self, name: &'static str, func: PrimitiveFunc) {
        self.builtins
            .insert(name.to_string(), Procedure::Primitive(func, name));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// Looks up a callable by name, user definitions first.
    pub fn lookup(&self, name: &str) -> Option<Procedure> {
        self.user
            .get(name)
            .or_else(|| self.builtins.get(name))
            .cloned()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.user.contains_key(name) || self.builtins.contains_key(name)
    }

    /// Registers (or replaces) a permanent user function.
    pub fn define(&mut self, name: &str, params: Vec<Value>, body: Value) {
        debug!("define {} with {} parameter(s)", name, params.len());
        let closure = Closure {
            name: name.to_string(),
            params,
            body,
            one_shot: false,
        };
        self.user
            .insert(name.to_string(), Procedure::UserDefined(Rc::new(closure)));
    }

    /// Registers an anonymous function under a freshly generated name and
    /// returns that name.
    pub fn register_lambda(&mut self, params: Vec<Value>, body: Value) -> String {
        let name = self.fresh_lambda_name();
        let one_shot = self.config.lambda_lifetime == LambdaLifetime::OneShot;
        debug!(
            "lambda {} with {} parameter(s), one_shot={}",
            name,
            params.len(),
            one_shot
        );
        let closure = Closure {
            name: name.clone(),
            params,
            body,
            one_shot,
        };
        self.user
            .insert(name.clone(), Procedure::UserDefined(Rc::new(closure)));
        name
    }

    /// Removes a user entry, returning whether it existed.
    pub fn retire(&mut self, name: &str) -> bool {
        let removed = self.user.shift_remove(name).is_some();
        if removed {
            debug!("retired {}", name);
        }
        removed
    }

    fn fresh_lambda_name(&mut self) -> String {
        loop {
            let name = format!("#<lambda:{}>", self.next_lambda_id);
            self.next_lambda_id += 1;
            if !self.is_defined(&name) {
                return name;
            }
        }
    }

    /// All callable names, builtins first, in registration order.
    pub fn defined_names(&self) -> Vec<String> {
        self.builtins
            .keys()
            .chain(self.user.keys().filter(|k| !self.builtins.contains_key(*k)))
            .cloned()
            .collect()
    }
}
