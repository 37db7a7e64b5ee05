/// Default bound on nested user-defined function calls before evaluation is
/// abandoned.
pub const MAX_EVAL_DEPTH: usize = 2048;

/// How long a `lambda`-generated function stays registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LambdaLifetime {
    /// The generated entry is removed when it is first invoked, so the
    /// returned name can be applied once. A second application reads the list
    /// back as plain data.
    #[default]
    OneShot,
    /// The generated entry stays in the user table for the life of the
    /// environment, like a `define`.
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_eval_depth: usize,
    pub lambda_lifetime: LambdaLifetime,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_eval_depth: MAX_EVAL_DEPTH,
            lambda_lifetime: LambdaLifetime::default(),
        }
    }
}

impl Config {
    pub fn with_max_eval_depth(mut self, max_eval_depth: usize) -> Self {
        self.max_eval_depth = max_eval_depth;
        self
    }

    pub fn with_lambda_lifetime(mut self, lambda_lifetime: LambdaLifetime) -> Self {
        self.lambda_lifetime = lambda_lifetime;
        self
    }
}
