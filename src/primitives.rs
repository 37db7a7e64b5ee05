use crate::environment::Environment;
use crate::evaluator::{EvalResult, Frame, eval_in};
use crate::types::Value;
use log::trace;
use std::io::Write;

// Binds exactly `$n` arguments (operator name excluded) or degrades to nil.
macro_rules! expect_args {
    ($form:expr, $n:literal, $name:expr) => {{
        let args = $form.get(1..).unwrap_or(&[]);
        match <&[Value; $n]>::try_from(args) {
            Ok(args) => args,
            Err(_) => {
                trace!(
                    "'{}' expects {} argument(s), got {}; returning nil",
                    $name,
                    $n,
                    args.len()
                );
                return Ok(Value::nil());
            }
        }
    }};
}

fn rest(form: &[Value]) -> &[Value] {
    form.get(1..).unwrap_or(&[])
}

pub fn prim_quote(form: &[Value], _env: &mut Environment, _frame: Frame<'_>) -> EvalResult {
    let [arg] = expect_args!(form, 1, "quote");
    Ok(arg.clone())
}

pub fn prim_car(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [arg] = expect_args!(form, 1, "car");
    match eval_in(arg, env, frame)? {
        Value::List(mut items) if !items.is_empty() => Ok(items.swap_remove(0)),
        _ => Ok(Value::nil()),
    }
}

pub fn prim_cdr(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [arg] = expect_args!(form, 1, "cdr");
    match eval_in(arg, env, frame)? {
        Value::List(mut items) if items.len() >= 2 => {
            items.remove(0);
            Ok(Value::List(items))
        }
        _ => Ok(Value::nil()),
    }
}

pub fn prim_cons(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [head, tail] = expect_args!(form, 2, "cons");
    match (eval_in(head, env, frame)?, tail) {
        (head @ Value::Atom(_), Value::List(items)) => {
            let mut consed = Vec::with_capacity(items.len() + 1);
            consed.push(head);
            consed.extend(items.iter().cloned());
            Ok(Value::List(consed))
        }
        _ => Ok(Value::nil()),
    }
}

pub fn prim_equal(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [left, right] = expect_args!(form, 2, "equal");
    let left = eval_in(left, env, frame)?;
    let right = eval_in(right, env, frame)?;
    Ok(Value::from_bool(left == right))
}

pub fn prim_atom(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [arg] = expect_args!(form, 1, "atom");
    Ok(Value::from_bool(eval_in(arg, env, frame)?.is_atom()))
}

/// `(cond (test consequent) ...)`: evaluates tests in order and returns the
/// evaluated consequent of the first test that is not nil.
pub fn prim_cond(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let clauses = rest(form);
    let mut pairs = Vec::with_capacity(clauses.len());
    for clause in clauses {
        match clause.as_list() {
            Some([test, consequent]) => pairs.push((test, consequent)),
            _ => {
                trace!("'cond' clause {} is not a (test consequent) pair", clause);
                return Ok(Value::nil());
            }
        }
    }

    for (test, consequent) in pairs {
        if !eval_in(test, env, frame)?.is_nil() {
            return eval_in(consequent, env, frame);
        }
    }
    Ok(Value::nil())
}

pub fn prim_lambda(form: &[Value], env: &mut Environment, _frame: Frame<'_>) -> EvalResult {
    let [params, body] = expect_args!(form, 2, "lambda");
    match params {
        Value::List(params) => Ok(Value::Atom(
            env.register_lambda(params.clone(), body.clone()),
        )),
        Value::Atom(_) => Ok(Value::nil()),
    }
}

pub fn prim_define(form: &[Value], env: &mut Environment, _frame: Frame<'_>) -> EvalResult {
    let [name, params, body] = expect_args!(form, 3, "define");
    if let (Value::Atom(name), Value::List(params)) = (name, params) {
        env.define(name, params.clone(), body.clone());
    }
    Ok(Value::nil())
}

/// Keeps atom arguments and splices list arguments one level deep.
pub fn prim_list(form: &[Value], _env: &mut Environment, _frame: Frame<'_>) -> EvalResult {
    let mut flattened = Vec::new();
    for arg in rest(form) {
        match arg {
            Value::Atom(_) => flattened.push(arg.clone()),
            Value::List(items) => flattened.extend(items.iter().cloned()),
        }
    }
    Ok(Value::List(flattened))
}

pub fn prim_println(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [arg] = expect_args!(form, 1, "println");
    let value = eval_in(arg, env, frame)?;
    let output = env.output();
    writeln!(output, "{}", value)?;
    output.flush()?;
    Ok(Value::nil())
}

pub fn prim_eval(form: &[Value], env: &mut Environment, frame: Frame<'_>) -> EvalResult {
    let [arg] = expect_args!(form, 1, "eval");
    eval_in(arg, env, frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::parser::read;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn a(s: &str) -> Value {
        Value::atom(s)
    }

    fn l(items: Vec<Value>) -> Value {
        Value::list(items)
    }

    fn eval_str(input: &str, env: &mut Environment) -> Value {
        let value = read(input).unwrap_or_else(|e| panic!("Parsing failed for '{}': {}", input, e));
        evaluate(&value, env, None)
            .unwrap_or_else(|e| panic!("Evaluation failed for '{}': {}", input, e))
    }

    fn assert_eval(input: &str, expected: Value) {
        let mut env = Environment::new();
        assert_eq!(eval_str(input, &mut env), expected, "Input: '{}'", input);
    }

    #[test]
    fn test_quote() {
        assert_eval("(quote A)", a("A"));
        assert_eval("(quote (quote X))", l(vec![a("quote"), a("X")]));
        assert_eval("(quote A B)", Value::nil());
    }

    #[test]
    fn test_car_cdr() {
        assert_eval("(car (quote (1 2 3)))", a("1"));
        assert_eval("(cdr (quote (1 2 3)))", l(vec![a("2"), a("3")]));
        assert_eval("(car (cdr (quote (1 2 3))))", a("2"));
        assert_eval("(car (quote ()))", Value::nil());
        assert_eval("(car A)", Value::nil());
        assert_eval("(cdr (quote (1)))", Value::nil());
        assert_eval("(cdr A)", Value::nil());
        assert_eval("(car)", Value::nil());
    }

    #[test]
    fn test_car_reevaluates_its_argument() {
        // `(quote (quote X))` yields `(quote X)`, which car evaluates once more.
        assert_eval("(car (quote (quote X)))", Value::nil());
    }

    #[test]
    fn test_cons() {
        assert_eval("(cons A (quote (B C)))", l(vec![a("A"), a("B"), a("C")]));
        assert_eval("(cons A ())", l(vec![a("A")]));
        assert_eval("(cons (quote (A)) (quote (B)))", Value::nil());
        assert_eval("(cons A B)", Value::nil());
        assert_eval("(cons A)", Value::nil());
    }

    #[test]
    fn test_cons_car_cdr_roundtrip() {
        assert_eval("(car (cons X (quote (A B))))", a("X"));
        assert_eval("(cdr (cons X (quote (A B))))", l(vec![a("A"), a("B")]));
    }

    #[test]
    fn test_equal() {
        assert_eval("(equal A A)", a("true"));
        assert_eval("(equal A B)", Value::nil());
        assert_eval("(equal A ())", Value::nil());
        assert_eval("(equal (quote (A (B))) (quote (A (B))))", a("true"));
        assert_eval("(equal (quote (A B)) (quote (B A)))", Value::nil());
        assert_eval("(equal () ())", a("true"));
        assert_eval("(equal A)", Value::nil());
    }

    #[test]
    fn test_atom() {
        assert_eval("(atom A)", a("true"));
        assert_eval("(atom (quote (A B)))", Value::nil());
        assert_eval("(atom ())", Value::nil());
    }

    #[test]
    fn test_cond() {
        assert_eval(
            "(cond ((atom (quote A)) (quote B)) ((quote true) (quote C)))",
            a("B"),
        );
        assert_eval(
            "(cond ((atom (quote (A))) (quote B)) ((quote true) (quote C)))",
            a("C"),
        );
        assert_eval("(cond (() A))", Value::nil());
        assert_eval("(cond ((quote true) A) B)", Value::nil());
        assert_eval("(cond ((quote true) A B))", Value::nil());
    }

    #[test]
    fn test_cond_only_evaluates_first_matching_consequent() {
        let buffer = SharedBuffer::default();
        let mut env = Environment::new().with_output(Box::new(buffer.clone()));
        let result = eval_str(
            "(cond (() (println skipped)) ((println test) (println first)) ((quote true) (println second)))",
            &mut env,
        );
        // println returns nil, so the second clause's test fails and its
        // consequent is skipped.
        assert_eq!(result, Value::nil());
        assert_eq!(buffer.contents(), "test\nsecond\n");

        let buffer = SharedBuffer::default();
        let mut env = Environment::new().with_output(Box::new(buffer.clone()));
        eval_str(
            "(cond ((quote true) (println first)) ((quote true) (println second)))",
            &mut env,
        );
        assert_eq!(buffer.contents(), "first\n");
    }

    #[test]
    fn test_malformed_cond_runs_no_clause() {
        let buffer = SharedBuffer::default();
        let mut env = Environment::new().with_output(Box::new(buffer.clone()));
        let result = eval_str(
            "(cond ((quote true) (println first)) ((println test) B) C)",
            &mut env,
        );
        assert_eq!(result, Value::nil());
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_define_binds_positionally() {
        let mut env = Environment::new();
        assert_eq!(eval_str("(define f (x y) (atom x))", &mut env), Value::nil());
        assert_eq!(eval_str("(f A B)", &mut env), a("true"));
        assert_eq!(eval_str("(f (quote (1)) B)", &mut env), Value::nil());
    }

    #[test]
    fn test_define_malformed_is_ignored() {
        let mut env = Environment::new();
        assert_eq!(eval_str("(define f x (atom x))", &mut env), Value::nil());
        assert_eq!(eval_str("(define (f) (x) x)", &mut env), Value::nil());
        assert_eq!(eval_str("(f A)", &mut env), l(vec![a("f"), a("A")]));
    }

    #[test]
    fn test_lambda_is_single_use() {
        let mut env = Environment::new();
        let name = eval_str("(lambda (x) (atom x))", &mut env);
        let Value::Atom(text) = &name else {
            panic!("lambda should return an atom, got {}", name);
        };

        let call = l(vec![name.clone(), a("A")]);
        assert_eq!(evaluate(&call, &mut env, None).unwrap(), a("true"));
        assert!(!env.is_defined(text));
        assert_eq!(evaluate(&call, &mut env, None).unwrap(), call);
    }

    #[test]
    fn test_lambda_applied_inline() {
        assert_eval("((lambda (x y) (cons x y)) A (quote (B)))", l(vec![a("A"), a("B")]));
        assert_eval("(lambda x x)", Value::nil());
    }

    #[test]
    fn test_persistent_lambda() {
        use crate::config::{Config, LambdaLifetime};
        let mut env = Environment::with_config(
            Config::default().with_lambda_lifetime(LambdaLifetime::Persistent),
        );
        let name = eval_str("(lambda (x) (atom x))", &mut env);
        let call = l(vec![name, a("A")]);
        assert_eq!(evaluate(&call, &mut env, None).unwrap(), a("true"));
        assert_eq!(evaluate(&call, &mut env, None).unwrap(), a("true"));
    }

    #[test]
    fn test_list() {
        assert_eval(
            "(list (quote A) (quote (B C)))",
            l(vec![a("A"), a("B"), a("C")]),
        );
        assert_eval(
            "(list A (quote ((B) C)) D)",
            l(vec![a("A"), l(vec![a("B")]), a("C"), a("D")]),
        );
        assert_eval("(list)", Value::nil());
    }

    #[test]
    fn test_println() {
        let buffer = SharedBuffer::default();
        let mut env = Environment::new().with_output(Box::new(buffer.clone()));
        assert_eq!(eval_str("(println (quote (A (B))))", &mut env), Value::nil());
        assert_eq!(eval_str("(println X)", &mut env), Value::nil());
        assert_eq!(eval_str("(println X Y)", &mut env), Value::nil());
        assert_eq!(buffer.contents(), "(A (B))\nX\n");
    }

    #[test]
    fn test_eval() {
        assert_eval("(eval (quote (car (quote (A B)))))", a("A"));
        assert_eval("(eval A)", a("A"));
        assert_eval("(eval)", Value::nil());
    }
}
