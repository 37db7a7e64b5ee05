use std::fmt;

pub const TRUE_ATOM: &str = "true";

/// A symbolic expression: the single data type shared by programs and data.
///
/// Equality is structural: atoms compare by text, lists element-wise in order,
/// and an atom never equals a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Atom(String),
    List(Vec<Value>),
}

impl Value {
    pub fn atom(text: impl Into<String>) -> Self {
        Value::Atom(text.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items)
    }

    /// The empty list, standing in for false and nil.
    pub fn nil() -> Self {
        Value::List(Vec::new())
    }

    /// The `true` atom.
    pub fn truth() -> Self {
        Value::Atom(TRUE_ATOM.to_string())
    }

    pub fn from_bool(b: bool) -> Self {
        if b { Value::truth() } else { Value::nil() }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(items) if items.is_empty())
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Value::Atom(_))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Value::Atom(text) => Some(text),
            Value::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            Value::Atom(_) => None,
        }
    }
}

// Debug rendering only; not guaranteed to read back to the same tree.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Atom(text) => write!(f, "{}", text),
            Value::List(items) => {
                write!(f, "(")?;
                let mut first = true;
                for item in items {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                    first = false;
                }
                write!(f, ")")
            }
        }
    }
}
