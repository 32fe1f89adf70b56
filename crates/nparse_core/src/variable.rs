//! Trace variable values.
//!
//! A trace variable holds one of six types: null, boolean, integer, real,
//! string or array. Arrays are references to nested associative contexts,
//! which is what makes hierarchical and even cyclic structures expressible;
//! two array values are equal only when they are the same context.
//!
//! Coercion follows two rule sets from the semantic-action calculus:
//!
//! - a **directed cast** converts a value to a requested type, raising the
//!   bad-cast error where no value-preserving conversion exists;
//! - the **priority cast** picks the winning type for a symmetric binary
//!   operator, following the order
//!   `null < boolean < integer < real < string < array`.

use nparse_base::{Error, ErrorKind, Result, Symbol};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A nested associative context referenced by array values.
#[derive(Debug, Default)]
pub struct ArrayContext {
    entries: FxHashMap<Symbol, Value>,
}

impl ArrayContext {
    pub fn new() -> Self {
        ArrayContext {
            entries: FxHashMap::default(),
        }
    }

    pub fn get(&self, key: Symbol) -> Value {
        self.entries.get(&key).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, key: Symbol, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: Symbol) {
        self.entries.remove(&key);
    }

    pub fn contains(&self, key: Symbol) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Value)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

/// Shared handle to an [`ArrayContext`].
pub type ArrayRef = Rc<RefCell<ArrayContext>>;

/// Creates a fresh empty array value.
pub fn new_array() -> Value {
    Value::Array(Rc::new(RefCell::new(ArrayContext::new())))
}

/// The type tag of a [`Value`], ranked for the priority cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tag {
    Null,
    Boolean,
    Integer,
    Real,
    String,
    Array,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "null",
            Tag::Boolean => "boolean",
            Tag::Integer => "integer",
            Tag::Real => "real",
            Tag::String => "string",
            Tag::Array => "array",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A trace variable value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(ArrayRef),
}

fn bad_cast(value: &Value, target: Tag) -> Error {
    Error::new(
        ErrorKind::BadCast,
        format!("cannot cast {} to {}", value.tag(), target),
    )
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Boolean(_) => Tag::Boolean,
            Value::Integer(_) => Tag::Integer,
            Value::Real(_) => Tag::Real,
            Value::String(_) => Tag::String,
            Value::Array(_) => Tag::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Value::Real(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Directed cast to the requested type.
    pub fn cast_to(&self, target: Tag) -> Result<Value> {
        match target {
            Tag::Null => Ok(Value::Null),
            Tag::Boolean => Ok(Value::Boolean(self.as_boolean()?)),
            Tag::Integer => Ok(Value::Integer(self.as_integer()?)),
            Tag::Real => Ok(Value::Real(self.as_real()?)),
            Tag::String => Ok(Value::String(self.as_string())),
            Tag::Array => Ok(Value::Array(self.as_array()?)),
        }
    }

    /// Coercing read as a boolean.
    ///
    /// Null yields the default boolean (false); numeric values preserve
    /// their truth; the strings `"true"` and `"false"` parse; everything
    /// else is a bad cast.
    pub fn as_boolean(&self) -> Result<bool> {
        match self {
            Value::Null => Ok(false),
            Value::Boolean(b) => Ok(*b),
            Value::Integer(n) => Ok(*n != 0),
            Value::Real(r) => Ok(*r != 0.0),
            Value::String(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(bad_cast(self, Tag::Boolean)),
            },
            Value::Array(_) => Err(bad_cast(self, Tag::Boolean)),
        }
    }

    /// Coercing read as an integer; reals truncate, decimal strings parse.
    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Value::Null => Ok(0),
            Value::Boolean(b) => Ok(*b as i64),
            Value::Integer(n) => Ok(*n),
            Value::Real(r) => Ok(*r as i64),
            Value::String(s) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    Ok(n)
                } else if let Ok(r) = s.trim().parse::<f64>() {
                    Ok(r as i64)
                } else {
                    Err(bad_cast(self, Tag::Integer))
                }
            }
            Value::Array(_) => Err(bad_cast(self, Tag::Integer)),
        }
    }

    /// Coercing read as a real.
    pub fn as_real(&self) -> Result<f64> {
        match self {
            Value::Null => Ok(0.0),
            Value::Boolean(b) => Ok(*b as i64 as f64),
            Value::Integer(n) => Ok(*n as f64),
            Value::Real(r) => Ok(*r),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| bad_cast(self, Tag::Real)),
            Value::Array(_) => Err(bad_cast(self, Tag::Real)),
        }
    }

    /// Canonical string rendering; total over all types.
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Real(r) => r.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(a) => format!("array({})", a.borrow().len()),
        }
    }

    /// Array view; only arrays qualify in value position.
    pub fn as_array(&self) -> Result<ArrayRef> {
        match self {
            Value::Array(a) => Ok(a.clone()),
            _ => Err(bad_cast(self, Tag::Array)),
        }
    }

    /// Typed read with a default for null; errors on any other mismatch.
    pub fn get_boolean(&self, default: bool) -> Result<bool> {
        match self {
            Value::Null => Ok(default),
            Value::Boolean(b) => Ok(*b),
            _ => Err(bad_cast(self, Tag::Boolean)),
        }
    }

    /// Typed read with a default for null; errors on any other mismatch.
    pub fn get_integer(&self, default: i64) -> Result<i64> {
        match self {
            Value::Null => Ok(default),
            Value::Integer(n) => Ok(*n),
            _ => Err(bad_cast(self, Tag::Integer)),
        }
    }

    /// Typed read with a default for null; errors on any other mismatch.
    pub fn get_real(&self, default: f64) -> Result<f64> {
        match self {
            Value::Null => Ok(default),
            Value::Real(r) => Ok(*r),
            _ => Err(bad_cast(self, Tag::Real)),
        }
    }

    /// Typed read with a default for null; errors on any other mismatch.
    pub fn get_string(&self, default: &str) -> Result<String> {
        match self {
            Value::Null => Ok(default.to_string()),
            Value::String(s) => Ok(s.clone()),
            _ => Err(bad_cast(self, Tag::String)),
        }
    }
}

/// The winning type for a symmetric binary operator over `u` and `v`.
pub fn priority_tag(u: &Value, v: &Value) -> Tag {
    u.tag().max(v.tag())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}
