//! Semantic-action expression trees.
//!
//! Grammar labels carry compiled expression trees that run against the
//! current state's context on entry. The tree is a plain tagged enum —
//! the grammar compiler builds it once, the traveller evaluates it with a
//! recursive interpreter — so actions are testable without any grammar in
//! sight.
//!
//! An action whose result is the boolean `false` denies entry to the state
//! (the branch dies quietly, as if the acceptor had rejected). Any
//! evaluation *error* — bad cast, division by zero, an undefined read in
//! strict mode — aborts the whole parse and carries the action's grammar
//! source location.

use crate::context::ContextStore;
use crate::state::{StateId, StateStore};
use crate::variable::{priority_tag, ArrayContext, ArrayRef, Tag, Value};
use nparse_base::{Error, ErrorKind, KeyTable, Result, SourceLoc, Symbol};
use std::cell::RefCell;
use std::rc::Rc;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Numeric identity.
    Plus,
    /// Numeric negation.
    Minus,
    /// Logical negation.
    Not,
    /// Bitwise complement.
    BitNot,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
}

/// Built-in functions provided by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Character count of a string, entry count of an array.
    Len,
    /// `substr(s, from[, len])`, character-based.
    Substr,
    /// Numeric conversion: integer when exact, real otherwise.
    Number,
    /// Canonical string rendering.
    String,
    /// Logs its arguments; yields null.
    Print,
}

/// A compiled semantic-action expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value (null, boolean, integer, real or string).
    Terminal(Value),
    /// Read of a context variable.
    Var(Symbol),
    /// Assignment into the current context frame; yields the value.
    Assign(Symbol, Box<Expr>),
    /// Element read: `a[k]`.
    Index(Box<Expr>, Box<Expr>),
    /// Element write: `a[k] = v`; auto-creates arrays along the path.
    IndexAssign(Box<Expr>, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Left-to-right sequence yielding the last value.
    Sequence(Vec<Expr>),
    If(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
    Call(Builtin, Vec<Expr>),
}

impl Expr {
    pub fn lit(value: Value) -> Expr {
        Expr::Terminal(value)
    }

    pub fn integer(n: i64) -> Expr {
        Expr::Terminal(Value::Integer(n))
    }

    pub fn string(s: impl Into<String>) -> Expr {
        Expr::Terminal(Value::String(s.into()))
    }

    pub fn var(key: Symbol) -> Expr {
        Expr::Var(key)
    }

    pub fn assign(key: Symbol, value: Expr) -> Expr {
        Expr::Assign(key, Box::new(value))
    }

    pub fn index(array: Expr, key: Expr) -> Expr {
        Expr::Index(Box::new(array), Box::new(key))
    }

    pub fn index_assign(array: Expr, key: Expr, value: Expr) -> Expr {
        Expr::IndexAssign(Box::new(array), Box::new(key), Box::new(value))
    }

    pub fn unary(op: UnaryOp, x: Expr) -> Expr {
        Expr::Unary(op, Box::new(x))
    }

    pub fn binary(op: BinaryOp, x: Expr, y: Expr) -> Expr {
        Expr::Binary(op, Box::new(x), Box::new(y))
    }

    pub fn seq(items: Vec<Expr>) -> Expr {
        Expr::Sequence(items)
    }

    pub fn branch(cond: Expr, then: Expr, otherwise: Option<Expr>) -> Expr {
        Expr::If(Box::new(cond), Box::new(then), otherwise.map(Box::new))
    }

    pub fn call(builtin: Builtin, args: Vec<Expr>) -> Expr {
        Expr::Call(builtin, args)
    }
}

/// A label-attached action: an expression tree plus the grammar location
/// it was compiled from.
#[derive(Debug, Clone)]
pub struct Action {
    pub root: Expr,
    pub loc: Option<SourceLoc>,
}

impl Action {
    pub fn new(root: Expr) -> Self {
        Action { root, loc: None }
    }

    pub fn at(root: Expr, loc: SourceLoc) -> Self {
        Action {
            root,
            loc: Some(loc),
        }
    }
}

/// Evaluates expressions against one state's context.
pub struct Evaluator<'a> {
    states: &'a StateStore,
    contexts: &'a mut ContextStore,
    keys: &'a RefCell<KeyTable>,
    state: StateId,
    strict: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        states: &'a StateStore,
        contexts: &'a mut ContextStore,
        keys: &'a RefCell<KeyTable>,
        state: StateId,
    ) -> Self {
        Evaluator {
            states,
            contexts,
            keys,
            state,
            strict: false,
        }
    }

    /// Strict mode turns reads of undefined variables into errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Runs an action; errors are decorated with its source location.
    pub fn run(&mut self, action: &Action) -> Result<Value> {
        match self.eval(&action.root) {
            Ok(value) => Ok(value),
            Err(err) => Err(match &action.loc {
                Some(loc) => err.at(loc.clone()),
                None => err,
            }),
        }
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Terminal(value) => Ok(value.clone()),
            Expr::Var(key) => {
                if self.strict && !self.contexts.is_defined(self.states, self.state, *key) {
                    return Err(Error::new(
                        ErrorKind::UndefinedVariable,
                        format!("'{}' has no definition", self.keys.borrow().resolve(*key)),
                    ));
                }
                Ok(self.contexts.val(self.states, self.state, *key))
            }
            Expr::Assign(key, rhs) => {
                let value = self.eval(rhs)?;
                self.contexts
                    .set(self.states, self.state, *key, value.clone());
                Ok(value)
            }
            Expr::Index(array, key) => {
                let key = self.index_key(key)?;
                match self.eval(array)? {
                    Value::Array(a) => Ok(a.borrow().get(key)),
                    Value::Null => Ok(Value::Null),
                    other => Err(Error::new(
                        ErrorKind::BadCast,
                        format!("cannot index into {}", other.tag()),
                    )),
                }
            }
            Expr::IndexAssign(array, key, rhs) => {
                let key = self.index_key(key)?;
                let value = self.eval(rhs)?;
                let target = self.lvalue_array(array)?;
                target.borrow_mut().set(key, value.clone());
                Ok(value)
            }
            Expr::Unary(op, x) => {
                let x = self.eval(x)?;
                apply_unary(*op, &x)
            }
            Expr::Binary(BinaryOp::And, x, y) => {
                if !self.eval(x)?.as_boolean()? {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.eval(y)?.as_boolean()?))
            }
            Expr::Binary(BinaryOp::Or, x, y) => {
                if self.eval(x)?.as_boolean()? {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.eval(y)?.as_boolean()?))
            }
            Expr::Binary(op, x, y) => {
                let x = self.eval(x)?;
                let y = self.eval(y)?;
                apply_binary(*op, &x, &y)
            }
            Expr::Sequence(items) => {
                let mut last = Value::Null;
                for item in items {
                    last = self.eval(item)?;
                }
                Ok(last)
            }
            Expr::If(cond, then, otherwise) => {
                if self.eval(cond)?.as_boolean()? {
                    self.eval(then)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise)
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::Call(builtin, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call(*builtin, &values)
            }
        }
    }

    fn index_key(&mut self, key: &Expr) -> Result<Symbol> {
        let rendered = self.eval(key)?.as_string();
        Ok(self.keys.borrow_mut().intern(&rendered))
    }

    /// Resolves an expression in element-write position to a concrete
    /// array, creating empty arrays along the way for unset slots.
    fn lvalue_array(&mut self, expr: &Expr) -> Result<ArrayRef> {
        match expr {
            Expr::Var(key) => self.contexts.context(self.states, self.state, *key),
            Expr::Index(array, key) => {
                let key = self.index_key(key)?;
                let parent = self.lvalue_array(array)?;
                let slot = parent.borrow().get(key);
                match slot {
                    Value::Array(a) => Ok(a),
                    Value::Null => {
                        let handle: ArrayRef = Rc::new(RefCell::new(ArrayContext::new()));
                        parent.borrow_mut().set(key, Value::Array(handle.clone()));
                        Ok(handle)
                    }
                    other => Err(Error::new(
                        ErrorKind::BadCast,
                        format!("cannot index into {}", other.tag()),
                    )),
                }
            }
            _ => match self.eval(expr)? {
                Value::Array(a) => Ok(a),
                other => Err(Error::new(
                    ErrorKind::BadCast,
                    format!("cannot assign into {}", other.tag()),
                )),
            },
        }
    }

    fn call(&mut self, builtin: Builtin, args: &[Value]) -> Result<Value> {
        let arity = |n: usize| -> Result<()> {
            if args.len() < n {
                Err(Error::new(
                    ErrorKind::Runtime,
                    format!("builtin expects at least {} argument(s)", n),
                ))
            } else {
                Ok(())
            }
        };
        match builtin {
            Builtin::Len => {
                arity(1)?;
                match &args[0] {
                    Value::Null => Ok(Value::Integer(0)),
                    Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                    Value::Array(a) => Ok(Value::Integer(a.borrow().len() as i64)),
                    other => Err(Error::new(
                        ErrorKind::BadCast,
                        format!("len is undefined for {}", other.tag()),
                    )),
                }
            }
            Builtin::Substr => {
                arity(2)?;
                let s = args[0].as_string();
                let from = args[1].as_integer()?.max(0) as usize;
                let len = match args.get(2) {
                    Some(v) => v.as_integer()?.max(0) as usize,
                    None => usize::MAX,
                };
                Ok(Value::String(s.chars().skip(from).take(len).collect()))
            }
            Builtin::Number => {
                arity(1)?;
                match &args[0] {
                    Value::Integer(n) => Ok(Value::Integer(*n)),
                    Value::Real(r) => Ok(Value::Real(*r)),
                    other => {
                        let rendered = other.as_string();
                        if let Ok(n) = rendered.trim().parse::<i64>() {
                            Ok(Value::Integer(n))
                        } else {
                            Ok(Value::Real(other.as_real()?))
                        }
                    }
                }
            }
            Builtin::String => {
                arity(1)?;
                Ok(Value::String(args[0].as_string()))
            }
            Builtin::Print => {
                let rendered: Vec<String> = args.iter().map(|v| v.as_string()).collect();
                log::debug!(target: "nparse", "{}", rendered.join(" "));
                Ok(Value::Null)
            }
        }
    }
}

/// Applies a unary operator.
pub fn apply_unary(op: UnaryOp, x: &Value) -> Result<Value> {
    match op {
        UnaryOp::Plus => match x {
            Value::Real(r) => Ok(Value::Real(*r)),
            other => Ok(Value::Integer(other.as_integer()?)),
        },
        UnaryOp::Minus => match x {
            Value::Real(r) => Ok(Value::Real(-r)),
            other => Ok(Value::Integer(other.as_integer()?.wrapping_neg())),
        },
        UnaryOp::Not => Ok(Value::Boolean(!x.as_boolean()?)),
        UnaryOp::BitNot => Ok(Value::Integer(!x.as_integer()?)),
    }
}

/// Applies a non-short-circuiting binary operator under the coercion
/// policy: the priority cast picks the working type, arithmetic lifts to
/// at least integer, `+` overloads to concatenation on strings and to
/// key-union on arrays.
pub fn apply_binary(op: BinaryOp, x: &Value, y: &Value) -> Result<Value> {
    use BinaryOp::*;
    match op {
        Add => match priority_tag(x, y) {
            Tag::Array => {
                let left = x.as_array()?;
                let right = y.as_array()?;
                let merged: ArrayRef = Rc::new(RefCell::new(ArrayContext::new()));
                {
                    let mut out = merged.borrow_mut();
                    for (k, v) in left.borrow().iter() {
                        out.set(k, v.clone());
                    }
                    for (k, v) in right.borrow().iter() {
                        out.set(k, v.clone());
                    }
                }
                Ok(Value::Array(merged))
            }
            Tag::String => Ok(Value::String(x.as_string() + &y.as_string())),
            Tag::Real => Ok(Value::Real(x.as_real()? + y.as_real()?)),
            _ => Ok(Value::Integer(x.as_integer()?.wrapping_add(y.as_integer()?))),
        },
        Sub | Mul | Div | Rem => {
            if priority_tag(x, y) == Tag::Real {
                let l = x.as_real()?;
                let r = y.as_real()?;
                if matches!(op, Div | Rem) && r == 0.0 {
                    return Err(Error::new(ErrorKind::DivByZero, "right side is zero"));
                }
                Ok(Value::Real(match op {
                    Sub => l - r,
                    Mul => l * r,
                    Div => l / r,
                    Rem => l % r,
                    _ => unreachable!(),
                }))
            } else {
                let l = x.as_integer()?;
                let r = y.as_integer()?;
                if matches!(op, Div | Rem) && r == 0 {
                    return Err(Error::new(ErrorKind::DivByZero, "right side is zero"));
                }
                Ok(Value::Integer(match op {
                    Sub => l.wrapping_sub(r),
                    Mul => l.wrapping_mul(r),
                    Div => l.wrapping_div(r),
                    Rem => l.wrapping_rem(r),
                    _ => unreachable!(),
                }))
            }
        }
        Lt | Le | Gt | Ge => {
            let ordering = match priority_tag(x, y) {
                Tag::Array => {
                    return Err(Error::new(ErrorKind::BadCast, "arrays are not ordered"))
                }
                Tag::String => x.as_string().cmp(&y.as_string()),
                Tag::Real => x
                    .as_real()?
                    .partial_cmp(&y.as_real()?)
                    .unwrap_or(std::cmp::Ordering::Equal),
                _ => x.as_integer()?.cmp(&y.as_integer()?),
            };
            Ok(Value::Boolean(match op {
                Lt => ordering.is_lt(),
                Le => ordering.is_le(),
                Gt => ordering.is_gt(),
                Ge => ordering.is_ge(),
                _ => unreachable!(),
            }))
        }
        Eq | Ne => {
            let equal = match priority_tag(x, y) {
                Tag::Null => true,
                Tag::Boolean => x.as_boolean()? == y.as_boolean()?,
                Tag::Integer => x.as_integer()? == y.as_integer()?,
                Tag::Real => x.as_real()? == y.as_real()?,
                Tag::String => x.as_string() == y.as_string(),
                Tag::Array => std::rc::Rc::ptr_eq(&x.as_array()?, &y.as_array()?),
            };
            Ok(Value::Boolean(if op == Eq { equal } else { !equal }))
        }
        And => Ok(Value::Boolean(x.as_boolean()? && y.as_boolean()?)),
        Or => Ok(Value::Boolean(x.as_boolean()? || y.as_boolean()?)),
        BitAnd => Ok(Value::Integer(x.as_integer()? & y.as_integer()?)),
        BitOr => Ok(Value::Integer(x.as_integer()? | y.as_integer()?)),
        BitXor => Ok(Value::Integer(x.as_integer()? ^ y.as_integer()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArcId, ArcKind, NodeId, Range};
    use crate::state::State;

    struct Fixture {
        states: StateStore,
        contexts: ContextStore,
        keys: RefCell<KeyTable>,
        root: StateId,
    }

    fn fixture() -> Fixture {
        let mut states = StateStore::new();
        states.set_capacity(8 * State::ALLOC_SIZE).unwrap();
        let root = states
            .alloc_common(None, ArcId(0), ArcKind::Simple, NodeId(0), Range::new(0, 0))
            .unwrap();
        Fixture {
            states,
            contexts: ContextStore::new(),
            keys: RefCell::new(KeyTable::new()),
            root,
        }
    }

    impl Fixture {
        fn eval(&mut self, expr: &Expr) -> Result<Value> {
            Evaluator::new(&self.states, &mut self.contexts, &self.keys, self.root).eval(expr)
        }

        fn key(&self, name: &str) -> Symbol {
            self.keys.borrow_mut().intern(name)
        }
    }

    #[test]
    fn arithmetic_follows_priority_cast() {
        let mut f = fixture();
        let e = Expr::binary(BinaryOp::Add, Expr::integer(2), Expr::integer(3));
        assert_eq!(f.eval(&e).unwrap(), Value::Integer(5));

        let e = Expr::binary(
            BinaryOp::Add,
            Expr::integer(2),
            Expr::lit(Value::Real(0.5)),
        );
        assert_eq!(f.eval(&e).unwrap(), Value::Real(2.5));

        let e = Expr::binary(BinaryOp::Add, Expr::string("n = "), Expr::integer(4));
        assert_eq!(f.eval(&e).unwrap(), Value::String("n = 4".into()));
    }

    #[test]
    fn numeric_strings_participate_in_arithmetic() {
        let mut f = fixture();
        let e = Expr::binary(BinaryOp::Mul, Expr::string("6"), Expr::integer(7));
        assert_eq!(f.eval(&e).unwrap(), Value::Integer(42));
    }

    #[test]
    fn division_by_zero_is_reported() {
        let mut f = fixture();
        let e = Expr::binary(BinaryOp::Div, Expr::integer(1), Expr::integer(0));
        assert_eq!(f.eval(&e).unwrap_err().kind, ErrorKind::DivByZero);
        let e = Expr::binary(
            BinaryOp::Rem,
            Expr::lit(Value::Real(1.0)),
            Expr::lit(Value::Real(0.0)),
        );
        assert_eq!(f.eval(&e).unwrap_err().kind, ErrorKind::DivByZero);
    }

    #[test]
    fn comparisons_cast_to_the_winning_type() {
        let mut f = fixture();
        // String wins, so this compares "2" against "10" lexicographically.
        let e = Expr::binary(BinaryOp::Lt, Expr::integer(2), Expr::string("10"));
        assert_eq!(f.eval(&e).unwrap(), Value::Boolean(false));
        let e = Expr::binary(BinaryOp::Eq, Expr::integer(2), Expr::lit(Value::Real(2.0)));
        assert_eq!(f.eval(&e).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn logic_short_circuits() {
        let mut f = fixture();
        // The right side would divide by zero; && must not reach it.
        let e = Expr::binary(
            BinaryOp::And,
            Expr::lit(Value::Boolean(false)),
            Expr::binary(BinaryOp::Div, Expr::integer(1), Expr::integer(0)),
        );
        assert_eq!(f.eval(&e).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn assignment_writes_the_context() {
        let mut f = fixture();
        let x = f.key("x");
        let e = Expr::seq(vec![
            Expr::assign(x, Expr::integer(41)),
            Expr::binary(BinaryOp::Add, Expr::var(x), Expr::integer(1)),
        ]);
        assert_eq!(f.eval(&e).unwrap(), Value::Integer(42));
        assert_eq!(
            f.contexts.val(&f.states, f.root, x),
            Value::Integer(41)
        );
    }

    #[test]
    fn index_assignment_auto_creates_arrays() {
        let mut f = fixture();
        let a = f.key("a");
        let e = Expr::index_assign(Expr::var(a), Expr::string("k"), Expr::integer(7));
        assert_eq!(f.eval(&e).unwrap(), Value::Integer(7));
        let read = Expr::index(Expr::var(a), Expr::string("k"));
        assert_eq!(f.eval(&read).unwrap(), Value::Integer(7));
    }

    #[test]
    fn nested_index_assignment_builds_a_chain() {
        let mut f = fixture();
        let a = f.key("a");
        let e = Expr::index_assign(
            Expr::index(Expr::var(a), Expr::string("outer")),
            Expr::string("inner"),
            Expr::string("deep"),
        );
        f.eval(&e).unwrap();
        let read = Expr::index(
            Expr::index(Expr::var(a), Expr::string("outer")),
            Expr::string("inner"),
        );
        assert_eq!(f.eval(&read).unwrap(), Value::String("deep".into()));
    }

    #[test]
    fn indexing_scalars_is_a_bad_cast() {
        let mut f = fixture();
        let x = f.key("x");
        f.eval(&Expr::assign(x, Expr::integer(3))).unwrap();
        let e = Expr::index(Expr::var(x), Expr::string("k"));
        assert_eq!(f.eval(&e).unwrap_err().kind, ErrorKind::BadCast);
    }

    #[test]
    fn conditional_yields_branch_value() {
        let mut f = fixture();
        let e = Expr::branch(
            Expr::binary(BinaryOp::Gt, Expr::integer(3), Expr::integer(1)),
            Expr::string("yes"),
            Some(Expr::string("no")),
        );
        assert_eq!(f.eval(&e).unwrap(), Value::String("yes".into()));
        let e = Expr::branch(Expr::lit(Value::Boolean(false)), Expr::string("yes"), None);
        assert_eq!(f.eval(&e).unwrap(), Value::Null);
    }

    #[test]
    fn builtins_cover_strings_and_arrays() {
        let mut f = fixture();
        let e = Expr::call(Builtin::Len, vec![Expr::string("héllo")]);
        assert_eq!(f.eval(&e).unwrap(), Value::Integer(5));
        let e = Expr::call(
            Builtin::Substr,
            vec![Expr::string("nondeterminism"), Expr::integer(3), Expr::integer(5)],
        );
        assert_eq!(f.eval(&e).unwrap(), Value::String("deter".into()));
        let e = Expr::call(Builtin::Number, vec![Expr::string("12")]);
        assert_eq!(f.eval(&e).unwrap(), Value::Integer(12));
        let e = Expr::call(Builtin::Number, vec![Expr::string("1.5")]);
        assert_eq!(f.eval(&e).unwrap(), Value::Real(1.5));
        let e = Expr::call(Builtin::String, vec![Expr::integer(9)]);
        assert_eq!(f.eval(&e).unwrap(), Value::String("9".into()));
    }

    #[test]
    fn strict_mode_rejects_undefined_reads() {
        let mut f = fixture();
        let ghost = f.key("ghost");
        let err = Evaluator::new(&f.states, &mut f.contexts, &f.keys, f.root)
            .strict(true)
            .eval(&Expr::var(ghost))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert!(err.message.contains("ghost"));
    }

    #[test]
    fn run_decorates_errors_with_the_action_location() {
        let mut f = fixture();
        let action = Action::at(
            Expr::binary(BinaryOp::Div, Expr::integer(1), Expr::integer(0)),
            SourceLoc::new("calc.ng", 3, 14),
        );
        let err = Evaluator::new(&f.states, &mut f.contexts, &f.keys, f.root)
            .run(&action)
            .unwrap_err();
        assert_eq!(err.location.unwrap().line, 3);
    }

    #[test]
    fn array_union_prefers_the_right_side() {
        let mut f = fixture();
        let a = f.key("a");
        let b = f.key("b");
        f.eval(&Expr::index_assign(
            Expr::var(a),
            Expr::string("k"),
            Expr::integer(1),
        ))
        .unwrap();
        f.eval(&Expr::index_assign(
            Expr::var(a),
            Expr::string("only_a"),
            Expr::integer(10),
        ))
        .unwrap();
        f.eval(&Expr::index_assign(
            Expr::var(b),
            Expr::string("k"),
            Expr::integer(2),
        ))
        .unwrap();
        let merged = f.key("m");
        f.eval(&Expr::assign(
            merged,
            Expr::binary(BinaryOp::Add, Expr::var(a), Expr::var(b)),
        ))
        .unwrap();
        let read = |f: &mut Fixture, key: &str| {
            let e = Expr::index(Expr::var(merged), Expr::string(key));
            f.eval(&e).unwrap()
        };
        assert_eq!(read(&mut f, "k"), Value::Integer(2));
        assert_eq!(read(&mut f, "only_a"), Value::Integer(10));
    }
}
