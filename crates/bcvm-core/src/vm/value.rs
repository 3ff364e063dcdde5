//! Runtime Value Representation
//!
//! Defines the dynamically-tagged values manipulated by the virtual machine,
//! the literal syntax accepted by LOAD_CONST, and the coercion rules used by
//! arithmetic, comparison and boolean contexts.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::bytecode::op::CompareOp;
use crate::error::RuntimeError;

/// Shared, mutable list storage. Every clone of a list value aliases it.
pub type ListRef = Rc<ListCell>;

/// Element storage behind a list value.
///
/// Nesting depth is unbounded, so dropping releases nested lists with a
/// worklist instead of recursing once per level.
#[derive(Debug, Default, PartialEq)]
pub struct ListCell(RefCell<Vec<Value>>);

impl ListCell {
    pub fn new(items: Vec<Value>) -> Self {
        ListCell(RefCell::new(items))
    }
}

impl Deref for ListCell {
    type Target = RefCell<Vec<Value>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for ListCell {
    fn drop(&mut self) {
        let mut pending = std::mem::take(self.0.get_mut());
        while let Some(value) = pending.pop() {
            // only the last owner unpacks; shared lists just lose a reference
            if let Value::List(list) = value {
                if let Ok(mut cell) = Rc::try_unwrap(list) {
                    pending.append(cell.0.get_mut());
                }
            }
        }
    }
}

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    None,

    /// Signed integer
    Int(i64),

    /// Double precision float
    Float(f64),

    /// Text
    Str(String),

    /// Single character, behaves as a one-character string
    Char(char),

    /// Boolean value
    Bool(bool),

    /// Ordered sequence of values
    List(ListRef),

    /// Symbolic reference to a built-in callable
    Function(String),
}

impl Value {
    /// Wrap owned elements into a fresh shared list
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(ListCell::new(items)))
    }

    /// Human-readable kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Char(_) => "char",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Function(_) => "function",
        }
    }

    /// Parse a LOAD_CONST literal.
    ///
    /// Forms are tried in order: double or smart quoted string, single quoted
    /// character, `True`/`False`, float (text containing `.`), integer.
    pub fn from_literal(text: &str) -> Result<Value, RuntimeError> {
        let text = text.trim();

        if let Some(inner) =
            strip_delimited(text, '"', '"').or_else(|| strip_delimited(text, '“', '”'))
        {
            return Ok(Value::Str(inner.to_string()));
        }

        if let Some(inner) = strip_delimited(text, '\'', '\'') {
            let mut chars = inner.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Ok(Value::Char(c));
            }
        }

        if text.eq_ignore_ascii_case("true") {
            return Ok(Value::Bool(true));
        }
        if text.eq_ignore_ascii_case("false") {
            return Ok(Value::Bool(false));
        }

        let invalid = || RuntimeError::InvalidLiteral(text.to_string());
        if text.contains('.') {
            text.parse::<f64>().map(Value::Float).map_err(|_| invalid())
        } else {
            text.parse::<i64>().map(Value::Int).map_err(|_| invalid())
        }
    }

    /// Integer coercion: Float truncates toward zero, Bool maps to 0/1.
    ///
    /// Floats outside the `i64` range fail instead of saturating.
    pub fn as_int(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Float(f) if f.is_nan() => Err(RuntimeError::NotConvertibleToInt("float")),
            Value::Float(f) => {
                let whole = f.trunc();
                // i64::MIN is exact as f64; i64::MAX rounds up to 2^63
                if whole >= i64::MIN as f64 && whole < i64::MAX as f64 {
                    Ok(whole as i64)
                } else {
                    Err(RuntimeError::IntegerOverflow)
                }
            }
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(RuntimeError::NotConvertibleToInt(other.kind_name())),
        }
    }

    /// Boolean coercion: numbers are true when nonzero
    pub fn as_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            other => Err(RuntimeError::NotConvertibleToBool(other.kind_name())),
        }
    }

    /// Numeric view used by comparisons
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Textual view of strings and characters
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Str(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Char(c) => Some(Cow::Owned(c.to_string())),
            _ => None,
        }
    }

    /// Whether `target` is reachable from this value, itself included
    pub fn contains_list(&self, target: &ListRef) -> bool {
        let Value::List(root) = self else {
            return false;
        };
        let mut seen = HashSet::new();
        let mut pending = vec![Rc::clone(root)];
        while let Some(list) = pending.pop() {
            if Rc::ptr_eq(&list, target) {
                return true;
            }
            if !seen.insert(Rc::as_ptr(&list)) {
                continue;
            }
            pending.extend(list.borrow().iter().filter_map(|item| match item {
                Value::List(inner) => Some(Rc::clone(inner)),
                _ => None,
            }));
        }
        false
    }

    /// Apply a comparison with `self` on the left-hand side
    pub fn compare(&self, op: CompareOp, right: &Value) -> Result<bool, RuntimeError> {
        if let (Some(l), Some(r)) = (self.as_number(), right.as_number()) {
            return Ok(op.eval(&l, &r));
        }
        if let (Some(l), Some(r)) = (self.as_text(), right.as_text()) {
            return Ok(op.eval(l.as_ref(), r.as_ref()));
        }
        Err(RuntimeError::UnsupportedComparison {
            left: self.kind_name(),
            op: op.symbol(),
            right: right.kind_name(),
        })
    }
}

fn strip_delimited(text: &str, open: char, close: char) -> Option<&str> {
    text.strip_prefix(open)?.strip_suffix(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => f.write_str(s),
            Value::Char(c) => write!(f, "{}", c),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::List(items) => write_list(f, items),
            Value::Function(name) => write!(f, "<func {}>", name),
        }
    }
}

/// Shortest round-trip digits, switching to exponent form below 1e-4 and
/// from 1e6 up (`1e+06`, `2.5e-07`), with `NaN`, `+Inf` and `-Inf`.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("NaN");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "+Inf" } else { "-Inf" });
    }
    let scientific = format!("{:e}", x);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..6).contains(&exponent) {
        write!(f, "{}", x)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// Render a list with an explicit frame stack so deep nesting cannot
/// exhaust the native stack.
fn write_list(f: &mut fmt::Formatter<'_>, root: &ListRef) -> fmt::Result {
    f.write_str("[")?;
    let mut frames: Vec<(ListRef, usize)> = vec![(Rc::clone(root), 0)];
    while let Some((list, next)) = frames.last_mut() {
        let item = list.borrow().get(*next).cloned();
        let Some(item) = item else {
            f.write_str("]")?;
            frames.pop();
            continue;
        };
        if *next > 0 {
            f.write_str(", ")?;
        }
        *next += 1;
        match item {
            Value::List(inner) => {
                f.write_str("[")?;
                frames.push((inner, 0));
            }
            scalar => write!(f, "{}", scalar)?,
        }
    }
    Ok(())
}
