//! Operator Semantics
//!
//! Arithmetic and logical operators over runtime values. Operands are given
//! as `(left, right)` in source-expression order.

use crate::bytecode::op::{BinaryOp, LogicalOp};
use crate::error::RuntimeError;
use super::value::Value;

/// Apply an arithmetic operator.
///
/// ADD concatenates when both sides are text; everything else works on
/// integer-coerced operands with checked arithmetic.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if op == BinaryOp::Add {
        if let (Some(l), Some(r)) = (left.as_text(), right.as_text()) {
            return Ok(Value::Str(l.into_owned() + r.as_ref()));
        }
    }

    let l = left.as_int()?;
    let r = right.as_int()?;

    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Subtract => l.checked_sub(r),
        BinaryOp::Multiply => l.checked_mul(r),
        BinaryOp::Divide => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            l.checked_div(r)
        }
        BinaryOp::Modulo => {
            if r == 0 {
                return Err(RuntimeError::ModuloByZero);
            }
            l.checked_rem(r)
        }
    };

    result.map(Value::Int).ok_or(RuntimeError::IntegerOverflow)
}

/// Apply a logical operator on boolean-coerced operands
pub fn logical(op: LogicalOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let l = left.as_bool()?;
    let r = right.as_bool()?;
    Ok(Value::Bool(match op {
        LogicalOp::And => l && r,
        LogicalOp::Or => l || r,
    }))
}
