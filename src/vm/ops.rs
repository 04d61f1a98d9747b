//! Operator semantics.
//!
//! Integers are 64-bit and wrap on overflow. Mixing an integer with a
//! floating value promotes to floating. Booleans only take part in `==`,
//! `!=` and `!`.

use stepvm_compiler::{BinaryOperator, UnaryOperator};
use stepvm_core::{RuntimeError, Value};

pub(crate) fn binary(
    op: BinaryOperator,
    left: Value,
    right: Value,
    pc: usize,
) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;

    let mismatch = || RuntimeError::TypeMismatch {
        op: op.symbol().to_string(),
        operands: format!("{} and {}", left.type_name(), right.type_name()),
        pc,
    };

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(match op {
            Add => Value::Int(a.wrapping_add(b)),
            Sub => Value::Int(a.wrapping_sub(b)),
            Mul => Value::Int(a.wrapping_mul(b)),
            Div | Rem if b == 0 => return Err(RuntimeError::DivisionByZero { pc }),
            Div => Value::Int(a.wrapping_div(b)),
            Rem => Value::Int(a.wrapping_rem(b)),
            Greater => Value::Bool(a > b),
            GreaterEqual => Value::Bool(a >= b),
            Less => Value::Bool(a < b),
            LessEqual => Value::Bool(a <= b),
            Equal => Value::Bool(a == b),
            NotEqual => Value::Bool(a != b),
        }),
        (Value::Bool(a), Value::Bool(b)) => match op {
            Equal => Ok(Value::Bool(a == b)),
            NotEqual => Ok(Value::Bool(a != b)),
            _ => Err(mismatch()),
        },
        _ => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Err(mismatch());
            };
            Ok(match op {
                Add => Value::Float(a + b),
                Sub => Value::Float(a - b),
                Mul => Value::Float(a * b),
                Div => Value::Float(a / b),
                Rem => Value::Float(a % b),
                Greater => Value::Bool(a > b),
                GreaterEqual => Value::Bool(a >= b),
                Less => Value::Bool(a < b),
                LessEqual => Value::Bool(a <= b),
                Equal => Value::Bool(a == b),
                NotEqual => Value::Bool(a != b),
            })
        }
    }
}

pub(crate) fn unary(op: UnaryOperator, operand: Value, pc: usize) -> Result<Value, RuntimeError> {
    use UnaryOperator::*;

    match (op, operand) {
        (Increment, Value::Int(v)) => Ok(Value::Int(v.wrapping_add(1))),
        (Increment, Value::Float(v)) => Ok(Value::Float(v + 1.0)),
        (Decrement, Value::Int(v)) => Ok(Value::Int(v.wrapping_sub(1))),
        (Decrement, Value::Float(v)) => Ok(Value::Float(v - 1.0)),
        (Negate, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (Negate, Value::Float(v)) => Ok(Value::Float(-v)),
        (Plus, Value::Int(_) | Value::Float(_)) => Ok(operand),
        (Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(RuntimeError::TypeMismatch {
            op: op.symbol().to_string(),
            operands: operand.type_name().to_string(),
            pc,
        }),
    }
}
