use crate::{
    ast::{BinaryOp, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticKind},
    number::Integer,
    value::{Numeric, Value, ValueKind},
};

/// Upper bound on the length of a repeated string (in bytes) or list.
pub const MAX_REPEAT_LEN: usize = 1 << 28;

/// Applies a binary operator to two evaluated operands. `and`/`or` land
/// here only without short-circuiting; the evaluator handles those itself.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Diagnostic> {
    use BinaryOp::*;
    match op {
        Add => add(left, right),
        Sub | Div | Mod | Pow => arithmetic(op, left, right),
        Mul => multiply(left, right),
        Equal => Ok(Value::flag(left.loose_eq(right))),
        NotEqual => Ok(Value::flag(!left.loose_eq(right))),
        Identical => Ok(Value::flag(left.identical(right))),
        NotIdentical => Ok(Value::flag(!left.identical(right))),
        Less | LessEqual | Greater | GreaterEqual => {
            let ordering = left
                .compare(right)
                .ok_or_else(|| unsupported(op, left, right))?;
            let holds = match op {
                Less => ordering.is_lt(),
                LessEqual => ordering.is_le(),
                Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::flag(holds))
        }
        And => Ok(Value::flag(left.is_truthy() && right.is_truthy())),
        Or => Ok(Value::flag(left.is_truthy() || right.is_truthy())),
    }
}

pub fn unary(op: UnaryOp, value: &Value) -> Result<Value, Diagnostic> {
    match op {
        UnaryOp::Negate => match Numeric::of(value) {
            Some(Numeric::Int(n)) => Ok(Value::integer(n.neg())),
            Some(Numeric::Float(f)) => Ok(Value::float(-f)),
            None => Err(Diagnostic::type_error(format!(
                "unsupported operand type for unary `-`: {}",
                value.type_name()
            ))),
        },
        UnaryOp::Not => Ok(Value::flag(!value.is_truthy())),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, Diagnostic> {
    match (&*left.0, &*right.0) {
        (ValueKind::String(a), ValueKind::String(b)) => Ok(Value::string(format!("{a}{b}"))),
        (ValueKind::String(a), _) if Numeric::of(right).is_some() => {
            Ok(Value::string(format!("{a}{right}")))
        }
        (_, ValueKind::String(b)) if Numeric::of(left).is_some() => {
            Ok(Value::string(format!("{left}{b}")))
        }
        (ValueKind::List(a), ValueKind::List(b)) => {
            Ok(Value::list(a.iter().chain(b).cloned().collect()))
        }
        _ => arithmetic(BinaryOp::Add, left, right),
    }
}

fn multiply(left: &Value, right: &Value) -> Result<Value, Diagnostic> {
    match (&*left.0, &*right.0) {
        (ValueKind::String(text), ValueKind::Int(count))
        | (ValueKind::Int(count), ValueKind::String(text)) => {
            let times = repeat_count(count, left, right)?;
            repeated_len(text.len(), times, "string")?;
            Ok(Value::string(text.repeat(times)))
        }
        (ValueKind::List(items), ValueKind::Int(count)) => {
            let times = repeat_count(count, left, right)?;
            let len = repeated_len(items.len(), times, "list")?;
            Ok(Value::list(items.iter().cycle().take(len).cloned().collect()))
        }
        _ => arithmetic(BinaryOp::Mul, left, right),
    }
}

fn repeat_count(count: &Integer, left: &Value, right: &Value) -> Result<usize, Diagnostic> {
    if count.is_negative() {
        return Err(Diagnostic::type_error(format!(
            "cannot repeat {} a negative number of times",
            if matches!(&*left.0, ValueKind::List(_)) { "a list" } else { "a string" }
        )));
    }
    count
        .to_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            Diagnostic::runtime(format!(
                "repetition count too large for {} and {}",
                left.type_name(),
                right.type_name()
            ))
        })
}

/// Length of a repetition result, refused before anything is allocated.
fn repeated_len(len: usize, times: usize, what: &str) -> Result<usize, Diagnostic> {
    len.checked_mul(times)
        .filter(|total| *total <= MAX_REPEAT_LEN)
        .ok_or_else(|| {
            Diagnostic::runtime(format!(
                "repeated {what} would be longer than {MAX_REPEAT_LEN}"
            ))
        })
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Diagnostic> {
    let (Some(a), Some(b)) = (Numeric::of(left), Numeric::of(right)) else {
        return Err(unsupported(op, left, right));
    };

    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b.is_zero() {
        let message = if op == BinaryOp::Div {
            "Division by zero"
        } else {
            "Modulo by zero"
        };
        return Err(Diagnostic::new(DiagnosticKind::DivisionByZero, message));
    }

    let result = match (a, b) {
        (Numeric::Int(a), Numeric::Int(b)) => integer_arithmetic(op, &a, &b)?,
        (a, b) => Numeric::Float(float_arithmetic(op, a.to_f64(), b.to_f64())),
    };
    Ok(result.into_value())
}

fn integer_arithmetic(op: BinaryOp, a: &Integer, b: &Integer) -> Result<Numeric, Diagnostic> {
    let result = match op {
        BinaryOp::Add => Numeric::Int(a.add(b)),
        BinaryOp::Sub => Numeric::Int(a.sub(b)),
        BinaryOp::Mul => Numeric::Int(a.mul(b)),
        BinaryOp::Div => {
            let (quotient, remainder) = a.div_rem(b);
            if remainder.is_zero() {
                Numeric::Int(quotient)
            } else {
                Numeric::Float(a.to_f64() / b.to_f64())
            }
        }
        BinaryOp::Mod => Numeric::Int(a.div_rem(b).1),
        BinaryOp::Pow if b.is_negative() => Numeric::Float(a.to_f64().powf(b.to_f64())),
        BinaryOp::Pow => {
            let exponent = b
                .to_i64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| Diagnostic::runtime(format!("exponent {b} is too large")))?;
            Numeric::Int(a.pow(exponent))
        }
        _ => {
            return Err(Diagnostic::runtime(format!(
                "`{}` is not an arithmetic operator",
                op.symbol()
            )));
        }
    };
    Ok(result)
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => a.powf(b),
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> Diagnostic {
    Diagnostic::type_error(format!(
        "unsupported operand types for `{}`: {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}
