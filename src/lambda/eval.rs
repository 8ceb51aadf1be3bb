//! Tree-walking evaluator.
//!
//! Names resolve against the lambda's own parameters first, then the
//! allow-list in `builtins`. An unknown name is `EvalError::Unresolved`;
//! every other failure is `EvalError::Runtime`.

use super::EvalError;
use super::builtins::{self, MAX_SEQUENCE_LEN};
use super::parse::{BinOp, CmpOp, Expr, Lambda, UnaryOp};
use super::value::{Num, Value};

struct Env<'a> {
    bindings: Vec<(&'a str, Value)>,
}

impl Env<'_> {
    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some((_, v)) = self.bindings.iter().find(|(n, _)| *n == name) {
            return Ok(v.clone());
        }
        builtins::lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| EvalError::Unresolved(name.to_string()))
    }
}

/// Apply `lambda` to `args`. The caller has already checked arity.
pub fn call(lambda: &Lambda, args: Vec<Value>) -> Result<Value, EvalError> {
    let env = Env {
        bindings: lambda
            .params
            .iter()
            .map(String::as_str)
            .zip(args)
            .collect(),
    };
    eval(&lambda.body, &env)
}

fn eval(expr: &Expr, env: &Env<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Const(v) => Ok(v.clone()),
        Expr::Name(name) => env.lookup(name),
        Expr::List(items) => {
            let list = Value::List(
                items
                    .iter()
                    .map(|e| eval(e, env))
                    .collect::<Result<Vec<_>, _>>()?,
            );
            check_len(list.size())?;
            Ok(list)
        }
        Expr::Unary(op, inner) => unary(*op, eval(inner, env)?),
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, env)?;
            let r = eval(rhs, env)?;
            binary(*op, l, r)
        }
        Expr::And(lhs, rhs) => {
            let l = eval(lhs, env)?;
            if l.truthy() { eval(rhs, env) } else { Ok(l) }
        }
        Expr::Or(lhs, rhs) => {
            let l = eval(lhs, env)?;
            if l.truthy() { Ok(l) } else { eval(rhs, env) }
        }
        Expr::Compare(first, rest) => {
            let mut left = eval(first, env)?;
            for (op, rhs) in rest {
                let right = eval(rhs, env)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::IfElse {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, env)?.truthy() {
                eval(then, env)
            } else {
                eval(otherwise, env)
            }
        }
        Expr::Call { func, args } => {
            let f = eval(func, env)?;
            let args = args
                .iter()
                .map(|e| eval(e, env))
                .collect::<Result<Vec<_>, _>>()?;
            call_value(f, &args)
        }
        Expr::Attr { value, name } => {
            let v = eval(value, env)?;
            if matches!(v, Value::Str(_)) && builtins::is_str_method(name) {
                Ok(Value::Method(Box::new(v), name.clone()))
            } else {
                Err(EvalError::attribute_error(format!(
                    "'{}' object has no attribute '{}'",
                    v.type_name(),
                    name
                )))
            }
        }
        Expr::Index { value, index } => {
            let v = eval(value, env)?;
            let i = eval(index, env)?;
            subscript(&v, &i)
        }
        Expr::Slice { value, start, stop } => {
            let v = eval(value, env)?;
            let start = match start {
                Some(e) => Some(eval(e, env)?),
                None => None,
            };
            let stop = match stop {
                Some(e) => Some(eval(e, env)?),
                None => None,
            };
            slice(&v, start.as_ref(), stop.as_ref())
        }
    }
}

fn call_value(f: Value, args: &[Value]) -> Result<Value, EvalError> {
    match f {
        Value::Builtin(b) => b.call(args),
        Value::Method(recv, name) => match *recv {
            Value::Str(s) => builtins::call_str_method(&s, &name, args),
            other => Err(EvalError::attribute_error(format!(
                "'{}' object has no attribute '{}'",
                other.type_name(),
                name
            ))),
        },
        other => Err(EvalError::type_error(format!(
            "'{}' object is not callable",
            other.type_name()
        ))),
    }
}

fn unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, v.as_num()) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!v.truthy())),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Float(f))) => Ok(Value::Float(f)),
        (UnaryOp::Neg, Some(Num::Int(i))) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Some(Num::Float(f))) => Ok(Value::Float(-f)),
        (op, None) => Err(EvalError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            v.type_name()
        ))),
    }
}

fn overflow() -> EvalError {
    EvalError::runtime("OverflowError", "integer overflow")
}

fn unsupported(op: BinOp, l: &Value, r: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        l.type_name(),
        r.type_name()
    ))
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    match (op, &l, &r) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            check_len(a.chars().count() + b.chars().count())?;
            return Ok(Value::Str(format!("{}{}", a, b)));
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            check_len(l.size().saturating_add(r.size()))?;
            return Ok(Value::List(a.iter().chain(b).cloned().collect()));
        }
        (BinOp::Mul, Value::Str(_), _) | (BinOp::Mul, Value::List(_), _) => {
            if let Some(n) = r.as_index() {
                return repeat(&l, n);
            }
        }
        (BinOp::Mul, _, Value::Str(_)) | (BinOp::Mul, _, Value::List(_)) => {
            if let Some(n) = l.as_index() {
                return repeat(&r, n);
            }
        }
        (BinOp::Mod, Value::Str(fmt), _) => return percent_format(fmt, &r),
        _ => {}
    }

    match (l.as_num(), r.as_num()) {
        (Some(a), Some(b)) => arith(op, a, b),
        _ => Err(unsupported(op, &l, &r)),
    }
}

fn check_len(len: usize) -> Result<(), EvalError> {
    if len > MAX_SEQUENCE_LEN {
        return Err(EvalError::memory_error());
    }
    Ok(())
}

fn repeat(seq: &Value, n: i64) -> Result<Value, EvalError> {
    let n = usize::try_from(n).unwrap_or(0);
    match seq {
        Value::Str(s) => {
            check_len(s.chars().count().saturating_mul(n))?;
            Ok(Value::Str(s.repeat(n)))
        }
        Value::List(items) if items.is_empty() => Ok(Value::List(Vec::new())),
        Value::List(items) => {
            check_len(seq.size().saturating_mul(n))?;
            let mut out = Vec::with_capacity(items.len() * n);
            for _ in 0..n {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        other => Err(EvalError::type_error(format!(
            "can't multiply sequence of type '{}'",
            other.type_name()
        ))),
    }
}

fn arith(op: BinOp, a: Num, b: Num) -> Result<Value, EvalError> {
    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        return int_arith(op, x, y);
    }
    let (x, y) = (a.as_f64(), b.as_f64());
    let out = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div | BinOp::FloorDiv | BinOp::Mod if y == 0.0 => {
            return Err(EvalError::zero_division("float division by zero"));
        }
        BinOp::Div => x / y,
        BinOp::FloorDiv => (x / y).floor(),
        BinOp::Mod => x - y * (x / y).floor(),
        BinOp::Pow if x == 0.0 && y < 0.0 => {
            return Err(EvalError::zero_division(
                "0.0 cannot be raised to a negative power",
            ));
        }
        BinOp::Pow => x.powf(y),
    };
    Ok(Value::Float(out))
}

fn int_arith(op: BinOp, x: i64, y: i64) -> Result<Value, EvalError> {
    let zero_div = || EvalError::zero_division("integer division or modulo by zero");
    let out = match op {
        BinOp::Add => x.checked_add(y),
        BinOp::Sub => x.checked_sub(y),
        BinOp::Mul => x.checked_mul(y),
        BinOp::Div => {
            if y == 0 {
                return Err(EvalError::zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinOp::FloorDiv => {
            if y == 0 {
                return Err(zero_div());
            }
            x.checked_div(y).map(|q| {
                if x % y != 0 && ((x < 0) != (y < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinOp::Mod => {
            if y == 0 {
                return Err(zero_div());
            }
            x.checked_rem(y)
                .map(|m| if m != 0 && ((m < 0) != (y < 0)) { m + y } else { m })
        }
        BinOp::Pow => {
            if y < 0 {
                return arith(op, Num::Float(x as f64), Num::Float(y as f64));
            }
            u32::try_from(y).ok().and_then(|e| x.checked_pow(e))
        }
    };
    out.map(Value::Int).ok_or_else(overflow)
}

/// `'%s-%d' % (a, b)`
fn percent_format(fmt: &str, args: &Value) -> Result<Value, EvalError> {
    let items = match args {
        Value::List(items) => items.clone(),
        other => vec![other.clone()],
    };
    let mut items = items.into_iter();
    let missing = || EvalError::type_error("not enough arguments for format string");

    let mut out = String::new();
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => out.push_str(&items.next().ok_or_else(missing)?.to_string()),
            Some('r') => out.push_str(&items.next().ok_or_else(missing)?.repr()),
            Some('d') | Some('i') => {
                let v = items.next().ok_or_else(missing)?;
                match v.as_num() {
                    Some(Num::Int(i)) => out.push_str(&i.to_string()),
                    Some(Num::Float(f)) => out.push_str(&(f.trunc() as i64).to_string()),
                    None => {
                        return Err(EvalError::type_error(format!(
                            "%d format: a number is required, not {}",
                            v.type_name()
                        )));
                    }
                }
            }
            Some(other) => {
                return Err(EvalError::value_error(format!(
                    "unsupported format character '{}'",
                    other
                )));
            }
            None => return Err(EvalError::value_error("incomplete format")),
        }
        check_len(out.len())?;
    }
    if items.next().is_some() {
        return Err(EvalError::type_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(Value::Str(out))
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool, EvalError> {
    use std::cmp::Ordering::*;
    Ok(match op {
        CmpOp::Eq => l.loose_eq(r),
        CmpOp::NotEq => !l.loose_eq(r),
        CmpOp::Lt => l.compare(r, "<")? == Less,
        CmpOp::LtE => l.compare(r, "<=")? != Greater,
        CmpOp::Gt => l.compare(r, ">")? == Greater,
        CmpOp::GtE => l.compare(r, ">=")? != Less,
        CmpOp::In => contains(r, l)?,
        CmpOp::NotIn => !contains(r, l)?,
        CmpOp::Is => identical(l, r),
        CmpOp::IsNot => !identical(l, r),
    })
}

fn identical(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.iter().any(|v| v.loose_eq(item))),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if i < 0 { i + len } else { i };
    if (0..len).contains(&i) {
        usize::try_from(i).ok()
    } else {
        None
    }
}

fn subscript(v: &Value, index: &Value) -> Result<Value, EvalError> {
    let kind = match v {
        Value::Str(_) => "string",
        Value::List(_) => "list",
        other => {
            return Err(EvalError::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            )));
        }
    };
    let i = index.as_index().ok_or_else(|| {
        EvalError::type_error(format!(
            "{} indices must be integers, not '{}'",
            kind,
            index.type_name()
        ))
    })?;
    let out_of_range = || EvalError::runtime("IndexError", format!("{} index out of range", kind));

    match v {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let at = normalize_index(i, chars.len()).ok_or_else(out_of_range)?;
            Ok(Value::Str(chars[at].to_string()))
        }
        Value::List(items) => {
            let at = normalize_index(i, items.len()).ok_or_else(out_of_range)?;
            Ok(items[at].clone())
        }
        _ => Err(out_of_range()),
    }
}

fn slice_bound(
    bound: Option<&Value>,
    len: usize,
    default: usize,
) -> Result<usize, EvalError> {
    let i = match bound {
        None | Some(Value::None) => return Ok(default),
        Some(v) => v.as_index().ok_or_else(|| {
            EvalError::type_error(
                "slice indices must be integers or None or have an __index__ method",
            )
        })?,
    };
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamped = if i < 0 { (i + len_i).max(0) } else { i.min(len_i) };
    Ok(usize::try_from(clamped).unwrap_or(0))
}

fn slice(v: &Value, start: Option<&Value>, stop: Option<&Value>) -> Result<Value, EvalError> {
    match v {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let a = slice_bound(start, chars.len(), 0)?;
            let b = slice_bound(stop, chars.len(), chars.len())?;
            Ok(Value::Str(if a < b {
                chars[a..b].iter().collect()
            } else {
                String::new()
            }))
        }
        Value::List(items) => {
            let a = slice_bound(start, items.len(), 0)?;
            let b = slice_bound(stop, items.len(), items.len())?;
            Ok(Value::List(if a < b {
                items[a..b].to_vec()
            } else {
                Vec::new()
            }))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}
