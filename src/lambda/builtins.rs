//! The allow-list: every name a lambda body may resolve besides its own
//! parameter, plus the string methods reachable through attribute access.
//!
//! Nothing here touches the filesystem, network, processes or environment.

use super::EvalError;
use super::value::Value;
use std::cmp::Ordering;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

/// Longest sequence a lambda may build; longer results raise `MemoryError`.
pub const MAX_SEQUENCE_LEN: usize = 1 << 20;

const ALLOWED: [Builtin; 18] = [
    Builtin { name: "str", func: builtin_str },
    Builtin { name: "int", func: builtin_int },
    Builtin { name: "float", func: builtin_float },
    Builtin { name: "bool", func: builtin_bool },
    Builtin { name: "len", func: builtin_len },
    Builtin { name: "abs", func: builtin_abs },
    Builtin { name: "min", func: builtin_min },
    Builtin { name: "max", func: builtin_max },
    Builtin { name: "list", func: builtin_list },
    Builtin { name: "sorted", func: builtin_sorted },
    Builtin { name: "lower", func: helper_lower },
    Builtin { name: "upper", func: helper_upper },
    Builtin { name: "strip", func: helper_strip },
    Builtin { name: "split", func: helper_split },
    Builtin { name: "join", func: helper_join },
    Builtin { name: "replace", func: helper_replace },
    Builtin { name: "basename", func: helper_basename },
    Builtin { name: "dirname", func: helper_dirname },
];

const STR_METHODS: [&str; 14] = [
    "lower",
    "upper",
    "strip",
    "lstrip",
    "rstrip",
    "split",
    "replace",
    "startswith",
    "endswith",
    "join",
    "find",
    "count",
    "zfill",
    "isdigit",
];

pub fn lookup(name: &str) -> Option<Builtin> {
    ALLOWED.iter().find(|b| b.name == name).copied()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    ALLOWED.iter().map(|b| b.name)
}

pub fn is_str_method(name: &str) -> bool {
    STR_METHODS.contains(&name)
}

fn expect_args(fname: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("exactly {}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvalError::type_error(format!(
            "{}() takes {} argument(s) ({} given)",
            fname,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn str_arg<'a>(fname: &str, v: &'a Value) -> Result<&'a str, EvalError> {
    v.as_str().ok_or_else(|| {
        EvalError::type_error(format!(
            "{}() argument must be str, not '{}'",
            fname,
            v.type_name()
        ))
    })
}

/// Items of a str (as one-character strings) or a list.
fn iterate(v: &Value) -> Result<Vec<Value>, EvalError> {
    match v {
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::List(items) => Ok(items.clone()),
        other => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn builtin_str(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("str", args, 0, 1)?;
    Ok(Value::Str(args.first().map(Value::to_string).unwrap_or_default()))
}

fn builtin_int(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("int", args, 1, 1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Ok(Value::Int(f.trunc() as i64)),
        Value::Float(f) => Err(EvalError::runtime(
            "OverflowError",
            format!("cannot convert float {} to integer", f),
        )),
        Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
            EvalError::value_error(format!(
                "invalid literal for int() with base 10: {}",
                args[0].repr()
            ))
        }),
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_float(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("float", args, 1, 1)?;
    if let Some(n) = args[0].as_num() {
        return Ok(Value::Float(n.as_f64()));
    }
    match &args[0] {
        Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
            EvalError::value_error(format!(
                "could not convert string to float: {}",
                args[0].repr()
            ))
        }),
        other => Err(EvalError::type_error(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_bool(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("bool", args, 0, 1)?;
    Ok(Value::Bool(args.first().map(Value::truthy).unwrap_or(false)))
}

fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("len", args, 1, 1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(n as i64))
}

fn builtin_abs(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("abs", args, 1, 1)?;
    match &args[0] {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        v => match v.as_index() {
            Some(i) => i
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| EvalError::runtime("OverflowError", "integer overflow")),
            None => Err(EvalError::type_error(format!(
                "bad operand type for abs(): '{}'",
                v.type_name()
            ))),
        },
    }
}

fn extremum(fname: &str, args: &[Value], want: Ordering) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::type_error(format!(
            "{} expected at least 1 argument, got 0",
            fname
        )));
    }
    let items = if args.len() == 1 {
        iterate(&args[0])?
    } else {
        args.to_vec()
    };
    let mut iter = items.into_iter();
    let mut best = iter.next().ok_or_else(|| {
        EvalError::value_error(format!("{}() arg is an empty sequence", fname))
    })?;
    for item in iter {
        if item.compare(&best, if want == Ordering::Less { "<" } else { ">" })? == want {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_min(args: &[Value]) -> Result<Value, EvalError> {
    extremum("min", args, Ordering::Less)
}

fn builtin_max(args: &[Value]) -> Result<Value, EvalError> {
    extremum("max", args, Ordering::Greater)
}

fn builtin_list(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("list", args, 0, 1)?;
    match args.first() {
        Some(v) => Ok(Value::List(iterate(v)?)),
        None => Ok(Value::List(Vec::new())),
    }
}

fn builtin_sorted(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("sorted", args, 1, 1)?;
    let mut items = iterate(&args[0])?;
    let mut failure = None;
    items.sort_by(|a, b| match a.compare(b, "<") {
        Ok(ord) => ord,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(Value::List(items)),
    }
}

fn helper_lower(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("lower", args, 1, 1)?;
    call_str_method(str_arg("lower", &args[0])?, "lower", &[])
}

fn helper_upper(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("upper", args, 1, 1)?;
    call_str_method(str_arg("upper", &args[0])?, "upper", &[])
}

fn helper_strip(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("strip", args, 1, 2)?;
    call_str_method(str_arg("strip", &args[0])?, "strip", &args[1..])
}

/// `split(s[, sep])`
fn helper_split(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("split", args, 1, 2)?;
    call_str_method(str_arg("split", &args[0])?, "split", &args[1..])
}

/// `join(items, sep)`
fn helper_join(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("join", args, 2, 2)?;
    call_str_method(str_arg("join", &args[1])?, "join", &args[..1])
}

/// `replace(s, old, new)`
fn helper_replace(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("replace", args, 3, 3)?;
    call_str_method(str_arg("replace", &args[0])?, "replace", &args[1..])
}

fn helper_basename(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("basename", args, 1, 1)?;
    let path = str_arg("basename", &args[0])?;
    let base = path.rsplit('/').next().unwrap_or(path);
    Ok(Value::Str(base.to_string()))
}

fn helper_dirname(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("dirname", args, 1, 1)?;
    let path = str_arg("dirname", &args[0])?;
    let head = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "",
    };
    let trimmed = head.trim_end_matches('/');
    Ok(Value::Str(if trimmed.is_empty() { head } else { trimmed }.to_string()))
}

/// Dispatch `recv.<name>(args)` for a string receiver.
pub fn call_str_method(recv: &str, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let text = |s: String| Ok(Value::Str(s));
    match name {
        "lower" => {
            expect_args("lower", args, 0, 0)?;
            text(recv.to_lowercase())
        }
        "upper" => {
            expect_args("upper", args, 0, 0)?;
            text(recv.to_uppercase())
        }
        "strip" | "lstrip" | "rstrip" => {
            expect_args(name, args, 0, 1)?;
            let set: Option<Vec<char>> = match args.first() {
                None | Some(Value::None) => None,
                Some(v) => Some(str_arg(name, v)?.chars().collect()),
            };
            let pred = |c: char| match &set {
                Some(chars) => chars.contains(&c),
                None => c.is_whitespace(),
            };
            let out = match name {
                "lstrip" => recv.trim_start_matches(pred),
                "rstrip" => recv.trim_end_matches(pred),
                _ => recv.trim_matches(pred),
            };
            text(out.to_string())
        }
        "split" => {
            expect_args("split", args, 0, 1)?;
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::None) => recv
                    .split_whitespace()
                    .map(|p| Value::Str(p.to_string()))
                    .collect(),
                Some(v) => {
                    let sep = str_arg("split", v)?;
                    if sep.is_empty() {
                        return Err(EvalError::value_error("empty separator"));
                    }
                    recv.split(sep).map(|p| Value::Str(p.to_string())).collect()
                }
            };
            Ok(Value::List(parts))
        }
        "replace" => {
            expect_args("replace", args, 2, 2)?;
            let old = str_arg("replace", &args[0])?;
            let new = str_arg("replace", &args[1])?;
            let out = recv.replace(old, new);
            if out.chars().count() > MAX_SEQUENCE_LEN {
                return Err(EvalError::memory_error());
            }
            text(out)
        }
        "startswith" | "endswith" => {
            expect_args(name, args, 1, 1)?;
            let affix = str_arg(name, &args[0])?;
            Ok(Value::Bool(if name == "startswith" {
                recv.starts_with(affix)
            } else {
                recv.ends_with(affix)
            }))
        }
        "join" => {
            expect_args("join", args, 1, 1)?;
            let items = iterate(&args[0])?;
            let mut parts = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Str(s) => parts.push(s.as_str()),
                    other => {
                        return Err(EvalError::type_error(format!(
                            "sequence item {}: expected str instance, {} found",
                            i,
                            other.type_name()
                        )));
                    }
                }
            }
            let out = parts.join(recv);
            if out.chars().count() > MAX_SEQUENCE_LEN {
                return Err(EvalError::memory_error());
            }
            text(out)
        }
        "find" => {
            expect_args("find", args, 1, 1)?;
            let needle = str_arg("find", &args[0])?;
            let pos = recv
                .find(needle)
                .map(|byte| recv[..byte].chars().count() as i64)
                .unwrap_or(-1);
            Ok(Value::Int(pos))
        }
        "count" => {
            expect_args("count", args, 1, 1)?;
            let needle = str_arg("count", &args[0])?;
            let n = if needle.is_empty() {
                recv.chars().count() + 1
            } else {
                recv.matches(needle).count()
            };
            Ok(Value::Int(n as i64))
        }
        "zfill" => {
            expect_args("zfill", args, 1, 1)?;
            let width = args[0].as_index().ok_or_else(|| {
                EvalError::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    args[0].type_name()
                ))
            })?;
            let len = recv.chars().count();
            let width = usize::try_from(width).unwrap_or(0);
            if width > MAX_SEQUENCE_LEN {
                return Err(EvalError::memory_error());
            }
            if width <= len {
                return text(recv.to_string());
            }
            let (sign, digits) = match recv.chars().next() {
                Some(c @ ('+' | '-')) => (c.to_string(), &recv[1..]),
                _ => (String::new(), recv),
            };
            text(format!("{}{}{}", sign, "0".repeat(width - len), digits))
        }
        "isdigit" => {
            expect_args("isdigit", args, 0, 0)?;
            Ok(Value::Bool(
                !recv.is_empty() && recv.chars().all(|c| c.is_ascii_digit()),
            ))
        }
        other => Err(EvalError::attribute_error(format!(
            "'str' object has no attribute '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        lookup(name).unwrap().call(args)
    }

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    #[test]
    fn allow_list_is_closed() {
        assert!(lookup("len").is_some());
        assert!(lookup("open").is_none());
        assert!(lookup("eval").is_none());
        assert!(lookup("__import__").is_none());
        assert!(names().all(|n| !n.starts_with("__")));
    }

    #[test]
    fn conversions() {
        assert_eq!(call("int", &[s(" 42 ")]).unwrap().to_string(), "42");
        assert_eq!(
            call("int", &[s("Some test value")]).unwrap_err().to_string(),
            "ValueError: invalid literal for int() with base 10: 'Some test value'"
        );
        assert_eq!(call("float", &[Value::Int(2)]).unwrap().to_string(), "2.0");
        assert_eq!(call("str", &[Value::Bool(false)]).unwrap().to_string(), "False");
    }

    #[test]
    fn path_helpers() {
        assert_eq!(call("basename", &[s("/data/a/b.txt")]).unwrap().to_string(), "b.txt");
        assert_eq!(call("dirname", &[s("/data/a/b.txt")]).unwrap().to_string(), "/data/a");
        assert_eq!(call("dirname", &[s("/b")]).unwrap().to_string(), "/");
        assert_eq!(call("dirname", &[s("b")]).unwrap().to_string(), "");
    }

    #[test]
    fn string_helpers() {
        assert_eq!(
            call("split", &[s("a,b"), s(",")]).unwrap().to_string(),
            "['a', 'b']"
        );
        assert_eq!(
            call("join", &[Value::List(vec![s("a"), s("b")]), s("-")])
                .unwrap()
                .to_string(),
            "a-b"
        );
        assert_eq!(call("replace", &[s("a.b"), s("."), s("/")]).unwrap().to_string(), "a/b");
        assert_eq!(call_str_method("7", "zfill", &[Value::Int(3)]).unwrap().to_string(), "007");
        assert_eq!(call_str_method("xxhixx", "strip", &[s("x")]).unwrap().to_string(), "hi");
    }

    #[test]
    fn sorted_and_extrema() {
        let list = Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(call("sorted", &[list.clone()]).unwrap().to_string(), "[1, 2, 3]");
        assert_eq!(call("max", &[list]).unwrap().to_string(), "3");
        assert_eq!(call("min", &[Value::Int(4), Value::Float(1.5)]).unwrap().to_string(), "1.5");
        assert!(call("sorted", &[Value::List(vec![Value::Int(1), s("a")])]).is_err());
        assert!(call("max", &[Value::List(vec![])]).is_err());
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!(
            call("len", &[]).unwrap_err().to_string(),
            "TypeError: len() takes exactly 1 argument(s) (0 given)"
        );
    }
}
