use std::{
    cmp::Ordering,
    fs::{self, OpenOptions},
    io::Write,
};

use crate::{
    ast::BinaryOp,
    diagnostics::{Diagnostic, DiagnosticKind, Result, ScriptError},
    environment::EnvironmentRef,
    number::Integer,
    ops,
    runtime::ExecutionContext,
    value::{Numeric, Value, ValueKind},
};

#[allow(clippy::approx_constant)]
pub const PI: f64 = 3.14159265;
#[allow(clippy::approx_constant)]
pub const E: f64 = 2.7182818;

/// Binds the constants every fresh global scope starts with.
pub fn install(env: &EnvironmentRef) {
    let mut scope = env.borrow_mut();
    scope.define("PI", Value::float(PI));
    scope.define("e", Value::float(E));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }

    pub fn describe(self) -> String {
        match self {
            Arity::Exact(1) => "1 argument".to_string(),
            Arity::Exact(n) => format!("{n} arguments"),
            Arity::Between(min, max) => format!("{min} to {max} arguments"),
            Arity::AtLeast(1) => "at least 1 argument".to_string(),
            Arity::AtLeast(n) => format!("at least {n} arguments"),
        }
    }
}

type Callback = fn(&mut ExecutionContext, &[Value]) -> Result<Value>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub callback: Callback,
}

impl NativeFunction {
    pub fn call(&self, context: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
        if !self.arity.accepts(args.len()) {
            return Err(ScriptError::from(Diagnostic::new(
                DiagnosticKind::Arity,
                format!(
                    "`{}` expects {} but received {}",
                    self.name,
                    self.arity.describe(),
                    args.len()
                ),
            )));
        }
        (self.callback)(context, args)
    }
}

const fn native(name: &'static str, arity: Arity, callback: Callback) -> NativeFunction {
    NativeFunction {
        name,
        arity,
        callback,
    }
}

static BUILTINS: &[NativeFunction] = &[
    native("print", Arity::AtLeast(0), io_print),
    native("pprint", Arity::Exact(1), io_pprint),
    native("input", Arity::Between(0, 1), io_input),
    native("read", Arity::Exact(1), io_read),
    native("readLine", Arity::Exact(1), io_read_lines),
    native("write", Arity::Between(2, 3), io_write),
    native("len", Arity::Exact(1), collections_len),
    native("list", Arity::Between(0, 1), collections_list),
    native("set", Arity::Between(0, 1), collections_set),
    native("append", Arity::Exact(2), collections_append),
    native("pop", Arity::Exact(1), collections_pop),
    native("sum", Arity::Between(1, 2), collections_sum),
    native("sorted", Arity::Between(1, 2), collections_sorted),
    native("reversed", Arity::Exact(1), collections_reversed),
    native("all", Arity::Exact(1), collections_all),
    native("any", Arity::Exact(1), collections_any),
    native("range_list", Arity::Exact(2), collections_range_list),
    native("enumerate", Arity::Exact(1), collections_enumerate),
    native("zip", Arity::Exact(2), collections_zip),
    native("min", Arity::AtLeast(1), collections_min),
    native("max", Arity::AtLeast(1), collections_max),
    native("str", Arity::Exact(1), convert_str),
    native("int", Arity::Exact(1), convert_int),
    native("float", Arity::Exact(1), convert_float),
    native("bool", Arity::Exact(1), convert_bool),
    native("type", Arity::Exact(1), convert_type),
    native("repr", Arity::Exact(1), convert_repr),
    native("isinstance", Arity::Exact(2), convert_isinstance),
    native("abs", Arity::Exact(1), math_abs),
    native("ceil", Arity::Exact(1), math_ceil),
    native("floor", Arity::Exact(1), math_floor),
    native("round", Arity::Exact(1), math_round),
    native("pow", Arity::Exact(2), math_pow),
    native("sqrt", Arity::Exact(1), math_sqrt),
    native("exp", Arity::Exact(1), math_exp),
    native("log", Arity::Exact(1), math_log),
    native("log2", Arity::Exact(1), math_log2),
    native("log10", Arity::Exact(1), math_log10),
    native("sin", Arity::Exact(1), math_sin),
    native("cos", Arity::Exact(1), math_cos),
    native("tan", Arity::Exact(1), math_tan),
    native("cot", Arity::Exact(1), math_cot),
    native("sec", Arity::Exact(1), math_sec),
    native("csc", Arity::Exact(1), math_csc),
    native("asin", Arity::Exact(1), math_asin),
    native("acos", Arity::Exact(1), math_acos),
    native("atan", Arity::Exact(1), math_atan),
    native("acot", Arity::Exact(1), math_acot),
    native("asec", Arity::Exact(1), math_asec),
    native("acsc", Arity::Exact(1), math_acsc),
];

pub fn lookup(name: &str) -> Option<&'static NativeFunction> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

pub(crate) fn type_error(message: String) -> ScriptError {
    ScriptError::from(Diagnostic::type_error(message))
}

pub(crate) fn expect_string<'a>(value: &'a Value, name: &str) -> Result<&'a str> {
    match &*value.0 {
        ValueKind::String(s) => Ok(s),
        _ => Err(type_error(format!(
            "`{name}` expected a string but found {}",
            value.type_name()
        ))),
    }
}

pub(crate) fn expect_number(value: &Value, name: &str) -> Result<Numeric> {
    Numeric::of(value).ok_or_else(|| {
        type_error(format!(
            "`{name}` expected a number but found {}",
            value.type_name()
        ))
    })
}

fn expect_items(value: &Value, name: &str) -> Result<Vec<Value>> {
    match &*value.0 {
        ValueKind::List(items) | ValueKind::Set(items) => Ok(items.clone()),
        _ => Err(type_error(format!(
            "`{name}` expected a list but found {}",
            value.type_name()
        ))),
    }
}

fn io_error(name: &str, path: &str, err: std::io::Error) -> ScriptError {
    let mut diagnostic = Diagnostic::new(
        DiagnosticKind::Io,
        format!("`{name}` failed for `{path}`: {err}"),
    );
    if let Some(code) = err.raw_os_error() {
        diagnostic = diagnostic.with_note(format!("os error code: {code}"));
    }
    ScriptError::from(diagnostic)
}

fn io_print(context: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    context.write(&format!("{line}\n"))?;
    Ok(Value::none())
}

fn io_pprint(context: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    context.write(&format!("{}\n", args[0].repr()))?;
    Ok(Value::none())
}

fn io_input(context: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    if let Some(prompt) = args.first() {
        context.write(&prompt.to_string())?;
    }
    let line = context.read_line()?.unwrap_or_default();
    Ok(Value::string(line))
}

fn io_read(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let path = expect_string(&args[0], "read")?;
    fs::read_to_string(path)
        .map(Value::string)
        .map_err(|err| io_error("read", path, err))
}

fn io_read_lines(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let path = expect_string(&args[0], "readLine")?;
    let contents = fs::read_to_string(path).map_err(|err| io_error("readLine", path, err))?;
    Ok(Value::list(contents.lines().map(Value::string).collect()))
}

/// `write(path, data)` truncates; `write(path, data, "a")` appends.
fn io_write(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let path = expect_string(&args[0], "write")?;
    let append = match args.get(2) {
        None => false,
        Some(mode) => match expect_string(mode, "write")? {
            "w" => false,
            "a" => true,
            other => {
                return Err(ScriptError::from(Diagnostic::runtime(format!(
                    "`write` mode must be \"w\" or \"a\", found \"{other}\""
                ))));
            }
        },
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|err| io_error("write", path, err))?;
    file.write_all(args[1].to_string().as_bytes())
        .map_err(|err| io_error("write", path, err))?;
    Ok(Value::none())
}

pub(crate) fn length(value: &Value) -> Result<Value> {
    let len = match &*value.0 {
        ValueKind::String(s) => s.chars().count(),
        ValueKind::List(items) | ValueKind::Set(items) => items.len(),
        _ => {
            return Err(type_error(format!(
                "`len` is not defined for {}",
                value.type_name()
            )));
        }
    };
    Ok(Value::int(len as i64))
}

fn collections_len(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    length(&args[0])
}

fn collections_list(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let Some(source) = args.first() else {
        return Ok(Value::list(Vec::new()));
    };
    source
        .elements()
        .map(Value::list)
        .ok_or_else(|| type_error(format!("cannot build a list from {}", source.type_name())))
}

fn collections_set(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let Some(source) = args.first() else {
        return Ok(Value::set(Vec::new()));
    };
    source
        .elements()
        .map(Value::set)
        .ok_or_else(|| type_error(format!("cannot build a set from {}", source.type_name())))
}

fn collections_append(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    match &*args[0].0 {
        ValueKind::List(items) => {
            let mut extended = items.clone();
            extended.push(args[1].clone());
            Ok(Value::list(extended))
        }
        ValueKind::Set(items) => Ok(Value::set(
            items.iter().cloned().chain(std::iter::once(args[1].clone())),
        )),
        _ => Err(type_error(format!(
            "`append` expected a list but found {}",
            args[0].type_name()
        ))),
    }
}

/// Returns the last element; the list itself is left as it was.
fn collections_pop(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    match &*args[0].0 {
        ValueKind::List(items) => items.last().cloned().ok_or_else(|| {
            ScriptError::from(Diagnostic::runtime("`pop` from an empty list"))
        }),
        _ => Err(type_error(format!(
            "`pop` expected a list but found {}",
            args[0].type_name()
        ))),
    }
}

fn collections_sum(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let items = expect_items(&args[0], "sum")?;
    let mut total = args.get(1).cloned().unwrap_or_else(|| Value::int(0));
    for item in &items {
        total = ops::binary(BinaryOp::Add, &total, item)?;
    }
    Ok(total)
}

/// Stable ascending sort; fails if any two elements cannot be ordered.
pub(crate) fn sort_values(items: &mut [Value], name: &str) -> Result<()> {
    let mut incomparable = None;
    items.sort_by(|a, b| {
        a.compare(b).unwrap_or_else(|| {
            incomparable.get_or_insert_with(|| (a.type_name(), b.type_name()));
            Ordering::Equal
        })
    });
    match incomparable {
        Some((left, right)) => Err(type_error(format!(
            "`{name}` cannot order {left} and {right}"
        ))),
        None => Ok(()),
    }
}

fn collections_sorted(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let mut items = expect_items(&args[0], "sorted")?;
    let descending = args.get(1).is_some_and(Value::is_truthy);
    sort_values(&mut items, "sorted")?;
    if descending {
        items.reverse();
    }
    Ok(Value::list(items))
}

fn collections_reversed(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    match &*args[0].0 {
        ValueKind::List(items) => Ok(Value::list(items.iter().rev().cloned().collect())),
        ValueKind::String(s) => Ok(Value::string(s.chars().rev().collect::<String>())),
        _ => Err(type_error(format!(
            "`reversed` is not defined for {}",
            args[0].type_name()
        ))),
    }
}

fn collections_all(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let items = expect_items(&args[0], "all")?;
    Ok(Value::flag(items.iter().all(Value::is_truthy)))
}

fn collections_any(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let items = expect_items(&args[0], "any")?;
    Ok(Value::flag(items.iter().any(Value::is_truthy)))
}

/// Inclusive on both ends, counting down when `start > end`.
fn collections_range_list(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let (Numeric::Int(start), Numeric::Int(end)) = (
        expect_number(&args[0], "range_list")?,
        expect_number(&args[1], "range_list")?,
    ) else {
        return Err(type_error("`range_list` expects integer bounds".to_string()));
    };
    let step = Integer::from(if start <= end { 1 } else { -1 });
    let mut items = Vec::new();
    let mut current = start.clone();
    while (start <= end && current <= end) || (start > end && current >= end) {
        items.push(Value::integer(current.clone()));
        current = current.add(&step);
    }
    Ok(Value::list(items))
}

fn iterable(value: &Value, name: &str) -> Result<Vec<Value>> {
    value.elements().ok_or_else(|| {
        type_error(format!(
            "`{name}` expected a list, set or string but found {}",
            value.type_name()
        ))
    })
}

/// `[[0, first], [1, second], ...]`
fn collections_enumerate(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let pairs = iterable(&args[0], "enumerate")?
        .into_iter()
        .enumerate()
        .map(|(idx, item)| Value::list(vec![Value::int(idx as i64), item]))
        .collect();
    Ok(Value::list(pairs))
}

/// Pairs elements up to the shorter of the two inputs.
fn collections_zip(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let left = iterable(&args[0], "zip")?;
    let right = iterable(&args[1], "zip")?;
    let pairs = left
        .into_iter()
        .zip(right)
        .map(|(a, b)| Value::list(vec![a, b]))
        .collect();
    Ok(Value::list(pairs))
}

fn extreme(args: &[Value], name: &str, wanted: Ordering) -> Result<Value> {
    let candidates = match args {
        [single] => expect_items(single, name)?,
        many => many.to_vec(),
    };
    let mut iter = candidates.into_iter();
    let mut best = iter.next().ok_or_else(|| {
        ScriptError::from(Diagnostic::runtime(format!("`{name}` of an empty list")))
    })?;
    for candidate in iter {
        let ordering = candidate.compare(&best).ok_or_else(|| {
            type_error(format!(
                "`{name}` cannot compare {} and {}",
                candidate.type_name(),
                best.type_name()
            ))
        })?;
        if ordering == wanted {
            best = candidate;
        }
    }
    Ok(best)
}

fn collections_min(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    extreme(args, "min", Ordering::Less)
}

fn collections_max(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    extreme(args, "max", Ordering::Greater)
}

fn convert_str(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(args[0].to_string()))
}

fn convert_int(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let value = &args[0];
    let not_finite = || type_error(format!("cannot convert {value} to int"));
    match &*value.0 {
        ValueKind::Int(_) => Ok(value.clone()),
        ValueKind::Bool(b) => Ok(Value::int(i64::from(*b))),
        ValueKind::Float(f) => Integer::from_f64(*f).map(Value::integer).ok_or_else(not_finite),
        ValueKind::String(s) => {
            let text = s.trim();
            if let Ok(n) = text.parse::<Integer>() {
                return Ok(Value::integer(n));
            }
            text.parse::<f64>()
                .ok()
                .and_then(Integer::from_f64)
                .map(Value::integer)
                .ok_or_else(|| type_error(format!("invalid literal for int(): {}", value.repr())))
        }
        _ => Err(type_error(format!(
            "cannot convert {} to int",
            value.type_name()
        ))),
    }
}

fn convert_float(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let value = &args[0];
    if let Some(number) = Numeric::of(value) {
        return Ok(Value::float(number.to_f64()));
    }
    match &*value.0 {
        ValueKind::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::float)
            .map_err(|_| type_error(format!("invalid literal for float(): {}", value.repr()))),
        _ => Err(type_error(format!(
            "cannot convert {} to float",
            value.type_name()
        ))),
    }
}

fn convert_bool(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    Ok(Value::bool(args[0].is_truthy()))
}

fn convert_type(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(args[0].type_name()))
}

fn convert_repr(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(args[0].repr()))
}

fn convert_isinstance(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    let expected = expect_string(&args[1], "isinstance")?;
    Ok(Value::flag(args[0].type_name() == expected))
}

fn math_abs(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    match expect_number(&args[0], "abs")? {
        Numeric::Int(n) => Ok(Value::integer(n.abs())),
        Numeric::Float(f) => Ok(Value::float(f.abs())),
    }
}

/// Rounds floats to an Int with `round_fn`; integers pass through.
fn to_integer(args: &[Value], name: &str, round_fn: fn(f64) -> f64) -> Result<Value> {
    match expect_number(&args[0], name)? {
        Numeric::Int(n) => Ok(Value::integer(n)),
        Numeric::Float(f) => Integer::from_f64(round_fn(f))
            .map(Value::integer)
            .ok_or_else(|| type_error(format!("`{name}` cannot round {}", args[0]))),
    }
}

fn math_ceil(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    to_integer(args, "ceil", f64::ceil)
}

fn math_floor(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    to_integer(args, "floor", f64::floor)
}

fn math_round(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    to_integer(args, "round", f64::round)
}

fn math_pow(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    Ok(ops::binary(BinaryOp::Pow, &args[0], &args[1])?)
}

fn float_fn(args: &[Value], name: &str, f: impl Fn(f64) -> f64) -> Result<Value> {
    let x = expect_number(&args[0], name)?.to_f64();
    Ok(Value::float(f(x)))
}

fn math_sqrt(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "sqrt", f64::sqrt)
}

fn math_exp(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "exp", f64::exp)
}

fn math_log(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "log", f64::ln)
}

fn math_log2(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "log2", f64::log2)
}

fn math_log10(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "log10", f64::log10)
}

fn math_sin(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "sin", f64::sin)
}

fn math_cos(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "cos", f64::cos)
}

fn math_tan(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "tan", f64::tan)
}

fn math_cot(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "cot", |x| 1.0 / x.tan())
}

fn math_sec(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "sec", |x| 1.0 / x.cos())
}

fn math_csc(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "csc", |x| 1.0 / x.sin())
}

fn math_asin(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "asin", f64::asin)
}

fn math_acos(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "acos", f64::acos)
}

fn math_atan(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "atan", f64::atan)
}

fn math_acot(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "acot", |x| (1.0 / x).atan())
}

fn math_asec(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "asec", |x| (1.0 / x).acos())
}

fn math_acsc(_: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
    float_fn(args, "acsc", |x| (1.0 / x).asin())
}
