//! Dot methods: `"text".upper()`, `[3, 1].sort()`, `{1}.add(2)`.
//!
//! Methods never modify their receiver; each returns a new value. A call
//! is resolved by receiver type, then name, then argument count.

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, ScriptError},
    stdlib::{self, Arity, expect_number, expect_string, type_error},
    value::{Numeric, Value, ValueKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    Any,
    String,
    List,
    Set,
}

impl Receiver {
    fn admits(self, value: &Value) -> bool {
        match self {
            Receiver::Any => true,
            Receiver::String => matches!(&*value.0, ValueKind::String(_)),
            Receiver::List => matches!(&*value.0, ValueKind::List(_)),
            Receiver::Set => matches!(&*value.0, ValueKind::Set(_)),
        }
    }
}

type MethodFn = fn(&Value, &[Value]) -> Result<Value>;

struct Method {
    receiver: Receiver,
    name: &'static str,
    arity: Arity,
    callback: MethodFn,
}

const fn method(
    receiver: Receiver,
    name: &'static str,
    arity: Arity,
    callback: MethodFn,
) -> Method {
    Method {
        receiver,
        name,
        arity,
        callback,
    }
}

// Type specific entries come before the `Any` ones so they win on lookup.
static METHODS: &[Method] = &[
    method(Receiver::String, "upper", Arity::Exact(0), string_upper),
    method(Receiver::String, "lower", Arity::Exact(0), string_lower),
    method(Receiver::String, "strip", Arity::Exact(0), string_strip),
    method(Receiver::String, "capitalize", Arity::Exact(0), string_capitalize),
    method(Receiver::String, "title", Arity::Exact(0), string_title),
    method(Receiver::String, "reverse", Arity::Exact(0), string_reverse),
    method(Receiver::String, "isdigit", Arity::Exact(0), string_isdigit),
    method(Receiver::String, "isalpha", Arity::Exact(0), string_isalpha),
    method(Receiver::String, "split", Arity::Between(0, 1), string_split),
    method(Receiver::String, "find", Arity::Exact(1), string_find),
    method(Receiver::String, "count", Arity::Exact(1), string_count),
    method(Receiver::String, "contains", Arity::Exact(1), string_contains),
    method(Receiver::String, "startswith", Arity::Exact(1), string_startswith),
    method(Receiver::String, "endswith", Arity::Exact(1), string_endswith),
    method(Receiver::String, "replace", Arity::Exact(2), string_replace),
    method(Receiver::String, "slice", Arity::Exact(2), string_slice),
    method(Receiver::List, "sort", Arity::Exact(0), list_sort),
    method(Receiver::List, "reverse", Arity::Exact(0), list_reverse),
    method(Receiver::List, "contains", Arity::Exact(1), items_contains),
    method(Receiver::List, "count", Arity::Exact(1), list_count),
    method(Receiver::List, "index", Arity::Exact(1), list_index),
    method(Receiver::Set, "add", Arity::Exact(1), set_add),
    method(Receiver::Set, "remove", Arity::Exact(1), set_remove),
    method(Receiver::Set, "contains", Arity::Exact(1), items_contains),
    method(Receiver::Any, "type", Arity::Exact(0), any_type),
    method(Receiver::Any, "str", Arity::Exact(0), any_str),
    method(Receiver::Any, "len", Arity::Exact(0), any_len),
];

pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
    let mut candidates = METHODS
        .iter()
        .filter(|m| m.name == name && m.receiver.admits(receiver))
        .peekable();
    if candidates.peek().is_none() {
        return Err(ScriptError::from(Diagnostic::type_error(format!(
            "unknown method `{name}` on {}",
            receiver.type_name()
        ))));
    }
    let mut expected = None;
    for candidate in candidates {
        if candidate.arity.accepts(args.len()) {
            return (candidate.callback)(receiver, args);
        }
        expected.get_or_insert(candidate.arity);
    }
    let expected = expected.map(Arity::describe).unwrap_or_default();
    Err(ScriptError::from(Diagnostic::new(
        DiagnosticKind::Arity,
        format!(
            "method `{name}` on {} expects {expected} but received {}",
            receiver.type_name(),
            args.len()
        ),
    )))
}

fn text(receiver: &Value) -> &str {
    match &*receiver.0 {
        ValueKind::String(s) => s,
        _ => "",
    }
}

fn items(receiver: &Value) -> &[Value] {
    match &*receiver.0 {
        ValueKind::List(items) | ValueKind::Set(items) => items,
        _ => &[],
    }
}

fn string_upper(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::string(text(receiver).to_uppercase()))
}

fn string_lower(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::string(text(receiver).to_lowercase()))
}

fn string_strip(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::string(text(receiver).trim()))
}

fn string_capitalize(receiver: &Value, _: &[Value]) -> Result<Value> {
    let mut chars = text(receiver).chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    Ok(Value::string(capitalized))
}

/// Upper-cases every letter that follows a non-letter.
fn string_title(receiver: &Value, _: &[Value]) -> Result<Value> {
    let mut titled = String::with_capacity(text(receiver).len());
    let mut after_letter = false;
    for ch in text(receiver).chars() {
        if after_letter {
            titled.extend(ch.to_lowercase());
        } else {
            titled.extend(ch.to_uppercase());
        }
        after_letter = ch.is_alphabetic();
    }
    Ok(Value::string(titled))
}

fn string_reverse(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::string(text(receiver).chars().rev().collect::<String>()))
}

fn string_isdigit(receiver: &Value, _: &[Value]) -> Result<Value> {
    let s = text(receiver);
    Ok(Value::bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
}

fn string_isalpha(receiver: &Value, _: &[Value]) -> Result<Value> {
    let s = text(receiver);
    Ok(Value::bool(!s.is_empty() && s.chars().all(char::is_alphabetic)))
}

/// Without an argument, splits on runs of whitespace.
fn string_split(receiver: &Value, args: &[Value]) -> Result<Value> {
    let s = text(receiver);
    let parts: Vec<Value> = match args.first() {
        None => s.split_whitespace().map(Value::string).collect(),
        Some(separator) => {
            let separator = expect_string(separator, "split")?;
            if separator.is_empty() {
                return Err(ScriptError::from(Diagnostic::runtime(
                    "`split` separator cannot be empty",
                )));
            }
            s.split(separator).map(Value::string).collect()
        }
    };
    Ok(Value::list(parts))
}

/// Character index of the first occurrence, or -1.
fn string_find(receiver: &Value, args: &[Value]) -> Result<Value> {
    let s = text(receiver);
    let needle = expect_string(&args[0], "find")?;
    let index = match s.find(needle) {
        Some(byte) => s[..byte].chars().count() as i64,
        None => -1,
    };
    Ok(Value::int(index))
}

fn string_count(receiver: &Value, args: &[Value]) -> Result<Value> {
    let needle = expect_string(&args[0], "count")?;
    Ok(Value::int(text(receiver).matches(needle).count() as i64))
}

fn string_contains(receiver: &Value, args: &[Value]) -> Result<Value> {
    let needle = expect_string(&args[0], "contains")?;
    Ok(Value::bool(text(receiver).contains(needle)))
}

fn string_startswith(receiver: &Value, args: &[Value]) -> Result<Value> {
    let prefix = expect_string(&args[0], "startswith")?;
    Ok(Value::bool(text(receiver).starts_with(prefix)))
}

fn string_endswith(receiver: &Value, args: &[Value]) -> Result<Value> {
    let suffix = expect_string(&args[0], "endswith")?;
    Ok(Value::bool(text(receiver).ends_with(suffix)))
}

fn string_replace(receiver: &Value, args: &[Value]) -> Result<Value> {
    let from = expect_string(&args[0], "replace")?;
    let to = expect_string(&args[1], "replace")?;
    Ok(Value::string(text(receiver).replace(from, to)))
}

/// Characters `start..end`; negative bounds count from the end and both
/// are clamped to the string.
fn string_slice(receiver: &Value, args: &[Value]) -> Result<Value> {
    let chars: Vec<char> = text(receiver).chars().collect();
    let start = slice_bound(&args[0], chars.len())?;
    let end = slice_bound(&args[1], chars.len())?;
    let sliced = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(Value::string(sliced))
}

fn slice_bound(value: &Value, len: usize) -> Result<usize> {
    let Numeric::Int(bound) = expect_number(value, "slice")? else {
        return Err(type_error(format!(
            "`slice` bounds must be integers, found {value}"
        )));
    };
    let len = len as i64;
    let bound = match bound.to_i64() {
        Some(n) if n < 0 => (n + len).max(0),
        Some(n) => n.min(len),
        None if bound.is_negative() => 0,
        None => len,
    };
    Ok(bound as usize)
}

fn list_sort(receiver: &Value, _: &[Value]) -> Result<Value> {
    let mut sorted = items(receiver).to_vec();
    stdlib::sort_values(&mut sorted, "sort")?;
    Ok(Value::list(sorted))
}

fn list_reverse(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::list(items(receiver).iter().rev().cloned().collect()))
}

fn items_contains(receiver: &Value, args: &[Value]) -> Result<Value> {
    Ok(Value::bool(items(receiver).iter().any(|item| item.loose_eq(&args[0]))))
}

fn list_count(receiver: &Value, args: &[Value]) -> Result<Value> {
    let count = items(receiver)
        .iter()
        .filter(|item| item.loose_eq(&args[0]))
        .count();
    Ok(Value::int(count as i64))
}

/// Position of the first equal element, or -1.
fn list_index(receiver: &Value, args: &[Value]) -> Result<Value> {
    let index = items(receiver)
        .iter()
        .position(|item| item.loose_eq(&args[0]))
        .map_or(-1, |idx| idx as i64);
    Ok(Value::int(index))
}

fn set_add(receiver: &Value, args: &[Value]) -> Result<Value> {
    Ok(Value::set(
        items(receiver).iter().cloned().chain([args[0].clone()]),
    ))
}

fn set_remove(receiver: &Value, args: &[Value]) -> Result<Value> {
    let members = items(receiver);
    if !members.iter().any(|item| item.loose_eq(&args[0])) {
        return Err(ScriptError::from(Diagnostic::runtime(format!(
            "`remove`: {} is not in the set",
            args[0].repr()
        ))));
    }
    Ok(Value::set(
        members
            .iter()
            .filter(|item| !item.loose_eq(&args[0]))
            .cloned(),
    ))
}

fn any_type(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::string(receiver.type_name()))
}

fn any_str(receiver: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::string(receiver.to_string()))
}

fn any_len(receiver: &Value, _: &[Value]) -> Result<Value> {
    stdlib::length(receiver)
}
