use std::{cmp::Ordering, fmt, rc::Rc};

use crate::{ast::FunctionDecl, environment::EnvironmentRef, number::Integer};

#[derive(Clone)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn none() -> Self {
        Self::new(ValueKind::None)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Bool(value))
    }

    /// Comparison and logic results: Int `1` or `0`.
    pub fn flag(value: bool) -> Self {
        Self::int(i64::from(value))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ValueKind::Int(Integer::Small(value)))
    }

    pub fn integer(value: Integer) -> Self {
        Self::new(ValueKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ValueKind::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String(value.into()))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Self::new(ValueKind::List(values))
    }

    /// Builds a set, dropping elements equal to one already kept.
    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for value in values {
            if !unique.iter().any(|kept| kept.loose_eq(&value)) {
                unique.push(value);
            }
        }
        Self::new(ValueKind::Set(unique))
    }

    pub fn is_none(&self) -> bool {
        matches!(&*self.0, ValueKind::None)
    }

    pub fn is_truthy(&self) -> bool {
        match &*self.0 {
            ValueKind::None => false,
            ValueKind::Bool(b) => *b,
            ValueKind::Int(n) => !n.is_zero(),
            ValueKind::Float(f) => *f != 0.0,
            ValueKind::String(s) => !s.is_empty(),
            ValueKind::List(values) | ValueKind::Set(values) => !values.is_empty(),
            ValueKind::Function(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            ValueKind::None => "none",
            ValueKind::Bool(_) => "bool",
            ValueKind::Int(_) => "int",
            ValueKind::Float(_) => "float",
            ValueKind::String(_) => "string",
            ValueKind::List(_) => "list",
            ValueKind::Set(_) => "set",
            ValueKind::Function(_) => "function",
        }
    }

    /// Elements of a list or set, or the characters of a string.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match &*self.0 {
            ValueKind::List(values) | ValueKind::Set(values) => Some(values.clone()),
            ValueKind::String(text) => {
                Some(text.chars().map(|c| Value::string(c.to_string())).collect())
            }
            _ => None,
        }
    }

    /// Value equality. Numbers (bools included) compare numerically; any
    /// other pair of different kinds is unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (Numeric::of(self), Numeric::of(other)) {
            return a.compare(&b) == Some(Ordering::Equal);
        }
        match (&*self.0, &*other.0) {
            (ValueKind::None, ValueKind::None) => true,
            (ValueKind::String(a), ValueKind::String(b)) => a == b,
            (ValueKind::List(a), ValueKind::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(l, r)| l.loose_eq(r))
            }
            (ValueKind::Set(a), ValueKind::Set(b)) => {
                a.len() == b.len() && a.iter().all(|l| b.iter().any(|r| l.loose_eq(r)))
            }
            (ValueKind::Function(a), ValueKind::Function(b)) => {
                a.overloads.len() == b.overloads.len()
                    && a.overloads
                        .iter()
                        .zip(&b.overloads)
                        .all(|(l, r)| Rc::ptr_eq(&l.decl, &r.decl))
            }
            _ => false,
        }
    }

    /// Equality that also requires both sides to have the same type, so
    /// `10 points 10.0` is false.
    pub fn identical(&self, other: &Value) -> bool {
        self.type_name() == other.type_name() && self.loose_eq(other)
    }

    /// Ordering for `<`, `<=`, `>`, `>=`; `None` when the kinds cannot be
    /// ordered against each other.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (Numeric::of(self), Numeric::of(other)) {
            return a.compare(&b);
        }
        match (&*self.0, &*other.0) {
            (ValueKind::String(a), ValueKind::String(b)) => Some(a.cmp(b)),
            (ValueKind::List(a), ValueKind::List(b)) => {
                for (l, r) in a.iter().zip(b) {
                    match l.compare(r)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// Quoted form used for strings nested in containers, `repr` and
    /// `pprint`.
    pub fn repr(&self) -> String {
        match &*self.0 {
            ValueKind::String(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for ch in s.chars() {
                    match ch {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        other => out.push(other),
                    }
                }
                out.push('"');
                out
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::None => write!(f, "None"),
            ValueKind::Bool(true) => write!(f, "True"),
            ValueKind::Bool(false) => write!(f, "False"),
            ValueKind::Int(n) => write!(f, "{n}"),
            ValueKind::Float(n) => write!(f, "{}", crate::number::format_float(*n)),
            ValueKind::String(s) => write!(f, "{s}"),
            ValueKind::List(values) => write_items(f, "[", values, "]"),
            ValueKind::Set(values) => write_items(f, "{", values, "}"),
            ValueKind::Function(set) => write!(f, "<fn {}>", set.name),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, values: &[Value], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", value.repr())?;
    }
    write!(f, "{close}")
}

#[derive(Clone)]
pub enum ValueKind {
    None,
    Bool(bool),
    Int(Integer),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Unique by `loose_eq`; kept in insertion order.
    Set(Vec<Value>),
    Function(FunctionSet),
}

#[derive(Clone)]
pub struct UserFunction {
    pub decl: Rc<FunctionDecl>,
    /// Scope the function was defined in; call frames are parented here.
    pub env: EnvironmentRef,
}

impl UserFunction {
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

/// Every `fn` bound under one name, at most one per parameter count.
#[derive(Clone)]
pub struct FunctionSet {
    pub name: String,
    pub overloads: Vec<UserFunction>,
}

impl FunctionSet {
    pub fn single(function: UserFunction) -> Self {
        Self {
            name: function.decl.name.clone(),
            overloads: vec![function],
        }
    }

    /// Adds `function`, replacing the overload with the same parameter
    /// count. A forward declaration never replaces a definition.
    pub fn with(&self, function: UserFunction) -> Self {
        let mut overloads = self.overloads.clone();
        match overloads.iter().position(|f| f.arity() == function.arity()) {
            Some(_) if function.decl.body.is_none() => {}
            Some(idx) => overloads[idx] = function,
            None => overloads.push(function),
        }
        Self {
            name: self.name.clone(),
            overloads,
        }
    }

    pub fn resolve(&self, arity: usize) -> Option<&UserFunction> {
        self.overloads.iter().find(|f| f.arity() == arity)
    }
}

/// Numeric view of a value. Bools take part in arithmetic as 0 and 1.
#[derive(Debug, Clone)]
pub enum Numeric {
    Int(Integer),
    Float(f64),
}

impl Numeric {
    pub fn of(value: &Value) -> Option<Numeric> {
        match &*value.0 {
            ValueKind::Bool(b) => Some(Numeric::Int(Integer::Small(i64::from(*b)))),
            ValueKind::Int(n) => Some(Numeric::Int(n.clone())),
            ValueKind::Float(f) => Some(Numeric::Float(*f)),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Int(n) => n.to_f64(),
            Numeric::Float(f) => *f,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Numeric::Int(n) => n.is_zero(),
            Numeric::Float(f) => *f == 0.0,
        }
    }

    pub fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Numeric::Int(n) => Value::integer(n),
            Numeric::Float(f) => Value::float(f),
        }
    }
}
