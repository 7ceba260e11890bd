use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan},
    value::Value,
};

pub type EnvironmentRef = Rc<RefCell<Environment>>;

/// One scope frame. The global frame has no parent; every function call
/// gets a frame parented to the function's defining frame. Blocks run in
/// the frame that contains them.
#[derive(Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Frame for one invocation: reads fall through to `defining`, writes
    /// stay local.
    pub fn new_call_frame(defining: &EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(Rc::clone(defining)),
            bindings: IndexMap::new(),
        }))
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(env: &EnvironmentRef, name: &str, span: SourceSpan) -> Result<Value, Diagnostic> {
        Environment::lookup(env, name).ok_or_else(|| {
            Diagnostic::new(
                DiagnosticKind::UndefinedVariable,
                format!("undefined variable `{name}`"),
            )
            .with_span(span)
        })
    }

    pub fn lookup(env: &EnvironmentRef, name: &str) -> Option<Value> {
        let frame = env.borrow();
        if let Some(value) = frame.bindings.get(name) {
            return Some(value.clone());
        }
        frame
            .parent
            .as_ref()
            .and_then(|parent| Environment::lookup(parent, name))
    }

    /// Rebinds an existing name in this frame. Names that only exist in an
    /// outer frame are read-only from inside a call.
    pub fn assign(
        env: &EnvironmentRef,
        name: &str,
        value: Value,
        span: SourceSpan,
    ) -> Result<(), Diagnostic> {
        let mut frame = env.borrow_mut();
        if let Some(slot) = frame.bindings.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        let Some(parent) = frame.parent.clone() else {
            return Err(Diagnostic::new(
                DiagnosticKind::UndefinedVariable,
                format!("cannot assign to undefined variable `{name}`"),
            )
            .with_span(span)
            .with_note("declare it first with `var`"));
        };
        drop(frame);
        let diagnostic = if Environment::lookup(&parent, name).is_some() {
            Diagnostic::new(
                DiagnosticKind::UndefinedVariable,
                format!("cannot assign to `{name}` from inside a function"),
            )
            .with_note("outer variables are read-only in a function body; declare a local with `var`")
        } else {
            Diagnostic::new(
                DiagnosticKind::UndefinedVariable,
                format!("cannot assign to undefined variable `{name}`"),
            )
        };
        Err(diagnostic.with_span(span))
    }

    /// Every name visible from `env`, innermost first, without duplicates.
    pub fn names(env: &EnvironmentRef) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut current = Some(Rc::clone(env));
        while let Some(frame) = current {
            let frame = frame.borrow();
            for name in frame.bindings.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            current = frame.parent.clone();
        }
        names
    }

    /// Drops every binding, breaking reference cycles between this frame
    /// and the functions defined in it.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
