use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
    rc::Rc,
};

use tracing::trace;

use crate::{
    ast::{BinaryOp, Expr, ExprKind, Literal, Program, Stmt, StmtKind},
    diagnostics::{Diagnostic, DiagnosticKind, Result, ScriptError, SourceSpan},
    environment::{Environment, EnvironmentRef},
    number::Integer,
    methods, ops, parser, stdlib,
    value::{FunctionSet, Numeric, UserFunction, Value, ValueKind},
};

/// Nested user-function calls allowed before a call fails.
pub const MAX_CALL_DEPTH: usize = 200;

/// Handled here rather than in `stdlib`: it calls back into user code.
const MAP: &str = "map";

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

/// Runs `f`, first moving to a fresh stack segment when less than
/// `STACK_RED_ZONE` bytes remain. Every recursive walk over the syntax
/// tree goes through here.
pub(crate) fn grow_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, f)
}

/// Where `print` and friends write.
pub enum Output {
    Stdout,
    Buffer(String),
}

/// Where `input` reads from.
pub enum Input {
    Stdin,
    Lines(VecDeque<String>),
    Disabled,
}

pub struct ExecutionContext {
    output: Output,
    input: Input,
    /// Print the display form of every expression statement whose value is
    /// not `None`.
    pub echo_expressions: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            output: Output::Stdout,
            input: Input::Stdin,
            echo_expressions: false,
        }
    }
}

impl ExecutionContext {
    /// Output collected in memory, no interactive input.
    pub fn captured() -> Self {
        Self {
            output: Output::Buffer(String::new()),
            input: Input::Disabled,
            echo_expressions: false,
        }
    }

    pub fn with_input_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input = Input::Lines(lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_expressions = echo;
        self
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        match &mut self.output {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            Output::Buffer(buffer) => buffer.push_str(text),
        }
        Ok(())
    }

    /// Next input line without its line ending; `None` at end of input.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match &mut self.input {
            Input::Stdin => {
                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Ok(Some(line))
            }
            Input::Lines(lines) => Ok(lines.pop_front()),
            Input::Disabled => Err(Diagnostic::new(
                DiagnosticKind::Io,
                "input is not available in this session",
            )
            .into()),
        }
    }

    /// Drains captured output; always empty when writing to stdout.
    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            Output::Buffer(buffer) => std::mem::take(buffer),
            Output::Stdout => String::new(),
        }
    }
}

/// Result of executing one statement.
#[derive(Debug)]
pub enum FlowControl {
    Next,
    /// A top-level expression statement produced this value.
    NextValue(Value),
    /// `give` unwinding toward the nearest call boundary.
    Give(Value),
}

pub struct Interpreter {
    globals: EnvironmentRef,
    env: EnvironmentRef,
    context: ExecutionContext,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_context(ExecutionContext::default())
    }

    pub fn with_context(context: ExecutionContext) -> Self {
        let globals = Environment::new();
        stdlib::install(&globals);
        Self {
            env: Rc::clone(&globals),
            globals,
            context,
            depth: 0,
        }
    }

    pub fn globals(&self) -> &EnvironmentRef {
        &self.globals
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Drops every user binding and restores the initial constants.
    pub fn reset(&mut self) {
        self.globals.borrow_mut().clear();
        self.globals = Environment::new();
        self.env = Rc::clone(&self.globals);
        self.depth = 0;
        stdlib::install(&self.globals);
    }

    /// Parses and runs `source`, yielding the value of the last top-level
    /// expression statement (or `None`).
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let program = parser::parse_program(source)?;
        self.eval_program(&program)
    }

    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        let mut last_value = Value::none();
        for stmt in &program.statements {
            match self.execute(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => last_value = value,
                FlowControl::Give(_) => return Err(give_outside_function(stmt.span)),
            }
        }
        Ok(last_value)
    }

    /// Executes one top-level statement against the global scope.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        self.execute_statement(stmt)
            .map_err(|err| err.or_span(stmt.span))
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        grow_stack(|| self.execute_kind(stmt))
    }

    fn execute_kind(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        match &stmt.kind {
            StmtKind::VarDecl { bindings } => {
                for (name, initializer) in bindings {
                    let value = match initializer {
                        Some(expr) => self.evaluate(expr)?,
                        None => Value::none(),
                    };
                    self.env.borrow_mut().define(name.clone(), value);
                }
                Ok(FlowControl::Next)
            }
            StmtKind::LetDecl { name, value } => {
                let value = self.evaluate(value)?;
                self.env.borrow_mut().define(name.clone(), value);
                Ok(FlowControl::Next)
            }
            StmtKind::Assign { name, op, value } => {
                let rhs = self.evaluate(value)?;
                let new_value = match op {
                    None => rhs,
                    Some(op) => {
                        let current = Environment::get(&self.env, name, stmt.span)?;
                        ops::binary(*op, &current, &rhs).map_err(|d| d.or_span(stmt.span))?
                    }
                };
                Environment::assign(&self.env, name, new_value, stmt.span)?;
                Ok(FlowControl::Next)
            }
            StmtKind::If {
                branches,
                else_branch,
            } => {
                for branch in branches {
                    if self.evaluate(&branch.condition)?.is_truthy() {
                        return self.execute_block(&branch.body);
                    }
                }
                match else_branch {
                    Some(body) => self.execute_block(body),
                    None => Ok(FlowControl::Next),
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let FlowControl::Give(value) = self.execute_block(body)? {
                        return Ok(FlowControl::Give(value));
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::ForRange {
                binding,
                from,
                to,
                step,
                body,
            } => self.execute_range(binding, from, to, step.as_ref(), body, stmt.span),
            StmtKind::ForIn {
                binding,
                iterable,
                body,
            } => {
                let container = self.evaluate(iterable)?;
                let Some(items) = container.elements() else {
                    return Err(Diagnostic::type_error(format!(
                        "`for ... in` expects a list, set or string, found {}",
                        container.type_name()
                    ))
                    .with_span(iterable.span)
                    .into());
                };
                for item in items {
                    self.env.borrow_mut().define(binding.clone(), item);
                    if let FlowControl::Give(value) = self.execute_block(body)? {
                        return Ok(FlowControl::Give(value));
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::Function(decl) => {
                let function = UserFunction {
                    decl: Rc::clone(decl),
                    env: Rc::clone(&self.env),
                };
                let overloads = match Environment::lookup(&self.env, &decl.name) {
                    Some(existing) => match &*existing.0 {
                        ValueKind::Function(set) => set.with(function),
                        _ => FunctionSet::single(function),
                    },
                    None => FunctionSet::single(function),
                };
                self.env
                    .borrow_mut()
                    .define(decl.name.clone(), Value::new(ValueKind::Function(overloads)));
                Ok(FlowControl::Next)
            }
            StmtKind::Expr(expr) => {
                let value = self.evaluate(expr)?;
                if self.context.echo_expressions && !value.is_none() {
                    self.context.write(&format!("{value}\n"))?;
                }
                Ok(FlowControl::NextValue(value))
            }
            StmtKind::Give(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::none(),
                };
                Ok(FlowControl::Give(value))
            }
            StmtKind::Pass => Ok(FlowControl::Next),
        }
    }

    /// Runs a block body in the current frame. Only `give` escapes.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<FlowControl> {
        for stmt in statements {
            if let FlowControl::Give(value) = self.execute(stmt)? {
                return Ok(FlowControl::Give(value));
            }
        }
        Ok(FlowControl::Next)
    }

    fn execute_range(
        &mut self,
        binding: &str,
        from: &Expr,
        to: &Expr,
        step: Option<&Expr>,
        body: &[Stmt],
        span: SourceSpan,
    ) -> Result<FlowControl> {
        let start = self.range_bound(from)?;
        let end = self.range_bound(to)?;
        let step = match step {
            Some(expr) => Some(self.range_bound(expr)?),
            None => None,
        };
        if step.as_ref().is_some_and(Numeric::is_zero) {
            return Err(Diagnostic::runtime("range step cannot be zero")
                .with_span(span)
                .into());
        }

        match (start, end, step) {
            (Numeric::Int(start), Numeric::Int(end), None) => {
                let step = Integer::from(if start <= end { 1 } else { -1 });
                self.integer_range(binding, start, end, step, body)
            }
            (Numeric::Int(start), Numeric::Int(end), Some(Numeric::Int(step))) => {
                self.integer_range(binding, start, end, step, body)
            }
            (start, end, step) => {
                let (start, end) = (start.to_f64(), end.to_f64());
                let step = match step {
                    Some(step) => step.to_f64(),
                    None if end >= start => 1.0,
                    None => -1.0,
                };
                self.float_range(binding, start, end, step, body)
            }
        }
    }

    fn range_bound(&mut self, expr: &Expr) -> Result<Numeric> {
        let value = self.evaluate(expr)?;
        Numeric::of(&value).ok_or_else(|| {
            Diagnostic::type_error(format!(
                "range bounds must be numbers, found {}",
                value.type_name()
            ))
            .with_span(expr.span)
            .into()
        })
    }

    fn integer_range(
        &mut self,
        binding: &str,
        start: Integer,
        end: Integer,
        step: Integer,
        body: &[Stmt],
    ) -> Result<FlowControl> {
        let ascending = !step.is_negative();
        let mut current = start;
        while (ascending && current <= end) || (!ascending && current >= end) {
            self.env
                .borrow_mut()
                .define(binding, Value::integer(current.clone()));
            if let FlowControl::Give(value) = self.execute_block(body)? {
                return Ok(FlowControl::Give(value));
            }
            current = current.add(&step);
        }
        Ok(FlowControl::Next)
    }

    fn float_range(
        &mut self,
        binding: &str,
        start: f64,
        end: f64,
        step: f64,
        body: &[Stmt],
    ) -> Result<FlowControl> {
        const EPSILON: f64 = 1e-9;
        let mut current = start;
        let in_range = |current: f64| {
            (step > 0.0 && current <= end + EPSILON) || (step < 0.0 && current >= end - EPSILON)
        };
        while in_range(current) {
            self.env.borrow_mut().define(binding, Value::float(current));
            if let FlowControl::Give(value) = self.execute_block(body)? {
                return Ok(FlowControl::Give(value));
            }
            current += step;
        }
        Ok(FlowControl::Next)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        grow_stack(|| self.evaluate_kind(expr))
    }

    fn evaluate_kind(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal, expr.span),
            ExprKind::Variable(name) => Ok(Environment::get(&self.env, name, expr.span)?),
            ExprKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                if !self.evaluate(left)?.is_truthy() {
                    return Ok(Value::flag(false));
                }
                Ok(Value::flag(self.evaluate(right)?.is_truthy()))
            }
            ExprKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                if self.evaluate(left)?.is_truthy() {
                    return Ok(Value::flag(true));
                }
                Ok(Value::flag(self.evaluate(right)?.is_truthy()))
            }
            ExprKind::Binary { op, left, right } => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                Ok(ops::binary(*op, &left_value, &right_value).map_err(|d| d.or_span(expr.span))?)
            }
            ExprKind::Unary { op, expr: operand } => {
                let value = self.evaluate(operand)?;
                Ok(ops::unary(*op, &value).map_err(|d| d.or_span(expr.span))?)
            }
            ExprKind::Call { name, args } => {
                let values = self.evaluate_all(args)?;
                self.call(name, values, expr.span)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.evaluate(receiver)?;
                let values = self.evaluate_all(args)?;
                trace!(method = %method, receiver = receiver.type_name(), "method call");
                methods::call_method(&receiver, method, &values)
                    .map_err(|err| err.or_span(expr.span))
            }
            ExprKind::ListLiteral(elements) => Ok(Value::list(self.evaluate_all(elements)?)),
            ExprKind::SetLiteral(elements) => Ok(Value::set(self.evaluate_all(elements)?)),
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.evaluate(expr)?);
        }
        Ok(values)
    }

    fn literal(&self, literal: &Literal, span: SourceSpan) -> Result<Value> {
        let value = match literal {
            Literal::Int(digits) => match digits.parse::<Integer>() {
                Ok(n) => Value::integer(n),
                Err(_) => {
                    return Err(Diagnostic::syntax(format!("malformed integer literal `{digits}`"))
                        .with_span(span)
                        .into());
                }
            },
            Literal::Float(n) => Value::float(*n),
            Literal::Bool(b) => Value::bool(*b),
            Literal::String(s) => Value::string(s.clone()),
            Literal::None => Value::none(),
        };
        Ok(value)
    }

    /// Built-ins win over scope bindings of the same name.
    fn call(&mut self, name: &str, args: Vec<Value>, span: SourceSpan) -> Result<Value> {
        if name == MAP {
            return self.map(args, span);
        }
        if let Some(native) = stdlib::lookup(name) {
            trace!(function = name, args = args.len(), "builtin call");
            return native
                .call(&mut self.context, &args)
                .map_err(|err| err.or_span(span));
        }
        match Environment::lookup(&self.env, name) {
            Some(value) => match &*value.0 {
                ValueKind::Function(set) => self.call_overload(set, args, span),
                _ => Err(Diagnostic::type_error(format!(
                    "`{name}` is a {}, not a function",
                    value.type_name()
                ))
                .with_span(span)
                .into()),
            },
            None => Err(Diagnostic::new(
                DiagnosticKind::UndefinedVariable,
                format!("undefined function `{name}`"),
            )
            .with_span(span)
            .into()),
        }
    }

    /// `map(f, items)`: `f` is a function value or the name of any
    /// callable, built-ins included.
    fn map(&mut self, args: Vec<Value>, span: SourceSpan) -> Result<Value> {
        let [function, items] = args.as_slice() else {
            return Err(Diagnostic::new(
                DiagnosticKind::Arity,
                format!("`{MAP}` expects 2 arguments but received {}", args.len()),
            )
            .with_span(span)
            .into());
        };
        let Some(items) = items.elements() else {
            return Err(Diagnostic::type_error(format!(
                "`{MAP}` expected a list but found {}",
                items.type_name()
            ))
            .with_span(span)
            .into());
        };
        let mut mapped = Vec::with_capacity(items.len());
        for item in items {
            let value = match &*function.0 {
                ValueKind::Function(set) => self.call_overload(set, vec![item], span)?,
                ValueKind::String(name) => self.call(name, vec![item], span)?,
                _ => {
                    return Err(Diagnostic::type_error(format!(
                        "`{MAP}` expected a function but found {}",
                        function.type_name()
                    ))
                    .with_span(span)
                    .into());
                }
            };
            mapped.push(value);
        }
        Ok(Value::list(mapped))
    }

    /// Picks the overload whose parameter count matches `args`.
    fn call_overload(
        &mut self,
        set: &FunctionSet,
        args: Vec<Value>,
        span: SourceSpan,
    ) -> Result<Value> {
        match set.resolve(args.len()) {
            Some(function) => self.call_function(function, args, span),
            None => Err(arity_mismatch(set, args.len()).with_span(span).into()),
        }
    }

    fn call_function(
        &mut self,
        function: &UserFunction,
        args: Vec<Value>,
        span: SourceSpan,
    ) -> Result<Value> {
        let decl = &function.decl;
        let Some(body) = &decl.body else {
            return Err(Diagnostic::runtime(format!(
                "function `{}` was declared but never defined",
                decl.name
            ))
            .with_span(span)
            .into());
        };
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Diagnostic::runtime(format!(
                "maximum call depth of {MAX_CALL_DEPTH} exceeded in `{}`",
                decl.name
            ))
            .with_span(span)
            .into());
        }

        let frame = Environment::new_call_frame(&function.env);
        for (param, value) in decl.params.iter().zip(args) {
            frame.borrow_mut().define(param.clone(), value);
        }
        trace!(function = %decl.name, depth = self.depth, "call");

        let caller = std::mem::replace(&mut self.env, frame);
        self.depth += 1;
        let outcome = self.execute_block(body);
        self.depth -= 1;
        self.env = caller;

        match outcome? {
            FlowControl::Give(value) => Ok(value),
            FlowControl::Next | FlowControl::NextValue(_) => Ok(Value::none()),
        }
    }
}

fn arity_mismatch(set: &FunctionSet, received: usize) -> Diagnostic {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let message = match set.overloads.as_slice() {
        [only] => format!(
            "function `{}` expects {} argument{} but received {received}",
            set.name,
            only.arity(),
            plural(only.arity())
        ),
        overloads => {
            let arities: Vec<String> = overloads.iter().map(|f| f.arity().to_string()).collect();
            format!(
                "no overload of `{}` takes {received} argument{}; defined for {}",
                set.name,
                plural(received),
                arities.join(", ")
            )
        }
    };
    Diagnostic::new(DiagnosticKind::Arity, message)
}

pub fn give_outside_function(span: SourceSpan) -> ScriptError {
    Diagnostic::runtime("`give` used outside of a function")
        .with_span(span)
        .into()
}
