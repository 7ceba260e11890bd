use tracing::debug;

use crate::{
    diagnostics::ScriptError,
    environment::Environment,
    parser,
    runtime::{ExecutionContext, FlowControl, Interpreter},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Ok,
    Error,
}

/// Outcome of one `execute` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReply {
    pub status: ExecutionStatus,
    /// Everything the cell printed, including output written before an error.
    pub stdout: String,
    pub stderr: String,
    /// Display form of the value given at top level, or of the last
    /// top-level expression; empty when there is none or the cell failed.
    pub result: String,
    pub execution_count: u64,
}

/// A persistent global scope driven by independent chunks of source.
pub struct Session {
    interpreter: Interpreter,
    execution_count: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::with_context(ExecutionContext::captured()),
            execution_count: 0,
        }
    }

    /// Session whose `input()` calls consume `lines`.
    pub fn with_input_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interpreter: Interpreter::with_context(
                ExecutionContext::captured().with_input_lines(lines),
            ),
            execution_count: 0,
        }
    }

    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Runs `code` against the session scope. The first failing statement
    /// ends the cell; bindings made before it are kept. The counter only
    /// advances when the cell succeeds.
    pub fn execute(&mut self, code: &str) -> ExecutionReply {
        debug!(count = self.execution_count, bytes = code.len(), "executing cell");
        let outcome = self.run(code);
        let stdout = self.interpreter.context_mut().take_output();
        match outcome {
            Ok(result) => {
                self.execution_count += 1;
                ExecutionReply {
                    status: ExecutionStatus::Ok,
                    stdout,
                    stderr: String::new(),
                    result: result.map(|value| value.to_string()).unwrap_or_default(),
                    execution_count: self.execution_count,
                }
            }
            Err(error) => {
                debug!(kind = error.kind().name(), "cell failed");
                ExecutionReply {
                    status: ExecutionStatus::Error,
                    stdout,
                    stderr: error.to_string(),
                    result: String::new(),
                    execution_count: self.execution_count,
                }
            }
        }
    }

    fn run(&mut self, code: &str) -> Result<Option<Value>, ScriptError> {
        let program = parser::parse_program(code)?;
        let mut result = None;
        for stmt in &program.statements {
            match self.interpreter.execute(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    result = (!value.is_none()).then_some(value);
                }
                FlowControl::Give(value) => return Ok((!value.is_none()).then_some(value)),
            }
        }
        Ok(result)
    }

    /// Restores the initial constants and zeroes the counter.
    pub fn reset(&mut self) {
        self.interpreter.reset();
        self.interpreter.context_mut().take_output();
        self.execution_count = 0;
    }

    /// Bound names starting with `prefix`, sorted.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = Environment::names(self.interpreter.globals())
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        names
    }
}
