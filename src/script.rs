use std::{fs, io::Read, path::Path};

use tracing::debug;

use crate::{
    diagnostics::{Result, ScriptError},
    parser,
    runtime::{self, ExecutionContext, FlowControl, Interpreter},
};

/// What happened while running a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
    pub syntax_error: bool,
}

impl ScriptSummary {
    pub fn succeeded(&self) -> bool {
        self.failed == 0 && !self.syntax_error
    }
}

/// Runs a script file with output on stdout and expression echo enabled.
/// `-` reads the script from stdin.
pub fn run_file(path: &Path) -> Result<ScriptSummary> {
    let source = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    let mut interpreter = Interpreter::with_context(ExecutionContext::default().with_echo(true));
    run_source(&mut interpreter, &source)
}

/// Parses `source` up front, then executes it one top-level statement at a
/// time. A failing statement prints `Error: ...` and execution moves on to
/// the next one.
pub fn run_source(interpreter: &mut Interpreter, source: &str) -> Result<ScriptSummary> {
    let mut summary = ScriptSummary::default();
    let program = match parser::parse_program(source) {
        Ok(program) => program,
        Err(diagnostic) => {
            summary.syntax_error = true;
            report(interpreter, &ScriptError::from(diagnostic))?;
            return Ok(summary);
        }
    };

    for stmt in &program.statements {
        debug!(line = stmt.span.line, "executing statement");
        summary.executed += 1;
        let error = match interpreter.execute(stmt) {
            Ok(FlowControl::Give(_)) => runtime::give_outside_function(stmt.span),
            Ok(_) => continue,
            Err(ScriptError::Io(err)) => return Err(ScriptError::Io(err)),
            Err(err) => err,
        };
        summary.failed += 1;
        report(interpreter, &error)?;
    }
    Ok(summary)
}

fn report(interpreter: &mut Interpreter, error: &ScriptError) -> Result<()> {
    debug!(kind = error.kind().name(), "statement failed");
    interpreter.context_mut().write(&format!("Error: {error}\n"))
}
