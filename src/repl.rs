use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, Result, ScriptError},
    parser,
    runtime::{ExecutionContext, Interpreter},
};

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = ".. ";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Repl {
    interpreter: Interpreter,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::with_context(ExecutionContext::default().with_echo(true)),
        }
    }

    /// Reads lines until `exit` or end of input. A line that leaves a block
    /// open keeps reading under the continuation prompt; an empty line runs
    /// whatever has been collected.
    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;
        let mut pending = String::new();
        loop {
            let prompt = if pending.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            let line = match editor.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) if !pending.is_empty() => {
                    pending.clear();
                    continue;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(readline_error(err)),
            };
            let trimmed = line.trim();

            if pending.is_empty() {
                match trimmed {
                    "" => continue,
                    "exit" => break,
                    "clear" => {
                        self.interpreter.context_mut().write(CLEAR_SCREEN)?;
                        continue;
                    }
                    "wipe" => {
                        self.interpreter.context_mut().write(CLEAR_SCREEN)?;
                        self.interpreter.reset();
                        debug!("session wiped");
                        continue;
                    }
                    _ => {}
                }
            }
            editor.add_history_entry(trimmed).ok();

            if !pending.is_empty() {
                pending.push('\n');
            }
            pending.push_str(&line);
            if !trimmed.is_empty() && awaits_more_input(&pending) {
                continue;
            }
            let source = std::mem::take(&mut pending);
            self.eval_line(&source)?;
        }
        Ok(())
    }

    fn eval_line(&mut self, source: &str) -> Result<()> {
        match self.interpreter.eval_source(source) {
            Ok(_) => Ok(()),
            Err(ScriptError::Io(err)) => Err(ScriptError::Io(err)),
            Err(err) => self.interpreter.context_mut().write(&format!("Error: {err}\n")),
        }
    }
}

/// Whether `source` only fails to parse because it ends inside a block.
pub fn awaits_more_input(source: &str) -> bool {
    match parser::parse_program(source) {
        Ok(_) => false,
        Err(diagnostic) => ends_at_input_end(&diagnostic, source),
    }
}

fn ends_at_input_end(diagnostic: &Diagnostic, source: &str) -> bool {
    diagnostic
        .span
        .is_some_and(|span| span.start >= source.len())
}

fn readline_error(err: ReadlineError) -> ScriptError {
    ScriptError::from(std::io::Error::other(err))
}
