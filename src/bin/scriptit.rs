use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scriptit::{
    ExecutionContext, Interpreter, Repl, ScriptError, ScriptSummary, kernel, script,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "ScriptIt language interpreter",
    args_conflicts_with_subcommands = true
)]
struct Args {
    /// Script to run; starts the REPL when omitted
    script: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a ScriptIt script file (`-` reads stdin)
    Run { script: PathBuf },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of ScriptIt code
    Eval { source: String },
    /// Serve the JSON line protocol on stdin/stdout
    Kernel,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let command = match (args.command, args.script) {
        (Some(command), _) => command,
        (None, Some(script)) => Command::Run { script },
        (None, None) => Command::Repl,
    };
    match execute(command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> Result<ExitCode, ScriptError> {
    match command {
        Command::Run { script } => Ok(exit_code(script::run_file(&script)?)),
        Command::Repl => {
            Repl::new().run()?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Eval { source } => {
            let mut interpreter =
                Interpreter::with_context(ExecutionContext::default().with_echo(true));
            Ok(exit_code(script::run_source(&mut interpreter, &source)?))
        }
        Command::Kernel => {
            kernel::serve(io::stdin().lock(), io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(summary: ScriptSummary) -> ExitCode {
    if summary.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Logs go to stderr so stdout carries only program output and protocol
/// responses. `SCRIPTIT_LOG` takes an `EnvFilter` directive.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCRIPTIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
