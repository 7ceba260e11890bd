//! Core library for the ScriptIt scripting language: lexing, parsing,
//! tree-walking evaluation, and the REPL and notebook-kernel hosts built on
//! a persistent execution session.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod kernel;
pub mod lexer;
pub mod methods;
pub mod number;
pub mod ops;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod script;
pub mod session;
pub mod stdlib;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, ScriptError, SourceSpan};
pub use repl::Repl;
pub use runtime::{ExecutionContext, FlowControl, Interpreter};
pub use script::ScriptSummary;
pub use session::{ExecutionReply, ExecutionStatus, Session};
pub use value::{Value, ValueKind};
