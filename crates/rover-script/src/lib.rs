//! The rover bot script language.
//!
//! A script is a list of `module.function(args)` calls separated by
//! newlines or `;`. Source flows through [`lexer::tokenize`],
//! [`parser::parse`], and [`compiler::compile`] into [`Command`]s, which a
//! [`ScriptEngine`] dispatches to registered [`ScriptModule`]s.
//!
//! ```text
//! // patrol
//! motor.forward(10)
//! motor.left(90); debug.color(#00ff88)
//! ```

/// Syntax tree produced by the parser.
pub mod ast;
/// Frame clocks that drive suspended commands.
pub mod clock;
/// Compiled commands and runtime values.
pub mod command;
/// Lowering from syntax tree to commands.
pub mod compiler;
/// ariadne-rendered error reports.
pub mod diagnostics;
/// Module registry and command execution.
pub mod engine;
/// Error types for every stage.
pub mod error;
/// Tokenizer.
pub mod lexer;
/// The module interface and function tables.
pub mod module;
/// Parser.
pub mod parser;

pub use clock::{FixedStep, FrameClock, RealTimeClock};
pub use command::{Argument, Command, Value, ValueKind};
pub use diagnostics::{Diagnostic, Severity, render_diagnostics};
pub use engine::{RunState, RunSummary, ScriptEngine, ScriptRun, SharedModule};
pub use error::{
    RegistrationError, RuntimeError, RuntimeErrorKind, ScriptError, ScriptResult, SyntaxError,
};
pub use lexer::{Location, Token, TokenKind, tokenize};
pub use module::{
    Completion, FunctionSignature, Invocation, Parameter, ScriptFunction, ScriptModule, dispatch,
    signatures,
};
pub use parser::{parse, parse_source};
