use std::fmt;

use rover_core::StoreError;

use crate::lexer::Location;

/// Result alias for anything that can fail while running a script.
pub type ScriptResult<T> = Result<T, ScriptError>;

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" ({location})"),
        None => String::new(),
    }
}

/// The script text is not valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({location})")]
pub struct SyntaxError {
    /// What went wrong.
    pub message: String,
    /// Where the offending input starts.
    pub location: Location,
}

impl SyntaxError {
    /// Create a syntax error.
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// Classification of [`RuntimeError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeErrorKind {
    /// No module with that name is registered.
    UnknownModule,
    /// The module has no function with that name.
    UnknownFunction,
    /// Fewer arguments than parameters.
    MissingArgument,
    /// More arguments than parameters.
    UnexpectedArgument,
    /// Argument kind differs from the parameter kind.
    WrongArgumentType,
    /// A number argument is NaN or infinite.
    NonFiniteNumber,
    /// The bound entity lacks a component the function needs.
    MissingComponent,
    /// The argument has the right kind but an unacceptable value.
    InvalidValue,
    /// The module is not fitted to a machine frame.
    NotInstalled,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnknownModule => "unknown module",
            Self::UnknownFunction => "unknown function",
            Self::MissingArgument => "missing argument",
            Self::UnexpectedArgument => "unexpected argument",
            Self::WrongArgumentType => "wrong argument type",
            Self::NonFiniteNumber => "non-finite number",
            Self::MissingComponent => "missing component",
            Self::InvalidValue => "invalid value",
            Self::NotInstalled => "not installed",
        };
        f.write_str(name)
    }
}

/// A well-formed command could not be executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", location_suffix(.location))]
pub struct RuntimeError {
    /// Classification.
    pub kind: RuntimeErrorKind,
    /// What went wrong.
    pub message: String,
    /// The command or argument at fault, when known.
    pub location: Option<Location>,
}

impl RuntimeError {
    /// Create a runtime error without a location.
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// A module or function name clashed while registering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Another module already uses this name.
    #[error("Module '{0}' is already registered")]
    DuplicateModule(String),

    /// A module declares the same function twice.
    #[error("Function '{function}' is declared twice in module '{module}'")]
    DuplicateFunction {
        /// The module.
        module: String,
        /// The repeated function name.
        function: String,
    },
}

/// Any failure produced while compiling or running a script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The source did not tokenize or parse.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A command failed validation or execution.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A module's store write was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A module could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl ScriptError {
    /// Source position of the failure, if it has one.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Syntax(e) => Some(e.location),
            Self::Runtime(e) => e.location,
            Self::Store(_) | Self::Registration(_) => None,
        }
    }

    /// Short class name, e.g. for CLI output.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "syntax error",
            Self::Runtime(_) => "runtime error",
            Self::Store(_) => "store error",
            Self::Registration(_) => "registration error",
        }
    }

    /// The runtime kind, if this is a runtime error.
    pub fn runtime_kind(&self) -> Option<RuntimeErrorKind> {
        match self {
            Self::Runtime(e) => Some(e.kind),
            _ => None,
        }
    }
}
