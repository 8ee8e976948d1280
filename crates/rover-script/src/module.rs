use std::fmt;
use std::time::Duration;

use crate::command::{Argument, ValueKind};
use crate::error::{RuntimeError, RuntimeErrorKind, ScriptResult};
use crate::lexer::Location;

/// A declared function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    /// Name used in error messages.
    pub name: &'static str,
    /// Required value kind.
    pub kind: ValueKind,
}

impl Parameter {
    /// A `number` parameter.
    pub const fn number(name: &'static str) -> Self {
        Self {
            name,
            kind: ValueKind::Number,
        }
    }

    /// A `boolean` parameter.
    pub const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: ValueKind::Boolean,
        }
    }

    /// A `hexcolor` parameter.
    pub const fn hex_color(name: &'static str) -> Self {
        Self {
            name,
            kind: ValueKind::HexColor,
        }
    }
}

/// Name and parameter list of a module function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Function name, unique within its module.
    pub name: &'static str,
    /// Parameters in call order.
    pub parameters: &'static [Parameter],
}

impl FunctionSignature {
    /// Create a signature.
    pub const fn new(name: &'static str, parameters: &'static [Parameter]) -> Self {
        Self { name, parameters }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", p.name, p.kind)?;
        }
        f.write_str(")")
    }
}

/// Which call is being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Module name.
    pub module: &'a str,
    /// Function name.
    pub function: &'a str,
    /// Position of the statement.
    pub location: Location,
}

impl Invocation<'_> {
    fn missing(&self, args: &[Argument], index: usize, name: &str, kind: ValueKind) -> RuntimeError {
        let location = args.get(index).map_or(self.location, |a| a.location);
        RuntimeError::new(
            RuntimeErrorKind::MissingArgument,
            format!(
                "Missing {kind} argument '{name}' when calling {}.{}",
                self.module, self.function
            ),
        )
        .at(location)
    }

    /// Read argument `index` as a number.
    pub fn number(&self, args: &[Argument], index: usize, name: &str) -> Result<f64, RuntimeError> {
        args.get(index)
            .and_then(|a| a.value.as_number())
            .ok_or_else(|| self.missing(args, index, name, ValueKind::Number))
    }

    /// Read argument `index` as a boolean.
    pub fn boolean(&self, args: &[Argument], index: usize, name: &str) -> Result<bool, RuntimeError> {
        args.get(index)
            .and_then(|a| a.value.as_bool())
            .ok_or_else(|| self.missing(args, index, name, ValueKind::Boolean))
    }

    /// Read argument `index` as a hex color string.
    pub fn hex_color<'v>(
        &self,
        args: &'v [Argument],
        index: usize,
        name: &str,
    ) -> Result<&'v str, RuntimeError> {
        args.get(index)
            .and_then(|a| a.value.as_hex_color())
            .ok_or_else(|| self.missing(args, index, name, ValueKind::HexColor))
    }
}

/// Whether a call finished or needs more frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The call has fully taken effect.
    Done,
    /// The call is animating; the engine must call
    /// [`ScriptModule::resume`] once per frame until it reports `Done`.
    Suspended,
}

/// A named set of script-callable functions acting on a host `H`.
pub trait ScriptModule<H> {
    /// Registry name, e.g. `motor`.
    fn name(&self) -> &str;

    /// Declared functions in declaration order.
    fn functions(&self) -> Vec<FunctionSignature>;

    /// Run a function. Arguments have already been checked against the
    /// signature.
    fn invoke(
        &mut self,
        call: &Invocation<'_>,
        args: &[Argument],
        host: &mut H,
    ) -> ScriptResult<Completion>;

    /// Advance a suspended call by one frame.
    fn resume(&mut self, elapsed: Duration, host: &mut H) -> ScriptResult<Completion> {
        let _ = (elapsed, host);
        Ok(Completion::Done)
    }
}

/// Function body stored in a [`ScriptFunction`] table.
pub type FunctionBody<M, H> =
    fn(&mut M, &Invocation<'_>, &[Argument], &mut H) -> ScriptResult<Completion>;

/// A table entry binding a signature to a method of module type `M`.
pub struct ScriptFunction<M, H> {
    /// Declared signature.
    pub signature: FunctionSignature,
    /// The implementation.
    pub body: FunctionBody<M, H>,
}

impl<M, H> ScriptFunction<M, H> {
    /// Create an entry.
    pub const fn new(
        name: &'static str,
        parameters: &'static [Parameter],
        body: FunctionBody<M, H>,
    ) -> Self {
        Self {
            signature: FunctionSignature::new(name, parameters),
            body,
        }
    }
}

impl<M, H> fmt::Debug for ScriptFunction<M, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScriptFunction").field(&self.signature).finish()
    }
}

/// Signatures of a function table, in table order.
pub fn signatures<M, H>(table: &[ScriptFunction<M, H>]) -> Vec<FunctionSignature> {
    table.iter().map(|f| f.signature).collect()
}

/// Look up `call.function` in `table` and run it on `module`.
pub fn dispatch<M, H>(
    table: &[ScriptFunction<M, H>],
    module: &mut M,
    call: &Invocation<'_>,
    args: &[Argument],
    host: &mut H,
) -> ScriptResult<Completion> {
    let function = table
        .iter()
        .find(|f| f.signature.name == call.function)
        .ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UnknownFunction,
                format!(
                    "Module '{}' does not provide function '{}'",
                    call.module, call.function
                ),
            )
            .at(call.location)
        })?;
    (function.body)(module, call, args, host)
}
