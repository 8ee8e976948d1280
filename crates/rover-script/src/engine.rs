use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use strsim::jaro_winkler;

use crate::clock::{FixedStep, FrameClock};
use crate::command::{Command, Value};
use crate::compiler;
use crate::error::{RegistrationError, RuntimeError, RuntimeErrorKind, ScriptResult, SyntaxError};
use crate::module::{Completion, FunctionSignature, Invocation, ScriptModule};
use crate::parser;

/// Minimum similarity for a "did you mean" hint (0.0-1.0).
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A module shared between the engine and whoever installed it.
pub type SharedModule<H> = Rc<RefCell<dyn ScriptModule<H>>>;

/// Whether a [`ScriptRun`] has more work to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// A command is suspended; call [`ScriptEngine::advance`] again.
    Running,
    /// Every command has completed.
    Finished,
}

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands that ran to completion.
    pub commands: usize,
    /// Animation frames spent on suspended commands.
    pub frames: u64,
    /// Frame time handed to suspended commands.
    pub elapsed: Duration,
}

/// An in-progress script execution, advanced with [`ScriptEngine::advance`].
///
/// Dropping a run abandons it; commands already applied stay applied.
pub struct ScriptRun<H> {
    commands: Vec<Command>,
    next: usize,
    pending: Option<SharedModule<H>>,
    summary: RunSummary,
}

impl<H> ScriptRun<H> {
    /// Whether every command has completed (or the run failed).
    pub fn is_finished(&self) -> bool {
        self.pending.is_none() && self.next >= self.commands.len()
    }

    /// Progress so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Commands not yet started.
    pub fn remaining(&self) -> &[Command] {
        &self.commands[self.next.min(self.commands.len())..]
    }

    fn abort(&mut self) {
        self.pending = None;
        self.next = self.commands.len();
    }
}

impl<H> fmt::Debug for ScriptRun<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRun")
            .field("commands", &self.commands.len())
            .field("next", &self.next)
            .field("suspended", &self.pending.is_some())
            .field("summary", &self.summary)
            .finish()
    }
}

struct Registered<H> {
    name: String,
    module: SharedModule<H>,
}

/// Compiles scripts and runs them against registered modules.
///
/// `H` is the host state handed to every module call, typically the
/// [`World`](rover_core::World).
pub struct ScriptEngine<H> {
    modules: Vec<Registered<H>>,
    clock: Box<dyn FrameClock>,
}

impl<H> Default for ScriptEngine<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ScriptEngine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("modules", &self.module_names().collect::<Vec<_>>())
            .finish()
    }
}

impl<H> ScriptEngine<H> {
    /// An engine with no modules and a [`FixedStep`] clock.
    pub fn new() -> Self {
        Self::with_clock(FixedStep::default())
    }

    /// An engine driving suspended commands with `clock`.
    pub fn with_clock(clock: impl FrameClock + 'static) -> Self {
        Self {
            modules: Vec::new(),
            clock: Box::new(clock),
        }
    }

    /// Replace the frame clock.
    pub fn set_clock(&mut self, clock: impl FrameClock + 'static) {
        self.clock = Box::new(clock);
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Add a module. Names must be unique across the engine and function
    /// names unique within the module.
    pub fn register_module(&mut self, module: SharedModule<H>) -> Result<(), RegistrationError> {
        let (name, functions) = {
            let m = module.borrow();
            (m.name().to_string(), m.functions())
        };
        if self.find(&name).is_some() {
            return Err(RegistrationError::DuplicateModule(name));
        }

        let mut seen = HashSet::new();
        for function in &functions {
            if !seen.insert(function.name) {
                return Err(RegistrationError::DuplicateFunction {
                    module: name,
                    function: function.name.to_string(),
                });
            }
        }

        tracing::debug!(module = %name, functions = functions.len(), "module registered");
        self.modules.push(Registered { name, module });
        Ok(())
    }

    /// Remove a module by name, returning it if it was registered.
    pub fn unregister_module(&mut self, name: &str) -> Option<SharedModule<H>> {
        let index = self.modules.iter().position(|r| r.name == name)?;
        tracing::debug!(module = %name, "module unregistered");
        Some(self.modules.remove(index).module)
    }

    /// The module registered under `name`.
    pub fn module(&self, name: &str) -> Option<SharedModule<H>> {
        self.find(name).map(Rc::clone)
    }

    /// Registered module names in registration order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.modules.iter().map(|r| r.name.as_str())
    }

    /// Every module with its function signatures, in registration order.
    pub fn catalog(&self) -> Vec<(String, Vec<FunctionSignature>)> {
        self.modules
            .iter()
            .map(|r| (r.name.clone(), r.module.borrow().functions()))
            .collect()
    }

    fn find(&self, name: &str) -> Option<&SharedModule<H>> {
        self.modules.iter().find(|r| r.name == name).map(|r| &r.module)
    }

    // -----------------------------------------------------------------------
    // Compile & run
    // -----------------------------------------------------------------------

    /// Tokenize, parse, and compile `source`.
    pub fn compile(&self, source: &str) -> Result<Vec<Command>, SyntaxError> {
        let program = parser::parse_source(source)?;
        Ok(compiler::compile(&program))
    }

    /// Compile and run `source` to completion.
    pub fn execute(&mut self, source: &str, host: &mut H) -> ScriptResult<RunSummary> {
        let commands = self.compile(source)?;
        self.execute_commands(&commands, host)
    }

    /// Run commands in order, driving suspended ones with the engine's clock.
    ///
    /// The first failure aborts the rest; earlier effects are kept.
    pub fn execute_commands(&mut self, commands: &[Command], host: &mut H) -> ScriptResult<RunSummary> {
        let mut run = self.start(commands.to_vec());
        self.drive(&mut run, host)
    }

    /// Advance `run` frame by frame with the engine's clock until it
    /// finishes or fails. On failure `run.summary()` still reports the
    /// progress made before the error.
    pub fn drive(&mut self, run: &mut ScriptRun<H>, host: &mut H) -> ScriptResult<RunSummary> {
        let mut elapsed = Duration::ZERO;
        loop {
            match self.advance(run, elapsed, host)? {
                RunState::Finished => return Ok(run.summary()),
                RunState::Running => elapsed = self.clock.next_frame(),
            }
        }
    }

    /// Prepare a run without executing anything.
    pub fn start(&self, commands: Vec<Command>) -> ScriptRun<H> {
        ScriptRun {
            commands,
            next: 0,
            pending: None,
            summary: RunSummary::default(),
        }
    }

    /// Resume a suspended command with `elapsed` frame time, then keep
    /// running commands until one suspends or all are done.
    pub fn advance(&mut self, run: &mut ScriptRun<H>, elapsed: Duration, host: &mut H) -> ScriptResult<RunState> {
        if let Some(module) = run.pending.take() {
            run.summary.frames += 1;
            run.summary.elapsed += elapsed;
            let resumed = module.borrow_mut().resume(elapsed, host);
            match resumed {
                Ok(Completion::Suspended) => {
                    run.pending = Some(module);
                    return Ok(RunState::Running);
                }
                Ok(Completion::Done) => run.summary.commands += 1,
                Err(e) => {
                    run.abort();
                    return Err(e);
                }
            }
        }

        while run.next < run.commands.len() {
            let index = run.next;
            run.next += 1;
            match self.dispatch(&run.commands[index], host) {
                Ok((Completion::Done, _)) => run.summary.commands += 1,
                Ok((Completion::Suspended, module)) => {
                    run.pending = Some(module);
                    return Ok(RunState::Running);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "script aborted");
                    run.abort();
                    return Err(e);
                }
            }
        }

        Ok(RunState::Finished)
    }

    fn dispatch(&self, command: &Command, host: &mut H) -> ScriptResult<(Completion, SharedModule<H>)> {
        let module = self.resolve(command)?;
        let call = Invocation {
            module: &command.module,
            function: &command.function,
            location: command.location,
        };
        tracing::debug!(command = %command, line = command.location.line, "dispatching command");
        let completion = module.borrow_mut().invoke(&call, &command.arguments, host)?;
        Ok((completion, module))
    }

    /// Find the target module and check the arguments against the
    /// function's signature.
    fn resolve(&self, command: &Command) -> Result<SharedModule<H>, RuntimeError> {
        let Some(module) = self.find(&command.module) else {
            let mut message = format!("Unknown module '{}'", command.module);
            if let Some(hint) = suggest(&command.module, self.module_names()) {
                message.push_str(&format!("; did you mean '{hint}'?"));
            }
            return Err(RuntimeError::new(RuntimeErrorKind::UnknownModule, message).at(command.location));
        };

        let functions = module.borrow().functions();
        let Some(signature) = functions.iter().find(|s| s.name == command.function) else {
            let mut message = format!(
                "Module '{}' does not provide function '{}'",
                command.module, command.function
            );
            if let Some(hint) = suggest(&command.function, functions.iter().map(|s| s.name)) {
                message.push_str(&format!("; did you mean '{hint}'?"));
            }
            return Err(RuntimeError::new(RuntimeErrorKind::UnknownFunction, message).at(command.location));
        };

        check_arguments(command, signature)?;
        Ok(Rc::clone(module))
    }
}

fn check_arguments(command: &Command, signature: &FunctionSignature) -> Result<(), RuntimeError> {
    let qualified = format!("{}.{}", command.module, signature.name);
    let expected = signature.parameters.len();
    let received = command.arguments.len();

    if received < expected {
        let missing = &signature.parameters[received];
        return Err(RuntimeError::new(
            RuntimeErrorKind::MissingArgument,
            format!("Function {qualified} is missing argument '{}'", missing.name),
        )
        .at(command.location));
    }
    if received > expected {
        return Err(RuntimeError::new(
            RuntimeErrorKind::UnexpectedArgument,
            format!("Function {qualified} received unexpected argument"),
        )
        .at(command.arguments[expected].location));
    }

    for (parameter, argument) in signature.parameters.iter().zip(&command.arguments) {
        if argument.value.kind() != parameter.kind {
            return Err(RuntimeError::new(
                RuntimeErrorKind::WrongArgumentType,
                format!(
                    "Expected {} for parameter '{}' when calling {qualified}",
                    parameter.kind, parameter.name
                ),
            )
            .at(argument.location));
        }
        if matches!(argument.value, Value::Number { value, .. } if !value.is_finite()) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::NonFiniteNumber,
                format!(
                    "Non-finite number argument for parameter '{}' when calling {qualified}",
                    parameter.name
                ),
            )
            .at(argument.location));
        }
    }
    Ok(())
}

fn suggest<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .map(|c| (c, jaro_winkler(input, c)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}
