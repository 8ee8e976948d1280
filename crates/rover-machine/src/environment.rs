//! A single bot wired up for scripting: world, frame, modules, and engine.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use rover_core::component::{Position, Status};
use rover_core::status::apply_trigger;
use rover_core::{EntityId, EntityStatus, StatusTrigger, World};
use rover_script::{
    FrameClock, RegistrationError, RunSummary, ScriptEngine, ScriptError, ScriptResult,
};
use serde::Serialize;

use crate::frame::MachineFrame;
use crate::modules::{DebugModule, DebugSnapshot, MotorConfig, MotorModule};

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    /// Error class, e.g. `runtime error`.
    pub class: String,
    /// The error message without location.
    pub message: String,
    /// 1-based line of the failure, when known.
    pub line: Option<usize>,
    /// 1-based column of the failure, when known.
    pub column: Option<usize>,
    /// The underlying error, for rendering against the source.
    #[serde(skip)]
    pub cause: ScriptError,
}

impl From<ScriptError> for RunFailure {
    fn from(error: ScriptError) -> Self {
        let message = match &error {
            ScriptError::Syntax(e) => e.message.clone(),
            ScriptError::Runtime(e) => e.message.clone(),
            other => other.to_string(),
        };
        let location = error.location();
        Self {
            class: error.class().to_string(),
            message,
            line: location.map(|l| l.line),
            column: location.map(|l| l.column),
            cause: error,
        }
    }
}

/// The outcome of [`BotEnvironment::run`]: progress plus the bot's state
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// The bot the script drove.
    pub entity: EntityId,
    /// Commands that completed.
    pub commands: usize,
    /// Animation frames spent.
    pub frames: u64,
    /// Frame time spent, in milliseconds.
    pub elapsed_ms: f64,
    /// Position after the run.
    pub position: Option<Position>,
    /// Motor heading after the run.
    pub heading: f64,
    /// Status after the run.
    pub status: Option<EntityStatus>,
    /// Debug module state after the run.
    pub debug: DebugSnapshot,
    /// Set when the run stopped on an error.
    pub error: Option<RunFailure>,
}

impl RunReport {
    /// Whether every command completed.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// One bot with a motor and a debug console fitted, ready to run scripts
/// against its world.
#[derive(Debug)]
pub struct BotEnvironment {
    world: World,
    frame: MachineFrame,
    motor: Rc<RefCell<MotorModule>>,
    debug: Rc<RefCell<DebugModule>>,
    engine: ScriptEngine<World>,
}

impl BotEnvironment {
    /// Fit `entity` with a motor and a debug console and register both
    /// with a fresh engine.
    pub fn new(world: World, entity: EntityId, motor: MotorConfig) -> Result<Self, RegistrationError> {
        let motor = Rc::new(RefCell::new(MotorModule::new(motor)));
        let debug = Rc::new(RefCell::new(DebugModule::new()));

        let mut frame = MachineFrame::new(entity);
        frame.install(&motor);
        frame.install(&debug);

        let mut engine = ScriptEngine::new();
        frame.register_apis(&mut engine)?;

        tracing::debug!(%entity, modules = frame.len(), "bot environment ready");
        Ok(Self {
            world,
            frame,
            motor,
            debug,
            engine,
        })
    }

    /// The bot being driven.
    pub fn entity(&self) -> EntityId {
        self.frame.entity()
    }

    /// The world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Tear down and hand back the world.
    pub fn into_world(self) -> World {
        self.world
    }

    /// The fitted motor.
    pub fn motor(&self) -> Ref<'_, MotorModule> {
        self.motor.borrow()
    }

    /// The fitted debug console.
    pub fn debug(&self) -> Ref<'_, DebugModule> {
        self.debug.borrow()
    }

    /// The frame carrying the modules.
    pub fn frame(&self) -> &MachineFrame {
        &self.frame
    }

    /// The engine with the fitted modules registered.
    pub fn engine(&self) -> &ScriptEngine<World> {
        &self.engine
    }

    /// The engine, e.g. to register extra modules.
    pub fn engine_mut(&mut self) -> &mut ScriptEngine<World> {
        &mut self.engine
    }

    /// Replace the clock driving animated commands.
    pub fn set_clock(&mut self, clock: impl FrameClock + 'static) {
        self.engine.set_clock(clock);
    }

    /// Fire an operator reset on the bot's status.
    pub fn reset(&mut self) -> ScriptResult<Option<EntityStatus>> {
        let entity = self.entity();
        Ok(apply_trigger(&mut self.world, entity, StatusTrigger::Reset)?)
    }

    /// Compile and run `source`, propagating the first error.
    pub fn execute(&mut self, source: &str) -> ScriptResult<RunSummary> {
        self.engine.execute(source, &mut self.world)
    }

    /// Compile and run `source`, capturing the outcome in a report.
    ///
    /// A runtime or store failure faults the bot. Syntax errors run
    /// nothing and leave the status alone.
    pub fn run(&mut self, source: &str) -> RunReport {
        let (summary, error) = match self.engine.compile(source) {
            Ok(commands) => {
                let mut run = self.engine.start(commands);
                let result = self.engine.drive(&mut run, &mut self.world);
                (run.summary(), result.err())
            }
            Err(e) => (RunSummary::default(), Some(ScriptError::from(e))),
        };

        let entity = self.entity();
        if let Some(error) = &error {
            tracing::warn!(%entity, %error, "script failed");
        }
        let faulted = match &error {
            Some(ScriptError::Runtime(_) | ScriptError::Store(_)) => {
                apply_trigger(&mut self.world, entity, StatusTrigger::Fault)
            }
            _ => Ok(None),
        };
        if let Err(e) = faulted {
            tracing::debug!(error = %e, "could not fault bot");
        }

        self.report(summary, error)
    }

    fn report(&self, summary: RunSummary, error: Option<ScriptError>) -> RunReport {
        let entity = self.entity();
        RunReport {
            entity,
            commands: summary.commands,
            frames: summary.frames,
            elapsed_ms: summary.elapsed.as_secs_f64() * 1000.0,
            position: self.world.get::<Position>(entity).map(|p| *p),
            heading: self.motor.borrow().heading(),
            status: self.world.get::<Status>(entity).map(|s| s.state),
            debug: self.debug.borrow().snapshot(),
            error: error.map(RunFailure::from),
        }
    }
}
