use std::collections::VecDeque;

use rover_core::World;
use rover_core::component::{ModuleCategory, ModuleMetadata};
use rover_script::{
    Argument, Completion, FunctionSignature, Invocation, Parameter, RuntimeError,
    RuntimeErrorKind, ScriptFunction, ScriptModule, ScriptResult, dispatch, signatures,
};
use serde::Serialize;

use crate::module::MachineModule;

/// Maximum number of remembered debug calls.
pub const HISTORY_LIMIT: usize = 50;

/// Pen color before any `debug.color` call.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Pen state and recent history of a [`DebugModule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugSnapshot {
    /// Whether the pen is down.
    pub pen_down: bool,
    /// Current color, e.g. `#ff00ff`.
    pub color: String,
    /// Recent calls, oldest first.
    pub history: Vec<String>,
}

/// Drawing instrumentation: a pen toggle and a color.
#[derive(Debug)]
pub struct DebugModule {
    metadata: ModuleMetadata,
    pen_down: bool,
    color: String,
    history: VecDeque<String>,
}

impl Default for DebugModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugModule {
    const FUNCTIONS: &'static [ScriptFunction<DebugModule, World>] = &[
        ScriptFunction::new("pen", &[Parameter::boolean("enabled")], DebugModule::pen),
        ScriptFunction::new("color", &[Parameter::hex_color("hex")], DebugModule::color_call),
    ];

    /// A module with the pen up and a white color.
    pub fn new() -> Self {
        Self {
            metadata: ModuleMetadata::new("debug", "Diagnostics Console", ModuleCategory::Utility)
                .with_description(
                    "Provides instrumentation helpers such as pen toggles and color selection.",
                ),
            pen_down: false,
            color: DEFAULT_COLOR.to_string(),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Whether the pen is down.
    pub fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    /// The current color.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Recent calls, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            pen_down: self.pen_down,
            color: self.color.clone(),
            history: self.history(),
        }
    }

    fn pen(&mut self, call: &Invocation<'_>, args: &[Argument], _: &mut World) -> ScriptResult<Completion> {
        let enabled = call.boolean(args, 0, "enabled")?;
        self.pen_down = enabled;
        self.record(format!("pen({enabled})"));
        Ok(Completion::Done)
    }

    fn color_call(&mut self, call: &Invocation<'_>, args: &[Argument], _: &mut World) -> ScriptResult<Completion> {
        let color = call.hex_color(args, 0, "hex")?;
        if !is_hex_color(color) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::InvalidValue,
                format!(
                    "Invalid hex color '{color}' provided to {}.{}",
                    call.module, call.function
                ),
            )
            .at(call.location)
            .into());
        }
        self.color = color.to_ascii_lowercase();
        self.record(format!("color({})", self.color));
        Ok(Completion::Done)
    }

    fn record(&mut self, entry: String) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }
}

/// `#rgb` or `#rrggbb`, either case.
fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

impl ScriptModule<World> for DebugModule {
    fn name(&self) -> &str {
        &self.metadata.id
    }

    fn functions(&self) -> Vec<FunctionSignature> {
        signatures(Self::FUNCTIONS)
    }

    fn invoke(&mut self, call: &Invocation<'_>, args: &[Argument], world: &mut World) -> ScriptResult<Completion> {
        dispatch(Self::FUNCTIONS, self, call, args, world)
    }
}

impl MachineModule for DebugModule {
    fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }
}
