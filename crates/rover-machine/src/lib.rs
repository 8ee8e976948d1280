//! Bot hardware and upkeep.
//!
//! A [`MachineFrame`] binds capability modules ([`MotorModule`],
//! [`DebugModule`]) to one entity and registers their script functions
//! with a [`ScriptEngine`](rover_script::ScriptEngine). [`BotEnvironment`]
//! bundles a world with a fitted frame for running scripts against a
//! single bot. The [`systems`] keep bot vitals current between scripts.

/// Demo and random world population.
pub mod bootstrap;
/// One scriptable bot with its world.
pub mod environment;
/// The machine frame.
pub mod frame;
/// The hardware-side module interface.
pub mod module;
pub mod modules;
pub mod systems;

pub use bootstrap::{BotSpec, demo_roster, find_by_callsign, populate_demo_world, populate_random};
pub use environment::{BotEnvironment, RunFailure, RunReport};
pub use frame::MachineFrame;
pub use module::MachineModule;
pub use modules::{DebugModule, DebugSnapshot, MotorConfig, MotorModule, Translation};
pub use systems::{System, TickController};
