//! Per-tick maintenance of bot components and the controller that runs it.

use std::fmt;
use std::time::Duration;

use rover_core::{StoreResult, World};

mod controller;
mod lifecycle;
mod status;
mod vitals;

pub use controller::{ManualTime, MonotonicTime, TickController, TimeSource};
pub use lifecycle::{HEARTBEAT_RESET, LifecycleSystem};
pub use status::{CRITICAL_BATTERY, LOW_BATTERY, StatusSystem};
pub use vitals::{VitalsConfig, VitalsSystem};

/// A subsystem that runs once per tick.
///
/// Systems are executed in registration order.
pub trait System: fmt::Debug {
    /// Name used in run reports and telemetry.
    fn name(&self) -> &str;

    /// Advance the system by `delta`.
    fn update(&mut self, world: &mut World, delta: Duration) -> StoreResult<()>;
}
