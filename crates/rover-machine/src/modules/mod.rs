//! Capability modules that can be fitted to a [`MachineFrame`](crate::MachineFrame).

/// Pen and color instrumentation.
pub mod debug;
/// Directional drive.
pub mod motor;

pub use debug::{DebugModule, DebugSnapshot};
pub use motor::{MotorConfig, MotorModule, Translation, normalize_heading};
