use std::time::Duration;

use rover_core::component::ModuleMetadata;
use rover_core::{EntityId, StoreResult, World};

/// A piece of hardware that can be fitted to a [`MachineFrame`](crate::MachineFrame).
///
/// Installed modules are also [`ScriptModule`](rover_script::ScriptModule)s:
/// the frame registers them with a script engine so their functions become
/// callable from scripts.
pub trait MachineModule {
    /// Descriptive metadata shown in bot details.
    fn metadata(&self) -> &ModuleMetadata;

    /// Called when the module is fitted to the frame bound to `entity`.
    fn on_install(&mut self, entity: EntityId) {
        let _ = entity;
    }

    /// Called when the module is taken off its frame.
    fn on_remove(&mut self) {}

    /// Called once per frame tick while installed.
    fn tick(&mut self, delta: Duration, world: &mut World) -> StoreResult<()> {
        let _ = (delta, world);
        Ok(())
    }
}
