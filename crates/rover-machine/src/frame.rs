use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use rover_core::component::ModuleMetadata;
use rover_core::{EntityId, StoreResult, World};
use rover_script::{RegistrationError, ScriptEngine, ScriptModule, SharedModule};

use crate::module::MachineModule;

struct Installed {
    machine: Rc<RefCell<dyn MachineModule>>,
    script: SharedModule<World>,
}

/// The chassis of one bot: an ordered set of modules bound to an entity.
pub struct MachineFrame {
    entity: EntityId,
    modules: Vec<Installed>,
}

impl fmt::Debug for MachineFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineFrame")
            .field("entity", &self.entity)
            .field("modules", &self.modules().iter().map(|m| m.id.clone()).collect::<Vec<_>>())
            .finish()
    }
}

impl MachineFrame {
    /// An empty frame bound to `entity`.
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            modules: Vec::new(),
        }
    }

    /// The entity this frame drives.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Fit a module. Installing the same instance twice does nothing.
    ///
    /// Returns whether the module was newly installed.
    pub fn install<M>(&mut self, module: &Rc<RefCell<M>>) -> bool
    where
        M: MachineModule + ScriptModule<World> + 'static,
    {
        if self.position(module).is_some() {
            return false;
        }
        module.borrow_mut().on_install(self.entity);
        tracing::debug!(
            entity = %self.entity,
            module = %module.borrow().metadata().id,
            "module installed"
        );
        let machine: Rc<RefCell<dyn MachineModule>> = module.clone();
        let script: SharedModule<World> = module.clone();
        self.modules.push(Installed { machine, script });
        true
    }

    /// Take a module off the frame. Absent modules are ignored.
    ///
    /// Returns whether the module was installed.
    pub fn remove<M: MachineModule + 'static>(&mut self, module: &Rc<RefCell<M>>) -> bool {
        let Some(index) = self.position(module) else {
            return false;
        };
        let installed = self.modules.remove(index);
        installed.machine.borrow_mut().on_remove();
        tracing::debug!(
            entity = %self.entity,
            module = %installed.machine.borrow().metadata().id,
            "module removed"
        );
        true
    }

    /// Metadata of installed modules, in installation order.
    pub fn modules(&self) -> Vec<ModuleMetadata> {
        self.modules
            .iter()
            .map(|m| m.machine.borrow().metadata().clone())
            .collect()
    }

    /// Number of installed modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no modules are installed.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Register every installed module's script API, in installation order.
    pub fn register_apis(&self, engine: &mut ScriptEngine<World>) -> Result<(), RegistrationError> {
        for installed in &self.modules {
            engine.register_module(Rc::clone(&installed.script))?;
        }
        Ok(())
    }

    /// Forward a frame tick to every module, in installation order.
    pub fn tick(&self, delta: Duration, world: &mut World) -> StoreResult<()> {
        for installed in &self.modules {
            installed.machine.borrow_mut().tick(delta, world)?;
        }
        Ok(())
    }

    fn position<M>(&self, module: &Rc<RefCell<M>>) -> Option<usize> {
        let target = Rc::as_ptr(module);
        self.modules
            .iter()
            .position(|m| std::ptr::addr_eq(Rc::as_ptr(&m.machine), target))
    }
}
