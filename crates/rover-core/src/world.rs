use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};

use crate::component::{Component, ComponentInfo, ComponentValue};
use crate::entity::EntityId;
use crate::error::{StoreError, StoreResult};
use crate::event::{ChangeKind, SystemRun, WorldEvent};
use crate::query::Query;

/// Configuration for a [`World`].
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Whether event-level observers are notified at all. When off,
    /// [`World::observe`] hands out inert subscriptions and no events are
    /// built.
    pub instrumentation: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            instrumentation: cfg!(debug_assertions),
        }
    }
}

impl WorldConfig {
    /// Enable or disable observer notification.
    pub fn with_instrumentation(mut self, enabled: bool) -> Self {
        self.instrumentation = enabled;
        self
    }
}

// ---------------------------------------------------------------------------
// Callback registries
// ---------------------------------------------------------------------------

/// Ordered callbacks keyed by a registration id.
pub(crate) struct Registry<F: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Rc<RefCell<F>>)>,
}

impl<F: ?Sized> Registry<F> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, callback: Rc<RefCell<F>>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry, _)| *entry != id);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone out the handles so callbacks may unsubscribe while being called.
    pub(crate) fn handles(&self) -> Vec<Rc<RefCell<F>>> {
        self.entries.iter().map(|(_, cb)| Rc::clone(cb)).collect()
    }
}

pub(crate) type Listener = dyn FnMut(u64);
type Observer = dyn FnMut(&WorldEvent);

/// Handle returned by [`World::subscribe`] and [`World::observe`].
///
/// Dropping the handle does not unsubscribe; call
/// [`Subscription::unsubscribe`].
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription that was never registered.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    pub(crate) fn new<F: ?Sized + 'static>(registry: &Rc<RefCell<Registry<F>>>, id: u64) -> Self {
        let registry: Weak<RefCell<Registry<F>>> = Rc::downgrade(registry);
        Self {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.borrow_mut().remove(id);
                }
            })),
        }
    }

    /// Whether this handle refers to a registered callback.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Remove the callback. Idempotent with respect to the world: removing
    /// an already-removed callback does nothing.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

struct Column {
    info: ComponentInfo,
    values: BTreeMap<EntityId, Rc<dyn Any>>,
}

/// The entity/component store.
///
/// Every mutation that changes state bumps [`World::version`] by exactly one,
/// notifies change listeners, and (if instrumented and observed) emits a
/// [`WorldEvent`].
pub struct World {
    config: WorldConfig,
    next_entity: u64,
    entities: BTreeMap<EntityId, Vec<TypeId>>,
    columns: HashMap<TypeId, Column>,
    version: u64,
    listeners: Rc<RefCell<Registry<Listener>>>,
    observers: Rc<RefCell<Registry<Observer>>>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("component_types", &self.columns.len())
            .field("version", &self.version)
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    /// Create an empty world.
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            next_entity: 1,
            entities: BTreeMap::new(),
            columns: HashMap::new(),
            version: 0,
            listeners: Rc::new(RefCell::new(Registry::new())),
            observers: Rc::new(RefCell::new(Registry::new())),
        }
    }

    /// Whether observers can be notified at all.
    pub fn instrumentation_enabled(&self) -> bool {
        self.config.instrumentation
    }

    // -----------------------------------------------------------------------
    // Entity lifecycle
    // -----------------------------------------------------------------------

    /// Create a new entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(id, Vec::new());
        tracing::trace!(entity = %id, "entity spawned");

        self.emit(|timestamp| WorldEvent::EntityCreated {
            entity: id,
            timestamp,
        });
        self.bump_version();
        id
    }

    /// Remove an entity and all of its components.
    ///
    /// Returns the removed component values, or `None` if the entity did not
    /// exist (which is not an error).
    pub fn despawn(&mut self, id: EntityId) -> Option<Vec<ComponentValue>> {
        let types = self.entities.remove(&id)?;

        let mut snapshot = Vec::with_capacity(types.len());
        for type_id in types {
            let Some(column) = self.columns.get_mut(&type_id) else {
                continue;
            };
            if let Some(value) = column.values.remove(&id) {
                snapshot.push(ComponentValue::new(column.info, value));
            }
        }
        tracing::trace!(entity = %id, components = snapshot.len(), "entity despawned");

        let components = snapshot.clone();
        self.emit(move |timestamp| WorldEvent::EntityDestroyed {
            entity: id,
            components,
            timestamp,
        });
        self.bump_version();
        Some(snapshot)
    }

    /// Whether the entity exists.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Attach or replace a component value.
    pub fn insert<T: Component>(&mut self, id: EntityId, value: T) -> StoreResult<()> {
        self.insert_shared(id, Rc::new(value))
    }

    /// Attach or replace a component with an already shared value.
    ///
    /// Inserting the exact allocation that is already stored is a no-op:
    /// no version bump and no event.
    pub fn insert_shared<T: Component>(&mut self, id: EntityId, value: Rc<T>) -> StoreResult<()> {
        let Some(types) = self.entities.get_mut(&id) else {
            return Err(StoreError::EntityNotFound(id));
        };

        let type_id = TypeId::of::<T>();
        let column = self.columns.entry(type_id).or_insert_with(|| Column {
            info: ComponentInfo::of::<T>(),
            values: BTreeMap::new(),
        });

        let value: Rc<dyn Any> = value;
        let previous = column.values.insert(id, Rc::clone(&value));
        if previous.as_ref().is_some_and(|p| Rc::ptr_eq(p, &value)) {
            return Ok(());
        }
        if previous.is_none() {
            types.push(type_id);
        }

        let info = column.info;
        let change = if previous.is_some() {
            ChangeKind::Updated
        } else {
            ChangeKind::Added
        };
        tracing::trace!(entity = %id, component = info.name(), %change, "component set");

        self.emit(move |timestamp| WorldEvent::ComponentChanged {
            change,
            entity: id,
            component: info,
            previous: previous.map(|v| ComponentValue::new(info, v)),
            value: Some(ComponentValue::new(info, value)),
            timestamp,
        });
        self.bump_version();
        Ok(())
    }

    /// Detach a component, returning the removed value.
    ///
    /// Removing a component the entity does not hold is a no-op.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> StoreResult<Option<Rc<T>>> {
        let Some(types) = self.entities.get_mut(&id) else {
            return Err(StoreError::EntityNotFound(id));
        };

        let type_id = TypeId::of::<T>();
        let Some(column) = self.columns.get_mut(&type_id) else {
            return Ok(None);
        };
        let Some(previous) = column.values.remove(&id) else {
            return Ok(None);
        };
        types.retain(|t| *t != type_id);

        let info = column.info;
        tracing::trace!(entity = %id, component = info.name(), "component removed");

        let removed = Rc::clone(&previous);
        self.emit(move |timestamp| WorldEvent::ComponentChanged {
            change: ChangeKind::Removed,
            entity: id,
            component: info,
            previous: Some(ComponentValue::new(info, previous)),
            value: None,
            timestamp,
        });
        self.bump_version();
        Ok(removed.downcast::<T>().ok())
    }

    /// The entity's current value for `T`, if any. Never fails.
    pub fn get<T: Component>(&self, id: EntityId) -> Option<Rc<T>> {
        let value = self.columns.get(&TypeId::of::<T>())?.values.get(&id)?;
        Rc::clone(value).downcast::<T>().ok()
    }

    /// Whether the entity holds a `T`. Unknown entities hold nothing.
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|types| types.contains(&TypeId::of::<T>()))
    }

    /// All `(entity, value)` pairs of one component type, in ascending id
    /// order.
    pub(crate) fn column<T: Component>(&self) -> impl Iterator<Item = (EntityId, Rc<T>)> + '_ {
        self.columns
            .get(&TypeId::of::<T>())
            .into_iter()
            .flat_map(|column| column.values.iter())
            .filter_map(|(id, value)| Rc::clone(value).downcast::<T>().ok().map(|v| (*id, v)))
    }

    /// Every entity holding all component types in `Q`, with their values.
    ///
    /// Ordering follows the first component type's storage (ascending id).
    pub fn query<Q: Query>(&self) -> Vec<(EntityId, Q::Item)> {
        Q::fetch(self)
    }

    // -----------------------------------------------------------------------
    // Change notification
    // -----------------------------------------------------------------------

    /// Monotonic counter bumped once per state-changing mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register a listener called with the new version after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(u64) + 'static) -> Subscription {
        let callback: Rc<RefCell<Listener>> = Rc::new(RefCell::new(listener));
        let id = self.listeners.borrow_mut().insert(callback);
        Subscription::new(&self.listeners, id)
    }

    /// Register an event-level observer.
    ///
    /// With instrumentation disabled the observer is discarded and the
    /// returned subscription is inert.
    pub fn observe(&mut self, observer: impl FnMut(&WorldEvent) + 'static) -> Subscription {
        if !self.instrumentation_enabled() {
            return Subscription::inert();
        }
        let callback: Rc<RefCell<Observer>> = Rc::new(RefCell::new(observer));
        let id = self.observers.borrow_mut().insert(callback);
        Subscription::new(&self.observers, id)
    }

    /// Forward a system run report to observers. Does not change the version.
    pub fn report_system_run(&self, run: SystemRun) {
        self.emit(move |timestamp| WorldEvent::SystemRun { run, timestamp });
    }

    fn should_notify(&self) -> bool {
        self.instrumentation_enabled() && !self.observers.borrow().is_empty()
    }

    fn emit(&self, make: impl FnOnce(DateTime<Utc>) -> WorldEvent) {
        if !self.should_notify() {
            return;
        }
        let event = make(Utc::now());
        let observers = self.observers.borrow().handles();
        for observer in observers {
            let mut observer = observer.borrow_mut();
            (&mut *observer)(&event);
        }
    }

    fn bump_version(&mut self) {
        self.version += 1;
        notify_listeners(&self.listeners, self.version);
    }
}

/// Call every listener in registration order.
pub(crate) fn notify_listeners(registry: &RefCell<Registry<Listener>>, value: u64) {
    let listeners = registry.borrow().handles();
    for listener in listeners {
        let mut listener = listener.borrow_mut();
        (&mut *listener)(value);
    }
}
