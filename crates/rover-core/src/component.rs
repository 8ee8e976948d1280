use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::EntityStatus;

/// A piece of typed data that can be attached to an entity.
///
/// The component's identity is its Rust type, not [`Component::NAME`]: two
/// types may share a name and still occupy separate storage.
pub trait Component: fmt::Debug + 'static {
    /// Human-readable name used in telemetry and error messages.
    const NAME: &'static str;
}

/// Type-erased description of a component type.
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    name: &'static str,
    type_id: TypeId,
    debug: fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl ComponentInfo {
    /// Describe the component type `T`.
    pub fn of<T: Component>() -> Self {
        Self {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            debug: debug_erased::<T>,
        }
    }

    /// The component's display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The identity token the store indexes by.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ComponentInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentInfo {}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentInfo").field(&self.name).finish()
    }
}

impl Serialize for ComponentInfo {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

fn debug_erased<T: Component>(value: &dyn Any, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(v) => fmt::Debug::fmt(v, f),
        None => write!(f, "<{}>", T::NAME),
    }
}

/// A shared, type-erased component value as carried by world events.
#[derive(Clone)]
pub struct ComponentValue {
    info: ComponentInfo,
    value: Rc<dyn Any>,
}

impl ComponentValue {
    pub(crate) fn new(info: ComponentInfo, value: Rc<dyn Any>) -> Self {
        Self { info, value }
    }

    /// Describes the component type of this value.
    pub fn info(&self) -> ComponentInfo {
        self.info
    }

    /// Recover the typed value, if it is a `T`.
    pub fn downcast<T: Component>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.value).downcast::<T>().ok()
    }

    /// Whether both values are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    /// Render the value with its `Debug` implementation.
    pub fn render(&self) -> String {
        format!("{self:?}")
    }
}

impl fmt::Debug for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.info.debug)(self.value.as_ref(), f)
    }
}

impl Serialize for ComponentValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ComponentValue", 2)?;
        state.serialize_field("component", self.info.name)?;
        state.serialize_field("value", &self.render())?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identity of a bot, independent of its [`EntityId`](crate::EntityId).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Globally unique serial.
    pub serial: Uuid,
    /// Short operator handle, e.g. `alpha`.
    pub callsign: String,
    /// Display name.
    pub name: String,
}

impl Identity {
    /// Create an identity with a fresh random serial.
    pub fn new(callsign: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            serial: Uuid::new_v4(),
            callsign: callsign.into(),
            name: name.into(),
        }
    }
}

impl Component for Identity {
    const NAME: &'static str = "identity";
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Location on the 2D field. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Component for Position {
    const NAME: &'static str = "position";
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The displayed operating status of a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Current state.
    pub state: EntityStatus,
}

impl Status {
    /// Create a status component.
    pub fn new(state: EntityStatus) -> Self {
        Self { state }
    }
}

impl Component for Status {
    const NAME: &'static str = "status";
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// Broad classification of a capability module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    /// Reads the environment.
    Sensor,
    /// Acts on the environment.
    Actuator,
    /// Tooling and instrumentation.
    Utility,
    /// Communication.
    Comm,
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor => write!(f, "sensor"),
            Self::Actuator => write!(f, "actuator"),
            Self::Utility => write!(f, "utility"),
            Self::Comm => write!(f, "comm"),
        }
    }
}

/// Descriptive metadata for a capability module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Short machine id, e.g. `motor`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub category: ModuleCategory,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional power draw in watts.
    pub power_draw: Option<f64>,
}

impl ModuleMetadata {
    /// Create metadata with no description or power draw.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ModuleCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: None,
            power_draw: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a power draw.
    pub fn with_power_draw(mut self, watts: f64) -> Self {
        self.power_draw = Some(watts);
        self
    }
}

/// The modules fitted to a bot, as shown in its details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modules {
    /// Fitted modules in installation order.
    pub items: Vec<ModuleMetadata>,
}

impl Component for Modules {
    const NAME: &'static str = "modules";
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Uptime bookkeeping maintained by the lifecycle system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Whole seconds since boot.
    pub uptime_seconds: u64,
    /// Human-readable age of the last heartbeat, e.g. `1.5s ago`.
    pub last_heartbeat: String,
    /// Operator notes.
    pub notes: String,
}

impl Lifecycle {
    /// A freshly booted lifecycle.
    pub fn booted(notes: impl Into<String>) -> Self {
        Self {
            uptime_seconds: 0,
            last_heartbeat: "just now".to_string(),
            notes: notes.into(),
        }
    }
}

impl Component for Lifecycle {
    const NAME: &'static str = "lifecycle";
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// Power and thermal readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Battery charge in percent, `0.0..=100.0`.
    pub battery_level: f64,
    /// Core temperature in degrees Celsius.
    pub temperature_c: f64,
}

impl Component for Vitals {
    const NAME: &'static str = "vitals";
}
