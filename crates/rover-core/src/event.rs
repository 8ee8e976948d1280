use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::component::{ComponentInfo, ComponentValue};
use crate::entity::EntityId;

/// How a component slot changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The slot was empty before.
    Added,
    /// A previous value was replaced.
    Updated,
    /// The value was removed.
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Updated => write!(f, "updated"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// Whether a system run is beginning or has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Reported before the system's update.
    Start,
    /// Reported after the system's update.
    End,
}

/// A report of a system run, as passed to [`World::report_system_run`](crate::World::report_system_run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemRun {
    /// Name of the system.
    pub system: String,
    /// Start or end.
    pub phase: RunPhase,
    /// Tick index the run belongs to.
    pub tick: Option<u64>,
    /// Measured duration in milliseconds, usually only on `End`.
    pub duration_ms: Option<f64>,
    /// Free-form extra data, e.g. the frame delta.
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl SystemRun {
    /// A run report with only a name and phase.
    pub fn new(system: impl Into<String>, phase: RunPhase) -> Self {
        Self {
            system: system.into(),
            phase,
            tick: None,
            duration_ms: None,
            metadata: None,
        }
    }

    /// Set the tick index.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Set the measured duration.
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Everything a world observer can be told about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WorldEvent {
    /// An entity was spawned.
    EntityCreated {
        /// The new entity.
        entity: EntityId,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// An entity was despawned along with all of its components.
    EntityDestroyed {
        /// The removed entity.
        entity: EntityId,
        /// The component values it held at removal.
        components: Vec<ComponentValue>,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// A component was added, replaced, or removed.
    ComponentChanged {
        /// What kind of change.
        change: ChangeKind,
        /// The affected entity.
        entity: EntityId,
        /// The component type.
        component: ComponentInfo,
        /// The value before the change, if any.
        previous: Option<ComponentValue>,
        /// The value after the change; `None` for removals.
        value: Option<ComponentValue>,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// A system reported a run phase.
    SystemRun {
        /// The report.
        #[serde(flatten)]
        run: SystemRun,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
}

impl WorldEvent {
    /// The entity this event concerns, if any.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::EntityCreated { entity, .. }
            | Self::EntityDestroyed { entity, .. }
            | Self::ComponentChanged { entity, .. } => Some(*entity),
            Self::SystemRun { .. } => None,
        }
    }

    /// When the event was emitted.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::EntityCreated { timestamp, .. }
            | Self::EntityDestroyed { timestamp, .. }
            | Self::ComponentChanged { timestamp, .. }
            | Self::SystemRun { timestamp, .. } => *timestamp,
        }
    }

    /// Short label of the variant, matching the serialized `type` tag.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EntityCreated { .. } => "entity-created",
            Self::EntityDestroyed { .. } => "entity-destroyed",
            Self::ComponentChanged { .. } => "component-changed",
            Self::SystemRun { .. } => "system-run",
        }
    }
}
