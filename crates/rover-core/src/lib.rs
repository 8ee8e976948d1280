//! Core types for rover: the entity/component store, world events, and
//! the telemetry aggregator that observes them.
//!
//! This crate knows nothing about scripting. Anything that wants to read or
//! mutate bots (per-tick systems, script modules, a UI) goes through
//! [`World`].

/// Typed component data (position, status, vitals, etc.).
pub mod component;
/// Entity identifiers.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Events emitted by the world to its observers.
pub mod event;
/// Tuple queries and the versioned query cache.
pub mod query;
/// Explicit status state machine for bots.
pub mod status;
/// Aggregation of world events into inspectable statistics.
pub mod telemetry;
/// The central store that owns entities and their components.
pub mod world;

/// Re-export component traits and values.
pub use component::{Component, ComponentInfo, ComponentValue};
/// Re-export entity types.
pub use entity::EntityId;
/// Re-export error types.
pub use error::{StoreError, StoreResult};
/// Re-export event types.
pub use event::{ChangeKind, RunPhase, SystemRun, WorldEvent};
/// Re-export query types.
pub use query::{CachedQuery, Query};
/// Re-export status types.
pub use status::{EntityStatus, StatusTrigger};
/// Re-export telemetry types.
pub use telemetry::{
    ComponentChangeStats, SystemRunStats, TelemetryConfig, TelemetrySnapshot, WorldTelemetry,
};
/// Re-export world model types.
pub use world::{Subscription, World, WorldConfig};
