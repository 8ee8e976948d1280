use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::Serialize;

use crate::entity::EntityId;
use crate::event::{ChangeKind, RunPhase, SystemRun, WorldEvent};
use crate::world::{Listener, Registry, Subscription, World, notify_listeners};

/// Default number of events kept in the ring buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 200;

/// Configuration for [`WorldTelemetry`].
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Maximum number of events kept; older events are evicted first.
    pub buffer_size: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl TelemetryConfig {
    /// Set the ring buffer capacity.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

/// Counters for one component type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentChangeStats {
    /// Number of `added` changes.
    pub added: u64,
    /// Number of `updated` changes.
    pub updated: u64,
    /// Number of `removed` changes.
    pub removed: u64,
    /// Debug rendering of the most recent value (`None` after a removal).
    pub last_value: Option<String>,
}

/// Run statistics for one system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemRunStats {
    /// Number of reports received, start and end phases alike.
    pub runs: u64,
    /// Sum of all reported durations.
    pub total_duration_ms: f64,
    /// Duration of the latest report, if it carried one.
    pub last_duration_ms: Option<f64>,
    /// Number of reports that carried a duration.
    pub timed_runs: u64,
    /// Phase of the latest report.
    pub last_phase: RunPhase,
    /// Tick of the latest report.
    pub last_tick: Option<u64>,
    /// Metadata of the latest report.
    pub last_metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl SystemRunStats {
    fn new(phase: RunPhase) -> Self {
        Self {
            runs: 0,
            total_duration_ms: 0.0,
            last_duration_ms: None,
            timed_runs: 0,
            last_phase: phase,
            last_tick: None,
            last_metadata: None,
        }
    }

    /// Mean duration over the timed reports.
    pub fn average_duration_ms(&self) -> Option<f64> {
        (self.timed_runs > 0).then(|| self.total_duration_ms / self.timed_runs as f64)
    }
}

/// A point-in-time copy of everything the aggregator has recorded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    /// The most recent events, oldest first.
    pub events: Vec<WorldEvent>,
    /// Events recorded since attach or the last clear, including evicted ones.
    pub total_events: u64,
    /// Per component name.
    pub component_changes: BTreeMap<String, ComponentChangeStats>,
    /// Events recorded per entity.
    pub entity_event_counts: BTreeMap<EntityId, u64>,
    /// Per system name.
    pub system_runs: BTreeMap<String, SystemRunStats>,
}

#[derive(Debug)]
struct TelemetryState {
    buffer_size: usize,
    events: VecDeque<WorldEvent>,
    total_events: u64,
    component_changes: BTreeMap<String, ComponentChangeStats>,
    entity_event_counts: BTreeMap<EntityId, u64>,
    system_runs: BTreeMap<String, SystemRunStats>,
}

impl TelemetryState {
    fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            events: VecDeque::with_capacity(buffer_size.min(1024)),
            total_events: 0,
            component_changes: BTreeMap::new(),
            entity_event_counts: BTreeMap::new(),
            system_runs: BTreeMap::new(),
        }
    }

    fn record(&mut self, event: &WorldEvent) -> u64 {
        self.total_events += 1;
        self.events.push_back(event.clone());
        while self.events.len() > self.buffer_size {
            self.events.pop_front();
        }

        match event {
            WorldEvent::EntityCreated { entity, .. } | WorldEvent::EntityDestroyed { entity, .. } => {
                self.count_entity(*entity);
            }
            WorldEvent::ComponentChanged {
                change,
                entity,
                component,
                value,
                ..
            } => {
                self.count_entity(*entity);
                let stats = self
                    .component_changes
                    .entry(component.name().to_string())
                    .or_default();
                match change {
                    ChangeKind::Added => stats.added += 1,
                    ChangeKind::Updated => stats.updated += 1,
                    ChangeKind::Removed => stats.removed += 1,
                }
                stats.last_value = value.as_ref().map(|v| v.render());
            }
            WorldEvent::SystemRun { run, .. } => self.record_run(run),
        }

        self.total_events
    }

    fn count_entity(&mut self, entity: EntityId) {
        *self.entity_event_counts.entry(entity).or_insert(0) += 1;
    }

    fn record_run(&mut self, run: &SystemRun) {
        let stats = self
            .system_runs
            .entry(run.system.clone())
            .or_insert_with(|| SystemRunStats::new(run.phase));

        stats.runs += 1;
        match run.duration_ms {
            Some(duration) => {
                stats.total_duration_ms += duration;
                stats.last_duration_ms = Some(duration);
                stats.timed_runs += 1;
            }
            None => stats.last_duration_ms = None,
        }
        stats.last_phase = run.phase;
        stats.last_tick = run.tick;
        stats.last_metadata = run.metadata.clone();
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            events: self.events.iter().cloned().collect(),
            total_events: self.total_events,
            component_changes: self.component_changes.clone(),
            entity_event_counts: self.entity_event_counts.clone(),
            system_runs: self.system_runs.clone(),
        }
    }

    fn clear(&mut self) {
        self.events.clear();
        self.total_events = 0;
        self.component_changes.clear();
        self.entity_event_counts.clear();
        self.system_runs.clear();
    }
}

/// Aggregates [`WorldEvent`]s from one world into inspectable statistics.
///
/// Attaching registers a world observer, so the world must be
/// instrumented for anything to be recorded.
pub struct WorldTelemetry {
    state: Rc<RefCell<TelemetryState>>,
    listeners: Rc<RefCell<Registry<Listener>>>,
    subscription: Option<Subscription>,
}

impl std::fmt::Debug for WorldTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("WorldTelemetry")
            .field("buffer_size", &state.buffer_size)
            .field("total_events", &state.total_events)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl WorldTelemetry {
    /// Start recording the world's events.
    pub fn attach(world: &mut World, config: TelemetryConfig) -> Self {
        let state = Rc::new(RefCell::new(TelemetryState::new(config.buffer_size)));
        let listeners = Rc::new(RefCell::new(Registry::<Listener>::new()));

        let subscription = {
            let state = Rc::clone(&state);
            let listeners = Rc::clone(&listeners);
            world.observe(move |event| {
                let total = state.borrow_mut().record(event);
                notify_listeners(&listeners, total);
            })
        };
        if !subscription.is_active() {
            tracing::warn!("telemetry attached to an uninstrumented world; nothing will be recorded");
        }

        Self {
            state,
            listeners,
            subscription: Some(subscription),
        }
    }

    /// Whether the aggregator is still receiving events.
    pub fn is_attached(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Copy out the current statistics.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.state.borrow().snapshot()
    }

    /// Register a listener called with the running event total after each
    /// recorded event, and with `0` after [`WorldTelemetry::clear`].
    pub fn subscribe(&self, listener: impl FnMut(u64) + 'static) -> Subscription {
        let callback: Rc<RefCell<Listener>> = Rc::new(RefCell::new(listener));
        let id = self.listeners.borrow_mut().insert(callback);
        Subscription::new(&self.listeners, id)
    }

    /// Reset every counter and empty the buffer.
    pub fn clear(&self) {
        self.state.borrow_mut().clear();
        notify_listeners(&self.listeners, 0);
    }

    /// Stop observing the world. Recorded data stays readable.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::component::Position;
    use crate::world::WorldConfig;

    fn instrumented() -> World {
        World::new(WorldConfig::default().with_instrumentation(true))
    }

    #[test]
    fn counts_component_changes() {
        let mut world = instrumented();
        let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());

        let e = world.spawn();
        world.insert(e, Position::new(1.0, 2.0)).unwrap();
        world.insert(e, Position::new(3.0, 4.0)).unwrap();
        world.remove::<Position>(e).unwrap();

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.total_events, 4);
        let stats = &snapshot.component_changes["position"];
        assert_eq!((stats.added, stats.updated, stats.removed), (1, 1, 1));
        assert!(stats.last_value.is_none());
        assert_eq!(snapshot.entity_event_counts[&e], 4);
    }

    #[test]
    fn last_value_is_rendered() {
        let mut world = instrumented();
        let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());
        let e = world.spawn();
        world.insert(e, Position::new(1.0, 2.0)).unwrap();
        let snapshot = telemetry.snapshot();
        assert_eq!(
            snapshot.component_changes["position"].last_value.as_deref(),
            Some("Position { x: 1.0, y: 2.0 }")
        );
    }

    #[test]
    fn buffer_evicts_oldest() {
        let mut world = instrumented();
        let telemetry =
            WorldTelemetry::attach(&mut world, TelemetryConfig::default().with_buffer_size(3));
        let ids: Vec<_> = (0..5).map(|_| world.spawn()).collect();

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.total_events, 5);
        assert_eq!(snapshot.events.len(), 3);
        assert_eq!(snapshot.events[0].entity(), Some(ids[2]));
        assert_eq!(snapshot.events[2].entity(), Some(ids[4]));
    }

    #[test]
    fn system_run_stats_average_timed_runs() {
        let mut world = instrumented();
        let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());

        world.report_system_run(SystemRun::new("vitals", RunPhase::Start).with_tick(1));
        world.report_system_run(
            SystemRun::new("vitals", RunPhase::End)
                .with_tick(1)
                .with_duration_ms(2.0),
        );
        world.report_system_run(
            SystemRun::new("vitals", RunPhase::End)
                .with_tick(2)
                .with_duration_ms(4.0)
                .with_metadata("delta_ms", 16.0),
        );

        let snapshot = telemetry.snapshot();
        let stats = &snapshot.system_runs["vitals"];
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.total_duration_ms, 6.0);
        assert_eq!(stats.last_duration_ms, Some(4.0));
        assert_eq!(stats.average_duration_ms(), Some(3.0));
        assert_eq!(stats.last_phase, RunPhase::End);
        assert_eq!(stats.last_tick, Some(2));
        assert!(stats.last_metadata.as_ref().unwrap().contains_key("delta_ms"));
        assert!(snapshot.entity_event_counts.is_empty());
    }

    #[test]
    fn listeners_and_clear() {
        let mut world = instrumented();
        let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());
        let last = Rc::new(Cell::new(u64::MAX));
        let sink = Rc::clone(&last);
        let sub = telemetry.subscribe(move |total| sink.set(total));

        world.spawn();
        world.spawn();
        assert_eq!(last.get(), 2);

        telemetry.clear();
        assert_eq!(last.get(), 0);
        assert_eq!(telemetry.snapshot().total_events, 0);
        assert!(telemetry.snapshot().events.is_empty());

        sub.unsubscribe();
        world.spawn();
        assert_eq!(last.get(), 0);
    }

    #[test]
    fn detach_stops_recording() {
        let mut world = instrumented();
        let mut telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());
        world.spawn();
        telemetry.detach();
        world.spawn();
        assert!(!telemetry.is_attached());
        assert_eq!(telemetry.snapshot().total_events, 1);
    }

    #[test]
    fn uninstrumented_world_records_nothing() {
        let mut world = World::new(WorldConfig::default().with_instrumentation(false));
        let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());
        world.spawn();
        assert!(!telemetry.is_attached());
        assert_eq!(telemetry.snapshot().total_events, 0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut world = instrumented();
        let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());
        let e = world.spawn();
        world.insert(e, Position::new(0.0, 0.0)).unwrap();
        let json = serde_json::to_value(telemetry.snapshot()).unwrap();
        assert_eq!(json["total_events"], 2);
        assert_eq!(json["component_changes"]["position"]["added"], 1);
        assert_eq!(json["events"][1]["type"], "component-changed");
    }
}
