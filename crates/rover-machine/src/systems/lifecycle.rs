use std::collections::HashMap;
use std::time::Duration;

use rover_core::component::Lifecycle;
use rover_core::{EntityId, StoreResult, World};

use super::System;

/// Heartbeat age at which the label resets to `just now`.
pub const HEARTBEAT_RESET: Duration = Duration::from_secs(5);

#[derive(Debug, Default, Clone, Copy)]
struct Heartbeat {
    since: f64,
    /// Fractional seconds not yet counted into uptime.
    carry: f64,
}

/// Advances uptime and refreshes the heartbeat label of every
/// [`Lifecycle`].
#[derive(Debug, Default)]
pub struct LifecycleSystem {
    heartbeats: HashMap<EntityId, Heartbeat>,
}

impl System for LifecycleSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn update(&mut self, world: &mut World, delta: Duration) -> StoreResult<()> {
        let seconds = delta.as_secs_f64();
        self.heartbeats.retain(|entity, _| world.contains(*entity));

        for (entity, (lifecycle,)) in world.query::<(Lifecycle,)>() {
            let heartbeat = self.heartbeats.entry(entity).or_default();

            heartbeat.since += seconds;
            let last_heartbeat = if heartbeat.since >= HEARTBEAT_RESET.as_secs_f64() {
                heartbeat.since = 0.0;
                "just now".to_string()
            } else {
                format!("{:.1}s ago", heartbeat.since)
            };

            heartbeat.carry += seconds;
            let whole = heartbeat.carry.floor();
            heartbeat.carry -= whole;

            world.insert(
                entity,
                Lifecycle {
                    uptime_seconds: lifecycle.uptime_seconds + whole as u64,
                    last_heartbeat,
                    notes: lifecycle.notes.clone(),
                },
            )?;
        }
        Ok(())
    }
}
