use std::collections::HashMap;
use std::time::Duration;

use rover_core::component::{Status, Vitals};
use rover_core::status::apply_trigger;
use rover_core::{EntityId, StatusTrigger, StoreResult, World};

use super::System;

/// Battery percent below which a bot faults.
pub const CRITICAL_BATTERY: f64 = 15.0;
/// Battery percent below which a bot's battery counts as low. Climbing
/// back above it clears a battery fault.
pub const LOW_BATTERY: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatteryBand {
    Healthy,
    Low,
    Critical,
}

impl BatteryBand {
    fn of(level: f64) -> Self {
        if level < CRITICAL_BATTERY {
            Self::Critical
        } else if level < LOW_BATTERY {
            Self::Low
        } else {
            Self::Healthy
        }
    }

    fn trigger(self) -> StatusTrigger {
        match self {
            Self::Healthy => StatusTrigger::BatteryRestored,
            Self::Low => StatusTrigger::BatteryLow,
            Self::Critical => StatusTrigger::BatteryCritical,
        }
    }
}

/// Feeds battery band changes into each bot's status state machine.
///
/// Triggers fire only when a bot crosses into a new band, so motion and
/// faults set elsewhere are left alone while the battery is steady. A bot
/// first seen with a healthy battery keeps its current status.
#[derive(Debug, Default)]
pub struct StatusSystem {
    bands: HashMap<EntityId, BatteryBand>,
}

impl System for StatusSystem {
    fn name(&self) -> &str {
        "status"
    }

    fn update(&mut self, world: &mut World, _delta: Duration) -> StoreResult<()> {
        self.bands.retain(|entity, _| world.contains(*entity));

        for (entity, (_, vitals)) in world.query::<(Status, Vitals)>() {
            let band = BatteryBand::of(vitals.battery_level);
            let previous = self.bands.insert(entity, band);
            let crossed = match previous {
                Some(previous) => previous != band,
                None => band != BatteryBand::Healthy,
            };
            if crossed {
                apply_trigger(world, entity, band.trigger())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_core::EntityStatus;

    fn bot(world: &mut World, state: EntityStatus, battery_level: f64) -> EntityId {
        let id = world.spawn();
        world.insert(id, Status::new(state)).unwrap();
        world
            .insert(
                id,
                Vitals {
                    battery_level,
                    temperature_c: 30.0,
                },
            )
            .unwrap();
        id
    }

    fn set_battery(world: &mut World, id: EntityId, battery_level: f64) {
        world
            .insert(
                id,
                Vitals {
                    battery_level,
                    temperature_c: 30.0,
                },
            )
            .unwrap();
    }

    fn state(world: &World, id: EntityId) -> EntityStatus {
        world.get::<Status>(id).unwrap().state
    }

    #[test]
    fn healthy_bots_keep_their_status() {
        let mut world = World::default();
        let moving = bot(&mut world, EntityStatus::Moving, 82.0);
        let faulted = bot(&mut world, EntityStatus::Error, 48.0);
        let mut system = StatusSystem::default();

        system.update(&mut world, Duration::ZERO).unwrap();

        assert_eq!(state(&world, moving), EntityStatus::Moving);
        assert_eq!(state(&world, faulted), EntityStatus::Error);
    }

    #[test]
    fn low_battery_leaves_motion_running() {
        let mut world = World::default();
        let id = bot(&mut world, EntityStatus::Moving, 50.0);
        let mut system = StatusSystem::default();
        system.update(&mut world, Duration::ZERO).unwrap();

        set_battery(&mut world, id, 44.0);
        let version = world.version();
        system.update(&mut world, Duration::ZERO).unwrap();
        assert_eq!(state(&world, id), EntityStatus::Moving);
        assert_eq!(world.version(), version);

        set_battery(&mut world, id, 10.0);
        system.update(&mut world, Duration::ZERO).unwrap();
        assert_eq!(state(&world, id), EntityStatus::Error);
    }

    #[test]
    fn critical_battery_faults_and_recovery_clears() {
        let mut world = World::default();
        let id = bot(&mut world, EntityStatus::Idle, 10.0);
        let mut system = StatusSystem::default();

        system.update(&mut world, Duration::ZERO).unwrap();
        assert_eq!(state(&world, id), EntityStatus::Error);

        set_battery(&mut world, id, 30.0);
        system.update(&mut world, Duration::ZERO).unwrap();
        assert_eq!(state(&world, id), EntityStatus::Error);

        set_battery(&mut world, id, 90.0);
        system.update(&mut world, Duration::ZERO).unwrap();
        assert_eq!(state(&world, id), EntityStatus::Idle);
    }

    #[test]
    fn steady_band_writes_nothing() {
        let mut world = World::default();
        bot(&mut world, EntityStatus::Idle, 20.0);
        let mut system = StatusSystem::default();
        system.update(&mut world, Duration::ZERO).unwrap();
        let version = world.version();
        system.update(&mut world, Duration::ZERO).unwrap();
        assert_eq!(world.version(), version);
    }
}
