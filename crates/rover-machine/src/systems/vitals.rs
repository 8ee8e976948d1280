use std::collections::HashMap;
use std::time::Duration;

use rover_core::component::Vitals;
use rover_core::{EntityId, StoreResult, World};

use super::System;

/// Rates used by the [`VitalsSystem`].
#[derive(Debug, Clone)]
pub struct VitalsConfig {
    /// Battery percent lost per second.
    pub battery_drain_per_second: f64,
    /// Radians per second of the temperature oscillation.
    pub temperature_phase_speed: f64,
    /// Peak deviation from the baseline temperature, in degrees.
    pub temperature_amplitude: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            battery_drain_per_second: 0.05,
            temperature_phase_speed: 0.8,
            temperature_amplitude: 0.4,
        }
    }
}

impl VitalsConfig {
    /// Set the battery drain in percent per second.
    pub fn with_battery_drain(mut self, per_second: f64) -> Self {
        self.battery_drain_per_second = per_second;
        self
    }

    /// Set the temperature oscillation speed and amplitude.
    pub fn with_temperature_wave(mut self, phase_speed: f64, amplitude: f64) -> Self {
        self.temperature_phase_speed = phase_speed;
        self.temperature_amplitude = amplitude;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Thermal {
    phase: f64,
    baseline: f64,
}

/// Drains batteries and oscillates temperatures around the value each
/// bot had when first seen.
#[derive(Debug, Default)]
pub struct VitalsSystem {
    config: VitalsConfig,
    thermals: HashMap<EntityId, Thermal>,
}

impl VitalsSystem {
    /// A system with custom rates.
    pub fn new(config: VitalsConfig) -> Self {
        Self {
            config,
            thermals: HashMap::new(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl System for VitalsSystem {
    fn name(&self) -> &str {
        "vitals"
    }

    fn update(&mut self, world: &mut World, delta: Duration) -> StoreResult<()> {
        let seconds = delta.as_secs_f64();
        self.thermals.retain(|entity, _| world.contains(*entity));

        for (entity, (vitals,)) in world.query::<(Vitals,)>() {
            let thermal = self.thermals.entry(entity).or_insert(Thermal {
                phase: 0.0,
                baseline: vitals.temperature_c,
            });
            thermal.phase += seconds * self.config.temperature_phase_speed;
            let temperature_c =
                round2(thermal.baseline + thermal.phase.sin() * self.config.temperature_amplitude);

            let drained = vitals.battery_level - seconds * self.config.battery_drain_per_second;
            let battery_level = round2(drained.max(0.0));

            world.insert(
                entity,
                Vitals {
                    battery_level,
                    temperature_c,
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_vitals(battery_level: f64) -> (World, EntityId) {
        let mut world = World::default();
        let bot = world.spawn();
        world
            .insert(
                bot,
                Vitals {
                    battery_level,
                    temperature_c: 36.5,
                },
            )
            .unwrap();
        (world, bot)
    }

    #[test]
    fn battery_drains_per_second() {
        let (mut world, bot) = world_with_vitals(82.0);
        let mut system = VitalsSystem::default();
        system.update(&mut world, Duration::from_secs(10)).unwrap();
        assert!((world.get::<Vitals>(bot).unwrap().battery_level - 81.5).abs() < 1e-9);
    }

    #[test]
    fn battery_never_goes_negative() {
        let (mut world, bot) = world_with_vitals(0.01);
        let mut system = VitalsSystem::default();
        system.update(&mut world, Duration::from_secs(60)).unwrap();
        assert_eq!(world.get::<Vitals>(bot).unwrap().battery_level, 0.0);
    }

    #[test]
    fn temperature_oscillates_around_baseline() {
        let (mut world, bot) = world_with_vitals(50.0);
        let mut system = VitalsSystem::default();
        let mut seen = Vec::new();
        for _ in 0..40 {
            system.update(&mut world, Duration::from_millis(250)).unwrap();
            seen.push(world.get::<Vitals>(bot).unwrap().temperature_c);
        }
        assert!(seen.iter().all(|t| (t - 36.5).abs() <= 0.4 + 1e-9));
        assert!(seen.iter().any(|t| *t > 36.8));
        assert!(seen.iter().any(|t| *t < 36.2));
    }

    #[test]
    fn custom_rates() {
        let (mut world, bot) = world_with_vitals(50.0);
        let mut system = VitalsSystem::new(
            VitalsConfig::default()
                .with_battery_drain(1.0)
                .with_temperature_wave(0.0, 0.0),
        );
        system.update(&mut world, Duration::from_secs(2)).unwrap();
        let vitals = world.get::<Vitals>(bot).unwrap();
        assert!((vitals.battery_level - 48.0).abs() < 1e-9);
        assert!((vitals.temperature_c - 36.5).abs() < 1e-9);
    }
}
