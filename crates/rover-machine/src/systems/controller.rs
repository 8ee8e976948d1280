use std::fmt;
use std::time::{Duration, Instant};

use rover_core::{RunPhase, StoreResult, SystemRun, World};

use super::{LifecycleSystem, StatusSystem, System, VitalsSystem};

/// Where the controller reads time from when measuring system runs.
pub trait TimeSource: fmt::Debug {
    /// Time since an arbitrary fixed origin.
    fn now(&mut self) -> Duration;
}

/// Wall-clock time from [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicTime {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// A fake clock that advances by a fixed step every time it is read.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Duration,
    step: Duration,
}

impl ManualTime {
    /// A clock that moves forward by `step` per read.
    pub fn new(step: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            step,
        }
    }
}

impl TimeSource for ManualTime {
    fn now(&mut self) -> Duration {
        let current = self.now;
        self.now += self.step;
        current
    }
}

/// Runs registered systems once per tick and reports each run to the
/// world's observers.
pub struct TickController {
    systems: Vec<Box<dyn System>>,
    time: Box<dyn TimeSource>,
    tick: u64,
}

impl fmt::Debug for TickController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickController")
            .field("tick", &self.tick)
            .field("systems", &self.system_names())
            .finish()
    }
}

impl Default for TickController {
    fn default() -> Self {
        Self::new()
    }
}

impl TickController {
    /// A controller with no systems, timed by [`MonotonicTime`].
    pub fn new() -> Self {
        Self::with_time_source(MonotonicTime::default())
    }

    /// A controller with no systems, timed by `time`.
    pub fn with_time_source(time: impl TimeSource + 'static) -> Self {
        Self {
            systems: Vec::new(),
            time: Box::new(time),
            tick: 0,
        }
    }

    /// Register the lifecycle, vitals, and status systems, in that order.
    pub fn with_default_systems(mut self) -> Self {
        self.add_system(LifecycleSystem::default());
        self.add_system(VitalsSystem::default());
        self.add_system(StatusSystem::default());
        self
    }

    /// Register a system. Systems run in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Names of registered systems, in run order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Ticks completed so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Run every system once with `delta` of simulated time.
    ///
    /// Each run is bracketed by `SystemRun` start/end reports carrying the
    /// tick index and `delta_ms`; the end report carries the measured
    /// duration. A failing system stops the tick after its end report.
    pub fn tick(&mut self, world: &mut World, delta: Duration) -> StoreResult<()> {
        self.tick += 1;
        let tick = self.tick;
        let delta_ms = millis(delta);

        for system in &mut self.systems {
            let name = system.name().to_string();
            world.report_system_run(
                SystemRun::new(name.clone(), RunPhase::Start)
                    .with_tick(tick)
                    .with_metadata("delta_ms", delta_ms),
            );

            let started = self.time.now();
            let result = system.update(world, delta);
            let duration_ms = millis(self.time.now().saturating_sub(started));

            tracing::trace!(system = %name, tick, duration_ms, "system run");
            world.report_system_run(
                SystemRun::new(name, RunPhase::End)
                    .with_tick(tick)
                    .with_duration_ms(duration_ms)
                    .with_metadata("delta_ms", delta_ms),
            );
            result?;
        }
        Ok(())
    }

    /// Run `ticks` ticks of `delta` each.
    pub fn run(&mut self, world: &mut World, ticks: u64, delta: Duration) -> StoreResult<()> {
        for _ in 0..ticks {
            self.tick(world, delta)?;
        }
        Ok(())
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}
