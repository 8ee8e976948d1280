use std::time::Duration;

use rover_core::component::{ModuleCategory, ModuleMetadata, Position};
use rover_core::status::apply_trigger;
use rover_core::{EntityId, StatusTrigger, World};
use rover_script::{
    Argument, Completion, FunctionSignature, Invocation, Parameter, RuntimeError,
    RuntimeErrorKind, ScriptFunction, ScriptModule, ScriptResult, dispatch, signatures,
};
use serde::Serialize;

use crate::module::MachineModule;

/// Default translation speed in units per second.
pub const TRANSLATION_UNITS_PER_SECOND: f64 = 10.0;
/// Default rotation speed in degrees per second.
pub const ROTATION_DEGREES_PER_SECOND: f64 = 120.0;
/// Shortest unscaled motion.
pub const MIN_MOTION_DURATION: Duration = Duration::from_millis(80);

/// Intermediate frames never report more progress than this; only the
/// final frame reaches the destination.
const MAX_PARTIAL_PROGRESS: f64 = 0.9995;

/// Tuning for a [`MotorModule`].
#[derive(Debug, Clone)]
pub struct MotorConfig {
    /// Heading in degrees at construction.
    pub initial_heading: f64,
    /// Multiplier applied to every motion duration. `0` makes motions
    /// instantaneous.
    pub duration_scale: f64,
    /// Units per second for `forward` / `backwards`.
    pub translation_rate: f64,
    /// Degrees per second for `left` / `right`.
    pub rotation_rate: f64,
    /// Floor for unscaled motion durations.
    pub min_duration: Duration,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            initial_heading: 0.0,
            duration_scale: 1.0,
            translation_rate: TRANSLATION_UNITS_PER_SECOND,
            rotation_rate: ROTATION_DEGREES_PER_SECOND,
            min_duration: MIN_MOTION_DURATION,
        }
    }
}

impl MotorConfig {
    /// Set the starting heading in degrees.
    pub fn with_initial_heading(mut self, degrees: f64) -> Self {
        self.initial_heading = degrees;
        self
    }

    /// Set the duration multiplier. Negative values clamp to 0; non-finite
    /// values fall back to 1.
    pub fn with_duration_scale(mut self, scale: f64) -> Self {
        self.duration_scale = scale;
        self
    }

    /// Set the translation speed in units per second.
    pub fn with_translation_rate(mut self, rate: f64) -> Self {
        self.translation_rate = rate;
        self
    }

    /// Set the rotation speed in degrees per second.
    pub fn with_rotation_rate(mut self, rate: f64) -> Self {
        self.rotation_rate = rate;
        self
    }

    /// Set the minimum unscaled motion duration.
    pub fn with_min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = duration;
        self
    }

    fn effective_scale(&self) -> f64 {
        if self.duration_scale.is_finite() {
            self.duration_scale.max(0.0)
        } else {
            1.0
        }
    }
}

/// Fold any heading in degrees into `[0, 360)`.
pub fn normalize_heading(degrees: f64) -> f64 {
    let mut heading = degrees % 360.0;
    if heading < 0.0 {
        heading += 360.0;
    }
    // Also turns -0.0 into 0.0.
    if heading >= 360.0 || heading == 0.0 {
        0.0
    } else {
        heading
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Distance and planned duration of the most recent translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Translation {
    /// Signed distance; negative for `backwards`.
    pub distance: f64,
    /// Scaled duration in milliseconds.
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy)]
enum MotionKind {
    Translate {
        start: Position,
        dx: f64,
        dy: f64,
        target: Position,
    },
    Rotate {
        start: f64,
        delta: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    entity: EntityId,
    kind: MotionKind,
    duration: Duration,
    elapsed: Duration,
}

/// Directional drive: moves the frame's entity and tracks its heading.
///
/// Heading 0 points up (towards negative `y`); `left` turns counter to
/// `right`. Motions are animated over several frames unless the duration
/// scale is zero.
#[derive(Debug)]
pub struct MotorModule {
    metadata: ModuleMetadata,
    config: MotorConfig,
    heading: f64,
    entity: Option<EntityId>,
    motion: Option<Motion>,
    frames: u64,
    last_translate: Option<Translation>,
}

impl Default for MotorModule {
    fn default() -> Self {
        Self::new(MotorConfig::default())
    }
}

impl MotorModule {
    const FUNCTIONS: &'static [ScriptFunction<MotorModule, World>] = &[
        ScriptFunction::new("forward", &[Parameter::number("distance")], MotorModule::forward),
        ScriptFunction::new("backwards", &[Parameter::number("distance")], MotorModule::backwards),
        ScriptFunction::new("left", &[Parameter::number("angle")], MotorModule::left),
        ScriptFunction::new("right", &[Parameter::number("angle")], MotorModule::right),
    ];

    /// Create an uninstalled motor.
    pub fn new(config: MotorConfig) -> Self {
        Self {
            metadata: ModuleMetadata::new("motor", "Vector Drive Motor", ModuleCategory::Actuator)
                .with_description("Provides directional control for frame translation."),
            heading: normalize_heading(config.initial_heading),
            config,
            entity: None,
            motion: None,
            frames: 0,
            last_translate: None,
        }
    }

    /// Current heading in degrees, in `[0, 360)`.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Animation frames applied so far, across all motions.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The most recent translation, if any.
    pub fn last_translate(&self) -> Option<Translation> {
        self.last_translate
    }

    /// Whether a motion is in progress.
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    fn forward(&mut self, call: &Invocation<'_>, args: &[Argument], world: &mut World) -> ScriptResult<Completion> {
        let distance = call.number(args, 0, "distance")?;
        self.translate(distance, call, world)
    }

    fn backwards(&mut self, call: &Invocation<'_>, args: &[Argument], world: &mut World) -> ScriptResult<Completion> {
        let distance = call.number(args, 0, "distance")?;
        self.translate(-distance, call, world)
    }

    fn left(&mut self, call: &Invocation<'_>, args: &[Argument], world: &mut World) -> ScriptResult<Completion> {
        let angle = call.number(args, 0, "angle")?;
        self.rotate(angle, call, world)
    }

    fn right(&mut self, call: &Invocation<'_>, args: &[Argument], world: &mut World) -> ScriptResult<Completion> {
        let angle = call.number(args, 0, "angle")?;
        self.rotate(-angle, call, world)
    }

    fn bound_entity(&self, call: &Invocation<'_>) -> Result<EntityId, RuntimeError> {
        self.entity.ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::NotInstalled,
                format!("{} is not installed on a frame.", self.metadata.name),
            )
            .at(call.location)
        })
    }

    fn translate(&mut self, distance: f64, call: &Invocation<'_>, world: &mut World) -> ScriptResult<Completion> {
        if distance == 0.0 {
            return Ok(Completion::Done);
        }
        let entity = self.bound_entity(call)?;
        let Some(position) = world.get::<Position>(entity) else {
            return Err(RuntimeError::new(
                RuntimeErrorKind::MissingComponent,
                format!("Entity {} is missing a position component", entity.get()),
            )
            .at(call.location)
            .into());
        };

        let rotation = self.heading.to_radians();
        let dx = rotation.sin() * distance;
        let dy = rotation.cos() * distance;
        let start = *position;
        let target = Position::new(round4(start.x + dx), round4(start.y - dy));

        let duration = self.scaled(self.travel_time(distance.abs(), self.config.translation_rate));
        self.last_translate = Some(Translation {
            distance,
            duration_ms: duration.as_secs_f64() * 1000.0,
        });

        self.begin(
            Motion {
                entity,
                kind: MotionKind::Translate { start, dx, dy, target },
                duration,
                elapsed: Duration::ZERO,
            },
            world,
        )
    }

    fn rotate(&mut self, angle: f64, call: &Invocation<'_>, world: &mut World) -> ScriptResult<Completion> {
        if angle == 0.0 {
            return Ok(Completion::Done);
        }
        let entity = self.bound_entity(call)?;
        let duration = self.scaled(self.travel_time(angle.abs(), self.config.rotation_rate));
        self.begin(
            Motion {
                entity,
                kind: MotionKind::Rotate {
                    start: self.heading,
                    delta: angle,
                },
                duration,
                elapsed: Duration::ZERO,
            },
            world,
        )
    }

    /// Unscaled time to cover `amount` at `rate` per second.
    fn travel_time(&self, amount: f64, rate: f64) -> Duration {
        let seconds = amount / rate;
        Duration::try_from_secs_f64(seconds)
            .unwrap_or(Duration::MAX)
            .max(self.config.min_duration)
    }

    fn scaled(&self, duration: Duration) -> Duration {
        Duration::try_from_secs_f64(duration.as_secs_f64() * self.config.effective_scale())
            .unwrap_or(Duration::MAX)
    }

    fn begin(&mut self, motion: Motion, world: &mut World) -> ScriptResult<Completion> {
        if motion.duration.is_zero() {
            self.finish(&motion, world)?;
            return Ok(Completion::Done);
        }

        apply_trigger(world, motion.entity, StatusTrigger::MotionStarted)?;
        tracing::debug!(
            entity = %motion.entity,
            duration_ms = motion.duration.as_millis() as u64,
            "motion started"
        );
        self.apply(&motion, 0.0, world)?;
        self.motion = Some(motion);
        Ok(Completion::Suspended)
    }

    fn apply(&mut self, motion: &Motion, progress: f64, world: &mut World) -> ScriptResult<()> {
        self.frames += 1;
        match motion.kind {
            MotionKind::Translate { start, dx, dy, .. } => {
                let current = Position::new(
                    round4(start.x + dx * progress),
                    round4(start.y - dy * progress),
                );
                if world.get::<Position>(motion.entity).as_deref() != Some(&current) {
                    world.insert(motion.entity, current)?;
                }
            }
            MotionKind::Rotate { start, delta } => {
                self.heading = normalize_heading(start + delta * progress);
            }
        }
        Ok(())
    }

    /// Final frame: snap to the exact destination.
    fn finish(&mut self, motion: &Motion, world: &mut World) -> ScriptResult<()> {
        self.frames += 1;
        match motion.kind {
            MotionKind::Translate { target, .. } => world.insert(motion.entity, target)?,
            MotionKind::Rotate { start, delta } => self.heading = normalize_heading(start + delta),
        }
        Ok(())
    }
}

impl ScriptModule<World> for MotorModule {
    fn name(&self) -> &str {
        &self.metadata.id
    }

    fn functions(&self) -> Vec<FunctionSignature> {
        signatures(Self::FUNCTIONS)
    }

    fn invoke(&mut self, call: &Invocation<'_>, args: &[Argument], world: &mut World) -> ScriptResult<Completion> {
        dispatch(Self::FUNCTIONS, self, call, args, world)
    }

    fn resume(&mut self, elapsed: Duration, world: &mut World) -> ScriptResult<Completion> {
        let Some(mut motion) = self.motion.take() else {
            return Ok(Completion::Done);
        };
        motion.elapsed = motion.elapsed.saturating_add(elapsed);

        if motion.elapsed >= motion.duration {
            self.finish(&motion, world)?;
            apply_trigger(world, motion.entity, StatusTrigger::MotionFinished)?;
            tracing::debug!(entity = %motion.entity, frames = self.frames, "motion finished");
            return Ok(Completion::Done);
        }

        let progress = (motion.elapsed.as_secs_f64() / motion.duration.as_secs_f64())
            .min(MAX_PARTIAL_PROGRESS);
        self.apply(&motion, progress, world)?;
        self.motion = Some(motion);
        Ok(Completion::Suspended)
    }
}

impl MachineModule for MotorModule {
    fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    fn on_install(&mut self, entity: EntityId) {
        self.entity = Some(entity);
    }

    fn on_remove(&mut self) {
        self.entity = None;
        self.motion = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use rover_core::EntityStatus;
    use rover_core::component::Status;
    use rover_script::{FixedStep, RunState, ScriptEngine, ScriptError};

    struct Rig {
        world: World,
        bot: EntityId,
        motor: Rc<RefCell<MotorModule>>,
        engine: ScriptEngine<World>,
    }

    impl Rig {
        fn new(config: MotorConfig) -> Self {
            let mut world = World::default();
            let bot = world.spawn();
            world.insert(bot, Position::new(50.0, 50.0)).unwrap();
            let motor = Rc::new(RefCell::new(MotorModule::new(config)));
            motor.borrow_mut().on_install(bot);
            let mut engine = ScriptEngine::with_clock(FixedStep::new(Duration::from_millis(16)));
            engine.register_module(motor.clone()).unwrap();
            Self {
                world,
                bot,
                motor,
                engine,
            }
        }

        fn instant() -> Self {
            Self::new(MotorConfig::default().with_duration_scale(0.0))
        }

        fn run(&mut self, source: &str) -> ScriptResult<()> {
            self.engine.execute(source, &mut self.world).map(|_| ())
        }

        fn position(&self) -> Position {
            *self.world.get::<Position>(self.bot).unwrap()
        }

        fn heading(&self) -> f64 {
            self.motor.borrow().heading()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
    }

    #[test]
    fn forward_moves_against_y_at_heading_zero() {
        let mut rig = Rig::instant();
        rig.run("motor.forward(10)").unwrap();
        assert_close(rig.position().x, 50.0);
        assert_close(rig.position().y, 40.0);
    }

    #[test]
    fn backwards_moves_along_y() {
        let mut rig = Rig::instant();
        rig.run("motor.backwards(10)").unwrap();
        assert_close(rig.position().y, 60.0);
    }

    #[test]
    fn left_then_forward() {
        let mut rig = Rig::instant();
        rig.run("motor.left(90); motor.forward(5)").unwrap();
        assert_eq!(rig.heading(), 90.0);
        assert_close(rig.position().x, 55.0);
        assert_close(rig.position().y, 50.0);
    }

    #[test]
    fn right_then_backwards() {
        let mut rig = Rig::instant();
        rig.run("motor.right(45); motor.backwards(10)").unwrap();
        assert_eq!(rig.heading(), 315.0);
        assert_close(rig.position().x, 57.0711);
        assert_close(rig.position().y, 57.0711);
    }

    #[test]
    fn full_turns_are_normalized() {
        let mut rig = Rig::new(MotorConfig::default().with_initial_heading(10.0).with_duration_scale(0.0));
        rig.run("motor.left(720)").unwrap();
        assert_eq!(rig.heading(), 10.0);
        rig.run("motor.right(370)").unwrap();
        assert_eq!(rig.heading(), 0.0);
        assert!(rig.heading().is_sign_positive());
    }

    #[test]
    fn four_quarter_turns_restore_heading() {
        let mut rig = Rig::instant();
        rig.run("motor.left(90)\nmotor.left(90)\nmotor.left(90)\nmotor.left(90)").unwrap();
        assert_eq!(rig.heading(), 0.0);
    }

    #[test]
    fn zero_distance_does_nothing() {
        let mut rig = Rig::new(MotorConfig::default());
        let before = rig.world.version();
        rig.run("motor.forward(0); motor.left(0)").unwrap();
        assert_eq!(rig.world.version(), before);
        assert_eq!(rig.motor.borrow().frames(), 0);
        assert!(rig.motor.borrow().last_translate().is_none());
    }

    #[test]
    fn missing_position_is_a_runtime_error() {
        let mut rig = Rig::instant();
        rig.world.remove::<Position>(rig.bot).unwrap();
        let err = rig.run("\n  motor.forward(5)").unwrap_err();
        let ScriptError::Runtime(err) = err else {
            panic!("expected runtime error");
        };
        assert_eq!(err.kind, RuntimeErrorKind::MissingComponent);
        assert_eq!(err.message, "Entity 1 is missing a position component");
        assert_eq!(err.location.map(|l| (l.line, l.column)), Some((2, 3)));
    }

    #[test]
    fn uninstalled_motor_refuses_to_move() {
        let mut rig = Rig::instant();
        rig.motor.borrow_mut().on_remove();
        let err = rig.run("motor.left(10)").unwrap_err();
        assert_eq!(err.runtime_kind(), Some(RuntimeErrorKind::NotInstalled));
    }

    #[test]
    fn animated_translation_interpolates_then_snaps() {
        let mut rig = Rig::new(MotorConfig::default());
        let commands = rig.engine.compile("motor.forward(10)").unwrap();
        let mut run = rig.engine.start(commands);

        let state = rig.engine.advance(&mut run, Duration::ZERO, &mut rig.world).unwrap();
        assert_eq!(state, RunState::Running);
        assert!(rig.motor.borrow().is_moving());
        assert_eq!(rig.world.get::<Status>(rig.bot), None);

        let state = rig
            .engine
            .advance(&mut run, Duration::from_millis(500), &mut rig.world)
            .unwrap();
        assert_eq!(state, RunState::Running);
        assert_close(rig.position().y, 45.0);

        let state = rig
            .engine
            .advance(&mut run, Duration::from_millis(600), &mut rig.world)
            .unwrap();
        assert_eq!(state, RunState::Finished);
        assert_eq!(rig.position(), Position::new(50.0, 40.0));
        assert_eq!(rig.motor.borrow().frames(), 3);
        assert_eq!(
            rig.motor.borrow().last_translate(),
            Some(Translation {
                distance: 10.0,
                duration_ms: 1000.0
            })
        );
    }

    #[test]
    fn starting_a_translation_leaves_the_world_untouched() {
        let mut rig = Rig::new(MotorConfig::default());
        let before = rig.world.version();
        let commands = rig.engine.compile("motor.forward(10)").unwrap();
        let mut run = rig.engine.start(commands);

        rig.engine.advance(&mut run, Duration::ZERO, &mut rig.world).unwrap();
        assert!(rig.motor.borrow().is_moving());
        assert_eq!(rig.world.version(), before);
        assert_eq!(rig.position(), Position::new(50.0, 50.0));

        rig.engine
            .advance(&mut run, Duration::from_millis(500), &mut rig.world)
            .unwrap();
        assert_eq!(rig.world.version(), before + 1);
    }

    #[test]
    fn motion_drives_status() {
        let mut rig = Rig::new(MotorConfig::default());
        rig.world.insert(rig.bot, Status::new(EntityStatus::Idle)).unwrap();
        let commands = rig.engine.compile("motor.right(12)").unwrap();
        let mut run = rig.engine.start(commands);

        rig.engine.advance(&mut run, Duration::ZERO, &mut rig.world).unwrap();
        assert_eq!(rig.world.get::<Status>(rig.bot).unwrap().state, EntityStatus::Moving);

        rig.engine
            .advance(&mut run, Duration::from_millis(200), &mut rig.world)
            .unwrap();
        assert_eq!(rig.world.get::<Status>(rig.bot).unwrap().state, EntityStatus::Idle);
        assert_eq!(rig.heading(), 348.0);
    }

    #[test]
    fn short_motions_take_minimum_duration() {
        let mut rig = Rig::new(MotorConfig::default());
        rig.run("motor.forward(0.1)").unwrap();
        let last = rig.motor.borrow().last_translate().unwrap();
        assert_close(last.duration_ms, 80.0);
    }

    #[test]
    fn duration_scale_stretches_motions() {
        let mut rig = Rig::new(MotorConfig::default().with_duration_scale(2.0));
        let summary = rig.engine.execute("motor.backwards(5)", &mut rig.world).unwrap();
        let last = rig.motor.borrow().last_translate().unwrap();
        assert_close(last.duration_ms, 1000.0);
        assert_eq!(last.distance, -5.0);
        // 1000ms at 16ms per frame.
        assert_eq!(summary.frames, 63);
        assert_eq!(rig.position(), Position::new(50.0, 55.0));
    }

    #[test]
    fn negative_scale_is_instant() {
        let mut rig = Rig::new(MotorConfig::default().with_duration_scale(-3.0));
        let summary = rig.engine.execute("motor.forward(3)", &mut rig.world).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(rig.motor.borrow().frames(), 1);
    }

    #[test]
    fn metadata() {
        let motor = MotorModule::default();
        assert_eq!(motor.metadata().id, "motor");
        assert_eq!(motor.metadata().name, "Vector Drive Motor");
        assert_eq!(motor.metadata().category, ModuleCategory::Actuator);
    }

    mod props {
        use super::super::normalize_heading;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn heading_is_in_range(degrees in -1.0e6f64..1.0e6) {
                let heading = normalize_heading(degrees);
                prop_assert!((0.0..360.0).contains(&heading));
                prop_assert!(heading.is_sign_positive());
            }

            #[test]
            fn whole_turns_do_not_change_heading(start in 0.0f64..360.0, turns in -5i32..5) {
                let turned = normalize_heading(start + 360.0 * f64::from(turns));
                let base = normalize_heading(start);
                let diff = (turned - base).abs();
                prop_assert!(diff < 1e-6 || (360.0 - diff) < 1e-6);
            }
        }
    }
}
