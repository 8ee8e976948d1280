//! Integration tests running scripted bots on the rover machine.

use std::time::Duration;

use rover_core::component::{Lifecycle, Position, Status, Vitals};
use rover_core::{EntityStatus, World};
use rover_machine::systems::ManualTime;
use rover_machine::{
    BotEnvironment, MotorConfig, TickController, find_by_callsign, populate_demo_world,
};
use rover_script::{FixedStep, RuntimeErrorKind, ScriptError};

fn demo_environment() -> BotEnvironment {
    let mut world = World::default();
    let ids = populate_demo_world(&mut world).unwrap();
    BotEnvironment::new(world, ids[0], MotorConfig::default().with_duration_scale(0.0)).unwrap()
}

#[test]
fn composite_script_on_the_lead_bot() {
    let mut env = demo_environment();
    let report = env.run(
        "motor.forward(10); motor.left(90); motor.forward(5); debug.pen(true); debug.color(#ff00ff)",
    );

    assert!(report.succeeded());
    assert_eq!(report.position, Some(Position::new(25.0, 25.0)));
    assert_eq!(report.heading, 90.0);
    assert!(report.debug.pen_down);
    assert_eq!(report.debug.color, "#ff00ff");
    assert_eq!(report.debug.history, vec!["pen(true)", "color(#ff00ff)"]);
    assert_eq!(report.frames, 0);
}

#[test]
fn animated_run_drives_status_and_lands_exactly() {
    let mut world = World::default();
    let ids = populate_demo_world(&mut world).unwrap();
    let bravo = ids[1];
    let mut env = BotEnvironment::new(world, bravo, MotorConfig::default()).unwrap();
    env.set_clock(FixedStep::new(Duration::from_millis(16)));

    let report = env.run("motor.right(90)\nmotor.forward(4)");

    assert!(report.succeeded());
    assert!(report.frames > 2);
    assert_eq!(report.heading, 270.0);
    assert_eq!(report.position, Some(Position::new(51.0, 64.0)));
    assert_eq!(report.status, Some(EntityStatus::Idle));
    assert!(!env.motor().is_moving());
}

#[test]
fn bad_color_literal_is_a_syntax_error() {
    let mut env = demo_environment();
    let err = env.execute("debug.color(red)").unwrap_err();
    assert!(matches!(err, ScriptError::Syntax(_)));
    assert!(env.debug().history().is_empty());
}

#[test]
fn argument_count_errors() {
    let mut env = demo_environment();

    let err = env.execute("motor.forward()").unwrap_err();
    assert_eq!(err.runtime_kind(), Some(RuntimeErrorKind::MissingArgument));
    assert!(err.to_string().contains("missing argument 'distance'"));

    let err = env.execute("motor.forward(1, 2)").unwrap_err();
    assert_eq!(err.runtime_kind(), Some(RuntimeErrorKind::UnexpectedArgument));
    assert_eq!(err.location().map(|l| l.column), Some(18));
}

#[test]
fn debug_history_keeps_the_latest_fifty() {
    let mut env = demo_environment();
    let mut script = String::from("debug.color(#000)\n");
    for i in 0..50 {
        script.push_str(if i % 2 == 0 { "debug.pen(true)\n" } else { "debug.pen(false)\n" });
    }
    env.execute(&script).unwrap();

    let history = env.debug().history();
    assert_eq!(history.len(), 50);
    assert_eq!(history[0], "pen(true)");
    assert_eq!(history[49], "pen(false)");
}

#[test]
fn blank_script_runs_nothing() {
    let mut env = demo_environment();
    let version = env.world().version();
    let report = env.run("\n\n");
    assert!(report.succeeded());
    assert_eq!(report.commands, 0);
    assert_eq!(env.world().version(), version);
}

#[test]
fn unterminated_call_is_a_syntax_error() {
    let mut env = demo_environment();
    let report = env.run("motor.forward(10");
    let failure = report.error.unwrap();
    assert_eq!(failure.class, "syntax error");
    assert_eq!(report.position, Some(Position::new(20.0, 35.0)));
}

#[test]
fn unknown_module_is_named_and_faults_the_bot() {
    let mut env = demo_environment();
    let report = env.run("motor.forward(5)\ngripper.close()\nmotor.forward(5)");
    let failure = report.error.unwrap();
    assert_eq!(failure.class, "runtime error");
    assert!(failure.message.contains("'gripper'"));
    assert_eq!(report.commands, 1);
    assert_eq!(report.position, Some(Position::new(20.0, 30.0)));
    assert_eq!(report.status, Some(EntityStatus::Error));
}

#[test]
fn systems_keep_running_after_a_script() {
    let mut env = demo_environment();
    env.run("motor.forward(10)");
    let alpha = env.entity();
    let mut world = env.into_world();

    let mut controller =
        TickController::with_time_source(ManualTime::new(Duration::from_millis(1)))
            .with_default_systems();
    controller.run(&mut world, 2, Duration::from_secs(1)).unwrap();

    assert_eq!(world.get::<Position>(alpha).unwrap().y, 25.0);
    assert_eq!(world.get::<Lifecycle>(alpha).unwrap().uptime_seconds, 1896);
    assert!((world.get::<Vitals>(alpha).unwrap().battery_level - 81.9).abs() < 1e-9);

    let charlie = find_by_callsign(&world, "charlie").unwrap();
    assert_eq!(world.get::<Status>(charlie).unwrap().state, EntityStatus::Error);
}
