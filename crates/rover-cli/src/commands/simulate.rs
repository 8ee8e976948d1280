use std::time::Duration;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rover_core::component::{Identity, Lifecycle, Status, Vitals};
use rover_core::{EntityStatus, TelemetryConfig, WorldConfig, WorldTelemetry};
use rover_machine::TickController;

pub fn run(ticks: u64, delta_ms: u64, bots: usize, seed: u64) -> Result<(), String> {
    let (mut world, ids) =
        super::build_world(WorldConfig::default().with_instrumentation(true), bots, seed)?;
    let telemetry = WorldTelemetry::attach(&mut world, TelemetryConfig::default());

    let mut controller = TickController::new().with_default_systems();
    let delta = Duration::from_millis(delta_ms);
    controller
        .run(&mut world, ticks, delta)
        .map_err(|e| format!("simulation error: {e}"))?;

    println!(
        "  {} {} bots {}",
        "Simulation".bold(),
        ids.len(),
        format!("({ticks} ticks, {delta_ms} ms/tick)").dimmed()
    );
    println!();

    // Systems
    println!("  {}", "Systems".bold().underline());
    println!();
    let snapshot = telemetry.snapshot();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["System", "Runs", "Avg ms", "Last ms", "Last tick"]);
    for name in controller.system_names() {
        let Some(stats) = snapshot.system_runs.get(name) else {
            table.add_row(vec![name.to_string(), "0".into(), "--".into(), "--".into(), "--".into()]);
            continue;
        };
        table.add_row(vec![
            name.to_string(),
            stats.timed_runs.to_string(),
            format_ms(stats.average_duration_ms()),
            format_ms(stats.last_duration_ms),
            stats.last_tick.map_or_else(|| "--".to_string(), |t| t.to_string()),
        ]);
    }
    println!("{table}");
    println!();

    // Bots
    println!("  {}", "Bots".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Callsign", "Status", "Battery", "Temp", "Uptime", "Heartbeat"]);
    for (id, (identity, status, vitals, lifecycle)) in world.query::<(Identity, Status, Vitals, Lifecycle)>() {
        if !ids.contains(&id) {
            continue;
        }
        let state = match status.state {
            EntityStatus::Idle => status.state.to_string().green(),
            EntityStatus::Moving => status.state.to_string().cyan(),
            EntityStatus::Error => status.state.to_string().red().bold(),
        };
        table.add_row(vec![
            identity.callsign.clone(),
            state.to_string(),
            format!("{:.2}%", vitals.battery_level),
            format!("{:.1}°C", vitals.temperature_c),
            format!("{}s", lifecycle.uptime_seconds),
            lifecycle.last_heartbeat.clone(),
        ]);
    }
    println!("{table}");
    println!();
    println!("  {} world events observed", snapshot.total_events);

    Ok(())
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |ms| format!("{ms:.3}"))
}
