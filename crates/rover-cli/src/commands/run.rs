use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rover_core::{EntityStatus, WorldConfig};
use rover_core::component::Identity;
use rover_machine::{BotEnvironment, MotorConfig, RunReport, find_by_callsign};
use rover_script::{FixedStep, RealTimeClock};

/// Flags of `rover run`.
pub struct RunOptions {
    pub bot: Option<String>,
    pub bots: usize,
    pub seed: u64,
    pub realtime: bool,
    pub json: bool,
}

pub fn run(script: &Path, options: &RunOptions) -> Result<(), String> {
    let source = super::read_script(script)?;
    let (world, ids) = super::build_world(WorldConfig::default(), options.bots, options.seed)?;

    let entity = match &options.bot {
        Some(callsign) => find_by_callsign(&world, callsign)
            .ok_or_else(|| format!("no bot with callsign '{callsign}'"))?,
        None => ids.first().copied().ok_or("world has no bots")?,
    };
    let callsign = world
        .get::<Identity>(entity)
        .map(|identity| identity.callsign.clone())
        .unwrap_or_else(|| entity.to_string());

    let mut env = BotEnvironment::new(world, entity, MotorConfig::default()).map_err(|e| e.to_string())?;
    if options.realtime {
        env.set_clock(RealTimeClock::default());
    } else {
        env.set_clock(FixedStep::default());
    }

    tracing::debug!(script = %script.display(), bot = %callsign, "running script");
    let report = env.run(&source);

    if options.json {
        let output = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{output}");
    } else {
        print_report(&callsign, &report);
    }

    match &report.error {
        Some(failure) => {
            if !options.json {
                super::print_script_error(&source, script, &failure.cause);
            }
            Err(format!("{} in '{}'", failure.class, script.display()))
        }
        None => Ok(()),
    }
}

fn print_report(callsign: &str, report: &RunReport) {
    println!(
        "  {} '{}' {}",
        "Run".bold(),
        callsign,
        format!(
            "({} command{}, {} frame{}, {:.0} ms)",
            report.commands,
            if report.commands == 1 { "" } else { "s" },
            report.frames,
            if report.frames == 1 { "" } else { "s" },
            report.elapsed_ms
        )
        .dimmed()
    );
    println!();

    let position = report
        .position
        .map_or_else(|| "--".to_string(), |p| format!("({}, {})", p.x, p.y));
    let status = report.status.map_or_else(|| "--".normal(), colorize_status);
    let pen = if report.debug.pen_down { "down" } else { "up" };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Position", "Heading", "Status", "Pen", "Color"]);
    table.add_row(vec![
        position,
        format!("{}°", report.heading),
        status.to_string(),
        pen.to_string(),
        report.debug.color.clone(),
    ]);
    println!("{table}");

    if !report.debug.history.is_empty() {
        println!();
        println!("  {}", "Debug History".bold().underline());
        for entry in &report.debug.history {
            println!("  {entry}");
        }
    }
    println!();
}

fn colorize_status(status: EntityStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        EntityStatus::Idle => label.green(),
        EntityStatus::Moving => label.cyan(),
        EntityStatus::Error => label.red().bold(),
    }
}
