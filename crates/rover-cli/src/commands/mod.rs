pub mod check;
pub mod modules;
pub mod run;
pub mod simulate;

use std::path::Path;

use rover_core::{EntityId, World, WorldConfig};
use rover_machine::{populate_demo_world, populate_random};
use rover_script::{Diagnostic, ScriptError, render_diagnostics};

/// Read a script file.
fn read_script(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {e}", path.display()))
}

/// The demo roster plus `extra` seeded random bots.
fn build_world(config: WorldConfig, extra: usize, seed: u64) -> Result<(World, Vec<EntityId>), String> {
    let mut world = World::new(config);
    let mut ids = populate_demo_world(&mut world).map_err(|e| e.to_string())?;
    if extra > 0 {
        ids.extend(populate_random(&mut world, extra, seed).map_err(|e| e.to_string())?);
    }
    Ok((world, ids))
}

/// Print a script error to stderr using ariadne.
fn print_script_error(source: &str, path: &Path, error: &ScriptError) {
    let filename = path.display().to_string();
    let diagnostic = Diagnostic::from_script_error(source, error);
    eprint!("{}", render_diagnostics(source, &filename, &[diagnostic]));
}
