use std::path::Path;

use colored::Colorize;
use rover_script::{Diagnostic, ScriptError, compiler, parse_source, render_diagnostics};

pub fn run(script: &Path) -> Result<(), String> {
    let source = super::read_script(script)?;

    let program = match parse_source(&source) {
        Ok(program) => program,
        Err(e) => {
            super::print_script_error(&source, script, &ScriptError::Syntax(e));
            return Err("syntax check failed".into());
        }
    };
    let commands = compiler::compile(&program);

    if commands.is_empty() {
        let warning = Diagnostic::warning(0..0, "script has no statements");
        eprint!(
            "{}",
            render_diagnostics(&source, &script.display().to_string(), &[warning])
        );
    }

    println!(
        "  {} {} command{} in '{}'",
        "OK".green().bold(),
        commands.len(),
        if commands.len() == 1 { "" } else { "s" },
        script.display()
    );
    Ok(())
}
