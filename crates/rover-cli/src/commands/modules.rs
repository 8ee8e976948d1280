use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rover_core::WorldConfig;
use rover_machine::{BotEnvironment, MotorConfig};

pub fn run(json: bool) -> Result<(), String> {
    let (world, ids) = super::build_world(WorldConfig::default(), 0, 0)?;
    let entity = ids.first().copied().ok_or("demo world has no bots")?;
    let env = BotEnvironment::new(world, entity, MotorConfig::default()).map_err(|e| e.to_string())?;

    let fitted = env.frame().modules();
    let catalog = env.engine().catalog();

    if json {
        let modules: Vec<_> = catalog
            .iter()
            .map(|(name, functions)| {
                let metadata = fitted.iter().find(|m| &m.id == name);
                serde_json::json!({
                    "module": name,
                    "name": metadata.map(|m| m.name.as_str()),
                    "category": metadata.map(|m| m.category.to_string()),
                    "description": metadata.and_then(|m| m.description.as_deref()),
                    "functions": functions
                        .iter()
                        .map(|f| serde_json::json!({
                            "name": f.name,
                            "parameters": f
                                .parameters
                                .iter()
                                .map(|p| serde_json::json!({ "name": p.name, "kind": p.kind.to_string() }))
                                .collect::<Vec<_>>(),
                        }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        let output = serde_json::to_string_pretty(&modules).map_err(|e| e.to_string())?;
        println!("{output}");
        return Ok(());
    }

    for (name, functions) in &catalog {
        match fitted.iter().find(|m| &m.id == name) {
            Some(metadata) => println!(
                "  {} {} {}",
                name.bold(),
                metadata.name,
                format!("({})", metadata.category).dimmed()
            ),
            None => println!("  {}", name.bold()),
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Call", "Signature"]);
        for function in functions {
            table.add_row(vec![format!("{name}.{}", function.name), function.to_string()]);
        }
        println!("{table}");
        println!();
    }

    Ok(())
}
