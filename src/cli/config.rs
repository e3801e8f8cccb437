use crate::config::{
    find_haven_path, set_global_config, HavenConfig, DEFAULT_STRATEGY, STRATEGIES,
};
use crate::vectorizer;

/// Run the config command
pub fn run_config(
    key: Option<&str>,
    value: Option<&str>,
    global: bool,
    list_strategies: bool,
) -> Result<(), String> {
    if list_strategies {
        print_strategies();
        return Ok(());
    }

    if global {
        let (Some(k), Some(v)) = (key, value) else {
            return Err("Key and value required with --global".to_string());
        };
        if k == "strategy" {
            vectorizer::for_strategy(v).map_err(|e| e.to_string())?;
        }
        set_global_config(k, v).map_err(|e| format!("Failed to save: {}", e))?;
        println!("Set {} = {} (global)", k, v);
        return Ok(());
    }

    let haven_path =
        find_haven_path().ok_or("No .haven directory found. Run 'haven init' first.")?;
    let mut config = HavenConfig::new(haven_path);

    match (key, value) {
        (None, None) => {
            // Show current config
            println!("Current configuration:\n");
            println!("  strategy: {}", config.strategy());
            println!(
                "  corpus_file: {}",
                config
                    .corpus_file()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(built-in)".to_string())
            );
            println!("  llm_base_url: {}", config.llm_base_url());
            println!("  llm_model: {}", config.llm_model());
            println!(
                "  resources_endpoint: {}",
                config
                    .resources_endpoint()
                    .unwrap_or_else(|| "(none)".to_string())
            );
        }
        (Some(k), None) => {
            // Show specific key
            if k == "strategy" {
                println!("strategy: {}", config.strategy());
            } else if let Some(v) = config.get(k) {
                println!("{}: {}", k, v);
            } else {
                println!("{}: (not set)", k);
            }
        }
        (Some(k), Some(v)) => {
            // Set key=value
            if k == "strategy" {
                vectorizer::for_strategy(v).map_err(|e| e.to_string())?;
                config
                    .set_strategy(v)
                    .map_err(|e| format!("Failed to save: {}", e))?;
            } else {
                config.set(k, v).map_err(|e| format!("Failed to save: {}", e))?;
            }
            println!("Set {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err("Key required when setting a value".to_string());
        }
    }

    Ok(())
}

fn print_strategies() {
    let current = find_haven_path()
        .map(|p| HavenConfig::new(p).strategy())
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());

    println!("Available matcher strategies:\n");

    for strategy in STRATEGIES {
        let marker = if strategy.alias == current { " *" } else { "  " };
        println!("{} {:8} {}", marker, strategy.alias, strategy.description);
    }

    println!("\n* = currently configured");
    println!("\nSet strategy with: haven config strategy <alias>");
}
