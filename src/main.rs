use anyhow::{bail, Context, Result};
use log::info;
use std::env;
use std::fs;
use tracing_subscriber::EnvFilter;

use dog_diet::catalog::{load_fixed_ingredients, IngredientCatalog};
use dog_diet::diet_config::DietConstraints;
use dog_diet::formulation::calculate_checked;

const USAGE: &str = "Usage:
  dog-diet list <catalog.json>
  dog-diet groups <catalog.json>
  dog-diet calculate <catalog.json> <fixed.json> <ingredient>...";

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [command, catalog_path] if command == "list" => {
            let catalog = IngredientCatalog::load(catalog_path)?;
            println!("{}", serde_json::to_string_pretty(&catalog.list())?);
        }
        [command, catalog_path] if command == "groups" => {
            let catalog = IngredientCatalog::load(catalog_path)?;
            println!("{}", serde_json::to_string_pretty(&catalog.groups())?);
        }
        [command, catalog_path, fixed_path, names @ ..] if command == "calculate" && !names.is_empty() => {
            let catalog = IngredientCatalog::load(catalog_path)?;
            let fixed = load_fixed_ingredients(fixed_path)?;
            let constraints = load_constraints()?;
            let selected = catalog.resolve_selection(names)?;

            info!("Calculating diet for {} selected ingredients", selected.len());
            let result = calculate_checked(&fixed, &selected, &constraints)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => bail!("{USAGE}"),
    }

    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` filters, `DIET_LOG_FORMAT=json` switches format
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if env::var("DIET_LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Constraints from an optional JSON file, then `DIET_*` variable overrides
fn load_constraints() -> Result<DietConstraints> {
    let base = match env::var("DIET_CONSTRAINTS_FILE") {
        Ok(path) => {
            info!("Loading constraints from: {}", path);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read constraints file {path}"))?;
            DietConstraints::from_json_str(&content)?
        }
        Err(_) => DietConstraints::default(),
    };
    let constraints = base.with_overrides(|key| env::var(key).ok())?;
    Ok(constraints)
}
