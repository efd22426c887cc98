use anyhow::Result;
use dog_diet::catalog::{load_fixed_ingredients, IngredientCatalog};
use dog_diet::diet_config::DietConstraints;
use dog_diet::diet_errors::DietError;
use dog_diet::formulation::calculate_checked;
use std::io::Write;
use tempfile::NamedTempFile;

const CATALOG_JSON: &str = r#"[
    {"name": "beef liver", "group": "Organ Meat", "protein": 65.0, "fat": 12.0, "calcium": 25.0, "phosphorus": 1100.0, "iron": 20.0, "energy": 480.0},
    {"name": "chicken breast", "group": "Meat Group A", "protein": 75.0, "fat": 9.0, "calcium": 40.0, "phosphorus": 800.0, "iron": 2.5, "energy": 420.0},
    {"name": "pumpkin", "group": "Vegetable A", "protein": 12.0, "fat": 1.0, "cho": 65.0, "fiber": 12.0, "energy": 330.0},
    {"name": "brown rice", "group": "Grain A", "protein": 8.5, "fat": 3.0, "cho": 85.0, "energy": 390.0},
    {"name": "coconut oil", "group": "Oil", "fat": 100.0, "energy": 890.0}
]"#;

const FIXED_JSON: &str = r#"[
    {"name": "bone meal", "dm_g": 20.0, "calcium": 30000.0, "phosphorus": 14000.0},
    {"name": "vitamin premix", "dm_g": 5.0}
]"#;

fn write_temp(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_load_catalog_from_file() -> Result<()> {
    let file = write_temp(CATALOG_JSON)?;
    let catalog = IngredientCatalog::load(file.path())?;

    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.groups(), vec!["grain a", "meat group a", "oil", "organ meat", "vegetable a"]);
    assert_eq!(catalog.by_group("Organ Meat")[0].name, "beef liver");
    Ok(())
}

#[test]
fn test_load_missing_file() {
    let result = IngredientCatalog::load("/nonexistent/catalog.json");
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to read ingredient catalog"));
}

#[test]
fn test_load_fixed_ingredients_from_file() -> Result<()> {
    let file = write_temp(FIXED_JSON)?;
    let fixed = load_fixed_ingredients(file.path())?;

    assert_eq!(fixed.len(), 2);
    assert_eq!(fixed[0].name, "bone meal");
    assert_eq!(fixed[1].profile.protein, 0.0);
    Ok(())
}

#[test]
fn test_catalog_to_result() -> Result<()> {
    let catalog = IngredientCatalog::from_json_str(CATALOG_JSON)?;
    let fixed = dog_diet::catalog::parse_fixed_ingredients(FIXED_JSON)?;

    let selected = catalog.resolve_selection(&[
        "beef liver",
        "chicken breast",
        "pumpkin",
        "brown rice",
        "coconut oil",
        "dragon fruit",
    ])?;
    assert_eq!(selected.len(), 5);

    let result = calculate_checked(&fixed, &selected, &DietConstraints::default())?;

    assert!(result.is_complete());
    assert_eq!(result.dm_breakdown[0].ingredient, "bone meal");
    assert!(result.dm_breakdown[0].fixed);
    assert_eq!(result.dm_breakdown[0].dm_g, 20.0);
    assert!(result.dm_breakdown.iter().all(|e| e.ingredient != "dragon fruit"));
    assert!(result.nutrient_percentages.ca_p_ratio > 0.0);
    Ok(())
}

#[test]
fn test_unknown_only_selection_is_rejected() -> Result<()> {
    let catalog = IngredientCatalog::from_json_str(CATALOG_JSON)?;
    assert_eq!(
        catalog.resolve_selection(&["dragon fruit", "unicorn steak"]),
        Err(DietError::EmptySelection)
    );
    Ok(())
}
