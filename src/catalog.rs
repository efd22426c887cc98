//! # Ingredient Catalog
//!
//! Read-only, in-memory ingredient lookup. It plays the part of the ingredient
//! repository: listing what can be selected, and resolving a list of requested
//! names into the records the engine consumes. Unknown names are dropped here
//! and never reach the engine.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::diet_errors::DietError;
use crate::group_patterns::normalize_group;
use crate::nutrient_model::{FixedIngredientRecord, IngredientRecord};

/// Name and group of a catalog record, as listed to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogListing {
    pub name: String,
    pub group: String,
}

/// Collection of selectable ingredients keyed by name
#[derive(Debug, Clone, Default)]
pub struct IngredientCatalog {
    records: Vec<IngredientRecord>,
    index: HashMap<String, usize>,
}

impl IngredientCatalog {
    /// Build a catalog; a repeated name keeps its first record
    pub fn new(records: Vec<IngredientRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            if catalog.index.contains_key(&record.name) {
                warn!("Duplicate catalog entry ignored: {}", record.name);
                continue;
            }
            catalog.index.insert(record.name.clone(), catalog.records.len());
            catalog.records.push(record);
        }
        catalog
    }

    /// Parse a JSON array of ingredient records
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<IngredientRecord> =
            serde_json::from_str(json).context("Failed to parse ingredient catalog")?;
        info!("Parsed ingredient catalog with {} records", records.len());
        Ok(Self::new(records))
    }

    /// Load a JSON catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading ingredient catalog from: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ingredient catalog {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up one record by exact name
    pub fn get(&self, name: &str) -> Option<&IngredientRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Every record's name and normalized group, in catalog order
    pub fn list(&self) -> Vec<CatalogListing> {
        self.records
            .iter()
            .map(|r| CatalogListing {
                name: r.name.clone(),
                group: normalize_group(&r.group),
            })
            .collect()
    }

    /// Distinct normalized groups, sorted
    pub fn groups(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| normalize_group(&r.group))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records whose normalized group equals `group`
    pub fn by_group(&self, group: &str) -> Vec<&IngredientRecord> {
        let wanted = normalize_group(group);
        self.records
            .iter()
            .filter(|r| normalize_group(&r.group) == wanted)
            .collect()
    }

    /// Resolve requested names into engine input.
    ///
    /// Duplicates are dropped (first occurrence wins), unknown names are skipped,
    /// group tags are normalized. Fails when nothing is left.
    pub fn resolve_selection<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<IngredientRecord>, DietError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                continue;
            }
            match self.get(name) {
                Some(record) => {
                    let mut record = record.clone();
                    record.group = normalize_group(&record.group);
                    resolved.push(record);
                }
                None => warn!("Unknown ingredient skipped: {}", name),
            }
        }

        if resolved.is_empty() {
            return Err(DietError::EmptySelection);
        }
        info!("Resolved {} of {} requested ingredients", resolved.len(), names.len());
        Ok(resolved)
    }
}

/// Parse a JSON array of fixed ingredient records
pub fn parse_fixed_ingredients(json: &str) -> Result<Vec<FixedIngredientRecord>> {
    let records: Vec<FixedIngredientRecord> =
        serde_json::from_str(json).context("Failed to parse fixed ingredients")?;
    Ok(records)
}

/// Load fixed ingredients from a JSON file
pub fn load_fixed_ingredients(path: impl AsRef<Path>) -> Result<Vec<FixedIngredientRecord>> {
    let path = path.as_ref();
    info!("Loading fixed ingredients from: {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixed ingredients {}", path.display()))?;
    let records = parse_fixed_ingredients(&content)?;
    info!("Loaded {} fixed ingredients", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> IngredientCatalog {
        IngredientCatalog::new(vec![
            IngredientRecord::new("beef liver", "Organ Meat"),
            IngredientRecord::new("chicken", "Meat Group A"),
            IngredientRecord::new("rice", "Grain A"),
            IngredientRecord::new("oats", "grain  a"),
            IngredientRecord::new("chicken", "Meat Group B"),
        ])
    }

    #[test]
    fn test_duplicate_catalog_names_keep_first() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("chicken").map(|r| r.group.as_str()), Some("Meat Group A"));
    }

    #[test]
    fn test_list_and_groups() {
        let catalog = catalog();
        assert_eq!(catalog.list()[0], CatalogListing { name: "beef liver".to_string(), group: "organ meat".to_string() });
        assert_eq!(catalog.groups(), vec!["grain a", "meat group a", "organ meat"]);
        assert_eq!(catalog.by_group("GRAIN A").len(), 2);
    }

    #[test]
    fn test_resolve_selection() {
        let resolved = catalog()
            .resolve_selection(&["rice", "unicorn", "beef liver", "rice"])
            .unwrap();

        let names: Vec<&str> = resolved.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rice", "beef liver"]);
        assert_eq!(resolved[0].group, "grain a");
    }

    #[test]
    fn test_resolve_empty_selection() {
        let result = catalog().resolve_selection(&["unicorn"]);
        assert_eq!(result, Err(DietError::EmptySelection));

        let none: [&str; 0] = [];
        assert_eq!(catalog().resolve_selection(&none), Err(DietError::EmptySelection));
    }

    #[test]
    fn test_parse_fixed_ingredients() {
        let fixed = parse_fixed_ingredients(r#"[{"name": "bone meal", "dm_g": 20, "calcium": 30000}]"#).unwrap();
        assert_eq!(fixed[0].dm_g, 20.0);
        assert_eq!(fixed[0].profile.calcium, 30000.0);
    }

    #[test]
    fn test_invalid_catalog_json() {
        assert!(IngredientCatalog::from_json_str("{not json").is_err());
    }
}
