//! # Nutrient Data Model
//!
//! This module defines the records the formulation engine consumes and produces.
//! All nutrient values on an input record are expressed per 100 g of dry matter;
//! allocation entries carry absolute amounts derived from the grams assigned.
//!
//! ## Core Concepts
//!
//! - **NutrientProfile**: the nine-dimension per-100g vector
//! - **IngredientRecord**: a selectable candidate with a group tag
//! - **FixedIngredientRecord**: a mandatory base-recipe component with preset grams
//! - **AllocationEntry**: one ingredient's share of the final diet
//!
//! ## Usage
//!
//! ```rust
//! use dog_diet::nutrient_model::{AllocationEntry, IngredientRecord, NutrientProfile};
//!
//! let chicken = IngredientRecord::new("chicken breast", "meat group a")
//!     .with_profile(NutrientProfile::new().with_protein(75.0).with_fat(8.0));
//!
//! let entry = AllocationEntry::from_record(&chicken, 100.0);
//! assert_eq!(entry.protein_g, 75.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a value to two decimal places, the precision every reported gram uses
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round down to two decimal places, tolerating float noise just below a cent
pub fn floor2(value: f64) -> f64 {
    (value * 100.0 + 1e-9).floor() / 100.0
}

/// Nutrient content per 100 g of dry matter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientProfile {
    /// Crude protein (g)
    pub protein: f64,
    /// Crude fat (g)
    pub fat: f64,
    /// Carbohydrate (g)
    pub cho: f64,
    /// Crude fiber (g)
    pub fiber: f64,
    /// Ash (g)
    pub ash: f64,
    /// Calcium (mg)
    pub calcium: f64,
    /// Phosphorus (mg)
    pub phosphorus: f64,
    /// Iron (mg)
    pub iron: f64,
    /// Metabolizable energy (kcal)
    pub energy: f64,
}

/// A candidate ingredient the caller selected for allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    /// Unique name within a request (e.g., "beef liver", "coconut oil")
    pub name: String,

    /// Group tag (e.g., "organ meat", "meat group b", "vegetable a")
    pub group: String,

    /// Per-100g dry matter nutrient vector
    #[serde(flatten)]
    pub profile: NutrientProfile,
}

/// A mandatory base-recipe ingredient with a predetermined dry-matter amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedIngredientRecord {
    /// Ingredient name
    pub name: String,

    /// Dry matter assigned before allocation starts (g)
    pub dm_g: f64,

    /// Per-100g dry matter nutrient vector
    #[serde(flatten)]
    pub profile: NutrientProfile,
}

/// One ingredient's final share of the diet, with its derived absolute nutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub ingredient: String,
    /// Normalized group tag, `None` for fixed ingredients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub dm_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub cho_g: f64,
    pub fiber_g: f64,
    pub ash_g: f64,
    pub ca_mg: f64,
    pub p_mg: f64,
    pub iron_mg: f64,
    pub energy_kcal: f64,
    pub fixed: bool,
}

/// Running sums of absolute nutrient amounts maintained while allocating
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub protein_g: f64,
    pub fat_g: f64,
    pub cho_g: f64,
    pub fiber_g: f64,
    pub ash_g: f64,
    /// Calcium, accumulated as `value * dm / 1000`
    pub ca_g: f64,
    /// Phosphorus, accumulated as `value * dm / 1000`
    pub p_g: f64,
    pub iron_mg: f64,
    pub energy_kcal: f64,
}

impl NutrientProfile {
    /// Create an all-zero profile
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protein(mut self, protein: f64) -> Self {
        self.protein = protein;
        self
    }

    pub fn with_fat(mut self, fat: f64) -> Self {
        self.fat = fat;
        self
    }

    pub fn with_cho(mut self, cho: f64) -> Self {
        self.cho = cho;
        self
    }

    pub fn with_fiber(mut self, fiber: f64) -> Self {
        self.fiber = fiber;
        self
    }

    pub fn with_ash(mut self, ash: f64) -> Self {
        self.ash = ash;
        self
    }

    /// Set calcium and phosphorus together, both in mg per 100 g
    pub fn with_minerals(mut self, calcium: f64, phosphorus: f64) -> Self {
        self.calcium = calcium;
        self.phosphorus = phosphorus;
        self
    }

    pub fn with_iron(mut self, iron: f64) -> Self {
        self.iron = iron;
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }
}

impl IngredientRecord {
    /// Create a new record with an empty nutrient profile
    pub fn new(name: &str, group: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            profile: NutrientProfile::default(),
        }
    }

    /// Attach a nutrient profile to this record
    pub fn with_profile(mut self, profile: NutrientProfile) -> Self {
        self.profile = profile;
        self
    }
}

impl FixedIngredientRecord {
    /// Create a fixed ingredient with a preset dry-matter amount
    pub fn new(name: &str, dm_g: f64) -> Self {
        Self {
            name: name.to_string(),
            dm_g,
            profile: NutrientProfile::default(),
        }
    }

    /// Attach a nutrient profile to this record
    pub fn with_profile(mut self, profile: NutrientProfile) -> Self {
        self.profile = profile;
        self
    }
}

impl AllocationEntry {
    /// Derive an entry from a per-100g profile and the grams assigned.
    ///
    /// Every absolute field is `value * dm / 100`, rounded to two decimals.
    /// Calcium, phosphorus and iron keep their per-100g milligram scale here;
    /// the reporter converts them.
    pub fn new(name: &str, profile: &NutrientProfile, dm_g: f64, fixed: bool) -> Self {
        let share = |value: f64| round2(value * dm_g / 100.0);
        Self {
            ingredient: name.to_string(),
            group: None,
            dm_g,
            protein_g: share(profile.protein),
            fat_g: share(profile.fat),
            cho_g: share(profile.cho),
            fiber_g: share(profile.fiber),
            ash_g: share(profile.ash),
            ca_mg: share(profile.calcium),
            p_mg: share(profile.phosphorus),
            iron_mg: share(profile.iron),
            energy_kcal: share(profile.energy),
            fixed,
        }
    }

    /// Build a non-fixed entry for a selected candidate
    pub fn from_record(record: &IngredientRecord, dm_g: f64) -> Self {
        let mut entry = Self::new(&record.name, &record.profile, dm_g, false);
        entry.group = Some(record.group.clone());
        entry
    }

    /// Build a fixed entry from its preset amount
    pub fn from_fixed(record: &FixedIngredientRecord) -> Self {
        Self::new(&record.name, &record.profile, record.dm_g, true)
    }

    /// Multiply the dry matter and every nutrient field by `factor`, rounding to two decimals
    pub fn scale(&mut self, factor: f64) {
        self.dm_g = round2(self.dm_g * factor);
        self.scale_nutrients(factor);
    }

    /// Multiply only the nutrient fields by `factor`, rounding to two decimals
    pub fn scale_nutrients(&mut self, factor: f64) {
        for field in self.nutrient_fields_mut() {
            *field = round2(*field * factor);
        }
    }

    /// Add `extra_dm` grams, growing each nutrient at its current per-gram density.
    ///
    /// An entry with no dry matter has no density, so only its grams grow.
    pub fn extend_by(&mut self, extra_dm: f64) {
        let base_dm = self.dm_g;
        self.dm_g += extra_dm;
        for field in self.nutrient_fields_mut() {
            let per_g = if base_dm > 0.0 { *field / base_dm } else { 0.0 };
            *field += round2(per_g * extra_dm);
        }
    }

    /// Fat carried by each gram of this entry's dry matter
    pub fn fat_per_gram(&self) -> f64 {
        if self.dm_g > 0.0 {
            self.fat_g / self.dm_g
        } else {
            0.0
        }
    }

    fn nutrient_fields_mut(&mut self) -> [&mut f64; 9] {
        [
            &mut self.protein_g,
            &mut self.fat_g,
            &mut self.cho_g,
            &mut self.fiber_g,
            &mut self.ash_g,
            &mut self.ca_mg,
            &mut self.p_mg,
            &mut self.iron_mg,
            &mut self.energy_kcal,
        ]
    }
}

impl NutrientTotals {
    /// Add the contribution of `dm_g` grams of an ingredient with `profile`.
    ///
    /// Macronutrients and energy use `value * dm / 100`; calcium and phosphorus
    /// use `value * dm / 1000`; iron uses `value * dm / 100` in milligrams.
    pub fn add(&mut self, profile: &NutrientProfile, dm_g: f64) {
        self.protein_g += profile.protein * dm_g / 100.0;
        self.fat_g += profile.fat * dm_g / 100.0;
        self.cho_g += profile.cho * dm_g / 100.0;
        self.fiber_g += profile.fiber * dm_g / 100.0;
        self.ash_g += profile.ash * dm_g / 100.0;
        self.ca_g += profile.calcium * dm_g / 1000.0;
        self.p_g += profile.phosphorus * dm_g / 1000.0;
        self.iron_mg += profile.iron * dm_g / 100.0;
        self.energy_kcal += profile.energy * dm_g / 100.0;
    }

    /// Rebuild totals from final entries instead of the incremental sums.
    ///
    /// Entry minerals are stored on the per-100g milligram scale, so calcium and
    /// phosphorus are divided by 1000 and iron by 100.
    pub fn from_entries(entries: &[AllocationEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut totals, entry| {
            totals.protein_g += entry.protein_g;
            totals.fat_g += entry.fat_g;
            totals.cho_g += entry.cho_g;
            totals.fiber_g += entry.fiber_g;
            totals.ash_g += entry.ash_g;
            totals.ca_g += entry.ca_mg / 1000.0;
            totals.p_g += entry.p_mg / 1000.0;
            totals.iron_mg += entry.iron_mg / 100.0;
            totals.energy_kcal += entry.energy_kcal;
            totals
        })
    }
}

impl fmt::Display for IngredientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] (protein {}, fat {} per 100 g DM)",
            self.name, self.group, self.profile.protein, self.profile.fat
        )
    }
}

impl fmt::Display for AllocationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2} g DM", self.ingredient, self.dm_g)?;
        if self.fixed {
            write!(f, " (fixed)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beef() -> IngredientRecord {
        IngredientRecord::new("beef", "meat group b").with_profile(
            NutrientProfile::new()
                .with_protein(60.0)
                .with_fat(35.0)
                .with_minerals(40.0, 500.0)
                .with_iron(6.0)
                .with_energy(550.0),
        )
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(-1.234), -1.23);
    }

    #[test]
    fn test_floor2() {
        assert_eq!(floor2(33.339), 33.33);
        assert_eq!(floor2(0.0071), 0.0);
        assert_eq!(floor2(0.3 / 3.0), 0.1);
    }

    #[test]
    fn test_entry_from_record() {
        let entry = AllocationEntry::from_record(&beef(), 200.0);

        assert_eq!(entry.ingredient, "beef");
        assert_eq!(entry.group.as_deref(), Some("meat group b"));
        assert_eq!(entry.dm_g, 200.0);
        assert_eq!(entry.protein_g, 120.0);
        assert_eq!(entry.fat_g, 70.0);
        assert_eq!(entry.ca_mg, 80.0);
        assert_eq!(entry.p_mg, 1000.0);
        assert_eq!(entry.iron_mg, 12.0);
        assert_eq!(entry.energy_kcal, 1100.0);
        assert!(!entry.fixed);
    }

    #[test]
    fn test_entry_from_fixed() {
        let fixed = FixedIngredientRecord::new("bone meal", 20.0)
            .with_profile(NutrientProfile::new().with_minerals(30000.0, 14000.0));
        let entry = AllocationEntry::from_fixed(&fixed);

        assert!(entry.fixed);
        assert_eq!(entry.group, None);
        assert_eq!(entry.ca_mg, 6000.0);
        assert_eq!(entry.p_mg, 2800.0);
    }

    #[test]
    fn test_scale_rounds_every_field() {
        let mut entry = AllocationEntry::from_record(&beef(), 100.0);
        entry.scale(1.0 / 3.0);

        assert_eq!(entry.dm_g, 33.33);
        assert_eq!(entry.protein_g, 20.0);
        assert_eq!(entry.fat_g, 11.67);
        assert_eq!(entry.energy_kcal, 183.33);
    }

    #[test]
    fn test_extend_keeps_density() {
        let oil = IngredientRecord::new("coconut oil", "oil")
            .with_profile(NutrientProfile::new().with_fat(100.0).with_energy(900.0));
        let mut entry = AllocationEntry::from_record(&oil, 5.0);
        entry.extend_by(10.0);

        assert_eq!(entry.dm_g, 15.0);
        assert_eq!(entry.fat_g, 15.0);
        assert_eq!(entry.energy_kcal, 135.0);
    }

    #[test]
    fn test_extend_empty_entry_only_grows_grams() {
        let mut entry = AllocationEntry::from_record(&beef(), 0.0);
        entry.extend_by(10.0);

        assert_eq!(entry.dm_g, 10.0);
        assert_eq!(entry.fat_g, 0.0);
    }

    #[test]
    fn test_totals_unit_asymmetry() {
        let record = beef();
        let mut totals = NutrientTotals::default();
        totals.add(&record.profile, 100.0);

        assert_eq!(totals.protein_g, 60.0);
        assert_eq!(totals.ca_g, 4.0);
        assert_eq!(totals.p_g, 50.0);
        assert_eq!(totals.iron_mg, 6.0);

        let from_entries = NutrientTotals::from_entries(&[AllocationEntry::from_record(&record, 100.0)]);
        assert_eq!(from_entries.protein_g, 60.0);
        assert_eq!(from_entries.ca_g, 0.04);
        assert_eq!(from_entries.p_g, 0.5);
        assert_eq!(from_entries.iron_mg, 0.06);
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{"name":"pumpkin","group":"Vegetable A","protein":12.0,"fat":1.5,"fiber":10.0}"#;
        let record: IngredientRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.name, "pumpkin");
        assert_eq!(record.profile.protein, 12.0);
        assert_eq!(record.profile.fiber, 10.0);
        assert_eq!(record.profile.calcium, 0.0);
    }

    #[test]
    fn test_display_formatting() {
        let entry = AllocationEntry::from_fixed(&FixedIngredientRecord::new("rice", 120.5));
        assert_eq!(format!("{}", entry), "rice: 120.50 g DM (fixed)");
    }
}
