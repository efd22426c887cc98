//! # Nutrient Reporter
//!
//! Builds the calculation result from the final allocation ledger. Totals are
//! recomputed from the entries themselves rather than taken from the running
//! accumulator, then expressed as percentages of the target total.

use serde::{Deserialize, Serialize};

use crate::engine_state::EngineState;
use crate::nutrient_model::{round2, AllocationEntry, NutrientTotals};

/// Nutrient profile of the finished diet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientPercentages {
    pub protein_percent: f64,
    pub fat_percent: f64,
    pub cho_percent: f64,
    pub fiber_percent: f64,
    pub ash_percent: f64,
    pub ca_percent: f64,
    pub p_percent: f64,
    /// Calcium to phosphorus ratio, 0 when there is no phosphorus
    pub ca_p_ratio: f64,
    /// Absolute energy (kcal)
    pub energy: f64,
    /// Final dry matter as a percentage of the target total
    pub dm_percent: f64,
}

/// One line of the dry-matter breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmBreakdownEntry {
    pub ingredient: String,
    pub dm_g: f64,
    pub fixed: bool,
}

/// Complete output of one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietResult {
    pub nutrient_percentages: NutrientPercentages,
    pub dm_breakdown: Vec<DmBreakdownEntry>,
    pub ingredient_totals: Vec<AllocationEntry>,
    /// Blocking problems (e.g. missing liver)
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl DietResult {
    /// Check whether the diet has no blocking issue
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Sum of dry matter across the breakdown
    pub fn total_dm(&self) -> f64 {
        self.dm_breakdown.iter().map(|e| e.dm_g).sum()
    }
}

/// Compute the nutrient percentages of `entries` against `target_total`
pub fn nutrient_percentages(entries: &[AllocationEntry], target_total: f64) -> NutrientPercentages {
    let totals = NutrientTotals::from_entries(entries);
    let total_dm: f64 = entries.iter().map(|e| e.dm_g).sum();
    let percent = |grams: f64| round2(grams * 100.0 / target_total);

    NutrientPercentages {
        protein_percent: percent(totals.protein_g),
        fat_percent: percent(totals.fat_g),
        cho_percent: percent(totals.cho_g),
        fiber_percent: percent(totals.fiber_g),
        ash_percent: percent(totals.ash_g),
        ca_percent: percent(totals.ca_g),
        p_percent: percent(totals.p_g),
        ca_p_ratio: if totals.p_g != 0.0 {
            round2(totals.ca_g / totals.p_g)
        } else {
            0.0
        },
        energy: round2(totals.energy_kcal),
        dm_percent: percent(total_dm),
    }
}

/// Consume the engine state and build the result
pub fn report(state: EngineState) -> DietResult {
    let target_total = state.target_total();
    let (entries, issues, warnings, suggestions) = state.into_parts();

    let dm_breakdown = entries
        .iter()
        .map(|e| DmBreakdownEntry {
            ingredient: e.ingredient.clone(),
            dm_g: e.dm_g,
            fixed: e.fixed,
        })
        .collect();

    DietResult {
        nutrient_percentages: nutrient_percentages(&entries, target_total),
        dm_breakdown,
        ingredient_totals: entries,
        issues,
        warnings,
        suggestions,
    }
}
