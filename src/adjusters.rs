//! # Corrective Adjusters
//!
//! Bounded greedy passes run after normalization:
//!
//! - **Protein booster**: when protein falls below the floor, adds unused meat
//!   candidates, most protein-dense first, within the remaining budget.
//! - **Fat corrector**: when fat is above the band, shrinks meat group B entries;
//!   when below, grows oils from a fixed priority list in 10 g steps.
//!
//! Both passes start from totals recomputed from the ledger, so partial updates
//! made by earlier stages cannot drift into the decision.

use tracing::{debug, info};

use crate::classifier::{Category, ClassifiedIngredients};
use crate::diet_config::DietConstraints;
use crate::engine_state::EngineState;
use crate::group_patterns::MEAT_GROUP_B;
use crate::nutrient_model::{round2, IngredientRecord};

/// Oils grown, in order, when fat is below the band
pub const OIL_PRIORITY: [&str; 4] = ["coconut oil", "wheatgerm oil", "sunflower oil", "fish oil"];

/// Dry matter added to an oil per deficit step (g)
pub const FAT_DEFICIT_STEP_DM: f64 = 10.0;

/// Outcome of the fat correction pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FatCorrection {
    /// Fat was already inside the band
    WithinBand,
    /// Meat group B entries were reduced by this much dry matter
    Reduced { dm_removed: f64 },
    /// Oils were increased by this much dry matter
    Increased { dm_added: f64 },
}

fn percent_of(state: &EngineState, grams: f64) -> f64 {
    grams * 100.0 / state.target_total()
}

/// Add protein-dense meat until protein reaches `protein_min_percent`.
///
/// Returns the dry matter added.
pub fn boost_protein(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    state.resync_totals();
    let protein_goal_g = constraints.protein_min_percent * state.target_total() / 100.0;
    if state.totals().protein_g >= protein_goal_g {
        return 0.0;
    }

    let mut candidates: Vec<&IngredientRecord> = classified
        .selected()
        .iter()
        .filter(|r| Category::MEAT_GROUPS.iter().any(|c| c.matches(&r.group)))
        .filter(|r| !state.is_used(&r.name))
        .collect();
    candidates.sort_by(|a, b| b.profile.protein.total_cmp(&a.profile.protein));

    let mut added_total = 0.0;
    for record in candidates {
        let protein_per_g = record.profile.protein / 100.0;
        if protein_per_g <= 0.0 {
            continue;
        }
        let deficit_g = protein_goal_g - state.totals().protein_g;
        let dm_needed = state.remaining_dm().min(round2(deficit_g / protein_per_g));
        let added = state.distribute_exact(&[record], dm_needed);
        state.consume(added);
        added_total += added;
        debug!(ingredient = %record.name, added_dm = added, "Protein boost");

        if state.totals().protein_g >= protein_goal_g {
            break;
        }
    }

    let protein_percent = percent_of(state, state.totals().protein_g);
    if protein_percent < constraints.protein_min_percent {
        state.push_suggestion(format!(
            "Protein is {:.2}% of DM, below the {:.2}% minimum; consider adding protein-rich meat.",
            protein_percent, constraints.protein_min_percent
        ));
    }
    info!(added_dm = added_total, protein_percent, "Protein booster finished");
    added_total
}

/// Bring fat back inside `[fat_min_percent, fat_max_percent]`
pub fn correct_fat(state: &mut EngineState, constraints: &DietConstraints) -> FatCorrection {
    state.resync_totals();
    let fat_percent = percent_of(state, state.totals().fat_g);

    let correction = if fat_percent > constraints.fat_max_percent {
        FatCorrection::Reduced {
            dm_removed: reduce_fat_excess(state, constraints),
        }
    } else if fat_percent < constraints.fat_min_percent {
        FatCorrection::Increased {
            dm_added: cover_fat_deficit(state, constraints),
        }
    } else {
        FatCorrection::WithinBand
    };

    let fat_percent = percent_of(state, state.totals().fat_g);
    if fat_percent > constraints.fat_max_percent || fat_percent < constraints.fat_min_percent {
        state.push_suggestion(format!(
            "Fat is {:.2}% of DM, outside the {:.2}-{:.2}% band.",
            fat_percent, constraints.fat_min_percent, constraints.fat_max_percent
        ));
    }
    info!(?correction, fat_percent, "Fat corrector finished");
    correction
}

fn reduce_fat_excess(state: &mut EngineState, constraints: &DietConstraints) -> f64 {
    let target_total = state.target_total();
    let mut fat_g = state.totals().fat_g;
    let mut dm_removed = 0.0;

    for entry in state
        .entries_mut()
        .iter_mut()
        .filter(|e| !e.fixed && e.group.as_deref() == Some(MEAT_GROUP_B))
    {
        let fat_per_g = entry.fat_per_gram();
        if fat_per_g <= 0.0 {
            continue;
        }
        let excess_percent = fat_g * 100.0 / target_total - constraints.fat_max_percent;
        let reducible_dm = round2((excess_percent / 100.0 * target_total) / fat_per_g);
        let old_dm = entry.dm_g;
        let old_fat = entry.fat_g;
        let new_dm = (old_dm - reducible_dm).max(0.0);

        entry.scale_nutrients(new_dm / old_dm);
        entry.dm_g = new_dm;
        fat_g -= old_fat - entry.fat_g;
        dm_removed += old_dm - new_dm;
        debug!(ingredient = %entry.ingredient, old_dm, new_dm, "Reduced fatty meat");

        if fat_g * 100.0 / target_total <= constraints.fat_max_percent {
            break;
        }
    }

    state.totals_mut().fat_g = fat_g;
    dm_removed
}

fn cover_fat_deficit(state: &mut EngineState, constraints: &DietConstraints) -> f64 {
    let target_total = state.target_total();
    let mut fat_g = state.totals().fat_g;
    let mut dm_added = 0.0;

    for oil in OIL_PRIORITY {
        let Some(entry) = state
            .entries_mut()
            .iter_mut()
            .find(|e| e.ingredient.eq_ignore_ascii_case(oil))
        else {
            continue;
        };
        let old_fat = entry.fat_g;
        entry.extend_by(FAT_DEFICIT_STEP_DM);
        fat_g += entry.fat_g - old_fat;
        dm_added += FAT_DEFICIT_STEP_DM;
        debug!(ingredient = %entry.ingredient, new_dm = entry.dm_g, "Increased oil");

        if fat_g * 100.0 / target_total >= constraints.fat_min_percent {
            break;
        }
    }

    state.totals_mut().fat_g = fat_g;
    dm_added
}
