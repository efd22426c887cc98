//! # Category Allocation Pipeline
//!
//! Runs the fixed sequence of allocation stages against one `EngineState`:
//! fixed ingredients, organ meat, vegetables, fruit, oil, grains, meat groups,
//! then the leftover pass. Every stage spends from the shared remaining-budget
//! counter and skips ingredients an earlier stage already used.
//!
//! Meat allocation is driven by an explicit rule table (`MEAT_RULES`) keyed by
//! which single meat group is present and whether its mean fat crosses a
//! threshold. Any other combination pools the groups.

use std::cmp::Ordering;
use tracing::{debug, info, warn};

use crate::classifier::{Category, ClassifiedIngredients};
use crate::diet_config::DietConstraints;
use crate::engine_state::EngineState;
use crate::nutrient_model::{FixedIngredientRecord, IngredientRecord};

/// Vegetable groups A, B and C share this combined target (g)
pub const COMBINED_VEGETABLE_DM: f64 = 150.0;

/// Whole grams of the organ target reserved for liver: two thirds, rounded down
pub fn liver_target(organ_dm_target: f64) -> f64 {
    (organ_dm_target * 2.0 / 3.0).floor()
}

/// Blocking issue raised when no liver is selected
pub const MISSING_LIVER_ISSUE: &str = "Liver is required (10% of DM).";

/// Fat condition on the mean fat (per 100 g DM) of a meat group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FatThreshold {
    /// Triggered when mean fat is strictly below the value
    Below(f64),
    /// Triggered when mean fat is strictly above the value
    Above(f64),
}

impl FatThreshold {
    pub fn is_triggered(&self, mean_fat: f64) -> bool {
        match *self {
            FatThreshold::Below(limit) => mean_fat < limit,
            FatThreshold::Above(limit) => mean_fat > limit,
        }
    }
}

/// Second allocation made after a triggered rule's primary allocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowUp {
    /// Top up from these groups, fattiest first, until meat usage reaches `meat_min`
    TopUpToMeatMin { from: [Category; 2] },
    /// Backfill a fixed amount from another group
    Backfill { from: Category, dm_g: f64 },
}

/// One row of the meat decision table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeatRule {
    /// The only meat group present
    pub only: Category,
    pub threshold: FatThreshold,
    /// Dry matter given to `only` when the threshold is triggered (g)
    pub primary_dm: f64,
    pub follow_up: FollowUp,
}

/// Rules for a single present meat group; an untriggered rule allocates
/// the group alone up to `meat_max`
pub const MEAT_RULES: [MeatRule; 3] = [
    MeatRule {
        only: Category::MeatGroupA,
        threshold: FatThreshold::Below(12.0),
        primary_dm: 150.0,
        follow_up: FollowUp::TopUpToMeatMin {
            from: [Category::MeatGroupB, Category::MeatGroupC],
        },
    },
    MeatRule {
        only: Category::MeatGroupB,
        threshold: FatThreshold::Above(30.0),
        primary_dm: 200.0,
        follow_up: FollowUp::Backfill {
            from: Category::MeatGroupA,
            dm_g: 150.0,
        },
    },
    MeatRule {
        only: Category::MeatGroupC,
        threshold: FatThreshold::Above(16.0),
        primary_dm: 200.0,
        follow_up: FollowUp::Backfill {
            from: Category::MeatGroupA,
            dm_g: 100.0,
        },
    },
];

/// Allocation action chosen for the meat stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeatPlan {
    /// A single group is present and its rule is triggered
    Rule(MeatRule),
    /// A single group is present and is allocated alone up to `meat_max`
    Alone(Category),
    /// Zero, two or three groups are present; pool them up to `meat_max`
    Pooled,
}

/// Pick the meat plan from the groups present and the single group's mean fat
pub fn select_meat_plan(present: &[Category], mean_fat: f64) -> MeatPlan {
    let [only] = present else {
        return MeatPlan::Pooled;
    };
    match MEAT_RULES.iter().find(|rule| rule.only == *only) {
        Some(rule) if rule.threshold.is_triggered(mean_fat) => MeatPlan::Rule(*rule),
        _ => MeatPlan::Alone(*only),
    }
}

/// Dry matter each stage consumed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageUsage {
    pub fixed_dm: f64,
    pub organ_dm: f64,
    pub vegetable_dm: f64,
    pub fruit_dm: f64,
    pub oil_dm: f64,
    pub grain_dm: f64,
    pub meat_dm: f64,
    pub leftover_dm: f64,
}

/// Run every stage in order
pub fn run(
    state: &mut EngineState,
    fixed: &[FixedIngredientRecord],
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> StageUsage {
    let usage = StageUsage {
        fixed_dm: allocate_fixed(state, fixed),
        organ_dm: allocate_organs(state, classified, constraints),
        vegetable_dm: allocate_vegetables(state, classified, constraints),
        fruit_dm: allocate_fruit(state, classified, constraints),
        oil_dm: allocate_oil(state, classified, constraints),
        grain_dm: allocate_grains(state, classified, constraints),
        meat_dm: allocate_meat(state, classified, constraints),
        leftover_dm: distribute_leftover(state, classified),
    };
    info!(
        remaining_dm = state.remaining_dm(),
        entries = state.entries().len(),
        "Allocation pipeline finished"
    );
    usage
}

/// Fixed ingredients: consumed outside the candidate budget
pub fn allocate_fixed(state: &mut EngineState, fixed: &[FixedIngredientRecord]) -> f64 {
    let mut used = 0.0;
    for record in fixed {
        state.add_fixed(record);
        used += record.dm_g;
    }
    if state.remaining_dm() < 0.0 {
        warn!(
            fixed_dm = used,
            target_total = state.target_total(),
            "Fixed ingredients exceed the total dry matter"
        );
        state.push_warning(format!(
            "Fixed ingredients use {:.2} g DM, more than the {:.2} g total.",
            used,
            state.target_total()
        ));
    }
    debug!(stage = "fixed", used_dm = used, "Stage complete");
    used
}

/// Organ meat: two thirds of the target to the first liver, the rest to other organs.
///
/// Without a liver the stage is skipped and a blocking issue is recorded.
pub fn allocate_organs(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    let Some(liver) = classified.liver() else {
        warn!("No liver selected, skipping organ allocation");
        state.push_issue(MISSING_LIVER_ISSUE);
        return 0.0;
    };

    let liver_dm = liver_target(constraints.organ_dm_target);
    let liver_used = state.distribute_exact(&[liver], liver_dm);
    state.consume(liver_used);

    let other_used =
        state.distribute_exact(&classified.other_organs(), constraints.organ_dm_target - liver_used);
    state.consume(other_used);

    debug!(stage = "organ", liver_dm = liver_used, other_dm = other_used, "Stage complete");
    liver_used + other_used
}

/// Vegetables: minimums for A and B, then C fills the combined target
pub fn allocate_vegetables(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    let veg_a_used = distribute_category(state, classified, Category::VegetableA, constraints.veg_a_min);
    let veg_b_used = distribute_category(state, classified, Category::VegetableB, constraints.veg_b_min);
    let veg_c_target = (COMBINED_VEGETABLE_DM - veg_a_used - veg_b_used).max(0.0);
    let veg_c_used = distribute_category(state, classified, Category::VegetableC, veg_c_target);

    let used = veg_a_used + veg_b_used + veg_c_used;
    state.consume(used);
    debug!(stage = "vegetable", veg_a_used, veg_b_used, veg_c_used, "Stage complete");
    used
}

pub fn allocate_fruit(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    let used = distribute_category(state, classified, Category::Fruit, constraints.fruit_dm_limit);
    state.consume(used);
    debug!(stage = "fruit", used_dm = used, "Stage complete");
    used
}

pub fn allocate_oil(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    let used = distribute_category(state, classified, Category::Oil, constraints.oil_dm_reserved);
    state.consume(used);
    debug!(stage = "oil", used_dm = used, "Stage complete");
    used
}

/// Grains: the group A minimum, then the group B maximum
pub fn allocate_grains(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    let grain_a_used = distribute_category(state, classified, Category::GrainA, constraints.grain_a_min);
    let grain_b_used = distribute_category(state, classified, Category::GrainB, constraints.grain_b_max);

    let used = grain_a_used + grain_b_used;
    state.consume(used);
    debug!(stage = "grain", grain_a_used, grain_b_used, "Stage complete");
    used
}

/// Meat groups, following the plan chosen from `MEAT_RULES`
pub fn allocate_meat(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    constraints: &DietConstraints,
) -> f64 {
    let present: Vec<Category> = Category::MEAT_GROUPS
        .into_iter()
        .filter(|group| classified.has(*group))
        .collect();
    let mean_fat = match present.as_slice() {
        [only] => mean_fat(classified.get(*only)),
        _ => 0.0,
    };
    let plan = select_meat_plan(&present, mean_fat);
    debug!(?present, mean_fat, ?plan, "Selected meat plan");

    let mut meat_used = 0.0;
    match plan {
        MeatPlan::Rule(rule) => {
            meat_used += distribute_category(state, classified, rule.only, rule.primary_dm);
            match rule.follow_up {
                FollowUp::TopUpToMeatMin { from } => {
                    let mut pool: Vec<&IngredientRecord> = from
                        .iter()
                        .flat_map(|group| classified.get(*group))
                        .collect();
                    pool.sort_by(|a, b| fat_descending(a, b));
                    meat_used += state.distribute_exact(&pool, constraints.meat_min - meat_used);
                }
                FollowUp::Backfill { from, dm_g } => {
                    meat_used += distribute_category(state, classified, from, dm_g);
                }
            }
        }
        MeatPlan::Alone(group) => {
            meat_used += distribute_category(state, classified, group, constraints.meat_max);
        }
        MeatPlan::Pooled => {
            let pool: Vec<&IngredientRecord> = Category::MEAT_GROUPS
                .iter()
                .flat_map(|group| classified.get(*group))
                .collect();
            meat_used += state.distribute_exact(&pool, constraints.meat_max);
        }
    }

    state.consume(meat_used);
    if !present.is_empty() && meat_used < constraints.meat_min {
        state.push_suggestion(format!(
            "Meat uses {:.2} g DM, below the {:.2} g minimum; consider adding meat from another group.",
            meat_used, constraints.meat_min
        ));
    }
    debug!(stage = "meat", used_dm = meat_used, "Stage complete");
    meat_used
}

/// Spread any positive remaining budget across every still-unused candidate
pub fn distribute_leftover(state: &mut EngineState, classified: &ClassifiedIngredients) -> f64 {
    let remaining = state.remaining_dm();
    if remaining <= 0.0 {
        return 0.0;
    }
    let unused: Vec<&IngredientRecord> = classified
        .selected()
        .iter()
        .filter(|r| !state.is_used(&r.name))
        .collect();
    let used = state.distribute_exact(&unused, remaining);
    state.consume(used);
    debug!(stage = "leftover", used_dm = used, candidates = unused.len(), "Stage complete");
    used
}

fn distribute_category(
    state: &mut EngineState,
    classified: &ClassifiedIngredients,
    category: Category,
    target_dm: f64,
) -> f64 {
    let candidates: Vec<&IngredientRecord> = classified.get(category).iter().collect();
    state.distribute_exact(&candidates, target_dm)
}

fn mean_fat(records: &[IngredientRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.profile.fat).sum::<f64>() / records.len() as f64
}

fn fat_descending(a: &IngredientRecord, b: &IngredientRecord) -> Ordering {
    b.profile.fat.total_cmp(&a.profile.fat)
}
