//! # Scaling Normalizer
//!
//! Rescales every non-fixed allocation so the ledger's total dry matter lands on
//! the configured target. Fixed entries are never touched.

use tracing::{debug, warn};

use crate::engine_state::EngineState;

/// Gaps smaller than this (g) are left alone
pub const SCALING_TOLERANCE_DM: f64 = 0.1;

/// Rescale non-fixed entries toward the target total.
///
/// Returns the factor applied, or `None` when the gap is under tolerance or
/// there is nothing to scale. A gap that would push non-fixed dry matter below
/// zero is clamped to zero and reported as a warning.
pub fn normalize(state: &mut EngineState) -> Option<f64> {
    let total_used = state.total_dm();
    let scaling_needed = state.target_total() - total_used;
    let nonfixed_total = state.nonfixed_dm();

    if nonfixed_total <= 0.0 || scaling_needed.abs() < SCALING_TOLERANCE_DM {
        debug!(total_used, scaling_needed, "No rescaling needed");
        return None;
    }

    let mut scale_factor = (nonfixed_total + scaling_needed) / nonfixed_total;
    if scale_factor < 0.0 {
        warn!(scale_factor, "Fixed dry matter leaves no room for other ingredients");
        state.push_warning(format!(
            "Fixed ingredients leave no room within the {:.2} g total; other ingredients were scaled to zero.",
            state.target_total()
        ));
        scale_factor = 0.0;
    }

    for entry in state.entries_mut().iter_mut().filter(|e| !e.fixed) {
        entry.scale(scale_factor);
    }
    state.resync_totals();

    debug!(
        scale_factor,
        total_before = total_used,
        total_after = state.total_dm(),
        "Rescaled non-fixed entries"
    );
    Some(scale_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrient_model::{FixedIngredientRecord, IngredientRecord, NutrientProfile};

    fn candidate(name: &str) -> IngredientRecord {
        IngredientRecord::new(name, "meat group a")
            .with_profile(NutrientProfile::new().with_protein(50.0).with_fat(10.0))
    }

    #[test]
    fn test_scales_up_to_target() {
        let (a, b) = (candidate("a"), candidate("b"));
        let mut state = EngineState::new(1000.0);
        state.add_fixed(&FixedIngredientRecord::new("rice", 200.0));
        state.distribute_exact(&[&a, &b], 400.0);

        let factor = normalize(&mut state);

        assert_eq!(factor, Some(2.0));
        assert_eq!(state.entries()[0].dm_g, 200.0);
        assert_eq!(state.entries()[1].dm_g, 400.0);
        assert_eq!(state.entries()[1].protein_g, 200.0);
        assert!((state.total_dm() - 1000.0).abs() < 0.1);
        assert_eq!(state.totals().protein_g, 400.0);
    }

    #[test]
    fn test_scales_down_to_target() {
        let (a, b, c) = (candidate("a"), candidate("b"), candidate("c"));
        let mut state = EngineState::new(1000.0);
        state.distribute_exact(&[&a, &b, &c], 1100.0);

        assert!(normalize(&mut state).is_some());
        assert!((state.total_dm() - 1000.0).abs() < 0.1);
    }

    #[test]
    fn test_small_gap_is_left_alone() {
        let a = candidate("a");
        let mut state = EngineState::new(1000.0);
        state.add_fixed(&FixedIngredientRecord::new("rice", 500.0));
        state.distribute_exact(&[&a], 499.95);

        assert_eq!(normalize(&mut state), None);
        assert_eq!(state.entries()[1].dm_g, 499.95);
    }

    #[test]
    fn test_fixed_only_is_left_alone() {
        let mut state = EngineState::new(1000.0);
        state.add_fixed(&FixedIngredientRecord::new("rice", 400.0));

        assert_eq!(normalize(&mut state), None);
        assert_eq!(state.total_dm(), 400.0);
    }

    #[test]
    fn test_overrun_clamps_to_zero() {
        let a = candidate("a");
        let mut state = EngineState::new(100.0);
        state.add_fixed(&FixedIngredientRecord::new("rice", 150.0));
        state.distribute_exact(&[&a], 20.0);

        assert_eq!(normalize(&mut state), Some(0.0));
        assert_eq!(state.entries()[1].dm_g, 0.0);
        assert_eq!(state.entries()[0].dm_g, 150.0);
        assert_eq!(state.warnings().len(), 1);
    }
}
