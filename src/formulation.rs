//! # Diet Formulation
//!
//! Entry point of the engine. One call builds a fresh `EngineState`, runs the
//! allocation pipeline, normalizes, applies the corrective adjusters and
//! reports. Inputs are read-only snapshots; no state survives the call.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adjusters;
use crate::allocation_pipeline;
use crate::classifier::ClassifiedIngredients;
use crate::diet_config::DietConstraints;
use crate::diet_errors::DietError;
use crate::engine_state::EngineState;
use crate::nutrient_model::{FixedIngredientRecord, IngredientRecord};
use crate::reporter::{self, DietResult};
use crate::scaling;

/// A complete calculation request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DietRequest {
    #[serde(default)]
    pub fixed: Vec<FixedIngredientRecord>,
    pub ingredients: Vec<IngredientRecord>,
    #[serde(default)]
    pub constraints: DietConstraints,
}

/// Formulate a diet from fixed rows and selected ingredient rows
///
/// # Examples
///
/// ```rust
/// use dog_diet::diet_config::DietConstraints;
/// use dog_diet::formulation::calculate;
/// use dog_diet::nutrient_model::{IngredientRecord, NutrientProfile};
///
/// let ingredients = vec![
///     IngredientRecord::new("beef liver", "organ meat")
///         .with_profile(NutrientProfile::new().with_protein(65.0).with_fat(12.0)),
///     IngredientRecord::new("chicken", "meat group a")
///         .with_profile(NutrientProfile::new().with_protein(70.0).with_fat(15.0)),
/// ];
///
/// let result = calculate(&[], &ingredients, &DietConstraints::default());
/// assert!(result.issues.is_empty());
/// assert!((result.total_dm() - 1000.0).abs() < 0.1);
/// ```
pub fn calculate(
    fixed_rows: &[FixedIngredientRecord],
    ingredient_rows: &[IngredientRecord],
    constraints: &DietConstraints,
) -> DietResult {
    info!(
        fixed = fixed_rows.len(),
        selected = ingredient_rows.len(),
        target_total = constraints.fixed_total_dm,
        "Starting diet calculation"
    );

    let classified = ClassifiedIngredients::classify(ingredient_rows);
    let mut state = EngineState::new(constraints.fixed_total_dm);

    allocation_pipeline::run(&mut state, fixed_rows, &classified, constraints);
    scaling::normalize(&mut state);
    adjusters::boost_protein(&mut state, &classified, constraints);
    adjusters::correct_fat(&mut state, constraints);

    let result = reporter::report(state);
    info!(
        entries = result.ingredient_totals.len(),
        issues = result.issues.len(),
        protein_percent = result.nutrient_percentages.protein_percent,
        fat_percent = result.nutrient_percentages.fat_percent,
        "Diet calculation finished"
    );
    result
}

/// Validate constraints and reject an empty selection before calculating
pub fn calculate_checked(
    fixed_rows: &[FixedIngredientRecord],
    ingredient_rows: &[IngredientRecord],
    constraints: &DietConstraints,
) -> Result<DietResult, DietError> {
    constraints.validate()?;
    if ingredient_rows.is_empty() {
        return Err(DietError::EmptySelection);
    }
    Ok(calculate(fixed_rows, ingredient_rows, constraints))
}

impl DietRequest {
    /// Run the request through `calculate_checked`
    pub fn calculate(&self) -> Result<DietResult, DietError> {
        calculate_checked(&self.fixed, &self.ingredients, &self.constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrient_model::NutrientProfile;

    #[test]
    fn test_checked_rejects_empty_selection() {
        let result = calculate_checked(&[], &[], &DietConstraints::default());
        assert_eq!(result, Err(DietError::EmptySelection));
    }

    #[test]
    fn test_checked_rejects_invalid_constraints() {
        let ingredients = vec![IngredientRecord::new("rice", "grain a")];
        let constraints = DietConstraints {
            fixed_total_dm: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            calculate_checked(&[], &ingredients, &constraints),
            Err(DietError::InvalidConstraints(_))
        ));
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "ingredients": [
                {"name": "beef liver", "group": "Organ Meat", "protein": 65, "fat": 12},
                {"name": "rice", "group": "Grain A", "protein": 8, "fat": 1}
            ],
            "constraints": {"organ_dm_target": 120}
        }"#;
        let request: DietRequest = serde_json::from_str(json).unwrap();
        let result = request.calculate().unwrap();

        let liver = result.dm_breakdown.iter().find(|e| e.ingredient == "beef liver").unwrap();
        assert!(liver.dm_g > 0.0);
        assert_eq!(request.constraints.meat_max, 350.0);
        assert!((result.total_dm() - 1000.0).abs() < 0.1);
    }

    #[test]
    fn test_missing_liver_is_reported_not_fatal() {
        let ingredients = vec![IngredientRecord::new("chicken", "meat group a")
            .with_profile(NutrientProfile::new().with_protein(70.0).with_fat(15.0))];
        let result = calculate(&[], &ingredients, &DietConstraints::default());

        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("Liver"));
        assert_eq!(result.dm_breakdown.len(), 1);
    }
}
