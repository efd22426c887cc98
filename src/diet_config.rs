//! # Diet Configuration Module
//!
//! This module defines the constraint set the formulation engine runs against,
//! including dry-matter targets per category and nutrient percentage bands.
//! Every option can be overridden independently, either from a partial JSON
//! object or from `DIET_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;

use crate::diet_errors::DietError;

// Canonical defaults for a 1000 g dry-matter diet
pub const FIXED_TOTAL_DM: f64 = 1000.0;
pub const ORGAN_DM_TARGET: f64 = 150.0;
pub const OIL_DM_RESERVED: f64 = 10.0;
pub const FRUIT_DM_LIMIT: f64 = 20.0;
pub const GRAIN_A_MIN: f64 = 100.0;
pub const GRAIN_B_MAX: f64 = 200.0;
pub const VEG_A_MIN: f64 = 80.0;
pub const VEG_B_MIN: f64 = 50.0;
pub const MEAT_MIN: f64 = 200.0;
pub const MEAT_MAX: f64 = 350.0;
pub const PROTEIN_MIN_PERCENT: f64 = 32.0;
pub const FAT_MIN_PERCENT: f64 = 12.0;
pub const FAT_MAX_PERCENT: f64 = 17.0;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "DIET_";

/// Constraint set for one calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DietConstraints {
    /// Total dry matter the final diet must sum to (g)
    pub fixed_total_dm: f64,
    /// Organ meat allocation, liver included (g)
    pub organ_dm_target: f64,
    /// Dry matter reserved for oils (g)
    pub oil_dm_reserved: f64,
    /// Dry matter allowed for fruit (g)
    pub fruit_dm_limit: f64,
    /// Minimum for grain group A (g)
    pub grain_a_min: f64,
    /// Maximum for grain group B (g)
    pub grain_b_max: f64,
    /// Minimum for vegetable group A (g)
    pub veg_a_min: f64,
    /// Minimum for vegetable group B (g)
    pub veg_b_min: f64,
    /// Meat usage the lean-meat top-up aims for (g)
    pub meat_min: f64,
    /// Meat cap when a single group is allocated alone or groups are pooled (g)
    pub meat_max: f64,
    /// Protein floor as a percentage of total dry matter
    pub protein_min_percent: f64,
    /// Lower edge of the fat band (%)
    pub fat_min_percent: f64,
    /// Upper edge of the fat band (%)
    pub fat_max_percent: f64,
}

impl Default for DietConstraints {
    fn default() -> Self {
        Self {
            fixed_total_dm: FIXED_TOTAL_DM,
            organ_dm_target: ORGAN_DM_TARGET,
            oil_dm_reserved: OIL_DM_RESERVED,
            fruit_dm_limit: FRUIT_DM_LIMIT,
            grain_a_min: GRAIN_A_MIN,
            grain_b_max: GRAIN_B_MAX,
            veg_a_min: VEG_A_MIN,
            veg_b_min: VEG_B_MIN,
            meat_min: MEAT_MIN,
            meat_max: MEAT_MAX,
            protein_min_percent: PROTEIN_MIN_PERCENT,
            fat_min_percent: FAT_MIN_PERCENT,
            fat_max_percent: FAT_MAX_PERCENT,
        }
    }
}

impl DietConstraints {
    /// Build constraints from defaults overridden by `DIET_*` environment variables
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dog_diet::diet_config::DietConstraints;
    ///
    /// // DIET_MEAT_MAX=300 DIET_FAT_MAX_PERCENT=18
    /// let constraints = DietConstraints::from_env()?;
    /// # Ok::<(), dog_diet::diet_errors::DietError>(())
    /// ```
    pub fn from_env() -> Result<Self, DietError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by `DIET_<OPTION>` names.
    ///
    /// Options the lookup does not know keep their current value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, DietError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, slot) in self.options_mut() {
            let key = format!("{}{}", ENV_PREFIX, name.to_uppercase());
            if let Some(raw) = lookup(&key) {
                *slot = raw.trim().parse::<f64>().map_err(|_| {
                    DietError::InvalidConstraints(format!("{key} is not a number: {raw:?}"))
                })?;
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Parse a partial JSON object; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, DietError> {
        let constraints: Self = serde_json::from_str(json)
            .map_err(|e| DietError::InvalidConstraints(e.to_string()))?;
        constraints.validate()?;
        Ok(constraints)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), DietError> {
        if self.fixed_total_dm <= 0.0 {
            return Err(DietError::InvalidConstraints(
                "fixed_total_dm must be positive".to_string(),
            ));
        }
        let options = [
            ("organ_dm_target", self.organ_dm_target),
            ("oil_dm_reserved", self.oil_dm_reserved),
            ("fruit_dm_limit", self.fruit_dm_limit),
            ("grain_a_min", self.grain_a_min),
            ("grain_b_max", self.grain_b_max),
            ("veg_a_min", self.veg_a_min),
            ("veg_b_min", self.veg_b_min),
            ("meat_min", self.meat_min),
            ("meat_max", self.meat_max),
            ("protein_min_percent", self.protein_min_percent),
            ("fat_min_percent", self.fat_min_percent),
            ("fat_max_percent", self.fat_max_percent),
        ];
        if let Some((name, value)) = options.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(DietError::InvalidConstraints(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
        if self.fat_min_percent > self.fat_max_percent {
            return Err(DietError::InvalidConstraints(format!(
                "fat_min_percent ({}) exceeds fat_max_percent ({})",
                self.fat_min_percent, self.fat_max_percent
            )));
        }
        Ok(())
    }

    fn options_mut(&mut self) -> [(&'static str, &mut f64); 13] {
        [
            ("fixed_total_dm", &mut self.fixed_total_dm),
            ("organ_dm_target", &mut self.organ_dm_target),
            ("oil_dm_reserved", &mut self.oil_dm_reserved),
            ("fruit_dm_limit", &mut self.fruit_dm_limit),
            ("grain_a_min", &mut self.grain_a_min),
            ("grain_b_max", &mut self.grain_b_max),
            ("veg_a_min", &mut self.veg_a_min),
            ("veg_b_min", &mut self.veg_b_min),
            ("meat_min", &mut self.meat_min),
            ("meat_max", &mut self.meat_max),
            ("protein_min_percent", &mut self.protein_min_percent),
            ("fat_min_percent", &mut self.fat_min_percent),
            ("fat_max_percent", &mut self.fat_max_percent),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let constraints = DietConstraints::default();
        assert_eq!(constraints.fixed_total_dm, 1000.0);
        assert_eq!(constraints.organ_dm_target, 150.0);
        assert_eq!(constraints.meat_max, 350.0);
        assert_eq!(constraints.fat_min_percent, 12.0);
        assert!(constraints.validate().is_ok());
    }

    #[test]
    fn test_overrides_are_independent() {
        let vars: HashMap<&str, &str> =
            [("DIET_MEAT_MAX", "300"), ("DIET_FAT_MAX_PERCENT", " 18.5 ")].into_iter().collect();
        let constraints = DietConstraints::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(constraints.meat_max, 300.0);
        assert_eq!(constraints.fat_max_percent, 18.5);
        assert_eq!(constraints.meat_min, MEAT_MIN);
        assert_eq!(constraints.fixed_total_dm, FIXED_TOTAL_DM);
    }

    #[test]
    fn test_override_not_a_number() {
        let result = DietConstraints::default()
            .with_overrides(|key| (key == "DIET_VEG_A_MIN").then(|| "lots".to_string()));
        assert!(matches!(result, Err(DietError::InvalidConstraints(msg)) if msg.contains("DIET_VEG_A_MIN")));
    }

    #[test]
    fn test_partial_json() {
        let constraints = DietConstraints::from_json_str(r#"{"organ_dm_target": 120}"#).unwrap();
        assert_eq!(constraints.organ_dm_target, 120.0);
        assert_eq!(constraints.oil_dm_reserved, OIL_DM_RESERVED);
    }

    #[test]
    fn test_validate_rejects_inverted_fat_band() {
        let constraints = DietConstraints {
            fat_min_percent: 20.0,
            ..Default::default()
        };
        assert!(constraints.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let constraints = DietConstraints {
            fruit_dm_limit: -1.0,
            ..Default::default()
        };
        assert!(matches!(constraints.validate(), Err(DietError::InvalidConstraints(msg)) if msg.contains("fruit_dm_limit")));
    }
}
