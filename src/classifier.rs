//! # Ingredient Classifier
//!
//! Partitions the selected ingredients into the categories the allocation
//! pipeline works on. Group tags are compared case-insensitively; organ, fruit
//! and oil use substring matching, every lettered group uses exact matching.
//! A record may land in more than one category (e.g. "fruit oil" is both fruit
//! and oil); the pipeline's used-name set keeps it from being allocated twice.

use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::group_patterns::{self, normalize_group};
use crate::nutrient_model::IngredientRecord;

/// Allocation category an ingredient can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OrganMeat,
    VegetableA,
    VegetableB,
    VegetableC,
    Fruit,
    Oil,
    GrainA,
    GrainB,
    MeatGroupA,
    MeatGroupB,
    MeatGroupC,
}

impl Category {
    /// Every category, in pipeline order
    pub const ALL: [Category; 11] = [
        Category::OrganMeat,
        Category::VegetableA,
        Category::VegetableB,
        Category::VegetableC,
        Category::Fruit,
        Category::Oil,
        Category::GrainA,
        Category::GrainB,
        Category::MeatGroupA,
        Category::MeatGroupB,
        Category::MeatGroupC,
    ];

    /// The three meat groups
    pub const MEAT_GROUPS: [Category; 3] =
        [Category::MeatGroupA, Category::MeatGroupB, Category::MeatGroupC];

    /// Stable key used in logs and output
    pub fn key(&self) -> &'static str {
        match self {
            Category::OrganMeat => "organ_meat",
            Category::VegetableA => "vegetable_a",
            Category::VegetableB => "vegetable_b",
            Category::VegetableC => "vegetable_c",
            Category::Fruit => "fruit",
            Category::Oil => "oil",
            Category::GrainA => "grain_a",
            Category::GrainB => "grain_b",
            Category::MeatGroupA => "meat_group_a",
            Category::MeatGroupB => "meat_group_b",
            Category::MeatGroupC => "meat_group_c",
        }
    }

    /// Check whether a normalized group tag belongs to this category
    pub fn matches(&self, group: &str) -> bool {
        match self {
            Category::OrganMeat => group.contains(group_patterns::ORGAN_MARKER),
            Category::Fruit => group.contains(group_patterns::FRUIT_MARKER),
            Category::Oil => group.contains(group_patterns::OIL_MARKER),
            Category::VegetableA => group == group_patterns::VEGETABLE_A,
            Category::VegetableB => group == group_patterns::VEGETABLE_B,
            Category::VegetableC => group == group_patterns::VEGETABLE_C,
            Category::GrainA => group == group_patterns::GRAIN_A,
            Category::GrainB => group == group_patterns::GRAIN_B,
            Category::MeatGroupA => group == group_patterns::MEAT_GROUP_A,
            Category::MeatGroupB => group == group_patterns::MEAT_GROUP_B,
            Category::MeatGroupC => group == group_patterns::MEAT_GROUP_C,
        }
    }

    /// Check whether this category is one of the lettered meat groups
    pub fn is_meat_group(&self) -> bool {
        Self::MEAT_GROUPS.contains(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The selected ingredients, de-duplicated and partitioned by category
#[derive(Debug, Clone, Default)]
pub struct ClassifiedIngredients {
    selected: Vec<IngredientRecord>,
    categories: BTreeMap<Category, Vec<IngredientRecord>>,
}

impl ClassifiedIngredients {
    /// Classify `records` in order.
    ///
    /// Duplicate names are dropped (first occurrence wins) and group tags are
    /// normalized on the stored copies.
    pub fn classify(records: &[IngredientRecord]) -> Self {
        let mut seen = HashSet::new();
        let mut classified = Self::default();

        for record in records {
            if !seen.insert(record.name.as_str()) {
                debug!("Dropping duplicate selection: {}", record.name);
                continue;
            }
            let mut record = record.clone();
            record.group = normalize_group(&record.group);

            for category in Category::ALL {
                if category.matches(&record.group) {
                    classified
                        .categories
                        .entry(category)
                        .or_default()
                        .push(record.clone());
                }
            }
            classified.selected.push(record);
        }

        debug!(
            "Classified {} selected ingredients into {} categories",
            classified.selected.len(),
            classified.categories.len()
        );
        classified
    }

    /// All selected records in selection order
    pub fn selected(&self) -> &[IngredientRecord] {
        &self.selected
    }

    /// Records of one category in selection order
    pub fn get(&self, category: Category) -> &[IngredientRecord] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check whether a category has at least one candidate
    pub fn has(&self, category: Category) -> bool {
        !self.get(category).is_empty()
    }

    /// The primary liver: the first organ candidate whose name mentions liver
    pub fn liver(&self) -> Option<&IngredientRecord> {
        self.get(Category::OrganMeat).iter().find(|r| is_liver(r))
    }

    /// Organ candidates that are not livers
    pub fn other_organs(&self) -> Vec<&IngredientRecord> {
        self.get(Category::OrganMeat)
            .iter()
            .filter(|r| !is_liver(r))
            .collect()
    }

    /// Check whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

fn is_liver(record: &IngredientRecord) -> bool {
    record
        .name
        .to_lowercase()
        .contains(group_patterns::LIVER_MARKER)
}
