//! # Group Patterns Module
//!
//! This module contains the regex and tag constants used to classify ingredient groups.

use lazy_static::lazy_static;
use regex::Regex;

// Exact group tags, compared after normalization
pub const VEGETABLE_A: &str = "vegetable a";
pub const VEGETABLE_B: &str = "vegetable b";
pub const VEGETABLE_C: &str = "vegetable c";
pub const GRAIN_A: &str = "grain a";
pub const GRAIN_B: &str = "grain b";
pub const MEAT_GROUP_A: &str = "meat group a";
pub const MEAT_GROUP_B: &str = "meat group b";
pub const MEAT_GROUP_C: &str = "meat group c";

// Substring markers
pub const ORGAN_MARKER: &str = "organ";
pub const LIVER_MARKER: &str = "liver";
pub const FRUIT_MARKER: &str = "fruit";
pub const OIL_MARKER: &str = "oil";

lazy_static! {
    static ref WHITESPACE_RUN: Regex =
        Regex::new(r"\s+").expect("Whitespace pattern should be valid");
}

/// Normalize a group tag: trim, lowercase, and collapse internal whitespace runs
///
/// # Examples
///
/// ```rust
/// use dog_diet::group_patterns::normalize_group;
///
/// assert_eq!(normalize_group("  Meat   Group B "), "meat group b");
/// ```
pub fn normalize_group(group: &str) -> String {
    WHITESPACE_RUN
        .replace_all(group.trim(), " ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_group() {
        assert_eq!(normalize_group("Vegetable A"), VEGETABLE_A);
        assert_eq!(normalize_group("\tGRAIN\n b"), GRAIN_B);
        assert_eq!(normalize_group("organ meat"), "organ meat");
        assert_eq!(normalize_group(""), "");
    }
}
