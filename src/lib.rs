//! # Dog Diet Formulation
//!
//! Allocates a fixed total of dry matter across a selection of ingredients,
//! following category minimums and maximums, then corrects protein and fat and
//! reports the resulting nutrient profile.

pub mod adjusters;
pub mod allocation_pipeline;
pub mod catalog;
pub mod classifier;
pub mod diet_config;
pub mod diet_errors;
pub mod engine_state;
pub mod formulation;
pub mod group_patterns;
pub mod nutrient_model;
pub mod reporter;
pub mod scaling;
