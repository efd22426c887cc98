//! # Diet Error Types Module
//!
//! This module defines the error types raised around the formulation engine.
//! The engine itself never fails: degenerate inputs become no-ops or messages in
//! the result. These errors cover the front door (selection, constraints, catalog).

/// Custom error types for diet formulation requests
#[derive(Debug, Clone, PartialEq)]
pub enum DietError {
    /// No selected ingredient survived catalog lookup
    EmptySelection,
    /// A constraint value is out of range
    InvalidConstraints(String),
    /// Ingredient catalog or fixed ingredient data could not be loaded
    Catalog(String),
}

impl std::fmt::Display for DietError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DietError::EmptySelection => {
                write!(f, "Empty selection: none of the requested ingredients are known")
            }
            DietError::InvalidConstraints(msg) => write!(f, "Invalid constraints: {msg}"),
            DietError::Catalog(msg) => write!(f, "Catalog error: {msg}"),
        }
    }
}

impl std::error::Error for DietError {}

impl From<anyhow::Error> for DietError {
    fn from(err: anyhow::Error) -> Self {
        DietError::Catalog(err.to_string())
    }
}
