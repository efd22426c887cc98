//! # Engine State
//!
//! Per-calculation mutable state: running nutrient totals, the allocation
//! ledger, the used-name set, the remaining dry-matter budget and the messages
//! collected along the way. A fresh `EngineState` is built for every
//! calculation and consumed by the reporter; nothing here outlives one request.

use std::collections::HashSet;
use tracing::trace;

use crate::nutrient_model::{floor2, round2, AllocationEntry, FixedIngredientRecord, IngredientRecord, NutrientTotals};

/// Mutable accumulator threaded through every allocation stage
#[derive(Debug, Clone)]
pub struct EngineState {
    target_total: f64,
    totals: NutrientTotals,
    entries: Vec<AllocationEntry>,
    used: HashSet<String>,
    remaining_dm: f64,
    issues: Vec<String>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

impl EngineState {
    /// Create an empty state whose budget is the full target
    pub fn new(target_total: f64) -> Self {
        Self {
            target_total,
            totals: NutrientTotals::default(),
            entries: Vec::new(),
            used: HashSet::new(),
            remaining_dm: target_total,
            issues: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Record a fixed ingredient: it consumes budget up front and is marked used
    pub fn add_fixed(&mut self, record: &FixedIngredientRecord) {
        self.totals.add(&record.profile, record.dm_g);
        self.entries.push(AllocationEntry::from_fixed(record));
        self.used.insert(record.name.clone());
        self.remaining_dm -= record.dm_g;
    }

    /// Split `target_dm` evenly across the candidates that are not used yet.
    ///
    /// Every candidate but the last gets `target / count` rounded down to two
    /// decimals; the last takes whatever keeps the sum at `target_dm`, so no share
    /// is ever negative. Returns the dry
    /// matter consumed, or 0 without touching the state when there is nothing to
    /// allocate. The remaining budget is left to the caller.
    pub fn distribute_exact(&mut self, candidates: &[&IngredientRecord], target_dm: f64) -> f64 {
        if candidates.is_empty() || target_dm <= 0.0 {
            return 0.0;
        }

        let mut filtered: Vec<&IngredientRecord> = Vec::with_capacity(candidates.len());
        for &record in candidates {
            if !self.used.contains(&record.name) && !filtered.iter().any(|r| r.name == record.name) {
                filtered.push(record);
            }
        }
        if filtered.is_empty() {
            return 0.0;
        }

        let count = filtered.len();
        let each = floor2(target_dm / count as f64);
        let mut actual_used = 0.0;

        for (i, record) in filtered.into_iter().enumerate() {
            let dm = if i + 1 < count {
                each
            } else {
                round2(target_dm - each * (count - 1) as f64).max(0.0)
            };
            trace!(ingredient = %record.name, dm_g = dm, "Allocating dry matter");

            self.totals.add(&record.profile, dm);
            self.entries.push(AllocationEntry::from_record(record, dm));
            self.used.insert(record.name.clone());
            actual_used += dm;
        }

        actual_used
    }

    /// Check whether an ingredient already has an entry
    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Configured total dry matter
    pub fn target_total(&self) -> f64 {
        self.target_total
    }

    /// Dry matter not yet allocated
    pub fn remaining_dm(&self) -> f64 {
        self.remaining_dm
    }

    /// Subtract consumed dry matter from the budget
    pub fn consume(&mut self, dm_g: f64) {
        self.remaining_dm -= dm_g;
    }

    /// Incrementally maintained totals
    pub fn totals(&self) -> &NutrientTotals {
        &self.totals
    }

    pub fn totals_mut(&mut self) -> &mut NutrientTotals {
        &mut self.totals
    }

    /// Replace the running totals with a recomputation from the ledger
    pub fn resync_totals(&mut self) {
        self.totals = NutrientTotals::from_entries(&self.entries);
    }

    /// Allocation ledger in insertion order
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [AllocationEntry] {
        &mut self.entries
    }

    /// Sum of dry matter over every entry
    pub fn total_dm(&self) -> f64 {
        self.entries.iter().map(|e| e.dm_g).sum()
    }

    /// Sum of dry matter over non-fixed entries
    pub fn nonfixed_dm(&self) -> f64 {
        self.entries.iter().filter(|e| !e.fixed).map(|e| e.dm_g).sum()
    }

    /// Blocking problem, reported under `issues`
    pub fn push_issue(&mut self, message: impl Into<String>) {
        self.issues.push(message.into());
    }

    /// Non-blocking problem, reported under `warnings`
    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Advisory note, reported under `suggestions`
    pub fn push_suggestion(&mut self, message: impl Into<String>) {
        self.suggestions.push(message.into());
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Hand the ledger and messages over to the reporter
    pub fn into_parts(self) -> (Vec<AllocationEntry>, Vec<String>, Vec<String>, Vec<String>) {
        (self.entries, self.issues, self.warnings, self.suggestions)
    }
}
