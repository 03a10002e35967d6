//! Percentage-bounded allocation ledger.
//!
//! A session sets a total once, then adds named categories until the
//! assigned percentages sum to exactly 100. The sum can never exceed 100:
//! any call that would cross the line is rejected without mutating state.
//! Completion yields a serializable record exactly once, so the file write
//! for the budget worker cannot re-trigger.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::channel::{self, PathPair};
use crate::error::{FeedError, LedgerError};

/// Reserved by the serialized record's first field; never a category name.
const TOTAL_KEY: &str = "total";

#[derive(Debug, Default)]
pub struct AllocationLedger {
    total: Option<u64>,
    categories: Vec<(String, u8)>,
    completion_taken: bool,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the session total. Rejects non-positive values, and rejects a
    /// second call rather than silently overwriting.
    pub fn set_total(&mut self, total: i64) -> Result<(), LedgerError> {
        if total <= 0 {
            return Err(LedgerError::InvalidInput(
                "Please enter a positive number.".to_string(),
            ));
        }
        if self.total.is_some() {
            return Err(LedgerError::InvalidInput(
                "total is already set for this session".to_string(),
            ));
        }
        self.total = Some(total as u64);
        Ok(())
    }

    /// Adds a category and returns the new remaining percentage.
    pub fn add_category(&mut self, name: &str, pct: i64) -> Result<u8, LedgerError> {
        if self.total.is_none() {
            return Err(LedgerError::InvalidInput(
                "set a total before adding categories".to_string(),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput(
                "category name cannot be empty".to_string(),
            ));
        }
        if self.contains(name) {
            return Err(LedgerError::DuplicateCategory(name.to_string()));
        }
        let remaining = self.remaining();
        if pct <= 0 || pct > i64::from(remaining) {
            return Err(LedgerError::OutOfRange { pct, remaining });
        }
        self.categories.push((name.to_string(), pct as u8));
        Ok(self.remaining())
    }

    /// `100 - sum(accepted percentages)`.
    pub fn remaining(&self) -> u8 {
        let assigned: u32 = self.categories.iter().map(|(_, pct)| u32::from(*pct)).sum();
        // add_category keeps the sum within 100.
        (100 - assigned) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0 && self.total.is_some()
    }

    /// `total` is reserved, so duplicate keys in the serialized record are
    /// impossible by construction.
    pub fn contains(&self, name: &str) -> bool {
        name == TOTAL_KEY || self.categories.iter().any(|(existing, _)| existing == name)
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn categories(&self) -> &[(String, u8)] {
        &self.categories
    }

    /// Returns the serializable record on the transition to complete, and
    /// `None` on every later call. Callers hand the record to
    /// [`write_budget_input`].
    pub fn take_completion(&mut self) -> Option<BudgetRecord> {
        if !self.is_complete() || self.completion_taken {
            return None;
        }
        self.completion_taken = true;
        Some(BudgetRecord {
            total: self.total.unwrap_or(0),
            categories: self.categories.clone(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The record the budget worker consumes: `total` first, then one field per
/// category, percentage shares, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRecord {
    pub total: u64,
    pub categories: Vec<(String, u8)>,
}

impl Serialize for BudgetRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1 + self.categories.len()))?;
        map.serialize_entry(TOTAL_KEY, &self.total)?;
        for (name, pct) in &self.categories {
            map.serialize_entry(name, pct)?;
        }
        map.end()
    }
}

/// Serializes the completed ledger to the budget worker's input path,
/// clearing any stale output first. A failed write leaves ledger state (and
/// the filesystem target) untouched.
pub fn write_budget_input(pair: &PathPair, record: &BudgetRecord) -> Result<(), FeedError> {
    channel::submit(pair, record)
}
