// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input data handling
//!
//! A dataset is a named, ordered set of input items (file names, query
//! results). Reconciliation uses set difference to find newly arrived
//! input that no existing unit covers yet.

use crate::id::StageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named set of input items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    items: BTreeSet<String>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: BTreeSet::new(),
        }
    }

    pub fn from_items<I, S>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Add an item; false if it was already present
    pub fn add(&mut self, item: impl Into<String>) -> bool {
        self.items.insert(item.into())
    }

    pub fn extend<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
    }

    /// Items in sorted order
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items not yet covered by `assigned`, in sorted order
    pub fn difference(&self, assigned: &BTreeSet<String>) -> Vec<String> {
        self.items.difference(assigned).cloned().collect()
    }
}

/// A stage input: concrete data to partition, or a chain from an
/// upstream stage's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageInput {
    Data(DataSet),
    Chain(ChainInput),
}

/// Data-level chaining from an upstream stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInput {
    pub source_stage: StageId,
    /// One downstream unit fed by the whole upstream stage, instead of
    /// one per upstream unit
    pub single_unit: bool,
    /// Chain from the parents' copied output rather than primary output
    pub use_copy_output: bool,
    /// Wildcard masks applied to parent output artifacts
    pub include_mask: Vec<String>,
    pub exclude_mask: Vec<String>,
}

impl ChainInput {
    /// Per-unit chaining from the given stage
    pub fn new(source_stage: StageId) -> Self {
        Self {
            source_stage,
            single_unit: false,
            use_copy_output: false,
            include_mask: Vec::new(),
            exclude_mask: Vec::new(),
        }
    }

    /// Aggregate chaining: one downstream unit for the whole stage
    pub fn single(source_stage: StageId) -> Self {
        Self {
            single_unit: true,
            ..Self::new(source_stage)
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_mask.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_mask.push(pattern.into());
        self
    }

    pub fn from_copy_output(mut self) -> Self {
        self.use_copy_output = true;
        self
    }
}

#[cfg(test)]
#[path = "dataset_tests.rs"]
mod tests;
