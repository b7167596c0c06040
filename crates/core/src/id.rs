// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for stages, units and executions

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Position of a stage within its owning workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(pub usize);

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a unit within its owning stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub usize);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a remote execution, assigned by the executor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub String);

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        ExecutionId(s)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        ExecutionId(s.to_string())
    }
}

/// Reference to the upstream work a unit is chained from.
///
/// Rendered as `stage:unit` for a single upstream unit or `stage:ALL`
/// for every unit of an upstream stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainRef {
    /// A single upstream unit
    Unit(StageId, UnitId),
    /// Every unit of an upstream stage
    All(StageId),
}

impl ChainRef {
    /// The upstream stage this reference points at
    pub fn stage(&self) -> StageId {
        match self {
            ChainRef::Unit(stage, _) => *stage,
            ChainRef::All(stage) => *stage,
        }
    }

    /// Whether this reference covers the given upstream unit
    pub fn covers(&self, stage: StageId, unit: UnitId) -> bool {
        match self {
            ChainRef::Unit(s, u) => *s == stage && *u == unit,
            ChainRef::All(s) => *s == stage,
        }
    }
}

impl std::fmt::Display for ChainRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainRef::Unit(stage, unit) => write!(f, "{}:{}", stage, unit),
            ChainRef::All(stage) => write!(f, "{}:ALL", stage),
        }
    }
}

/// Error parsing a chain reference
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid chain reference '{0}', expected 'stage:unit' or 'stage:ALL'")]
pub struct ParseChainRefError(pub String);

impl FromStr for ChainRef {
    type Err = ParseChainRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseChainRefError(s.to_string());
        let (stage, unit) = s.split_once(':').ok_or_else(bad)?;
        let stage = StageId(stage.parse().map_err(|_| bad())?);
        if unit == "ALL" {
            Ok(ChainRef::All(stage))
        } else {
            Ok(ChainRef::Unit(stage, UnitId(unit.parse().map_err(|_| bad())?)))
        }
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
