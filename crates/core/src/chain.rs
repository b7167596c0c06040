// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-stage dependency graph
//!
//! Chain references form a directed graph keyed by (stage, unit).
//! Cascading reset walks it breadth-first with a visited set, so
//! cyclic-adjacent references terminate instead of recursing forever.

use crate::id::{ChainRef, StageId, UnitId};
use crate::stage::Stage;
use std::collections::{BTreeSet, VecDeque};

/// Directed chain-dependency graph over a workflow's units
#[derive(Debug, Clone, Default)]
pub struct ChainGraph {
    /// (dependent unit, the chain references it carries)
    nodes: Vec<((StageId, UnitId), Vec<ChainRef>)>,
}

impl ChainGraph {
    pub fn from_stages(stages: &[Stage]) -> Self {
        let mut nodes = Vec::new();
        for (si, stage) in stages.iter().enumerate() {
            for (ui, unit) in stage.units().iter().enumerate() {
                if !unit.chain_refs.is_empty() {
                    nodes.push(((StageId(si), UnitId(ui)), unit.chain_refs.clone()));
                }
            }
        }
        Self { nodes }
    }

    /// Units directly chained from the given unit
    fn direct_dependents(&self, of: (StageId, UnitId)) -> Vec<(StageId, UnitId)> {
        self.nodes
            .iter()
            .filter(|(_, refs)| refs.iter().any(|r| r.covers(of.0, of.1)))
            .map(|(node, _)| *node)
            .collect()
    }

    /// Transitive dependents of the given unit, in discovery order.
    /// The unit itself is not included.
    pub fn dependents(&self, of: (StageId, UnitId)) -> Vec<(StageId, UnitId)> {
        let mut seen: BTreeSet<(StageId, UnitId)> = BTreeSet::new();
        seen.insert(of);
        let mut queue = VecDeque::from([of]);
        let mut found = Vec::new();

        while let Some(node) = queue.pop_front() {
            for dep in self.direct_dependents(node) {
                if seen.insert(dep) {
                    found.push(dep);
                    queue.push_back(dep);
                }
            }
        }
        found
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
