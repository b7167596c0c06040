// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit state machine
//!
//! A unit is the smallest orchestrated entity: one slice of work, its
//! live execution, its execution history, and its resubmission counters.
//! The predicates here are pure; the engine acts on them each tick.

use crate::clock::UnixTime;
use crate::error::ConfigError;
use crate::id::{ChainRef, ExecutionId, UnitId};
use crate::status::UnitStatus;
use crate::submission::{ExecutionReport, ExecutionSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The smallest orchestrated entity of a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    id: Option<UnitId>,
    pub name: String,
    status: UnitStatus,
    /// Whether this unit still takes part in future ticks
    pub active: bool,
    /// The work this unit submits
    pub spec: ExecutionSpec,
    /// Live execution handles (0 or 1; a list for bulk-group submission)
    active_executions: Vec<ExecutionId>,
    /// Superseded executions, kept for audit and orphan cleanup
    prev_executions: Vec<ExecutionId>,
    pub minor_resub_count: u32,
    pub major_resub_count: u32,
    /// Upstream work this unit is chained from
    pub chain_refs: Vec<ChainRef>,
    /// Earliest submission time; 0 means not yet stamped
    pub start_time: UnixTime,
    /// Last status report observed for the live execution
    last_report: Option<ExecutionReport>,
    /// Output artifacts recorded on completion
    pub outputs: Vec<String>,
}

impl Unit {
    pub fn new(name: impl Into<String>, spec: ExecutionSpec) -> Self {
        Self {
            id: None,
            name: name.into(),
            status: UnitStatus::Hold,
            active: true,
            spec,
            active_executions: Vec::new(),
            prev_executions: Vec::new(),
            minor_resub_count: 0,
            major_resub_count: 0,
            chain_refs: Vec::new(),
            start_time: 0,
            last_report: None,
            outputs: Vec::new(),
        }
    }

    pub fn with_chain_ref(mut self, chain_ref: ChainRef) -> Self {
        self.chain_refs.push(chain_ref);
        self
    }

    pub(crate) fn attach(&mut self, id: UnitId) {
        self.id = Some(id);
    }

    /// Position within the owning stage; errors while unattached
    pub fn id(&self) -> Result<UnitId, ConfigError> {
        self.id.ok_or(ConfigError::UnattachedUnit)
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn update_status(&mut self, status: UnitStatus) {
        if self.status != status {
            tracing::debug!(
                unit = %self.name,
                from = self.status.name(),
                to = status.name(),
                "unit status change"
            );
            self.status = status;
        }
    }

    pub fn active_executions(&self) -> &[ExecutionId] {
        &self.active_executions
    }

    pub fn prev_executions(&self) -> &[ExecutionId] {
        &self.prev_executions
    }

    pub fn has_live_execution(&self) -> bool {
        !self.active_executions.is_empty()
    }

    pub fn last_report(&self) -> Option<&ExecutionReport> {
        self.last_report.as_ref()
    }

    /// Should this unit submit a fresh execution this tick?
    ///
    /// Pure; chain-parent gating and the workflow submission budget are
    /// the caller's concern.
    pub fn check_for_submission(&self, now: UnixTime) -> bool {
        self.active
            && matches!(self.status, UnitStatus::Hold)
            && !self.has_live_execution()
            && now >= self.start_time
    }

    /// Should the live execution be resubmitted this tick?
    ///
    /// Pure: judged from the last observed report, not a fresh poll.
    pub fn check_for_resubmission(&self) -> bool {
        self.active
            && self.has_live_execution()
            && self
                .last_report
                .as_ref()
                .map(|r| r.state.is_failure())
                .unwrap_or(false)
    }

    /// Remember the latest poll result
    pub fn observe(&mut self, report: ExecutionReport) {
        self.last_report = Some(report);
    }

    /// Record a fresh submission
    pub fn record_submission(&mut self, execution: ExecutionId) {
        self.active_executions.push(execution);
        self.last_report = None;
        self.update_status(UnitStatus::Submitted);
    }

    /// Replace the failed execution with its resubmission
    pub fn record_resubmission(&mut self, execution: ExecutionId, major: bool) {
        self.retire_executions();
        if major {
            self.major_resub_count += 1;
        } else {
            self.minor_resub_count += 1;
        }
        self.active_executions.push(execution);
        self.last_report = None;
        self.update_status(UnitStatus::Submitted);
    }

    /// Move live executions to history
    pub fn retire_executions(&mut self) {
        self.prev_executions.append(&mut self.active_executions);
    }

    /// Drop a superseded execution once its remote resources are gone
    pub fn forget_execution(&mut self, execution: &ExecutionId) {
        self.prev_executions.retain(|e| e != execution);
    }

    /// Mark complete, recording output artifacts
    pub fn complete(&mut self, outputs: Vec<String>) {
        self.outputs = outputs;
        self.retire_executions();
        self.last_report = None;
        self.update_status(UnitStatus::Completed);
    }

    /// Retry budget exhausted: out of the game until an explicit reset
    pub fn mark_bad(&mut self) {
        self.active = false;
        self.retire_executions();
        self.last_report = None;
        self.update_status(UnitStatus::Bad);
    }

    /// Take the unit out of future ticks after an unrecoverable
    /// submission error; status is left as-is for the operator to see
    pub fn deactivate(&mut self) {
        self.active = false;
        self.retire_executions();
    }

    /// Back to the initial state. Counters clear, history stays. A
    /// chained unit goes to `Recreating` so reconciliation rebuilds its
    /// content from the current upstream output.
    pub fn reset(&mut self) {
        self.minor_resub_count = 0;
        self.major_resub_count = 0;
        self.retire_executions();
        self.last_report = None;
        self.outputs.clear();
        self.active = true;
        if self.chain_refs.is_empty() {
            self.update_status(UnitStatus::Hold);
        } else {
            self.update_status(UnitStatus::Recreating);
        }
    }

    /// Carry the predecessor's execution history across a rebuild
    pub fn inherit_history(&mut self, prev: &Unit) {
        self.prev_executions
            .extend_from_slice(prev.prev_executions());
        self.prev_executions
            .extend_from_slice(prev.active_executions());
    }

    /// Where this unit's output is copied under the given root
    pub fn copy_dest(&self, root: &Path) -> PathBuf {
        let safe = self
            .name
            .replace(':', "_")
            .replace(' ', "")
            .replace(',', "_");
        root.join(safe)
    }

    /// Live executions still moving through the backend
    pub fn n_active(&self) -> usize {
        if matches!(self.status, UnitStatus::Submitted | UnitStatus::Running) {
            self.active_executions.len()
        } else {
            0
        }
    }

    /// All executions ever attached to this unit
    pub fn n_all(&self) -> usize {
        self.active_executions.len() + self.prev_executions.len()
    }
}

#[cfg(test)]
#[path = "unit_tests.rs"]
mod tests;
