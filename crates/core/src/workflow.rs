// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow state
//!
//! A workflow owns an ordered list of stages; its status is derived from
//! theirs. The engine drives it tick by tick; this module holds the
//! structure, rollup, the submission budget and cascading reset.

use crate::chain::ChainGraph;
use crate::error::{ConfigError, StructuralError};
use crate::id::{StageId, UnitId};
use crate::stage::Stage;
use crate::status::{rollup_stages, StageStatus, UnitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level unit of orchestration owning ordered stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    stages: Vec<Stage>,
    status: StageStatus,
    /// Maximum simultaneously active executions; 0 submits nothing
    pub concurrency: usize,
    /// Keep ticking the remaining stages after one reports a submission
    pub check_all_stages: bool,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            status: StageStatus::New,
            concurrency: 0,
            check_all_stages: false,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.0)
    }

    pub fn stage_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        self.stages.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append a stage; only allowed while the workflow is new
    pub fn append_stage(&mut self, mut stage: Stage) -> Result<StageId, StructuralError> {
        if self.status != StageStatus::New {
            return Err(StructuralError::WorkflowReadOnly(self.name.clone()));
        }
        let id = StageId(self.stages.len());
        stage.attach(id);
        self.stages.push(stage);
        Ok(id)
    }

    /// Validate every new stage; they start running on success
    pub fn check(&mut self) -> Result<(), ConfigError> {
        let mut result = Ok(());
        for stage in &mut self.stages {
            if stage.status() == StageStatus::New {
                if let Err(err) = stage.run(true) {
                    result = Err(err);
                    break;
                }
            }
        }
        self.update_status();
        result
    }

    /// Confirm configuration and start processing
    pub fn run(&mut self) -> Result<(), ConfigError> {
        if self.status == StageStatus::New {
            self.check()?;
        }
        if self.status == StageStatus::Completed {
            tracing::info!(workflow = %self.name, "workflow is already completed");
            return Ok(());
        }
        if self.concurrency == 0 {
            tracing::warn!(
                workflow = %self.name,
                "concurrency is zero, nothing will be submitted"
            );
        }
        for stage in &mut self.stages {
            if stage.status() != StageStatus::Completed {
                stage.run(false)?;
            }
        }
        self.update_status();
        Ok(())
    }

    /// Pause every stage; the driver stops making progress
    pub fn pause(&mut self) {
        if self.status == StageStatus::Completed {
            tracing::info!(workflow = %self.name, "workflow is already completed");
            return;
        }
        for stage in &mut self.stages {
            stage.pause();
        }
        self.update_status();
    }

    /// Recompute the derived status from the stage statuses
    pub fn update_status(&mut self) -> StageStatus {
        let statuses: Vec<StageStatus> = self.stages.iter().map(|s| s.status()).collect();
        let next = rollup_stages(&statuses, self.status);
        if next != self.status {
            if next == StageStatus::Completed {
                tracing::info!(workflow = %self.name, "workflow completed");
            }
            self.status = next;
        }
        self.status
    }

    // Submission budget

    pub fn n_active(&self) -> usize {
        self.stages.iter().map(|s| s.n_active()).sum()
    }

    pub fn n_all(&self) -> usize {
        self.stages.iter().map(|s| s.n_all()).sum()
    }

    pub fn n_status(&self, status: UnitStatus) -> usize {
        self.stages.iter().map(|s| s.n_status(status)).sum()
    }

    /// How many fresh submissions the budget allows right now
    pub fn n_tosub(&self) -> usize {
        self.concurrency.saturating_sub(self.n_active())
    }

    /// Reset a unit and, transitively, every unit chained from it.
    /// Affected stages transition back to running. Returns the units
    /// actually reset, root first.
    pub fn reset_unit(&mut self, stage: StageId, unit: UnitId) -> Vec<(StageId, UnitId)> {
        let graph = ChainGraph::from_stages(&self.stages);
        let mut targets = vec![(stage, unit)];
        targets.extend(graph.dependents((stage, unit)));

        let mut reset = Vec::new();
        for (sid, uid) in targets {
            if let Some(st) = self.stages.get_mut(sid.0) {
                if let Some(u) = st.unit_mut(uid) {
                    tracing::info!(stage = %sid, unit = %uid, "resetting unit");
                    u.reset();
                    st.update_status(StageStatus::Running);
                    reset.push((sid, uid));
                }
            }
        }
        self.update_status();
        reset
    }

    /// Bulk reset by status filter, primarily to recover bad units
    pub fn reset_units_by_status(&mut self, status: UnitStatus) -> Vec<(StageId, UnitId)> {
        let matching: Vec<(StageId, UnitId)> = self
            .stages
            .iter()
            .enumerate()
            .flat_map(|(si, stage)| {
                stage
                    .units()
                    .iter()
                    .enumerate()
                    .filter(|(_, u)| u.status() == status)
                    .map(move |(ui, _)| (StageId(si), UnitId(ui)))
            })
            .collect();

        let mut reset = Vec::new();
        for (sid, uid) in matching {
            // a cascade from an earlier root may already have reset this one
            let still_matches = self
                .stage(sid)
                .and_then(|s| s.unit(uid))
                .map(|u| u.status() == status)
                .unwrap_or(false);
            if still_matches {
                reset.extend(self.reset_unit(sid, uid));
            }
        }
        reset
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
