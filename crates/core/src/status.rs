// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status vocabulary and rollup rules
//!
//! Execution states are what the executor reports; unit and stage
//! statuses are derived from them. A unit's visible status is always a
//! function of the last observed execution state, the resubmission
//! counters and the active flag, never set directly by callers.

use serde::{Deserialize, Serialize};

/// State of a remote execution as reported by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded | ExecutionState::Failed | ExecutionState::Cancelled
        )
    }

    /// Failure for resubmission accounting. A cancelled execution counts
    /// as a failure, never as success.
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionState::Failed | ExecutionState::Cancelled)
    }
}

/// Status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Created, not yet eligible to run
    Hold,
    /// Handed to the executor, not yet running
    Submitted,
    Running,
    Completed,
    /// Retry budget exhausted; inactive until an explicit reset
    Bad,
    /// Upstream definition changed; rebuilt on the next reconciliation
    Recreating,
}

impl UnitStatus {
    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Hold => "hold",
            UnitStatus::Submitted => "submitted",
            UnitStatus::Running => "running",
            UnitStatus::Completed => "completed",
            UnitStatus::Bad => "bad",
            UnitStatus::Recreating => "recreating",
        }
    }
}

/// Status of a stage; a workflow derives its own status from these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    New,
    Running,
    Pause,
    Completed,
    Bad,
}

impl StageStatus {
    pub fn name(&self) -> &'static str {
        match self {
            StageStatus::New => "new",
            StageStatus::Running => "running",
            StageStatus::Pause => "pause",
            StageStatus::Completed => "completed",
            StageStatus::Bad => "bad",
        }
    }
}

/// Map an observed execution state onto a unit status.
///
/// Failure states return `None`: they are routed through the
/// resubmission path instead of mutating the status directly.
pub fn unit_status_for(state: ExecutionState) -> Option<UnitStatus> {
    match state {
        ExecutionState::Pending => Some(UnitStatus::Submitted),
        ExecutionState::Running => Some(UnitStatus::Running),
        ExecutionState::Succeeded => Some(UnitStatus::Completed),
        ExecutionState::Failed | ExecutionState::Cancelled => None,
    }
}

/// Roll a stage status up from its unit statuses.
///
/// Priority scan: running (submitted counts as running), then hold
/// (reported as running), then bad, then completed. A mixed stage is
/// therefore running unless every unit completed, or at least one went
/// bad with none still moving. Note the consequence: holds are reported
/// before bads are, so `{hold, bad}` reads as running. `Recreating`
/// matches nothing and leaves the current status in place;
/// reconciliation rebuilds those units before the next rollup.
pub fn rollup_units(statuses: &[UnitStatus], current: StageStatus) -> StageStatus {
    let any = |f: fn(&UnitStatus) -> bool| statuses.iter().any(f);
    if any(|s| matches!(s, UnitStatus::Running | UnitStatus::Submitted)) {
        StageStatus::Running
    } else if any(|s| matches!(s, UnitStatus::Hold)) {
        StageStatus::Running
    } else if any(|s| matches!(s, UnitStatus::Bad)) {
        StageStatus::Bad
    } else if any(|s| matches!(s, UnitStatus::Completed)) {
        StageStatus::Completed
    } else {
        current
    }
}

/// Derive a workflow status from its stage statuses, with the same
/// priority-scan shape as the unit rollup.
pub fn rollup_stages(statuses: &[StageStatus], current: StageStatus) -> StageStatus {
    let any = |f: fn(&StageStatus) -> bool| statuses.iter().any(f);
    if any(|s| matches!(s, StageStatus::Running)) {
        StageStatus::Running
    } else if any(|s| matches!(s, StageStatus::Pause)) {
        StageStatus::Pause
    } else if any(|s| matches!(s, StageStatus::New)) {
        StageStatus::New
    } else if any(|s| matches!(s, StageStatus::Bad)) {
        StageStatus::Bad
    } else if any(|s| matches!(s, StageStatus::Completed)) {
        StageStatus::Completed
    } else {
        current
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
