// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the orchestration loop

use crate::id::{ExecutionId, StageId, UnitId};
use serde::{Deserialize, Serialize};

/// Observable orchestration outcomes, collected per tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A unit was created during reconciliation
    UnitCreated { stage: StageId, unit: UnitId },

    /// A recreated unit was rebuilt in place
    UnitRecreated { stage: StageId, unit: UnitId },

    /// A fresh execution was submitted
    UnitSubmitted {
        stage: StageId,
        unit: UnitId,
        execution: ExecutionId,
    },

    /// A failed execution was resubmitted
    UnitResubmitted {
        stage: StageId,
        unit: UnitId,
        execution: ExecutionId,
        major: bool,
    },

    /// A unit finished successfully
    UnitCompleted { stage: StageId, unit: UnitId },

    /// Retry budget exhausted
    UnitMarkedBad {
        stage: StageId,
        unit: UnitId,
        attempts: u32,
    },

    /// Taken out of the game after an unrecoverable submission error
    UnitDeactivated {
        stage: StageId,
        unit: UnitId,
        reason: String,
    },

    /// Every unit of the stage completed
    StageCompleted { stage: StageId },

    /// Every stage of the workflow completed
    WorkflowCompleted,

    /// A submission stopped the tick early (backpressure)
    LoopAborted { stage: StageId },
}
