// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphaned-resource cleanup and cancellation
//!
//! Superseded executions (resubmitted, reset) hold remote resources
//! until someone sweeps them. Cleanup is advisory: a failure is logged
//! and the sweep moves on, it never blocks orchestration.

use crate::driver::Driver;
use crate::DriveError;
use gw_adapters::{Executor, Partitioner, PostProcessor};
use gw_core::{Clock, ExecutionId, StageId, UnitId, Workflow};

impl<E, P, PP, C> Driver<E, P, PP, C>
where
    E: Executor,
    P: Partitioner,
    PP: PostProcessor,
    C: Clock,
{
    /// Cancel and forget executions superseded by resubmission or
    /// reset. Returns how many were cleaned up.
    pub async fn remove_superseded(&self, workflow: &mut Workflow) -> usize {
        let mut purged = 0;

        for si in 0..workflow.len() {
            let sid = StageId(si);
            let unit_count = workflow
                .stage(sid)
                .map(|s| s.units().len())
                .unwrap_or(0);

            for ui in 0..unit_count {
                let uid = UnitId(ui);
                let superseded: Vec<ExecutionId> = workflow
                    .stage(sid)
                    .and_then(|s| s.unit(uid))
                    .map(|u| u.prev_executions().to_vec())
                    .unwrap_or_default();

                for execution in superseded {
                    match self.executor.cancel(&execution).await {
                        Ok(_) => {
                            if let Some(unit) =
                                workflow.stage_mut(sid).and_then(|s| s.unit_mut(uid))
                            {
                                unit.forget_execution(&execution);
                            }
                            purged += 1;
                        }
                        Err(err) => {
                            tracing::warn!(
                                stage = %sid,
                                unit = %uid,
                                execution = %execution,
                                error = %err,
                                "could not clean up superseded execution"
                            );
                        }
                    }
                }
            }
        }
        purged
    }

    /// Cancel a unit's live execution. The cancellation surfaces as a
    /// failed execution on the next poll and feeds resubmission
    /// accounting; it is never treated as success.
    pub async fn cancel_unit(
        &self,
        workflow: &Workflow,
        sid: StageId,
        uid: UnitId,
    ) -> Result<bool, DriveError> {
        let executions: Vec<ExecutionId> = workflow
            .stage(sid)
            .ok_or(DriveError::UnknownStage(sid))?
            .unit(uid)
            .ok_or(DriveError::UnknownUnit { stage: sid, unit: uid })?
            .active_executions()
            .to_vec();

        let mut any = false;
        for execution in executions {
            if self.executor.cancel(&execution).await? {
                tracing::info!(stage = %sid, unit = %uid, execution = %execution, "cancelled");
                any = true;
            }
        }
        Ok(any)
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
