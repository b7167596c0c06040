// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow tick loop

use crate::DriveError;
use gw_adapters::{Executor, Partitioner, PostProcessor};
use gw_core::{ChainRef, Clock, Event, StageId, StageStatus, SystemClock, UnitId, UnitStatus, Workflow};

/// What one tick did
#[derive(Debug, Default)]
pub struct TickReport {
    /// Fresh submissions and resubmissions made this tick
    pub submissions: usize,
    /// The tick stopped early after a submission (backpressure)
    pub aborted: bool,
    pub events: Vec<Event>,
    /// Per-stage faults; other stages were still ticked
    pub stage_errors: Vec<(StageId, DriveError)>,
}

/// Drives a workflow against the configured adapters, one tick at a time
pub struct Driver<E, P, PP, C = SystemClock> {
    pub(crate) executor: E,
    pub(crate) partitioner: P,
    pub(crate) post: PP,
    pub(crate) clock: C,
}

impl<E, P, PP> Driver<E, P, PP, SystemClock>
where
    E: Executor,
    P: Partitioner,
    PP: PostProcessor,
{
    pub fn new(executor: E, partitioner: P, post: PP) -> Self {
        Self {
            executor,
            partitioner,
            post,
            clock: SystemClock,
        }
    }
}

impl<E, P, PP, C> Driver<E, P, PP, C>
where
    E: Executor,
    P: Partitioner,
    PP: PostProcessor,
    C: Clock,
{
    pub fn with_clock(executor: E, partitioner: P, post: PP, clock: C) -> Self {
        Self {
            executor,
            partitioner,
            post,
            clock,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Advance the workflow by one tick.
    ///
    /// Safe to call on a fixed interval: predicates are re-evaluated
    /// every call, so a tick cut short by backpressure resumes where it
    /// left off. A fault in one stage never stops the others.
    pub async fn tick(&self, workflow: &mut Workflow) -> TickReport {
        let mut report = TickReport::default();

        // nothing runs until the workflow is confirmed
        if workflow.status() == StageStatus::New {
            return report;
        }

        for idx in 0..workflow.len() {
            let sid = StageId(idx);
            if workflow.stage(sid).map(|s| s.status()) != Some(StageStatus::Running) {
                continue;
            }

            match self.tick_stage(workflow, sid, &mut report).await {
                Ok(submitted) => {
                    if submitted && !workflow.check_all_stages {
                        tracing::info!(stage = %sid, "submission aborted the workflow loop");
                        report.aborted = true;
                        report.events.push(Event::LoopAborted { stage: sid });
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(stage = %sid, error = %err, "stage tick failed");
                    report.stage_errors.push((sid, err));
                }
            }
        }

        let before = workflow.status();
        if workflow.update_status() == StageStatus::Completed && before != StageStatus::Completed {
            report.events.push(Event::WorkflowCompleted);
        }
        report
    }

    /// Tick a single stage. Returns true when a submission should stop
    /// the remaining stages (the abort-on-submit rate limiter).
    async fn tick_stage(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        report: &mut TickReport,
    ) -> Result<bool, DriveError> {
        // hard gate: every required stage must have completed. Waiting
        // here is expected steady state, not a fault.
        let gated = {
            let stage = workflow.stage(sid).ok_or(DriveError::UnknownStage(sid))?;
            stage.config().required_stages.iter().any(|dep| {
                workflow
                    .stage(*dep)
                    .map(|s| s.status() != StageStatus::Completed)
                    .unwrap_or(true)
            })
        };
        if gated {
            return Ok(false);
        }

        // reconcile the unit list against current input
        self.create_units(workflow, sid, report).await?;

        // stamp chain-delay hold-offs exactly once
        self.stamp_start_times(workflow, sid);

        // submissions and resubmissions first, refreshes after
        let submitted = self.update_units(workflow, sid, report).await?;

        // roll unit statuses up into the stage
        let completed = {
            let stage = workflow
                .stage_mut(sid)
                .ok_or(DriveError::UnknownStage(sid))?;
            let before = stage.status();
            stage.rollup() == StageStatus::Completed && before != StageStatus::Completed
        };
        if completed {
            report.events.push(Event::StageCompleted { stage: sid });
            if let Err(err) = self.post.on_stage_complete(sid).await {
                tracing::warn!(stage = %sid, error = %err, "stage post-processing failed");
            }
        }

        Ok(submitted)
    }

    /// Stamp submission hold-offs once their trigger fires: stage-wide
    /// when the required stages complete, per-unit when a unit's chain
    /// parents complete. Detected by `start_time == 0`.
    fn stamp_start_times(&self, workflow: &mut Workflow, sid: StageId) {
        let now = self.clock.now();

        let ready: Vec<bool> = match workflow.stage(sid) {
            Some(stage) => stage
                .units()
                .iter()
                .enumerate()
                .map(|(ui, _)| self.chain_parents_completed(workflow, sid, UnitId(ui)))
                .collect(),
            None => return,
        };

        let Some(stage) = workflow.stage_mut(sid) else {
            return;
        };
        let delay = stage.config().chain_delay;
        let start = now + delay * 60;
        let start = start.saturating_sub(1);

        if !stage.config().required_stages.is_empty()
            && delay > 0
            && stage.units().first().map(|u| u.start_time == 0).unwrap_or(false)
        {
            for unit in stage.units_mut() {
                unit.start_time = start;
            }
            return;
        }

        for (ui, unit) in stage.units_mut().iter_mut().enumerate() {
            if !unit.chain_refs.is_empty()
                && unit.start_time == 0
                && ready.get(ui).copied().unwrap_or(false)
            {
                unit.start_time = start;
            }
        }
    }

    /// Are all of a unit's chain parents completed?
    pub(crate) fn chain_parents_completed(
        &self,
        workflow: &Workflow,
        sid: StageId,
        uid: UnitId,
    ) -> bool {
        let Some(unit) = workflow.stage(sid).and_then(|s| s.unit(uid)) else {
            return false;
        };
        unit.chain_refs.iter().all(|r| match r {
            ChainRef::All(ps) => workflow
                .stage(*ps)
                .map(|s| {
                    s.units()
                        .iter()
                        .all(|u| u.status() == UnitStatus::Completed)
                })
                .unwrap_or(false),
            ChainRef::Unit(ps, pu) => workflow
                .stage(*ps)
                .and_then(|s| s.unit(*pu))
                .map(|u| u.status() == UnitStatus::Completed)
                .unwrap_or(false),
        })
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
