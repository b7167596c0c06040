// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-unit tick handling: submission, resubmission, status refresh
//!
//! Units needing a (re)submission are processed before units needing
//! only a refresh, so `abort_loop_on_submit` can stop the tick the
//! moment work is handed to a rate-limited backend without starving the
//! submission queue.

use crate::driver::{Driver, TickReport};
use crate::DriveError;
use futures::stream::{self, StreamExt};
use gw_adapters::{Executor, Partitioner, PostProcessor};
use gw_core::{
    unit_status_for, Clock, Event, ExecutionSpec, ExecutionState, RetryAction, StageId, UnitId,
    UnitStatus, UnixTime, Workflow,
};
use std::collections::HashSet;

impl<E, P, PP, C> Driver<E, P, PP, C>
where
    E: Executor,
    P: Partitioner,
    PP: PostProcessor,
    C: Clock,
{
    /// Walk the stage's units for one tick. Returns true when a
    /// submission should stop the remaining stages.
    pub(crate) async fn update_units(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        report: &mut TickReport,
    ) -> Result<bool, DriveError> {
        let now = self.clock.now();

        let unit_count = workflow
            .stage(sid)
            .ok_or(DriveError::UnknownStage(sid))?
            .units()
            .len();

        // chain gates need a workflow-wide read before units are mutated
        let chain_ready: Vec<bool> = (0..unit_count)
            .map(|ui| self.chain_parents_completed(workflow, sid, UnitId(ui)))
            .collect();

        let (abort_on_submit, threaded) = {
            let config = workflow
                .stage(sid)
                .ok_or(DriveError::UnknownStage(sid))?
                .config();
            (config.abort_loop_on_submit, config.submit_with_threads)
        };

        let mut tosub = workflow.n_tosub();

        // submissions and resubmissions first, refreshes after
        let (due, rest): (Vec<usize>, Vec<usize>) = {
            let stage = workflow.stage(sid).ok_or(DriveError::UnknownStage(sid))?;
            (0..unit_count).partition(|&ui| {
                let unit = &stage.units()[ui];
                (chain_ready[ui] && unit.check_for_submission(now)) || unit.check_for_resubmission()
            })
        };

        let mut batch_done: HashSet<usize> = HashSet::new();
        if threaded {
            batch_done = self
                .submit_batch(workflow, sid, &due, &chain_ready, now, &mut tosub, report)
                .await?;
        }

        for ui in due.into_iter().chain(rest) {
            if batch_done.contains(&ui) {
                continue;
            }
            let submitted = self
                .update_one(workflow, sid, UnitId(ui), now, chain_ready[ui], &mut tosub, report)
                .await?;
            if submitted {
                report.submissions += 1;
                // threaded stages keep going; the pool is the limiter
                if abort_on_submit && !threaded {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Bounded-parallel submission of the units due for a fresh
    /// submission. Results are serialized back one writer at a time.
    #[allow(clippy::too_many_arguments)]
    async fn submit_batch(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        due: &[usize],
        chain_ready: &[bool],
        now: UnixTime,
        tosub: &mut usize,
        report: &mut TickReport,
    ) -> Result<HashSet<usize>, DriveError> {
        let (batch, max_threads) = {
            let stage = workflow.stage(sid).ok_or(DriveError::UnknownStage(sid))?;
            let batch: Vec<(usize, ExecutionSpec)> = due
                .iter()
                .copied()
                .filter(|&ui| {
                    chain_ready.get(ui).copied().unwrap_or(false)
                        && stage.units()[ui].check_for_submission(now)
                })
                .take(*tosub)
                .map(|ui| (ui, stage.units()[ui].spec.clone()))
                .collect();
            (batch, stage.config().max_active_threads.max(1))
        };

        if batch.is_empty() {
            return Ok(HashSet::new());
        }

        let executor = &self.executor;
        let results: Vec<(usize, Result<gw_core::ExecutionId, gw_adapters::ExecutorError>)> =
            stream::iter(batch.into_iter().map(|(ui, spec)| async move {
                (ui, executor.submit(&spec).await)
            }))
            .buffer_unordered(max_threads)
            .collect()
            .await;

        let mut done = HashSet::new();
        let stage = workflow
            .stage_mut(sid)
            .ok_or(DriveError::UnknownStage(sid))?;
        for (ui, result) in results {
            let uid = UnitId(ui);
            let Some(unit) = stage.unit_mut(uid) else {
                continue;
            };
            match result {
                Ok(execution) => {
                    tracing::info!(stage = %sid, unit = %uid, execution = %execution, "submitted");
                    unit.record_submission(execution.clone());
                    *tosub = tosub.saturating_sub(1);
                    report.submissions += 1;
                    report.events.push(Event::UnitSubmitted {
                        stage: sid,
                        unit: uid,
                        execution,
                    });
                }
                Err(err) => {
                    tracing::error!(
                        stage = %sid,
                        unit = %uid,
                        error = %err,
                        "submission failed, deactivating unit"
                    );
                    unit.deactivate();
                    report.events.push(Event::UnitDeactivated {
                        stage: sid,
                        unit: uid,
                        reason: err.to_string(),
                    });
                }
            }
            done.insert(ui);
        }
        Ok(done)
    }

    /// Tick one unit: submit if due, act on an observed failure, or
    /// refresh from the executor. Returns true on a (re)submission.
    #[allow(clippy::too_many_arguments)]
    async fn update_one(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        uid: UnitId,
        now: UnixTime,
        chain_ready: bool,
        tosub: &mut usize,
        report: &mut TickReport,
    ) -> Result<bool, DriveError> {
        let (policy, behavior, unit_copy) = {
            let stage = workflow.stage(sid).ok_or(DriveError::UnknownStage(sid))?;
            (
                stage.config().retry,
                stage.behavior(),
                stage.config().unit_copy_output.clone(),
            )
        };

        let stage = workflow
            .stage_mut(sid)
            .ok_or(DriveError::UnknownStage(sid))?;
        let unit = stage
            .unit_mut(uid)
            .ok_or(DriveError::UnknownUnit { stage: sid, unit: uid })?;

        if !unit.active || matches!(unit.status(), UnitStatus::Completed | UnitStatus::Recreating) {
            return Ok(false);
        }

        // fresh submission
        if chain_ready && unit.check_for_submission(now) {
            if *tosub == 0 {
                return Ok(false);
            }
            let spec = unit.spec.clone();
            return match self.executor.submit(&spec).await {
                Ok(execution) => {
                    tracing::info!(stage = %sid, unit = %uid, execution = %execution, "submitted");
                    unit.record_submission(execution.clone());
                    *tosub = tosub.saturating_sub(1);
                    report.events.push(Event::UnitSubmitted {
                        stage: sid,
                        unit: uid,
                        execution,
                    });
                    Ok(true)
                }
                Err(err) => {
                    tracing::error!(
                        stage = %sid,
                        unit = %uid,
                        error = %err,
                        "submission failed, deactivating unit"
                    );
                    unit.deactivate();
                    report.events.push(Event::UnitDeactivated {
                        stage: sid,
                        unit: uid,
                        reason: err.to_string(),
                    });
                    Ok(false)
                }
            };
        }

        let Some(execution) = unit.active_executions().first().cloned() else {
            return Ok(false);
        };

        // act on the cached failure, or poll for fresh state
        let observed = if unit.check_for_resubmission() {
            match unit.last_report() {
                Some(cached) => cached.clone(),
                None => return Ok(false),
            }
        } else {
            match self.executor.status(&execution).await {
                Ok(observed) => observed,
                Err(err) => {
                    tracing::warn!(
                        stage = %sid,
                        unit = %uid,
                        execution = %execution,
                        error = %err,
                        "status poll failed"
                    );
                    return Ok(false);
                }
            }
        };
        unit.observe(observed.clone());

        match observed.state {
            ExecutionState::Pending | ExecutionState::Running => {
                if let Some(status) = unit_status_for(observed.state) {
                    unit.update_status(status);
                }
                Ok(false)
            }
            ExecutionState::Succeeded => {
                // copy output home before completion when configured
                if let Some(root) = &unit_copy {
                    let dest = unit.copy_dest(root);
                    match self.executor.fetch_output(&execution, &dest).await {
                        Ok(true) => {}
                        Ok(false) => {
                            tracing::warn!(
                                stage = %sid,
                                unit = %uid,
                                "output not ready, retrying next tick"
                            );
                            return Ok(false);
                        }
                        Err(err) => {
                            tracing::warn!(
                                stage = %sid,
                                unit = %uid,
                                error = %err,
                                "output copy failed, retrying next tick"
                            );
                            return Ok(false);
                        }
                    }
                }

                let outputs = observed.outputs.clone();
                if let Err(err) = self.post.on_unit_complete(sid, uid, &outputs).await {
                    tracing::warn!(
                        stage = %sid,
                        unit = %uid,
                        error = %err,
                        "unit post-processing failed"
                    );
                }
                unit.complete(outputs);
                report.events.push(Event::UnitCompleted { stage: sid, unit: uid });
                Ok(false)
            }
            ExecutionState::Failed | ExecutionState::Cancelled => {
                let wants_major = behavior.check_major_resubmit(&observed);
                match policy.decide(unit.minor_resub_count, unit.major_resub_count, wants_major) {
                    RetryAction::GiveUp => {
                        let attempts = unit.minor_resub_count + unit.major_resub_count;
                        tracing::error!(
                            stage = %sid,
                            unit = %uid,
                            attempts,
                            "too many resubmits, marking unit bad"
                        );
                        unit.mark_bad();
                        report.events.push(Event::UnitMarkedBad {
                            stage: sid,
                            unit: uid,
                            attempts,
                        });
                        Ok(false)
                    }
                    RetryAction::Minor => {
                        let spec = unit.spec.clone();
                        match self.executor.submit(&spec).await {
                            Ok(execution) => {
                                tracing::info!(
                                    stage = %sid,
                                    unit = %uid,
                                    execution = %execution,
                                    "minor resubmit"
                                );
                                unit.record_resubmission(execution.clone(), false);
                                report.events.push(Event::UnitResubmitted {
                                    stage: sid,
                                    unit: uid,
                                    execution,
                                    major: false,
                                });
                                Ok(true)
                            }
                            Err(err) => {
                                tracing::error!(
                                    stage = %sid,
                                    unit = %uid,
                                    error = %err,
                                    "resubmission failed, deactivating unit"
                                );
                                unit.deactivate();
                                report.events.push(Event::UnitDeactivated {
                                    stage: sid,
                                    unit: uid,
                                    reason: err.to_string(),
                                });
                                Ok(false)
                            }
                        }
                    }
                    RetryAction::Major => {
                        unit.spec.rebroker();
                        behavior.on_major_resubmit(&mut unit.spec);
                        let spec = unit.spec.clone();
                        match self.executor.submit(&spec).await {
                            Ok(execution) => {
                                tracing::info!(
                                    stage = %sid,
                                    unit = %uid,
                                    execution = %execution,
                                    "major resubmit (rebroker)"
                                );
                                unit.record_resubmission(execution.clone(), true);
                                report.events.push(Event::UnitResubmitted {
                                    stage: sid,
                                    unit: uid,
                                    execution,
                                    major: true,
                                });
                                Ok(true)
                            }
                            Err(err) => {
                                tracing::error!(
                                    stage = %sid,
                                    unit = %uid,
                                    error = %err,
                                    "rebroker failed, deactivating unit"
                                );
                                unit.deactivate();
                                report.events.push(Event::UnitDeactivated {
                                    stage: sid,
                                    unit: uid,
                                    reason: err.to_string(),
                                });
                                Ok(false)
                            }
                        }
                    }
                }
            }
        }
    }
}
