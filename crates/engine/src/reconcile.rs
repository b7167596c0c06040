// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit reconciliation
//!
//! `create_units` runs every tick and must be idempotent: it never
//! duplicates a unit for input already covered, and honors the
//! `Recreating` marker instead of diffing upstream content itself.

use crate::driver::{Driver, TickReport};
use crate::DriveError;
use gw_adapters::{Executor, Partitioner, PostProcessor};
use gw_core::{
    ChainInput, ChainRef, Clock, DataSet, Event, ParentUnit, StageId, StageInput, Unit, UnitId,
    UnitStatus, Workflow,
};
use std::collections::BTreeSet;

impl<E, P, PP, C> Driver<E, P, PP, C>
where
    E: Executor,
    P: Partitioner,
    PP: PostProcessor,
    C: Clock,
{
    /// Bring the stage's unit list in line with its current input
    pub(crate) async fn create_units(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        report: &mut TickReport,
    ) -> Result<(), DriveError> {
        let inputs = workflow
            .stage(sid)
            .ok_or(DriveError::UnknownStage(sid))?
            .config()
            .inputs
            .clone();

        for input in inputs {
            match input {
                StageInput::Chain(chain) => self.create_chain_units(workflow, sid, &chain, report)?,
                StageInput::Data(data) => {
                    self.create_data_units(workflow, sid, &data, report).await?
                }
            }
        }
        Ok(())
    }

    /// Read-only snapshot of an upstream stage's units
    fn parent_views(&self, workflow: &Workflow, parent: StageId) -> Vec<ParentUnit> {
        let Some(stage) = workflow.stage(parent) else {
            return Vec::new();
        };
        let copy_root = stage.config().unit_copy_output.clone();
        stage
            .units()
            .iter()
            .enumerate()
            .map(|(ui, unit)| {
                let copy_outputs = match &copy_root {
                    Some(root) => {
                        let dest = unit.copy_dest(root);
                        unit.outputs
                            .iter()
                            .map(|o| dest.join(o).to_string_lossy().into_owned())
                            .collect()
                    }
                    None => unit.outputs.clone(),
                };
                ParentUnit {
                    stage: parent,
                    unit: UnitId(ui),
                    status: unit.status(),
                    outputs: unit.outputs.clone(),
                    copy_outputs,
                }
            })
            .collect()
    }

    /// Chain modes: one aggregate unit per upstream stage, or one unit
    /// per upstream unit. Recreated units are rebuilt, never duplicated.
    fn create_chain_units(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        chain: &ChainInput,
        report: &mut TickReport,
    ) -> Result<(), DriveError> {
        let parents = self.parent_views(workflow, chain.source_stage);

        if chain.single_unit {
            let chain_ref = ChainRef::All(chain.source_stage);
            self.build_chain_unit(workflow, sid, chain, chain_ref, &parents, report)?;
        } else {
            for pu in 0..parents.len() {
                let chain_ref = ChainRef::Unit(chain.source_stage, UnitId(pu));
                let parent = vec![parents[pu].clone()];
                self.build_chain_unit(workflow, sid, chain, chain_ref, &parent, report)?;
            }
        }
        Ok(())
    }

    fn build_chain_unit(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        chain: &ChainInput,
        chain_ref: ChainRef,
        parents: &[ParentUnit],
        report: &mut TickReport,
    ) -> Result<(), DriveError> {
        let stage = workflow
            .stage_mut(sid)
            .ok_or(DriveError::UnknownStage(sid))?;

        let existing = stage.unit_with_chain_ref(&chain_ref);
        let recreating = existing.and_then(|uid| {
            stage
                .unit(uid)
                .filter(|u| u.status() == UnitStatus::Recreating)
                .map(|_| uid)
        });
        if existing.is_some() && recreating.is_none() {
            return Ok(());
        }

        let behavior = stage.behavior();
        let Some(unit) = behavior.create_chain_unit(stage.config(), parents, chain) else {
            // parents not complete yet, try again next tick
            return Ok(());
        };
        let unit = unit.with_chain_ref(chain_ref);

        match recreating {
            Some(uid) => {
                stage.replace_unit(uid, unit);
                tracing::info!(stage = %sid, unit = %uid, "rebuilt chain unit");
                report.events.push(Event::UnitRecreated { stage: sid, unit: uid });
            }
            None => {
                let uid = stage.add_unit(unit);
                tracing::info!(stage = %sid, unit = %uid, "created chain unit");
                report.events.push(Event::UnitCreated { stage: sid, unit: uid });
            }
        }
        Ok(())
    }

    /// Direct-data mode: partition input not covered by existing units
    async fn create_data_units(
        &self,
        workflow: &mut Workflow,
        sid: StageId,
        data: &DataSet,
        report: &mut TickReport,
    ) -> Result<(), DriveError> {
        let (assigned, config) = {
            let stage = workflow.stage(sid).ok_or(DriveError::UnknownStage(sid))?;
            let assigned: BTreeSet<String> = stage
                .units()
                .iter()
                .flat_map(|u| u.spec.input_items.iter().cloned())
                .collect();
            (assigned, stage.config().clone())
        };

        let fresh = data.difference(&assigned);
        if fresh.is_empty() {
            return Ok(());
        }

        let slice = DataSet::from_items(data.name.clone(), fresh);
        let specs = self.partitioner.split(&config, &slice).await?;

        let stage = workflow
            .stage_mut(sid)
            .ok_or(DriveError::UnknownStage(sid))?;
        for spec in specs {
            let name = spec.name.clone();
            let uid = stage.add_unit(Unit::new(name, spec));
            tracing::info!(stage = %sid, unit = %uid, "created unit");
            report.events.push(Event::UnitCreated { stage: sid, unit: uid });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
