// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage supervisor state
//!
//! A stage owns an ordered list of units, the template configuration
//! applied to new units, chaining and run-limit policy, and a status
//! rolled up from its units each tick. Once a stage leaves the new
//! state its configuration freezes; only status, unit growth and the
//! run-limit counters stay mutable.

use crate::behavior::{GenericBehavior, StageBehavior};
use crate::dataset::{ChainInput, DataSet, StageInput};
use crate::error::{ConfigError, StructuralError};
use crate::id::{ExecutionId, StageId, UnitId};
use crate::retry::RetryPolicy;
use crate::status::{rollup_units, StageStatus, UnitStatus};
use crate::unit::Unit;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Template configuration applied to every unit of a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    /// Application command run for each slice of work
    pub command: String,
    pub args: Vec<String>,
    /// Requested submission target; `None` lets the executor broker
    pub target: Option<String>,
    pub inputs: Vec<StageInput>,
    /// Output location template passed through to executions
    pub output_template: Option<String>,
    /// Patterns shipped back from the worker (legacy, exclusive with
    /// output_files)
    pub output_sandbox: Vec<String>,
    pub output_files: Vec<String>,
    /// Aggregate copy location for the whole stage
    pub copy_output: Option<PathBuf>,
    /// Per-unit copy location; unit output is fetched here before the
    /// unit completes
    pub unit_copy_output: Option<PathBuf>,
    pub retry: RetryPolicy,
    /// Upstream stages that must complete before this one proceeds
    pub required_stages: Vec<StageId>,
    /// Minutes to wait after upstream dependencies complete
    pub chain_delay: u64,
    /// Stop the tick after the first submission (backpressure against
    /// rate-limited backends)
    pub abort_loop_on_submit: bool,
    /// Submit independent units in parallel
    pub submit_with_threads: bool,
    pub max_active_threads: usize,
}

/// Validated construction for stages. Incompatible combinations are
/// rejected here rather than through setter side effects.
#[derive(Debug)]
pub struct StageBuilder {
    config: StageConfig,
}

impl StageBuilder {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            config: StageConfig {
                name: name.into(),
                command: command.into(),
                args: Vec::new(),
                target: None,
                inputs: Vec::new(),
                output_template: None,
                output_sandbox: Vec::new(),
                output_files: Vec::new(),
                copy_output: None,
                unit_copy_output: None,
                retry: RetryPolicy::default(),
                required_stages: Vec::new(),
                chain_delay: 0,
                abort_loop_on_submit: true,
                submit_with_threads: false,
                max_active_threads: 10,
            },
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.config.args.push(arg.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.config.target = Some(target.into());
        self
    }

    pub fn input(mut self, input: StageInput) -> Self {
        self.config.inputs.push(input);
        self
    }

    pub fn data(self, dataset: DataSet) -> Self {
        self.input(StageInput::Data(dataset))
    }

    pub fn chain(self, chain: ChainInput) -> Self {
        self.input(StageInput::Chain(chain))
    }

    pub fn output_template(mut self, template: impl Into<String>) -> Self {
        self.config.output_template = Some(template.into());
        self
    }

    pub fn output_sandbox(mut self, pattern: impl Into<String>) -> Self {
        self.config.output_sandbox.push(pattern.into());
        self
    }

    pub fn output_file(mut self, pattern: impl Into<String>) -> Self {
        self.config.output_files.push(pattern.into());
        self
    }

    pub fn copy_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.copy_output = Some(path.into());
        self
    }

    pub fn unit_copy_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.unit_copy_output = Some(path.into());
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn requires(mut self, stage: StageId) -> Self {
        self.config.required_stages.push(stage);
        self
    }

    pub fn chain_delay(mut self, minutes: u64) -> Self {
        self.config.chain_delay = minutes;
        self
    }

    pub fn abort_loop_on_submit(mut self, abort: bool) -> Self {
        self.config.abort_loop_on_submit = abort;
        self
    }

    pub fn threaded_submission(mut self, max_active_threads: usize) -> Self {
        self.config.submit_with_threads = true;
        self.config.max_active_threads = max_active_threads;
        self
    }

    pub fn build(self) -> Result<Stage, ConfigError> {
        self.build_with(Arc::new(GenericBehavior))
    }

    pub fn build_with(self, behavior: Arc<dyn StageBehavior>) -> Result<Stage, ConfigError> {
        if !self.config.output_files.is_empty() && !self.config.output_sandbox.is_empty() {
            return Err(ConfigError::ConflictingOutputs);
        }
        Ok(Stage {
            id: None,
            config: self.config,
            behavior,
            status: StageStatus::New,
            units: Vec::new(),
        })
    }
}

/// A processing step of a workflow
#[derive(Clone, Serialize, Deserialize)]
pub struct Stage {
    id: Option<StageId>,
    config: StageConfig,
    #[serde(skip, default = "default_behavior")]
    behavior: Arc<dyn StageBehavior>,
    status: StageStatus,
    units: Vec<Unit>,
}

fn default_behavior() -> Arc<dyn StageBehavior> {
    Arc::new(GenericBehavior)
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("status", &self.status)
            .field("units", &self.units.len())
            .finish()
    }
}

impl Stage {
    pub fn builder(name: impl Into<String>, command: impl Into<String>) -> StageBuilder {
        StageBuilder::new(name, command)
    }

    pub(crate) fn attach(&mut self, id: StageId) {
        self.id = Some(id);
    }

    /// Position within the owning workflow; errors while unattached
    pub fn id(&self) -> Result<StageId, ConfigError> {
        self.id.ok_or(ConfigError::UnattachedStage)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Mutable configuration access, only while the stage is new
    pub fn config_mut(&mut self) -> Result<&mut StageConfig, StructuralError> {
        if self.status == StageStatus::New {
            Ok(&mut self.config)
        } else {
            Err(StructuralError::StageReadOnly(self.config.name.clone()))
        }
    }

    pub fn behavior(&self) -> Arc<dyn StageBehavior> {
        Arc::clone(&self.behavior)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.0)
    }

    /// Record newly arrived items on a data input. Input data is owned
    /// by external catalogs, so growth is data arrival rather than
    /// reconfiguration and stays allowed after the stage starts.
    pub fn extend_input_data(&mut self, name: &str, items: Vec<String>) {
        let dataset = self.config.inputs.iter_mut().find_map(|input| match input {
            StageInput::Data(ds) if ds.name == name => Some(ds),
            _ => None,
        });
        if let Some(ds) = dataset {
            ds.extend(items);
        }
    }

    // Run-limit counters stay adjustable after configuration freezes.

    pub fn set_run_limit(&mut self, limit: u32) {
        self.config.retry.run_limit = limit;
    }

    pub fn set_minor_run_limit(&mut self, limit: u32) {
        self.config.retry.minor_run_limit = limit;
    }

    pub fn set_major_run_limit(&mut self, limit: u32) {
        self.config.retry.major_run_limit = limit;
    }

    /// Validate (for a new stage) and start running. A completed stage
    /// stays completed; a paused one resumes.
    pub fn run(&mut self, check: bool) -> Result<(), ConfigError> {
        if self.status == StageStatus::New && check {
            self.behavior.validate(&self.config)?;
        }
        if self.status == StageStatus::Completed {
            tracing::warn!(stage = %self.config.name, "stage is already completed");
        } else {
            self.update_status(StageStatus::Running);
        }
        Ok(())
    }

    /// Stop submitting; the driver skips this stage until run() resumes it
    pub fn pause(&mut self) {
        if self.status == StageStatus::Completed {
            tracing::debug!(stage = %self.config.name, "stage is already completed");
        } else {
            self.update_status(StageStatus::Pause);
        }
    }

    pub fn update_status(&mut self, status: StageStatus) {
        if self.status != status {
            tracing::info!(
                stage = %self.config.name,
                from = self.status.name(),
                to = status.name(),
                "stage status change"
            );
            self.status = status;
        }
    }

    /// Roll status up from the unit statuses
    pub fn rollup(&mut self) -> StageStatus {
        let statuses: Vec<UnitStatus> = self.units.iter().map(|u| u.status()).collect();
        let next = rollup_units(&statuses, self.status);
        self.update_status(next);
        self.status
    }

    /// Append a new unit, assigning the next id
    pub fn add_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = UnitId(self.units.len());
        unit.attach(id);
        unit.active = true;
        unit.update_status(UnitStatus::Hold);
        self.units.push(unit);
        id
    }

    /// Rebuild a recreated unit in place: same id, history inherited
    pub fn replace_unit(&mut self, id: UnitId, mut unit: Unit) -> Option<UnitId> {
        let prev = self.units.get(id.0)?;
        unit.inherit_history(prev);
        unit.attach(id);
        unit.active = true;
        unit.update_status(UnitStatus::Hold);
        self.units[id.0] = unit;
        Some(id)
    }

    /// Find the unit carrying the given chain reference
    pub fn unit_with_chain_ref(&self, chain_ref: &crate::id::ChainRef) -> Option<UnitId> {
        self.units
            .iter()
            .position(|u| u.chain_refs.contains(chain_ref))
            .map(UnitId)
    }

    // Introspection

    pub fn n_status(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status() == status).count()
    }

    pub fn n_active(&self) -> usize {
        self.units.iter().map(|u| u.n_active()).sum()
    }

    pub fn n_all(&self) -> usize {
        self.units.iter().map(|u| u.n_all()).sum()
    }

    /// Live execution ids across all units
    pub fn active_executions(&self) -> Vec<ExecutionId> {
        self.units
            .iter()
            .flat_map(|u| u.active_executions().iter().cloned())
            .collect()
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
