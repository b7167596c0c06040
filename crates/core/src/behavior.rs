// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage variants
//!
//! Per-domain behavior plugs in at construction time through a trait
//! rather than subclassing: validation of the stage configuration,
//! construction of chain units from parent output, and the
//! rebroker-or-retry decision for failed executions.

use crate::dataset::ChainInput;
use crate::error::ConfigError;
use crate::id::{StageId, UnitId};
use crate::mask::FileMask;
use crate::stage::StageConfig;
use crate::status::UnitStatus;
use crate::submission::{ExecutionReport, ExecutionSpec};
use crate::unit::Unit;

/// Read-only view of an upstream unit used to build chain units
#[derive(Debug, Clone)]
pub struct ParentUnit {
    pub stage: StageId,
    pub unit: UnitId,
    pub status: UnitStatus,
    /// Primary output artifacts
    pub outputs: Vec<String>,
    /// Artifacts in the copied-output location, when configured
    pub copy_outputs: Vec<String>,
}

impl ParentUnit {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, UnitStatus::Completed)
    }

    pub fn artifacts(&self, use_copy_output: bool) -> &[String] {
        if use_copy_output {
            &self.copy_outputs
        } else {
            &self.outputs
        }
    }
}

/// Variant behavior of a stage, chosen at construction
pub trait StageBehavior: Send + Sync {
    /// Accept or reject the stage configuration at run time
    fn validate(&self, config: &StageConfig) -> Result<(), ConfigError>;

    /// Build the downstream unit for a chain input from the parents'
    /// output. Returns `None` while any required parent is incomplete.
    fn create_chain_unit(
        &self,
        config: &StageConfig,
        parents: &[ParentUnit],
        chain: &ChainInput,
    ) -> Option<Unit>;

    /// Does this failure call for a rebroker rather than a retry in place?
    fn check_major_resubmit(&self, _report: &ExecutionReport) -> bool {
        false
    }

    /// Hook run while rebrokering, e.g. to purge chain input tied to the
    /// superseded execution
    fn on_major_resubmit(&self, _spec: &mut ExecutionSpec) {}
}

/// Default behavior: mask-filtered chain input, local-copy validation
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericBehavior;

impl StageBehavior for GenericBehavior {
    fn validate(&self, config: &StageConfig) -> Result<(), ConfigError> {
        // a configured local copy needs somewhere to put the files
        for location in [&config.unit_copy_output, &config.copy_output] {
            if let Some(path) = location {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::MissingOutputLocation);
                }
            }
        }
        Ok(())
    }

    fn create_chain_unit(
        &self,
        config: &StageConfig,
        parents: &[ParentUnit],
        chain: &ChainInput,
    ) -> Option<Unit> {
        if parents.is_empty() || parents.iter().any(|p| !p.is_completed()) {
            return None;
        }

        let mask = FileMask::new(&chain.include_mask, &chain.exclude_mask);
        let input: Vec<String> = parents
            .iter()
            .flat_map(|p| p.artifacts(chain.use_copy_output).iter())
            .filter(|f| mask.permits(f))
            .cloned()
            .collect();

        let name = if chain.single_unit {
            format!("Parent: stage {}, all units", chain.source_stage)
        } else {
            format!(
                "Parent: stage {}, unit {}",
                parents[0].stage, parents[0].unit
            )
        };

        let mut spec = ExecutionSpec::new(name.clone(), config.command.clone())
            .with_args(config.args.clone())
            .with_input(input);
        spec.output_template = config.output_template.clone();
        spec.target = config.target.clone();

        Some(Unit::new(name, spec))
    }
}

#[cfg(test)]
#[path = "behavior_tests.rs"]
mod tests;
