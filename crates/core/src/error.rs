// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for workflow configuration and structure

use thiserror::Error;

/// Configuration rejected at validation or construction time
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("validation failed for stage '{0}'")]
    ValidationFailed(String),
    #[error("no path selected for local output copy")]
    MissingOutputLocation,
    #[error("cannot set both output_files and output_sandbox")]
    ConflictingOutputs,
    #[error("stage has not been attached to a workflow")]
    UnattachedStage,
    #[error("unit has not been attached to a stage")]
    UnattachedUnit,
}

/// Structural mutation attempted outside the new-state window
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("stage '{0}' is read-only once it has left the new state")]
    StageReadOnly(String),
    #[error("workflow '{0}' accepts new stages only while new")]
    WorkflowReadOnly(String),
}
