// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the orchestration driver

use gw_adapters::{ExecutorError, PartitionError};
use gw_core::{ConfigError, StageId, UnitId};
use thiserror::Error;

/// Errors that can occur while driving a workflow
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),
    #[error("unknown stage: {0}")]
    UnknownStage(StageId),
    #[error("unknown unit: {stage}:{unit}")]
    UnknownUnit { stage: StageId, unit: UnitId },
}
