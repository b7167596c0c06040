// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partitioner adapter: slicing input data into executable specs

use async_trait::async_trait;
use gw_core::{DataSet, ExecutionSpec, StageConfig};
use thiserror::Error;

mod chunk;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use chunk::FixedChunkPartitioner;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePartitioner;

/// Errors from partitioning
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("invalid partitioning configuration: {0}")]
    InvalidConfig(String),
    #[error("data query failed: {0}")]
    Query(String),
}

/// Slices input data into execution specs.
///
/// Splitting must be deterministic on unchanged input; reconciliation
/// re-invokes it every tick and relies on equivalent output.
#[async_trait]
pub trait Partitioner: Send + Sync {
    async fn split(
        &self,
        config: &StageConfig,
        data: &DataSet,
    ) -> Result<Vec<ExecutionSpec>, PartitionError>;
}
