// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor adapter: submission, polling, cancellation, output retrieval

use async_trait::async_trait;
use gw_core::{ExecutionId, ExecutionReport, ExecutionSpec};
use std::path::Path;
use thiserror::Error;

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod local;
mod noop;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutor};
pub use local::LocalExecutor;
pub use noop::NoOpExecutor;

/// Errors from the remote executor
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("submission rejected: {0}")]
    SubmitRejected(String),
    #[error("unknown execution: {0}")]
    UnknownExecution(ExecutionId),
    #[error("backend unavailable: {0}")]
    Backend(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote execution backend.
///
/// All calls are bounded round-trips; anything genuinely long-running
/// happens on the executor's side. `status` is polled every tick and
/// must tolerate it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Hand a slice of work to the backend
    async fn submit(&self, spec: &ExecutionSpec) -> Result<ExecutionId, ExecutorError>;

    /// Report the current state of an execution
    async fn status(&self, id: &ExecutionId) -> Result<ExecutionReport, ExecutorError>;

    /// Cancel a live execution; true when the backend accepted the kill
    async fn cancel(&self, id: &ExecutionId) -> Result<bool, ExecutorError>;

    /// Pull output artifacts into the destination directory
    async fn fetch_output(&self, id: &ExecutionId, dest: &Path) -> Result<bool, ExecutorError>;
}
