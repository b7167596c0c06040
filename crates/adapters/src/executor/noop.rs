// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op executor: accepts everything, succeeds instantly

use super::{Executor, ExecutorError};
use async_trait::async_trait;
use gw_core::{ExecutionId, ExecutionReport, ExecutionSpec, ExecutionState};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Executor that runs nothing; every execution reports success
#[derive(Default)]
pub struct NoOpExecutor {
    next_id: AtomicU64,
}

impl NoOpExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Executor for NoOpExecutor {
    async fn submit(&self, _spec: &ExecutionSpec) -> Result<ExecutionId, ExecutorError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ExecutionId(format!("noop-{n}")))
    }

    async fn status(&self, _id: &ExecutionId) -> Result<ExecutionReport, ExecutorError> {
        Ok(ExecutionReport::new(ExecutionState::Succeeded))
    }

    async fn cancel(&self, _id: &ExecutionId) -> Result<bool, ExecutorError> {
        Ok(true)
    }

    async fn fetch_output(&self, _id: &ExecutionId, _dest: &Path) -> Result<bool, ExecutorError> {
        Ok(true)
    }
}
