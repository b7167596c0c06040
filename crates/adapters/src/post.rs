// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-processing hooks run after completion
//!
//! Invoked when a unit or a whole stage completes. Advisory: failures
//! are logged by the engine and never block orchestration.

use async_trait::async_trait;
use gw_core::{StageId, UnitId};
use thiserror::Error;

/// Errors from post-processing
#[derive(Debug, Error)]
pub enum PostProcessError {
    #[error("post-processing failed: {0}")]
    Failed(String),
}

/// Aggregation/notification hooks run on completion
#[async_trait]
pub trait PostProcessor: Send + Sync {
    async fn on_unit_complete(
        &self,
        stage: StageId,
        unit: UnitId,
        outputs: &[String],
    ) -> Result<(), PostProcessError>;

    async fn on_stage_complete(&self, stage: StageId) -> Result<(), PostProcessError>;
}

/// Post-processor that does nothing
#[derive(Clone, Copy, Default)]
pub struct NoOpPostProcessor;

#[async_trait]
impl PostProcessor for NoOpPostProcessor {
    async fn on_unit_complete(
        &self,
        _stage: StageId,
        _unit: UnitId,
        _outputs: &[String],
    ) -> Result<(), PostProcessError> {
        Ok(())
    }

    async fn on_stage_complete(&self, _stage: StageId) -> Result<(), PostProcessError> {
        Ok(())
    }
}

/// Recorded post-processing call
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCall {
    Unit {
        stage: StageId,
        unit: UnitId,
        outputs: Vec<String>,
    },
    Stage {
        stage: StageId,
    },
}

/// Fake post-processor recording its calls
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakePostProcessor {
    calls: std::sync::Arc<std::sync::Mutex<Vec<PostCall>>>,
    fail: std::sync::Arc<std::sync::Mutex<bool>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakePostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PostCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make every hook fail, to exercise the advisory path
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }

    fn failing(&self) -> bool {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl PostProcessor for FakePostProcessor {
    async fn on_unit_complete(
        &self,
        stage: StageId,
        unit: UnitId,
        outputs: &[String],
    ) -> Result<(), PostProcessError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(PostCall::Unit {
                stage,
                unit,
                outputs: outputs.to_vec(),
            });
        if self.failing() {
            return Err(PostProcessError::Failed("scripted failure".to_string()));
        }
        Ok(())
    }

    async fn on_stage_complete(&self, stage: StageId) -> Result<(), PostProcessError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(PostCall::Stage { stage });
        if self.failing() {
            return Err(PostProcessError::Failed("scripted failure".to_string()));
        }
        Ok(())
    }
}
