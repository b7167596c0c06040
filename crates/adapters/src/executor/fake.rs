// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Executor, ExecutorError};
use async_trait::async_trait;
use gw_core::{ExecutionId, ExecutionReport, ExecutionSpec, ExecutionState};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded executor call
#[derive(Debug, Clone)]
pub enum ExecutorCall {
    Submit { spec: ExecutionSpec },
    Status { id: ExecutionId },
    Cancel { id: ExecutionId },
    FetchOutput { id: ExecutionId, dest: PathBuf },
}

/// Fake executor with scriptable reports and call recording
#[derive(Clone)]
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<ExecutorCall>>>,
    reports: Arc<Mutex<HashMap<ExecutionId, ExecutionReport>>>,
    specs: Arc<Mutex<HashMap<ExecutionId, ExecutionSpec>>>,
    next_id: Arc<Mutex<u64>>,
    reject_submits: Arc<Mutex<Option<String>>>,
    cancel_error: Arc<Mutex<Option<String>>>,
    fetch_ok: Arc<Mutex<bool>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reports: Arc::new(Mutex::new(HashMap::new())),
            specs: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(0)),
            reject_submits: Arc::new(Mutex::new(None)),
            cancel_error: Arc::new(Mutex::new(None)),
            fetch_ok: Arc::new(Mutex::new(true)),
        }
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Specs submitted so far, in submission order
    pub fn submitted(&self) -> Vec<ExecutionSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ExecutorCall::Submit { spec } => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn submit_count(&self) -> usize {
        self.submitted().len()
    }

    pub fn spec_for(&self, id: &ExecutionId) -> Option<ExecutionSpec> {
        self.specs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Script the report polled for an execution
    pub fn set_report(&self, id: &ExecutionId, report: ExecutionReport) {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), report);
    }

    pub fn set_state(&self, id: &ExecutionId, state: ExecutionState) {
        self.set_report(id, ExecutionReport::new(state));
    }

    /// Finish an execution successfully with the given outputs
    pub fn succeed(&self, id: &ExecutionId, outputs: &[&str]) {
        self.set_report(
            id,
            ExecutionReport::new(ExecutionState::Succeeded).with_outputs(outputs.to_vec()),
        );
    }

    /// Fail an execution with a reason
    pub fn fail(&self, id: &ExecutionId, reason: &str) {
        let target = self.spec_for(id).and_then(|s| s.target);
        let mut report = ExecutionReport::new(ExecutionState::Failed).with_reason(reason);
        report.target = target;
        self.set_report(id, report);
    }

    /// Make every submission fail synchronously
    pub fn reject_submissions(&self, reason: &str) {
        *self
            .reject_submits
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(reason.to_string());
    }

    pub fn accept_submissions(&self) {
        *self
            .reject_submits
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Make every cancel call error out
    pub fn fail_cancels(&self, reason: &str) {
        *self.cancel_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason.to_string());
    }

    pub fn set_fetch_ok(&self, ok: bool) {
        *self.fetch_ok.lock().unwrap_or_else(|e| e.into_inner()) = ok;
    }

    fn record(&self, call: ExecutorCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn submit(&self, spec: &ExecutionSpec) -> Result<ExecutionId, ExecutorError> {
        self.record(ExecutorCall::Submit { spec: spec.clone() });

        let reject = self
            .reject_submits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(reason) = reject {
            return Err(ExecutorError::SubmitRejected(reason));
        }

        let n = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            *next
        };
        let id = ExecutionId(format!("exec-{n}"));

        self.specs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), spec.clone());

        let mut report = ExecutionReport::new(ExecutionState::Pending);
        report.target = spec.target.clone();
        self.set_report(&id, report);

        Ok(id)
    }

    async fn status(&self, id: &ExecutionId) -> Result<ExecutionReport, ExecutorError> {
        self.record(ExecutorCall::Status { id: id.clone() });
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| ExecutorError::UnknownExecution(id.clone()))
    }

    async fn cancel(&self, id: &ExecutionId) -> Result<bool, ExecutorError> {
        self.record(ExecutorCall::Cancel { id: id.clone() });
        let scripted = self
            .cancel_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(reason) = scripted {
            return Err(ExecutorError::Backend(reason));
        }
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        match reports.get_mut(id) {
            Some(report) if !report.state.is_terminal() => {
                report.state = ExecutionState::Cancelled;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }

    async fn fetch_output(&self, id: &ExecutionId, dest: &Path) -> Result<bool, ExecutorError> {
        self.record(ExecutorCall::FetchOutput {
            id: id.clone(),
            dest: dest.to_path_buf(),
        });
        Ok(*self.fetch_ok.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
