// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-process executor
//!
//! Runs each execution's command as a child process on this machine,
//! one working directory per execution. The default backend for
//! development and integration testing without a remote grid.

use super::{Executor, ExecutorError};
use async_trait::async_trait;
use gw_core::{ExecutionId, ExecutionReport, ExecutionSpec, ExecutionState};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::process::{Child, Command};

struct LocalExecution {
    child: Option<Child>,
    state: ExecutionState,
    workdir: PathBuf,
}

/// Executor running work as local child processes
#[derive(Clone)]
pub struct LocalExecutor {
    root: PathBuf,
    executions: Arc<Mutex<HashMap<ExecutionId, LocalExecution>>>,
}

impl LocalExecutor {
    /// Executions get working directories under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            executions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn list_outputs(workdir: &Path) -> Vec<String> {
        let mut outputs = Vec::new();
        if let Ok(entries) = std::fs::read_dir(workdir) {
            for entry in entries.flatten() {
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    outputs.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        outputs.sort();
        outputs
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn submit(&self, spec: &ExecutionSpec) -> Result<ExecutionId, ExecutorError> {
        let id = ExecutionId(uuid::Uuid::new_v4().to_string());
        let workdir = self.root.join(&id.0);
        tokio::fs::create_dir_all(&workdir).await?;

        let child = Command::new(&spec.command)
            .args(&spec.args)
            .args(&spec.input_items)
            .current_dir(&workdir)
            .spawn()
            .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;

        tracing::info!(execution = %id, command = %spec.command, "spawned local execution");

        self.executions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id.clone(),
                LocalExecution {
                    child: Some(child),
                    state: ExecutionState::Running,
                    workdir,
                },
            );
        Ok(id)
    }

    async fn status(&self, id: &ExecutionId) -> Result<ExecutionReport, ExecutorError> {
        let (state, workdir) = {
            let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
            let exec = executions
                .get_mut(id)
                .ok_or_else(|| ExecutorError::UnknownExecution(id.clone()))?;

            if let Some(child) = exec.child.as_mut() {
                match child.try_wait() {
                    Ok(Some(exit)) => {
                        exec.state = if exit.success() {
                            ExecutionState::Succeeded
                        } else {
                            ExecutionState::Failed
                        };
                        exec.child = None;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(execution = %id, error = %err, "wait failed");
                        exec.state = ExecutionState::Failed;
                        exec.child = None;
                    }
                }
            }
            (exec.state, exec.workdir.clone())
        };

        let mut report = ExecutionReport::new(state).with_target("localhost");
        if state == ExecutionState::Succeeded {
            report.outputs = Self::list_outputs(&workdir);
        }
        Ok(report)
    }

    async fn cancel(&self, id: &ExecutionId) -> Result<bool, ExecutorError> {
        let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
        match executions.get_mut(id) {
            Some(exec) => {
                if let Some(child) = exec.child.as_mut() {
                    if let Err(err) = child.start_kill() {
                        tracing::warn!(execution = %id, error = %err, "kill failed");
                    }
                    exec.child = None;
                    exec.state = ExecutionState::Cancelled;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            None => Ok(false),
        }
    }

    async fn fetch_output(&self, id: &ExecutionId, dest: &Path) -> Result<bool, ExecutorError> {
        let workdir = {
            let executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
            executions
                .get(id)
                .ok_or_else(|| ExecutorError::UnknownExecution(id.clone()))?
                .workdir
                .clone()
        };

        tokio::fs::create_dir_all(dest).await?;
        let mut entries = tokio::fs::read_dir(&workdir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::copy(entry.path(), dest.join(entry.file_name())).await?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
