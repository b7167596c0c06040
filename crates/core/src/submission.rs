// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution requests and reports
//!
//! An `ExecutionSpec` is the slice of work a unit hands to the executor;
//! an `ExecutionReport` is what polling gets back. The core never looks
//! inside an execution beyond these two shapes.

use crate::status::ExecutionState;
use serde::{Deserialize, Serialize};

/// The work submitted for one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSpec {
    pub name: String,
    /// Application command run on the worker
    pub command: String,
    pub args: Vec<String>,
    /// Input items assigned to this slice
    pub input_items: Vec<String>,
    /// Output location template, expanded by the executor
    pub output_template: Option<String>,
    /// Requested site or queue; `None` lets the executor broker freely
    pub target: Option<String>,
    /// Sites this work must not be brokered to again
    pub excluded_targets: Vec<String>,
}

impl ExecutionSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            input_items: Vec::new(),
            output_template: None,
            target: None,
            excluded_targets: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Rule the current target out and let the executor pick a new one
    pub fn rebroker(&mut self) {
        if let Some(target) = self.target.take() {
            if !self.excluded_targets.contains(&target) {
                self.excluded_targets.push(target);
            }
        }
    }
}

/// What polling an execution returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub state: ExecutionState,
    /// Where the execution was brokered to, once known
    pub target: Option<String>,
    /// Output artifacts, populated on success
    pub outputs: Vec<String>,
    /// Backend detail for failures
    pub reason: Option<String>,
}

impl ExecutionReport {
    pub fn new(state: ExecutionState) -> Self {
        Self {
            state,
            target: None,
            outputs: Vec::new(),
            reason: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
