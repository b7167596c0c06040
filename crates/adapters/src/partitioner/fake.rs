// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake partitioner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PartitionError, Partitioner};
use async_trait::async_trait;
use gw_core::{DataSet, ExecutionSpec, StageConfig};
use std::sync::{Arc, Mutex};

/// One spec per input item; records the datasets it was asked to split
#[derive(Clone, Default)]
pub struct FakePartitioner {
    splits: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakePartitioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item lists passed to split, in call order
    pub fn splits(&self) -> Vec<Vec<String>> {
        self.splits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn split_count(&self) -> usize {
        self.splits().len()
    }
}

#[async_trait]
impl Partitioner for FakePartitioner {
    async fn split(
        &self,
        config: &StageConfig,
        data: &DataSet,
    ) -> Result<Vec<ExecutionSpec>, PartitionError> {
        let items: Vec<String> = data.items().map(String::from).collect();
        self.splits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(items.clone());

        Ok(items
            .into_iter()
            .map(|item| {
                let mut spec = ExecutionSpec::new(
                    format!("{}-{}", config.name, item),
                    config.command.clone(),
                )
                .with_args(config.args.clone())
                .with_input(vec![item]);
                spec.target = config.target.clone();
                spec
            })
            .collect())
    }
}
