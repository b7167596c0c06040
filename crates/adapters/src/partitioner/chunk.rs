// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size chunking partitioner

use super::{PartitionError, Partitioner};
use async_trait::async_trait;
use gw_core::{DataSet, ExecutionSpec, StageConfig};

/// Splits input into slices of at most `chunk_size` items, in dataset
/// order. Deterministic on unchanged input.
#[derive(Debug, Clone)]
pub struct FixedChunkPartitioner {
    pub chunk_size: usize,
}

impl FixedChunkPartitioner {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for FixedChunkPartitioner {
    fn default() -> Self {
        Self { chunk_size: 10 }
    }
}

#[async_trait]
impl Partitioner for FixedChunkPartitioner {
    async fn split(
        &self,
        config: &StageConfig,
        data: &DataSet,
    ) -> Result<Vec<ExecutionSpec>, PartitionError> {
        if self.chunk_size == 0 {
            return Err(PartitionError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }

        let items: Vec<String> = data.items().map(String::from).collect();
        let specs = items
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(i, chunk)| {
                let mut spec = ExecutionSpec::new(
                    format!("{}-{}", config.name, i),
                    config.command.clone(),
                )
                .with_args(config.args.clone())
                .with_input(chunk.to_vec());
                spec.output_template = config.output_template.clone();
                spec.target = config.target.clone();
                spec
            })
            .collect();
        Ok(specs)
    }
}
