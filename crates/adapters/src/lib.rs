// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the external collaborators of the orchestration core:
//! executors, partitioners and post-processors.

pub mod executor;
pub mod partitioner;
pub mod post;

pub use executor::{Executor, ExecutorError, LocalExecutor, NoOpExecutor};
pub use partitioner::{FixedChunkPartitioner, PartitionError, Partitioner};
pub use post::{NoOpPostProcessor, PostProcessError, PostProcessor};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use executor::{ExecutorCall, FakeExecutor};
#[cfg(any(test, feature = "test-support"))]
pub use partitioner::FakePartitioner;
#[cfg(any(test, feature = "test-support"))]
pub use post::{FakePostProcessor, PostCall};
