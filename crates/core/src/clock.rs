// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Orchestration arithmetic (chain delays, submission hold-off) works in
//! whole seconds since the Unix epoch, with 0 reserved as "unstamped".

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch
pub type UnixTime = u64;

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> UnixTime;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTime {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<UnixTime>>,
}

impl FakeClock {
    /// Starts well past zero so the "unstamped" sentinel stays distinct
    pub fn new() -> Self {
        Self::at(1_000_000)
    }

    pub fn at(start: UnixTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by the given number of seconds
    pub fn advance(&self, secs: u64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += secs;
    }

    /// Set the clock to a specific time
    pub fn set(&self, time: UnixTime) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = time;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> UnixTime {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
