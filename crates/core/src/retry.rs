// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resubmission budget accounting
//!
//! A unit that keeps failing walks through minor resubmissions (retry on
//! the same target), then major resubmissions (rebroker to a different
//! target), and goes bad when the combined budget runs out. Counters only
//! ever grow; a unit reset is the only way back.

use serde::{Deserialize, Serialize};

/// Retry limits applied to every unit of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total (minor + major) attempts before a unit goes bad
    pub run_limit: u32,
    /// Minor resubmissions before escalating to rebrokering
    pub minor_run_limit: u32,
    /// Configured rebroker ceiling, reported in overviews
    pub major_run_limit: u32,
    /// Escalate to a major resubmit once the minor budget is spent;
    /// when false the unit goes bad instead
    pub rebroker_on_fail: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            run_limit: 8,
            minor_run_limit: 3,
            major_run_limit: 3,
            rebroker_on_fail: true,
        }
    }
}

/// What to do with a failed execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Resubmit to the same target
    Minor,
    /// Rebroker to a different target
    Major,
    /// Budget exhausted, mark the unit bad
    GiveUp,
}

impl RetryPolicy {
    /// Decide the next action from the unit's counters and whether the
    /// stage variant asked for a rebroker outright.
    pub fn decide(&self, minor: u32, major: u32, wants_major: bool) -> RetryAction {
        if minor + major >= self.run_limit {
            return RetryAction::GiveUp;
        }
        if wants_major {
            return RetryAction::Major;
        }
        if minor >= self.minor_run_limit {
            if self.rebroker_on_fail {
                RetryAction::Major
            } else {
                RetryAction::GiveUp
            }
        } else {
            RetryAction::Minor
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
