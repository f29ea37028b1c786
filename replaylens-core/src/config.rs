// Copyright 2025 Replaylens (https://github.com/replaylens)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration for the derivation engine.
//!
//! All knobs default to the production thresholds; tests and historical
//! imports can relax them through the named constructors.

use crate::error::{ReplaylensError, Result};
use crate::event::RawEvent;
use serde::{Deserialize, Serialize};

/// Default maximum session span accepted by the surrounding system (60
/// minutes). Longer sessions are refused before the engine runs.
pub const DEFAULT_MAX_SESSION_DURATION_MS: i64 = 60 * 60 * 1000;

/// Tunable thresholds for classification and noise suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window within which reverting a field to its original value is
    /// treated as a programmatic echo rather than a user edit.
    pub input_revert_window_ms: i64,
    /// Minimum gap between accepted input changes (keystroke coalescing).
    pub input_coalesce_ms: i64,
    /// Window within which a single-character length change is treated as
    /// keystroke jitter.
    pub input_jitter_window_ms: i64,
    /// Maximum ancestor text length consulted for contextual labels.
    pub ancestor_text_limit: usize,
    /// Depth bound for text aggregation over the node arena.
    pub max_text_depth: usize,
    /// Fraction by which the visible-element count must change for a scan
    /// to be significant.
    pub visibility_delta_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_revert_window_ms: 1000,
            input_coalesce_ms: 50,
            input_jitter_window_ms: 200,
            ancestor_text_limit: 100,
            max_text_depth: 32,
            visibility_delta_ratio: 0.2,
        }
    }
}

impl EngineConfig {
    /// Config with input debouncing disabled (every value change emits).
    ///
    /// Useful for replaying captures that were pre-filtered at the edge.
    pub fn without_debounce() -> Self {
        Self {
            input_revert_window_ms: 0,
            input_coalesce_ms: 0,
            input_jitter_window_ms: 0,
            ..Self::default()
        }
    }
}

/// Caller-side session bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLimits {
    /// Maximum span between the first and last event of a session.
    pub max_duration_ms: i64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_duration_ms: DEFAULT_MAX_SESSION_DURATION_MS,
        }
    }
}

impl SessionLimits {
    pub fn new(max_duration_ms: i64) -> Self {
        Self { max_duration_ms }
    }

    /// Reject nonsensical bounds before they silently drop every session.
    pub fn validate(&self) -> Result<()> {
        if self.max_duration_ms <= 0 {
            return Err(ReplaylensError::InvalidConfig(format!(
                "max_duration_ms must be positive, got {}",
                self.max_duration_ms
            )));
        }
        Ok(())
    }

    /// True when the event span exceeds the configured maximum. Empty
    /// batches never exceed.
    pub fn exceeds_max_duration(&self, events: &[RawEvent]) -> bool {
        let Some(first) = events.iter().map(|e| e.timestamp_ms).min() else {
            return false;
        };
        let Some(last) = events.iter().map(|e| e.timestamp_ms).max() else {
            return false;
        };
        let span = last - first;
        if span > self.max_duration_ms {
            tracing::info!(span_ms = span, max_ms = self.max_duration_ms, "session exceeds maximum duration, refusing");
            return true;
        }
        false
    }
}
