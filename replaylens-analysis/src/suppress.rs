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

//! Noise suppression.
//!
//! Two independent, idempotent, order-preserving passes: a per-field input
//! debounce applied before entry emission (keystroke coalescing and
//! programmatic-echo filtering), and a collapse of consecutive same-kind
//! entries applied to the finished sequence (repeated scroll ticks, repeated
//! edits of one value).

use replaylens_core::action::ActionLogEntry;
use replaylens_core::config::EngineConfig;
use std::collections::HashMap;

/// Outcome of observing one input event for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDecision {
    /// Value identical to the last seen value; nothing to emit.
    NoChange,
    /// Change filtered as keystroke jitter or a programmatic echo.
    Suppressed,
    /// Accepted edit to a non-empty value.
    Typed(String),
    /// Accepted edit that emptied a previously non-empty field.
    Cleared,
}

#[derive(Debug)]
struct FieldState {
    /// First-seen value (the field's value attribute at registration).
    original: String,
    /// Last observed value, accepted or not.
    last_value: String,
    /// Last accepted value.
    accepted: String,
    /// Timestamp of the last accepted change; registration time before any
    /// change has been accepted.
    accepted_ms: i64,
    /// Timestamp of the last observed change attempt, accepted or not.
    changed_ms: Option<i64>,
}

/// Per-field input debounce.
#[derive(Debug, Default)]
pub struct InputDebouncer {
    fields: HashMap<u64, FieldState>,
}

impl InputDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one input event and decide whether it survives.
    ///
    /// `original_hint` is the field's value attribute at first encounter,
    /// used as the baseline for revert detection.
    pub fn observe(
        &mut self,
        field_id: u64,
        value: &str,
        timestamp_ms: i64,
        original_hint: Option<&str>,
        config: &EngineConfig,
    ) -> InputDecision {
        let field = self.fields.entry(field_id).or_insert_with(|| {
            let original = original_hint.unwrap_or_default().to_string();
            FieldState {
                last_value: original.clone(),
                accepted: original.clone(),
                original,
                accepted_ms: timestamp_ms,
                changed_ms: None,
            }
        });

        if value == field.last_value {
            return InputDecision::NoChange;
        }

        let previous = std::mem::replace(&mut field.last_value, value.to_string());
        let since_accepted = timestamp_ms - field.accepted_ms;
        let since_changed = field.changed_ms.map(|changed| timestamp_ms - changed);
        field.changed_ms = Some(timestamp_ms);

        let revert_echo =
            value == field.original && since_accepted < config.input_revert_window_ms;
        let coalesced = since_changed.is_some_and(|gap| gap < config.input_coalesce_ms);
        let cleared_original = value.is_empty() && field.accepted == field.original;
        let keystroke_jitter = value.chars().count().abs_diff(previous.chars().count()) == 1
            && since_accepted < config.input_jitter_window_ms;

        if revert_echo || coalesced || cleared_original || keystroke_jitter {
            return InputDecision::Suppressed;
        }

        let was_populated = !field.accepted.is_empty();
        field.accepted = value.to_string();
        field.accepted_ms = timestamp_ms;

        if value.is_empty() && was_populated {
            InputDecision::Cleared
        } else {
            InputDecision::Typed(value.to_string())
        }
    }
}

/// Collapse runs of adjacent collapsible entries (input, scroll) to their
/// last member, preserving that member's timestamp and visibility context.
pub fn collapse_consecutive(entries: Vec<ActionLogEntry>) -> Vec<ActionLogEntry> {
    let before = entries.len();
    let mut collapsed: Vec<ActionLogEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        let replaces_last = collapsed
            .last()
            .is_some_and(|last| last.kind == entry.kind && entry.kind.is_collapsible());
        if replaces_last {
            collapsed.pop();
        }
        collapsed.push(entry);
    }

    if collapsed.len() < before {
        tracing::debug!(
            before,
            after = collapsed.len(),
            "collapsed consecutive entries"
        );
    }

    collapsed
}
