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

//! Derived action-log entries.
//!
//! The engine reduces a raw replay event stream to an ordered sequence of
//! human-readable action statements, each optionally annotated with the
//! interactive elements visible on screen at that moment. Downstream
//! collaborators (label synthesis, persistence) consume these records
//! without feeding anything back into the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel visible-elements value emitted when the current scan does not
/// differ significantly from the previous baseline.
pub const NO_SIGNIFICANT_CHANGE: &str = "No significant change from previous state";

/// Kind of user action an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PageLoad,
    Click,
    Input,
    Scroll,
}

impl ActionKind {
    /// Kinds whose consecutive runs are collapsed to their last member.
    pub fn is_collapsible(self) -> bool {
        matches!(self, ActionKind::Input | ActionKind::Scroll)
    }
}

/// One derived action-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Milliseconds relative to the first event of the session.
    pub timestamp_ms: i64,
    /// Action kind.
    pub kind: ActionKind,
    /// Human-readable statement ("User clicked button with text 'Submit'").
    pub action: String,
    /// Tag of the target element ("button", "input"), or "page"/"scroll"
    /// for non-element actions.
    pub element_type: String,
    /// Semantic attributes of the target: id, placeholder, title, alt,
    /// aria-label, href, aggregated text, input_value.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Descriptions of interactive elements visible on screen, or the single
    /// [`NO_SIGNIFICANT_CHANGE`] sentinel.
    #[serde(default)]
    pub elements_on_screen: Vec<String>,
}

impl ActionLogEntry {
    pub fn new(timestamp_ms: i64, kind: ActionKind, action: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind,
            action: action.into(),
            element_type: String::new(),
            attributes: BTreeMap::new(),
            elements_on_screen: Vec::new(),
        }
    }

    /// True when the visibility context is the unchanged-state sentinel.
    pub fn has_unchanged_context(&self) -> bool {
        self.elements_on_screen.len() == 1 && self.elements_on_screen[0] == NO_SIGNIFICANT_CHANGE
    }
}

/// A staged page-load entry, materialized lazily at the next committed
/// action or at end of stream. At most one is outstanding at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPageLoad {
    pub url: String,
    /// Milliseconds relative to the first event of the session.
    pub timestamp_ms: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_context_sentinel() {
        let mut entry = ActionLogEntry::new(0, ActionKind::Click, "User clicked button");
        assert!(!entry.has_unchanged_context());

        entry.elements_on_screen = vec![NO_SIGNIFICANT_CHANGE.to_string()];
        assert!(entry.has_unchanged_context());

        entry.elements_on_screen = vec![
            NO_SIGNIFICANT_CHANGE.to_string(),
            "Element 'a' with text 'Home'".to_string(),
        ];
        assert!(!entry.has_unchanged_context());
    }

    #[test]
    fn test_collapsible_kinds() {
        assert!(ActionKind::Input.is_collapsible());
        assert!(ActionKind::Scroll.is_collapsible());
        assert!(!ActionKind::Click.is_collapsible());
        assert!(!ActionKind::PageLoad.is_collapsible());
    }
}
