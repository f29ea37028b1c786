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

//! Raw session-replay events.
//!
//! One `RawEvent` per record captured by the replay recorder: full DOM
//! snapshots, incremental mutations, pointer/input/scroll interactions, and
//! navigation markers. Events are supplied as one complete batch per session
//! and are sorted defensively by timestamp before classification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One element as serialized in a snapshot or a mutation "add" record.
///
/// Children are nested here (the wire shape); the DOM model flattens them
/// into id links on insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Stable node identity from the recorder, unique within a session.
    pub id: u64,
    /// Lowercase element tag ("button", "input", "div", ...).
    pub tag_name: String,
    /// Attribute name -> value.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Immediate text, if any.
    #[serde(default)]
    pub text_content: Option<String>,
    /// Child subtrees in DOM order.
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    /// Create a bare element node.
    pub fn element(id: u64, tag_name: impl Into<String>) -> Self {
        Self {
            id,
            tag_name: tag_name.into(),
            attributes: BTreeMap::new(),
            text_content: None,
            children: Vec::new(),
        }
    }

    /// Set the immediate text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child subtree.
    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }
}

/// One node added by a mutation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationAdd {
    /// Parent to attach under; `None` detaches the subtree as a new root.
    pub parent_id: Option<u64>,
    /// The added subtree.
    pub node: SnapshotNode,
}

/// Attribute changes for one existing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    pub id: u64,
    pub attributes: BTreeMap<String, String>,
}

/// Text change for one existing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUpdate {
    pub id: u64,
    pub value: Option<String>,
}

/// One incremental DOM mutation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationBatch {
    #[serde(default)]
    pub adds: Vec<MutationAdd>,
    #[serde(default)]
    pub removes: Vec<u64>,
    #[serde(default)]
    pub attributes: Vec<AttributeUpdate>,
    #[serde(default)]
    pub texts: Vec<TextUpdate>,
}

/// Navigation marker: the document changed to a new URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Pointer click on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerClick {
    pub target_id: u64,
}

/// Input value change on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputChange {
    pub target_id: u64,
    pub value: String,
}

/// Viewport scroll position.
///
/// `document_height` comes from the capture layer; records without a
/// positive height are treated as malformed and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub y: f64,
    pub document_height: f64,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    /// Full serialized DOM tree captured at one point in time.
    Snapshot(SnapshotNode),
    /// The page URL changed.
    Navigation(Navigation),
    /// Incremental add/remove/attribute/text changes.
    Mutation(MutationBatch),
    /// Pointer click interaction.
    Click(PointerClick),
    /// Input field value change.
    Input(InputChange),
    /// Scroll position tick.
    Scroll(ScrollPosition),
}

/// One captured replay record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Milliseconds since Unix epoch.
    pub timestamp_ms: i64,
    pub payload: EventPayload,
}

impl RawEvent {
    pub fn new(timestamp_ms: i64, payload: EventPayload) -> Self {
        Self {
            timestamp_ms,
            payload,
        }
    }

    /// Pointer, input, or scroll interaction (mutations excluded: they only
    /// feed the DOM model and never emit entries themselves).
    pub fn is_interaction(&self) -> bool {
        matches!(
            self.payload,
            EventPayload::Click(_) | EventPayload::Input(_) | EventPayload::Scroll(_)
        )
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self.payload, EventPayload::Navigation(_))
    }
}
