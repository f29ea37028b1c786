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

//! Live DOM model built from a snapshot-plus-mutation event stream.
//!
//! An id-indexed arena rather than an owning tree: parent/child links are
//! stored as ids, so removal never traverses or frees a subtree. Orphaned
//! descendants simply become unreachable, matching an append/remove-by-id
//! event log. No operation fails; missing ids are ignored, since partial or
//! truncated snapshots are expected.

use replaylens_core::event::SnapshotNode;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// One tracked element.
#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    pub id: u64,
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub text_content: Option<String>,
    /// Child ids in DOM order. Ids may be stale after removals; lookups
    /// treat missing children as absent.
    pub child_ids: Vec<u64>,
    /// Back-reference for ancestor lookups, never ownership.
    pub parent_id: Option<u64>,
}

/// Id-indexed element arena.
///
/// Insertion order is kept separately so visibility scans are deterministic
/// and follow document order (snapshots insert pre-order).
#[derive(Debug, Default)]
pub struct DomModel {
    nodes: HashMap<u64, DomNode>,
    order: Vec<u64>,
}

impl DomModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&DomNode> {
        self.nodes.get(&id)
    }

    /// Nodes in document (first-insertion) order, skipping removed ids.
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Insert a snapshot subtree, updating nodes already present in place.
    pub fn build(&mut self, root: &SnapshotNode) {
        self.insert_subtree(root, None);
    }

    /// Insert a mutation-added subtree under `parent_id`. The child link is
    /// appended only if the parent is currently present.
    pub fn apply_add(&mut self, node: &SnapshotNode, parent_id: Option<u64>) {
        self.insert_subtree(node, parent_id);
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                if !parent.child_ids.contains(&node.id) {
                    parent.child_ids.push(node.id);
                }
            }
        }
    }

    /// Remove one node by id. Descendants are not cascade-deleted; they
    /// become unreachable and are skipped by ordered iteration only when
    /// they too are removed.
    pub fn apply_remove(&mut self, id: u64) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(parent_id) = node.parent_id {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.child_ids.retain(|child| *child != id);
            }
        }
        self.order.retain(|entry| *entry != id);
    }

    /// Replace a node's attribute values. Missing ids are ignored.
    pub fn set_attributes(&mut self, id: u64, attributes: &BTreeMap<String, String>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            for (name, value) in attributes {
                node.attributes.insert(name.clone(), value.clone());
            }
        }
    }

    /// Replace a node's immediate text. Missing ids are ignored.
    pub fn set_text(&mut self, id: u64, value: Option<&str>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.text_content = value.map(str::to_string);
        }
    }

    /// Empty the model. Invoked exactly once per detected URL change, since
    /// node ids are not stable across documents.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    fn insert_subtree(&mut self, node: &SnapshotNode, parent_id: Option<u64>) {
        // Explicit worklist: snapshot trees can be deep enough to matter.
        let mut pending: Vec<(&SnapshotNode, Option<u64>)> = vec![(node, parent_id)];

        while let Some((current, parent)) = pending.pop() {
            let child_ids: Vec<u64> = current.children.iter().map(|child| child.id).collect();
            match self.nodes.get_mut(&current.id) {
                Some(existing) => {
                    existing.tag_name = current.tag_name.clone();
                    existing.attributes = current.attributes.clone();
                    existing.text_content = current.text_content.clone();
                    existing.child_ids = child_ids;
                    if parent.is_some() {
                        existing.parent_id = parent;
                    }
                }
                None => {
                    self.nodes.insert(
                        current.id,
                        DomNode {
                            id: current.id,
                            tag_name: current.tag_name.clone(),
                            attributes: current.attributes.clone(),
                            text_content: current.text_content.clone(),
                            child_ids,
                            parent_id: parent,
                        },
                    );
                    self.order.push(current.id);
                }
            }

            // Reverse so pop() visits children in DOM order (pre-order).
            for child in current.children.iter().rev() {
                pending.push((child, Some(current.id)));
            }
        }
    }
}
