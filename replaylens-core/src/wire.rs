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

//! Tolerant decoding of recorder JSON into [`RawEvent`]s.
//!
//! The recorder emits rrweb-style records: `type` 2 is a full snapshot,
//! `type` 3 an incremental batch distinguished by `data.source` (0 mutation,
//! 2 mouse interaction where `data.type` 2 is a click, 3 scroll, 5 input),
//! and `type` 4 a navigation marker. Everything else is irrelevant to action
//! derivation and decodes to `None`. Partial or truncated capture is
//! expected, so malformed records are reported through [`DecodeStats`] and
//! never abort a batch.

use crate::error::{ReplaylensError, Result};
use crate::event::{
    AttributeUpdate, EventPayload, InputChange, MutationAdd, MutationBatch, Navigation,
    PointerClick, RawEvent, ScrollPosition, SnapshotNode, TextUpdate,
};
use serde_json::Value;
use std::collections::BTreeMap;

const TYPE_FULL_SNAPSHOT: u64 = 2;
const TYPE_INCREMENTAL: u64 = 3;
const TYPE_META: u64 = 4;

const SOURCE_MUTATION: u64 = 0;
const SOURCE_MOUSE_INTERACTION: u64 = 2;
const SOURCE_SCROLL: u64 = 3;
const SOURCE_INPUT: u64 = 5;

const MOUSE_INTERACTION_CLICK: u64 = 2;

/// Counters for one decode pass, for caller-side diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Records decoded into events.
    pub decoded: usize,
    /// Records of types the engine does not consume (mouse moves, viewport
    /// resizes, custom records).
    pub skipped_unsupported: usize,
    /// Records missing required fields.
    pub skipped_malformed: usize,
}

/// Decode a whole batch, swallowing per-record failures into the stats.
pub fn decode_events(records: &[Value]) -> (Vec<RawEvent>, DecodeStats) {
    let mut events = Vec::with_capacity(records.len());
    let mut stats = DecodeStats::default();

    for record in records {
        match decode_record(record) {
            Ok(Some(event)) => {
                stats.decoded += 1;
                events.push(event);
            }
            Ok(None) => stats.skipped_unsupported += 1,
            Err(err) => {
                stats.skipped_malformed += 1;
                tracing::debug!(error = %err, "skipping malformed replay record");
            }
        }
    }

    (events, stats)
}

/// Decode one record. `Ok(None)` means the record type is not consumed by
/// the engine; `Err` means a consumed type is missing required fields.
pub fn decode_record(record: &Value) -> Result<Option<RawEvent>> {
    let record_type = record
        .get("type")
        .and_then(Value::as_u64)
        .ok_or(ReplaylensError::MissingField("type"))?;
    let timestamp_ms = record
        .get("timestamp")
        .and_then(Value::as_i64)
        .ok_or(ReplaylensError::MissingField("timestamp"))?;
    let data = record.get("data").unwrap_or(&Value::Null);

    let payload = match record_type {
        TYPE_FULL_SNAPSHOT => {
            let node = data
                .get("node")
                .and_then(decode_node)
                .ok_or(ReplaylensError::MissingField("node"))?;
            Some(EventPayload::Snapshot(node))
        }
        TYPE_INCREMENTAL => decode_incremental(data)?,
        TYPE_META => {
            let url = data
                .get("href")
                .and_then(Value::as_str)
                .ok_or(ReplaylensError::MissingField("href"))?;
            Some(EventPayload::Navigation(Navigation {
                url: url.to_string(),
                title: data
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }))
        }
        _ => None,
    };

    Ok(payload.map(|payload| RawEvent::new(timestamp_ms, payload)))
}

fn decode_incremental(data: &Value) -> Result<Option<EventPayload>> {
    let source = data
        .get("source")
        .and_then(Value::as_u64)
        .ok_or(ReplaylensError::MissingField("source"))?;

    let payload = match source {
        SOURCE_MUTATION => Some(EventPayload::Mutation(decode_mutation(data))),
        SOURCE_MOUSE_INTERACTION => {
            let interaction = data.get("type").and_then(Value::as_u64);
            if interaction != Some(MOUSE_INTERACTION_CLICK) {
                return Ok(None);
            }
            let target_id = data
                .get("id")
                .and_then(Value::as_u64)
                .ok_or(ReplaylensError::MissingField("id"))?;
            Some(EventPayload::Click(PointerClick { target_id }))
        }
        SOURCE_SCROLL => {
            let y = data
                .get("y")
                .and_then(Value::as_f64)
                .ok_or(ReplaylensError::MissingField("y"))?;
            let document_height = data
                .get("documentHeight")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            Some(EventPayload::Scroll(ScrollPosition { y, document_height }))
        }
        SOURCE_INPUT => {
            let target_id = data
                .get("id")
                .and_then(Value::as_u64)
                .ok_or(ReplaylensError::MissingField("id"))?;
            let value = data
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(EventPayload::Input(InputChange { target_id, value }))
        }
        _ => None,
    };

    Ok(payload)
}

fn decode_mutation(data: &Value) -> MutationBatch {
    let mut batch = MutationBatch::default();

    if let Some(adds) = data.get("adds").and_then(Value::as_array) {
        for add in adds {
            if let Some(node) = add.get("node").and_then(decode_node) {
                batch.adds.push(MutationAdd {
                    parent_id: add.get("parentId").and_then(Value::as_u64),
                    node,
                });
            }
        }
    }
    if let Some(removes) = data.get("removes").and_then(Value::as_array) {
        for remove in removes {
            if let Some(id) = remove.get("id").and_then(Value::as_u64) {
                batch.removes.push(id);
            }
        }
    }
    if let Some(texts) = data.get("texts").and_then(Value::as_array) {
        for text in texts {
            if let Some(id) = text.get("id").and_then(Value::as_u64) {
                batch.texts.push(TextUpdate {
                    id,
                    value: text.get("value").and_then(Value::as_str).map(str::to_string),
                });
            }
        }
    }
    if let Some(attributes) = data.get("attributes").and_then(Value::as_array) {
        for attr in attributes {
            let Some(id) = attr.get("id").and_then(Value::as_u64) else {
                continue;
            };
            if let Some(changed) = attr.get("attributes").and_then(Value::as_object) {
                batch.attributes.push(AttributeUpdate {
                    id,
                    attributes: attribute_map(changed),
                });
            }
        }
    }

    batch
}

/// Decode one serialized element subtree.
///
/// Child records without a tag are text nodes; their content folds into the
/// parent's `text_content`, since the model tracks elements only.
fn decode_node(value: &Value) -> Option<SnapshotNode> {
    let id = value.get("id").and_then(Value::as_u64)?;
    let tag_name = value
        .get("tagName")
        .and_then(Value::as_str)?
        .to_lowercase();

    let attributes = value
        .get("attributes")
        .and_then(Value::as_object)
        .map(attribute_map)
        .unwrap_or_default();

    let mut text_parts: Vec<String> = Vec::new();
    if let Some(text) = value.get("textContent").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            text_parts.push(text.trim().to_string());
        }
    }

    let mut children = Vec::new();
    if let Some(child_values) = value.get("childNodes").and_then(Value::as_array) {
        for child in child_values {
            if child.get("tagName").is_some() {
                if let Some(node) = decode_node(child) {
                    children.push(node);
                }
            } else if let Some(text) = child.get("textContent").and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    text_parts.push(text.trim().to_string());
                }
            }
        }
    }

    Some(SnapshotNode {
        id,
        tag_name,
        attributes,
        text_content: if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join(" "))
        },
        children,
    })
}

fn attribute_map(object: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((name.clone(), rendered))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_snapshot() {
        let record = json!({
            "type": 2,
            "timestamp": 1000,
            "data": {
                "node": {
                    "id": 1,
                    "tagName": "DIV",
                    "childNodes": [
                        {
                            "id": 2,
                            "tagName": "button",
                            "attributes": {"type": "submit", "tabindex": 3},
                            "childNodes": [
                                {"id": 3, "textContent": "  Submit  "}
                            ]
                        }
                    ]
                }
            }
        });

        let event = decode_record(&record).unwrap().unwrap();
        assert_eq!(event.timestamp_ms, 1000);
        let EventPayload::Snapshot(root) = event.payload else {
            panic!("expected snapshot");
        };
        assert_eq!(root.tag_name, "div");
        assert_eq!(root.children.len(), 1);
        let button = &root.children[0];
        assert_eq!(button.text_content.as_deref(), Some("Submit"));
        assert_eq!(button.attributes.get("tabindex").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_decode_click_and_input() {
        let click = json!({
            "type": 3,
            "timestamp": 2000,
            "data": {"source": 2, "type": 2, "id": 7}
        });
        let event = decode_record(&click).unwrap().unwrap();
        assert_eq!(
            event.payload,
            EventPayload::Click(PointerClick { target_id: 7 })
        );

        let input = json!({
            "type": 3,
            "timestamp": 2100,
            "data": {"source": 5, "id": 9, "text": "hello"}
        });
        let event = decode_record(&input).unwrap().unwrap();
        assert_eq!(
            event.payload,
            EventPayload::Input(InputChange {
                target_id: 9,
                value: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_non_click_mouse_interaction_skipped() {
        // type 1 is mouseup in the recorder's interaction table
        let record = json!({
            "type": 3,
            "timestamp": 2000,
            "data": {"source": 2, "type": 1, "id": 7}
        });
        assert!(decode_record(&record).unwrap().is_none());
    }

    #[test]
    fn test_decode_navigation() {
        let record = json!({
            "type": 4,
            "timestamp": 500,
            "data": {"href": "https://example.com/checkout", "title": "Checkout"}
        });
        let event = decode_record(&record).unwrap().unwrap();
        let EventPayload::Navigation(nav) = event.payload else {
            panic!("expected navigation");
        };
        assert_eq!(nav.url, "https://example.com/checkout");
        assert_eq!(nav.title.as_deref(), Some("Checkout"));
    }

    #[test]
    fn test_decode_mutation_batch() {
        let record = json!({
            "type": 3,
            "timestamp": 3000,
            "data": {
                "source": 0,
                "adds": [{"parentId": 1, "node": {"id": 10, "tagName": "span", "textContent": "new"}}],
                "removes": [{"id": 4}],
                "texts": [{"id": 2, "value": "updated"}],
                "attributes": [{"id": 2, "attributes": {"class": "active"}}]
            }
        });
        let event = decode_record(&record).unwrap().unwrap();
        let EventPayload::Mutation(batch) = event.payload else {
            panic!("expected mutation");
        };
        assert_eq!(batch.adds.len(), 1);
        assert_eq!(batch.adds[0].parent_id, Some(1));
        assert_eq!(batch.removes, vec![4]);
        assert_eq!(batch.texts[0].value.as_deref(), Some("updated"));
        assert_eq!(
            batch.attributes[0].attributes.get("class").map(String::as_str),
            Some("active")
        );
    }

    #[test]
    fn test_decode_events_counts_failures() {
        let records = vec![
            json!({"type": 4, "timestamp": 0, "data": {"href": "/a"}}),
            json!({"type": 4, "timestamp": 1}),
            json!({"type": 0, "timestamp": 2}),
            json!({"type": 3, "timestamp": 3, "data": {"source": 1}}),
        ];
        let (events, stats) = decode_events(&records);
        assert_eq!(events.len(), 1);
        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.skipped_malformed, 1);
        assert_eq!(stats.skipped_unsupported, 2);
    }

    proptest::proptest! {
        #[test]
        fn prop_decode_record_never_panics(
            record_type in 0u64..8,
            source in 0u64..12,
            timestamp in 0i64..10_000_000,
        ) {
            let record = json!({
                "type": record_type,
                "timestamp": timestamp,
                "data": {"source": source}
            });
            let _ = decode_record(&record);
        }

        #[test]
        fn prop_decode_stats_account_for_every_record(
            shapes in proptest::collection::vec((0u64..8, 0u64..12), 0..40),
        ) {
            let records: Vec<Value> = shapes
                .iter()
                .map(|(record_type, source)| {
                    json!({
                        "type": record_type,
                        "timestamp": 0,
                        "data": {"source": source, "href": "/a", "id": 1, "y": 0.0,
                                 "node": {"id": 1, "tagName": "div"}}
                    })
                })
                .collect();

            let (events, stats) = decode_events(&records);
            proptest::prop_assert_eq!(events.len(), stats.decoded);
            proptest::prop_assert_eq!(
                stats.decoded + stats.skipped_unsupported + stats.skipped_malformed,
                records.len()
            );
        }
    }

    #[test]
    fn test_scroll_without_height_decodes_with_zero() {
        let record = json!({
            "type": 3,
            "timestamp": 100,
            "data": {"source": 3, "id": 1, "x": 0, "y": 250}
        });
        let event = decode_record(&record).unwrap().unwrap();
        let EventPayload::Scroll(scroll) = event.payload else {
            panic!("expected scroll");
        };
        assert_eq!(scroll.y, 250.0);
        assert_eq!(scroll.document_height, 0.0);
    }
}
