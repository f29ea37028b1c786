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

//! Decoding a realistic recorder batch and applying caller-side limits.

use replaylens_core::config::SessionLimits;
use replaylens_core::event::EventPayload;
use replaylens_core::wire::decode_events;
use serde_json::json;

fn recorder_batch() -> Vec<serde_json::Value> {
    vec![
        json!({"type": 4, "timestamp": 1_700_000_000_000i64, "data": {
            "href": "https://app.example.com/dashboard", "title": "Dashboard"
        }}),
        json!({"type": 2, "timestamp": 1_700_000_000_050i64, "data": {"node": {
            "id": 1, "tagName": "body", "childNodes": [
                {"id": 2, "tagName": "nav", "childNodes": [
                    {"id": 3, "tagName": "a", "attributes": {"href": "/settings"},
                     "childNodes": [{"id": 4, "textContent": "Settings"}]}
                ]},
                {"id": 5, "tagName": "input",
                 "attributes": {"placeholder": "Filter projects"}}
            ]
        }}}),
        // mouse move: recorded but never consumed
        json!({"type": 3, "timestamp": 1_700_000_000_100i64, "data": {
            "source": 1, "positions": [{"x": 10, "y": 20, "id": 1}]
        }}),
        json!({"type": 3, "timestamp": 1_700_000_000_200i64, "data": {
            "source": 3, "id": 1, "x": 0, "y": 480.0, "documentHeight": 2400.0
        }}),
        json!({"type": 3, "timestamp": 1_700_000_000_300i64, "data": {
            "source": 5, "id": 5, "text": "repla", "isChecked": false
        }}),
        json!({"type": 3, "timestamp": 1_700_000_000_400i64, "data": {
            "source": 2, "type": 2, "id": 3
        }}),
        // truncated capture: click without a target id
        json!({"type": 3, "timestamp": 1_700_000_000_500i64, "data": {
            "source": 2, "type": 2
        }}),
    ]
}

#[test]
fn test_decode_realistic_batch() {
    let (events, stats) = decode_events(&recorder_batch());

    assert_eq!(stats.decoded, 5);
    assert_eq!(stats.skipped_unsupported, 1);
    assert_eq!(stats.skipped_malformed, 1);

    assert!(matches!(events[0].payload, EventPayload::Navigation(_)));
    assert!(matches!(events[1].payload, EventPayload::Snapshot(_)));
    assert!(matches!(events[2].payload, EventPayload::Scroll(_)));
    assert!(matches!(events[3].payload, EventPayload::Input(_)));
    assert!(matches!(events[4].payload, EventPayload::Click(_)));

    let EventPayload::Snapshot(root) = &events[1].payload else {
        panic!("expected snapshot");
    };
    let nav = &root.children[0];
    let link = &nav.children[0];
    assert_eq!(link.tag_name, "a");
    // tagless text child folds into the anchor itself
    assert_eq!(link.text_content.as_deref(), Some("Settings"));

    let EventPayload::Input(input) = &events[3].payload else {
        panic!("expected input");
    };
    assert_eq!(input.value, "repla");
}

#[test]
fn test_session_guard_over_decoded_events() {
    let (events, _) = decode_events(&recorder_batch());

    assert!(!SessionLimits::default().exceeds_max_duration(&events));
    // batch spans 500ms; a 400ms ceiling refuses it
    assert!(SessionLimits::new(400).exceeds_max_duration(&events));
}
