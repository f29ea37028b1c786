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

//! Visible-element scanning and the significance test.
//!
//! A scan enumerates every currently interesting element (clickable or form
//! field) as a description string, in document order with exact duplicates
//! removed. Scans run fresh at every candidate action point; the
//! significance test decides whether the result differs enough from the
//! previous baseline to be worth attaching to an entry.

use crate::describe::{describe, is_clickable, is_form_field, PLACEHOLDER_PREFIX};
use crate::dom::DomModel;
use replaylens_core::config::EngineConfig;

/// Substrings whose appearance in a new element always makes a scan
/// significant.
const NOTABLE_MARKERS: [&str; 3] = ["button", "link", "input"];

/// Describe every clickable or form element currently in the model.
pub fn scan(model: &DomModel, config: &EngineConfig) -> Vec<String> {
    let mut descriptions: Vec<String> = Vec::new();

    for node in model.iter() {
        if !is_clickable(node) && !is_form_field(node) {
            continue;
        }
        let Some(label) = describe(model, node.id, config) else {
            continue;
        };
        let rendered = match label.strip_prefix(PLACEHOLDER_PREFIX) {
            Some(placeholder) => format!(
                "Element '{}' with placeholder '{}'",
                node.tag_name, placeholder
            ),
            None => format!("Element '{}' with text '{}'", node.tag_name, label),
        };
        if !descriptions.contains(&rendered) {
            descriptions.push(rendered);
        }
    }

    descriptions
}

/// Whether `current` differs enough from the `previous` baseline to attach.
pub fn is_significant(
    current: &[String],
    previous: &[String],
    current_url: &str,
    previous_url: &str,
    config: &EngineConfig,
) -> bool {
    if current_url != previous_url {
        return true;
    }
    if previous.is_empty() {
        return true;
    }

    let delta = current.len().abs_diff(previous.len());
    if delta as f64 > config.visibility_delta_ratio * previous.len() as f64 {
        return true;
    }

    current.iter().any(|element| {
        !previous.contains(element) && {
            let lowered = element.to_lowercase();
            NOTABLE_MARKERS.iter().any(|marker| lowered.contains(marker))
        }
    })
}
