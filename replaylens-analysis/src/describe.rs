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

//! Human-readable element labels.
//!
//! Attribute-priority heuristic: images label by alt/filename, then
//! aria-label/title/placeholder for any tag, then aggregated descendant
//! text, then (for links and buttons) child/grandchild/ancestor text, then
//! value and `data-*` labels, then the bare tag. Text aggregation is a
//! bounded-depth traversal over the arena by id lookup, never object
//! recursion, so it stays consistent with removal semantics.

use crate::dom::{DomModel, DomNode};
use replaylens_core::config::EngineConfig;
use std::collections::BTreeMap;

/// Descriptor prefix marking a placeholder-derived label; callers phrase
/// these differently ("with placeholder '...'" instead of "with text '...'").
pub const PLACEHOLDER_PREFIX: &str = "placeholder: ";

/// Attributes considered semantic enough to carry into action-log entries.
const SEMANTIC_ATTRIBUTES: [&str; 6] = ["id", "placeholder", "title", "alt", "aria-label", "href"];

/// Tags whose elements accept text input.
pub fn is_form_field(node: &DomNode) -> bool {
    matches!(node.tag_name.as_str(), "input" | "textarea" | "select")
}

/// Clickability predicate: button/anchor tags, `role="button"`, or
/// `type="submit"`.
pub fn is_clickable(node: &DomNode) -> bool {
    matches!(node.tag_name.as_str(), "button" | "a")
        || node.attributes.get("role").is_some_and(|role| role == "button")
        || node.attributes.get("type").is_some_and(|ty| ty == "submit")
}

/// Derive a label for a node. `None` only when the node is absent or has no
/// tag; such elements are excluded from visibility summaries and their
/// clicks are dropped.
pub fn describe(model: &DomModel, id: u64, config: &EngineConfig) -> Option<String> {
    let node = model.get(id)?;
    if node.tag_name.is_empty() {
        return None;
    }

    // 1. Images: alt text, else filename from src.
    if node.tag_name == "img" {
        if let Some(alt) = non_empty_attribute(node, "alt") {
            return Some(alt);
        }
        if let Some(src) = non_empty_attribute(node, "src") {
            return Some(format!("image: {}", filename_of(&src)));
        }
    }

    // 2. Explicit labels, any tag.
    if let Some(label) = non_empty_attribute(node, "aria-label") {
        return Some(label);
    }
    if let Some(title) = non_empty_attribute(node, "title") {
        return Some(title);
    }
    if let Some(placeholder) = non_empty_attribute(node, "placeholder") {
        return Some(format!("{PLACEHOLDER_PREFIX}{placeholder}"));
    }

    // 3. Aggregated descendant text.
    let text = collect_text(model, id, config.max_text_depth);
    if !text.is_empty() {
        return Some(text);
    }

    // 4. Links/buttons without their own text: look at children, then
    //    grandchildren, then the nearest short-text ancestor.
    if matches!(node.tag_name.as_str(), "a" | "button") {
        if let Some(text) = nearby_text(model, node, config) {
            return Some(text);
        }
    }

    // 5. Value and data-* labels.
    if let Some(value) = non_empty_attribute(node, "value") {
        return Some(value);
    }
    for data_key in ["data-text", "data-label", "data-title"] {
        if let Some(value) = non_empty_attribute(node, data_key) {
            return Some(value);
        }
    }

    // 6. Bare tag fallback.
    Some(match node.tag_name.as_str() {
        "button" => "button".to_string(),
        "a" => "link".to_string(),
        tag => tag.to_string(),
    })
}

/// The original's semantic attribute subset, attached to emitted entries.
pub fn semantic_attributes(
    model: &DomModel,
    id: u64,
    config: &EngineConfig,
) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let Some(node) = model.get(id) else {
        return attributes;
    };

    for key in SEMANTIC_ATTRIBUTES {
        if let Some(value) = non_empty_attribute(node, key) {
            attributes.insert(key.to_string(), value);
        }
    }

    let text = collect_text(model, id, config.max_text_depth);
    if !text.is_empty() {
        attributes.insert("text".to_string(), text);
    }

    attributes
}

/// Whitespace-normalized, deduplicated text of a node and its descendants,
/// gathered by bounded-depth pre-order traversal over the arena.
pub fn collect_text(model: &DomModel, id: u64, max_depth: usize) -> String {
    let mut fragments: Vec<String> = Vec::new();
    let mut stack: Vec<(u64, usize)> = vec![(id, 0)];

    while let Some((current, depth)) = stack.pop() {
        let Some(node) = model.get(current) else {
            continue;
        };
        if let Some(text) = &node.text_content {
            let normalized = normalize_whitespace(text);
            if !normalized.is_empty() && !fragments.contains(&normalized) {
                fragments.push(normalized);
            }
        }
        if depth < max_depth {
            for child in node.child_ids.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }

    fragments.join(" ")
}

fn nearby_text(model: &DomModel, node: &DomNode, config: &EngineConfig) -> Option<String> {
    // Immediate children first, then grandchildren.
    for depth in [1usize, 2] {
        let text = collect_text_at_depth(model, node, depth);
        if !text.is_empty() {
            return Some(text);
        }
    }

    // Nearest ancestor with usable, reasonably short text.
    let mut ancestor = node.parent_id;
    while let Some(id) = ancestor {
        let Some(parent) = model.get(id) else {
            break;
        };
        let text = collect_text(model, id, config.max_text_depth);
        if !text.is_empty() {
            if text.chars().count() < config.ancestor_text_limit {
                return Some(text);
            }
            return None;
        }
        ancestor = parent.parent_id;
    }

    None
}

/// Immediate text of descendants at exactly `depth` levels below the node.
fn collect_text_at_depth(model: &DomModel, node: &DomNode, depth: usize) -> String {
    let mut level: Vec<u64> = node.child_ids.clone();
    for _ in 1..depth {
        level = level
            .iter()
            .filter_map(|id| model.get(*id))
            .flat_map(|child| child.child_ids.iter().copied())
            .collect();
    }

    let mut fragments: Vec<String> = Vec::new();
    for id in level {
        if let Some(text) = model.get(id).and_then(|child| child.text_content.as_deref()) {
            let normalized = normalize_whitespace(text);
            if !normalized.is_empty() && !fragments.contains(&normalized) {
                fragments.push(normalized);
            }
        }
    }
    fragments.join(" ")
}

fn non_empty_attribute(node: &DomNode, name: &str) -> Option<String> {
    node.attributes
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn filename_of(src: &str) -> String {
    let trimmed = src
        .split(['?', '#'])
        .next()
        .unwrap_or(src)
        .trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if name.is_empty() {
        "image".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replaylens_core::event::SnapshotNode;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn model_of(root: SnapshotNode) -> DomModel {
        let mut model = DomModel::new();
        model.build(&root);
        model
    }

    #[test]
    fn test_image_labels() {
        let model = model_of(
            SnapshotNode::element(1, "div")
                .with_child(SnapshotNode::element(2, "img").with_attribute("alt", "Company logo"))
                .with_child(
                    SnapshotNode::element(3, "img")
                        .with_attribute("src", "https://cdn.example.com/img/hero.png?w=800"),
                ),
        );

        assert_eq!(describe(&model, 2, &config()).as_deref(), Some("Company logo"));
        assert_eq!(describe(&model, 3, &config()).as_deref(), Some("image: hero.png"));
    }

    #[test]
    fn test_label_attribute_priority() {
        let model = model_of(
            SnapshotNode::element(1, "input")
                .with_attribute("aria-label", "Search")
                .with_attribute("title", "Search box")
                .with_attribute("placeholder", "Type to search"),
        );
        assert_eq!(describe(&model, 1, &config()).as_deref(), Some("Search"));

        let model = model_of(
            SnapshotNode::element(1, "input").with_attribute("placeholder", "Email address"),
        );
        assert_eq!(
            describe(&model, 1, &config()).as_deref(),
            Some("placeholder: Email address")
        );
    }

    #[test]
    fn test_descendant_text_normalized_and_deduplicated() {
        let model = model_of(
            SnapshotNode::element(1, "button")
                .with_child(SnapshotNode::element(2, "span").with_text("  Add to \n cart "))
                .with_child(SnapshotNode::element(3, "span").with_text("Add to cart")),
        );
        assert_eq!(describe(&model, 1, &config()).as_deref(), Some("Add to cart"));
    }

    #[test]
    fn test_ancestor_text_for_bare_link() {
        let model = model_of(
            SnapshotNode::element(1, "li")
                .with_text("Pricing")
                .with_child(SnapshotNode::element(2, "a").with_attribute("href", "/pricing")),
        );
        assert_eq!(describe(&model, 2, &config()).as_deref(), Some("Pricing"));
    }

    #[test]
    fn test_long_ancestor_text_rejected() {
        let long_text = "word ".repeat(40);
        let model = model_of(
            SnapshotNode::element(1, "p")
                .with_text(long_text)
                .with_child(SnapshotNode::element(2, "a")),
        );
        // falls through to the tag fallback
        assert_eq!(describe(&model, 2, &config()).as_deref(), Some("link"));
    }

    #[test]
    fn test_value_and_data_labels() {
        let model = model_of(SnapshotNode::element(1, "input").with_attribute("value", "42"));
        assert_eq!(describe(&model, 1, &config()).as_deref(), Some("42"));

        let model = model_of(
            SnapshotNode::element(1, "div").with_attribute("data-label", "Expand section"),
        );
        assert_eq!(describe(&model, 1, &config()).as_deref(), Some("Expand section"));
    }

    #[test]
    fn test_tag_fallbacks() {
        let model = model_of(SnapshotNode::element(1, "button"));
        assert_eq!(describe(&model, 1, &config()).as_deref(), Some("button"));

        let model = model_of(SnapshotNode::element(1, "select"));
        assert_eq!(describe(&model, 1, &config()).as_deref(), Some("select"));
    }

    #[test]
    fn test_missing_node_is_absent() {
        let model = DomModel::new();
        assert_eq!(describe(&model, 7, &config()), None);
    }

    #[test]
    fn test_clickability_predicate() {
        let model = model_of(
            SnapshotNode::element(1, "div")
                .with_child(SnapshotNode::element(2, "a"))
                .with_child(SnapshotNode::element(3, "div").with_attribute("role", "button"))
                .with_child(SnapshotNode::element(4, "input").with_attribute("type", "submit"))
                .with_child(SnapshotNode::element(5, "span")),
        );

        assert!(is_clickable(model.get(2).unwrap()));
        assert!(is_clickable(model.get(3).unwrap()));
        assert!(is_clickable(model.get(4).unwrap()));
        assert!(!is_clickable(model.get(5).unwrap()));
        assert!(!is_clickable(model.get(1).unwrap()));
    }

    #[test]
    fn test_semantic_attributes_subset() {
        let model = model_of(
            SnapshotNode::element(1, "a")
                .with_attribute("href", "/docs")
                .with_attribute("class", "nav-item")
                .with_text("Documentation"),
        );
        let attributes = semantic_attributes(&model, 1, &config());
        assert_eq!(attributes.get("href").map(String::as_str), Some("/docs"));
        assert_eq!(attributes.get("text").map(String::as_str), Some("Documentation"));
        assert!(!attributes.contains_key("class"));
    }

    #[test]
    fn test_text_depth_bound() {
        let mut root = SnapshotNode::element(1, "div");
        let mut current = SnapshotNode::element(100, "span").with_text("deep");
        for id in (2..40).rev() {
            current = SnapshotNode::element(id, "div").with_child(current);
        }
        root = root.with_child(current);
        let model = model_of(root);

        assert_eq!(collect_text(&model, 1, 32), "");
        assert_eq!(collect_text(&model, 1, 64), "deep");
    }
}
