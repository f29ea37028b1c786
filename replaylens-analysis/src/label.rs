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

//! Action-id assignment.
//!
//! Downstream, entries get short reusable identifiers ("clicked_submit_form")
//! so usage can be counted across sessions of a project. The identifier
//! synthesis normally runs through an external language-model collaborator;
//! this module is the deterministic half: slug normalization, the fallback
//! id used when no external label arrives, and the ledger that prefers ids
//! already issued for the project (a read-only hint) and counts usage. It is
//! a pure post-processing stage over finished entries and never feeds back
//! into the DOM model.

use replaylens_core::action::{ActionKind, ActionLogEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Lowercase, underscore-joined slug: alphanumerics kept, everything else
/// (punctuation, emoji) dropped.
pub fn slugify(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            // full Unicode lowercasing; one char may map to several
            cleaned.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '_' {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Reduce a URL to `domain/first_path_segment` for id purposes. URLs
/// without a scheme (including bare paths) have no domain to anchor on and
/// condense to "unknown".
pub fn condense_url(url: &str) -> String {
    let Some((_, rest)) = url.split_once("://") else {
        return "unknown".to_string();
    };
    let rest = rest.split(['?', '#']).next().unwrap_or_default();

    let mut segments = rest.split('/').filter(|segment| !segment.is_empty());
    let Some(domain) = segments.next() else {
        return "unknown".to_string();
    };
    match segments.next() {
        Some(first) => format!("{domain}/{first}"),
        None => domain.to_string(),
    }
}

/// Deterministic identifier used when no externally synthesized label is
/// available for an entry.
pub fn fallback_action_id(entry: &ActionLogEntry) -> String {
    match entry.kind {
        ActionKind::PageLoad => {
            let url = entry.attributes.get("url").map(String::as_str).unwrap_or("");
            let condensed = slugify(&condense_url(url));
            if condensed.is_empty() {
                "page_loaded".to_string()
            } else {
                format!("page_loaded_{condensed}")
            }
        }
        ActionKind::Click => {
            let text = entry
                .attributes
                .get("text")
                .or_else(|| entry.attributes.get("title"))
                .or_else(|| entry.attributes.get("aria-label"))
                .map(String::as_str)
                .unwrap_or(&entry.element_type);
            let slug = slugify(text);
            if slug.is_empty() {
                format!("clicked_{}", slugify(&entry.element_type))
            } else {
                format!("clicked_{slug}")
            }
        }
        ActionKind::Input => {
            let label = entry
                .attributes
                .get("placeholder")
                .or_else(|| entry.attributes.get("aria-label"))
                .or_else(|| entry.attributes.get("id"))
                .map(String::as_str)
                .unwrap_or(&entry.element_type);
            format!("typed_{}", slugify(label))
        }
        ActionKind::Scroll => {
            let depth = entry
                .attributes
                .get("scroll_depth")
                .map(String::as_str)
                .unwrap_or("");
            format!("scrolled_to_{}", slugify(depth))
        }
    }
}

/// One labeled entry with its assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEntry {
    pub action_id: String,
    #[serde(flatten)]
    pub entry: ActionLogEntry,
}

/// Project-scoped action-id bookkeeping.
///
/// Seeded with ids already recorded for the project; assignment prefers an
/// existing id over minting a new one, and usage counts accumulate for the
/// batch persist that follows.
#[derive(Debug, Default)]
pub struct ActionIdLedger {
    known: HashSet<String>,
    counts: BTreeMap<String, u64>,
}

impl ActionIdLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with previously issued ids for the owning project.
    pub fn with_existing<I: IntoIterator<Item = String>>(existing: I) -> Self {
        Self {
            known: existing.into_iter().collect(),
            counts: BTreeMap::new(),
        }
    }

    /// Assign an id to an entry. `synthesized` is the externally produced
    /// label, if any; the fallback id is used otherwise. Either way an id
    /// already known to the project is reused verbatim.
    pub fn assign(&mut self, entry: &ActionLogEntry, synthesized: Option<&str>) -> LabeledEntry {
        let action_id = match synthesized {
            Some(label) => slugify(label),
            None => fallback_action_id(entry),
        };
        // Exact slug matches collapse onto the already-issued id; fresh ids
        // become reusable for the rest of the batch.
        self.known.insert(action_id.clone());
        *self.counts.entry(action_id.clone()).or_insert(0) += 1;

        LabeledEntry {
            action_id,
            entry: entry.clone(),
        }
    }

    /// Ids available for reuse, sorted for prompt stability. Handed to the
    /// external label collaborator so it prefers existing ids over minting.
    pub fn known_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.known.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Usage counts accumulated since construction, for batch persistence.
    pub fn usage_counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_strips_punctuation_and_emoji() {
        assert_eq!(slugify("View Photos!"), "view_photos");
        assert_eq!(slugify("  Add   to cart 🛒 "), "add_to_cart");
        assert_eq!(slugify("Sign-In"), "signin");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_slugify_lowercases_non_ascii() {
        assert_eq!(slugify("CAFÉ Menü"), "café_menü");
        assert_eq!(slugify("ΑΓΟΡΆ"), "αγορά");
    }

    #[test]
    fn test_condense_url() {
        assert_eq!(
            condense_url("https://shop.example.com/checkout/step-1?ref=nav"),
            "shop.example.com/checkout"
        );
        assert_eq!(condense_url("https://example.com"), "example.com");
        assert_eq!(condense_url(""), "unknown");
    }

    #[test]
    fn test_fallback_ids_per_kind() {
        let mut entry = ActionLogEntry::new(0, ActionKind::Click, "User clicked button");
        entry.element_type = "button".to_string();
        entry
            .attributes
            .insert("text".to_string(), "Submit Form".to_string());
        assert_eq!(fallback_action_id(&entry), "clicked_submit_form");

        let mut entry = ActionLogEntry::new(0, ActionKind::PageLoad, "Page loaded: x");
        entry
            .attributes
            .insert("url".to_string(), "https://example.com/pricing".to_string());
        assert_eq!(fallback_action_id(&entry), "page_loaded_examplecompricing");

        let mut entry = ActionLogEntry::new(0, ActionKind::Scroll, "User scrolled");
        entry
            .attributes
            .insert("scroll_depth".to_string(), "50%".to_string());
        assert_eq!(fallback_action_id(&entry), "scrolled_to_50");
    }

    #[test]
    fn test_ledger_reuses_existing_ids_and_counts() {
        let mut ledger =
            ActionIdLedger::with_existing(vec!["clicked_submit_form".to_string()]);

        let mut entry = ActionLogEntry::new(0, ActionKind::Click, "User clicked button");
        entry.element_type = "button".to_string();
        entry
            .attributes
            .insert("text".to_string(), "Submit Form".to_string());

        let labeled = ledger.assign(&entry, None);
        assert_eq!(labeled.action_id, "clicked_submit_form");

        ledger.assign(&entry, Some("clicked_submit_form"));
        ledger.assign(&entry, Some("Clicked Checkout"));

        assert_eq!(ledger.usage_counts().get("clicked_submit_form"), Some(&2));
        assert_eq!(ledger.usage_counts().get("clicked_checkout"), Some(&1));
        assert_eq!(
            ledger.known_ids(),
            vec!["clicked_checkout", "clicked_submit_form"]
        );
    }
}
