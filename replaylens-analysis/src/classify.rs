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

//! Event classification.
//!
//! Walks the sorted event stream, keeps the DOM model current on
//! snapshot/mutation events, and turns interaction events into tentative
//! action entries. Page loads are staged as pending and materialized lazily
//! at the next committed action (or end of stream), so their entries land at
//! the timestamp the navigation happened while still carrying a usable
//! visibility scan.
//!
//! Nothing here is fatal: clicks on unresolvable or non-clickable targets
//! are dropped, scrolls without a document height are skipped, and an empty
//! batch yields an empty log.

use crate::describe::{describe, is_clickable, semantic_attributes, PLACEHOLDER_PREFIX};
use crate::dom::DomModel;
use crate::suppress::{InputDebouncer, InputDecision};
use crate::visibility::{is_significant, scan};
use replaylens_core::action::{ActionKind, ActionLogEntry, PendingPageLoad, NO_SIGNIFICANT_CHANGE};
use replaylens_core::config::EngineConfig;
use replaylens_core::event::{
    EventPayload, InputChange, MutationBatch, Navigation, PointerClick, RawEvent, ScrollPosition,
};

/// Scroll depth quantization factor: bucket = floor(clamp(y/height, 0, 1) * 4),
/// yielding buckets 0 through 4.
const SCROLL_BUCKET_DIVISIONS: usize = 4;

/// Classify a complete event batch into tentative action entries.
///
/// Events are sorted defensively by timestamp; entry timestamps are offsets
/// from the first event. The result still contains consecutive same-kind
/// runs; callers feed it through the suppressor's collapse pass.
pub fn classify_events(events: &[RawEvent], config: &EngineConfig) -> Vec<ActionLogEntry> {
    let mut sorted: Vec<&RawEvent> = events.iter().collect();
    sorted.sort_by_key(|event| event.timestamp_ms);

    let Some(first) = sorted.first() else {
        return Vec::new();
    };

    let mut classifier = Classifier::new(config, first.timestamp_ms);

    // Stage the first navigation before any snapshot applies, so the initial
    // page load is associated with the document that snapshot describes. An
    // interaction ahead of the first navigation ends the scan: staging past
    // it would flush a later-stamped page load before an earlier action.
    for event in &sorted {
        match &event.payload {
            EventPayload::Navigation(navigation) => {
                classifier.stage_page_load(navigation, event.timestamp_ms);
                break;
            }
            _ if event.is_interaction() => break,
            _ => {}
        }
    }

    for event in sorted {
        classifier.process(event);
    }

    classifier.finish()
}

struct Classifier<'a> {
    config: &'a EngineConfig,
    base_ms: i64,
    model: DomModel,
    current_url: String,
    pending: Option<PendingPageLoad>,
    /// Visibility baseline: last significant scan and the URL it was taken
    /// on. Advances only when a committed action's significance test passes;
    /// pending page-load flushes read it but never write it.
    baseline: Vec<String>,
    baseline_url: String,
    debouncer: InputDebouncer,
    last_scroll_bucket: Option<usize>,
    entries: Vec<ActionLogEntry>,
}

impl<'a> Classifier<'a> {
    fn new(config: &'a EngineConfig, base_ms: i64) -> Self {
        Self {
            config,
            base_ms,
            model: DomModel::new(),
            current_url: String::new(),
            pending: None,
            baseline: Vec::new(),
            baseline_url: String::new(),
            debouncer: InputDebouncer::new(),
            last_scroll_bucket: None,
            entries: Vec::new(),
        }
    }

    fn process(&mut self, event: &RawEvent) {
        let offset_ms = event.timestamp_ms - self.base_ms;
        match &event.payload {
            EventPayload::Snapshot(root) => self.model.build(root),
            EventPayload::Navigation(navigation) => self.handle_navigation(navigation, event.timestamp_ms),
            EventPayload::Mutation(batch) => self.apply_mutation(batch),
            EventPayload::Click(click) => self.handle_click(click, offset_ms),
            EventPayload::Input(input) => self.handle_input(input, event.timestamp_ms, offset_ms),
            EventPayload::Scroll(scroll) => self.handle_scroll(scroll, offset_ms),
        }
    }

    fn finish(mut self) -> Vec<ActionLogEntry> {
        self.flush_pending();
        self.entries
    }

    fn handle_navigation(&mut self, navigation: &Navigation, timestamp_ms: i64) {
        if navigation.url == self.current_url {
            return;
        }
        // Two navigations with no committed action between them: the first
        // page load still belongs in the log, in causal order.
        self.flush_pending();
        self.model.clear();
        self.stage_page_load(navigation, timestamp_ms);
    }

    fn stage_page_load(&mut self, navigation: &Navigation, timestamp_ms: i64) {
        self.current_url = navigation.url.clone();
        self.pending = Some(PendingPageLoad {
            url: navigation.url.clone(),
            timestamp_ms: timestamp_ms - self.base_ms,
            title: navigation.title.clone(),
        });
    }

    fn apply_mutation(&mut self, batch: &MutationBatch) {
        for add in &batch.adds {
            self.model.apply_add(&add.node, add.parent_id);
        }
        for id in &batch.removes {
            self.model.apply_remove(*id);
        }
        for text in &batch.texts {
            self.model.set_text(text.id, text.value.as_deref());
        }
        for update in &batch.attributes {
            self.model.set_attributes(update.id, &update.attributes);
        }
    }

    fn handle_click(&mut self, click: &PointerClick, offset_ms: i64) {
        let Some(node) = self.model.get(click.target_id) else {
            tracing::debug!(target_id = click.target_id, "dropping click on unresolvable target");
            return;
        };
        if !is_clickable(node) {
            return;
        }
        let tag = node.tag_name.clone();
        let Some(label) = describe(&self.model, click.target_id, self.config) else {
            return;
        };

        self.flush_pending();

        let action = match label.strip_prefix(PLACEHOLDER_PREFIX) {
            Some(placeholder) => {
                format!("User clicked {tag} with placeholder '{placeholder}'")
            }
            None => format!("User clicked {tag} with text '{label}'"),
        };

        let mut entry = ActionLogEntry::new(offset_ms, ActionKind::Click, action);
        entry.element_type = tag;
        entry.attributes = semantic_attributes(&self.model, click.target_id, self.config);
        entry.elements_on_screen = self.commit_context();
        self.entries.push(entry);
    }

    fn handle_input(&mut self, input: &InputChange, timestamp_ms: i64, offset_ms: i64) {
        let Some(node) = self.model.get(input.target_id) else {
            tracing::debug!(target_id = input.target_id, "dropping input on unresolvable target");
            return;
        };
        let tag = node.tag_name.clone();
        let original_hint = node.attributes.get("value").cloned();

        let decision = self.debouncer.observe(
            input.target_id,
            &input.value,
            timestamp_ms,
            original_hint.as_deref(),
            self.config,
        );

        let action = match decision {
            InputDecision::NoChange | InputDecision::Suppressed => return,
            InputDecision::Typed(value) => {
                format!("User typed '{value}' in the {} field", self.field_label(input.target_id, &tag))
            }
            InputDecision::Cleared => {
                format!("User cleared the {} field", self.field_label(input.target_id, &tag))
            }
        };

        self.flush_pending();

        let mut entry = ActionLogEntry::new(offset_ms, ActionKind::Input, action);
        entry.element_type = tag;
        entry.attributes = semantic_attributes(&self.model, input.target_id, self.config);
        entry
            .attributes
            .insert("input_value".to_string(), input.value.clone());
        entry.elements_on_screen = self.commit_context();
        self.entries.push(entry);
    }

    fn handle_scroll(&mut self, scroll: &ScrollPosition, offset_ms: i64) {
        if scroll.document_height <= 0.0 {
            tracing::trace!("skipping scroll event without document height");
            return;
        }

        let ratio = (scroll.y / scroll.document_height).clamp(0.0, 1.0);
        let bucket = (ratio * SCROLL_BUCKET_DIVISIONS as f64).floor() as usize;
        if self.last_scroll_bucket == Some(bucket) {
            return;
        }
        self.last_scroll_bucket = Some(bucket);

        self.flush_pending();

        let mut entry = ActionLogEntry::new(
            offset_ms,
            ActionKind::Scroll,
            format!("User scrolled to {}", bucket_label(bucket)),
        );
        entry.element_type = "scroll".to_string();
        entry
            .attributes
            .insert("scroll_depth".to_string(), format!("{}%", bucket * 25));
        entry.elements_on_screen = self.commit_context();
        self.entries.push(entry);
    }

    /// Materialize the staged page load, if any. Its visibility context is
    /// computed once, here, against the pre-flush baseline; the baseline
    /// itself advances with the committed action that triggered the flush.
    fn flush_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let current = scan(&self.model, self.config);
        let significant = is_significant(
            &current,
            &self.baseline,
            &self.current_url,
            &self.baseline_url,
            self.config,
        );

        let mut entry = ActionLogEntry::new(
            pending.timestamp_ms,
            ActionKind::PageLoad,
            format!("Page loaded: {}", pending.url),
        );
        entry.element_type = "page".to_string();
        entry.attributes.insert("url".to_string(), pending.url);
        if let Some(title) = pending.title {
            entry.attributes.insert("title".to_string(), title);
        }
        entry.elements_on_screen = if significant {
            current
        } else {
            vec![NO_SIGNIFICANT_CHANGE.to_string()]
        };
        self.entries.push(entry);
    }

    /// Scan visibility for a committed action and advance the baseline when
    /// the result is significant.
    fn commit_context(&mut self) -> Vec<String> {
        let current = scan(&self.model, self.config);
        let significant = is_significant(
            &current,
            &self.baseline,
            &self.current_url,
            &self.baseline_url,
            self.config,
        );

        if significant {
            self.baseline = current.clone();
            self.baseline_url = self.current_url.clone();
            current
        } else {
            vec![NO_SIGNIFICANT_CHANGE.to_string()]
        }
    }

    fn field_label(&self, id: u64, tag: &str) -> String {
        match describe(&self.model, id, self.config) {
            Some(label) => match label.strip_prefix(PLACEHOLDER_PREFIX) {
                Some(placeholder) => placeholder.to_string(),
                None => label,
            },
            None => tag.to_string(),
        }
    }
}

fn bucket_label(bucket: usize) -> &'static str {
    match bucket {
        0 => "the top of the page",
        1 => "25% of the page",
        2 => "50% of the page",
        3 => "75% of the page",
        _ => "the bottom of the page",
    }
}
