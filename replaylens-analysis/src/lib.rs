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

//! Replaylens Analysis
//!
//! Derives a compact, semantically labeled action log from one session's
//! replay event stream: a live DOM model is kept current from snapshots and
//! mutations, interaction events are classified into human-readable entries,
//! and noise (keystroke jitter, redundant scroll ticks, programmatic input
//! echoes) is suppressed.
//!
//! The whole pipeline is a pure, single-threaded batch transform: one event
//! list in, one entry list out, no I/O and no shared state. Sessions are
//! independent; callers wanting parallelism run sessions in parallel, never
//! one session's events.

pub mod chunk;
pub mod classify;
pub mod describe;
pub mod dom;
pub mod label;
pub mod suppress;
pub mod visibility;

pub use chunk::{chunk_actions, format_timestamp, ActionChunk, ChunkConfig};
pub use classify::classify_events;
pub use describe::{describe, is_clickable, semantic_attributes};
pub use dom::{DomModel, DomNode};
pub use label::{fallback_action_id, slugify, ActionIdLedger, LabeledEntry};
pub use suppress::{collapse_consecutive, InputDebouncer, InputDecision};
pub use visibility::{is_significant, scan};

use replaylens_core::action::ActionLogEntry;
use replaylens_core::config::EngineConfig;
use replaylens_core::event::RawEvent;

/// Derive the final action log for one session's event batch.
///
/// Classification plus the consecutive-entry collapse pass. Never fails:
/// malformed or unresolvable events degrade to the best log derivable from
/// what was parsable.
pub fn derive_action_log(events: &[RawEvent], config: &EngineConfig) -> Vec<ActionLogEntry> {
    let entries = classify_events(events, config);
    tracing::debug!(
        events = events.len(),
        tentative = entries.len(),
        "classified event batch"
    );
    collapse_consecutive(entries)
}
