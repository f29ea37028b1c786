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

//! Chunking of finished action logs.
//!
//! Splits one session's entries into embedding-ready text chunks: numbered
//! lines with human-readable offsets, element context included except when
//! it is the unchanged-state sentinel. Token counts are estimated at four
//! characters per token; embedding and vector storage happen elsewhere.

use replaylens_core::action::ActionLogEntry;
use serde::{Deserialize, Serialize};

/// Approximate characters per token for budget estimates.
const CHARS_PER_TOKEN: usize = 4;

/// Chunking bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Approximate token budget per chunk.
    pub max_chunk_tokens: usize,
    /// Hard cap on actions per chunk.
    pub max_actions_per_chunk: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 500,
            max_actions_per_chunk: 10,
        }
    }
}

/// One embedding-ready slice of a session's action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionChunk {
    pub session_id: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Rendered chunk text.
    pub text: String,
    pub action_count: usize,
    /// Offset of the first action in the chunk, ms.
    pub start_ms: i64,
    /// Offset of the last action in the chunk, ms.
    pub end_ms: i64,
    pub duration_ms: i64,
    pub estimated_tokens: usize,
}

/// Split entries into chunks under the configured bounds. Empty input
/// yields no chunks.
pub fn chunk_actions(
    entries: &[ActionLogEntry],
    session_id: &str,
    config: &ChunkConfig,
) -> Vec<ActionChunk> {
    let mut chunks: Vec<ActionChunk> = Vec::new();
    let mut current: Vec<&ActionLogEntry> = Vec::new();
    let mut current_tokens = 0usize;

    for entry in entries {
        let entry_tokens = estimate_tokens(entry);
        let over_budget = current_tokens + entry_tokens > config.max_chunk_tokens;
        let over_count = current.len() >= config.max_actions_per_chunk;

        if (over_budget || over_count) && !current.is_empty() {
            chunks.push(render_chunk(&current, session_id, chunks.len()));
            current.clear();
            current_tokens = 0;
        }

        current.push(entry);
        current_tokens += entry_tokens;
    }

    if !current.is_empty() {
        chunks.push(render_chunk(&current, session_id, chunks.len()));
    }

    let total = chunks.len();
    for chunk in &mut chunks {
        chunk.total_chunks = total;
    }
    chunks
}

/// Millisecond offset rendered as "42s", "3m 12s", or "1h 5m".
pub fn format_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 60_000 {
        format!("{}s", ms / 1000)
    } else if ms < 3_600_000 {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    } else {
        format!("{}h {}m", ms / 3_600_000, (ms % 3_600_000) / 60_000)
    }
}

fn estimate_tokens(entry: &ActionLogEntry) -> usize {
    let mut chars = entry.action.len();
    if !entry.has_unchanged_context() {
        chars += entry
            .elements_on_screen
            .iter()
            .map(String::len)
            .sum::<usize>();
    }
    chars / CHARS_PER_TOKEN
}

fn render_chunk(entries: &[&ActionLogEntry], session_id: &str, index: usize) -> ActionChunk {
    let mut lines: Vec<String> = Vec::new();
    for (position, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{}. [{}] {}",
            position + 1,
            format_timestamp(entry.timestamp_ms),
            entry.action
        ));
        if !entry.elements_on_screen.is_empty() && !entry.has_unchanged_context() {
            lines.push(format!(
                "   Elements on screen: {}",
                entry.elements_on_screen.join("; ")
            ));
        }
    }
    let text = lines.join("\n");

    let start_ms = entries.first().map(|entry| entry.timestamp_ms).unwrap_or(0);
    let end_ms = entries.last().map(|entry| entry.timestamp_ms).unwrap_or(0);

    ActionChunk {
        session_id: session_id.to_string(),
        chunk_index: index,
        total_chunks: 0, // patched by the caller once all chunks exist
        estimated_tokens: text.len() / CHARS_PER_TOKEN,
        text,
        action_count: entries.len(),
        start_ms,
        end_ms,
        duration_ms: end_ms - start_ms,
    }
}
