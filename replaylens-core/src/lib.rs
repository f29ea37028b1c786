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

//! Replaylens Core
//!
//! Fundamental data structures for session-replay analysis: raw replay
//! events, decoded DOM snapshot payloads, and derived action-log entries.

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod wire;

pub use action::{ActionKind, ActionLogEntry, PendingPageLoad, NO_SIGNIFICANT_CHANGE};
pub use config::{EngineConfig, SessionLimits, DEFAULT_MAX_SESSION_DURATION_MS};
pub use error::{ReplaylensError, Result};
pub use event::{
    AttributeUpdate, EventPayload, InputChange, MutationAdd, MutationBatch, Navigation,
    PointerClick, RawEvent, ScrollPosition, SnapshotNode, TextUpdate,
};
pub use wire::{decode_events, decode_record, DecodeStats};
