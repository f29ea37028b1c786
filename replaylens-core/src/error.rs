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

//! Error taxonomy.
//!
//! Derivation itself never fails: malformed events are skipped and counted,
//! unresolvable references are dropped, and an empty batch yields an empty
//! log. These errors cover wire-decode diagnostics and configuration
//! validation only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplaylensError {
    /// A replay record is missing a field required by its type tag.
    #[error("replay record missing required field `{0}`")]
    MissingField(&'static str),

    /// A replay record carries a field of the wrong shape.
    #[error("replay record field `{field}` is malformed: {reason}")]
    MalformedField {
        field: &'static str,
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ReplaylensError>;
