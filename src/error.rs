//! Error types for room allocation.
//!
//! Per-demand problems ([`ScheduleParseError`], [`RuleConfigError`]) are
//! isolated and reported inside the allocation result. Only
//! [`AllocError`] aborts a run, and only before the first phase begins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::models::{RoomId, RuleId, RuleKind, TimeSlot};
use crate::validation::ValidationError;

/// A raw schedule code could not be decoded into time slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleParseError {
    /// The code contains no groups at all.
    #[error("schedule code is empty")]
    Empty,

    /// A group does not start with weekday digits.
    #[error("group '{group}' has no weekday digits")]
    MissingWeekday { group: String },

    /// A group has no turn letter after its weekday digits.
    #[error("group '{group}' has no turn letter")]
    MissingTurn { group: String },

    /// A group has no block digits after its turn letter.
    #[error("group '{group}' has no block digits")]
    MissingBlock { group: String },

    /// A group contains a character outside the notation.
    #[error("group '{group}' contains unexpected character '{ch}'")]
    InvalidCharacter { group: String, ch: char },

    /// A weekday digit is not open in the calendar.
    #[error("group '{group}' references weekday {weekday} which is not in the calendar")]
    UnknownWeekday { group: String, weekday: u8 },

    /// A turn/block combination is not defined in the calendar.
    #[error("group '{group}' references block {block} which is not in the calendar")]
    UnknownBlock { group: String, block: String },
}

/// A rule's payload does not match the schema of its declared kind.
///
/// The rule is ignored; demands proceed without it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("rule {rule_id} ({kind}): {message}")]
pub struct RuleConfigError {
    /// Offending rule.
    pub rule_id: RuleId,
    /// Declared kind.
    pub kind: RuleKind,
    /// What was wrong with the payload.
    pub message: String,
}

/// The block-code lookup table is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("calendar '{0}' opens no weekdays")]
    NoWeekdays(String),

    #[error("calendar '{0}' defines no blocks")]
    NoBlocks(String),

    #[error("weekday {0} is outside 1..=7")]
    InvalidWeekday(u8),

    #[error("block {0} must have an index between 1 and 9")]
    InvalidBlockIndex(String),

    #[error("block {0} is defined more than once")]
    DuplicateBlock(String),

    #[error("block {0} ends before it starts")]
    InvertedWindow(String),

    #[error("blocks {first} and {second} overlap in wall-clock time")]
    OverlappingBlocks { first: String, second: String },
}

/// A commit targeted a slot that is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("room {room_id} is already occupied at {slot}")]
pub struct OccupancyConflict {
    /// Room that was double-booked.
    pub room_id: RoomId,
    /// First conflicting slot.
    pub slot: TimeSlot,
}

/// Run-level failure; no demand is considered.
#[derive(Debug, Error)]
pub enum AllocError {
    /// Global inputs failed validation.
    #[error("invalid allocation input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// The block-code lookup table is malformed.
    #[error("invalid calendar: {0}")]
    Calendar(#[from] CalendarError),

    /// Engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The occupancy ledger refused a commit.
    #[error("occupancy invariant violated: {0}")]
    Occupancy(#[from] OccupancyConflict),

    /// The supplied tracker belongs to a different term.
    #[error("occupancy tracker is for term '{tracker}', request is for term '{request}'")]
    TermMismatch { tracker: String, request: String },
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

/// Result type alias for allocation operations.
pub type Result<T> = std::result::Result<T, AllocError>;
