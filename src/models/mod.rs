//! Room allocation domain models.
//!
//! Plain, fully materialized value records: the engine takes them as input
//! and returns [`Allocation`]s and [`SkipRecord`]s as output. No record holds
//! a live handle to storage.
//!
//! # Domain Mappings
//!
//! | u-roomalloc | Registrar | Scheduling theory |
//! |-------------|-----------|-------------------|
//! | Demand | Course offering | Job |
//! | Room | Classroom | Machine |
//! | TimeSlot | Weekday + block | Time bucket |
//! | Rule | Placement rule | Eligibility constraint |
//! | Allocation | Room booking | Assignment |

mod allocation;
mod calendar;
mod demand;
mod preference;
mod room;
mod rule;

pub use allocation::{
    Allocation, AllocationResult, Phase, PhaseStats, RunStats, SkipReason, SkipRecord, SlotConflict,
};
pub use calendar::{BlockCalendar, BlockCode, BlockDefinition, BlockWindow, TimeSlot, Turn, Weekday};
pub use demand::{course_key, professor_key, Demand};
pub use preference::{HistoricalAllocation, PreferenceLink};
pub use room::{Room, ACCESSIBILITY_FEATURE};
pub use rule::{Rule, RuleConstraint, RuleKind, RuleRecord, RuleTarget};

/// Demand (course offering) identifier.
pub type DemandId = u32;
/// Room identifier.
pub type RoomId = u32;
/// Rule identifier.
pub type RuleId = u32;
