//! Allocation (solution) model.
//!
//! The output of one run: committed allocations, skip records for the
//! demands that could not be placed, ignored rule errors and per-phase
//! counters.
//!
//! # Invariant
//! Within one term, no two allocations share a `(room, weekday, block)`
//! triple. [`AllocationResult::conflicts`] re-checks this from scratch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{DemandId, RoomId, TimeSlot};
use crate::error::RuleConfigError;

/// Allocator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Demands with hard rules, by placement priority.
    HardPriority,
    /// Demands with soft signals only, by demand id.
    SoftScored,
    /// Everything else, by demand id.
    Remainder,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 3] = [Phase::HardPriority, Phase::SoftScored, Phase::Remainder];

    /// 1-based phase number.
    pub fn number(self) -> u8 {
        match self {
            Phase::HardPriority => 1,
            Phase::SoftScored => 2,
            Phase::Remainder => 3,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::HardPriority => "hard_priority",
            Phase::SoftScored => "soft_scored",
            Phase::Remainder => "remainder",
        };
        f.write_str(s)
    }
}

/// A demand placed in a room for all of its weekly slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Term of the allocation.
    pub term_id: String,
    /// Placed demand.
    pub demand_id: DemandId,
    /// Assigned room.
    pub room_id: RoomId,
    /// Weekly slots occupied (sorted, unique).
    pub slots: Vec<TimeSlot>,
    /// Phase that produced it (`None` for allocations from earlier runs).
    #[serde(default)]
    pub phase: Option<Phase>,
    /// Candidate score at selection time.
    #[serde(default)]
    pub score: Option<u32>,
}

impl Allocation {
    /// Creates an allocation.
    pub fn new(
        term_id: impl Into<String>,
        demand_id: DemandId,
        room_id: RoomId,
        slots: impl IntoIterator<Item = TimeSlot>,
    ) -> Self {
        let mut slots: Vec<TimeSlot> = slots.into_iter().collect();
        slots.sort();
        slots.dedup();
        Self {
            term_id: term_id.into(),
            demand_id,
            room_id,
            slots,
            phase: None,
            score: None,
        }
    }

    /// Records the producing phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Records the winning score.
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }

    /// Flattened `(demand, room, slot)` tuples.
    pub fn entries(&self) -> impl Iterator<Item = (DemandId, RoomId, TimeSlot)> + '_ {
        self.slots
            .iter()
            .map(move |&slot| (self.demand_id, self.room_id, slot))
    }
}

/// Why a demand was not placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum SkipReason {
    /// No room satisfies every hard rule.
    HardRuleUnsatisfiable,
    /// Compliant rooms exist but all are taken in some required slot.
    NoConflictFreeRoom,
    /// Every room is taken in some required slot.
    NoAvailableRoom,
    /// Capacity is enforced and no room seats the demand.
    InsufficientCapacity,
    /// The schedule code could not be parsed; the demand was excluded.
    InvalidScheduleCode { message: String },
    /// The schedule code is blank and blank codes are tolerated.
    NoScheduledBlocks,
    /// The run was cancelled before the demand was reached.
    Cancelled,
}

impl SkipReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::HardRuleUnsatisfiable => "hard-rule-unsatisfiable",
            SkipReason::NoConflictFreeRoom => "no-conflict-free-room",
            SkipReason::NoAvailableRoom => "no-available-room",
            SkipReason::InsufficientCapacity => "insufficient-capacity",
            SkipReason::InvalidScheduleCode { .. } => "invalid-schedule-code",
            SkipReason::NoScheduledBlocks => "no-scheduled-blocks",
            SkipReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidScheduleCode { message } => write!(f, "{}: {message}", self.code()),
            _ => f.write_str(self.code()),
        }
    }
}

/// A demand that was not placed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipRecord {
    /// Skipped demand.
    pub demand_id: DemandId,
    /// Phase that gave up on it (`None` when excluded before phase 1).
    pub phase: Option<Phase>,
    /// Reason.
    pub reason: SkipReason,
}

/// Counters for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    /// Demands the phase considered.
    pub attempted: usize,
    /// Demands placed.
    pub allocated: usize,
    /// Demands skipped.
    pub skipped: usize,
}

impl PhaseStats {
    /// Fraction of attempted demands that were placed (1.0 when none attempted).
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            1.0
        } else {
            self.allocated as f64 / self.attempted as f64
        }
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Phase 1 (hard priority).
    pub hard_priority: PhaseStats,
    /// Phase 2 (soft scored).
    pub soft_scored: PhaseStats,
    /// Phase 3 (remainder).
    pub remainder: PhaseStats,
    /// Demands excluded before phase 1 (unparsable or blank schedule).
    pub excluded: usize,
    /// Demands that already had an allocation for the term.
    pub preexisting: usize,
    /// Demands not reached because the run was cancelled.
    pub cancelled: usize,
}

impl RunStats {
    /// Counters for one phase.
    pub fn phase(&self, phase: Phase) -> &PhaseStats {
        match phase {
            Phase::HardPriority => &self.hard_priority,
            Phase::SoftScored => &self.soft_scored,
            Phase::Remainder => &self.remainder,
        }
    }

    /// Mutable counters for one phase.
    pub fn phase_mut(&mut self, phase: Phase) -> &mut PhaseStats {
        match phase {
            Phase::HardPriority => &mut self.hard_priority,
            Phase::SoftScored => &mut self.soft_scored,
            Phase::Remainder => &mut self.remainder,
        }
    }

    /// Total demands placed across phases.
    pub fn total_allocated(&self) -> usize {
        Phase::ALL.iter().map(|&p| self.phase(p).allocated).sum()
    }
}

/// Two or more allocations holding the same room in the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConflict {
    /// Double-booked room.
    pub room_id: RoomId,
    /// Double-booked slot.
    pub slot: TimeSlot,
    /// Demands holding it.
    pub demand_ids: Vec<DemandId>,
}

/// Result of one allocation run over one term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    /// Term scheduled.
    pub term_id: String,
    /// New allocations, in commit order.
    pub allocations: Vec<Allocation>,
    /// Demands not placed.
    pub skipped: Vec<SkipRecord>,
    /// Rules ignored because of malformed payloads.
    pub rule_errors: Vec<RuleConfigError>,
    /// Per-phase counters.
    pub stats: RunStats,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

impl AllocationResult {
    /// Creates an empty result for a term.
    pub fn new(term_id: impl Into<String>) -> Self {
        Self {
            term_id: term_id.into(),
            ..Default::default()
        }
    }

    /// Adds an allocation.
    pub fn add_allocation(&mut self, allocation: Allocation) {
        self.allocations.push(allocation);
    }

    /// Adds a skip record.
    pub fn add_skip(&mut self, demand_id: DemandId, phase: Option<Phase>, reason: SkipReason) {
        self.skipped.push(SkipRecord {
            demand_id,
            phase,
            reason,
        });
    }

    /// Number of new allocations.
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Finds the allocation for a demand.
    pub fn allocation_for_demand(&self, demand_id: DemandId) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.demand_id == demand_id)
    }

    /// All allocations in a room.
    pub fn allocations_for_room(&self, room_id: RoomId) -> Vec<&Allocation> {
        self.allocations
            .iter()
            .filter(|a| a.room_id == room_id)
            .collect()
    }

    /// Finds the skip record for a demand.
    pub fn skip_for_demand(&self, demand_id: DemandId) -> Option<&SkipRecord> {
        self.skipped.iter().find(|s| s.demand_id == demand_id)
    }

    /// Every `(room, slot)` held by more than one allocation.
    ///
    /// Always empty for engine output.
    pub fn conflicts(&self) -> Vec<SlotConflict> {
        let mut holders: BTreeMap<(RoomId, TimeSlot), Vec<DemandId>> = BTreeMap::new();
        for a in &self.allocations {
            for (demand_id, room_id, slot) in a.entries() {
                holders.entry((room_id, slot)).or_default().push(demand_id);
            }
        }
        holders
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((room_id, slot), demand_ids)| SlotConflict {
                room_id,
                slot,
                demand_ids,
            })
            .collect()
    }

    /// Whether no room is double-booked.
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockCode, Weekday};

    fn slot(day: u8, block: u8) -> TimeSlot {
        TimeSlot::new(Weekday(day), BlockCode::morning(block))
    }

    #[test]
    fn test_allocation_sorts_and_dedups_slots() {
        let a = Allocation::new("t", 1, 10, vec![slot(3, 2), slot(2, 1), slot(3, 2)]);
        assert_eq!(a.slots, vec![slot(2, 1), slot(3, 2)]);
        let entries: Vec<_> = a.entries().collect();
        assert_eq!(entries, vec![(1, 10, slot(2, 1)), (1, 10, slot(3, 2))]);
    }

    #[test]
    fn test_result_queries() {
        let mut r = AllocationResult::new("2024.1");
        r.add_allocation(Allocation::new("2024.1", 1, 10, vec![slot(2, 1)]).with_phase(Phase::HardPriority));
        r.add_allocation(Allocation::new("2024.1", 2, 10, vec![slot(2, 2)]));
        r.add_allocation(Allocation::new("2024.1", 3, 11, vec![slot(2, 1)]));
        r.add_skip(4, Some(Phase::Remainder), SkipReason::NoAvailableRoom);

        assert_eq!(r.allocation_count(), 3);
        assert_eq!(r.allocation_for_demand(2).unwrap().room_id, 10);
        assert!(r.allocation_for_demand(4).is_none());
        assert_eq!(r.allocations_for_room(10).len(), 2);
        assert_eq!(r.skip_for_demand(4).unwrap().reason.code(), "no-available-room");
        assert!(r.is_conflict_free());
    }

    #[test]
    fn test_conflicts_detected() {
        let mut r = AllocationResult::new("t");
        r.add_allocation(Allocation::new("t", 1, 10, vec![slot(2, 1), slot(2, 2)]));
        r.add_allocation(Allocation::new("t", 2, 10, vec![slot(2, 2), slot(2, 3)]));
        let conflicts = r.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].room_id, 10);
        assert_eq!(conflicts[0].slot, slot(2, 2));
        assert_eq!(conflicts[0].demand_ids, vec![1, 2]);
    }

    #[test]
    fn test_skip_reason_codes() {
        assert_eq!(SkipReason::HardRuleUnsatisfiable.code(), "hard-rule-unsatisfiable");
        assert_eq!(SkipReason::NoConflictFreeRoom.to_string(), "no-conflict-free-room");
        let r = SkipReason::InvalidScheduleCode {
            message: "schedule code is empty".into(),
        };
        assert_eq!(r.to_string(), "invalid-schedule-code: schedule code is empty");

        let json = serde_json::to_string(&SkipReason::NoConflictFreeRoom).unwrap();
        assert_eq!(json, r#"{"code":"no-conflict-free-room"}"#);
    }

    #[test]
    fn test_run_stats() {
        let mut stats = RunStats::default();
        stats.phase_mut(Phase::HardPriority).allocated = 2;
        stats.phase_mut(Phase::Remainder).allocated = 3;
        assert_eq!(stats.total_allocated(), 5);
        assert!((PhaseStats::default().success_rate() - 1.0).abs() < 1e-10);

        let p = PhaseStats {
            attempted: 4,
            allocated: 3,
            skipped: 1,
        };
        assert!((p.success_rate() - 0.75).abs() < 1e-10);
    }
}
