//! Occupancy tracker.
//!
//! The conflict-detection ledger for one term: the set of committed
//! `(room, weekday, block)` triples. It is the sole source of truth for the
//! conflict-free invariant.
//!
//! # Contract
//! A commit is all-or-nothing over a demand's slots. [`OccupancyTracker::commit`]
//! re-checks every slot before inserting any, so a commit that would
//! double-book leaves the ledger untouched and returns an error.
//! The allocator only calls it after [`OccupancyTracker::is_free`] in the
//! same step, via [`OccupancyTracker::try_commit`].
//!
//! A tracker is scoped to one term and one run. Runs for different terms
//! use different trackers; two runs for the same term must not share one
//! concurrently.

use std::collections::{HashMap, HashSet};

use crate::error::OccupancyConflict;
use crate::models::{Allocation, RoomId, TimeSlot};

/// Committed occupancy for one term.
#[derive(Debug, Clone, Default)]
pub struct OccupancyTracker {
    term_id: String,
    occupied: HashMap<RoomId, HashSet<TimeSlot>>,
}

impl OccupancyTracker {
    /// Creates an empty tracker for a term.
    pub fn new(term_id: impl Into<String>) -> Self {
        Self {
            term_id: term_id.into(),
            occupied: HashMap::new(),
        }
    }

    /// Creates a tracker seeded with previously committed allocations.
    ///
    /// Allocations belonging to other terms are ignored.
    ///
    /// # Errors
    /// Returns the first double-booking found among `allocations`.
    pub fn from_allocations<'a>(
        term_id: impl Into<String>,
        allocations: impl IntoIterator<Item = &'a Allocation>,
    ) -> Result<Self, OccupancyConflict> {
        let mut tracker = Self::new(term_id);
        for a in allocations {
            if a.term_id == tracker.term_id {
                tracker.commit(a.room_id, &a.slots)?;
            }
        }
        Ok(tracker)
    }

    /// Term this tracker belongs to.
    pub fn term_id(&self) -> &str {
        &self.term_id
    }

    /// Whether a single slot is taken in a room.
    #[inline]
    pub fn is_occupied(&self, room_id: RoomId, slot: &TimeSlot) -> bool {
        self.occupied
            .get(&room_id)
            .is_some_and(|slots| slots.contains(slot))
    }

    /// First slot in `slots` already taken in the room.
    pub fn first_conflict(&self, room_id: RoomId, slots: &[TimeSlot]) -> Option<TimeSlot> {
        let taken = self.occupied.get(&room_id)?;
        slots.iter().find(|s| taken.contains(s)).copied()
    }

    /// True iff none of `slots` is taken in the room.
    #[inline]
    pub fn is_free(&self, room_id: RoomId, slots: &[TimeSlot]) -> bool {
        self.first_conflict(room_id, slots).is_none()
    }

    /// Marks every slot as taken in the room.
    ///
    /// # Errors
    /// Returns [`OccupancyConflict`] without modifying the ledger if any
    /// slot is already taken.
    pub fn commit(&mut self, room_id: RoomId, slots: &[TimeSlot]) -> Result<(), OccupancyConflict> {
        if let Some(slot) = self.first_conflict(room_id, slots) {
            return Err(OccupancyConflict { room_id, slot });
        }
        self.occupied
            .entry(room_id)
            .or_default()
            .extend(slots.iter().copied());
        Ok(())
    }

    /// Checks and commits in one step. Returns whether the commit happened.
    pub fn try_commit(&mut self, room_id: RoomId, slots: &[TimeSlot]) -> bool {
        self.commit(room_id, slots).is_ok()
    }

    /// Number of slots taken in a room.
    pub fn room_load(&self, room_id: RoomId) -> usize {
        self.occupied.get(&room_id).map_or(0, HashSet::len)
    }

    /// Total `(room, slot)` pairs taken.
    pub fn occupied_count(&self) -> usize {
        self.occupied.values().map(HashSet::len).sum()
    }

    /// Whether nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }
}
