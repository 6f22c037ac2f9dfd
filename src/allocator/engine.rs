//! Three-phase greedy allocator.
//!
//! # Algorithm
//!
//! 1. Validate global inputs; abort before any demand on failure.
//! 2. Parse every demand's schedule code; exclude and report failures.
//! 3. Classify demands into phases:
//!    - Phase 1 (hard priority): priority > 0, by priority desc, id asc.
//!    - Phase 2 (soft scored): priority 0 with a preference or history
//!      signal, by id.
//!    - Phase 3 (remainder): everything else, by id.
//! 4. For each demand, rank all rooms by score and commit the best room
//!    that is eligible for the phase and free in every required slot.
//!
//! # Complexity
//! O(d · r · (h + p + s)) where d = demands, r = rooms, h/p = hard rules and
//! preferences per demand, s = slots per demand.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::AllocationRequest;
use crate::classifier::{Classification, RuleSet};
use crate::config::AllocatorConfig;
use crate::error::{AllocError, Result, ScheduleParseError};
use crate::models::{
    Allocation, AllocationResult, Demand, DemandId, Phase, Room, SkipReason, TimeSlot,
};
use crate::occupancy::OccupancyTracker;
use crate::schedule_code::parse_schedule_code;
use crate::scoring::CandidateScorer;

/// A demand ready for placement.
struct Planned<'a> {
    demand: &'a Demand,
    slots: Vec<TimeSlot>,
    class: Classification,
}

/// Three-phase room allocator.
///
/// # Example
///
/// ```
/// use u_roomalloc::allocator::{AllocationRequest, Allocator};
/// use u_roomalloc::models::{Demand, Room, Rule};
///
/// let demands = vec![
///     Demand::new(1, "2024.2", "MAT201").with_schedule("24M12").with_vagas(60),
///     Demand::new(2, "2024.2", "HIS101").with_schedule("2M1").with_vagas(30),
/// ];
/// let rooms = vec![Room::new(1, 80).with_type("Lecture Hall"), Room::new(2, 40)];
/// let request = AllocationRequest::new("2024.2", demands, rooms)
///     .with_rule(Rule::room_type(1, "MAT201", "Lecture Hall"));
///
/// let result = Allocator::default().run(&request).unwrap();
/// assert_eq!(result.allocation_for_demand(1).unwrap().room_id, 1);
/// assert_eq!(result.allocation_for_demand(2).unwrap().room_id, 2);
/// assert!(result.is_conflict_free());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Allocator {
    config: AllocatorConfig,
}

impl Allocator {
    /// Creates an allocator.
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Runs on a fresh tracker seeded with `request.existing`.
    pub fn run(&self, request: &AllocationRequest) -> Result<AllocationResult> {
        let mut tracker = OccupancyTracker::new(request.term_id.clone());
        self.execute(request, &mut tracker, true, None)
    }

    /// Runs on a caller-owned tracker.
    ///
    /// The tracker is taken as the committed state of the term and is not
    /// seeded from `request.existing`; those allocations only mark their
    /// demands as already placed. New commits are left in the tracker.
    pub fn run_on(
        &self,
        request: &AllocationRequest,
        tracker: &mut OccupancyTracker,
    ) -> Result<AllocationResult> {
        self.execute(request, tracker, false, None)
    }

    /// Like [`Allocator::run_on`], checking `cancel` between demands.
    ///
    /// Allocations committed before the flag is observed stay in the
    /// result; demands not reached are skipped as `cancelled`.
    pub fn run_with_cancel(
        &self,
        request: &AllocationRequest,
        tracker: &mut OccupancyTracker,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AllocationResult> {
        self.execute(request, tracker, false, cancel)
    }

    fn execute(
        &self,
        request: &AllocationRequest,
        tracker: &mut OccupancyTracker,
        seed_existing: bool,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AllocationResult> {
        info!(
            event = "run_start",
            term = %request.term_id,
            demands = request.demands.len(),
            rooms = request.rooms.len(),
            rules = request.rules.len(),
        );

        if tracker.term_id() != request.term_id {
            return Err(AllocError::TermMismatch {
                tracker: tracker.term_id().to_string(),
                request: request.term_id.clone(),
            });
        }
        self.config.validate()?;
        request.calendar.validate()?;
        request.validate().map_err(AllocError::Validation)?;

        if seed_existing {
            for a in &request.existing {
                tracker.commit(a.room_id, &a.slots)?;
            }
        }

        let mut result = AllocationResult::new(request.term_id.clone());
        let (rules, rule_errors) = RuleSet::from_records(&request.rules);
        result.rule_errors = rule_errors;

        let scorer = CandidateScorer::new(
            self.config.weights,
            request.term_id.clone(),
            &request.preferences,
            &request.history,
        );

        let phases = self.plan(request, &rules, &scorer, &mut result);

        for (phase, planned) in Phase::ALL.into_iter().zip(phases.iter()) {
            if result.cancelled {
                self.cancel_all(phase, planned, &mut result);
                continue;
            }
            info!(event = "phase_start", phase = %phase, demands = planned.len());

            for (i, p) in planned.iter().enumerate() {
                if cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                    info!(event = "cancelled", phase = %phase, remaining = planned.len() - i);
                    result.cancelled = true;
                    self.cancel_all(phase, &planned[i..], &mut result);
                    break;
                }

                result.stats.phase_mut(phase).attempted += 1;
                match self.place(p, phase, &request.rooms, &scorer, tracker, &request.term_id) {
                    Ok(allocation) => {
                        debug!(
                            demand_id = p.demand.id,
                            room_id = allocation.room_id,
                            score = allocation.score,
                            phase = %phase,
                            "allocated"
                        );
                        result.stats.phase_mut(phase).allocated += 1;
                        result.add_allocation(allocation);
                    }
                    Err(reason) => {
                        debug!(demand_id = p.demand.id, reason = %reason, phase = %phase, "skipped");
                        result.stats.phase_mut(phase).skipped += 1;
                        result.add_skip(p.demand.id, Some(phase), reason);
                    }
                }
            }

            let stats = result.stats.phase(phase);
            info!(
                event = "phase_end",
                phase = %phase,
                attempted = stats.attempted,
                allocated = stats.allocated,
                skipped = stats.skipped,
            );
        }

        info!(
            event = "run_end",
            term = %request.term_id,
            allocated = result.allocation_count(),
            skipped = result.skipped.len(),
            excluded = result.stats.excluded,
            preexisting = result.stats.preexisting,
            cancelled = result.cancelled,
        );
        Ok(result)
    }

    /// Parses, classifies and orders demands into the three phases.
    fn plan<'a>(
        &self,
        request: &'a AllocationRequest,
        rules: &RuleSet,
        scorer: &CandidateScorer,
        result: &mut AllocationResult,
    ) -> [Vec<Planned<'a>>; 3] {
        let placed: HashSet<DemandId> = request.existing.iter().map(|a| a.demand_id).collect();

        let mut demands: Vec<&Demand> = request.demands.iter().collect();
        demands.sort_by_key(|d| d.id);

        let mut phases: [Vec<Planned<'a>>; 3] = Default::default();
        for demand in demands {
            if placed.contains(&demand.id) {
                result.stats.preexisting += 1;
                continue;
            }

            let slots = match parse_schedule_code(&demand.raw_schedule_code, &request.calendar) {
                Ok(slots) => slots.into_iter().collect(),
                Err(ScheduleParseError::Empty) if self.config.allow_empty_schedule => {
                    debug!(demand_id = demand.id, "no scheduled blocks");
                    result.stats.excluded += 1;
                    result.add_skip(demand.id, None, SkipReason::NoScheduledBlocks);
                    continue;
                }
                Err(e) => {
                    warn!(
                        demand_id = demand.id,
                        code = %demand.raw_schedule_code,
                        error = %e,
                        "excluding demand with invalid schedule code"
                    );
                    result.stats.excluded += 1;
                    result.add_skip(
                        demand.id,
                        None,
                        SkipReason::InvalidScheduleCode {
                            message: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            let class = rules.classify(demand);
            let phase = class.phase(scorer.has_soft_signal(demand));
            phases[usize::from(phase.number() - 1)].push(Planned {
                demand,
                slots,
                class,
            });
        }

        phases[0].sort_by(|a, b| a.class.cmp_priority(&b.class));
        phases[1].sort_by_key(|p| p.demand.id);
        phases[2].sort_by_key(|p| p.demand.id);
        phases
    }

    /// Picks and commits a room for one demand.
    fn place(
        &self,
        planned: &Planned<'_>,
        phase: Phase,
        rooms: &[Room],
        scorer: &CandidateScorer,
        tracker: &mut OccupancyTracker,
        term_id: &str,
    ) -> std::result::Result<Allocation, SkipReason> {
        let view = scorer.prepare(planned.demand, &planned.class);
        let ranked = view.rank(rooms, self.config.parallel_scoring);

        let capacity_hard = self.config.capacity_is_hard;
        if capacity_hard && !ranked.iter().any(|c| c.fits) {
            return Err(SkipReason::InsufficientCapacity);
        }

        // Soft rules never exclude; hard rules only bind in phase 1.
        let enforce_hard = phase == Phase::HardPriority;
        let eligible: Vec<_> = ranked
            .iter()
            .filter(|c| (!enforce_hard || c.hard_ok) && (!capacity_hard || c.fits))
            .collect();
        if enforce_hard && eligible.is_empty() {
            return Err(SkipReason::HardRuleUnsatisfiable);
        }

        for candidate in eligible {
            // Check and commit in one step against the current ledger.
            if tracker.try_commit(candidate.room_id, &planned.slots) {
                return Ok(Allocation::new(
                    term_id,
                    planned.demand.id,
                    candidate.room_id,
                    planned.slots.iter().copied(),
                )
                .with_phase(phase)
                .with_score(candidate.total));
            }
        }

        Err(match phase {
            Phase::HardPriority | Phase::SoftScored => SkipReason::NoConflictFreeRoom,
            Phase::Remainder => SkipReason::NoAvailableRoom,
        })
    }

    fn cancel_all(&self, phase: Phase, planned: &[Planned<'_>], result: &mut AllocationResult) {
        for p in planned {
            result.stats.cancelled += 1;
            result.add_skip(p.demand.id, Some(phase), SkipReason::Cancelled);
        }
    }
}
