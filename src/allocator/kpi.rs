//! Allocation quality metrics (KPIs).
//!
//! Computes performance indicators from a finished run and its inputs.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Placement Rate | Placed / considered demands (preexisting ones excluded) |
//! | Hard-Rule Placement Rate | Placed / attempted in the hard-priority phase |
//! | Room Utilization | Occupied slots / weekly slots in the calendar |
//! | Avg Utilization | Mean room utilization |
//! | Seat Efficiency | Mean of vagas / capacity over placed demands |

use std::collections::HashMap;

use crate::models::{AllocationResult, BlockCalendar, Demand, Room, RoomId};

/// Allocation performance indicators.
#[derive(Debug, Clone)]
pub struct AllocationKpi {
    /// Fraction of considered demands that were placed (0.0..1.0).
    pub placement_rate: f64,
    /// Fraction of hard-rule demands that were placed (0.0..1.0).
    pub hard_rule_placement_rate: f64,
    /// Per-room share of the weekly grid occupied by new allocations.
    pub utilization_by_room: HashMap<RoomId, f64>,
    /// Mean of `utilization_by_room`.
    pub avg_utilization: f64,
    /// Mean occupied fraction of a room's seats.
    pub seat_efficiency: f64,
}

impl AllocationKpi {
    /// Computes KPIs from a run result and its inputs.
    ///
    /// # Arguments
    /// * `result` - The finished run.
    /// * `demands` - The run's demands (for enrollment sizes).
    /// * `rooms` - The room pool (for capacities).
    /// * `calendar` - The block calendar (for the weekly slot count).
    pub fn calculate(
        result: &AllocationResult,
        demands: &[Demand],
        rooms: &[Room],
        calendar: &BlockCalendar,
    ) -> Self {
        let considered = demands.len().saturating_sub(result.stats.preexisting);
        let placement_rate = if considered == 0 {
            1.0
        } else {
            result.allocation_count() as f64 / considered as f64
        };

        let hard_rule_placement_rate = result.stats.hard_priority.success_rate();

        let weekly = calendar.weekly_slot_count();
        let mut occupied: HashMap<RoomId, usize> = rooms.iter().map(|r| (r.id, 0)).collect();
        for a in &result.allocations {
            *occupied.entry(a.room_id).or_default() += a.slots.len();
        }
        let utilization_by_room: HashMap<RoomId, f64> = occupied
            .into_iter()
            .map(|(room_id, slots)| {
                let u = if weekly == 0 {
                    0.0
                } else {
                    slots as f64 / weekly as f64
                };
                (room_id, u)
            })
            .collect();
        let avg_utilization = if utilization_by_room.is_empty() {
            0.0
        } else {
            utilization_by_room.values().sum::<f64>() / utilization_by_room.len() as f64
        };

        let vagas: HashMap<_, _> = demands.iter().map(|d| (d.id, d.vagas)).collect();
        let capacity: HashMap<_, _> = rooms.iter().map(|r| (r.id, r.capacity)).collect();
        let ratios: Vec<f64> = result
            .allocations
            .iter()
            .filter_map(|a| {
                let seats = *vagas.get(&a.demand_id)?;
                let cap = *capacity.get(&a.room_id)?;
                (cap > 0).then(|| seats as f64 / cap as f64)
            })
            .collect();
        let seat_efficiency = if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().sum::<f64>() / ratios.len() as f64
        };

        Self {
            placement_rate,
            hard_rule_placement_rate,
            utilization_by_room,
            avg_utilization,
            seat_efficiency,
        }
    }

    /// Whether the run meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_placement_rate: f64, min_utilization: f64) -> bool {
        self.placement_rate >= min_placement_rate && self.avg_utilization >= min_utilization
    }
}
