//! Rule classifier.
//!
//! Collects the rules attached to a demand (by course code or by any listed
//! professor), splits them into hard and soft sets, and computes the
//! demand's placement priority:
//!
//! ```text
//! priority = 10 × |hard rules|
//!          + 50  if any hard rule is an exact-room constraint
//!          +  5  if the demand has a low-mobility professor and ≥1 hard rule
//! ```
//!
//! Phase 1 consumes demands in priority-descending order with ties broken
//! by demand id ascending.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;

use tracing::warn;

use crate::error::RuleConfigError;
use crate::models::{Demand, DemandId, Phase, RoomId, Rule, RuleConstraint, RuleRecord};

/// Priority points per hard rule.
pub const HARD_RULE_POINTS: u32 = 10;
/// Bonus when a hard rule pins the demand to one room.
pub const EXACT_ROOM_BONUS: u32 = 50;
/// Bonus for a low-mobility professor with at least one hard rule.
pub const LOW_MOBILITY_BONUS: u32 = 5;

/// The validated rules of one run.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set. Rules are kept in id order.
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| r.id);
        Self { rules }
    }

    /// Validates raw records, keeping the good ones.
    ///
    /// Malformed records are logged and returned alongside the set; they
    /// take no part in classification or scoring.
    pub fn from_records(records: &[RuleRecord]) -> (Self, Vec<RuleConfigError>) {
        let mut rules = Vec::with_capacity(records.len());
        let mut errors = Vec::new();
        for record in records {
            match Rule::try_from_record(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    warn!(rule_id = e.rule_id, kind = %e.kind, error = %e.message, "ignoring rule");
                    errors.push(e);
                }
            }
        }
        (Self::new(rules), errors)
    }

    /// All rules in id order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of valid rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// No valid rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules attached to a demand, in id order.
    pub fn matching<'a>(&'a self, demand: &'a Demand) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |r| r.applies_to(demand))
    }

    /// Classifies one demand.
    pub fn classify(&self, demand: &Demand) -> Classification {
        let mut hard = Vec::new();
        let mut soft = Vec::new();
        let mut low_mobility = false;

        for rule in self.matching(demand) {
            if let RuleConstraint::ProfessorMobility { low_mobility: true } = rule.constraint {
                low_mobility = true;
            }
            if rule.is_hard() {
                hard.push(rule.clone());
            } else {
                soft.push(rule.clone());
            }
        }

        let priority = placement_priority(&hard, low_mobility);
        Classification {
            demand_id: demand.id,
            hard,
            soft,
            low_mobility,
            priority,
        }
    }
}

/// Placement priority from a demand's hard rules.
pub fn placement_priority(hard: &[Rule], low_mobility: bool) -> u32 {
    if hard.is_empty() {
        return 0;
    }
    let mut priority = HARD_RULE_POINTS * hard.len() as u32;
    if hard
        .iter()
        .any(|r| matches!(r.constraint, RuleConstraint::ExactRoom { .. }))
    {
        priority += EXACT_ROOM_BONUS;
    }
    if low_mobility {
        priority += LOW_MOBILITY_BONUS;
    }
    priority
}

/// Rules attached to one demand, split by tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Classified demand.
    pub demand_id: DemandId,
    /// Tier-0 rules.
    pub hard: Vec<Rule>,
    /// Tier > 0 rules.
    pub soft: Vec<Rule>,
    /// Some attached mobility rule is set.
    pub low_mobility: bool,
    /// Placement priority.
    pub priority: u32,
}

impl Classification {
    /// At least one tier-0 rule applies.
    pub fn has_hard_rules(&self) -> bool {
        !self.hard.is_empty()
    }

    /// Room ids demanded by hard exact-room rules.
    pub fn exact_rooms(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.hard.iter().filter_map(|r| match r.constraint {
            RuleConstraint::ExactRoom { room_id } => Some(room_id),
            _ => None,
        })
    }

    /// Phase that will consider the demand.
    ///
    /// `has_soft_signal` is true when some professor preference or some
    /// prior-term history applies to the demand.
    pub fn phase(&self, has_soft_signal: bool) -> Phase {
        if self.priority > 0 {
            Phase::HardPriority
        } else if has_soft_signal {
            Phase::SoftScored
        } else {
            Phase::Remainder
        }
    }

    /// Phase 1 order: priority descending, then demand id ascending.
    pub fn cmp_priority(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(self.demand_id.cmp(&other.demand_id))
    }
}
