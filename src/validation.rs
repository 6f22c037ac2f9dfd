//! Input validation for allocation runs.
//!
//! Checks the global inputs of a run before any demand is considered.
//! Detects:
//! - Duplicate demand, room and rule IDs
//! - Demands belonging to a different term
//! - Existing allocations for another term or for unknown rooms
//! - Existing allocations that already double-book a slot
//!
//! Per-demand problems (unparsable schedule codes, malformed rule
//! payloads) are not validation errors: they are isolated and reported in
//! the run result.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::{Allocation, Demand, DemandId, Room, RoomId, RuleRecord, TimeSlot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A record belongs to a different term than the run.
    TermMismatch,
    /// An existing allocation references a room that doesn't exist.
    UnknownRoom,
    /// A demand already owns more than one existing allocation.
    DuplicateAllocation,
    /// Existing allocations already share a `(room, slot)`.
    ConflictingExisting,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the global inputs of a run for `term_id`.
///
/// Checks:
/// 1. No duplicate room, demand or rule IDs
/// 2. Every demand belongs to `term_id`
/// 3. Every existing allocation belongs to `term_id` and a known room
/// 4. No demand owns two existing allocations
/// 5. Existing allocations are conflict-free
///
/// Unknown room ids inside rules, preferences or history are not errors;
/// they simply never match.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    term_id: &str,
    demands: &[Demand],
    rooms: &[Room],
    rules: &[RuleRecord],
    existing: &[Allocation],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut room_ids = HashSet::new();
    for r in rooms {
        if !room_ids.insert(r.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate room ID: {}", r.id),
            ));
        }
    }

    let mut demand_ids = HashSet::new();
    for d in demands {
        if !demand_ids.insert(d.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate demand ID: {}", d.id),
            ));
        }
        if d.term_id != term_id {
            errors.push(ValidationError::new(
                ValidationErrorKind::TermMismatch,
                format!(
                    "Demand {} belongs to term '{}', run is for '{}'",
                    d.id, d.term_id, term_id
                ),
            ));
        }
    }

    let mut rule_ids = HashSet::new();
    for r in rules {
        if !rule_ids.insert(r.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate rule ID: {}", r.id),
            ));
        }
    }

    check_existing(term_id, existing, &room_ids, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_existing(
    term_id: &str,
    existing: &[Allocation],
    room_ids: &HashSet<RoomId>,
    errors: &mut Vec<ValidationError>,
) {
    let mut owners: HashSet<DemandId> = HashSet::new();
    let mut holders: HashMap<(RoomId, TimeSlot), DemandId> = HashMap::new();

    for a in existing {
        if a.term_id != term_id {
            errors.push(ValidationError::new(
                ValidationErrorKind::TermMismatch,
                format!(
                    "Existing allocation of demand {} belongs to term '{}', run is for '{}'",
                    a.demand_id, a.term_id, term_id
                ),
            ));
            continue;
        }
        if !room_ids.contains(&a.room_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownRoom,
                format!(
                    "Existing allocation of demand {} references unknown room {}",
                    a.demand_id, a.room_id
                ),
            ));
        }
        if !owners.insert(a.demand_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateAllocation,
                format!("Demand {} has more than one existing allocation", a.demand_id),
            ));
        }
        for (demand_id, room_id, slot) in a.entries() {
            if let Some(&other) = holders.get(&(room_id, slot)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConflictingExisting,
                    format!(
                        "Demands {other} and {demand_id} both hold room {room_id} at {slot}"
                    ),
                ));
            } else {
                holders.insert((room_id, slot), demand_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockCode, RuleKind, RuleTarget, Weekday};
    use serde_json::json;

    fn slot(day: u8, block: u8) -> TimeSlot {
        TimeSlot::new(Weekday(day), BlockCode::morning(block))
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        let demands = vec![Demand::new(1, "t", "A"), Demand::new(2, "t", "B")];
        let rooms = vec![Room::new(1, 10), Room::new(2, 20)];
        let existing = vec![Allocation::new("t", 9, 1, vec![slot(2, 1)])];
        assert!(validate_input("t", &demands, &rooms, &[], &existing).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let demands = vec![Demand::new(1, "t", "A"), Demand::new(1, "t", "B")];
        let rooms = vec![Room::new(3, 10), Room::new(3, 20)];
        let rule = RuleRecord::new(5, RuleKind::ExactRoom, 0, RuleTarget::Course("A".into()), json!({"roomId": 3}));
        let rules = vec![rule.clone(), rule];

        let errors = validate_input("t", &demands, &rooms, &rules, &[]).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::DuplicateId));
        assert!(errors.iter().any(|e| e.message.contains("room ID: 3")));
    }

    #[test]
    fn test_term_mismatch() {
        let demands = vec![Demand::new(1, "2024.1", "A")];
        let errors = validate_input("2024.2", &demands, &[], &[], &[]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::TermMismatch]);
    }

    #[test]
    fn test_existing_allocation_checks() {
        let rooms = vec![Room::new(1, 10)];
        let existing = vec![
            Allocation::new("other", 1, 1, vec![slot(2, 1)]),
            Allocation::new("t", 2, 7, vec![slot(2, 1)]),
            Allocation::new("t", 3, 1, vec![slot(3, 1)]),
            Allocation::new("t", 4, 1, vec![slot(3, 1), slot(3, 2)]),
            Allocation::new("t", 4, 1, vec![slot(4, 1)]),
        ];
        let errors = validate_input("t", &[], &rooms, &[], &existing).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::TermMismatch,
                ValidationErrorKind::UnknownRoom,
                ValidationErrorKind::ConflictingExisting,
                ValidationErrorKind::DuplicateAllocation,
            ]
        );
    }

    #[test]
    fn test_error_display() {
        let e = ValidationError::new(ValidationErrorKind::UnknownRoom, "room 7 not found");
        assert_eq!(e.to_string(), "room 7 not found");
    }
}
