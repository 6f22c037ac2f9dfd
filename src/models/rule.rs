//! Placement rules.
//!
//! A rule is a named constraint attached to a course code or a professor.
//! Priority tier 0 makes it *hard* (a room violating it is disqualified);
//! any other tier makes it *soft* (it can only add score).
//!
//! Rules arrive as [`RuleRecord`]s whose `config` payload is untyped JSON.
//! [`Rule::try_from_record`] validates the payload against the declared
//! kind once, at the boundary, producing a [`RuleConstraint`] tagged union
//! that the classifier and scorer consume without further checks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::{course_key, Demand, Room, RoomId, RuleId};
use crate::error::RuleConfigError;

/// Rule kind as declared by the rule record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// The demand must be placed in one specific room.
    ExactRoom,
    /// The room must have a given room type.
    RoomType,
    /// The room must carry a given feature.
    Feature,
    /// The professor needs an accessible room.
    ProfessorMobility,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::ExactRoom => "EXACT_ROOM",
            RuleKind::RoomType => "ROOM_TYPE",
            RuleKind::Feature => "FEATURE",
            RuleKind::ProfessorMobility => "PROFESSOR_MOBILITY",
        };
        f.write_str(s)
    }
}

/// What a rule is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleTarget {
    /// Every offering of a course code.
    Course(String),
    /// Every offering taught by a professor.
    Professor(String),
}

/// Raw rule as stored by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    /// Unique rule identifier.
    pub id: RuleId,
    /// Declared kind.
    pub kind: RuleKind,
    /// 0 = hard, >0 = soft weight class.
    pub priority_tier: u32,
    /// Course or professor the rule applies to.
    pub target: RuleTarget,
    /// Kind-specific payload.
    #[serde(default)]
    pub config: Value,
}

impl RuleRecord {
    /// Creates a record with an explicit payload.
    pub fn new(id: RuleId, kind: RuleKind, priority_tier: u32, target: RuleTarget, config: Value) -> Self {
        Self {
            id,
            kind,
            priority_tier,
            target,
            config,
        }
    }
}

/// Validated, kind-specific rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleConstraint {
    /// Room id must equal `room_id`.
    ExactRoom { room_id: RoomId },
    /// Room type must equal `room_type_id`.
    RoomType { room_type_id: String },
    /// Room must carry `feature_name`.
    Feature { feature_name: String },
    /// With `low_mobility`, the room must be accessible.
    ProfessorMobility { low_mobility: bool },
}

impl RuleConstraint {
    /// Kind of this constraint.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleConstraint::ExactRoom { .. } => RuleKind::ExactRoom,
            RuleConstraint::RoomType { .. } => RuleKind::RoomType,
            RuleConstraint::Feature { .. } => RuleKind::Feature,
            RuleConstraint::ProfessorMobility { .. } => RuleKind::ProfessorMobility,
        }
    }

    /// Whether a room satisfies this constraint.
    pub fn is_satisfied_by(&self, room: &Room) -> bool {
        match self {
            RuleConstraint::ExactRoom { room_id } => room.id == *room_id,
            RuleConstraint::RoomType { room_type_id } => {
                room.room_type_id.eq_ignore_ascii_case(room_type_id)
            }
            RuleConstraint::Feature { feature_name } => room.has_feature(feature_name),
            RuleConstraint::ProfessorMobility { low_mobility } => {
                !*low_mobility || room.is_accessible()
            }
        }
    }
}

/// A validated placement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique rule identifier.
    pub id: RuleId,
    /// 0 = hard, >0 = soft.
    pub priority_tier: u32,
    /// Course or professor the rule applies to.
    pub target: RuleTarget,
    /// Kind-specific constraint.
    pub constraint: RuleConstraint,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ExactRoomPayload {
    room_id: RoomId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RoomTypePayload {
    room_type_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FeaturePayload {
    feature_name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MobilityPayload {
    flag: bool,
}

impl Rule {
    /// Creates a rule from an already-typed constraint.
    pub fn new(id: RuleId, priority_tier: u32, target: RuleTarget, constraint: RuleConstraint) -> Self {
        Self {
            id,
            priority_tier,
            target,
            constraint,
        }
    }

    /// Hard exact-room rule for a course.
    pub fn exact_room(id: RuleId, course_code: impl Into<String>, room_id: RoomId) -> Self {
        Self::new(
            id,
            0,
            RuleTarget::Course(course_code.into()),
            RuleConstraint::ExactRoom { room_id },
        )
    }

    /// Hard room-type rule for a course.
    pub fn room_type(id: RuleId, course_code: impl Into<String>, room_type_id: impl Into<String>) -> Self {
        Self::new(
            id,
            0,
            RuleTarget::Course(course_code.into()),
            RuleConstraint::RoomType {
                room_type_id: room_type_id.into(),
            },
        )
    }

    /// Hard feature rule for a course.
    pub fn feature(id: RuleId, course_code: impl Into<String>, feature_name: impl Into<String>) -> Self {
        Self::new(
            id,
            0,
            RuleTarget::Course(course_code.into()),
            RuleConstraint::Feature {
                feature_name: feature_name.into(),
            },
        )
    }

    /// Hard low-mobility rule for a professor.
    pub fn low_mobility(id: RuleId, professor: impl Into<String>) -> Self {
        Self::new(
            id,
            0,
            RuleTarget::Professor(professor.into()),
            RuleConstraint::ProfessorMobility { low_mobility: true },
        )
    }

    /// Sets the priority tier.
    pub fn with_tier(mut self, priority_tier: u32) -> Self {
        self.priority_tier = priority_tier;
        self
    }

    /// Validates a raw record against its declared kind.
    ///
    /// # Errors
    /// Returns [`RuleConfigError`] when the payload is missing keys, has
    /// unknown keys, has wrongly typed values or names an empty tag.
    pub fn try_from_record(record: &RuleRecord) -> Result<Self, RuleConfigError> {
        let err = |message: String| RuleConfigError {
            rule_id: record.id,
            kind: record.kind,
            message,
        };

        let constraint = match record.kind {
            RuleKind::ExactRoom => {
                let p: ExactRoomPayload = decode(&record.config).map_err(err)?;
                RuleConstraint::ExactRoom { room_id: p.room_id }
            }
            RuleKind::RoomType => {
                let p: RoomTypePayload = decode(&record.config).map_err(err)?;
                if p.room_type_id.trim().is_empty() {
                    return Err(err("roomTypeId must not be empty".into()));
                }
                RuleConstraint::RoomType {
                    room_type_id: p.room_type_id,
                }
            }
            RuleKind::Feature => {
                let p: FeaturePayload = decode(&record.config).map_err(err)?;
                if p.feature_name.trim().is_empty() {
                    return Err(err("featureName must not be empty".into()));
                }
                RuleConstraint::Feature {
                    feature_name: p.feature_name,
                }
            }
            RuleKind::ProfessorMobility => {
                let p: MobilityPayload = decode(&record.config).map_err(err)?;
                RuleConstraint::ProfessorMobility {
                    low_mobility: p.flag,
                }
            }
        };

        let (RuleTarget::Course(s) | RuleTarget::Professor(s)) = &record.target;
        if s.trim().is_empty() {
            return Err(err("rule target must not be empty".into()));
        }

        Ok(Self::new(record.id, record.priority_tier, record.target.clone(), constraint))
    }

    /// Converts back to the raw storage shape.
    pub fn to_record(&self) -> RuleRecord {
        let config = match &self.constraint {
            RuleConstraint::ExactRoom { room_id } => json!({ "roomId": room_id }),
            RuleConstraint::RoomType { room_type_id } => json!({ "roomTypeId": room_type_id }),
            RuleConstraint::Feature { feature_name } => json!({ "featureName": feature_name }),
            RuleConstraint::ProfessorMobility { low_mobility } => json!({ "flag": low_mobility }),
        };
        RuleRecord::new(
            self.id,
            self.kind(),
            self.priority_tier,
            self.target.clone(),
            config,
        )
    }

    /// Kind of this rule.
    #[inline]
    pub fn kind(&self) -> RuleKind {
        self.constraint.kind()
    }

    /// Tier 0 rules are mandatory.
    #[inline]
    pub fn is_hard(&self) -> bool {
        self.priority_tier == 0
    }

    /// Whether the rule is attached to this demand.
    pub fn applies_to(&self, demand: &Demand) -> bool {
        match &self.target {
            RuleTarget::Course(code) => demand.course_key() == course_key(code),
            RuleTarget::Professor(name) => demand.has_professor(name),
        }
    }

    /// Whether a room satisfies this rule.
    #[inline]
    pub fn is_satisfied_by(&self, room: &Room) -> bool {
        self.constraint.is_satisfied_by(room)
    }
}

fn decode<T: DeserializeOwned>(config: &Value) -> Result<T, String> {
    if !config.is_object() {
        return Err(format!("payload must be an object, got {config}"));
    }
    serde_json::from_value(config.clone()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: RuleKind, config: Value) -> RuleRecord {
        RuleRecord::new(1, kind, 0, RuleTarget::Course("MAT201".into()), config)
    }

    #[test]
    fn test_exact_room_payload() {
        let rule = Rule::try_from_record(&record(RuleKind::ExactRoom, json!({"roomId": 12}))).unwrap();
        assert_eq!(rule.constraint, RuleConstraint::ExactRoom { room_id: 12 });
        assert!(rule.is_hard());
        assert!(rule.is_satisfied_by(&Room::new(12, 10)));
        assert!(!rule.is_satisfied_by(&Room::new(13, 10)));
    }

    #[test]
    fn test_payload_kind_mismatch() {
        let err = Rule::try_from_record(&record(RuleKind::ExactRoom, json!({"roomTypeId": "Lab"})))
            .unwrap_err();
        assert_eq!(err.rule_id, 1);
        assert_eq!(err.kind, RuleKind::ExactRoom);

        assert!(Rule::try_from_record(&record(RuleKind::ExactRoom, json!({"roomId": "twelve"}))).is_err());
        assert!(Rule::try_from_record(&record(RuleKind::Feature, Value::Null)).is_err());
        assert!(Rule::try_from_record(&record(RuleKind::Feature, json!({"featureName": "  "}))).is_err());
    }

    #[test]
    fn test_empty_target_rejected() {
        let rec = RuleRecord::new(2, RuleKind::ProfessorMobility, 0, RuleTarget::Professor(" ".into()), json!({"flag": true}));
        assert!(Rule::try_from_record(&rec).is_err());
        let rec = RuleRecord::new(3, RuleKind::ExactRoom, 0, RuleTarget::Course("".into()), json!({"roomId": 1}));
        assert!(Rule::try_from_record(&rec).is_err());
    }

    #[test]
    fn test_mobility_payload() {
        let rec = RuleRecord::new(
            4,
            RuleKind::ProfessorMobility,
            0,
            RuleTarget::Professor("Ana Souza".into()),
            json!({"flag": true}),
        );
        let rule = Rule::try_from_record(&rec).unwrap();
        assert!(rule.is_satisfied_by(&Room::new(1, 10)));
        assert!(!rule.is_satisfied_by(&Room::new(2, 10).with_floor(3)));

        let off = Rule::new(
            5,
            0,
            RuleTarget::Professor("Ana".into()),
            RuleConstraint::ProfessorMobility { low_mobility: false },
        );
        assert!(off.is_satisfied_by(&Room::new(2, 10).with_floor(3)));
    }

    #[test]
    fn test_record_round_trip() {
        let rule = Rule::room_type(9, "MAT201", "Lecture Hall").with_tier(2);
        let back = Rule::try_from_record(&rule.to_record()).unwrap();
        assert_eq!(back, rule);
        assert!(!back.is_hard());
    }

    #[test]
    fn test_applies_to() {
        let d = Demand::new(1, "t", "MAT201").with_professors("Ana Souza, Bruno");
        assert!(Rule::exact_room(1, "mat201", 3).applies_to(&d));
        assert!(!Rule::exact_room(1, "MAT202", 3).applies_to(&d));
        let padded = Demand::new(2, "t", "MAT201 ");
        assert!(Rule::exact_room(1, "MAT201", 3).applies_to(&padded));
        assert!(Rule::room_type(2, " mat201", "Lab").applies_to(&padded));
        assert!(Rule::low_mobility(2, "bruno").applies_to(&d));
        assert!(!Rule::low_mobility(2, "Carla").applies_to(&d));
    }

    #[test]
    fn test_room_type_and_feature() {
        let hall = Room::new(1, 80).with_type("Lecture Hall").with_feature("projector");
        assert!(Rule::room_type(1, "X", "lecture hall").is_satisfied_by(&hall));
        assert!(!Rule::room_type(1, "X", "Lab").is_satisfied_by(&hall));
        assert!(Rule::feature(2, "X", "projector").is_satisfied_by(&hall));
        assert!(!Rule::feature(2, "X", "smartboard").is_satisfied_by(&hall));
    }

    #[test]
    fn test_record_deserialize() {
        let json = r#"{"id": 3, "kind": "FEATURE", "priorityTier": 1,
                       "target": {"course": "PHY301"}, "config": {"featureName": "lab-bench"}}"#;
        let rec: RuleRecord = serde_json::from_str(json).unwrap();
        let rule = Rule::try_from_record(&rec).unwrap();
        assert_eq!(rule.kind(), RuleKind::Feature);
        assert_eq!(rule.priority_tier, 1);
    }
}
