//! Soft-preference inputs: professor preferences and allocation history.
//!
//! Both are purely additive scoring signals. Neither ever disqualifies a
//! room.

use serde::{Deserialize, Serialize};

use super::RoomId;

/// A professor's preference for a room or for a room feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PreferenceLink {
    /// Professor prefers a specific room.
    #[serde(rename_all = "camelCase")]
    Room { professor: String, room_id: RoomId },
    /// Professor prefers rooms carrying a feature.
    Feature { professor: String, feature: String },
}

impl PreferenceLink {
    /// Room preference.
    pub fn room(professor: impl Into<String>, room_id: RoomId) -> Self {
        Self::Room {
            professor: professor.into(),
            room_id,
        }
    }

    /// Feature preference.
    pub fn feature(professor: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::Feature {
            professor: professor.into(),
            feature: feature.into(),
        }
    }

    /// Professor holding this preference.
    pub fn professor(&self) -> &str {
        match self {
            Self::Room { professor, .. } | Self::Feature { professor, .. } => professor,
        }
    }
}

/// A committed (course, room) pair from a previous term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAllocation {
    /// Course code.
    pub course_code: String,
    /// Room used.
    pub room_id: RoomId,
    /// Term of the allocation.
    pub term_id: String,
}

impl HistoricalAllocation {
    /// Creates a history row.
    pub fn new(course_code: impl Into<String>, room_id: RoomId, term_id: impl Into<String>) -> Self {
        Self {
            course_code: course_code.into(),
            room_id,
            term_id: term_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_professor() {
        assert_eq!(PreferenceLink::room("Ana", 5).professor(), "Ana");
        assert_eq!(PreferenceLink::feature("Bia", "projector").professor(), "Bia");
    }

    #[test]
    fn test_preference_serde() {
        let json = r#"[{"type": "room", "professor": "Ana", "roomId": 5},
                       {"type": "feature", "professor": "Ana", "feature": "projector"}]"#;
        let links: Vec<PreferenceLink> = serde_json::from_str(json).unwrap();
        assert_eq!(links[0], PreferenceLink::room("Ana", 5));
        assert_eq!(links[1], PreferenceLink::feature("Ana", "projector"));
    }

    #[test]
    fn test_history_serde() {
        let h = HistoricalAllocation::new("MAT201", 3, "2023.2");
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"courseCode\":\"MAT201\""));
        let back: HistoricalAllocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
