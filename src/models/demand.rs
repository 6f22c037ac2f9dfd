//! Demand (course offering) model.
//!
//! A demand is one course offering that needs a room for one term. It is
//! immutable once imported and yields at most one allocation per term.

use serde::{Deserialize, Serialize};

use super::DemandId;

/// A course offering needing a room and weekly time slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demand {
    /// Unique demand identifier.
    pub id: DemandId,
    /// Term (semester) this offering belongs to.
    pub term_id: String,
    /// Course code (e.g., "MAT201").
    pub course_code: String,
    /// Course name.
    pub course_name: String,
    /// Free-text list of professors, as exported by the catalog.
    pub professors_text: String,
    /// Requested seats (enrollment size).
    pub vagas: u32,
    /// Raw weekly schedule code (e.g., "24M12 6T34").
    pub raw_schedule_code: String,
    /// Academic level (undergraduate, graduate, …).
    pub level: String,
}

impl Demand {
    /// Creates a demand with the given id, term and course code.
    pub fn new(id: DemandId, term_id: impl Into<String>, course_code: impl Into<String>) -> Self {
        Self {
            id,
            term_id: term_id.into(),
            course_code: course_code.into(),
            course_name: String::new(),
            professors_text: String::new(),
            vagas: 0,
            raw_schedule_code: String::new(),
            level: String::new(),
        }
    }

    /// Sets the course name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.course_name = name.into();
        self
    }

    /// Sets the professors text.
    pub fn with_professors(mut self, professors: impl Into<String>) -> Self {
        self.professors_text = professors.into();
        self
    }

    /// Sets the requested seats.
    pub fn with_vagas(mut self, vagas: u32) -> Self {
        self.vagas = vagas;
        self
    }

    /// Sets the raw schedule code.
    pub fn with_schedule(mut self, code: impl Into<String>) -> Self {
        self.raw_schedule_code = code.into();
        self
    }

    /// Sets the academic level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Normalized course code used for rule and history matching.
    pub fn course_key(&self) -> String {
        course_key(&self.course_code)
    }

    /// Individual professor names from the free-text list.
    ///
    /// Names are separated by `,`, `;`, `/`, `&` or the word `e`; each
    /// name is trimmed and empty entries are dropped.
    pub fn professors(&self) -> Vec<String> {
        self.professors_text
            .split([',', ';', '/', '&'])
            .flat_map(|part| part.split(" e "))
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether a professor is listed (case-insensitive).
    pub fn has_professor(&self, name: &str) -> bool {
        let wanted = professor_key(name);
        !wanted.is_empty() && self.professors().iter().any(|p| professor_key(p) == wanted)
    }
}

/// Trimmed, uppercased course code.
pub fn course_key(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Trimmed, lowercased professor name.
pub fn professor_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_builder() {
        let d = Demand::new(7, "2024.1", "MAT201")
            .with_name("Linear Algebra")
            .with_professors("Ana Souza")
            .with_vagas(60)
            .with_schedule("24M12")
            .with_level("undergraduate");

        assert_eq!(d.id, 7);
        assert_eq!(d.term_id, "2024.1");
        assert_eq!(d.course_code, "MAT201");
        assert_eq!(d.vagas, 60);
        assert_eq!(d.raw_schedule_code, "24M12");
    }

    #[test]
    fn test_professor_split() {
        let d = Demand::new(1, "t", "C")
            .with_professors("Ana Souza, Bruno Lima; Carla Dias / Davi e Eva & Fábio");
        assert_eq!(
            d.professors(),
            vec!["Ana Souza", "Bruno Lima", "Carla Dias", "Davi", "Eva", "Fábio"]
        );
    }

    #[test]
    fn test_has_professor_case_insensitive() {
        let d = Demand::new(1, "t", "C").with_professors("Ana Souza, Élio Reis");
        assert!(d.has_professor("ana souza"));
        assert!(d.has_professor("  ANA SOUZA "));
        assert!(d.has_professor("élio reis"));
        assert!(!d.has_professor("Bruno"));
        assert!(!d.has_professor(""));
    }

    #[test]
    fn test_course_key_normalized() {
        let d = Demand::new(1, "t", " mat201 ");
        assert_eq!(d.course_key(), "MAT201");
        assert_eq!(course_key("MAT201\t"), d.course_key());
    }

    #[test]
    fn test_demand_serde_camel_case() {
        let json = r#"{
            "id": 3, "termId": "2024.2", "courseCode": "HIS101",
            "courseName": "History", "professorsText": "X",
            "vagas": 40, "rawScheduleCode": "35T12", "level": "ug"
        }"#;
        let d: Demand = serde_json::from_str(json).unwrap();
        assert_eq!(d.course_code, "HIS101");
        assert_eq!(d.raw_schedule_code, "35T12");
    }
}
