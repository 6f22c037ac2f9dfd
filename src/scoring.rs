//! Candidate scorer.
//!
//! Scores a `(demand, room)` pair from hard-rule compliance, professor
//! preferences, capacity and allocation history:
//!
//! ```text
//! hardCompliance  = 4 × |hard rules satisfied|   (0 if any is violated)
//! preferenceScore = 2 × |preferred rooms matching| + 2 × |preferred features present|
//! capacityScore   = 1 if capacity ≥ vagas
//! historyScore    = |prior-term rows with the same course and room|
//! total           = hardCompliance + preferenceScore + capacityScore + historyScore
//! ```
//!
//! Point values come from [`ScoreWeights`]. A room violating a hard rule
//! is disqualified and its total is reported as 0.
//!
//! Scoring is read-only, so a demand's candidates can be scored in
//! parallel; ranking is total descending, then room id ascending.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;
use serde::Serialize;
use tracing::trace;

use crate::classifier::Classification;
use crate::config::ScoreWeights;
use crate::models::{
    course_key, professor_key, Demand, HistoricalAllocation, PreferenceLink, Room, RoomId, Rule,
};

/// Score breakdown of one candidate room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    /// Candidate room.
    pub room_id: RoomId,
    /// Every hard rule is satisfied.
    pub hard_ok: bool,
    /// The room seats the whole demand.
    pub fits: bool,
    pub hard_compliance: u32,
    pub preference: u32,
    pub capacity: u32,
    pub history: u32,
    /// Satisfied soft-tier rules (0 with default weights).
    pub soft: u32,
    /// Sum of the components, or 0 when disqualified.
    pub total: u32,
}

impl CandidateScore {
    /// Sum of the soft components, ignoring disqualification.
    pub fn raw_total(&self) -> u32 {
        self.hard_compliance
            .saturating_add(self.preference)
            .saturating_add(self.capacity)
            .saturating_add(self.history)
            .saturating_add(self.soft)
    }

    /// Ranking order: total descending, then room id ascending.
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        other
            .total
            .cmp(&self.total)
            .then(self.room_id.cmp(&other.room_id))
    }
}

/// Precomputed scoring inputs for one run.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    weights: ScoreWeights,
    term_id: String,
    // professor (lowercase) -> preferred rooms
    room_prefs: HashMap<String, Vec<RoomId>>,
    // professor (lowercase) -> preferred features
    feature_prefs: HashMap<String, Vec<String>>,
    // course code (uppercase) -> room -> prior-term allocations
    history: HashMap<String, HashMap<RoomId, u32>>,
}

impl CandidateScorer {
    /// Indexes preferences and history for a term.
    ///
    /// History rows for `term_id` itself are ignored.
    pub fn new(
        weights: ScoreWeights,
        term_id: impl Into<String>,
        preferences: &[PreferenceLink],
        history: &[HistoricalAllocation],
    ) -> Self {
        let term_id = term_id.into();

        let mut room_prefs: HashMap<String, Vec<RoomId>> = HashMap::new();
        let mut feature_prefs: HashMap<String, Vec<String>> = HashMap::new();
        for link in preferences {
            let key = professor_key(link.professor());
            match link {
                PreferenceLink::Room { room_id, .. } => {
                    room_prefs.entry(key).or_default().push(*room_id)
                }
                PreferenceLink::Feature { feature, .. } => {
                    feature_prefs.entry(key).or_default().push(feature.clone())
                }
            }
        }

        let mut counts: HashMap<String, HashMap<RoomId, u32>> = HashMap::new();
        for row in history.iter().filter(|h| h.term_id != term_id) {
            *counts
                .entry(course_key(&row.course_code))
                .or_default()
                .entry(row.room_id)
                .or_default() += 1;
        }

        Self {
            weights,
            term_id,
            room_prefs,
            feature_prefs,
            history: counts,
        }
    }

    /// Term being scheduled.
    pub fn term_id(&self) -> &str {
        &self.term_id
    }

    /// Whether any preference or prior-term history applies to the demand.
    pub fn has_soft_signal(&self, demand: &Demand) -> bool {
        let has_pref = demand.professors().iter().any(|p| {
            let key = professor_key(p);
            self.room_prefs.contains_key(&key) || self.feature_prefs.contains_key(&key)
        });
        has_pref || self.history.contains_key(&demand.course_key())
    }

    /// Gathers everything needed to score rooms for one demand.
    pub fn prepare<'a>(&'a self, demand: &'a Demand, class: &'a Classification) -> DemandScoring<'a> {
        let mut preferred_rooms: HashMap<RoomId, u32> = HashMap::new();
        let mut preferred_features: Vec<&'a str> = Vec::new();
        // a name listed twice counts once
        let keys: BTreeSet<String> = demand.professors().iter().map(|p| professor_key(p)).collect();
        for key in &keys {
            if let Some(rooms) = self.room_prefs.get(key) {
                for &room_id in rooms {
                    *preferred_rooms.entry(room_id).or_default() += 1;
                }
            }
            if let Some(features) = self.feature_prefs.get(key) {
                preferred_features.extend(features.iter().map(String::as_str));
            }
        }

        DemandScoring {
            weights: &self.weights,
            demand,
            hard: &class.hard,
            soft: &class.soft,
            preferred_rooms,
            preferred_features,
            history: self.history.get(&demand.course_key()),
        }
    }
}

/// Scoring view of one demand.
#[derive(Debug)]
pub struct DemandScoring<'a> {
    weights: &'a ScoreWeights,
    demand: &'a Demand,
    hard: &'a [Rule],
    soft: &'a [Rule],
    preferred_rooms: HashMap<RoomId, u32>,
    preferred_features: Vec<&'a str>,
    history: Option<&'a HashMap<RoomId, u32>>,
}

impl DemandScoring<'_> {
    /// Whether the room satisfies every hard rule.
    pub fn is_hard_compliant(&self, room: &Room) -> bool {
        self.hard.iter().all(|r| r.is_satisfied_by(room))
    }

    /// Scores one room.
    pub fn score(&self, room: &Room) -> CandidateScore {
        let w = self.weights;
        let hard_ok = self.is_hard_compliant(room);
        let hard_compliance = if hard_ok {
            w.hard_rule.saturating_mul(count(self.hard.len()))
        } else {
            0
        };

        let room_matches = self.preferred_rooms.get(&room.id).copied().unwrap_or(0);
        let feature_matches = self
            .preferred_features
            .iter()
            .filter(|f| room.has_feature(f))
            .count();
        let preference = w
            .preferred_room
            .saturating_mul(room_matches)
            .saturating_add(w.preferred_feature.saturating_mul(count(feature_matches)));

        let fits = room.fits(self.demand.vagas);
        let capacity = if fits { w.capacity } else { 0 };

        let history = w.history.saturating_mul(
            self.history
                .and_then(|h| h.get(&room.id))
                .copied()
                .unwrap_or(0),
        );

        let soft_matches = self.soft.iter().filter(|r| r.is_satisfied_by(room)).count();
        let soft = w.soft_rule.saturating_mul(count(soft_matches));

        let mut score = CandidateScore {
            room_id: room.id,
            hard_ok,
            fits,
            hard_compliance,
            preference,
            capacity,
            history,
            soft,
            total: 0,
        };
        if hard_ok {
            score.total = score.raw_total();
        }
        trace!(
            demand_id = self.demand.id,
            room_id = room.id,
            hard_ok,
            total = score.total,
            "scored candidate"
        );
        score
    }

    /// Scores every room and sorts best first.
    pub fn rank(&self, rooms: &[Room], parallel: bool) -> Vec<CandidateScore> {
        let mut scores: Vec<CandidateScore> = if parallel {
            rooms.par_iter().map(|r| self.score(r)).collect()
        } else {
            rooms.iter().map(|r| self.score(r)).collect()
        };
        scores.sort_by(CandidateScore::cmp_rank);
        scores
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RuleSet;

    fn scorer(prefs: &[PreferenceLink], history: &[HistoricalAllocation]) -> CandidateScorer {
        CandidateScorer::new(ScoreWeights::default(), "2024.2", prefs, history)
    }

    #[test]
    fn test_mat201_breakdown() {
        let demand = Demand::new(1, "2024.2", "MAT201")
            .with_professors("Ana")
            .with_vagas(60);
        let rooms = vec![
            Room::new(1, 80).with_type("Lecture Hall"),
            Room::new(2, 40).with_type("Standard"),
        ];
        let rules = RuleSet::new(vec![Rule::room_type(1, "MAT201", "Lecture Hall")]);
        let history = vec![
            HistoricalAllocation::new("MAT201", 1, "2023.1"),
            HistoricalAllocation::new("MAT201", 1, "2023.2"),
            HistoricalAllocation::new("MAT201", 2, "2024.1"),
        ];
        let prefs = vec![PreferenceLink::room("Ana", 1)];
        let s = scorer(&prefs, &history);
        let class = rules.classify(&demand);
        let view = s.prepare(&demand, &class);

        let a = view.score(&rooms[0]);
        assert!(a.hard_ok);
        assert_eq!(
            (a.hard_compliance, a.preference, a.capacity, a.history),
            (4, 2, 1, 2)
        );
        assert_eq!(a.total, 9);

        let b = view.score(&rooms[1]);
        assert!(!b.hard_ok);
        assert_eq!(b.total, 0);
        assert_eq!(b.history, 1);

        let ranked = view.rank(&rooms, false);
        assert_eq!(ranked[0].room_id, 1);
    }

    #[test]
    fn test_his101_history_beats_preference() {
        let demand = Demand::new(1, "2024.2", "HIS101")
            .with_professors("Bruno")
            .with_vagas(45);
        let rooms = vec![Room::new(5, 50), Room::new(15, 60)];
        let prefs = vec![PreferenceLink::room("Bruno", 5), PreferenceLink::room("Bruno", 10)];
        let history: Vec<_> = ["2022.1", "2022.2", "2023.1"]
            .iter()
            .map(|t| HistoricalAllocation::new("HIS101", 15, *t))
            .collect();
        let s = scorer(&prefs, &history);
        let class = RuleSet::default().classify(&demand);
        let ranked = s.prepare(&demand, &class).rank(&rooms, false);

        assert_eq!(ranked[0].room_id, 15);
        assert_eq!(ranked[0].total, 4);
        assert_eq!(ranked[1].total, 3);
    }

    #[test]
    fn test_current_term_history_ignored() {
        let demand = Demand::new(1, "2024.2", "X").with_vagas(10);
        let history = vec![HistoricalAllocation::new("X", 1, "2024.2")];
        let s = scorer(&[], &history);
        assert!(!s.has_soft_signal(&demand));
        let class = RuleSet::default().classify(&demand);
        assert_eq!(s.prepare(&demand, &class).score(&Room::new(1, 10)).history, 0);
    }

    #[test]
    fn test_feature_preference_and_signal() {
        let demand = Demand::new(1, "t", "X").with_professors("Ana; Bruno").with_vagas(100);
        let prefs = vec![
            PreferenceLink::feature("ana", "projector"),
            PreferenceLink::feature("BRUNO", "smartboard"),
        ];
        let s = CandidateScorer::new(ScoreWeights::default(), "t", &prefs, &[]);
        assert!(s.has_soft_signal(&demand));

        let class = RuleSet::default().classify(&demand);
        let view = s.prepare(&demand, &class);
        let room = Room::new(1, 30).with_feature("Projector").with_feature("smartboard");
        let score = view.score(&room);
        assert_eq!(score.preference, 4);
        assert!(!score.fits);
        assert_eq!(score.capacity, 0);
        assert_eq!(score.total, 4);
    }

    #[test]
    fn test_soft_rule_weight() {
        let demand = Demand::new(1, "t", "X");
        let rules = RuleSet::new(vec![Rule::feature(1, "X", "projector").with_tier(1)]);
        let class = rules.classify(&demand);
        let room = Room::new(1, 10).with_feature("projector");

        let s = CandidateScorer::new(ScoreWeights::default(), "t", &[], &[]);
        assert_eq!(s.prepare(&demand, &class).score(&room).soft, 0);

        let weights = ScoreWeights {
            soft_rule: 3,
            ..ScoreWeights::default()
        };
        let s = CandidateScorer::new(weights, "t", &[], &[]);
        assert_eq!(s.prepare(&demand, &class).score(&room).soft, 3);
    }

    #[test]
    fn test_large_weights_saturate() {
        let demand = Demand::new(1, "2024.2", "X").with_vagas(10);
        let history = vec![
            HistoricalAllocation::new("X", 1, "2023.1"),
            HistoricalAllocation::new("X", 1, "2023.2"),
        ];
        let weights = ScoreWeights {
            history: 4_000_000_000,
            ..ScoreWeights::default()
        };
        let s = CandidateScorer::new(weights, "2024.2", &[], &history);
        let class = RuleSet::default().classify(&demand);
        let view = s.prepare(&demand, &class);

        let a = view.score(&Room::new(1, 20));
        assert_eq!(a.history, u32::MAX);
        assert_eq!(a.total, u32::MAX);
        let ranked = view.rank(&[Room::new(2, 20), Room::new(1, 20)], false);
        assert_eq!(ranked[0].room_id, 1);
    }

    #[test]
    fn test_repeated_professor_counted_once() {
        let demand = Demand::new(1, "t", "X").with_professors("Ana, ana ; ANA ");
        let prefs = vec![PreferenceLink::room("Ana", 1), PreferenceLink::feature("ana", "projector")];
        let s = CandidateScorer::new(ScoreWeights::default(), "t", &prefs, &[]);
        let class = RuleSet::default().classify(&demand);
        let score = s
            .prepare(&demand, &class)
            .score(&Room::new(1, 10).with_feature("projector"));
        assert_eq!(score.preference, 4);
    }

    #[test]
    fn test_padded_course_code_matches_history() {
        let demand = Demand::new(1, "2024.2", "his101 ");
        let history = vec![HistoricalAllocation::new("HIS101", 15, "2023.1")];
        let s = scorer(&[], &history);
        assert!(s.has_soft_signal(&demand));
    }

    #[test]
    fn test_tie_break_by_room_id() {
        let demand = Demand::new(1, "t", "X").with_vagas(10);
        let rooms = vec![Room::new(9, 20), Room::new(3, 20), Room::new(4, 5)];
        let s = scorer(&[], &[]);
        let class = RuleSet::default().classify(&demand);
        let view = s.prepare(&demand, &class);
        let ids: Vec<_> = view.rank(&rooms, false).iter().map(|c| c.room_id).collect();
        assert_eq!(ids, vec![3, 9, 4]);

        let par: Vec<_> = view.rank(&rooms, true).iter().map(|c| c.room_id).collect();
        assert_eq!(par, ids);
    }
}
