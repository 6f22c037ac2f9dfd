use serde::{Deserialize, Serialize};

use crate::models::{
    Allocation, BlockCalendar, Demand, HistoricalAllocation, PreferenceLink, Room, Rule,
    RuleRecord,
};
use crate::validation::{validate_input, ValidationResult};

/// Input container for one allocation run over one term.
///
/// All records are plain, fully materialized values; the engine never
/// reaches back into storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationRequest {
    /// Term being scheduled.
    pub term_id: String,
    /// Course offerings needing a room.
    pub demands: Vec<Demand>,
    /// Room pool.
    pub rooms: Vec<Room>,
    /// Raw rule records; malformed ones are reported and ignored.
    pub rules: Vec<RuleRecord>,
    /// Professor preferences.
    pub preferences: Vec<PreferenceLink>,
    /// Prior-term allocations. Rows for the current term are ignored.
    pub history: Vec<HistoricalAllocation>,
    /// Allocations already committed for this term.
    pub existing: Vec<Allocation>,
    /// Block lookup table.
    pub calendar: BlockCalendar,
}

impl AllocationRequest {
    /// Creates a request with the standard calendar and no rules.
    pub fn new(term_id: impl Into<String>, demands: Vec<Demand>, rooms: Vec<Room>) -> Self {
        Self {
            term_id: term_id.into(),
            demands,
            rooms,
            ..Default::default()
        }
    }

    /// Sets the raw rule records.
    pub fn with_rules(mut self, rules: Vec<RuleRecord>) -> Self {
        self.rules = rules;
        self
    }

    /// Adds an already-typed rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule.to_record());
        self
    }

    /// Sets professor preferences.
    pub fn with_preferences(mut self, preferences: Vec<PreferenceLink>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Adds one professor preference.
    pub fn with_preference(mut self, link: PreferenceLink) -> Self {
        self.preferences.push(link);
        self
    }

    /// Sets allocation history.
    pub fn with_history(mut self, history: Vec<HistoricalAllocation>) -> Self {
        self.history = history;
        self
    }

    /// Sets allocations committed by earlier runs.
    pub fn with_existing(mut self, existing: Vec<Allocation>) -> Self {
        self.existing = existing;
        self
    }

    /// Replaces the block calendar.
    pub fn with_calendar(mut self, calendar: BlockCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Runs global input validation.
    pub fn validate(&self) -> ValidationResult {
        validate_input(
            &self.term_id,
            &self.demands,
            &self.rooms,
            &self.rules,
            &self.existing,
        )
    }
}
