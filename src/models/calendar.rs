//! Weekly calendar model.
//!
//! Defines the discrete weekly grid every demand is placed on: a weekday
//! digit, a turn (morning/afternoon/evening) and a block index inside the
//! turn. A `(weekday, block)` pair is one atomic unit of room occupancy.
//!
//! # Time Model
//! Block wall-clock times are minutes since midnight. They are a fixed
//! lookup consulted for reporting and validation; the allocator itself only
//! compares slots for equality.
//!
//! # Numbering
//! Weekday digits follow the registrar convention: 1 = Sunday, 2 = Monday,
//! …, 7 = Saturday. The default calendar opens Monday through Saturday.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::CalendarError;

/// A weekday digit (1 = Sunday … 7 = Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekday(pub u8);

impl Weekday {
    /// Monday.
    pub const MONDAY: Weekday = Weekday(2);
    /// Tuesday.
    pub const TUESDAY: Weekday = Weekday(3);
    /// Wednesday.
    pub const WEDNESDAY: Weekday = Weekday(4);
    /// Thursday.
    pub const THURSDAY: Weekday = Weekday(5);
    /// Friday.
    pub const FRIDAY: Weekday = Weekday(6);
    /// Saturday.
    pub const SATURDAY: Weekday = Weekday(7);

    /// Whether the digit names a real day (1..=7).
    #[inline]
    pub fn is_valid(self) -> bool {
        (1..=7).contains(&self.0)
    }

    /// Short English name ("Mon", "Tue", …).
    pub fn short_name(self) -> &'static str {
        match self.0 {
            1 => "Sun",
            2 => "Mon",
            3 => "Tue",
            4 => "Wed",
            5 => "Thu",
            6 => "Fri",
            7 => "Sat",
            _ => "?",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Part of the day a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Turn {
    /// `M`
    Morning,
    /// `T`
    Afternoon,
    /// `N`
    Evening,
}

impl Turn {
    /// Parses a turn letter (case-insensitive).
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'M' => Some(Turn::Morning),
            'T' => Some(Turn::Afternoon),
            'N' => Some(Turn::Evening),
            _ => None,
        }
    }

    /// Canonical upper-case letter.
    pub fn letter(self) -> char {
        match self {
            Turn::Morning => 'M',
            Turn::Afternoon => 'T',
            Turn::Evening => 'N',
        }
    }
}

/// A block inside a turn, written `M1`, `T4`, `N2`, ….
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockCode {
    /// Turn of the day.
    pub turn: Turn,
    /// 1-based block index within the turn.
    pub index: u8,
}

impl BlockCode {
    /// Creates a block code.
    pub fn new(turn: Turn, index: u8) -> Self {
        Self { turn, index }
    }

    /// Morning block.
    pub fn morning(index: u8) -> Self {
        Self::new(Turn::Morning, index)
    }

    /// Afternoon block.
    pub fn afternoon(index: u8) -> Self {
        Self::new(Turn::Afternoon, index)
    }

    /// Evening block.
    pub fn evening(index: u8) -> Self {
        Self::new(Turn::Evening, index)
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.turn.letter(), self.index)
    }
}

impl TryFrom<String> for BlockCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut chars = value.chars();
        let turn = chars
            .next()
            .and_then(Turn::from_letter)
            .ok_or_else(|| format!("invalid block code '{value}'"))?;
        let index: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("invalid block code '{value}'"))?;
        Ok(Self::new(turn, index))
    }
}

impl From<BlockCode> for String {
    fn from(code: BlockCode) -> Self {
        code.to_string()
    }
}

/// One atomic unit of weekly occupancy: a weekday and a block.
///
/// Ordered by weekday, then turn, then block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Day of the week.
    pub weekday: Weekday,
    /// Block within the day.
    pub block: BlockCode,
}

impl TimeSlot {
    /// Creates a time slot.
    pub fn new(weekday: Weekday, block: BlockCode) -> Self {
        Self { weekday, block }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.weekday, self.block)
    }
}

/// Wall-clock interval of a block, in minutes since midnight: [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    /// Start (minutes, inclusive).
    pub start_min: u16,
    /// End (minutes, exclusive).
    pub end_min: u16,
}

impl BlockWindow {
    /// Creates a window from `(hour, minute)` pairs.
    pub fn hm(start: (u16, u16), end: (u16, u16)) -> Self {
        Self {
            start_min: start.0 * 60 + start.1,
            end_min: end.0 * 60 + end.1,
        }
    }

    /// Duration in minutes (0 when inverted).
    #[inline]
    pub fn duration_min(&self) -> u16 {
        self.end_min.saturating_sub(self.start_min)
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }
}

/// A block code together with its wall-clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Block code.
    pub code: BlockCode,
    /// Wall-clock window.
    pub window: BlockWindow,
}

/// The fixed weekly lookup of open weekdays and defined blocks.
///
/// A schedule code may only reference weekdays and blocks present here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCalendar {
    /// Calendar identifier.
    pub id: String,
    /// Weekdays on which rooms can be booked.
    pub weekdays: BTreeSet<Weekday>,
    /// Block definitions.
    pub blocks: Vec<BlockDefinition>,
}

impl BlockCalendar {
    /// Creates an empty calendar.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weekdays: BTreeSet::new(),
            blocks: Vec::new(),
        }
    }

    /// The standard registrar grid: Monday to Saturday, six morning,
    /// six afternoon and four evening blocks.
    pub fn standard() -> Self {
        let mut cal = Self::new("standard");
        for d in 2..=7 {
            cal.weekdays.insert(Weekday(d));
        }
        let morning = [
            ((7, 0), (7, 50)),
            ((7, 50), (8, 40)),
            ((8, 55), (9, 45)),
            ((9, 45), (10, 35)),
            ((10, 50), (11, 40)),
            ((11, 40), (12, 30)),
        ];
        let afternoon = [
            ((13, 0), (13, 50)),
            ((13, 50), (14, 40)),
            ((14, 55), (15, 45)),
            ((15, 45), (16, 35)),
            ((16, 50), (17, 40)),
            ((17, 40), (18, 30)),
        ];
        let evening = [
            ((18, 45), (19, 35)),
            ((19, 35), (20, 25)),
            ((20, 35), (21, 25)),
            ((21, 25), (22, 15)),
        ];
        for (turn, table) in [
            (Turn::Morning, &morning[..]),
            (Turn::Afternoon, &afternoon[..]),
            (Turn::Evening, &evening[..]),
        ] {
            for (i, &(start, end)) in table.iter().enumerate() {
                cal.blocks.push(BlockDefinition {
                    code: BlockCode::new(turn, i as u8 + 1),
                    window: BlockWindow::hm(start, end),
                });
            }
        }
        cal
    }

    /// Opens a weekday.
    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekdays.insert(weekday);
        self
    }

    /// Defines a block.
    pub fn with_block(mut self, code: BlockCode, window: BlockWindow) -> Self {
        self.blocks.push(BlockDefinition { code, window });
        self
    }

    /// Whether a weekday is open.
    #[inline]
    pub fn has_weekday(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday)
    }

    /// Looks up a block's wall-clock window.
    pub fn window(&self, code: BlockCode) -> Option<BlockWindow> {
        self.blocks.iter().find(|b| b.code == code).map(|b| b.window)
    }

    /// Whether a block is defined.
    #[inline]
    pub fn has_block(&self, code: BlockCode) -> bool {
        self.window(code).is_some()
    }

    /// Whether a slot lies on this calendar's grid.
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.has_weekday(slot.weekday) && self.has_block(slot.block)
    }

    /// Number of bookable slots per room per week.
    pub fn weekly_slot_count(&self) -> usize {
        self.weekdays.len() * self.blocks.len()
    }

    /// Checks the lookup table itself.
    ///
    /// A malformed calendar aborts an allocation run before any demand
    /// is considered.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.weekdays.is_empty() {
            return Err(CalendarError::NoWeekdays(self.id.clone()));
        }
        if self.blocks.is_empty() {
            return Err(CalendarError::NoBlocks(self.id.clone()));
        }
        if let Some(bad) = self.weekdays.iter().find(|d| !d.is_valid()) {
            return Err(CalendarError::InvalidWeekday(bad.0));
        }

        for (i, def) in self.blocks.iter().enumerate() {
            if def.code.index == 0 || def.code.index > 9 {
                return Err(CalendarError::InvalidBlockIndex(def.code.to_string()));
            }
            if def.window.end_min <= def.window.start_min {
                return Err(CalendarError::InvertedWindow(def.code.to_string()));
            }
            for other in &self.blocks[i + 1..] {
                if other.code == def.code {
                    return Err(CalendarError::DuplicateBlock(def.code.to_string()));
                }
                if other.window.overlaps(&def.window) {
                    return Err(CalendarError::OverlappingBlocks {
                        first: def.code.to_string(),
                        second: other.code.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for BlockCalendar {
    fn default() -> Self {
        Self::standard()
    }
}
