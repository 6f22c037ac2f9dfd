//! Schedule code parser.
//!
//! Decodes the compact weekly notation used by course catalogs into the set
//! of atomic `(weekday, block)` slots a demand occupies every week.
//!
//! # Notation
//!
//! One or more whitespace-separated groups, each written
//! `<weekday digits><turn letter><block digits>`:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `24M12` | Monday and Wednesday, morning blocks 1 and 2 |
//! | `6T34` | Friday, afternoon blocks 3 and 4 |
//! | `35N1234` | Tuesday and Thursday, all four evening blocks |
//!
//! Every weekday and every block referenced must exist in the
//! [`BlockCalendar`]. Parsing is pure; the result is ordered and free of
//! duplicates.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ScheduleParseError;
use crate::models::{BlockCalendar, BlockCode, TimeSlot, Turn, Weekday};

/// Parses a raw schedule code into its atomic slots.
///
/// # Errors
/// Returns [`ScheduleParseError`] when a group is missing its weekday
/// digits, turn letter or block digits, contains foreign characters,
/// references a weekday or block absent from `calendar`, or when the code
/// has no groups at all.
///
/// # Example
/// ```
/// use u_roomalloc::models::BlockCalendar;
/// use u_roomalloc::schedule_code::parse_schedule_code;
///
/// let cal = BlockCalendar::standard();
/// let slots = parse_schedule_code("24M12 6T3", &cal).unwrap();
/// assert_eq!(slots.len(), 5);
/// ```
pub fn parse_schedule_code(
    code: &str,
    calendar: &BlockCalendar,
) -> Result<BTreeSet<TimeSlot>, ScheduleParseError> {
    let mut slots = BTreeSet::new();
    for group in code.split_whitespace() {
        parse_group(group, calendar, &mut slots)?;
    }
    if slots.is_empty() {
        return Err(ScheduleParseError::Empty);
    }
    Ok(slots)
}

fn parse_group(
    group: &str,
    calendar: &BlockCalendar,
    out: &mut BTreeSet<TimeSlot>,
) -> Result<(), ScheduleParseError> {
    let owned = || group.to_string();
    let mut chars = group.chars().peekable();

    let mut weekdays = Vec::new();
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        weekdays.push(Weekday(d as u8));
        chars.next();
    }
    if weekdays.is_empty() {
        return match chars.peek() {
            Some(&c) if Turn::from_letter(c).is_none() => Err(ScheduleParseError::InvalidCharacter {
                group: owned(),
                ch: c,
            }),
            _ => Err(ScheduleParseError::MissingWeekday { group: owned() }),
        };
    }

    let turn = match chars.next() {
        None => return Err(ScheduleParseError::MissingTurn { group: owned() }),
        Some(c) => Turn::from_letter(c).ok_or_else(|| ScheduleParseError::InvalidCharacter {
            group: owned(),
            ch: c,
        })?,
    };

    let mut blocks = Vec::new();
    for c in chars {
        match c.to_digit(10) {
            Some(d) => blocks.push(BlockCode::new(turn, d as u8)),
            None => {
                return Err(ScheduleParseError::InvalidCharacter {
                    group: owned(),
                    ch: c,
                })
            }
        }
    }
    if blocks.is_empty() {
        return Err(ScheduleParseError::MissingBlock { group: owned() });
    }

    if let Some(day) = weekdays.iter().find(|d| !calendar.has_weekday(**d)) {
        return Err(ScheduleParseError::UnknownWeekday {
            group: owned(),
            weekday: day.0,
        });
    }
    if let Some(block) = blocks.iter().find(|b| !calendar.has_block(**b)) {
        return Err(ScheduleParseError::UnknownBlock {
            group: owned(),
            block: block.to_string(),
        });
    }

    for &weekday in &weekdays {
        for &block in &blocks {
            out.insert(TimeSlot::new(weekday, block));
        }
    }
    Ok(())
}

/// Renders slots back into canonical notation.
///
/// Weekdays sharing the same blocks in a turn are merged into one group;
/// groups are ordered by turn, then by block list, then by weekdays.
pub fn format_schedule_code<'a>(slots: impl IntoIterator<Item = &'a TimeSlot>) -> String {
    // (weekday, turn) -> block indices
    let mut per_day: BTreeMap<(Weekday, Turn), BTreeSet<u8>> = BTreeMap::new();
    for slot in slots {
        per_day
            .entry((slot.weekday, slot.block.turn))
            .or_default()
            .insert(slot.block.index);
    }

    // (turn, blocks) -> weekdays
    let mut groups: BTreeMap<(Turn, Vec<u8>), BTreeSet<Weekday>> = BTreeMap::new();
    for ((weekday, turn), indices) in per_day {
        groups
            .entry((turn, indices.into_iter().collect()))
            .or_default()
            .insert(weekday);
    }

    groups
        .into_iter()
        .map(|((turn, indices), weekdays)| {
            let days: String = weekdays.iter().map(|d| d.0.to_string()).collect();
            let blocks: String = indices.iter().map(|i| i.to_string()).collect();
            format!("{days}{}{blocks}", turn.letter())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cal() -> BlockCalendar {
        BlockCalendar::standard()
    }

    fn slot(day: u8, turn: Turn, index: u8) -> TimeSlot {
        TimeSlot::new(Weekday(day), BlockCode::new(turn, index))
    }

    #[test]
    fn test_single_group() {
        let slots = parse_schedule_code("24M12", &cal()).unwrap();
        let expected: BTreeSet<_> = [
            slot(2, Turn::Morning, 1),
            slot(2, Turn::Morning, 2),
            slot(4, Turn::Morning, 1),
            slot(4, Turn::Morning, 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(slots, expected);
    }

    #[test]
    fn test_multiple_groups_and_duplicates() {
        let slots = parse_schedule_code("  2M12   2M2 6n34 ", &cal()).unwrap();
        assert_eq!(slots.len(), 4);
        assert!(slots.contains(&slot(6, Turn::Evening, 3)));
        assert!(slots.contains(&slot(6, Turn::Evening, 4)));
    }

    #[test]
    fn test_deterministic() {
        let a = parse_schedule_code("35T45 2M1", &cal()).unwrap();
        let b = parse_schedule_code("2M1 35T45", &cal()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_code() {
        assert_eq!(parse_schedule_code("", &cal()), Err(ScheduleParseError::Empty));
        assert_eq!(parse_schedule_code("   ", &cal()), Err(ScheduleParseError::Empty));
    }

    #[test]
    fn test_missing_parts() {
        assert_eq!(
            parse_schedule_code("M12", &cal()),
            Err(ScheduleParseError::MissingWeekday { group: "M12".into() })
        );
        assert_eq!(
            parse_schedule_code("24", &cal()),
            Err(ScheduleParseError::MissingTurn { group: "24".into() })
        );
        assert_eq!(
            parse_schedule_code("24M", &cal()),
            Err(ScheduleParseError::MissingBlock { group: "24M".into() })
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            parse_schedule_code("24X1", &cal()),
            Err(ScheduleParseError::InvalidCharacter {
                group: "24X1".into(),
                ch: 'X'
            })
        );
        assert_eq!(
            parse_schedule_code("24M1a", &cal()),
            Err(ScheduleParseError::InvalidCharacter {
                group: "24M1a".into(),
                ch: 'a'
            })
        );
        assert!(matches!(
            parse_schedule_code("#2M1", &cal()),
            Err(ScheduleParseError::InvalidCharacter { ch: '#', .. })
        ));
    }

    #[test]
    fn test_unknown_calendar_entries() {
        // Sunday is closed in the standard calendar
        assert_eq!(
            parse_schedule_code("1M1", &cal()),
            Err(ScheduleParseError::UnknownWeekday {
                group: "1M1".into(),
                weekday: 1
            })
        );
        assert_eq!(
            parse_schedule_code("9M1", &cal()),
            Err(ScheduleParseError::UnknownWeekday {
                group: "9M1".into(),
                weekday: 9
            })
        );
        // Only four evening blocks exist
        assert_eq!(
            parse_schedule_code("2N5", &cal()),
            Err(ScheduleParseError::UnknownBlock {
                group: "2N5".into(),
                block: "N5".into()
            })
        );
    }

    #[test]
    fn test_one_bad_group_fails_whole_code() {
        assert!(parse_schedule_code("24M12 3T9", &cal()).is_err());
    }

    #[test]
    fn test_format_canonical() {
        let slots = parse_schedule_code("6T34 4M21 2M12", &cal()).unwrap();
        assert_eq!(format_schedule_code(&slots), "24M12 6T34");

        let slots = parse_schedule_code("2M1 3M12", &cal()).unwrap();
        assert_eq!(format_schedule_code(&slots), "2M1 3M12");

        assert_eq!(format_schedule_code(&BTreeSet::<TimeSlot>::new()), "");
    }
}
