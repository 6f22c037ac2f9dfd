//! Room model.
//!
//! Rooms are the physical spaces demands are placed in. Each room has a
//! capacity, a room-type tag and a set of feature tags (projector,
//! accessibility, …). Rooms are mutated only by inventory management; the
//! engine reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::RoomId;

/// Feature tag that satisfies low-mobility requirements on any floor.
pub const ACCESSIBILITY_FEATURE: &str = "accessibility";

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique room identifier.
    pub id: RoomId,
    /// Human-readable name.
    pub name: String,
    /// Containing building or campus.
    pub building_id: String,
    /// Number of seats.
    pub capacity: u32,
    /// Floor number (0 = ground floor).
    pub floor: i32,
    /// Seating arrangement (e.g., "fixed", "movable").
    pub seat_type: String,
    /// Room-type tag (e.g., "Lecture Hall", "Lab").
    pub room_type_id: String,
    /// Feature tags.
    #[serde(default)]
    pub features: BTreeSet<String>,
}

impl Room {
    /// Creates a room with the given id and capacity.
    pub fn new(id: RoomId, capacity: u32) -> Self {
        Self {
            id,
            name: String::new(),
            building_id: String::new(),
            capacity,
            floor: 0,
            seat_type: String::new(),
            room_type_id: String::new(),
            features: BTreeSet::new(),
        }
    }

    /// Sets the room name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the building.
    pub fn with_building(mut self, building_id: impl Into<String>) -> Self {
        self.building_id = building_id.into();
        self
    }

    /// Sets the floor.
    pub fn with_floor(mut self, floor: i32) -> Self {
        self.floor = floor;
        self
    }

    /// Sets the seating type.
    pub fn with_seat_type(mut self, seat_type: impl Into<String>) -> Self {
        self.seat_type = seat_type.into();
        self
    }

    /// Sets the room type.
    pub fn with_type(mut self, room_type_id: impl Into<String>) -> Self {
        self.room_type_id = room_type_id.into();
        self
    }

    /// Adds a feature tag.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    /// Whether the room carries a feature (case-insensitive).
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f.eq_ignore_ascii_case(feature))
    }

    /// Whether the room can seat `seats` people.
    #[inline]
    pub fn fits(&self, seats: u32) -> bool {
        self.capacity >= seats
    }

    /// Whether a low-mobility professor can reach the room.
    pub fn is_accessible(&self) -> bool {
        self.floor == 0 || self.has_feature(ACCESSIBILITY_FEATURE)
    }
}
