//! Room allocation engine for academic terms.
//!
//! Assigns course offerings ("demands") to rooms for their weekly time
//! slots so that no room is double-booked, mandatory placement rules are
//! honored, and room choice favors professor preferences and historical
//! usage.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Demand`, `Room`, `Rule`, `PreferenceLink`,
//!   `HistoricalAllocation`, `TimeSlot`, `BlockCalendar`, `Allocation`
//! - **`schedule_code`**: Weekly schedule notation parser (`24M12 6T34`)
//! - **`classifier`**: Hard/soft rule split and placement priority
//! - **`occupancy`**: Conflict-detection ledger per term
//! - **`scoring`**: Candidate room scoring and ranking
//! - **`allocator`**: Three-phase greedy allocator and KPIs
//! - **`validation`**: Input integrity checks (duplicate IDs, term mismatch,
//!   conflicting existing allocations)
//! - **`config`**: Scoring weights and policy flags, loadable from TOML
//!
//! # Architecture
//!
//! The engine is a pure function of fully materialized inputs. Storage,
//! catalog import and reporting live outside this crate. The occupancy
//! tracker is scoped to one run over one term and passed explicitly.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

pub mod allocator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod occupancy;
pub mod schedule_code;
pub mod scoring;
pub mod validation;

pub use allocator::{AllocationKpi, AllocationRequest, Allocator};
pub use config::AllocatorConfig;
pub use error::{AllocError, Result};
