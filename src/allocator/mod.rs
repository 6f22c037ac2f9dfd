//! Three-phase allocator and KPI evaluation.
//!
//! Orchestrates the parser, classifier, occupancy tracker and scorer over
//! one term.
//!
//! # Algorithm
//!
//! `Allocator` is a greedy, priority-ordered heuristic with fixed
//! tie-breaks. It is not optimal, but it is deterministic: the same inputs
//! and the same committed state always yield the same allocations and the
//! same skip reasons.
//!
//! # KPI
//!
//! `AllocationKpi` computes placement rates, room utilization and seat
//! efficiency for a finished run.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod engine;
mod kpi;
mod request;

pub use engine::Allocator;
pub use kpi::AllocationKpi;
pub use request::AllocationRequest;
