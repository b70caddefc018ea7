//! The weekly plan engine: week resolution, meal generation, and per-day
//! edits over a pluggable [`store::PlanStore`].

pub mod audit;
pub mod error;
pub mod plan;
pub mod store;
pub mod week;

pub use error::PlanError;
pub use plan::{DayPatch, GenerateOutcome, Planner, WeekPlan};
