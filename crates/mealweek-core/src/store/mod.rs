//! The `PlanStore` trait -- the repository seam between the planner and
//! storage.
//!
//! [`PgPlanStore`] is the production adapter; [`MemoryPlanStore`] keeps
//! everything in process and backs the engine's unit tests.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mealweek_db::models::{MealRef, Plan, PlanDay};
pub use mealweek_db::queries::plans::InsertPlanError;

pub use memory::MemoryPlanStore;
pub use postgres::PgPlanStore;

/// One generated meal for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub day_id: Uuid,
    pub meal_id: Uuid,
}

/// The full set of mutable day columns to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWrite {
    pub meal_id: Option<Uuid>,
    pub leftover_from_plan_day_id: Option<Uuid>,
    pub locked: bool,
}

/// Storage operations the planner needs.
///
/// Uniqueness of `(household, week_start)` plans and `(plan, date)` days is
/// the store's job; the planner holds no locks across calls.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Fetch the plan of a household for a given Monday.
    async fn find_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Result<Option<Plan>>;

    /// Insert a plan, reporting a duplicate week as [`InsertPlanError::Conflict`].
    async fn insert_plan(
        &self,
        household_id: Uuid,
        week_start: NaiveDate,
        actor_id: Uuid,
    ) -> Result<Plan, InsertPlanError>;

    /// List the days of a plan in date order.
    async fn list_days(&self, plan_id: Uuid) -> Result<Vec<PlanDay>>;

    /// Insert empty, unlocked days for any of `dates` not yet present.
    /// Dates that already exist are skipped silently.
    async fn insert_missing_days(&self, plan: &Plan, dates: &[NaiveDate]) -> Result<()>;

    /// Fetch a day by ID, scoped to the household.
    async fn get_day(&self, household_id: Uuid, day_id: Uuid) -> Result<Option<PlanDay>>;

    /// The household's meal catalog, in no particular order.
    async fn list_meals(&self, household_id: Uuid) -> Result<Vec<MealRef>>;

    /// Look up one meal in the household's catalog.
    async fn find_meal(&self, household_id: Uuid, meal_id: Uuid) -> Result<Option<MealRef>>;

    /// Persist a day's new state and touch its plan as one unit. Returns
    /// `None` if the day vanished.
    async fn apply_day_write(
        &self,
        household_id: Uuid,
        day_id: Uuid,
        write: DayWrite,
        actor_id: Uuid,
    ) -> Result<Option<PlanDay>>;

    /// Apply all assignments and touch the plan as one unit. Days locked at
    /// write time are skipped. Returns how many days were written.
    async fn apply_assignments(
        &self,
        plan_id: Uuid,
        assignments: &[Assignment],
        actor_id: Uuid,
    ) -> Result<usize>;
}

// Compile-time assertion: PlanStore must be usable as `dyn PlanStore`.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore) {}
};
