//! In-process [`PlanStore`].
//!
//! Enforces the same uniqueness rules as the Postgres schema (one plan per
//! household week, one day per plan date) so engine behavior can be tested
//! without a database.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use mealweek_db::models::{MealRef, Plan, PlanDay};

use super::{Assignment, DayWrite, InsertPlanError, PlanStore};

#[derive(Debug, Default)]
struct State {
    meals: Vec<(Uuid, MealRef)>,
    plans: Vec<Plan>,
    days: Vec<PlanDay>,
    writes: usize,
}

/// Mutex-guarded in-memory store.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    state: Mutex<State>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a meal to a household's catalog.
    pub fn add_meal(&self, household_id: Uuid, name: &str) -> MealRef {
        let meal = MealRef {
            id: Uuid::new_v4(),
            name: name.to_owned(),
        };
        self.state().meals.push((household_id, meal.clone()));
        meal
    }

    /// Number of plans stored across all households.
    pub fn plan_count(&self) -> usize {
        self.state().plans.len()
    }

    /// Number of day/assignment writes applied so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Snapshot of a plan, if present.
    pub fn plan(&self, plan_id: Uuid) -> Option<Plan> {
        self.state().plans.iter().find(|p| p.id == plan_id).cloned()
    }
}

fn touch(state: &mut State, plan_id: Uuid, actor_id: Uuid) -> Result<()> {
    let plan = state
        .plans
        .iter_mut()
        .find(|p| p.id == plan_id)
        .ok_or_else(|| anyhow::anyhow!("plan {plan_id} not found"))?;
    plan.updated_at = Utc::now();
    plan.updated_by = actor_id;
    Ok(())
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn find_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Result<Option<Plan>> {
        Ok(self
            .state()
            .plans
            .iter()
            .find(|p| p.household_id == household_id && p.week_start == week_start)
            .cloned())
    }

    async fn insert_plan(
        &self,
        household_id: Uuid,
        week_start: NaiveDate,
        actor_id: Uuid,
    ) -> Result<Plan, InsertPlanError> {
        let mut state = self.state();
        if state
            .plans
            .iter()
            .any(|p| p.household_id == household_id && p.week_start == week_start)
        {
            return Err(InsertPlanError::Conflict {
                household_id,
                week_start,
            });
        }

        let now = Utc::now();
        let plan = Plan {
            id: Uuid::new_v4(),
            household_id,
            week_start,
            created_at: now,
            created_by: actor_id,
            updated_at: now,
            updated_by: actor_id,
        };
        state.plans.push(plan.clone());
        Ok(plan)
    }

    async fn list_days(&self, plan_id: Uuid) -> Result<Vec<PlanDay>> {
        let mut days: Vec<PlanDay> = self
            .state()
            .days
            .iter()
            .filter(|d| d.plan_id == plan_id)
            .cloned()
            .collect();
        days.sort_by_key(|d| (d.date, d.id));
        Ok(days)
    }

    async fn insert_missing_days(&self, plan: &Plan, dates: &[NaiveDate]) -> Result<()> {
        let mut state = self.state();
        for date in dates {
            let exists = state
                .days
                .iter()
                .any(|d| d.plan_id == plan.id && d.date == *date);
            if !exists {
                state.days.push(PlanDay {
                    id: Uuid::new_v4(),
                    plan_id: plan.id,
                    household_id: plan.household_id,
                    date: *date,
                    meal_id: None,
                    leftover_from_plan_day_id: None,
                    locked: false,
                });
            }
        }
        Ok(())
    }

    async fn get_day(&self, household_id: Uuid, day_id: Uuid) -> Result<Option<PlanDay>> {
        Ok(self
            .state()
            .days
            .iter()
            .find(|d| d.id == day_id && d.household_id == household_id)
            .cloned())
    }

    async fn list_meals(&self, household_id: Uuid) -> Result<Vec<MealRef>> {
        Ok(self
            .state()
            .meals
            .iter()
            .filter(|(owner, _)| *owner == household_id)
            .map(|(_, meal)| meal.clone())
            .collect())
    }

    async fn find_meal(&self, household_id: Uuid, meal_id: Uuid) -> Result<Option<MealRef>> {
        Ok(self
            .state()
            .meals
            .iter()
            .find(|(owner, meal)| *owner == household_id && meal.id == meal_id)
            .map(|(_, meal)| meal.clone()))
    }

    async fn apply_day_write(
        &self,
        household_id: Uuid,
        day_id: Uuid,
        write: DayWrite,
        actor_id: Uuid,
    ) -> Result<Option<PlanDay>> {
        let mut state = self.state();
        let Some(day) = state
            .days
            .iter_mut()
            .find(|d| d.id == day_id && d.household_id == household_id)
        else {
            return Ok(None);
        };

        day.meal_id = write.meal_id;
        day.leftover_from_plan_day_id = write.leftover_from_plan_day_id;
        day.locked = write.locked;
        let updated = day.clone();

        touch(&mut state, updated.plan_id, actor_id)?;
        state.writes += 1;
        Ok(Some(updated))
    }

    async fn apply_assignments(
        &self,
        plan_id: Uuid,
        assignments: &[Assignment],
        actor_id: Uuid,
    ) -> Result<usize> {
        let mut state = self.state();
        let mut written = 0;
        for assignment in assignments {
            if let Some(day) = state
                .days
                .iter_mut()
                .find(|d| d.id == assignment.day_id && d.plan_id == plan_id && !d.locked)
            {
                day.meal_id = Some(assignment.meal_id);
                day.leftover_from_plan_day_id = None;
                written += 1;
            }
        }

        touch(&mut state, plan_id, actor_id)?;
        state.writes += 1;
        Ok(written)
    }
}
