//! Week resolution: fetch-or-create a plan and its seven days.

use chrono::NaiveDate;
use tracing::{debug, error, info};
use uuid::Uuid;

use mealweek_db::models::{Plan, PlanDay};

use super::{Planner, WeekPlan};
use crate::error::PlanError;
use crate::store::InsertPlanError;
use crate::week::{DAYS_PER_WEEK, dates_of_week, week_start_of};

impl Planner {
    /// Return the plan for the week containing `requested`, creating the
    /// plan and any missing days first.
    ///
    /// Never reports "not found". Safe to call concurrently for the same
    /// week: all callers end up with the same plan.
    pub async fn resolve_week(
        &self,
        household_id: Uuid,
        actor_id: Uuid,
        requested: NaiveDate,
    ) -> Result<WeekPlan, PlanError> {
        let week_start = week_start_of(requested);

        let plan = match self.store.find_plan(household_id, week_start).await? {
            Some(plan) => plan,
            None => {
                self.insert_or_fetch_plan(household_id, week_start, actor_id)
                    .await?
            }
        };

        self.ensure_days(&plan).await?;
        let days = self.load_days(&plan).await?;

        Ok(WeekPlan { plan, days })
    }

    /// Insert the plan row; if another caller won the race, use theirs.
    async fn insert_or_fetch_plan(
        &self,
        household_id: Uuid,
        week_start: NaiveDate,
        actor_id: Uuid,
    ) -> Result<Plan, PlanError> {
        match self
            .store
            .insert_plan(household_id, week_start, actor_id)
            .await
        {
            Ok(plan) => {
                info!(plan = %plan.id, household = %household_id, week = %week_start, "created plan");
                Ok(plan)
            }
            Err(conflict @ InsertPlanError::Conflict { .. }) => {
                debug!(household = %household_id, week = %week_start, "plan created concurrently; re-fetching");
                match self.store.find_plan(household_id, week_start).await? {
                    Some(plan) => Ok(plan),
                    None => Err(PlanError::Storage(anyhow::Error::new(conflict))),
                }
            }
            Err(InsertPlanError::Other(e)) => Err(PlanError::Storage(e)),
        }
    }

    async fn ensure_days(&self, plan: &Plan) -> Result<(), PlanError> {
        let existing = self.store.list_days(plan.id).await?;
        let missing: Vec<NaiveDate> = dates_of_week(plan.week_start)
            .into_iter()
            .filter(|date| !existing.iter().any(|day| day.date == *date))
            .collect();

        if !missing.is_empty() {
            debug!(plan = %plan.id, missing = missing.len(), "inserting missing days");
            self.store.insert_missing_days(plan, &missing).await?;
        }
        Ok(())
    }

    async fn load_days(&self, plan: &Plan) -> Result<Vec<PlanDay>, PlanError> {
        let expected = dates_of_week(plan.week_start);
        let days: Vec<PlanDay> = self
            .store
            .list_days(plan.id)
            .await?
            .into_iter()
            .filter(|day| expected.contains(&day.date))
            .collect();

        if days.len() < DAYS_PER_WEEK {
            error!(
                plan = %plan.id,
                household = %plan.household_id,
                week = %plan.week_start,
                found = days.len(),
                "plan is missing days after ensure step"
            );
            return Err(PlanError::IncompletePlan {
                plan_id: plan.id,
                found: days.len(),
            });
        }
        Ok(days)
    }
}
