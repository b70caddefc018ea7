//! [`PlanStore`] backed by PostgreSQL through the `mealweek-db` queries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use mealweek_db::models::{MealRef, Plan, PlanDay};
use mealweek_db::queries::{meals, plan_days, plans};

use super::{Assignment, DayWrite, InsertPlanError, PlanStore};

/// Postgres adapter. Multi-row writes run in a single transaction.
#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn find_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Result<Option<Plan>> {
        plans::find_plan_for_week(&self.pool, household_id, week_start).await
    }

    async fn insert_plan(
        &self,
        household_id: Uuid,
        week_start: NaiveDate,
        actor_id: Uuid,
    ) -> Result<Plan, InsertPlanError> {
        plans::insert_plan(&self.pool, household_id, week_start, actor_id).await
    }

    async fn list_days(&self, plan_id: Uuid) -> Result<Vec<PlanDay>> {
        plan_days::list_days_for_plan(&self.pool, plan_id).await
    }

    async fn insert_missing_days(&self, plan: &Plan, dates: &[NaiveDate]) -> Result<()> {
        plan_days::insert_missing_days(&self.pool, plan.id, plan.household_id, dates).await?;
        Ok(())
    }

    async fn get_day(&self, household_id: Uuid, day_id: Uuid) -> Result<Option<PlanDay>> {
        plan_days::get_day(&self.pool, household_id, day_id).await
    }

    async fn list_meals(&self, household_id: Uuid) -> Result<Vec<MealRef>> {
        meals::list_meal_refs(&self.pool, household_id).await
    }

    async fn find_meal(&self, household_id: Uuid, meal_id: Uuid) -> Result<Option<MealRef>> {
        meals::find_meal_ref(&self.pool, household_id, meal_id).await
    }

    async fn apply_day_write(
        &self,
        household_id: Uuid,
        day_id: Uuid,
        write: DayWrite,
        actor_id: Uuid,
    ) -> Result<Option<PlanDay>> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let updated = plan_days::update_day(
            &mut *tx,
            household_id,
            day_id,
            write.meal_id,
            write.leftover_from_plan_day_id,
            write.locked,
        )
        .await?;

        let Some(day) = updated else {
            // Nothing was written; the transaction rolls back on drop.
            return Ok(None);
        };

        plans::touch_plan(&mut *tx, day.plan_id, actor_id).await?;
        tx.commit().await.context("failed to commit day update")?;

        Ok(Some(day))
    }

    async fn apply_assignments(
        &self,
        plan_id: Uuid,
        assignments: &[Assignment],
        actor_id: Uuid,
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let mut written = 0;
        for assignment in assignments {
            if plan_days::assign_meal(&mut *tx, plan_id, assignment.day_id, assignment.meal_id)
                .await?
            {
                written += 1;
            }
        }

        plans::touch_plan(&mut *tx, plan_id, actor_id).await?;
        tx.commit().await.context("failed to commit generated plan")?;

        Ok(written)
    }
}
