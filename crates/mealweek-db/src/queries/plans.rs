//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::Plan;

/// Failure modes of [`insert_plan`].
///
/// A unique violation on `(household_id, week_start)` is reported as
/// [`InsertPlanError::Conflict`] so callers can fall back to a re-fetch
/// without inspecting Postgres error codes themselves.
#[derive(Debug, thiserror::Error)]
pub enum InsertPlanError {
    #[error("a plan for household {household_id} week {week_start} already exists")]
    Conflict {
        household_id: Uuid,
        week_start: NaiveDate,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Insert a new plan row for a household's week.
pub async fn insert_plan(
    pool: &PgPool,
    household_id: Uuid,
    week_start: NaiveDate,
    actor_id: Uuid,
) -> Result<Plan, InsertPlanError> {
    sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (household_id, week_start, created_by, updated_by) \
         VALUES ($1, $2, $3, $3) \
         RETURNING *",
    )
    .bind(household_id)
    .bind(week_start)
    .bind(actor_id)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        let unique = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if unique {
            InsertPlanError::Conflict {
                household_id,
                week_start,
            }
        } else {
            InsertPlanError::Other(
                anyhow::Error::new(err)
                    .context(format!("failed to insert plan for week {week_start}")),
            )
        }
    })
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Fetch the plan of a household for the week starting on `week_start`.
pub async fn find_plan_for_week(
    pool: &PgPool,
    household_id: Uuid,
    week_start: NaiveDate,
) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE household_id = $1 AND week_start = $2",
    )
    .bind(household_id)
    .bind(week_start)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to fetch plan for week {week_start}"))?;

    Ok(plan)
}

/// Bump `updated_at` / `updated_by` on a plan after one of its days changed.
pub async fn touch_plan<'e, E>(executor: E, plan_id: Uuid, actor_id: Uuid) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE plans SET updated_at = now(), updated_by = $2 WHERE id = $1")
        .bind(plan_id)
        .bind(actor_id)
        .execute(executor)
        .await
        .with_context(|| format!("failed to touch plan {plan_id}"))?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {plan_id} not found");
    }

    Ok(())
}
