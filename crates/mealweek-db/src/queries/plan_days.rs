//! Database query functions for the `plan_days` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::PlanDay;

/// List the days of a plan in date order.
pub async fn list_days_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PlanDay>> {
    let days = sqlx::query_as::<_, PlanDay>(
        "SELECT * FROM plan_days WHERE plan_id = $1 ORDER BY date ASC, id ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list days for plan {plan_id}"))?;

    Ok(days)
}

/// Insert a day row for each date that does not exist yet.
///
/// Uses `ON CONFLICT (plan_id, date) DO NOTHING`, so concurrent callers
/// ensuring the same week never fail on duplicates. Returns the number of
/// rows actually inserted.
pub async fn insert_missing_days(
    pool: &PgPool,
    plan_id: Uuid,
    household_id: Uuid,
    dates: &[NaiveDate],
) -> Result<u64> {
    let result = sqlx::query(
        "INSERT INTO plan_days (plan_id, household_id, date) \
         SELECT $1, $2, d FROM UNNEST($3::date[]) AS d \
         ON CONFLICT (plan_id, date) DO NOTHING",
    )
    .bind(plan_id)
    .bind(household_id)
    .bind(dates)
    .execute(pool)
    .await
    .with_context(|| format!("failed to insert days for plan {plan_id}"))?;

    Ok(result.rows_affected())
}

/// Fetch a day by ID, scoped to the household.
pub async fn get_day(pool: &PgPool, household_id: Uuid, day_id: Uuid) -> Result<Option<PlanDay>> {
    let day = sqlx::query_as::<_, PlanDay>(
        "SELECT * FROM plan_days WHERE id = $1 AND household_id = $2",
    )
    .bind(day_id)
    .bind(household_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to fetch plan day {day_id}"))?;

    Ok(day)
}

/// Overwrite the mutable columns of a day. Returns `None` when the day does
/// not exist in the household.
pub async fn update_day<'e, E>(
    executor: E,
    household_id: Uuid,
    day_id: Uuid,
    meal_id: Option<Uuid>,
    leftover_from_plan_day_id: Option<Uuid>,
    locked: bool,
) -> Result<Option<PlanDay>>
where
    E: PgExecutor<'e>,
{
    let day = sqlx::query_as::<_, PlanDay>(
        "UPDATE plan_days \
         SET meal_id = $3, leftover_from_plan_day_id = $4, locked = $5 \
         WHERE id = $1 AND household_id = $2 \
         RETURNING *",
    )
    .bind(day_id)
    .bind(household_id)
    .bind(meal_id)
    .bind(leftover_from_plan_day_id)
    .bind(locked)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to update plan day {day_id}"))?;

    Ok(day)
}

/// Assign a generated meal to a day, clearing any leftover link.
///
/// Rows that are locked at write time are left alone. Returns whether the
/// row was updated.
pub async fn assign_meal<'e, E>(
    executor: E,
    plan_id: Uuid,
    day_id: Uuid,
    meal_id: Uuid,
) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE plan_days \
         SET meal_id = $3, leftover_from_plan_day_id = NULL \
         WHERE id = $2 AND plan_id = $1 AND NOT locked",
    )
    .bind(plan_id)
    .bind(day_id)
    .bind(meal_id)
    .execute(executor)
    .await
    .with_context(|| format!("failed to assign meal {meal_id} to day {day_id}"))?;

    Ok(result.rows_affected() > 0)
}
