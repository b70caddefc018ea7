//! Database query functions for the `meals` table.
//!
//! Listing order is `(name, id)` everywhere so callers see the same
//! sequence regardless of insertion order. Names compare bytewise
//! (`COLLATE "C"`), matching how the planner orders its catalog.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Meal, MealRef};

/// Insert a meal into a household's catalog.
pub async fn insert_meal(
    pool: &PgPool,
    household_id: Uuid,
    name: &str,
    notes: &str,
) -> Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(
        "INSERT INTO meals (household_id, name, notes) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(household_id)
    .bind(name)
    .bind(notes)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert meal {name:?}"))?;

    Ok(meal)
}

/// List the full meal rows of a household.
pub async fn list_meals(pool: &PgPool, household_id: Uuid) -> Result<Vec<Meal>> {
    let meals = sqlx::query_as::<_, Meal>(
        "SELECT * FROM meals WHERE household_id = $1 ORDER BY name COLLATE \"C\", id",
    )
    .bind(household_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list meals for household {household_id}"))?;

    Ok(meals)
}

/// List `(id, name)` pairs of a household's catalog.
pub async fn list_meal_refs(pool: &PgPool, household_id: Uuid) -> Result<Vec<MealRef>> {
    let meals = sqlx::query_as::<_, MealRef>(
        "SELECT id, name FROM meals WHERE household_id = $1 ORDER BY name COLLATE \"C\", id",
    )
    .bind(household_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list meal refs for household {household_id}"))?;

    Ok(meals)
}

/// Rename a meal, optionally replacing its notes. Returns `None` when the
/// meal does not exist in the household.
pub async fn update_meal(
    pool: &PgPool,
    household_id: Uuid,
    meal_id: Uuid,
    name: &str,
    notes: Option<&str>,
) -> Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(
        "UPDATE meals \
         SET name = $3, notes = COALESCE($4, notes) \
         WHERE household_id = $1 AND id = $2 \
         RETURNING *",
    )
    .bind(household_id)
    .bind(meal_id)
    .bind(name)
    .bind(notes)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to update meal {meal_id}"))?;

    Ok(meal)
}

/// Delete a meal from the household's catalog.
///
/// Days serving the meal are cleared: the foreign key nulls `meal_id`, and
/// leftover links on those days are dropped in the same transaction.
/// Returns `false` when the meal does not exist in the household.
pub async fn delete_meal(pool: &PgPool, household_id: Uuid, meal_id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query(
        "UPDATE plan_days SET leftover_from_plan_day_id = NULL \
         WHERE household_id = $1 AND meal_id = $2 AND leftover_from_plan_day_id IS NOT NULL",
    )
    .bind(household_id)
    .bind(meal_id)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("failed to unlink leftovers of meal {meal_id}"))?;

    let result = sqlx::query("DELETE FROM meals WHERE household_id = $1 AND id = $2")
        .bind(household_id)
        .bind(meal_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to delete meal {meal_id}"))?;

    tx.commit().await.context("failed to commit meal deletion")?;
    Ok(result.rows_affected() > 0)
}

/// Look up a single meal, scoped to the household.
pub async fn find_meal_ref(
    pool: &PgPool,
    household_id: Uuid,
    meal_id: Uuid,
) -> Result<Option<MealRef>> {
    let meal = sqlx::query_as::<_, MealRef>(
        "SELECT id, name FROM meals WHERE household_id = $1 AND id = $2",
    )
    .bind(household_id)
    .bind(meal_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to look up meal {meal_id}"))?;

    Ok(meal)
}
