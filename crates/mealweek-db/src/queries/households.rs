//! Database query functions for the `households` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Household;

/// Insert a new household.
pub async fn insert_household(pool: &PgPool, name: &str) -> Result<Household> {
    let household = sqlx::query_as::<_, Household>(
        "INSERT INTO households (name) VALUES ($1) RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert household {name:?}"))?;

    Ok(household)
}

/// Fetch a household by its ID.
pub async fn get_household(pool: &PgPool, id: Uuid) -> Result<Option<Household>> {
    let household = sqlx::query_as::<_, Household>("SELECT * FROM households WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch household")?;

    Ok(household)
}
