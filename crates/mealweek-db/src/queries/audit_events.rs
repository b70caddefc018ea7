//! Database query functions for the `audit_events` table.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AuditAction, AuditEvent};

/// Parameters for inserting a new audit row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditEvent {
    pub household_id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub plan_id: Option<Uuid>,
    pub plan_day_id: Option<Uuid>,
    pub payload: Value,
}

/// Insert an audit row.
pub async fn insert_audit_event(pool: &PgPool, new: &NewAuditEvent) -> Result<AuditEvent> {
    let event = sqlx::query_as::<_, AuditEvent>(
        "INSERT INTO audit_events (household_id, actor_id, action, plan_id, plan_day_id, payload) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.household_id)
    .bind(new.actor_id)
    .bind(new.action)
    .bind(new.plan_id)
    .bind(new.plan_day_id)
    .bind(&new.payload)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert audit event {}", new.action))?;

    Ok(event)
}

/// List the audit rows of a plan, oldest first.
pub async fn list_events_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<AuditEvent>> {
    let events = sqlx::query_as::<_, AuditEvent>(
        "SELECT * FROM audit_events WHERE plan_id = $1 ORDER BY recorded_at ASC, id ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list audit events for plan {plan_id}"))?;

    Ok(events)
}
