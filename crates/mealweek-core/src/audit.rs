//! Best-effort audit trail.
//!
//! Recording an event never fails and never blocks the operation that
//! produced it. [`PgAuditSink`] writes on a spawned task and only logs
//! failures.

use std::sync::{Mutex, PoisonError};

use sqlx::PgPool;
use tracing::warn;

pub use mealweek_db::queries::audit_events::NewAuditEvent;
use mealweek_db::queries::audit_events;

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Hand off an event. Must return promptly and must not fail.
    fn record(&self, event: NewAuditEvent);
}

/// Writes events to the `audit_events` table in the background.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditSink for PgAuditSink {
    fn record(&self, event: NewAuditEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(action = %event.action, "no async runtime; dropping audit event");
            return;
        };

        let pool = self.pool.clone();
        handle.spawn(async move {
            if let Err(e) = audit_events::insert_audit_event(&pool, &event).await {
                warn!(
                    action = %event.action,
                    household = %event.household_id,
                    plan = ?event.plan_id,
                    day = ?event.plan_day_id,
                    "audit write failed: {e:#}"
                );
            }
        });
    }
}

/// Keeps events in memory, in recording order.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<NewAuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<NewAuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: NewAuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use mealweek_db::models::AuditAction;

    use super::*;
    use crate::plan::{DayPatch, Planner};
    use crate::store::MemoryPlanStore;

    fn sample_event() -> NewAuditEvent {
        NewAuditEvent {
            household_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            action: AuditAction::DayLocked,
            plan_id: None,
            plan_day_id: None,
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingAuditSink::new();
        let mut first = sample_event();
        first.action = AuditAction::DayMealSet;
        sink.record(first);
        sink.record(sample_event());

        let actions: Vec<AuditAction> = sink.events().iter().map(|e| e.action).collect();
        assert_eq!(actions, [AuditAction::DayMealSet, AuditAction::DayLocked]);
    }

    #[tokio::test]
    async fn failed_audit_write_leaves_day_edit_in_place() {
        // Nothing listens on port 1; every spawned audit insert fails.
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgresql://localhost:1/unreachable")
            .unwrap();
        let store = Arc::new(MemoryPlanStore::new());
        let planner = Planner::new(store.clone(), Arc::new(PgAuditSink::new(pool)));

        let household = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let risotto = store.add_meal(household, "Risotto");
        let monday = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
        let week = planner.resolve_week(household, actor, monday).await.unwrap();

        let patch = DayPatch::new().meal(risotto.id).lock(true);
        let day = planner
            .update_day(household, actor, week.days[2].id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day.meal_id, Some(risotto.id));
        assert!(day.locked);

        // Let the background inserts fail before checking the stored row.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let stored = planner.resolve_week(household, actor, monday).await.unwrap();
        assert_eq!(stored.days[2], day);
    }
}
