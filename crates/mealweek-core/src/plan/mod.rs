//! The weekly planner.
//!
//! [`Planner`] exposes the three plan operations -- resolve a week,
//! generate meals for it, and edit a single day -- over a [`PlanStore`] and
//! an [`AuditSink`]. Each operation is a sequence of independent store
//! calls; correctness under concurrency comes from the store's uniqueness
//! rules, not from locks held here.

pub mod generate;
pub mod mutate;
pub mod resolve;
pub mod view;

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use mealweek_db::models::{MealRef, Plan, PlanDay};

use crate::audit::{AuditSink, PgAuditSink};
use crate::error::PlanError;
use crate::store::{PgPlanStore, PlanStore};

pub use generate::{GenerateOutcome, assign_round_robin, sort_catalog};
pub use mutate::DayPatch;
pub use view::{DayView, LeftoverView, WeekView, project_week};

/// A plan header together with its seven days in date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekPlan {
    #[serde(flatten)]
    pub plan: Plan,
    pub days: Vec<PlanDay>,
}

/// Entry point for all plan operations.
#[derive(Clone)]
pub struct Planner {
    store: Arc<dyn PlanStore>,
    audit: Arc<dyn AuditSink>,
}

impl Planner {
    pub fn new(store: Arc<dyn PlanStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// A planner over Postgres, auditing into the same database.
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgPlanStore::new(pool.clone())),
            Arc::new(PgAuditSink::new(pool)),
        )
    }

    /// The household's meal catalog in `(name, id)` order.
    pub async fn catalog(&self, household_id: Uuid) -> Result<Vec<MealRef>, PlanError> {
        let mut meals = self.store.list_meals(household_id).await?;
        sort_catalog(&mut meals);
        Ok(meals)
    }
}
