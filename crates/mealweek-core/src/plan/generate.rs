//! Meal generation: deterministic round-robin assignment of catalog meals
//! to the unlocked days of a week.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use mealweek_db::models::{AuditAction, MealRef, PlanDay};

use super::{Planner, WeekPlan};
use crate::audit::NewAuditEvent;
use crate::error::PlanError;
use crate::store::Assignment;
use crate::week::format_calendar_date;

/// Result of a generate call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    /// The week as stored after generation.
    #[serde(flatten)]
    pub week: WeekPlan,
    /// Number of days that received a meal.
    pub assigned: usize,
    /// Whether any day had a meal before this run.
    pub regenerated: bool,
}

/// Sort a catalog into its canonical `(name, id)` order.
pub fn sort_catalog(meals: &mut [MealRef]) {
    meals.sort_by(|a, b| (a.name.as_str(), a.id).cmp(&(b.name.as_str(), b.id)));
}

/// Compute meal assignments for the unlocked days.
///
/// The i-th unlocked day (in the given order) gets `pool[i % pool.len()]`,
/// where the pool is the catalog minus meals already pinned on locked days,
/// or the whole catalog if that leaves nothing. Locked days never appear in
/// the result.
pub fn assign_round_robin(
    days: &[PlanDay],
    meal_ids: &[Uuid],
) -> Result<Vec<Assignment>, PlanError> {
    if meal_ids.is_empty() {
        return Err(PlanError::NoMealsAvailable);
    }

    let (locked, unlocked): (Vec<&PlanDay>, Vec<&PlanDay>) = days.iter().partition(|d| d.locked);
    if unlocked.is_empty() {
        return Ok(Vec::new());
    }

    let pinned: HashSet<Uuid> = locked.iter().filter_map(|d| d.meal_id).collect();
    let preferred: Vec<Uuid> = meal_ids
        .iter()
        .copied()
        .filter(|id| !pinned.contains(id))
        .collect();
    let pool: &[Uuid] = if preferred.is_empty() {
        meal_ids
    } else {
        &preferred
    };

    Ok(unlocked
        .iter()
        .enumerate()
        .map(|(i, day)| Assignment {
            day_id: day.id,
            meal_id: pool[i % pool.len()],
        })
        .collect())
}

impl Planner {
    /// Fill every unlocked day of the week containing `requested` from the
    /// household's catalog, then return the refreshed week.
    ///
    /// All assignments are written as one unit. Fails with
    /// [`PlanError::NoMealsAvailable`] on an empty catalog; a fully locked
    /// week is a successful no-op.
    pub async fn generate(
        &self,
        household_id: Uuid,
        actor_id: Uuid,
        requested: NaiveDate,
    ) -> Result<GenerateOutcome, PlanError> {
        let week = self.resolve_week(household_id, actor_id, requested).await?;
        let catalog = self.catalog(household_id).await?;
        let meal_ids: Vec<Uuid> = catalog.iter().map(|m| m.id).collect();

        let assignments = assign_round_robin(&week.days, &meal_ids)?;
        let regenerated = week.days.iter().any(|d| d.meal_id.is_some());

        if assignments.is_empty() {
            debug!(plan = %week.plan.id, "every day is locked; nothing to generate");
            return Ok(GenerateOutcome {
                week,
                assigned: 0,
                regenerated,
            });
        }

        let plan_id = week.plan.id;
        let week_start = week.plan.week_start;
        let assigned = self
            .store
            .apply_assignments(plan_id, &assignments, actor_id)
            .await?;

        info!(
            plan = %plan_id,
            household = %household_id,
            assigned,
            regenerated,
            "generated meals"
        );

        self.audit.record(NewAuditEvent {
            household_id,
            actor_id,
            action: if regenerated {
                AuditAction::PlanRegenerated
            } else {
                AuditAction::PlanGenerated
            },
            plan_id: Some(plan_id),
            plan_day_id: None,
            payload: json!({
                "week_start": format_calendar_date(week_start),
                "assigned": assigned,
                "catalog_size": meal_ids.len(),
            }),
        });

        let week = self.resolve_week(household_id, actor_id, week_start).await?;
        Ok(GenerateOutcome {
            week,
            assigned,
            regenerated,
        })
    }
}
