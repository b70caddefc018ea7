//! Single-day edits: set or clear a meal, lock or unlock, link a leftover.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use mealweek_db::models::{AuditAction, PlanDay};

use super::Planner;
use crate::audit::NewAuditEvent;
use crate::error::PlanError;
use crate::store::DayWrite;
use crate::week::format_calendar_date;

/// A partial update to one day.
///
/// The nullable fields are three-state: absent (`None`) leaves the column
/// alone, `Some(None)` clears it, `Some(Some(id))` sets it. A non-null
/// leftover link takes precedence over `meal_id` in the same patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DayPatch {
    #[serde(
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub meal_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub leftover_from_plan_day_id: Option<Option<Uuid>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

impl DayPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meal(mut self, meal_id: Uuid) -> Self {
        self.meal_id = Some(Some(meal_id));
        self
    }

    pub fn clear_meal(mut self) -> Self {
        self.meal_id = Some(None);
        self
    }

    pub fn lock(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn leftover_from(mut self, source_day_id: Uuid) -> Self {
        self.leftover_from_plan_day_id = Some(Some(source_day_id));
        self
    }

    pub fn clear_leftover(mut self) -> Self {
        self.leftover_from_plan_day_id = Some(None);
        self
    }

    /// True when the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        self.meal_id.is_none() && self.locked.is_none() && self.leftover_from_plan_day_id.is_none()
    }
}

impl Planner {
    /// Apply `patch` to one day of the household.
    ///
    /// Returns `Ok(None)` if no such day exists in the household. A patch
    /// that changes nothing returns the current row without writing.
    pub async fn update_day(
        &self,
        household_id: Uuid,
        actor_id: Uuid,
        day_id: Uuid,
        patch: &DayPatch,
    ) -> Result<Option<PlanDay>, PlanError> {
        if patch.is_empty() {
            return Err(PlanError::EmptyPatch);
        }

        let Some(current) = self.store.get_day(household_id, day_id).await? else {
            return Ok(None);
        };

        let next = self.next_state(household_id, &current, patch).await?;
        let before = DayWrite {
            meal_id: current.meal_id,
            leftover_from_plan_day_id: current.leftover_from_plan_day_id,
            locked: current.locked,
        };
        if next == before {
            debug!(day = %day_id, "patch changes nothing; skipping write");
            return Ok(Some(current));
        }

        let Some(updated) = self
            .store
            .apply_day_write(household_id, day_id, next, actor_id)
            .await?
        else {
            return Ok(None);
        };

        info!(
            day = %day_id,
            plan = %updated.plan_id,
            meal = ?updated.meal_id,
            leftover_from = ?updated.leftover_from_plan_day_id,
            locked = updated.locked,
            "updated day"
        );

        let meal_changed = before.meal_id != next.meal_id
            || before.leftover_from_plan_day_id != next.leftover_from_plan_day_id;
        if meal_changed {
            let action = if updated.meal_id.is_none() {
                AuditAction::DayMealCleared
            } else if updated.leftover_from_plan_day_id.is_some() {
                AuditAction::DayLeftoverSet
            } else {
                AuditAction::DayMealSet
            };
            self.record_day_event(actor_id, action, &updated);
        }
        if before.locked != next.locked {
            let action = if updated.locked {
                AuditAction::DayLocked
            } else {
                AuditAction::DayUnlocked
            };
            self.record_day_event(actor_id, action, &updated);
        }

        Ok(Some(updated))
    }

    async fn next_state(
        &self,
        household_id: Uuid,
        current: &PlanDay,
        patch: &DayPatch,
    ) -> Result<DayWrite, PlanError> {
        let mut next = DayWrite {
            meal_id: current.meal_id,
            leftover_from_plan_day_id: current.leftover_from_plan_day_id,
            locked: patch.locked.unwrap_or(current.locked),
        };

        // A named meal must exist even when a leftover link overrides it.
        let meal = match patch.meal_id {
            Some(Some(meal_id)) => Some(
                self.store
                    .find_meal(household_id, meal_id)
                    .await?
                    .ok_or(PlanError::MealNotFound(meal_id))?,
            ),
            _ => None,
        };

        match patch.leftover_from_plan_day_id {
            Some(Some(source_id)) => {
                if source_id == current.id {
                    return Err(PlanError::SelfLeftover(source_id));
                }
                let source = self
                    .store
                    .get_day(household_id, source_id)
                    .await?
                    .filter(|s| s.plan_id == current.plan_id)
                    .ok_or(PlanError::LeftoverSourceNotFound(source_id))?;
                let meal_id = source
                    .meal_id
                    .ok_or(PlanError::LeftoverSourceEmpty(source_id))?;

                next.meal_id = Some(meal_id);
                next.leftover_from_plan_day_id = Some(source_id);
                return Ok(next);
            }
            Some(None) => next.leftover_from_plan_day_id = None,
            None => {}
        }

        match (patch.meal_id, meal) {
            (_, Some(meal)) => {
                next.meal_id = Some(meal.id);
                next.leftover_from_plan_day_id = None;
            }
            (Some(None), None) => {
                next.meal_id = None;
                next.leftover_from_plan_day_id = None;
            }
            _ => {}
        }

        Ok(next)
    }

    fn record_day_event(&self, actor_id: Uuid, action: AuditAction, day: &PlanDay) {
        self.audit.record(NewAuditEvent {
            household_id: day.household_id,
            actor_id,
            action,
            plan_id: Some(day.plan_id),
            plan_day_id: Some(day.id),
            payload: json!({
                "plan_day_id": day.id,
                "plan_id": day.plan_id,
                "date": format_calendar_date(day.date),
                "meal_id": day.meal_id,
                "leftover_from_plan_day_id": day.leftover_from_plan_day_id,
                "locked": day.locked,
            }),
        });
    }
}
