//! Errors surfaced by the plan engine.

use uuid::Uuid;

/// Everything that can go wrong in a planner operation.
///
/// All variants except [`PlanError::IncompletePlan`] and
/// [`PlanError::Storage`] are caller-fixable.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("patch must set at least one of meal_id, locked, leftover_from_plan_day_id")]
    EmptyPatch,

    #[error("no meals available; add meals to the catalog before generating")]
    NoMealsAvailable,

    #[error("meal {0} not found in this household")]
    MealNotFound(Uuid),

    #[error("leftover source day {0} not found in this plan")]
    LeftoverSourceNotFound(Uuid),

    #[error("leftover source day {0} has no meal")]
    LeftoverSourceEmpty(Uuid),

    #[error("day {0} cannot be a leftover of itself")]
    SelfLeftover(Uuid),

    #[error("plan {plan_id} has {found} of 7 days after ensuring the week")]
    IncompletePlan { plan_id: Uuid, found: usize },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PlanError {
    /// Whether the caller can fix this by changing its input.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::IncompletePlan { .. } | Self::Storage(_))
    }

    /// Whether this error names a referenced entity that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MealNotFound(_) | Self::LeftoverSourceNotFound(_))
    }
}
