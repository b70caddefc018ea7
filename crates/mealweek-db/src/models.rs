use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PlanGenerated,
    PlanRegenerated,
    DayMealSet,
    DayMealCleared,
    DayLeftoverSet,
    DayLocked,
    DayUnlocked,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PlanGenerated => "plan_generated",
            Self::PlanRegenerated => "plan_regenerated",
            Self::DayMealSet => "day_meal_set",
            Self::DayMealCleared => "day_meal_cleared",
            Self::DayLeftoverSet => "day_leftover_set",
            Self::DayLocked => "day_locked",
            Self::DayUnlocked => "day_unlocked",
        };
        f.write_str(s)
    }
}

impl FromStr for AuditAction {
    type Err = AuditActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan_generated" => Ok(Self::PlanGenerated),
            "plan_regenerated" => Ok(Self::PlanRegenerated),
            "day_meal_set" => Ok(Self::DayMealSet),
            "day_meal_cleared" => Ok(Self::DayMealCleared),
            "day_leftover_set" => Ok(Self::DayLeftoverSet),
            "day_locked" => Ok(Self::DayLocked),
            "day_unlocked" => Ok(Self::DayUnlocked),
            other => Err(AuditActionParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`AuditAction`] string.
#[derive(Debug, Clone)]
pub struct AuditActionParseError(pub String);

impl fmt::Display for AuditActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid audit action: {:?}", self.0)
    }
}

impl std::error::Error for AuditActionParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A household -- the owner of a meal catalog and its plans.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A meal in a household's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// The `(id, name)` projection of a meal the planner works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MealRef {
    pub id: Uuid,
    pub name: String,
}

/// The seven-day schedule for one household and one Monday-aligned week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub household_id: Uuid,
    pub week_start: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Uuid,
}

/// One calendar day of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlanDay {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub household_id: Uuid,
    pub date: NaiveDate,
    pub meal_id: Option<Uuid>,
    pub leftover_from_plan_day_id: Option<Uuid>,
    pub locked: bool,
}

/// A row of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEvent {
    pub id: i64,
    pub household_id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub plan_id: Option<Uuid>,
    pub plan_day_id: Option<Uuid>,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
