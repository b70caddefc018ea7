//! Display projection of a week: meal names, weekday labels, leftover links.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use mealweek_db::models::MealRef;

use super::WeekPlan;
use crate::week::{format_calendar_date, weekday_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    pub plan_id: Uuid,
    pub week_start: NaiveDate,
    pub days: Vec<DayView>,
    /// Whether any day has a meal.
    pub has_meals: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub weekday: &'static str,
    /// `"Monday (2024-02-12)"`.
    pub label: String,
    pub meal_id: Option<Uuid>,
    /// `None` when the day is empty or its meal is no longer in the catalog.
    pub meal_name: Option<String>,
    pub locked: bool,
    pub leftover_from: Option<LeftoverView>,
}

/// The source of a leftover, by weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeftoverView {
    pub day_id: Uuid,
    /// `None` if the source day is not in this week.
    pub weekday: Option<&'static str>,
}

pub fn day_label(date: NaiveDate) -> String {
    format!("{} ({})", weekday_name(date), format_calendar_date(date))
}

/// Join a week with its catalog for display.
pub fn project_week(week: &WeekPlan, catalog: &[MealRef]) -> WeekView {
    let names: HashMap<Uuid, &str> = catalog.iter().map(|m| (m.id, m.name.as_str())).collect();
    let dates: HashMap<Uuid, NaiveDate> = week.days.iter().map(|d| (d.id, d.date)).collect();

    let days = week
        .days
        .iter()
        .map(|day| DayView {
            id: day.id,
            date: day.date,
            weekday: weekday_name(day.date),
            label: day_label(day.date),
            meal_id: day.meal_id,
            meal_name: day
                .meal_id
                .and_then(|id| names.get(&id))
                .map(|name| (*name).to_owned()),
            locked: day.locked,
            leftover_from: day.leftover_from_plan_day_id.map(|source| LeftoverView {
                day_id: source,
                weekday: dates.get(&source).map(|d| weekday_name(*d)),
            }),
        })
        .collect();

    WeekView {
        plan_id: week.plan.id,
        week_start: week.plan.week_start,
        has_meals: week.days.iter().any(|d| d.meal_id.is_some()),
        days,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use mealweek_db::models::{Plan, PlanDay};

    use super::*;
    use crate::plan::test_support::date;
    use crate::week::dates_of_week;

    fn empty_week(start: &str) -> WeekPlan {
        let now = Utc::now();
        let plan = Plan {
            id: Uuid::new_v4(),
            household_id: Uuid::new_v4(),
            week_start: date(start),
            created_at: now,
            created_by: Uuid::nil(),
            updated_at: now,
            updated_by: Uuid::nil(),
        };
        let days = dates_of_week(plan.week_start)
            .into_iter()
            .map(|d| PlanDay {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                household_id: plan.household_id,
                date: d,
                meal_id: None,
                leftover_from_plan_day_id: None,
                locked: false,
            })
            .collect();
        WeekPlan { plan, days }
    }

    #[test]
    fn labels_name_the_weekday_and_date() {
        assert_eq!(day_label(date("2024-02-12")), "Monday (2024-02-12)");
        assert_eq!(day_label(date("2024-02-18")), "Sunday (2024-02-18)");
    }

    #[test]
    fn empty_week_has_no_meals() {
        let week = empty_week("2024-02-12");
        let view = project_week(&week, &[]);

        assert!(!view.has_meals);
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.days[6].weekday, "Sunday");
        assert!(view.days.iter().all(|d| d.meal_name.is_none()));
    }

    #[test]
    fn joins_meal_names_and_leftover_weekdays() {
        let mut week = empty_week("2024-02-12");
        let curry = MealRef {
            id: Uuid::new_v4(),
            name: "Curry".into(),
        };
        let monday = week.days[0].id;
        week.days[0].meal_id = Some(curry.id);
        week.days[1].meal_id = Some(curry.id);
        week.days[1].leftover_from_plan_day_id = Some(monday);
        week.days[2].meal_id = Some(Uuid::new_v4());

        let view = project_week(&week, std::slice::from_ref(&curry));

        assert!(view.has_meals);
        assert_eq!(view.days[0].meal_name.as_deref(), Some("Curry"));
        assert_eq!(
            view.days[1].leftover_from,
            Some(LeftoverView {
                day_id: monday,
                weekday: Some("Monday"),
            })
        );
        assert_eq!(view.days[2].meal_name, None, "deleted meal has no name");
        assert_eq!(view.days[3].leftover_from, None);
    }
}
