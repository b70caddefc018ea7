//! CLI handlers for `mealweek week` and `mealweek day` subcommands.
//!
//! - `mealweek week show [--start DATE]`     -- print the week, creating it if needed
//! - `mealweek week generate [--start DATE]` -- fill unlocked days from the catalog
//! - `mealweek day set <day-id> ...`         -- edit one day

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use mealweek_core::plan::{DayView, WeekView, project_week};
use mealweek_core::week::{parse_week_start, today};
use mealweek_core::{DayPatch, Planner};
use mealweek_db::queries::households;

use crate::{DayCommands, WeekCommands};

pub async fn run_week_command(
    command: WeekCommands,
    pool: &PgPool,
    household_id: Uuid,
    actor_id: Uuid,
) -> Result<()> {
    households::get_household(pool, household_id)
        .await?
        .with_context(|| format!("household {household_id} not found"))?;
    let planner = Planner::postgres(pool.clone());

    match command {
        WeekCommands::Show { start } => {
            let week_start = parse_week_start(start.as_deref(), today())?;
            let week = planner
                .resolve_week(household_id, actor_id, week_start)
                .await?;
            let catalog = planner.catalog(household_id).await?;
            print_week(&project_week(&week, &catalog));
        }
        WeekCommands::Generate { start } => {
            let week_start = parse_week_start(start.as_deref(), today())?;
            let outcome = planner
                .generate(household_id, actor_id, week_start)
                .await?;
            let catalog = planner.catalog(household_id).await?;

            let verb = if outcome.regenerated {
                "Regenerated"
            } else {
                "Generated"
            };
            println!("{verb} {} day(s).", outcome.assigned);
            println!();
            print_week(&project_week(&outcome.week, &catalog));
        }
    }
    Ok(())
}

pub async fn run_day_command(
    command: DayCommands,
    pool: &PgPool,
    household_id: Uuid,
    actor_id: Uuid,
) -> Result<()> {
    let planner = Planner::postgres(pool.clone());

    match command {
        DayCommands::Set {
            day_id,
            meal,
            clear_meal,
            lock,
            unlock,
            leftover_from,
            clear_leftover,
        } => {
            let patch = build_patch(meal, clear_meal, lock, unlock, leftover_from, clear_leftover);
            let day = planner
                .update_day(household_id, actor_id, day_id, &patch)
                .await?
                .with_context(|| format!("day {day_id} not found in household {household_id}"))?;

            println!("Day {} updated.", day.id);
            println!(
                "  Meal:     {}",
                day.meal_id.map_or_else(|| "-".to_string(), |m| m.to_string())
            );
            println!("  Locked:   {}", day.locked);
            if let Some(source) = day.leftover_from_plan_day_id {
                println!("  Leftover: from {source}");
            }
        }
    }
    Ok(())
}

/// Translate mutually exclusive flag pairs into a three-state patch.
fn build_patch(
    meal: Option<Uuid>,
    clear_meal: bool,
    lock: bool,
    unlock: bool,
    leftover_from: Option<Uuid>,
    clear_leftover: bool,
) -> DayPatch {
    let mut patch = DayPatch::new();
    if let Some(id) = meal {
        patch = patch.meal(id);
    } else if clear_meal {
        patch = patch.clear_meal();
    }
    if lock {
        patch = patch.lock(true);
    } else if unlock {
        patch = patch.lock(false);
    }
    if let Some(id) = leftover_from {
        patch = patch.leftover_from(id);
    } else if clear_leftover {
        patch = patch.clear_leftover();
    }
    patch
}

fn print_week(view: &WeekView) {
    println!("Week of {} (plan {})", view.week_start, view.plan_id);
    if !view.has_meals {
        println!("No meals planned yet. Run `mealweek week generate` to fill the week.");
    }
    println!();

    let label_w = view.days.iter().map(|d| d.label.len()).max().unwrap_or(5).max(5);
    let meal_w = view
        .days
        .iter()
        .map(|d| meal_cell(d).len())
        .max()
        .unwrap_or(4)
        .max(4);
    println!("{:<label_w$}  {:<meal_w$}  {:<6}  {:<36}", "DAY", "MEAL", "LOCKED", "ID");
    for day in &view.days {
        println!(
            "{:<label_w$}  {:<meal_w$}  {:<6}  {:<36}",
            day.label,
            meal_cell(day),
            if day.locked { "yes" } else { "" },
            day.id
        );
    }
}

fn meal_cell(day: &DayView) -> String {
    let name = match (&day.meal_name, day.meal_id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("<removed meal {id}>"),
        (None, None) => "-".to_string(),
    };
    match &day.leftover_from {
        Some(source) => match source.weekday {
            Some(weekday) => format!("{name} (leftovers from {weekday})"),
            None => format!("{name} (leftovers)"),
        },
        None => name,
    }
}
