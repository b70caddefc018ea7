//! CLI handlers for `mealweek household` and `mealweek meal` subcommands.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use mealweek_db::queries::{households, meals};

use crate::{HouseholdCommands, MealCommands};

pub async fn run_household_command(command: HouseholdCommands, pool: &PgPool) -> Result<()> {
    match command {
        HouseholdCommands::Create { name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("household name must not be empty");
            }
            let household = households::insert_household(pool, name).await?;
            println!("Household created.");
            println!("  ID:   {}", household.id);
            println!("  Name: {}", household.name);
            println!();
            println!(
                "Set MEALWEEK_HOUSEHOLD_ID={} or `identity.household_id` to make it the default.",
                household.id
            );
            Ok(())
        }
    }
}

pub async fn run_meal_command(
    command: MealCommands,
    pool: &PgPool,
    household_id: Uuid,
) -> Result<()> {
    households::get_household(pool, household_id)
        .await?
        .with_context(|| format!("household {household_id} not found"))?;

    match command {
        MealCommands::Add { name, notes } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("meal name must not be empty");
            }
            let meal = meals::insert_meal(pool, household_id, name, &notes).await?;
            println!("Meal {} added ({}).", meal.name, meal.id);
            Ok(())
        }
        MealCommands::List => {
            let catalog = meals::list_meals(pool, household_id).await?;
            if catalog.is_empty() {
                println!("No meals yet. Use `mealweek meal add <name>` to add one.");
                return Ok(());
            }

            let name_w = catalog.iter().map(|m| m.name.len()).max().unwrap_or(4).max(4);
            println!("{:<36}  {:<name_w$}  NOTES", "ID", "NAME");
            for meal in &catalog {
                println!("{:<36}  {:<name_w$}  {}", meal.id, meal.name, meal.notes);
            }
            Ok(())
        }
        MealCommands::Rename {
            meal_id,
            name,
            notes,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("meal name must not be empty");
            }
            let meal = meals::update_meal(pool, household_id, meal_id, name, notes.as_deref())
                .await?
                .with_context(|| format!("meal {meal_id} not found in household {household_id}"))?;
            println!("Meal {} renamed to {}.", meal.id, meal.name);
            Ok(())
        }
        MealCommands::Delete { meal_id } => {
            if !meals::delete_meal(pool, household_id, meal_id).await? {
                bail!("meal {meal_id} not found in household {household_id}");
            }
            println!("Meal {meal_id} deleted. Days that served it are now empty.");
            Ok(())
        }
    }
}
