mod catalog_cmds;
mod config;
mod serve_cmd;
mod week_cmds;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use mealweek_db::pool;

use config::MealweekConfig;

#[derive(Parser)]
#[command(name = "mealweek", about = "Weekly meal planner for households")]
struct Cli {
    /// Database URL (overrides MEALWEEK_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealweek config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/mealweek")]
        db_url: String,
        /// User ID recorded as the actor of every change
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Default household for week and meal commands
        #[arg(long)]
        household_id: Option<Uuid>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit,
    /// Household management
    Household {
        #[command(subcommand)]
        command: HouseholdCommands,
    },
    /// Meal catalog management
    Meal {
        /// Household to act on (defaults to the configured household)
        #[arg(long, global = true)]
        household: Option<Uuid>,
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Weekly plan commands
    Week {
        /// Household to act on (defaults to the configured household)
        #[arg(long, global = true)]
        household: Option<Uuid>,
        #[command(subcommand)]
        command: WeekCommands,
    },
    /// Edit a single day of a plan
    Day {
        /// Household to act on (defaults to the configured household)
        #[arg(long, global = true)]
        household: Option<Uuid>,
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum HouseholdCommands {
    /// Create a household and print its ID
    Create {
        /// Display name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum MealCommands {
    /// Add a meal to the catalog
    Add {
        /// Meal name
        name: String,
        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List the catalog in the order generation assigns it
    List,
    /// Rename a meal, optionally replacing its notes
    Rename {
        /// Meal ID
        meal_id: Uuid,
        /// New name
        name: String,
        /// Replacement notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a meal; days serving it become empty
    Delete {
        /// Meal ID
        meal_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum WeekCommands {
    /// Show the week (created on first view)
    Show {
        /// Any date in the week, YYYY-MM-DD (defaults to the current week)
        #[arg(long)]
        start: Option<String>,
    },
    /// Fill every unlocked day from the catalog
    Generate {
        /// Any date in the week, YYYY-MM-DD (defaults to the current week)
        #[arg(long)]
        start: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DayCommands {
    /// Change a day's meal, lock, or leftover link
    Set {
        /// Plan day ID
        day_id: Uuid,
        /// Meal to serve
        #[arg(long, conflicts_with = "clear_meal")]
        meal: Option<Uuid>,
        /// Remove the meal (and any leftover link)
        #[arg(long)]
        clear_meal: bool,
        /// Protect the day from generation
        #[arg(long, conflicts_with = "unlock")]
        lock: bool,
        /// Allow generation to overwrite the day
        #[arg(long)]
        unlock: bool,
        /// Serve leftovers of another day in the same week
        #[arg(long, conflicts_with = "clear_leftover")]
        leftover_from: Option<Uuid>,
        /// Drop the leftover link, keeping the meal
        #[arg(long)]
        clear_leftover: bool,
    },
}

/// Execute the `mealweek init` command: write config file.
fn cmd_init(
    db_url: &str,
    user_id: Option<Uuid>,
    household_id: Option<Uuid>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let user_id = user_id.unwrap_or_else(Uuid::new_v4);
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        identity: config::IdentitySection {
            user_id: Some(user_id),
            household_id,
        },
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  identity.user_id = {user_id}");
    if let Some(household) = household_id {
        println!("  identity.household_id = {household}");
    }
    println!();
    println!("Next: run `mealweek db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `mealweek db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = MealweekConfig::resolve(cli_db_url)?;

    println!("Initializing mealweek database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("mealweek db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            user_id,
            household_id,
            force,
        } => {
            cmd_init(&db_url, user_id, household_id, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Household { command } => {
            let resolved = MealweekConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = catalog_cmds::run_household_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Meal { household, command } => {
            let resolved = MealweekConfig::resolve(cli.database_url.as_deref())?;
            let household_id = resolved.require_household(household)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = catalog_cmds::run_meal_command(command, &db_pool, household_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Week { household, command } => {
            let resolved = MealweekConfig::resolve(cli.database_url.as_deref())?;
            let household_id = resolved.require_household(household)?;
            let actor_id = resolved.require_user()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                week_cmds::run_week_command(command, &db_pool, household_id, actor_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Day { household, command } => {
            let resolved = MealweekConfig::resolve(cli.database_url.as_deref())?;
            let household_id = resolved.require_household(household)?;
            let actor_id = resolved.require_user()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                week_cmds::run_day_command(command, &db_pool, household_id, actor_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = MealweekConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = serve_cmd::run_serve(db_pool.clone(), &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that mutate process environment variables.
    pub(crate) fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn day_set_rejects_meal_and_clear_meal_together() {
        let day = Uuid::new_v4();
        let meal = Uuid::new_v4();
        let result = Cli::try_parse_from([
            "mealweek",
            "day",
            "set",
            &day.to_string(),
            "--meal",
            &meal.to_string(),
            "--clear-meal",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn meal_rename_takes_optional_notes() {
        let meal = Uuid::new_v4();
        let cli = Cli::try_parse_from(["mealweek", "meal", "rename", &meal.to_string(), "Dal"])
            .unwrap();
        match cli.command {
            Commands::Meal {
                command:
                    MealCommands::Rename {
                        meal_id,
                        name,
                        notes,
                    },
                ..
            } => {
                assert_eq!(meal_id, meal);
                assert_eq!(name, "Dal");
                assert_eq!(notes, None);
            }
            _ => panic!("expected meal rename"),
        }

        assert!(Cli::try_parse_from(["mealweek", "meal", "delete", "not-a-uuid"]).is_err());
    }

    #[test]
    fn week_show_accepts_household_after_subcommand() {
        let household = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "mealweek",
            "week",
            "show",
            "--start",
            "2024-02-12",
            "--household",
            &household.to_string(),
        ])
        .unwrap();

        match cli.command {
            Commands::Week {
                household: h,
                command: WeekCommands::Show { start },
            } => {
                assert_eq!(h, Some(household));
                assert_eq!(start.as_deref(), Some("2024-02-12"));
            }
            _ => panic!("expected week show"),
        }
    }
}
