//! Configuration file management for mealweek.
//!
//! Provides a TOML-based config file at `~/.config/mealweek/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mealweek_db::config::DbConfig;

pub const USER_ID_ENV: &str = "MEALWEEK_USER_ID";
pub const HOUSEHOLD_ID_ENV: &str = "MEALWEEK_HOUSEHOLD_ID";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub identity: IdentitySection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// Who the CLI acts as, and for which household.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IdentitySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household_id: Option<Uuid>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealweek config directory.
///
/// XDG layout everywhere: `$XDG_CONFIG_HOME/mealweek` or `~/.config/mealweek`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealweek");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealweek")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // Owner read/write only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct MealweekConfig {
    pub db_config: DbConfig,
    pub user_id: Option<Uuid>,
    pub household_id: Option<Uuid>,
}

impl MealweekConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `MEALWEEK_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - User: `MEALWEEK_USER_ID` > `identity.user_id` > unset
    /// - Household: `MEALWEEK_HOUSEHOLD_ID` > `identity.household_id` > unset
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let identity = file_config.map(|c| c.identity).unwrap_or_default();
        let user_id = env_uuid(USER_ID_ENV)?.or(identity.user_id);
        let household_id = env_uuid(HOUSEHOLD_ID_ENV)?.or(identity.household_id);

        Ok(Self {
            db_config: DbConfig::new(db_url),
            user_id,
            household_id,
        })
    }

    /// The acting user, or an error telling the operator how to set one.
    pub fn require_user(&self) -> Result<Uuid> {
        match self.user_id {
            Some(id) => Ok(id),
            None => bail!(
                "no user id configured; set {USER_ID_ENV} or `identity.user_id` in {}",
                config_path().display()
            ),
        }
    }

    /// The household to act on: an explicit flag wins over configuration.
    pub fn require_household(&self, flag: Option<Uuid>) -> Result<Uuid> {
        match flag.or(self.household_id) {
            Some(id) => Ok(id),
            None => bail!(
                "no household selected; pass --household, set {HOUSEHOLD_ID_ENV}, \
                 or set `identity.household_id` in {}",
                config_path().display()
            ),
        }
    }
}

fn env_uuid(var: &str) -> Result<Option<Uuid>> {
    match std::env::var(var) {
        Ok(raw) => Uuid::parse_str(raw.trim())
            .map(Some)
            .with_context(|| format!("{var} is not a valid UUID: {raw:?}")),
        Err(_) => Ok(None),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
