//! Settings
//!
//! Defaults, optionally overridden by `<config dir>/budgetwise/config.toml`,
//! then by environment variables.
//!
//! ```toml
//! database_path = "/var/lib/budgetwise/budgetwise.db"
//! forecast_horizon = "next quarter"
//! trend_months = 12
//! recent_transactions = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::forecast::DEFAULT_HORIZON;
use crate::store::DEFAULT_EVENT_CAPACITY;

/// Environment variable for the database path
pub const DB_PATH_ENV: &str = "BUDGETWISE_DB";

/// Longest trend the reports will compute
pub const MAX_TREND_MONTHS: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: String,
    pub forecast_horizon: String,
    pub trend_months: usize,
    pub recent_transactions: usize,
    pub admin_transactions_limit: usize,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "budgetwise.db".to_string(),
            forecast_horizon: DEFAULT_HORIZON.to_string(),
            trend_months: 6,
            recent_transactions: 5,
            admin_transactions_limit: 10,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Settings {
    /// Default file, if present, then the process environment
    pub fn load() -> Result<Self> {
        let settings = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        Ok(settings.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading settings");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        settings.validate()
    }

    /// Apply `BUDGETWISE_DB`; `lookup` is `std::env::var` outside tests
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.database_path = path;
        }
        self
    }

    /// `<config dir>/budgetwise/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("budgetwise").join("config.toml"))
    }

    /// Clamp a requested trend length to what reports support
    pub fn trend_months_or_default(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.trend_months)
            .clamp(1, MAX_TREND_MONTHS)
    }

    fn validate(self) -> Result<Self> {
        if self.trend_months == 0 || self.trend_months > MAX_TREND_MONTHS {
            return Err(Error::Config(format!(
                "trend_months must be between 1 and {}",
                MAX_TREND_MONTHS
            )));
        }
        if self.forecast_horizon.trim().is_empty() {
            return Err(Error::Config("forecast_horizon must not be empty".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.trend_months, 6);
        assert_eq!(settings.forecast_horizon, "next month");
        assert_eq!(settings.recent_transactions, 5);
        assert_eq!(settings.admin_transactions_limit, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_toml_str("trend_months = 12\n").unwrap();
        assert_eq!(settings.trend_months, 12);
        assert_eq!(settings.database_path, "budgetwise.db");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        assert!(matches!(
            Settings::from_toml_str("trend_months = \"six\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("trend_months = 48"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "forecast_horizon = \"next quarter\"\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.forecast_horizon, "next quarter");
    }

    #[test]
    fn test_env_overrides_file() {
        let settings = Settings::from_toml_str("database_path = \"from-file.db\"")
            .unwrap()
            .with_env_overrides(|key| (key == DB_PATH_ENV).then(|| "from-env.db".to_string()));
        assert_eq!(settings.database_path, "from-env.db");

        let unchanged = Settings::default().with_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(unchanged.database_path, "budgetwise.db");
    }

    #[test]
    fn test_trend_months_clamped() {
        let settings = Settings::default();
        assert_eq!(settings.trend_months_or_default(None), 6);
        assert_eq!(settings.trend_months_or_default(Some(100)), MAX_TREND_MONTHS);
        assert_eq!(settings.trend_months_or_default(Some(0)), 1);
    }
}
