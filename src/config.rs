// Configuration for the insights binary

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::connection::AnalysisOptions;
use crate::helpers::validate::validate_mongodb_uri;
use crate::models::{DEFAULT_MIN_MILLIS, ProfileQuery};

const APP_NAME: &str = "mongo-insights";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_MONGO_URL: &str = "mongodb://localhost:27017";

/// Settings read from `config.json`, then overridden by the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsightsConfig {
    pub mongo_url: String,
    pub database: Option<String>,
    /// Read-only connection used for profile reads when set.
    pub analysis_url: Option<String>,
    pub analysis_database: Option<String>,
    pub min_millis: i64,
    pub collection: Option<String>,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            mongo_url: DEFAULT_MONGO_URL.to_string(),
            database: None,
            analysis_url: None,
            analysis_database: None,
            min_millis: DEFAULT_MIN_MILLIS,
            collection: None,
        }
    }
}

impl InsightsConfig {
    /// Load the default config file if present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Ok(path) if path.exists() => Self::read_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME).join(CONFIG_FILE))
            .context("Could not determine config directory")
    }

    fn read_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to deserialize {}", path.display()))
    }

    /// Override fields from `lookup`, usually the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("MONGO_URL") {
            self.mongo_url = url;
        }
        if let Some(database) = lookup("MONGO_DATABASE") {
            self.database = Some(database);
        }
        if let Some(url) = lookup("INSIGHTS_ANALYSIS_URL") {
            self.analysis_url = Some(url).filter(|url| !url.trim().is_empty());
        }
        if let Some(database) = lookup("INSIGHTS_ANALYSIS_DATABASE") {
            self.analysis_database = Some(database);
        }
        if let Some(millis) = lookup("INSIGHTS_MIN_MILLIS") {
            self.min_millis = millis
                .trim()
                .parse()
                .with_context(|| format!("INSIGHTS_MIN_MILLIS is not an integer: {millis}"))?;
        }
        if let Some(collection) = lookup("INSIGHTS_COLLECTION") {
            self.collection = Some(collection).filter(|c| !c.is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_mongodb_uri(&self.mongo_url)
            .map_err(anyhow::Error::msg)
            .context("Invalid MONGO_URL")?;
        if let Some(url) = &self.analysis_url {
            validate_mongodb_uri(url)
                .map_err(anyhow::Error::msg)
                .context("Invalid INSIGHTS_ANALYSIS_URL")?;
        }
        Ok(())
    }

    pub fn to_profile_query(&self) -> ProfileQuery {
        ProfileQuery {
            min_millis: self.min_millis,
            collection: self.collection.clone(),
            ..ProfileQuery::default()
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            database: self.analysis_database.clone(),
            app_name: Some(APP_NAME.to_string()),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(10)),
            direct_connection: None,
        }
    }
}

/// Read `name` from the environment, falling back to `default`.
pub fn env_var(name: &str, default: Option<&str>) -> Result<String> {
    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => default.map(str::to_string).with_context(|| format!("{name} is not set")),
    }
}
