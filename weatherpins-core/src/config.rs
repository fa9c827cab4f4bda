use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_STORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_COLLECTION: &str = "locations";

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { base_url: default_weather_url() }
    }
}

/// Document store settings.
///
/// Example TOML:
/// [store]
/// project_id = "my-project"
/// api_key = "..."
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub base_url: Option<String>,
}

/// Fully resolved store settings, ready to build a client from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

impl StoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_STORE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            api_key: None,
            access_token: None,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Resolve store settings, filling defaults for everything but the project id.
    pub fn store_settings(&self) -> Result<StoreSettings> {
        let project_id = self
            .store
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No document store project configured.\n\
                     Hint: run `weatherpins configure` and enter your project id."
                )
            })?;

        let mut settings = StoreSettings::new(project_id);
        if let Some(url) = &self.store.base_url {
            settings.base_url = url.clone();
        }
        if let Some(database) = &self.store.database {
            settings.database = database.clone();
        }
        if let Some(collection) = &self.store.collection {
            settings.collection = collection.clone();
        }
        settings.api_key = self.store.api_key.clone();
        settings.access_token = self.store.access_token.clone();

        Ok(settings)
    }

    pub fn is_store_configured(&self) -> bool {
        self.store_settings().is_ok()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherpins", "weatherpins")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}
