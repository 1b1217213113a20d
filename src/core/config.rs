use super::currency::CurrencyCode;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_CURRENCIES: [&str; 7] = ["NOK", "EUR", "SEK", "PLN", "RON", "DKK", "CZK"];

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EcbProviderConfig {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure.
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for EcbProviderConfig {
    fn default() -> Self {
        EcbProviderConfig {
            base_url: "https://data-api.ecb.europa.eu".to_string(),
            timeout_secs: 30,
            retries: 2,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub ecb: EcbProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Currencies to derive pairs for; EUR is the quoting base.
    pub currencies: Vec<CurrencyCode>,
    /// First date of a full load.
    pub history_start: NaiveDate,
    pub database_path: Option<String>,
    /// Tag stored with every loaded rate.
    pub source_name: String,
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currencies: DEFAULT_CURRENCIES
                .iter()
                .filter_map(|c| c.parse().ok())
                .collect(),
            history_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            database_path: None,
            source_name: "ECB".to_string(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no config file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fxdwh", "fxdwh")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.database_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "fxdwh", "fxdwh")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("fx_dwh.db"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.currencies.is_empty() {
            bail!("At least one currency must be configured");
        }
        let mut seen = HashSet::new();
        for currency in &self.currencies {
            if !seen.insert(currency) {
                bail!("Duplicate currency in config: {}", currency);
            }
        }
        if self.source_name.trim().is_empty() {
            bail!("source_name must not be empty");
        }
        Ok(())
    }
}
