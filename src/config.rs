use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub repliers: RepliersSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub pulse: PulseSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepliersSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

/// Tunables for the property-search composer.
///
/// These were inline constants in earlier revisions; they live here so the
/// serving market can change without a code edit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_city")]
    pub default_city: String,
    #[serde(default = "default_sold_lookback_days")]
    pub sold_lookback_days: i64,
    #[serde(default = "default_widened_page_size")]
    pub widened_page_size: u32,
}

fn default_city() -> String { "Austin".to_string() }
fn default_sold_lookback_days() -> i64 { 180 }
fn default_widened_page_size() -> u32 { 100 }

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_city: default_city(),
            sold_lookback_days: default_sold_lookback_days(),
            widened_page_size: default_widened_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PulseSettings {
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_zip_centroids_path")]
    pub zip_centroids_path: String,
}

fn default_sample_size() -> u32 { 100 }
fn default_cache_ttl_secs() -> u64 { 900 }
fn default_zip_centroids_path() -> String { "config/zip_centroids.toml".to_string() }

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            zip_centroids_path: default_zip_centroids_path(),
        }
    }
}

/// Saved-CMA persistence is optional; without a URL the CMA endpoints
/// report 503 "not configured".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with MLSGW_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with MLSGW_)
            // e.g., MLSGW_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MLSGW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MLSGW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Substitute well-known bare environment variables into config values.
/// DATABASE_URL and REPLIERS_API_KEY are honored without the MLSGW prefix
/// since deploy platforms commonly inject them under those names.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("MLSGW_DATABASE__URL"))
        .ok();

    let repliers_api_key = env::var("REPLIERS_API_KEY")
        .or_else(|_| env::var("MLSGW_REPLIERS__API_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }
    if let Some(api_key) = repliers_api_key {
        builder = builder.set_override("repliers.api_key", api_key)?;
    }

    builder.build()
}
