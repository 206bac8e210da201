//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the on-device key-value files
    pub data_dir: PathBuf,
    /// OpenFoodFacts base URL (no trailing slash)
    pub off_base_url: String,
    /// Client label sent as `User-Agent` with every lookup
    pub off_user_agent: String,
    /// Upper bound on network wait for text search
    pub search_timeout: Duration,
    /// Queries shorter than this never hit the network
    pub search_min_query_len: usize,
    /// Number of products requested per text search
    pub search_page_size: u32,
    /// Quiet period before a keystroke-driven search is issued
    pub search_debounce: Duration,
}

pub const DEFAULT_BASE_URL: &str = "https://fr.openfoodfacts.org";
pub const DEFAULT_USER_AGENT: &str = "SuiviNutrition/1.0";

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            off_base_url: DEFAULT_BASE_URL.to_string(),
            off_user_agent: DEFAULT_USER_AGENT.to_string(),
            search_timeout: Duration::from_millis(8000),
            search_min_query_len: 3,
            search_page_size: 10,
            search_debounce: Duration::from_millis(400),
        }
    }
}

impl Config {
    /// Default config for tests. Lookups point at a local port nothing listens on.
    pub fn test_default() -> Self {
        Self {
            data_dir: env::temp_dir().join("meal-tracker-test"),
            off_base_url: "http://127.0.0.1:9".to_string(),
            off_user_agent: "MealTrackerTest/1.0".to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset ones fall back to `Config::default()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            data_dir: env::var("MEAL_TRACKER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            off_base_url: env::var("OFF_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.off_base_url),
            off_user_agent: env::var("OFF_USER_AGENT")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.off_user_agent),
            search_timeout: parse_var("SEARCH_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_timeout),
            search_min_query_len: parse_var("SEARCH_MIN_QUERY_LEN")?
                .unwrap_or(defaults.search_min_query_len),
            search_page_size: parse_var("SEARCH_PAGE_SIZE")?.unwrap_or(defaults.search_page_size),
            search_debounce: parse_var("SEARCH_DEBOUNCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_debounce),
        })
    }
}

/// Read and parse an optional variable. Unset is `Ok(None)`.
fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
