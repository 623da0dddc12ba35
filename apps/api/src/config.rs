use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// The geocoding provider allows at most one request per second.
const MIN_GEOCODE_INTERVAL_MS: u64 = 1000;

/// Application configuration loaded from environment variables.
/// Every variable has a default; `DATABASE_URL` selects the Postgres store when set.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub reports_path: PathBuf,
    pub coordinates_path: PathBuf,
    pub nominatim_url: String,
    pub geocoder_user_agent: String,
    pub geocode_query_suffix: String,
    pub geocode_min_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let interval_ms = var("GEOCODE_MIN_INTERVAL_MS", "1000")
            .parse::<u64>()
            .context("GEOCODE_MIN_INTERVAL_MS must be a whole number of milliseconds")?
            .max(MIN_GEOCODE_INTERVAL_MS);

        Ok(Config {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            reports_path: PathBuf::from(var("REPORTS_PATH", "data/disaster_reports.json")),
            coordinates_path: PathBuf::from(var("COORDINATES_PATH", "data/location_coords.json")),
            nominatim_url: var(
                "NOMINATIM_URL",
                "https://nominatim.openstreetmap.org/search",
            ),
            geocoder_user_agent: var("GEOCODER_USER_AGENT", "relief-coordinator"),
            geocode_query_suffix: var("GEOCODE_QUERY_SUFFIX", "India"),
            geocode_min_interval: Duration::from_millis(interval_ms),
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }
}
