use crate::engine::DilutionMode;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POINTS_API_URL: &str = "https://api.resolv.im";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub database_path: String,
    pub points_api_url: String,
    /// Default for `/dilution` when the request names no mode. Ingestion ignores it.
    pub dilution_mode: DilutionMode,
    /// Bearer secret for the ingestion trigger. `None` leaves the trigger open.
    pub ingest_secret: Option<String>,
    /// Run ingestion in-process on this period in addition to the HTTP trigger.
    pub ingest_interval: Option<Duration>,
    pub upstream_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let bind_addr = env_map
            .get("BIND_ADDR")
            .map(|s| s.as_str())
            .unwrap_or("127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IP address".to_string(),
                )
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let points_api_url = env_map
            .get("POINTS_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_POINTS_API_URL.to_string());

        let dilution_mode = env_map
            .get("DILUTION_MODE")
            .map(|s| s.as_str())
            .unwrap_or("share")
            .parse::<DilutionMode>()
            .map_err(|msg| ConfigError::InvalidValue("DILUTION_MODE".to_string(), msg))?;

        let ingest_secret = env_map
            .get("INGEST_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let ingest_interval = optional_secs(&env_map, "INGEST_INTERVAL_SECS")?;
        if ingest_interval == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue(
                "INGEST_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let upstream_timeout =
            optional_secs(&env_map, "UPSTREAM_TIMEOUT_SECS")?.unwrap_or(Duration::from_secs(10));

        Ok(Config {
            port,
            bind_addr,
            database_path,
            points_api_url,
            dilution_mode,
            ingest_secret,
            ingest_interval,
            upstream_timeout,
        })
    }
}

fn optional_secs(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<Option<Duration>, ConfigError> {
    env_map
        .get(key)
        .map(|s| {
            s.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "must be whole seconds".to_string())
            })
        })
        .transpose()
}
