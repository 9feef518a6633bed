use crate::app_env;
use anyhow::{Context, anyhow};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_REFRESH_SECS: &str = "30";
const DEFAULT_ALARM_RINGS: &str = "10";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "15";

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    pub api_url: String,
    pub storage_path: PathBuf,
    pub refresh_interval: Duration,
    pub alarm_rings: u64,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads configuration from the process environment
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for unset values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let storage_path = match lookup(app_env::STORAGE_PATH) {
            Some(path) => PathBuf::from(path),
            None => default_storage_path()?,
        };
        let refresh_secs: u64 = try_load(&lookup, app_env::REFRESH_SECS, DEFAULT_REFRESH_SECS)?;
        if refresh_secs == 0 {
            return Err(anyhow!("{} must be at least 1", app_env::REFRESH_SECS));
        }

        Ok(Config {
            api_url: try_load(&lookup, app_env::API_URL, DEFAULT_API_URL)?,
            storage_path,
            refresh_interval: Duration::from_secs(refresh_secs),
            alarm_rings: try_load(&lookup, app_env::ALARM_RINGS, DEFAULT_ALARM_RINGS)?,
            request_timeout: Duration::from_secs(try_load(
                &lookup,
                app_env::REQUEST_TIMEOUT_SECS,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, anyhow::Error>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_owned()
    });

    raw.trim()
        .parse()
        .map_err(|err| anyhow!("invalid {key} value \"{raw}\": {err}"))
}

fn default_storage_path() -> Result<PathBuf, anyhow::Error> {
    let data_dir = dirs::data_dir()
        .context("no data directory on this platform, set TASKBELL_STORAGE_PATH")?;

    Ok(data_dir.join("taskbell").join("storage.json"))
}
