//! Store endpoint and credentials, read from the environment before any request is made.

use crate::{DEFAULT_TIMEOUT_SECS, SyncError};
use log::warn;
use std::{env, fmt, time::Duration};

pub const STORE_URL_VAR: &str = "TRIPDATA_STORE_URL";
pub const STORE_KEY_VAR: &str = "TRIPDATA_STORE_KEY";
pub const TIMEOUT_VAR: &str = "TRIPDATA_TIMEOUT_SECS";

/// Everything needed to open a store client.
#[derive(Clone, PartialEq)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Load the config from the process environment, honoring a `.env` file if one exists.
    ///
    /// # Errors
    /// Returns a configuration error naming every required variable that is unset or empty.
    pub fn from_env() -> Result<Self, SyncError> {
        // no .env file is fine
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the config through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns a configuration error naming every required variable that is unset or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let url = read(STORE_URL_VAR).map(|v| v.trim_end_matches('/').to_string());
        let api_key = read(STORE_KEY_VAR);

        let (url, api_key) = match (url, api_key) {
            (Some(url), Some(api_key)) => (url, api_key),
            (url, api_key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(STORE_URL_VAR);
                }
                if api_key.is_none() {
                    missing.push(STORE_KEY_VAR);
                }
                return Err(SyncError::missing_config(&missing));
            }
        };

        let timeout_secs = match read(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!("Ignoring {TIMEOUT_VAR}={raw}, using {DEFAULT_TIMEOUT_SECS} seconds.");
                DEFAULT_TIMEOUT_SECS
            }),
        };

        Ok(Self {
            url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
