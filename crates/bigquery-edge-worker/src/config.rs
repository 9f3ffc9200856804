use std::num::ParseIntError;
use std::sync::Arc;
use std::time::Duration;

use gcp_service_auth::ServiceAccountKey;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("'${0}' is not set")]
    Missing(&'static str),
    #[error("'${var}' is not a valid service account key: {source}")]
    InvalidCredential {
        var: &'static str,
        #[source]
        source: gcp_service_auth::Error,
    },
    #[error("'${var}' is not a valid integer ({value:?}): {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub credential: Arc<ServiceAccountKey>,
    pub port: u16,
    /// How long a fetched token is served from the cache.
    pub token_cache_ttl: Duration,
    /// Overrides the BigQuery REST endpoint, e.g. to point at an emulator.
    pub bigquery_base_url: Option<Arc<str>>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        const CREDENTIAL_VAR: &str = "GCP_SERVICE_ACCOUNT";

        let raw_credential = lookup(CREDENTIAL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(CREDENTIAL_VAR))?;

        let credential = ServiceAccountKey::from_json_str(&raw_credential).map_err(|source| {
            ConfigError::InvalidCredential {
                var: CREDENTIAL_VAR,
                source,
            }
        })?;

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let ttl_secs = parse_or(&lookup, "TOKEN_CACHE_TTL_SECS", DEFAULT_TOKEN_CACHE_TTL_SECS)?;

        let bigquery_base_url = lookup("BIGQUERY_BASE_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map(Arc::from);

        Ok(Self {
            credential: Arc::new(credential),
            port,
            token_cache_ttl: Duration::from_secs(ttl_secs),
            bigquery_base_url,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr<Err = ParseIntError>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { var, value, source }),
    }
}
