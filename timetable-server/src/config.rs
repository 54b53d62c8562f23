//! Service configuration from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_TTL_SECS, MAX_TTL_SECS};
use crate::upstream::{DEFAULT_BASE_URL, TimetableConfig};

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// An environment variable held a value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// Everything the server reads from its environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `TIMETABLE_API_KEY`; requests fail fast without it.
    pub api_key: Option<String>,
    /// `BASE_URL`. Set-but-empty is kept, and reported when fetching.
    pub base_url: String,
    /// `TIMETABLE_ID`; when unset the first published timetable is used.
    pub timetable_id: Option<String>,
    /// `CACHE_TTL`, in seconds, at most one day.
    pub cache_ttl: Duration,
    /// `BIND_ADDR`.
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cache_ttl = match non_empty("CACHE_TTL") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs <= MAX_TTL_SECS)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError {
                    key: "CACHE_TTL",
                    value: raw.clone(),
                })?,
            None => Duration::from_secs(DEFAULT_TTL_SECS),
        };

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr.trim().parse().map_err(|_| ConfigError {
            key: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        Ok(Self {
            api_key: non_empty("TIMETABLE_API_KEY"),
            base_url: lookup("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timetable_id: non_empty("TIMETABLE_ID"),
            cache_ttl,
            bind_addr,
        })
    }

    /// Upstream client settings.
    pub fn timetable_config(&self) -> TimetableConfig {
        TimetableConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            timetable_id: self.timetable_id.clone(),
            ..TimetableConfig::default()
        }
    }

    /// Cache settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default().with_ttl(self.cache_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timetable_id, None);
        assert_eq!(config.cache_ttl, Duration::from_secs(25));
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn reads_all_variables() {
        let config = load(&[
            ("TIMETABLE_API_KEY", "secret"),
            ("BASE_URL", "http://localhost:9000/api"),
            ("TIMETABLE_ID", "tt-9"),
            ("CACHE_TTL", "60"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.timetable_id.as_deref(), Some("tt-9"));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.bind_addr.port(), 8080);

        let upstream = config.timetable_config();
        assert_eq!(upstream.api_key.as_deref(), Some("secret"));
        assert_eq!(upstream.timetable_id.as_deref(), Some("tt-9"));
        assert_eq!(upstream.timeout_secs, 20);
        assert_eq!(config.cache_config().ttl, Duration::from_secs(60));
    }

    #[test]
    fn empty_values_are_unset() {
        let config = load(&[("TIMETABLE_API_KEY", ""), ("TIMETABLE_ID", "  ")]).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.timetable_id, None);
    }

    #[test]
    fn empty_base_url_is_kept() {
        let config = load(&[("BASE_URL", "")]).unwrap();
        assert_eq!(config.base_url, "");
    }

    #[test]
    fn invalid_ttl_is_an_error() {
        let err = load(&[("CACHE_TTL", "soon")]).unwrap_err();
        assert_eq!(err.key, "CACHE_TTL");
        assert_eq!(err.to_string(), "invalid value for CACHE_TTL: \"soon\"");
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        let err = load(&[("CACHE_TTL", "99999999999999")]).unwrap_err();
        assert_eq!(err.key, "CACHE_TTL");
        assert_eq!(err.value, "99999999999999");

        let config = load(&[("CACHE_TTL", &MAX_TTL_SECS.to_string())]).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(MAX_TTL_SECS));
    }

    #[test]
    fn invalid_bind_addr_is_an_error() {
        let err = load(&[("BIND_ADDR", "localhost")]).unwrap_err();
        assert_eq!(err.key, "BIND_ADDR");
    }
}
