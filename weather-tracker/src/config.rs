use common::tracing::LogFormat;
use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_TTL_SECONDS;

pub struct Config {
    pub port: u16,
    pub weather_api_url: String,
    pub weather_api_key: String,
    pub cache_dir: PathBuf,
    pub cache_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
    pub http_max_retries: u32,
    pub clear_cache_on_start: bool,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3002),
            weather_api_url: lookup("WEATHER_API_URL")
                .unwrap_or_else(|| "https://api.weatherapi.com/v1".to_string()),
            weather_api_key: lookup("WEATHER_API_KEY").unwrap_or_default(),
            cache_dir: lookup("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./weather-cache")),
            cache_ttl_seconds: lookup("CACHE_TTL_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TTL_SECONDS), // 20 minutes default
            http_timeout_seconds: lookup("HTTP_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            http_max_retries: lookup("HTTP_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            clear_cache_on_start: lookup("CLEAR_CACHE_ON_START")
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            log_format: lookup("LOG_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3002);
        assert_eq!(config.cache_ttl_seconds, 1200);
        assert_eq!(config.http_timeout_seconds, 5);
        assert!(config.clear_cache_on_start);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("CACHE_TTL_SECONDS", "not-a-number"),
            ("CLEAR_CACHE_ON_START", "false"),
            ("LOG_FORMAT", "json"),
            ("CACHE_DIR", "/tmp/weather"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl_seconds, 1200);
        assert!(!config.clear_cache_on_start);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/weather"));
    }
}
