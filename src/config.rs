use crate::error::ConfigError;
use std::env;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:poll_booth.db";
pub const DEFAULT_RESULTS_DELAY_MS: u64 = 2000; // thank-you screen before results
pub const DEFAULT_SIGN_IN_ROUTE: &str = "/auth/signin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub results_delay: Duration,
    pub sign_in_route: String,
    pub poll_id: Option<String>,
    pub voter_id: Option<String>,
}

impl Config {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()` first
    /// to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let results_delay = match non_empty("RESULTS_DELAY_MS") {
            Some(raw) => {
                let millis = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidDelay(raw.clone()))?;
                Duration::from_millis(millis)
            }
            None => Duration::from_millis(DEFAULT_RESULTS_DELAY_MS),
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            results_delay,
            sign_in_route: non_empty("SIGN_IN_ROUTE").unwrap_or_else(|| DEFAULT_SIGN_IN_ROUTE.to_string()),
            poll_id: non_empty("POLL_ID"),
            voter_id: non_empty("VOTER_ID"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.results_delay, Duration::from_millis(2000));
        assert_eq!(config.sign_in_route, "/auth/signin");
        assert_eq!(config.poll_id, None);
        assert_eq!(config.voter_id, None);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("RESULTS_DELAY_MS", "500"),
            ("SIGN_IN_ROUTE", "/login"),
            ("POLL_ID", "p1"),
            ("VOTER_ID", "alice"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.results_delay, Duration::from_millis(500));
        assert_eq!(config.sign_in_route, "/login");
        assert_eq!(config.poll_id.as_deref(), Some("p1"));
        assert_eq!(config.voter_id.as_deref(), Some("alice"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("POLL_ID", "  "), ("RESULTS_DELAY_MS", "")])).unwrap();
        assert_eq!(config.poll_id, None);
        assert_eq!(config.results_delay, Duration::from_millis(DEFAULT_RESULTS_DELAY_MS));
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let err = Config::from_lookup(lookup_from(&[("RESULTS_DELAY_MS", "soon")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidDelay("soon".to_string()));
    }
}
