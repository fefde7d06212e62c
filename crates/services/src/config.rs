use std::env;
use std::time::Duration;

use course_core::model::{PauseStatusPolicy, UserId};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_PROGRESS_PATH: &str = "/api/frontend/progress";
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings for the catalog client and the progress reporter.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerConfig {
    /// Storefront origin. `None` runs from the local cache only.
    pub base_url: Option<Url>,
    /// Customer the progress is reported for. `None` disables reporting.
    pub user_id: Option<UserId>,
    pub progress_path: String,
    pub report_interval: Duration,
    pub request_timeout: Duration,
    pub pause_status: PauseStatusPolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_id: None,
            progress_path: DEFAULT_PROGRESS_PATH.to_string(),
            report_interval: DEFAULT_REPORT_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pause_status: PauseStatusPolicy::default(),
        }
    }
}

impl PlayerConfig {
    /// Read `COURSE_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`PlayerConfig::from_env`] with an injectable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get("COURSE_API_BASE_URL") {
            config.base_url = Some(parse_base_url("COURSE_API_BASE_URL", &raw)?);
        }
        if let Some(raw) = get("COURSE_USER_ID") {
            config.user_id = Some(UserId::new(raw)?);
        }
        if let Some(raw) = get("COURSE_PROGRESS_PATH") {
            config.progress_path = parse_path(&raw)?;
        }
        if let Some(raw) = get("COURSE_REPORT_INTERVAL_SECS") {
            config.report_interval = parse_secs("COURSE_REPORT_INTERVAL_SECS", &raw)?;
        }
        if let Some(raw) = get("COURSE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("COURSE_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = get("COURSE_PAUSE_STATUS") {
            config.pause_status = PauseStatusPolicy::parse(&raw)
                .ok_or(ConfigError::InvalidPauseStatus(raw))?;
        }

        Ok(config)
    }

    /// Replace the API origin, e.g. from a command-line flag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `raw` is not an http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = Some(parse_base_url("--api", raw)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn reporting_enabled(&self) -> bool {
        self.base_url.is_some() && self.user_id.is_some()
    }
}

pub(crate) fn parse_base_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        key,
        raw: raw.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

fn parse_path(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidProgressPath(raw.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidSeconds {
        key,
        raw: raw.to_string(),
    };
    let secs: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if secs <= 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = PlayerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, PlayerConfig::default());
        assert_eq!(config.progress_path, "/api/frontend/progress");
        assert_eq!(config.pause_status, PauseStatusPolicy::Legacy);
        assert!(!config.reporting_enabled());
    }

    #[test]
    fn reads_all_keys() {
        let config = PlayerConfig::from_lookup(lookup(&[
            ("COURSE_API_BASE_URL", "https://shop.example.com"),
            ("COURSE_USER_ID", " 7421 "),
            ("COURSE_PROGRESS_PATH", "/api/progress/"),
            ("COURSE_REPORT_INTERVAL_SECS", "2.5"),
            ("COURSE_REQUEST_TIMEOUT_SECS", "3"),
            ("COURSE_PAUSE_STATUS", "Derived"),
        ]))
        .unwrap();

        assert_eq!(
            config.base_url.as_ref().map(Url::as_str),
            Some("https://shop.example.com/")
        );
        assert_eq!(config.user_id.as_ref().map(UserId::as_str), Some("7421"));
        assert_eq!(config.progress_path, "/api/progress");
        assert_eq!(config.report_interval, Duration::from_millis(2500));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.pause_status, PauseStatusPolicy::Derived);
        assert!(config.reporting_enabled());
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            PlayerConfig::from_lookup(lookup(&[("COURSE_API_BASE_URL", "ftp://x")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_lookup(lookup(&[("COURSE_REPORT_INTERVAL_SECS", "0")])),
            Err(ConfigError::InvalidSeconds { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_lookup(lookup(&[("COURSE_REPORT_INTERVAL_SECS", "1e300")])),
            Err(ConfigError::InvalidSeconds { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_lookup(lookup(&[("COURSE_REQUEST_TIMEOUT_SECS", "inf")])),
            Err(ConfigError::InvalidSeconds { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_lookup(lookup(&[("COURSE_PAUSE_STATUS", "sometimes")])),
            Err(ConfigError::InvalidPauseStatus(_))
        ));
        assert!(matches!(
            PlayerConfig::from_lookup(lookup(&[("COURSE_PROGRESS_PATH", "api/progress")])),
            Err(ConfigError::InvalidProgressPath(_))
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = PlayerConfig::from_lookup(lookup(&[("COURSE_USER_ID", "   ")])).unwrap();
        assert!(config.user_id.is_none());
    }
}
