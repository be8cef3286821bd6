//! Analyzer configuration.

use std::str::FromStr;
use std::time::Duration;

use finhealth_analysis::ScoringPolicy;
use finhealth_core::{DataError, DataFrequency, PeriodType, Result};

/// Environment variable selecting the scoring policy.
pub const ENV_POLICY: &str = "FINHEALTH_POLICY";
/// Environment variable selecting annual or quarterly statements.
pub const ENV_PERIOD: &str = "FINHEALTH_PERIOD";
/// Environment variable for the number of periods to fetch.
pub const ENV_PERIODS: &str = "FINHEALTH_PERIODS";
/// Environment variable for the price history lookback in days.
pub const ENV_PRICE_DAYS: &str = "FINHEALTH_PRICE_DAYS";
/// Environment variable enabling or disabling the session cache.
pub const ENV_CACHE: &str = "FINHEALTH_CACHE";
/// Environment variable for the cache TTL in seconds.
pub const ENV_CACHE_TTL_SECS: &str = "FINHEALTH_CACHE_TTL_SECS";
/// Environment variable for the minimum spacing between provider requests.
pub const ENV_RATE_LIMIT_MS: &str = "FINHEALTH_RATE_LIMIT_MS";

/// Settings for one [`Analyzer`](crate::Analyzer).
///
/// Defaults: tally policy, annual statements, five periods, five years of
/// daily prices, cache on with a one hour TTL, one request per second.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Scoring policy applied to the latest ratios.
    pub policy: ScoringPolicy,
    /// Statement period type.
    pub period_type: PeriodType,
    /// Maximum number of statement periods to fetch.
    pub periods: usize,
    /// Price history lookback in days. Zero skips the price fetch.
    pub price_days: u32,
    /// Price history granularity.
    pub price_frequency: DataFrequency,
    /// Whether fetched data is cached for the session.
    pub cache_enabled: bool,
    /// Age after which cached entries are refetched.
    pub cache_ttl: Duration,
    /// Minimum spacing between provider requests.
    pub rate_limit: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            period_type: PeriodType::default(),
            periods: 5,
            price_days: 1825,
            price_frequency: DataFrequency::default(),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
            rate_limit: Duration::from_millis(1000),
        }
    }
}

impl AnalyzerConfig {
    /// Reads the configuration from `FINHEALTH_*` environment variables,
    /// falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if a variable is set to a value
    /// that does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_POLICY) {
            config.policy = v.parse()?;
        }
        if let Some(v) = get(ENV_PERIOD) {
            config.period_type = v.parse()?;
        }
        if let Some(v) = get(ENV_PERIODS) {
            config.periods = parse_number(ENV_PERIODS, &v)?;
        }
        if let Some(v) = get(ENV_PRICE_DAYS) {
            config.price_days = parse_number(ENV_PRICE_DAYS, &v)?;
        }
        if let Some(v) = get(ENV_CACHE) {
            config.cache_enabled = parse_flag(ENV_CACHE, &v)?;
        }
        if let Some(v) = get(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_number(ENV_CACHE_TTL_SECS, &v)?);
        }
        if let Some(v) = get(ENV_RATE_LIMIT_MS) {
            config.rate_limit = Duration::from_millis(parse_number(ENV_RATE_LIMIT_MS, &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if `periods` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.periods == 0 {
            return Err(DataError::InvalidParameter(
                "at least one period must be requested".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the scoring policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the statement period type.
    #[must_use]
    pub const fn with_period_type(mut self, period_type: PeriodType) -> Self {
        self.period_type = period_type;
        self
    }

    /// Sets the number of periods to fetch.
    #[must_use]
    pub const fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    /// Sets the price history lookback.
    #[must_use]
    pub const fn with_price_days(mut self, days: u32) -> Self {
        self.price_days = days;
        self
    }

    /// Enables or disables the session cache.
    #[must_use]
    pub const fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DataError::InvalidParameter(format!("{key} must be a non-negative integer, got '{value}'")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DataError::InvalidParameter(format!(
            "{key} must be true or false, got '{value}'"
        ))),
    }
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
    fn test_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.policy, ScoringPolicy::Tally);
        assert_eq!(config.periods, 5);
        assert_eq!(config.price_days, 1825);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_reads_every_variable() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            (ENV_POLICY, "weighted"),
            (ENV_PERIOD, "quarterly"),
            (ENV_PERIODS, "8"),
            (ENV_PRICE_DAYS, "0"),
            (ENV_CACHE, "off"),
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_RATE_LIMIT_MS, "250"),
        ]))
        .unwrap();

        assert_eq!(config.policy, ScoringPolicy::Weighted);
        assert_eq!(config.period_type, PeriodType::Quarterly);
        assert_eq!(config.periods, 8);
        assert_eq!(config.price_days, 0);
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.rate_limit, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup(&[(ENV_PERIODS, "  ")])).unwrap();
        assert_eq!(config.periods, 5);
    }

    #[test]
    fn test_malformed_values_rejected() {
        for (key, value) in [
            (ENV_POLICY, "lenient"),
            (ENV_PERIODS, "-3"),
            (ENV_PERIODS, "0"),
            (ENV_CACHE, "maybe"),
            (ENV_RATE_LIMIT_MS, "fast"),
        ] {
            let err = AnalyzerConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(matches!(err, DataError::InvalidParameter(_)), "{key}={value}");
        }
    }
}
