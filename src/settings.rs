//! Run settings: built-in defaults, then an optional TOML file, then
//! `LENDBOARD_*` environment variables.
//!
//! The market list itself lives in the registry document, see
//! [`crate::market_data::registry`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};
use crate::market_data::adapters::aave::DEFAULT_API_URL;
use crate::market_data::classifier::StablePolicy;

pub const DEFAULT_SETTINGS_FILE: &str = "lendboard.toml";
pub const ENV_PREFIX: &str = "LENDBOARD";
pub const DEFAULT_MIN_TVL_USD: f64 = 10_000_000.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    /// Max in-flight fetches; also caps idle pooled connections per host
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub markets_path: PathBuf,
    /// Dot-separated path of the market section inside the registry document
    pub markets_namespace: String,
    pub output_path: PathBuf,
    /// Floor used when the registry does not carry `minTvlUsd`
    pub default_min_tvl_usd: f64,
    pub strip_wrapped_prefix: bool,
    pub rest_url: Option<String>,
    pub rest_key: Option<String>,
    pub rest_table: String,
    pub database_url: Option<String>,
    /// Table the Postgres sink creates and inserts into
    pub db_table: String,
}

impl Settings {
    /// `file` is required when given explicitly; the default file is optional.
    pub fn load(file: Option<&Path>) -> PipelineResult<Self> {
        let source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let mut settings: Settings = Self::builder()
            .and_then(|b| {
                b.add_source(source)
                    .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
                    .build()
            })
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::config(format!("invalid settings: {}", e)))?;

        // Credentials the original collector read from its own variables
        settings.rest_url = settings.rest_url.or_else(|| std::env::var("SUPABASE_URL").ok());
        settings.rest_key = settings.rest_key.or_else(|| std::env::var("SUPABASE_SERVICE_KEY").ok());
        settings.database_url = settings.database_url.or_else(|| std::env::var("DATABASE_URL").ok());

        settings.validate()?;
        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("concurrency", 20_i64)?
            .set_default("request_timeout_secs", 60_i64)?
            .set_default("markets_path", "data/markets.json")?
            .set_default("markets_namespace", "evm.aave")?
            .set_default("output_path", "data/latest.json")?
            .set_default("default_min_tvl_usd", DEFAULT_MIN_TVL_USD)?
            .set_default("strip_wrapped_prefix", false)?
            .set_default("rest_table", "rate_snapshots")?
            .set_default("db_table", "rate_snapshots")
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.concurrency == 0 {
            return Err(PipelineError::config("concurrency must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(PipelineError::config("request_timeout_secs must be at least 1"));
        }
        if !self.default_min_tvl_usd.is_finite() || self.default_min_tvl_usd < 0.0 {
            return Err(PipelineError::config("default_min_tvl_usd must be a non-negative number"));
        }
        if self.api_url.trim().is_empty() {
            return Err(PipelineError::config("api_url is empty"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stable_policy(&self) -> StablePolicy {
        StablePolicy::from_flag(self.strip_wrapped_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "concurrency = 5").unwrap();
        writeln!(file, "markets_path = \"conf/markets.json\"").unwrap();

        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.concurrency, 5);
        assert_eq!(s.markets_path, PathBuf::from("conf/markets.json"));
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.markets_namespace, "evm.aave");
        assert_eq!(s.request_timeout(), Duration::from_secs(60));
        assert_eq!(s.default_min_tvl_usd, DEFAULT_MIN_TVL_USD);
        assert_eq!(s.rest_table, "rate_snapshots");
        assert_eq!(s.db_table, "rate_snapshots");
        assert_eq!(s.stable_policy(), StablePolicy::InterestBearing);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "concurrency = 0").unwrap();
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/lendboard.toml"))).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_wrapped_prefix_flag() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "strip_wrapped_prefix = true").unwrap();
        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.stable_policy(), StablePolicy::InterestBearingOrWrapped);
    }

    #[test]
    fn test_postgres_table_is_separate_from_rest_table() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "rest_table = \"rates_api\"").unwrap();
        writeln!(file, "db_table = \"rates_history\"").unwrap();
        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.rest_table, "rates_api");
        assert_eq!(s.db_table, "rates_history");
    }
}
