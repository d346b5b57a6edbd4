//! Options shared by every subcommand.
//!
//! Each option can also be set through an `SDD_*` environment variable.

use anyhow::bail;
use chrono::TimeDelta;
use clap::Args;
use sdd_db::Database;
use sdd_predict::LogisticModel;
use sdd_weather::client::{ClientConfig, WeatherClient, MAX_FORECAST_DAYS};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Latitude of the weather location
    #[arg(long, env = "SDD_LATITUDE", default_value_t = 52.374, global = true)]
    pub latitude: f64,

    /// Longitude of the weather location
    #[arg(long, env = "SDD_LONGITUDE", default_value_t = 4.890, global = true)]
    pub longitude: f64,

    /// IANA time zone the weather is reported in
    #[arg(long, env = "SDD_TIMEZONE", default_value = "Europe/Berlin", global = true)]
    pub timezone: String,

    /// SQLite store with the grid, fire stations and response cache
    #[arg(long, env = "SDD_DATABASE", default_value = "storm_damage.sqlite", global = true)]
    pub database: PathBuf,

    /// Building damage model (JSON)
    #[arg(
        long,
        env = "SDD_BUILDING_MODEL",
        default_value = "fixtures/building_model.json",
        global = true
    )]
    pub building_model: PathBuf,

    /// Tree damage model (JSON)
    #[arg(long, env = "SDD_TREE_MODEL", default_value = "fixtures/tree_model.json", global = true)]
    pub tree_model: PathBuf,

    /// Minutes a cached forecast response stays valid
    #[arg(long, env = "SDD_CACHE_TTL_MINUTES", default_value_t = 60, global = true)]
    pub cache_ttl_minutes: i64,

    /// Retries after a failed weather request
    #[arg(long, env = "SDD_MAX_RETRIES", default_value_t = 5, global = true)]
    pub max_retries: u32,

    /// Delay before the first retry, doubled on every further retry
    #[arg(long, env = "SDD_BACKOFF_MS", default_value_t = 200, global = true)]
    pub backoff_ms: u64,

    /// Days of archive history fetched ahead of the forecast
    #[arg(long, env = "SDD_LEAD_IN_DAYS", default_value_t = 21, global = true)]
    pub lead_in_days: u32,

    /// Past days requested from the forecast endpoint to cover the archive lag
    #[arg(long, env = "SDD_BRIDGE_DAYS", default_value_t = 7, global = true)]
    pub bridge_days: u32,

    /// Days of forecast, today included
    #[arg(long, env = "SDD_FORECAST_DAYS", default_value_t = 16, global = true)]
    pub forecast_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: 52.374,
            longitude: 4.890,
            timezone: "Europe/Berlin".to_string(),
            database: PathBuf::from("storm_damage.sqlite"),
            building_model: PathBuf::from("fixtures/building_model.json"),
            tree_model: PathBuf::from("fixtures/tree_model.json"),
            cache_ttl_minutes: 60,
            max_retries: 5,
            backoff_ms: 200,
            lead_in_days: 21,
            bridge_days: 7,
            forecast_days: 16,
        }
    }
}

impl Config {
    /// Reject option combinations no command could run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            bail!("location {}, {} is out of range", self.latitude, self.longitude);
        }
        if self.forecast_days == 0 || self.forecast_days > MAX_FORECAST_DAYS {
            bail!("forecast days must be in 1..={}", MAX_FORECAST_DAYS);
        }
        if self.cache_ttl_minutes <= 0 {
            bail!("cache TTL must be positive");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone.clone(),
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.backoff_ms),
            forecast_ttl: TimeDelta::minutes(self.cache_ttl_minutes),
            ..ClientConfig::default()
        }
    }

    pub fn open_database(&self) -> anyhow::Result<Database> {
        Database::open(&self.database)
    }

    /// Weather client whose responses are cached in `db`.
    pub fn weather_client(&self, db: &Database) -> anyhow::Result<WeatherClient> {
        Ok(WeatherClient::new(self.client_config())?.with_cache(Box::new(db.clone())))
    }

    /// Building and tree models, in that order.
    pub fn load_models(&self) -> anyhow::Result<(LogisticModel, LogisticModel)> {
        Ok((
            LogisticModel::load(&self.building_model)?,
            LogisticModel::load(&self.tree_model)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_options_rejected() {
        let config = Config {
            forecast_days: 17,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            latitude: 91.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn client_config_carries_retry_budget() {
        let config = Config {
            max_retries: 2,
            backoff_ms: 50,
            cache_ttl_minutes: 15,
            ..Config::default()
        };
        let client = config.client_config();
        assert_eq!(client.max_retries, 2);
        assert_eq!(client.initial_backoff, Duration::from_millis(50));
        assert_eq!(client.forecast_ttl, TimeDelta::minutes(15));
        assert_eq!(client.timezone, "Europe/Berlin");
    }
}
