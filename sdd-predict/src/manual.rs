use sdd_features::season::leaves_on_month;
use serde::{Deserialize, Serialize};

/// Column names of a manual scenario as the models see them.
pub mod names {
    pub const HOUR: &str = "hour";
    pub const LEAVES_ON: &str = sdd_features::names::LEAVES_ON;
    pub const WIND_SPEED: &str = sdd_features::names::WIND_SPEED;
    pub const WIND_GUSTS: &str = sdd_features::names::WIND_GUSTS;
    pub const PRECIPITATION_PAST_WEEK: &str = "precipitation_past_week";
    pub const STRONG_WIND_PAST_2_DAYS: &str = "strong_wind_past_2_days";
    pub const AVG_WIND_PAST_2_DAYS: &str = "avg_wind_past_2_days";
    pub const MAX_WIND_PAST_DAY: &str = "max_wind_past_day";
}

/// Hour of day a scenario is scored at unless the caller says otherwise.
pub const DEFAULT_HOUR: u32 = 12;

/// A user-specified storm, broadcast to every grid cell.
///
/// Values are taken literally; range checks belong to whatever collects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualScenario {
    pub hour: u32,
    pub leaves_on: u8,
    /// Mean wind speed (m/s).
    pub wind_speed: f64,
    /// Maximum gust (m/s).
    pub wind_gusts: f64,
    /// Precipitation over the past week (mm).
    pub precipitation_past_week: f64,
    /// Hours of strong wind over the past two days.
    pub strong_wind_past_2_days: f64,
    pub avg_wind_past_2_days: f64,
    pub max_wind_past_day: f64,
}

impl ManualScenario {
    /// Set the leaf flag from a calendar month (1..=12).
    pub fn with_month(mut self, month: u32) -> Self {
        self.leaves_on = leaves_on_month(month);
        self
    }

    pub fn feature(&self, name: &str) -> Option<Option<f64>> {
        let value = match name {
            names::HOUR => f64::from(self.hour),
            names::LEAVES_ON => f64::from(self.leaves_on),
            names::WIND_SPEED => self.wind_speed,
            names::WIND_GUSTS => self.wind_gusts,
            names::PRECIPITATION_PAST_WEEK => self.precipitation_past_week,
            names::STRONG_WIND_PAST_2_DAYS => self.strong_wind_past_2_days,
            names::AVG_WIND_PAST_2_DAYS => self.avg_wind_past_2_days,
            names::MAX_WIND_PAST_DAY => self.max_wind_past_day,
            _ => return None,
        };
        Some(Some(value))
    }
}

impl Default for ManualScenario {
    fn default() -> Self {
        Self {
            hour: DEFAULT_HOUR,
            leaves_on: 0,
            wind_speed: 0.0,
            wind_gusts: 0.0,
            precipitation_past_week: 0.0,
            strong_wind_past_2_days: 0.0,
            avg_wind_past_2_days: 0.0,
            max_wind_past_day: 0.0,
        }
    }
}
