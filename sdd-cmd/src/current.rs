//! Current weather at the selected hour.

use crate::config::Config;
use crate::session::Session;
use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use sdd_utils::dates::today_at_offset;
use sdd_weather::daily::{to_daily, DailySummary};
use sdd_weather::hourly::HourlyWeatherSeries;
use sdd_weather::parameter::{Parameter, CURRENT_PARAMETERS};

/// One hour of observed or forecast weather plus the day's summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub timestamp: NaiveDateTime,
    pub values: Vec<(Parameter, Option<f64>)>,
    pub daily: Option<DailySummary>,
}

/// Pick `hour` on `today` out of `series`.
pub fn current_weather(
    series: &HourlyWeatherSeries,
    today: NaiveDate,
    hour: u32,
) -> anyhow::Result<CurrentWeather> {
    let timestamp = today
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| anyhow!("invalid hour {}", hour))?;
    let record = series
        .records()
        .iter()
        .find(|r| r.timestamp == timestamp)
        .ok_or_else(|| anyhow!("no weather reported for {}", timestamp))?;
    let mut daily = to_daily(series)?;
    Ok(CurrentWeather {
        timestamp,
        values: series
            .parameters()
            .iter()
            .copied()
            .zip(record.values.iter().copied())
            .collect(),
        daily: daily.remove(&today),
    })
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

pub async fn run_current(config: &Config, session: &Session) -> anyhow::Result<()> {
    let db = config.open_database()?;
    let client = config.weather_client(&db)?;
    let series = client.fetch_forecast(&CURRENT_PARAMETERS, 1, 1).await?;
    let today = today_at_offset(series.utc_offset());
    info!("Reporting weather for {} at {:02}:00", today, session.selected_hour());

    let weather = current_weather(&series, today, session.selected_hour())?;
    println!("Weather at {}", weather.timestamp);
    for (parameter, value) in &weather.values {
        println!("  {:<22} {}", parameter, show(*value));
    }
    if let Some(daily) = &weather.daily {
        println!("Today ({} hours)", daily.hours);
        println!("  {:<22} {}", "avg_precipitation", show(daily.avg_precipitation));
        println!("  {:<22} {}", "avg_wind_speed", show(daily.avg_wind_speed));
        println!("  {:<22} {}", "max_wind_speed", show(daily.max_wind_speed));
        println!("  {:<22} {}", "frac_strong_wind", show(daily.frac_strong_wind));
    }
    Ok(())
}
