use crate::error::{Result, WeatherError};
use crate::hourly::HourlyWeatherSeries;
use crate::parameter::Parameter;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Wind speed (m/s) above which an hour counts as "strong wind".
pub const STRONG_WIND_THRESHOLD: f64 = 15.0;

/// Summary statistics for one calendar date.
///
/// A field is `None` when the date has no observed value for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// Mean hourly precipitation (mm).
    pub avg_precipitation: Option<f64>,
    /// Mean hourly wind speed (m/s).
    pub avg_wind_speed: Option<f64>,
    /// Highest hourly wind speed (m/s).
    pub max_wind_speed: Option<f64>,
    /// Fraction of observed hours with wind speed above [`STRONG_WIND_THRESHOLD`].
    pub frac_strong_wind: Option<f64>,
    /// Number of hourly rows that fell on this date.
    pub hours: usize,
}

#[derive(Default)]
struct Accumulator {
    hours: usize,
    precipitation_sum: f64,
    precipitation_count: usize,
    wind_sum: f64,
    wind_count: usize,
    wind_max: Option<f64>,
    strong_wind_hours: usize,
}

impl Accumulator {
    fn push(&mut self, precipitation: Option<f64>, wind: Option<f64>) {
        self.hours += 1;
        if let Some(p) = precipitation {
            self.precipitation_sum += p;
            self.precipitation_count += 1;
        }
        if let Some(w) = wind {
            self.wind_sum += w;
            self.wind_count += 1;
            self.wind_max = Some(self.wind_max.map_or(w, |m| m.max(w)));
            if w > STRONG_WIND_THRESHOLD {
                self.strong_wind_hours += 1;
            }
        }
    }

    fn finish(self) -> DailySummary {
        let mean = |sum: f64, count: usize| (count > 0).then(|| sum / count as f64);
        DailySummary {
            avg_precipitation: mean(self.precipitation_sum, self.precipitation_count),
            avg_wind_speed: mean(self.wind_sum, self.wind_count),
            max_wind_speed: self.wind_max,
            frac_strong_wind: mean(self.strong_wind_hours as f64, self.wind_count),
            hours: self.hours,
        }
    }
}

/// Reduce an hourly series to one [`DailySummary`] per local calendar date.
///
/// The series must contain precipitation and wind speed. Partial days are
/// aggregated over whatever hours are present.
pub fn to_daily(series: &HourlyWeatherSeries) -> Result<BTreeMap<NaiveDate, DailySummary>> {
    let precipitation = series
        .column_index(Parameter::Precipitation)
        .ok_or(WeatherError::MissingParameter(Parameter::Precipitation))?;
    let wind = series
        .column_index(Parameter::WindSpeed10m)
        .ok_or(WeatherError::MissingParameter(Parameter::WindSpeed10m))?;

    let mut days: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
    for record in series.records() {
        days.entry(record.timestamp.date())
            .or_default()
            .push(record.values[precipitation], record.values[wind]);
    }
    Ok(days
        .into_iter()
        .map(|(date, acc)| (date, acc.finish()))
        .collect())
}
