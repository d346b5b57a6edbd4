use crate::error::FeatureError;
use crate::names;
use crate::rolling::{trailing_mean, trailing_sum};
use crate::season::leaves_on;
use chrono::NaiveDate;
use log::{info, warn};
use sdd_weather::date_range::DateRange;
use sdd_weather::hourly::{HourlyRecord, HourlyWeatherSeries};
use sdd_weather::parameter::PREDICTOR_PARAMETERS;
use serde::Serialize;
use std::collections::BTreeMap;

/// Trailing window of the precipitation sum, in days.
pub const PRECIPITATION_WINDOW_DAYS: usize = 14;

/// Trailing window of the wind-speed mean, in days.
pub const WIND_WINDOW_DAYS: usize = 3;

/// Engineered predictors for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFeatureRow {
    pub date: NaiveDate,
    /// Total precipitation over the day (mm), `None` if no hour reported any.
    pub precipitation: Option<f64>,
    /// Mean hourly wind speed (m/s).
    pub wind_speed: Option<f64>,
    /// Highest hourly gust (m/s).
    pub wind_gusts: Option<f64>,
    pub precipitation_past_14_days: Option<f64>,
    pub avg_wind_past_3_days: Option<f64>,
    pub leaves_on: u8,
}

impl DailyFeatureRow {
    /// Look a feature up by column name.
    ///
    /// `None` means the row has no such column; `Some(None)` means the column
    /// exists but is undefined for this date.
    pub fn feature(&self, name: &str) -> Option<Option<f64>> {
        match name {
            names::PRECIPITATION => Some(self.precipitation),
            names::WIND_SPEED => Some(self.wind_speed),
            names::WIND_GUSTS => Some(self.wind_gusts),
            names::PRECIPITATION_PAST_14_DAYS => Some(self.precipitation_past_14_days),
            names::AVG_WIND_PAST_3_DAYS => Some(self.avg_wind_past_3_days),
            names::LEAVES_ON => Some(Some(f64::from(self.leaves_on))),
            _ => None,
        }
    }
}

#[derive(Default)]
struct DayTotals {
    precipitation: Option<f64>,
    wind_sum: f64,
    wind_count: usize,
    gust_max: Option<f64>,
}

/// Historical hours without gaps, followed by the forecast hours that come
/// after the last retained observation.
fn merge_hourly(
    historical: &HourlyWeatherSeries,
    forecast: &HourlyWeatherSeries,
) -> Result<Vec<HourlyRecord>, FeatureError> {
    let historical = historical.select(&PREDICTOR_PARAMETERS)?.drop_missing();
    let forecast = forecast.select(&PREDICTOR_PARAMETERS)?;
    if historical.utc_offset() != forecast.utc_offset() && !historical.is_empty() {
        warn!(
            "Historical ({}) and forecast ({}) offsets differ; merging on wall-clock time",
            historical.utc_offset(),
            forecast.utc_offset()
        );
    }

    let last_observed = historical.records().last().map(|r| r.timestamp);
    let mut merged = historical.records().to_vec();
    let before = merged.len();
    merged.extend(
        forecast
            .records()
            .iter()
            .filter(|r| last_observed.map_or(true, |last| r.timestamp > last))
            .cloned(),
    );
    info!(
        "Merged {} observed hours with {} forecast hours",
        before,
        merged.len() - before
    );
    Ok(merged)
}

/// Dates between the first and last row that have no row of their own.
pub fn missing_dates(rows: &[DailyFeatureRow]) -> Vec<NaiveDate> {
    match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => {
            let present: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
            DateRange(first.date, last.date).missing_from(&present)
        }
        _ => Vec::new(),
    }
}

/// The complete daily series over history and forecast, rolling features
/// included. Leading rows carry `None` until their windows fill.
pub fn daily_features(
    historical: &HourlyWeatherSeries,
    forecast: &HourlyWeatherSeries,
) -> Result<Vec<DailyFeatureRow>, FeatureError> {
    // select() in merge_hourly puts the columns in PREDICTOR_PARAMETERS order
    let (precipitation, wind, gusts) = (0, 1, 2);

    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for record in merge_hourly(historical, forecast)? {
        let totals = days.entry(record.timestamp.date()).or_default();
        if let Some(p) = record.values[precipitation] {
            totals.precipitation = Some(totals.precipitation.unwrap_or(0.0) + p);
        }
        if let Some(w) = record.values[wind] {
            totals.wind_sum += w;
            totals.wind_count += 1;
        }
        if let Some(g) = record.values[gusts] {
            totals.gust_max = Some(totals.gust_max.map_or(g, |m| m.max(g)));
        }
    }

    let dates: Vec<NaiveDate> = days.keys().copied().collect();
    let daily_precipitation: Vec<Option<f64>> = days.values().map(|t| t.precipitation).collect();
    let daily_wind: Vec<Option<f64>> = days
        .values()
        .map(|t| (t.wind_count > 0).then(|| t.wind_sum / t.wind_count as f64))
        .collect();
    let precipitation_window = trailing_sum(&daily_precipitation, PRECIPITATION_WINDOW_DAYS);
    let wind_window = trailing_mean(&daily_wind, WIND_WINDOW_DAYS);

    let rows: Vec<DailyFeatureRow> = days
        .values()
        .enumerate()
        .map(|(i, totals)| DailyFeatureRow {
            date: dates[i],
            precipitation: totals.precipitation,
            wind_speed: daily_wind[i],
            wind_gusts: totals.gust_max,
            precipitation_past_14_days: precipitation_window[i],
            avg_wind_past_3_days: wind_window[i],
            leaves_on: leaves_on(dates[i]),
        })
        .collect();

    let gaps = missing_dates(&rows);
    if !gaps.is_empty() {
        warn!(
            "Daily series has {} missing dates ({:?}); windows span them positionally",
            gaps.len(),
            gaps
        );
    }
    Ok(rows)
}

/// Predictor rows for `today` onward, ascending by date.
///
/// Fails instead of emitting a row with an undefined feature: a short
/// historical lead-in yields [`FeatureError::InsufficientLeadIn`], a hole in
/// the data [`FeatureError::MissingValue`].
pub fn build_predictors(
    historical: &HourlyWeatherSeries,
    forecast: &HourlyWeatherSeries,
    today: NaiveDate,
) -> Result<Vec<DailyFeatureRow>, FeatureError> {
    let all_rows = daily_features(historical, forecast)?;
    let first_kept = all_rows.partition_point(|r| r.date < today);
    let rows = all_rows[first_kept..].to_vec();
    if rows.is_empty() {
        return Err(FeatureError::NoData(today));
    }

    for (offset, row) in rows.iter().enumerate() {
        let position = first_kept + offset;
        let windowed = [
            (
                names::PRECIPITATION_PAST_14_DAYS,
                row.precipitation_past_14_days,
                PRECIPITATION_WINDOW_DAYS,
            ),
            (
                names::AVG_WIND_PAST_3_DAYS,
                row.avg_wind_past_3_days,
                WIND_WINDOW_DAYS,
            ),
        ];
        for (feature, value, window) in windowed {
            if value.is_none() {
                if position + 1 < window {
                    return Err(FeatureError::InsufficientLeadIn {
                        date: row.date,
                        feature,
                        window,
                    });
                }
                return Err(FeatureError::MissingValue {
                    date: row.date,
                    feature,
                });
            }
        }
        for (feature, value) in [
            (names::PRECIPITATION, row.precipitation),
            (names::WIND_SPEED, row.wind_speed),
            (names::WIND_GUSTS, row.wind_gusts),
        ] {
            if value.is_none() {
                return Err(FeatureError::MissingValue {
                    date: row.date,
                    feature,
                });
            }
        }
    }

    info!(
        "Built {} predictor rows from {} to {}",
        rows.len(),
        rows[0].date,
        rows[rows.len() - 1].date
    );
    Ok(rows)
}
