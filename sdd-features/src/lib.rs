//! Predictor features for the damage models.
//!
//! Turns historical and forecast hourly weather into one row per date with
//! trailing-window rainfall and wind features plus a seasonal leaf flag.

pub mod predictors;

pub use predictors::{build_predictors, daily_features, DailyFeatureRow};

/// Column names under which the features are exposed to the models.
pub mod names {
    pub const PRECIPITATION: &str = "precipitation";
    pub const WIND_SPEED: &str = "wind_speed_10m";
    pub const WIND_GUSTS: &str = "wind_gusts_10m";
    pub const PRECIPITATION_PAST_14_DAYS: &str = "precipitation_past_14_days";
    pub const AVG_WIND_PAST_3_DAYS: &str = "avg_wind_past_3_days";
    pub const LEAVES_ON: &str = "leaves_on";
}

/// Errors raised while building predictor rows.
pub mod error {
    use chrono::NaiveDate;
    use sdd_weather::error::WeatherError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum FeatureError {
        /// The input series lacks a predictor parameter
        #[error(transparent)]
        Weather(#[from] WeatherError),

        /// A trailing window reaches back before the first available day
        #[error("{feature} on {date} needs {window} days of lead-in")]
        InsufficientLeadIn {
            date: NaiveDate,
            feature: &'static str,
            window: usize,
        },

        /// A day inside the series had no value for a feature
        #[error("{feature} has no value on {date}")]
        MissingValue {
            date: NaiveDate,
            feature: &'static str,
        },

        /// Nothing left on or after the cut-off date
        #[error("no predictor rows on or after {0}")]
        NoData(NaiveDate),
    }
}

/// Trailing-window reductions over a daily series, positional like a
/// row-based rolling window: position `k` covers rows `k + 1 - window ..= k`.
pub mod rolling {
    /// Sum over the trailing window; `None` until the window is full or when
    /// any value inside it is missing.
    pub fn trailing_sum(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|k| {
                if window == 0 || k + 1 < window {
                    return None;
                }
                values[k + 1 - window..=k]
                    .iter()
                    .copied()
                    .sum::<Option<f64>>()
            })
            .collect()
    }

    /// Mean over the trailing window, with the same null rules as
    /// [`trailing_sum`].
    pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        trailing_sum(values, window)
            .into_iter()
            .map(|sum| sum.map(|s| s / window as f64))
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_fourteen_day_sum() {
            let values: Vec<Option<f64>> = (1..=20).map(|v| Some(v as f64)).collect();
            let sums = trailing_sum(&values, 14);
            for (k, sum) in sums.iter().enumerate() {
                if k < 13 {
                    assert_eq!(*sum, None, "day {k} should be undefined");
                } else {
                    let expected: f64 = (k - 13..=k).map(|i| (i + 1) as f64).sum();
                    assert_eq!(*sum, Some(expected), "day {k}");
                }
            }
        }

        #[test]
        fn test_three_day_mean() {
            let values = vec![Some(3.0), Some(6.0), Some(9.0), Some(0.0)];
            let means = trailing_mean(&values, 3);
            assert_eq!(means, vec![None, None, Some(6.0), Some(5.0)]);
        }

        #[test]
        fn test_missing_value_poisons_window() {
            let values = vec![Some(1.0), None, Some(1.0), Some(1.0), Some(1.0)];
            let sums = trailing_sum(&values, 3);
            assert_eq!(sums, vec![None, None, None, None, Some(3.0)]);
        }

        #[test]
        fn test_window_longer_than_series() {
            assert!(trailing_sum(&[Some(1.0), Some(2.0)], 14)
                .iter()
                .all(Option::is_none));
        }
    }
}

/// Seasonal leaf cover.
pub mod season {
    use chrono::{Datelike, NaiveDate};

    /// 1 when trees carry leaves (April through September), else 0.
    pub fn leaves_on_month(month: u32) -> u8 {
        u8::from(matches!(month, 4..=9))
    }

    pub fn leaves_on(date: NaiveDate) -> u8 {
        leaves_on_month(date.month())
    }

}
