use crate::error::{Result, WeatherError};
use crate::parameter::Parameter;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use serde::Deserialize;
use std::collections::HashMap;

/// Resolution of every hourly series returned by Open-Meteo, in seconds.
pub const HOURLY_INTERVAL_SECONDS: i64 = 3600;

/// Implicit time axis of an API response: `[start, end)` stepped by `interval`,
/// all in UNIX seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
}

impl TimeAxis {
    /// Derive the axis from the first and last row time of a response.
    ///
    /// Only the endpoints are read; the rows in between are rebuilt by
    /// [`TimeAxis::timestamps`].
    pub fn from_row_times(times: &[i64], interval: i64) -> Result<Self> {
        if interval <= 0 {
            return Err(WeatherError::MalformedResponse(format!(
                "non-positive interval {interval}"
            )));
        }
        match (times.first(), times.last()) {
            (Some(&start), Some(&last)) => {
                if last < start {
                    return Err(WeatherError::MalformedResponse(
                        "time axis runs backwards".to_string(),
                    ));
                }
                Ok(TimeAxis {
                    start,
                    end: last + interval,
                    interval,
                })
            }
            _ => Ok(TimeAxis {
                start: 0,
                end: 0,
                interval,
            }),
        }
    }

    /// Number of steps on the axis.
    pub fn len(&self) -> usize {
        ((self.end - self.start) / self.interval) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explicit UNIX timestamps, left-inclusive, right-exclusive.
    pub fn timestamps(&self) -> Vec<i64> {
        (0..self.len() as i64)
            .map(|step| self.start + step * self.interval)
            .collect()
    }
}

/// One row of an hourly series. `values` follows the series' parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRecord {
    /// Wall-clock time in the series' reference zone.
    pub timestamp: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

impl HourlyRecord {
    /// Returns true if every parameter has a value in this row.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}

/// Ordered hourly observations or forecasts for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWeatherSeries {
    parameters: Vec<Parameter>,
    utc_offset: FixedOffset,
    interval: TimeDelta,
    records: Vec<HourlyRecord>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: ApiHourly,
}

#[derive(Debug, Deserialize)]
struct ApiHourly {
    time: Vec<i64>,
    #[serde(flatten)]
    variables: HashMap<String, Vec<Option<f64>>>,
}

impl HourlyWeatherSeries {
    /// Build a series from explicit records.
    ///
    /// Every record must carry one value slot per parameter and timestamps
    /// must strictly increase.
    pub fn new(
        parameters: Vec<Parameter>,
        utc_offset: FixedOffset,
        interval: TimeDelta,
        records: Vec<HourlyRecord>,
    ) -> Result<Self> {
        if let Some(bad) = records.iter().find(|r| r.values.len() != parameters.len()) {
            return Err(WeatherError::MalformedResponse(format!(
                "record at {} has {} values, expected {}",
                bad.timestamp,
                bad.values.len(),
                parameters.len()
            )));
        }
        if let Some(pair) = records.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(WeatherError::MalformedResponse(format!(
                "timestamps not increasing at {}",
                pair[1].timestamp
            )));
        }
        Ok(HourlyWeatherSeries {
            parameters,
            utc_offset,
            interval,
            records,
        })
    }

    /// Decode an Open-Meteo JSON body (requested with `timeformat=unixtime`).
    ///
    /// Timestamps are rebuilt from the response time axis and shifted into the
    /// reference zone given by `utc_offset_seconds`. Variable columns are
    /// attached in `parameters` order.
    pub fn from_response_body(body: &str, parameters: &[Parameter]) -> Result<Self> {
        let response: ApiResponse = serde_json::from_str(body)
            .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;
        let utc_offset = FixedOffset::east_opt(response.utc_offset_seconds).ok_or_else(|| {
            WeatherError::MalformedResponse(format!(
                "utc offset out of range: {}",
                response.utc_offset_seconds
            ))
        })?;
        let axis = TimeAxis::from_row_times(&response.hourly.time, HOURLY_INTERVAL_SECONDS)?;
        let timestamps = axis.timestamps();
        if timestamps.len() != response.hourly.time.len() {
            return Err(WeatherError::MalformedResponse(format!(
                "time axis spans {} steps but {} rows were returned",
                timestamps.len(),
                response.hourly.time.len()
            )));
        }

        let mut hourly = response.hourly;
        let mut columns = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let column = hourly
                .variables
                .remove(parameter.as_str())
                .ok_or_else(|| {
                    WeatherError::MalformedResponse(format!("variable {parameter} not in response"))
                })?;
            if column.len() != timestamps.len() {
                return Err(WeatherError::MalformedResponse(format!(
                    "variable {parameter} has {} values for {} timestamps",
                    column.len(),
                    timestamps.len()
                )));
            }
            columns.push(column);
        }

        let offset_seconds = i64::from(response.utc_offset_seconds);
        let mut records = Vec::with_capacity(timestamps.len());
        for (row, unix) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(unix + offset_seconds, 0)
                .ok_or_else(|| {
                    WeatherError::MalformedResponse(format!("timestamp out of range: {unix}"))
                })?
                .naive_utc();
            let values = columns.iter().map(|column| column[row]).collect();
            records.push(HourlyRecord { timestamp, values });
        }

        HourlyWeatherSeries::new(
            parameters.to_vec(),
            utc_offset,
            TimeDelta::seconds(axis.interval),
            records,
        )
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `parameter` in each record's values.
    pub fn column_index(&self, parameter: Parameter) -> Option<usize> {
        self.parameters.iter().position(|p| *p == parameter)
    }

    /// All values of one parameter, in time order.
    pub fn column(&self, parameter: Parameter) -> Result<Vec<Option<f64>>> {
        let index = self
            .column_index(parameter)
            .ok_or(WeatherError::MissingParameter(parameter))?;
        Ok(self.records.iter().map(|r| r.values[index]).collect())
    }

    /// A copy holding only rows where every parameter has a value.
    pub fn drop_missing(&self) -> Self {
        HourlyWeatherSeries {
            parameters: self.parameters.clone(),
            utc_offset: self.utc_offset,
            interval: self.interval,
            records: self
                .records
                .iter()
                .filter(|r| r.is_complete())
                .cloned()
                .collect(),
        }
    }

    /// A copy restricted to `parameters`, in the given order.
    pub fn select(&self, parameters: &[Parameter]) -> Result<Self> {
        let indices = parameters
            .iter()
            .map(|p| self.column_index(*p).ok_or(WeatherError::MissingParameter(*p)))
            .collect::<Result<Vec<usize>>>()?;
        let records = self
            .records
            .iter()
            .map(|r| HourlyRecord {
                timestamp: r.timestamp,
                values: indices.iter().map(|&i| r.values[i]).collect(),
            })
            .collect();
        Ok(HourlyWeatherSeries {
            parameters: parameters.to_vec(),
            utc_offset: self.utc_offset,
            interval: self.interval,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // Three hours starting 2024-06-01 00:00 Europe/Berlin (CEST, +02:00)
    const BODY: &str = r#"{"latitude":52.366,"longitude":4.901,"generationtime_ms":0.05,
"utc_offset_seconds":7200,"timezone":"Europe/Berlin","timezone_abbreviation":"CEST",
"elevation":13.0,"hourly_units":{"time":"unixtime","precipitation":"mm","wind_speed_10m":"m/s"},
"hourly":{"time":[1717192800,1717196400,1717200000],
"precipitation":[0.0,0.4,null],"wind_speed_10m":[3.1,4.2,5.0]}}"#;

    #[test]
    fn test_decode_reconstructs_local_timestamps() {
        let series = HourlyWeatherSeries::from_response_body(
            BODY,
            &[Parameter::Precipitation, Parameter::WindSpeed10m],
        )
        .unwrap();
        assert_eq!(series.len(), 3);
        let first = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(series.records()[0].timestamp, first);
        assert_eq!(series.records()[2].timestamp, first + TimeDelta::hours(2));
        assert_eq!(series.utc_offset().local_minus_utc(), 7200);
        assert_eq!(series.interval(), TimeDelta::hours(1));
    }

    #[test]
    fn test_columns_follow_request_order() {
        let series = HourlyWeatherSeries::from_response_body(
            BODY,
            &[Parameter::WindSpeed10m, Parameter::Precipitation],
        )
        .unwrap();
        assert_eq!(series.records()[1].values, vec![Some(4.2), Some(0.4)]);
        assert_eq!(series.records()[2].values, vec![Some(5.0), None]);
    }

    #[test]
    fn test_missing_variable_is_malformed() {
        let result = HourlyWeatherSeries::from_response_body(BODY, &[Parameter::WindGusts10m]);
        assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
    }

    #[test]
    fn test_irregular_row_times_are_rejected() {
        let body = r#"{"utc_offset_seconds":0,"hourly":{"time":[0,3600,10800],
"precipitation":[1.0,2.0,3.0]}}"#;
        let result = HourlyWeatherSeries::from_response_body(body, &[Parameter::Precipitation]);
        assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
    }

    #[test]
    fn test_short_variable_column_is_rejected() {
        let body = r#"{"utc_offset_seconds":0,"hourly":{"time":[0,3600],
"precipitation":[1.0]}}"#;
        let result = HourlyWeatherSeries::from_response_body(body, &[Parameter::Precipitation]);
        assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
    }

    #[test]
    fn test_time_axis_is_left_inclusive() {
        let axis = TimeAxis::from_row_times(&[100, 3700, 7300], 3600).unwrap();
        assert_eq!(axis.end, 10900);
        assert_eq!(axis.timestamps(), vec![100, 3700, 7300]);
    }

    #[test]
    fn test_empty_response_gives_empty_series() {
        let body = r#"{"utc_offset_seconds":0,"hourly":{"time":[],"precipitation":[]}}"#;
        let series =
            HourlyWeatherSeries::from_response_body(body, &[Parameter::Precipitation]).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_drop_missing_and_select() {
        let series = HourlyWeatherSeries::from_response_body(
            BODY,
            &[Parameter::Precipitation, Parameter::WindSpeed10m],
        )
        .unwrap();
        assert_eq!(series.drop_missing().len(), 2);

        let wind = series.select(&[Parameter::WindSpeed10m]).unwrap();
        assert_eq!(wind.parameters(), &[Parameter::WindSpeed10m]);
        assert_eq!(wind.column(Parameter::WindSpeed10m).unwrap()[0], Some(3.1));
        assert!(matches!(
            wind.column(Parameter::Precipitation),
            Err(WeatherError::MissingParameter(Parameter::Precipitation))
        ));
    }

    #[test]
    fn test_new_rejects_unordered_records() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let records = vec![
            HourlyRecord {
                timestamp: t + TimeDelta::hours(1),
                values: vec![Some(1.0)],
            },
            HourlyRecord {
                timestamp: t,
                values: vec![Some(2.0)],
            },
        ];
        let result = HourlyWeatherSeries::new(
            vec![Parameter::Precipitation],
            FixedOffset::east_opt(0).unwrap(),
            TimeDelta::hours(1),
            records,
        );
        assert!(result.is_err());
    }
}
