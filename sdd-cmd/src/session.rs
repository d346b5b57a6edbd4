//! Per-session state handed explicitly to every command handler.

use anyhow::bail;
use chrono::NaiveDate;
use sdd_features::DailyFeatureRow;
use sdd_predict::PredictionRow;

/// Forecast predictions together with the day they were computed on.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub computed_on: NaiveDate,
    pub features: Vec<DailyFeatureRow>,
    pub predictions: Vec<PredictionRow>,
}

/// Rows most recently prepared for display on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    pub date: Option<NaiveDate>,
    pub rows: Vec<PredictionRow>,
}

#[derive(Debug, Default)]
pub struct Session {
    selected_date: Option<NaiveDate>,
    selected_hour: u32,
    forecast: Option<ForecastRun>,
    map_data: Option<MapData>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
    }

    /// The chosen date, or `today` when none was chosen.
    pub fn selected_date(&self, today: NaiveDate) -> NaiveDate {
        self.selected_date.unwrap_or(today)
    }

    pub fn select_hour(&mut self, hour: u32) -> anyhow::Result<()> {
        if hour > 23 {
            bail!("hour must be in 0..=23, got {}", hour);
        }
        self.selected_hour = hour;
        Ok(())
    }

    pub fn selected_hour(&self) -> u32 {
        self.selected_hour
    }

    /// The memoised forecast run, if it was computed on `today`.
    pub fn forecast(&self, today: NaiveDate) -> Option<&ForecastRun> {
        self.forecast.as_ref().filter(|run| run.computed_on == today)
    }

    pub fn store_forecast(&mut self, run: ForecastRun) {
        log::debug!(
            "Memoising {} predictions computed on {}",
            run.predictions.len(),
            run.computed_on
        );
        self.forecast = Some(run);
    }

    pub fn set_map_data(&mut self, map_data: MapData) {
        self.map_data = Some(map_data);
    }

    pub fn map_data(&self) -> Option<&MapData> {
        self.map_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn selected_date_defaults_to_today() {
        let mut session = Session::new();
        assert_eq!(session.selected_date(day(3)), day(3));
        session.select_date(day(5));
        assert_eq!(session.selected_date(day(3)), day(5));
    }

    #[test]
    fn hour_is_bounded() {
        let mut session = Session::new();
        assert_eq!(session.selected_hour(), 0);
        session.select_hour(23).unwrap();
        assert_eq!(session.selected_hour(), 23);
        assert!(session.select_hour(24).is_err());
        assert_eq!(session.selected_hour(), 23);
    }

    #[test]
    fn forecast_memo_expires_with_the_day() {
        let mut session = Session::new();
        session.store_forecast(ForecastRun {
            computed_on: day(1),
            features: Vec::new(),
            predictions: Vec::new(),
        });
        assert!(session.forecast(day(1)).is_some());
        assert!(session.forecast(day(2)).is_none());
    }

    #[test]
    fn map_data_is_overwritten() {
        let mut session = Session::new();
        assert!(session.map_data().is_none());
        session.set_map_data(MapData {
            date: Some(day(1)),
            rows: Vec::new(),
        });
        session.set_map_data(MapData {
            date: None,
            rows: Vec::new(),
        });
        assert_eq!(session.map_data().unwrap().date, None);
    }
}
