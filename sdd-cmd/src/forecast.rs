//! Forecast simulation: weather forecast × grid, reported for one date.

use crate::config::Config;
use crate::output::{
    filter_min_probability, open_output, write_predictions_csv, write_predictions_json,
};
use crate::session::{ForecastRun, MapData, Session};
use crate::PredictionOutput;
use anyhow::bail;
use chrono::{Local, NaiveDate, TimeDelta};
use log::info;
use sdd_db::models::GridCell;
use sdd_features::build_predictors;
use sdd_predict::scorer::rows_on;
use sdd_predict::{score_forecast, PredictionRow};
use sdd_weather::parameter::PREDICTOR_PARAMETERS;

/// Fetch history and forecast, build predictors and score the whole horizon.
async fn compute_forecast(
    config: &Config,
    grid: &[GridCell],
    today: NaiveDate,
) -> anyhow::Result<ForecastRun> {
    let db = config.open_database()?;
    let client = config.weather_client(&db)?;
    let (building, tree) = config.load_models()?;

    let start = today - TimeDelta::days(i64::from(config.lead_in_days));
    let end = today - TimeDelta::days(1);
    let historical = client.fetch_historical(&PREDICTOR_PARAMETERS, start, end).await?;
    let forecast = client
        .fetch_forecast(&PREDICTOR_PARAMETERS, config.bridge_days, config.forecast_days)
        .await?;

    let features = build_predictors(&historical, &forecast, today)?;
    let predictions = score_forecast(grid, &features, &building, &tree)?;
    Ok(ForecastRun {
        computed_on: today,
        features,
        predictions,
    })
}

/// The predictions of `run` on `date`, which must lie inside the forecast.
pub fn select_date(run: &ForecastRun, date: NaiveDate) -> anyhow::Result<Vec<PredictionRow>> {
    if !run.features.iter().any(|row| row.date == date) {
        match (run.features.first(), run.features.last()) {
            (Some(first), Some(last)) => {
                bail!("{} is outside the forecast ({} to {})", date, first.date, last.date)
            }
            _ => bail!("the forecast is empty"),
        }
    }
    Ok(rows_on(&run.predictions, date))
}

pub async fn run_forecast(
    config: &Config,
    session: &mut Session,
    output: &PredictionOutput,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let grid = config.open_database()?.query_grid_cells()?;
    if grid.is_empty() {
        bail!("the grid is empty; load it with the import command first");
    }

    if session.forecast(today).is_none() {
        let run = compute_forecast(config, &grid, today).await?;
        session.store_forecast(run);
    }
    let selected = session.selected_date(today);
    let rows = match session.forecast(today) {
        Some(run) => select_date(run, selected)?,
        None => bail!("no forecast computed for {}", today),
    };
    let rows = filter_min_probability(&rows, output.min_probability);
    info!("Reporting {} prediction rows for {}", rows.len(), selected);

    write_predictions_csv(open_output(output.output.as_deref())?, &rows)?;
    if let Some(path) = &output.json {
        write_predictions_json(open_output(Some(path.as_path()))?, &rows, &grid)?;
    }
    session.set_map_data(MapData {
        date: Some(selected),
        rows,
    });
    Ok(())
}
