//! Manual storm: one hand-specified scenario scored against the grid.

use crate::config::Config;
use crate::output::{
    filter_min_probability, open_output, write_predictions_csv, write_predictions_json,
};
use crate::session::{MapData, Session};
use crate::PredictionOutput;
use anyhow::bail;
use chrono::{Datelike, Local};
use log::info;
use sdd_predict::{score_manual, ManualScenario};
use sdd_utils::dates::parse_month;

/// Apply the month (default: the current one) to `scenario`.
pub fn scenario_for_month(
    scenario: ManualScenario,
    month: Option<&str>,
) -> anyhow::Result<ManualScenario> {
    let month = match month {
        Some(text) => parse_month(text)?,
        None => Local::now().month(),
    };
    Ok(scenario.with_month(month))
}

pub fn run_manual(
    config: &Config,
    session: &mut Session,
    scenario: ManualScenario,
    month: Option<&str>,
    output: &PredictionOutput,
) -> anyhow::Result<()> {
    let scenario = scenario_for_month(scenario, month)?;
    let grid = config.open_database()?.query_grid_cells()?;
    if grid.is_empty() {
        bail!("the grid is empty; load it with the import command first");
    }
    let (building, tree) = config.load_models()?;

    info!(
        "Scoring manual scenario (hour {}, leaves_on {}, gusts {} m/s) for {} cells",
        scenario.hour,
        scenario.leaves_on,
        scenario.wind_gusts,
        grid.len()
    );
    let rows = score_manual(&grid, &scenario, &building, &tree)?;
    let rows = filter_min_probability(&rows, output.min_probability);

    write_predictions_csv(open_output(output.output.as_deref())?, &rows)?;
    if let Some(path) = &output.json {
        write_predictions_json(open_output(Some(path.as_path()))?, &rows, &grid)?;
    }
    session.set_map_data(MapData { date: None, rows });
    Ok(())
}
