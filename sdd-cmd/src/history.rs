//! Archived weather reduced to daily summaries.

use crate::config::Config;
use crate::output::{open_output, write_daily_csv};
use anyhow::bail;
use log::info;
use sdd_utils::dates::parse_date;
use sdd_weather::daily::to_daily;
use sdd_weather::parameter::PREDICTOR_PARAMETERS;
use std::path::Path;

pub async fn run_history(
    config: &Config,
    start: &str,
    end: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    if start_date > end_date {
        bail!("start date {} is after end date {}", start_date, end_date);
    }

    let db = config.open_database()?;
    let client = config.weather_client(&db)?;
    info!("Fetching archived weather from {} to {}", start_date, end_date);
    let series = client
        .fetch_historical(&PREDICTOR_PARAMETERS, start_date, end_date)
        .await?;
    let daily = to_daily(&series)?;

    write_daily_csv(open_output(output)?, &daily)?;
    info!("Wrote {} daily summaries", daily.len());
    Ok(())
}
