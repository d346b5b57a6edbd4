//! Fire-station and service-area overlay export.

use crate::config::Config;
use crate::output::{open_output, write_stations_json};
use log::info;
use std::path::Path;

pub fn run_stations(config: &Config, output: Option<&Path>) -> anyhow::Result<()> {
    let stations = config.open_database()?.query_fire_stations()?;
    let vehicles: u32 = stations.iter().map(|s| s.vehicle_count).sum();
    info!(
        "Exporting {} fire stations with {} vehicles",
        stations.len(),
        vehicles
    );
    write_stations_json(open_output(output)?, &stations)
}
