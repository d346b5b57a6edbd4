//! Load grid and fire-station CSV exports into the SQLite store.

use crate::config::Config;
use anyhow::{bail, Context};
use log::info;
use std::path::Path;

pub fn run_import(
    config: &Config,
    grid: Option<&Path>,
    stations: Option<&Path>,
) -> anyhow::Result<()> {
    if grid.is_none() && stations.is_none() {
        bail!("nothing to import: pass --grid and/or --stations");
    }
    let db = config.open_database()?;
    if let Some(path) = grid {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let count = db.load_grid_cells(&data)?;
        info!("Imported {} grid cells from {}", count, path.display());
    }
    if let Some(path) = stations {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let count = db.load_fire_stations(&data)?;
        info!("Imported {} fire stations from {}", count, path.display());
    }
    Ok(())
}
