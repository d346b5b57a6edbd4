//! CSV loaders for the grid and fire-station tables.
//!
//! Rows are upserted by primary key, so loading a newer export over an
//! existing store replaces changed rows. Geometry is checked while loading:
//! a single malformed WKT value rejects the whole file before anything is
//! written.
//!
//! # CSV Formats
//!
//! - **Grid cells** (has headers):
//!   `cell_id,service_area,geometry,average_building_age,building_area,trees`
//! - **Fire stations** (has headers):
//!   `service_area,municipality,vehicle_count,location,coverage`

use crate::queries::{parse_geometry, parse_point};
use crate::Database;
use anyhow::{bail, Context};
use rusqlite::params;

/// Optional numeric column; blank means unknown.
fn optional_number(field: Option<&str>, column: &str, line: u64) -> anyhow::Result<Option<f64>> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("line {line}: {column} is not a number: {text}")),
    }
}

impl Database {
    /// Load grid cells from a CSV string.
    ///
    /// # Example CSV
    /// ```text
    /// cell_id,service_area,geometry,average_building_age,building_area,trees
    /// A1,Centrum,"POLYGON((0 0,100 0,100 100,0 100,0 0))",54.5,1200.0,14
    /// ```
    pub fn load_grid_cells(&self, csv_data: &str) -> anyhow::Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut rows = Vec::new();
        for result in rdr.records() {
            let r = result?;
            let line = r.position().map_or(0, |p| p.line());
            let cell_id = r.get(0).unwrap_or("").trim().to_string();
            if cell_id.is_empty() {
                bail!("line {line}: empty cell_id");
            }
            let service_area = r.get(1).unwrap_or("").trim().to_string();
            let geometry = r.get(2).unwrap_or("").trim().to_string();
            parse_geometry(&geometry).with_context(|| format!("line {line}: cell {cell_id}"))?;
            let building_age = optional_number(r.get(3), "average_building_age", line)?;
            let building_area = optional_number(r.get(4), "building_area", line)?;
            let trees = optional_number(r.get(5), "trees", line)?;
            rows.push((cell_id, service_area, geometry, building_age, building_area, trees));
        }

        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        for (cell_id, service_area, geometry, building_age, building_area, trees) in &rows {
            tx.execute(
                "INSERT OR REPLACE INTO grid_cells
                 (cell_id, service_area, geometry, average_building_age, building_area, trees)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![cell_id, service_area, geometry, building_age, building_area, trees],
            )?;
        }
        tx.commit()?;
        log::info!("Loaded {} grid cells", rows.len());
        Ok(rows.len())
    }

    /// Load fire stations and their service areas from a CSV string.
    ///
    /// # Example CSV
    /// ```text
    /// service_area,municipality,vehicle_count,location,coverage
    /// Nico,Amsterdam,3,POINT(50 50),"POLYGON((0 0,200 0,200 200,0 200,0 0))"
    /// ```
    pub fn load_fire_stations(&self, csv_data: &str) -> anyhow::Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut rows = Vec::new();
        for result in rdr.records() {
            let r = result?;
            let line = r.position().map_or(0, |p| p.line());
            let service_area = r.get(0).unwrap_or("").trim().to_string();
            if service_area.is_empty() {
                bail!("line {line}: empty service_area");
            }
            let municipality = r.get(1).unwrap_or("").trim().to_string();
            let vehicles = r.get(2).unwrap_or("0").trim();
            let vehicle_count: u32 = vehicles
                .parse()
                .with_context(|| format!("line {line}: bad vehicle_count {vehicles}"))?;
            let location = r.get(3).unwrap_or("").trim().to_string();
            let coverage = r.get(4).unwrap_or("").trim().to_string();
            parse_point(&location).with_context(|| format!("line {line}: station {service_area}"))?;
            parse_geometry(&coverage)
                .with_context(|| format!("line {line}: service area {service_area}"))?;
            rows.push((service_area, municipality, vehicle_count, location, coverage));
        }

        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        for (service_area, municipality, vehicle_count, location, coverage) in &rows {
            tx.execute(
                "INSERT OR REPLACE INTO fire_stations
                 (service_area, municipality, vehicle_count, location, coverage)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![service_area, municipality, vehicle_count, location, coverage],
            )?;
        }
        tx.commit()?;
        log::info!("Loaded {} fire stations", rows.len());
        Ok(rows.len())
    }
}
