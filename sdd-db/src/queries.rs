//! Typed queries over the grid and fire-station tables.
//!
//! Geometry is stored as WKT and parsed here. Parsing fails fast: one bad
//! row fails the whole query rather than returning a partial grid.

use crate::models::{FireStation, GridCell};
use crate::Database;
use anyhow::{anyhow, Context};
use geo::{Geometry, Point};
use wkt::TryFromWkt;

/// Parse a WKT string into a geometry.
pub(crate) fn parse_geometry(text: &str) -> anyhow::Result<Geometry<f64>> {
    Geometry::<f64>::try_from_wkt_str(text).map_err(|e| anyhow!("malformed WKT {:?}: {}", text, e))
}

/// Parse a WKT string that must describe a single point.
pub(crate) fn parse_point(text: &str) -> anyhow::Result<Point<f64>> {
    match parse_geometry(text)? {
        Geometry::Point(point) => Ok(point),
        _ => Err(anyhow!("expected a POINT, got {:?}", text)),
    }
}

impl Database {
    /// All grid cells, ordered by `cell_id`.
    pub fn query_grid_cells(&self) -> anyhow::Result<Vec<GridCell>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT cell_id, service_area, geometry, average_building_age, building_area, trees
             FROM grid_cells
             ORDER BY cell_id",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let cells = raw
            .into_iter()
            .map(|(cell_id, service_area, wkt, average_building_age, building_area, trees)| {
                let geometry =
                    parse_geometry(&wkt).with_context(|| format!("grid cell {}", cell_id))?;
                Ok(GridCell {
                    cell_id,
                    service_area,
                    geometry,
                    average_building_age,
                    building_area,
                    trees,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::info!("query_grid_cells returned {} cells", cells.len());
        Ok(cells)
    }

    /// All fire stations, ordered by service area.
    pub fn query_fire_stations(&self) -> anyhow::Result<Vec<FireStation>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT service_area, municipality, vehicle_count, location, coverage
             FROM fire_stations
             ORDER BY service_area",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let stations = raw
            .into_iter()
            .map(|(service_area, municipality, vehicle_count, location, coverage)| {
                let location = parse_point(&location)
                    .with_context(|| format!("fire station {}", service_area))?;
                let coverage = parse_geometry(&coverage)
                    .with_context(|| format!("service area {}", service_area))?;
                Ok(FireStation {
                    service_area,
                    municipality,
                    vehicle_count,
                    location,
                    coverage,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::info!("query_fire_stations returned {} stations", stations.len());
        Ok(stations)
    }
}
