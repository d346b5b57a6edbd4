//! CSV and JSON writers for command results.
//!
//! JSON map output carries each cell's geometry as WKT together with its
//! centroid, in the store's coordinate reference system.

use anyhow::anyhow;
use chrono::NaiveDate;
use geo::Centroid;
use sdd_db::models::{FireStation, GridCell, GRID_CRS};
use sdd_predict::PredictionRow;
use sdd_weather::daily::DailySummary;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use wkt::ToWkt;

/// A buffered file, or stdout when no path is given.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

#[derive(Serialize)]
struct DailyRecord {
    date: NaiveDate,
    avg_precipitation: Option<f64>,
    avg_wind_speed: Option<f64>,
    max_wind_speed: Option<f64>,
    frac_strong_wind: Option<f64>,
    hours: usize,
}

pub fn write_daily_csv<W: Write>(
    writer: W,
    daily: &BTreeMap<NaiveDate, DailySummary>,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (date, summary) in daily {
        wtr.serialize(DailyRecord {
            date: *date,
            avg_precipitation: summary.avg_precipitation,
            avg_wind_speed: summary.avg_wind_speed,
            max_wind_speed: summary.max_wind_speed,
            frac_strong_wind: summary.frac_strong_wind,
            hours: summary.hours,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_predictions_csv<W: Write>(writer: W, rows: &[PredictionRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Rows whose total probability reaches `min_probability`.
pub fn filter_min_probability(rows: &[PredictionRow], min_probability: f64) -> Vec<PredictionRow> {
    rows.iter()
        .filter(|row| row.total_proba >= min_probability)
        .cloned()
        .collect()
}

#[derive(Serialize)]
struct MapFeature<'a> {
    #[serde(flatten)]
    prediction: &'a PredictionRow,
    crs: &'static str,
    geometry: String,
    centroid: Option<[f64; 2]>,
}

/// Predictions joined with their cell geometry, as a JSON array.
pub fn write_predictions_json<W: Write>(
    writer: W,
    rows: &[PredictionRow],
    grid: &[GridCell],
) -> anyhow::Result<()> {
    let cells: HashMap<&str, &GridCell> = grid.iter().map(|c| (c.cell_id.as_str(), c)).collect();
    let features = rows
        .iter()
        .map(|row| {
            let cell = cells
                .get(row.cell_id.as_str())
                .ok_or_else(|| anyhow!("prediction for unknown cell {}", row.cell_id))?;
            Ok(MapFeature {
                prediction: row,
                crs: GRID_CRS,
                geometry: cell.geometry.wkt_string(),
                centroid: cell.geometry.centroid().map(|p| [p.x(), p.y()]),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    serde_json::to_writer_pretty(writer, &features)?;
    Ok(())
}

#[derive(Serialize)]
struct StationFeature<'a> {
    service_area: &'a str,
    municipality: &'a str,
    vehicle_count: u32,
    crs: &'static str,
    location: String,
    coverage: String,
}

/// Fire stations and their service areas, as a JSON array.
pub fn write_stations_json<W: Write>(writer: W, stations: &[FireStation]) -> anyhow::Result<()> {
    let features: Vec<StationFeature> = stations
        .iter()
        .map(|s| StationFeature {
            service_area: &s.service_area,
            municipality: &s.municipality,
            vehicle_count: s.vehicle_count,
            crs: GRID_CRS,
            location: s.location.wkt_string(),
            coverage: s.coverage.wkt_string(),
        })
        .collect();
    serde_json::to_writer_pretty(writer, &features)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry, Point};

    fn prediction(cell_id: &str, date: Option<NaiveDate>, total: f64) -> PredictionRow {
        PredictionRow {
            cell_id: cell_id.to_string(),
            service_area: "Centrum".to_string(),
            date,
            building_proba: total / 2.0,
            tree_proba: total / 2.0,
            total_proba: total,
        }
    }

    fn square_cell(id: &str) -> GridCell {
        GridCell {
            cell_id: id.to_string(),
            service_area: "Centrum".to_string(),
            geometry: Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0),
                (x: 100.0, y: 0.0),
                (x: 100.0, y: 100.0),
                (x: 0.0, y: 100.0),
            ]),
            average_building_age: None,
            building_area: None,
            trees: None,
        }
    }

    #[test]
    fn daily_csv_has_header_and_blank_missing_values() {
        let mut daily = BTreeMap::new();
        daily.insert(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            DailySummary {
                avg_precipitation: Some(0.5),
                avg_wind_speed: None,
                max_wind_speed: None,
                frac_strong_wind: None,
                hours: 24,
            },
        );
        let mut out = Vec::new();
        write_daily_csv(&mut out, &daily).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,avg_precipitation,avg_wind_speed,max_wind_speed,frac_strong_wind,hours"
        );
        assert_eq!(lines.next().unwrap(), "2024-06-01,0.5,,,,24");
    }

    #[test]
    fn prediction_csv_leaves_manual_date_blank() {
        let mut out = Vec::new();
        write_predictions_csv(&mut out, &[prediction("A", None, 0.5)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "cell_id,service_area,date,building_proba,tree_proba,total_proba"
        );
        assert_eq!(text.lines().nth(1).unwrap(), "A,Centrum,,0.25,0.25,0.5");
    }

    #[test]
    fn minimum_probability_filter() {
        let rows = [prediction("A", None, 0.1), prediction("B", None, 0.6)];
        let kept = filter_min_probability(&rows, 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].cell_id, "B");
        assert_eq!(filter_min_probability(&rows, 0.0).len(), 2);
    }

    #[test]
    fn json_joins_geometry_and_centroid() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let mut out = Vec::new();
        write_predictions_json(&mut out, &[prediction("A", date, 0.4)], &[square_cell("A")])
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let feature = &value[0];
        assert_eq!(feature["cell_id"], "A");
        assert_eq!(feature["date"], "2024-06-01");
        assert_eq!(feature["crs"], "EPSG:28992");
        assert!(feature["geometry"].as_str().unwrap().starts_with("POLYGON"));
        assert_eq!(feature["centroid"], serde_json::json!([50.0, 50.0]));
    }

    #[test]
    fn json_rejects_unknown_cells() {
        let mut out = Vec::new();
        let orphan = [prediction("Z", None, 0.4)];
        assert!(write_predictions_json(&mut out, &orphan, &[square_cell("A")]).is_err());
    }

    #[test]
    fn stations_json_uses_wkt() {
        let station = FireStation {
            service_area: "Nico".to_string(),
            municipality: "Amsterdam".to_string(),
            vehicle_count: 3,
            location: Point::new(50.0, 50.0),
            coverage: square_cell("A").geometry,
        };
        let mut out = Vec::new();
        write_stations_json(&mut out, &[station]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["vehicle_count"], 3);
        let location = value[0]["location"].as_str().unwrap();
        assert!(location.starts_with("POINT") && location.contains("50 50"));
    }
}
