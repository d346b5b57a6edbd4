//! Typed rows read from the store, with geometry already parsed.

use geo::{Geometry, Point};

/// Coordinate reference system of every stored geometry (Amersfoort / RD New).
pub const GRID_CRS: &str = "EPSG:28992";

/// One cell of the fixed spatial grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub cell_id: String,
    pub service_area: String,
    pub geometry: Geometry<f64>,
    /// Mean construction age of the buildings in the cell (years).
    pub average_building_age: Option<f64>,
    /// Built-up area (m²).
    pub building_area: Option<f64>,
    /// Tree count.
    pub trees: Option<f64>,
}

impl GridCell {
    /// Covariate names a model may ask for.
    pub const COVARIATES: [&'static str; 3] = ["average_building_age", "building_area", "trees"];

    /// Look a covariate up by name; `None` when the cell has no such column.
    pub fn covariate(&self, name: &str) -> Option<Option<f64>> {
        match name {
            "average_building_age" => Some(self.average_building_age),
            "building_area" => Some(self.building_area),
            "trees" => Some(self.trees),
            _ => None,
        }
    }
}

/// A fire station and the area it serves.
#[derive(Debug, Clone, PartialEq)]
pub struct FireStation {
    pub service_area: String,
    pub municipality: String,
    pub vehicle_count: u32,
    pub location: Point<f64>,
    pub coverage: Geometry<f64>,
}
